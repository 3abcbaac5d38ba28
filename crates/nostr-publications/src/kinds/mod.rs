//! Event kind handlers and the kind registry.
//!
//! Each supported kind implements [`KindHandler`]: declarative field lists,
//! per-unit validation, and rendering of a compiled unit into a fully tagged
//! [`EventDraft`]. The registry is built once at startup and injected into
//! the orchestrator; it is never mutated mid-run and can be shared read-only
//! across threads.

mod content;
mod index;
mod longform;
mod wiki;

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use indexmap::IndexMap;

use doc_compiler::UnitRef;

use crate::events::{
    d_tag, t_tag, title_tag, EventDraft, EventTag, KIND_LONG_FORM, KIND_PUBLICATION_CONTENT,
    KIND_PUBLICATION_INDEX, KIND_WIKI,
};
use crate::Error;

pub use content::PublicationContentHandler;
pub use index::PublicationIndexHandler;
pub use longform::LongFormHandler;
pub use wiki::{normalize_wiki_identifier, WikiHandler};

/// Placeholder used in reference addresses when no signing key is known,
/// e.g. during dry runs.
pub const PUBKEY_PLACEHOLDER: &str = "<pubkey>";

/// Per-unit event configuration handed to a kind handler.
#[derive(Debug, Clone, Default)]
pub struct EventMeta {
    pub d_tag: String,
    pub title: String,
    pub summary: Option<String>,
    pub image: Option<String>,
    pub topics: Vec<String>,
    pub published_at: u64,
    /// Kind-specific scalar fields (auto-update, version, isbn, ...).
    pub fields: IndexMap<String, String>,
    /// Arbitrary custom tags passed through unchanged.
    pub custom: Vec<EventTag>,
    /// Ordered references to other units; index kinds only.
    pub refs: Vec<UnitRef>,
}

/// Shared context for one render pass.
#[derive(Debug, Clone)]
pub struct RenderContext {
    /// Author public key used in reference addresses.
    pub pubkey: String,
    /// Relay hint applied to references without their own hint.
    pub relay_hint: Option<String>,
    /// Known event ids per referenced `d` identifier, available once the
    /// referenced events have been published.
    pub event_hints: HashMap<String, String>,
}

impl RenderContext {
    pub fn new(pubkey: impl Into<String>) -> Self {
        Self {
            pubkey: pubkey.into(),
            relay_hint: None,
            event_hints: HashMap::new(),
        }
    }

    pub fn with_relay_hint(mut self, hint: Option<String>) -> Self {
        self.relay_hint = hint;
        self
    }
}

impl Default for RenderContext {
    fn default() -> Self {
        Self::new(PUBKEY_PLACEHOLDER)
    }
}

/// A renderer for one event kind.
pub trait KindHandler: Send + Sync {
    fn kind(&self) -> u16;
    fn name(&self) -> &'static str;
    fn required_fields(&self) -> &'static [&'static str];
    fn optional_fields(&self) -> &'static [&'static str];

    /// Returns every validation problem found; an empty list means valid.
    fn validate(&self, meta: &EventMeta) -> Vec<String>;

    /// Renders the unit into a tagged draft. Only called on valid metadata.
    fn render(
        &self,
        meta: &EventMeta,
        content: &str,
        ctx: &RenderContext,
    ) -> Result<EventDraft, Error>;

    /// Kind-specific identifier normalization; `None` keeps the generic slug.
    fn normalize_identifier(&self, _title: &str) -> Option<String> {
        None
    }

    /// Optional companion event announcing the rendered unit, e.g. the
    /// long-form notification note. `None` for kinds without one.
    fn companion(&self, _meta: &EventMeta, _ctx: &RenderContext) -> Option<EventDraft> {
        None
    }
}

/// Read-only map from kind number to handler.
///
/// Constructed once at process start and passed by reference into the
/// orchestrator. The closed set of built-in kinds is always present;
/// [`register`](Self::register) exists as an extension point for additional
/// kinds before the registry is handed off.
pub struct EventKindRegistry {
    handlers: BTreeMap<u16, Arc<dyn KindHandler>>,
}

impl EventKindRegistry {
    pub fn new() -> Self {
        let mut registry = Self {
            handlers: BTreeMap::new(),
        };
        registry.register(Arc::new(LongFormHandler::new()));
        registry.register(Arc::new(PublicationIndexHandler::new()));
        registry.register(Arc::new(PublicationContentHandler::new()));
        registry.register(Arc::new(WikiHandler::new()));
        registry
    }

    pub fn register(&mut self, handler: Arc<dyn KindHandler>) {
        self.handlers.insert(handler.kind(), handler);
    }

    pub fn get(&self, kind: u16) -> Result<&Arc<dyn KindHandler>, Error> {
        self.handlers.get(&kind).ok_or(Error::UnknownKind(kind))
    }

    pub fn kinds(&self) -> impl Iterator<Item = u16> + '_ {
        self.handlers.keys().copied()
    }
}

impl Default for EventKindRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Field length and shape checks shared by every kind.
pub(crate) fn validate_common(meta: &EventMeta) -> Vec<String> {
    let mut errors = Vec::new();
    if meta.title.trim().is_empty() {
        errors.push("title is required".to_string());
    }
    if meta.title.chars().count() > 200 {
        errors.push(format!(
            "title exceeds 200 characters ({})",
            meta.title.chars().count()
        ));
    }
    if let Some(summary) = &meta.summary {
        if summary.chars().count() > 500 {
            errors.push(format!(
                "summary exceeds 500 characters ({})",
                summary.chars().count()
            ));
        }
    }
    if let Some(image) = &meta.image {
        if !is_url_or_path(image) {
            errors.push(format!("image must be a URL or local path: {image}"));
        }
    }
    for topic in &meta.topics {
        if topic.trim().is_empty() {
            errors.push("topics must be non-empty strings".to_string());
        }
    }
    errors
}

fn is_url_or_path(value: &str) -> bool {
    if value.starts_with("http://") || value.starts_with("https://") {
        return true;
    }
    // Local path: no scheme, no whitespace.
    !value.contains("://") && !value.chars().any(char::is_whitespace) && !value.is_empty()
}

/// Tags common to every kind: `d`, `title`, `summary`, `image`, repeated
/// `t`, `published_at`, then custom passthrough tags.
pub(crate) fn common_tags(meta: &EventMeta) -> Vec<EventTag> {
    let mut tags = Vec::new();
    tags.push(d_tag(&meta.d_tag));
    tags.push(title_tag(&meta.title));
    if let Some(summary) = &meta.summary {
        tags.push(EventTag::single("summary", summary.clone()));
    }
    if let Some(image) = &meta.image {
        tags.push(EventTag::single("image", image.clone()));
    }
    for topic in &meta.topics {
        tags.push(t_tag(topic));
    }
    tags.push(EventTag::single(
        "published_at",
        meta.published_at.to_string(),
    ));
    tags.extend(meta.custom.iter().cloned());
    tags
}

/// Sanity constants linking handlers back to their kind numbers.
pub const BUILTIN_KINDS: [u16; 4] = [
    KIND_LONG_FORM,
    KIND_PUBLICATION_INDEX,
    KIND_PUBLICATION_CONTENT,
    KIND_WIKI,
];
