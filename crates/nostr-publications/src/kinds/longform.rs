//! NIP-23 long-form article handler.

use nostr_sdk::prelude::*;
use regex::Regex;
use tracing::debug;

use crate::events::{EventDraft, EventTag, KIND_LONG_FORM, KIND_NOTIFICATION};
use crate::kinds::{common_tags, validate_common, EventMeta, KindHandler, RenderContext};
use crate::Error;

/// Renders long-form articles, adding NIP-27 reference tags for in-text
/// `nostr:` mentions.
pub struct LongFormHandler {
    mentions: Regex,
}

impl LongFormHandler {
    pub fn new() -> Self {
        // Bech32 body charset; the SDK parse validates the checksum.
        let mentions = Regex::new(r"nostr:((?:npub|nprofile|note|nevent|naddr)1[a-z0-9]+)")
            .expect("static regex");
        Self { mentions }
    }

    /// Scans content for NIP-27 mentions and maps them to `e`/`p`/`a` tags.
    fn mention_tags(&self, content: &str) -> Vec<EventTag> {
        let mut tags = Vec::new();
        for caps in self.mentions.captures_iter(content) {
            let entity = &caps[1];
            match mention_tag(entity) {
                Some(tag) => tags.push(tag),
                None => debug!(entity, "skipping unparseable nostr mention"),
            }
        }
        tags
    }

    /// Builds the optional companion notification note announcing an article
    /// by its address.
    pub fn notification(&self, meta: &EventMeta, ctx: &RenderContext) -> EventDraft {
        let address = format!("{}:{}:{}", KIND_LONG_FORM, ctx.pubkey, meta.d_tag);
        let mut draft = EventDraft::new(
            KIND_NOTIFICATION,
            format!("New article: {}", meta.title),
            meta.published_at,
        );
        let mut values = vec![address];
        if let Some(hint) = &ctx.relay_hint {
            values.push(hint.clone());
        }
        draft.push_tag(EventTag::new("a", values));
        draft
    }
}

impl Default for LongFormHandler {
    fn default() -> Self {
        Self::new()
    }
}

fn mention_tag(entity: &str) -> Option<EventTag> {
    if entity.starts_with("npub1") {
        let pk = PublicKey::from_bech32(entity).ok()?;
        return Some(EventTag::single("p", pk.to_hex()));
    }
    if entity.starts_with("nprofile1") {
        let profile = Nip19Profile::from_bech32(entity).ok()?;
        return Some(EventTag::single("p", profile.public_key.to_hex()));
    }
    if entity.starts_with("note1") {
        let id = EventId::from_bech32(entity).ok()?;
        return Some(EventTag::single("e", id.to_hex()));
    }
    if entity.starts_with("nevent1") {
        let event = Nip19Event::from_bech32(entity).ok()?;
        return Some(EventTag::single("e", event.event_id.to_hex()));
    }
    if entity.starts_with("naddr1") {
        let coordinate = Nip19Coordinate::from_bech32(entity).ok()?;
        return Some(EventTag::single(
            "a",
            format!(
                "{}:{}:{}",
                coordinate.kind.as_u16(),
                coordinate.public_key.to_hex(),
                coordinate.identifier
            ),
        ));
    }
    None
}

impl KindHandler for LongFormHandler {
    fn kind(&self) -> u16 {
        KIND_LONG_FORM
    }

    fn name(&self) -> &'static str {
        "long-form"
    }

    fn required_fields(&self) -> &'static [&'static str] {
        &["d", "title"]
    }

    fn optional_fields(&self) -> &'static [&'static str] {
        &["summary", "image", "t", "published_at"]
    }

    fn validate(&self, meta: &EventMeta) -> Vec<String> {
        validate_common(meta)
    }

    fn render(
        &self,
        meta: &EventMeta,
        content: &str,
        _ctx: &RenderContext,
    ) -> Result<EventDraft, Error> {
        let mut draft = EventDraft::new(KIND_LONG_FORM, content, meta.published_at);
        draft.tags = common_tags(meta);
        draft.tags.extend(self.mention_tags(content));
        Ok(draft)
    }

    fn companion(&self, meta: &EventMeta, ctx: &RenderContext) -> Option<EventDraft> {
        Some(self.notification(meta, ctx))
    }
}
