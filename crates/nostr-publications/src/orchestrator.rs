//! Direct document publishing pipeline.
//!
//! [`DirectDocumentPublisher`] drives the whole flow: constraint resolution,
//! metadata extraction, section tree parsing (skipped for Markdown), graph
//! compilation, per-unit rendering through the injected kind registry, and
//! finally the hand-off to an [`EventPublisher`]. One compile call is atomic:
//! structural, configuration, and duplicate-identifier errors abort with no
//! partial output, while per-unit validation problems are aggregated into
//! the report.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info};

use doc_compiler::{
    extract, parse_tree, slugify, AttrValue, AttributeDictionary, CompileError, CompiledUnit,
    DocumentFormat, GraphCompiler, IdMode, SectionNode,
};

use crate::config::{resolve, ContentKind, PublicationRequest};
use crate::events::{unix_timestamp, EventDraft, EventTag, KIND_PUBLICATION_INDEX, KIND_WIKI};
use crate::kinds::{EventKindRegistry, EventMeta, RenderContext, PUBKEY_PLACEHOLDER};
use crate::publisher::EventPublisher;
use crate::relay::RelayConfigResolver;
use crate::report::{PublishReport, ReportStructure, SectionSummary};
use crate::Error;

/// Attribute keys consumed by the pipeline; everything else passes through
/// as custom tags.
const CONSUMED_KEYS: [&str; 21] = [
    "title",
    "summary",
    "image",
    "t",
    "published_at",
    "published-at",
    "content-level",
    "content-kind",
    "version",
    "revdate",
    "remark",
    "auto-update",
    "type",
    "published_by",
    "published_on",
    "source",
    "isbn",
    "original-author",
    "original-event",
    "fork",
    "defer",
];

/// Kind-specific scalar fields lifted from the attribute dictionary.
const FIELD_KEYS: [&str; 11] = [
    "auto-update",
    "type",
    "version",
    "published_by",
    "published_on",
    "source",
    "isbn",
    "original-author",
    "original-event",
    "fork",
    "defer",
];

/// One compiled unit together with its render inputs and draft.
#[derive(Debug, Clone)]
pub struct RenderedUnit {
    pub meta: EventMeta,
    pub draft: EventDraft,
    pub kind: u16,
    pub is_index: bool,
}

/// Everything one compile call produced.
#[derive(Debug)]
pub struct CompileOutcome {
    pub report: PublishReport,
    /// Rendered units in document order; empty when validation failed.
    pub units: Vec<RenderedUnit>,
    /// Companion notification draft, when requested and applicable.
    pub notification: Option<EventDraft>,
    /// Base render context (pubkey, relay hint) used at compile time.
    pub ctx: RenderContext,
}

/// Orchestrates compilation and publishing of a single document.
pub struct DirectDocumentPublisher {
    registry: EventKindRegistry,
    relay_resolver: Option<Arc<dyn RelayConfigResolver>>,
}

impl DirectDocumentPublisher {
    pub fn new(registry: EventKindRegistry) -> Self {
        Self {
            registry,
            relay_resolver: None,
        }
    }

    pub fn with_relay_resolver(mut self, resolver: Arc<dyn RelayConfigResolver>) -> Self {
        self.relay_resolver = Some(resolver);
        self
    }

    /// Compiles a document file, detecting the format from its extension.
    pub fn compile_file(
        &self,
        path: &Path,
        request: &PublicationRequest,
    ) -> Result<CompileOutcome, Error> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();
        let format = DocumentFormat::from_extension(ext)
            .ok_or_else(|| Error::UnsupportedExtension(ext.to_string()))?;
        let text = std::fs::read_to_string(path)?;
        self.compile_text(&text, format, request)
    }

    /// Compiles raw document text into rendered events and a report.
    pub fn compile_text(
        &self,
        text: &str,
        format: DocumentFormat,
        request: &PublicationRequest,
    ) -> Result<CompileOutcome, Error> {
        let doc = extract(text, format);
        let config = resolve(format, request, &doc.attributes)?;

        let title = doc
            .attributes
            .title()
            .ok_or_else(|| {
                CompileError::Structure(
                    "document must contain exactly one level-1 header, found none".to_string(),
                )
            })?
            .to_string();

        let root = self.build_tree(&title, &doc.body, format)?;
        let id_mode = if config.static_ids || config.content_kind == ContentKind::Wiki {
            IdMode::Static
        } else {
            IdMode::Timestamped
        };
        let marker = format.marker();
        let mut graph = GraphCompiler::new(
            config.content_level,
            KIND_PUBLICATION_INDEX,
            config.content_kind.kind(),
            marker,
        )
        .with_id_mode(id_mode)
        .with_root_identifier(config.identifier.clone())
        .compile(&root)?;

        if config.content_kind == ContentKind::Wiki {
            self.normalize_wiki_identifiers(&mut graph.units)?;
        }

        debug!(
            title = %title,
            format = %format,
            level = config.content_level,
            kind = %config.content_kind,
            units = graph.units.len(),
            "compiled document"
        );

        let ctx = self.build_context(request);
        let main_index = graph.main_index.unwrap_or(0);
        let mut errors = Vec::new();
        let mut metas = Vec::with_capacity(graph.units.len());
        for (position, unit) in graph.units.iter().enumerate() {
            let meta = build_meta(unit, &doc.attributes, position == main_index);
            let handler = self.registry.get(unit.kind())?;
            for problem in handler.validate(&meta) {
                errors.push(format!("{}: {}", unit.d_tag(), problem));
            }
            metas.push(meta);
        }

        let success = errors.is_empty();
        let mut units = Vec::new();
        let mut notification = None;
        if success {
            for (unit, meta) in graph.units.iter().zip(metas) {
                let handler = self.registry.get(unit.kind())?;
                let content = match unit {
                    CompiledUnit::Content(c) => c.content.as_str(),
                    CompiledUnit::Index(_) => "",
                };
                let draft = handler.render(&meta, content, &ctx)?;
                units.push(RenderedUnit {
                    meta,
                    draft,
                    kind: unit.kind(),
                    is_index: unit.is_index(),
                });
            }
            if request.notify {
                let main = &units[main_index];
                let handler = self.registry.get(main.kind)?;
                notification = handler.companion(&main.meta, &ctx);
            }
        }

        let report = build_report(
            success,
            errors,
            &title,
            &graph,
            notification.is_some(),
            &doc.attributes,
        )?;

        Ok(CompileOutcome {
            report,
            units,
            notification,
            ctx,
        })
    }

    /// Publishes a compiled outcome: content units first, then the index
    /// units that reference them (deepest first), then any notification.
    ///
    /// Dry-run handling belongs to the caller: this method always publishes.
    pub async fn publish(
        &self,
        outcome: &CompileOutcome,
        publisher: &dyn EventPublisher,
    ) -> Result<PublishReport, Error> {
        let report = outcome.report.clone();
        if !report.success {
            info!("skipping publish: compile reported validation errors");
            return Ok(report);
        }

        let mut ctx = outcome.ctx.clone();
        if let Some(pubkey) = publisher.pubkey() {
            ctx.pubkey = pubkey;
        }

        for unit in outcome.units.iter().filter(|u| !u.is_index) {
            let result = publisher.publish(&unit.draft).await?;
            ctx.event_hints
                .insert(unit.meta.d_tag.clone(), result.event_id);
        }

        // Indexes reference earlier-published units; publish children before
        // the parents that point at them so event-id hints are available.
        for unit in outcome.units.iter().rev().filter(|u| u.is_index) {
            let handler = self.registry.get(unit.kind)?;
            let draft = handler.render(&unit.meta, "", &ctx)?;
            let result = publisher.publish(&draft).await?;
            ctx.event_hints
                .insert(unit.meta.d_tag.clone(), result.event_id);
        }

        if outcome.notification.is_some() {
            let main_index = outcome
                .units
                .iter()
                .position(|u| u.is_index)
                .unwrap_or(0);
            let main = &outcome.units[main_index];
            let handler = self.registry.get(main.kind)?;
            if let Some(note) = handler.companion(&main.meta, &ctx) {
                publisher.publish(&note).await?;
            }
        }

        info!(
            events = report.total_events,
            title = %report.document_title,
            "published document"
        );
        Ok(report)
    }

    fn build_tree(
        &self,
        title: &str,
        body: &str,
        format: DocumentFormat,
    ) -> Result<SectionNode, Error> {
        match format {
            DocumentFormat::AsciiDoc => Ok(parse_tree(title, body, format)?),
            DocumentFormat::Markdown => {
                // Markdown is always one flat article; only the single
                // level-1 header invariant is enforced.
                for line in body.lines() {
                    if line.starts_with("# ") {
                        return Err(Error::Compile(CompileError::Structure(format!(
                            "document must contain exactly one level-1 header, found another: {}",
                            line.trim_start_matches('#').trim()
                        ))));
                    }
                }
                let mut root = SectionNode::new(1, title, 0);
                root.raw_lines = body.lines().map(String::from).collect();
                Ok(root)
            }
        }
    }

    fn build_context(&self, request: &PublicationRequest) -> RenderContext {
        let pubkey = request
            .author_pubkey
            .clone()
            .unwrap_or_else(|| PUBKEY_PLACEHOLDER.to_string());
        let relay_hint = request.relay_hint.as_ref().and_then(|hint| {
            match &self.relay_resolver {
                Some(resolver) => resolver.resolve(hint).into_iter().next(),
                None => Some(hint.clone()),
            }
        });
        RenderContext::new(pubkey).with_relay_hint(relay_hint)
    }

    /// Rewrites content-unit identifiers using the wiki kind's stricter
    /// normalization, updating index references to match.
    fn normalize_wiki_identifiers(&self, units: &mut [CompiledUnit]) -> Result<(), Error> {
        let handler = self.registry.get(KIND_WIKI)?;
        let mut renames: HashMap<String, String> = HashMap::new();
        for unit in units.iter() {
            if let CompiledUnit::Content(content) = unit {
                let Some(normalized) = handler.normalize_identifier(&content.title) else {
                    continue;
                };
                if normalized.is_empty() {
                    continue;
                }
                let own_text_base = format!("{}-content", slugify(&content.title));
                let renamed = if content.d_tag.starts_with(&own_text_base) {
                    format!("{normalized}-content")
                } else {
                    normalized
                };
                renames.insert(content.d_tag.clone(), renamed);
            }
        }

        for unit in units.iter_mut() {
            match unit {
                CompiledUnit::Content(content) => {
                    if let Some(renamed) = renames.get(&content.d_tag) {
                        content.d_tag = renamed.clone();
                    }
                }
                CompiledUnit::Index(index) => {
                    for unit_ref in &mut index.refs {
                        if let Some(renamed) = renames.get(&unit_ref.d_tag) {
                            unit_ref.d_tag = renamed.clone();
                        }
                    }
                }
            }
        }

        let mut seen = HashSet::new();
        for unit in units.iter() {
            if !seen.insert(unit.d_tag().to_string()) {
                return Err(Error::Compile(CompileError::DuplicateIdentifier(
                    unit.d_tag().to_string(),
                )));
            }
        }
        Ok(())
    }
}

/// Builds the per-unit event configuration from the document attributes.
///
/// Document-level summary, image, and custom tags apply to the main unit
/// only; topics and the publication timestamp apply everywhere. Index units
/// carry the kind-specific fields (with `auto-update` defaulting to `yes`).
fn build_meta(unit: &CompiledUnit, attrs: &AttributeDictionary, is_main: bool) -> EventMeta {
    let mut meta = EventMeta {
        d_tag: unit.d_tag().to_string(),
        title: unit.title().to_string(),
        published_at: published_at(attrs),
        ..Default::default()
    };

    if let Some(topics) = attrs.list("t") {
        meta.topics = topics.to_vec();
    }

    if is_main {
        meta.summary = attrs.scalar("summary").map(String::from);
        meta.image = attrs.scalar("image").map(String::from);
        meta.custom = custom_tags(attrs);
    }

    if unit.is_index() || is_main {
        for key in FIELD_KEYS {
            if let Some(value) = attrs.scalar(key) {
                meta.fields.insert(key.to_string(), value.to_string());
            }
        }
        if !attrs.authors().is_empty() {
            let joined = attrs
                .authors()
                .iter()
                .map(|a| a.name.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            meta.fields.insert("author".to_string(), joined);
        }
        if meta.fields.get("published_on").is_none() {
            if let Some(revdate) = attrs.scalar("revdate") {
                meta.fields
                    .insert("published_on".to_string(), revdate.to_string());
            }
        }
    }

    if unit.is_index() && !meta.fields.contains_key("auto-update") {
        meta.fields
            .insert("auto-update".to_string(), "yes".to_string());
    }

    if let CompiledUnit::Index(index) = unit {
        meta.refs = index.refs.clone();
    }

    meta
}

fn published_at(attrs: &AttributeDictionary) -> u64 {
    attrs
        .scalar("published_at")
        .or_else(|| attrs.scalar("published-at"))
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or_else(unix_timestamp)
}

fn custom_tags(attrs: &AttributeDictionary) -> Vec<EventTag> {
    let mut tags = Vec::new();
    for (key, value) in attrs.iter() {
        if CONSUMED_KEYS.contains(&key) {
            continue;
        }
        match value {
            AttrValue::Scalar(v) => tags.push(EventTag::single(key, v.clone())),
            AttrValue::List(values) => {
                for v in values {
                    tags.push(EventTag::single(key, v.clone()));
                }
            }
        }
    }
    tags
}

fn build_report(
    success: bool,
    errors: Vec<String>,
    title: &str,
    graph: &doc_compiler::CompiledGraph,
    has_notification: bool,
    attrs: &AttributeDictionary,
) -> Result<PublishReport, Error> {
    let mut structure = ReportStructure::default();
    for (position, unit) in graph.units.iter().enumerate() {
        let summary = SectionSummary {
            kind: unit.kind(),
            d_tag: unit.d_tag().to_string(),
            title: unit.title().to_string(),
        };
        if unit.is_index() {
            if graph.main_index == Some(position) {
                structure.main_index = Some(summary.clone());
            }
            structure.index_sections.push(summary);
        } else {
            structure.content_sections.push(summary);
        }
    }

    let total_events = graph.units.len() + usize::from(has_notification);
    Ok(PublishReport {
        success,
        errors,
        document_title: title.to_string(),
        content_sections: graph.content_count(),
        index_sections: graph.index_count(),
        total_events,
        structure,
        metadata: serde_json::to_value(attrs)?,
    })
}
