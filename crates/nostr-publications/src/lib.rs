//! Nostr publication compiler and publisher.
//!
//! Turns a single AsciiDoc or Markdown document into a set of addressable,
//! kind-tagged Nostr events: long-form articles (30023), publication indexes
//! (30040), publication content sections (30041), and wiki pages (30818).
//!
//! # Architecture
//!
//! ```text
//! raw text ──▶ MetadataExtractor ──▶ SectionTreeParser ──▶ GraphCompiler
//!                (doc-compiler)        (doc-compiler)       (doc-compiler)
//!                                                                │
//!                                                       compiled units
//!                                                                │
//!                                                                ▼
//!              EventKindRegistry ◀── DirectDocumentPublisher ──▶ report
//!                 (kind handlers)              │
//!                                              ▼
//!                                       EventPublisher
//!                                      (signs + sends)
//! ```
//!
//! The compile path is synchronous and pure; only the final hand-off to the
//! publisher is async. The kind registry is built once at startup and shared
//! read-only.
//!
//! # Example
//!
//! ```rust
//! use doc_compiler::DocumentFormat;
//! use nostr_publications::{
//!     ContentKind, DirectDocumentPublisher, EventKindRegistry, PublicationRequest,
//! };
//!
//! let publisher = DirectDocumentPublisher::new(EventKindRegistry::new());
//! let request = PublicationRequest {
//!     content_level: Some(1),
//!     content_kind: Some(ContentKind::PublicationContent),
//!     static_ids: true,
//!     dry_run: true,
//!     ..Default::default()
//! };
//! let text = "= Guide\n\nintro\n\n== Basics\nbody";
//! let outcome = publisher.compile_text(text, DocumentFormat::AsciiDoc, &request)?;
//! assert!(outcome.report.success);
//! assert_eq!(outcome.report.index_sections, 1);
//! # Ok::<(), nostr_publications::Error>(())
//! ```

mod config;
mod error;
mod events;
mod kinds;
mod orchestrator;
mod publisher;
mod relay;
mod report;

pub use config::{
    resolve, ContentKind, PublicationRequest, ResolvedConfig, MSG_LONG_FORM_LEVEL,
    MSG_MARKDOWN_KIND, MSG_MARKDOWN_LEVEL,
};
pub use error::Error;
pub use events::{
    d_tag, t_tag, tag_value, tag_values, title_tag, unix_timestamp, EventDraft, EventTag,
    KIND_LONG_FORM, KIND_NOTIFICATION, KIND_PUBLICATION_CONTENT, KIND_PUBLICATION_INDEX,
    KIND_WIKI,
};
pub use kinds::{
    normalize_wiki_identifier, EventKindRegistry, EventMeta, KindHandler, LongFormHandler,
    PublicationContentHandler, PublicationIndexHandler, RenderContext, WikiHandler,
    BUILTIN_KINDS, PUBKEY_PLACEHOLDER,
};
pub use orchestrator::{CompileOutcome, DirectDocumentPublisher, RenderedUnit};
pub use publisher::{EventPublisher, PublishResult, RelayPublisher, RelayPublisherConfig};
pub use relay::{RelayConfigResolver, StaticRelayResolver};
pub use report::{PublishReport, ReportStructure, SectionSummary};

/// Crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
