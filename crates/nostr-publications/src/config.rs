//! Publication configuration and constraint resolution.
//!
//! Resolution priority is strict: explicit caller argument, then a value
//! declared in the document's attributes, then the format default. Constraint
//! violations fail fast before any compilation happens, and their message
//! strings are part of the external contract.

use doc_compiler::{AttributeDictionary, DocumentFormat};
use serde::Serialize;

use crate::events::{KIND_LONG_FORM, KIND_PUBLICATION_CONTENT, KIND_WIKI};
use crate::Error;

/// Contract message for Markdown documents given a content level.
pub const MSG_MARKDOWN_LEVEL: &str = "Markdown files cannot have content-level parameters. They are always flat articles (content-level 0).";
/// Contract message for Markdown documents given a content kind.
pub const MSG_MARKDOWN_KIND: &str = "Markdown files cannot have content-kind parameters. They are always flat articles (content-level 0).";
/// Contract message for long-form publications at level 0.
pub const MSG_LONG_FORM_LEVEL: &str = "30023 (Long-form Content) requires content-level > 0. Use --content-level 1 or higher for hierarchical publications.";

/// The kind used for content units of a publication.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ContentKind {
    LongForm,
    PublicationContent,
    Wiki,
}

impl ContentKind {
    pub fn kind(&self) -> u16 {
        match self {
            ContentKind::LongForm => KIND_LONG_FORM,
            ContentKind::PublicationContent => KIND_PUBLICATION_CONTENT,
            ContentKind::Wiki => KIND_WIKI,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ContentKind::LongForm => "long-form",
            ContentKind::PublicationContent => "publication-content",
            ContentKind::Wiki => "wiki",
        }
    }

    /// Parses a kind from its name or numeric identifier.
    pub fn parse(value: &str) -> Result<Self, Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "long-form" | "longform" | "article" | "30023" => Ok(ContentKind::LongForm),
            "publication-content" | "publication" | "30041" => Ok(ContentKind::PublicationContent),
            "wiki" | "30818" => Ok(ContentKind::Wiki),
            other => Err(Error::UnknownContentKind(other.to_string())),
        }
    }
}

impl std::fmt::Display for ContentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Caller-supplied publication request, before constraint resolution.
#[derive(Debug, Clone, Default)]
pub struct PublicationRequest {
    /// Explicit content level override.
    pub content_level: Option<u8>,
    /// Explicit content kind override.
    pub content_kind: Option<ContentKind>,
    /// Compile and report without publishing.
    pub dry_run: bool,
    /// Timestamp-free, reproducible identifiers.
    pub static_ids: bool,
    /// Explicit identifier for the top-level unit (reuse an existing one).
    pub identifier: Option<String>,
    /// Author public key used in reference addresses; placeholder when unset.
    pub author_pubkey: Option<String>,
    /// Emit a companion notification note for long-form articles.
    pub notify: bool,
    /// Relay hint category or URL resolved for reference tags.
    pub relay_hint: Option<String>,
}

/// A fully resolved configuration for one compile call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedConfig {
    pub format: DocumentFormat,
    pub content_level: u8,
    pub content_kind: ContentKind,
    pub static_ids: bool,
    pub identifier: Option<String>,
}

/// Resolves the effective level and kind for a document, enforcing the
/// format constraints.
pub fn resolve(
    format: DocumentFormat,
    request: &PublicationRequest,
    attrs: &AttributeDictionary,
) -> Result<ResolvedConfig, Error> {
    let attr_level = attrs
        .scalar("content-level")
        .map(|v| {
            v.parse::<u8>().map_err(|_| {
                Error::Constraint(format!("invalid content-level attribute: {v}"))
            })
        })
        .transpose()?;
    let attr_kind = attrs
        .scalar("content-kind")
        .map(ContentKind::parse)
        .transpose()?;

    if format == DocumentFormat::Markdown {
        if request.content_level.is_some() || attr_level.is_some() {
            return Err(Error::Constraint(MSG_MARKDOWN_LEVEL.to_string()));
        }
        if request.content_kind.is_some() || attr_kind.is_some() {
            return Err(Error::Constraint(MSG_MARKDOWN_KIND.to_string()));
        }
        return Ok(ResolvedConfig {
            format,
            content_level: 0,
            content_kind: ContentKind::LongForm,
            static_ids: request.static_ids,
            identifier: request.identifier.clone(),
        });
    }

    let content_level = request
        .content_level
        .or(attr_level)
        .unwrap_or(0);
    let content_kind = request
        .content_kind
        .or(attr_kind)
        .unwrap_or(ContentKind::PublicationContent);

    if content_level > doc_compiler::MAX_DEPTH {
        return Err(Error::Constraint(format!(
            "content-level must be between 0 and {}, got {content_level}",
            doc_compiler::MAX_DEPTH
        )));
    }

    if content_kind == ContentKind::LongForm && content_level == 0 {
        return Err(Error::Constraint(MSG_LONG_FORM_LEVEL.to_string()));
    }

    Ok(ResolvedConfig {
        format,
        content_level,
        content_kind,
        static_ids: request.static_ids,
        identifier: request.identifier.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use doc_compiler::extract;

    fn no_attrs() -> AttributeDictionary {
        AttributeDictionary::default()
    }

    #[test]
    fn markdown_defaults_to_flat_long_form() {
        let config = resolve(
            DocumentFormat::Markdown,
            &PublicationRequest::default(),
            &no_attrs(),
        )
        .unwrap();
        assert_eq!(config.content_level, 0);
        assert_eq!(config.content_kind, ContentKind::LongForm);
    }

    #[test]
    fn markdown_rejects_explicit_level_with_contract_message() {
        let request = PublicationRequest {
            content_level: Some(1),
            ..Default::default()
        };
        let err = resolve(DocumentFormat::Markdown, &request, &no_attrs()).unwrap_err();
        assert_eq!(err.to_string(), MSG_MARKDOWN_LEVEL);
    }

    #[test]
    fn markdown_rejects_attribute_level_too() {
        let doc = extract(
            "# Title\ncontent-level: 2\n\nBody",
            DocumentFormat::Markdown,
        );
        let err = resolve(
            DocumentFormat::Markdown,
            &PublicationRequest::default(),
            &doc.attributes,
        )
        .unwrap_err();
        assert_eq!(err.to_string(), MSG_MARKDOWN_LEVEL);
    }

    #[test]
    fn markdown_rejects_explicit_kind() {
        let request = PublicationRequest {
            content_kind: Some(ContentKind::Wiki),
            ..Default::default()
        };
        let err = resolve(DocumentFormat::Markdown, &request, &no_attrs()).unwrap_err();
        assert_eq!(err.to_string(), MSG_MARKDOWN_KIND);
    }

    #[test]
    fn asciidoc_defaults_to_flat_publication_content() {
        let config = resolve(
            DocumentFormat::AsciiDoc,
            &PublicationRequest::default(),
            &no_attrs(),
        )
        .unwrap();
        assert_eq!(config.content_level, 0);
        assert_eq!(config.content_kind, ContentKind::PublicationContent);
    }

    #[test]
    fn long_form_at_level_zero_fails_with_contract_message() {
        let request = PublicationRequest {
            content_kind: Some(ContentKind::LongForm),
            ..Default::default()
        };
        let err = resolve(DocumentFormat::AsciiDoc, &request, &no_attrs()).unwrap_err();
        assert_eq!(err.to_string(), MSG_LONG_FORM_LEVEL);
    }

    #[test]
    fn long_form_at_level_one_is_accepted() {
        let request = PublicationRequest {
            content_kind: Some(ContentKind::LongForm),
            content_level: Some(1),
            ..Default::default()
        };
        let config = resolve(DocumentFormat::AsciiDoc, &request, &no_attrs()).unwrap();
        assert_eq!(config.content_kind, ContentKind::LongForm);
        assert_eq!(config.content_level, 1);
    }

    #[test]
    fn explicit_argument_beats_document_attribute() {
        let doc = extract(
            "= Title\n:content-level: 3\n:content-kind: wiki\n\nBody",
            DocumentFormat::AsciiDoc,
        );
        let request = PublicationRequest {
            content_level: Some(1),
            content_kind: Some(ContentKind::PublicationContent),
            ..Default::default()
        };
        let config = resolve(DocumentFormat::AsciiDoc, &request, &doc.attributes).unwrap();
        assert_eq!(config.content_level, 1);
        assert_eq!(config.content_kind, ContentKind::PublicationContent);
    }

    #[test]
    fn document_attribute_beats_format_default() {
        let doc = extract(
            "= Title\n:content-level: 2\n\nBody",
            DocumentFormat::AsciiDoc,
        );
        let config = resolve(
            DocumentFormat::AsciiDoc,
            &PublicationRequest::default(),
            &doc.attributes,
        )
        .unwrap();
        assert_eq!(config.content_level, 2);
    }

    #[test]
    fn kind_parses_names_and_numbers() {
        assert_eq!(ContentKind::parse("30023").unwrap(), ContentKind::LongForm);
        assert_eq!(ContentKind::parse("wiki").unwrap(), ContentKind::Wiki);
        assert_eq!(
            ContentKind::parse("publication-content").unwrap(),
            ContentKind::PublicationContent
        );
        assert!(ContentKind::parse("30999").is_err());
    }

    #[test]
    fn level_beyond_max_depth_is_rejected() {
        let request = PublicationRequest {
            content_level: Some(9),
            ..Default::default()
        };
        assert!(resolve(DocumentFormat::AsciiDoc, &request, &no_attrs()).is_err());
    }
}
