//! NIP-54 wiki article handler.

use crate::events::{EventDraft, EventTag, KIND_WIKI};
use crate::kinds::{common_tags, validate_common, EventMeta, KindHandler, RenderContext};
use crate::Error;

/// NIP-54 identifier normalization: every non-ASCII-letter character becomes
/// a dash, the result is lowercased, and dash runs collapse. Stricter than
/// the generic slug (accented letters and digits become dashes too) and
/// never timestamp-suffixed.
pub fn normalize_wiki_identifier(title: &str) -> String {
    let mut out = String::with_capacity(title.len());
    let mut last_dash = true;
    for c in title.chars() {
        if c.is_ascii_alphabetic() {
            out.push(c.to_ascii_lowercase());
            last_dash = false;
        } else if !last_dash {
            out.push('-');
            last_dash = true;
        }
    }
    while out.ends_with('-') {
        out.pop();
    }
    out
}

pub struct WikiHandler;

impl WikiHandler {
    pub fn new() -> Self {
        Self
    }
}

impl Default for WikiHandler {
    fn default() -> Self {
        Self::new()
    }
}

/// Splits a fork/defer field into its `(address, event-id)` pair.
fn parse_reference_pair(value: &str) -> Option<(String, String)> {
    let mut parts = value.splitn(2, ',').map(str::trim);
    let address = parts.next()?;
    let event_id = parts.next()?;
    if address.is_empty() || event_id.is_empty() {
        return None;
    }
    // Addresses look like kind:pubkey:identifier.
    if address.split(':').count() != 3 {
        return None;
    }
    Some((address.to_string(), event_id.to_string()))
}

impl KindHandler for WikiHandler {
    fn kind(&self) -> u16 {
        KIND_WIKI
    }

    fn name(&self) -> &'static str {
        "wiki"
    }

    fn required_fields(&self) -> &'static [&'static str] {
        &["d", "title"]
    }

    fn optional_fields(&self) -> &'static [&'static str] {
        &["summary", "image", "t", "published_at", "fork", "defer"]
    }

    fn validate(&self, meta: &EventMeta) -> Vec<String> {
        let mut errors = validate_common(meta);
        for field in ["fork", "defer"] {
            if let Some(value) = meta.fields.get(field) {
                if parse_reference_pair(value).is_none() {
                    errors.push(format!(
                        "{field} must be an address,event-id pair, got: {value}"
                    ));
                }
            }
        }
        errors
    }

    fn render(
        &self,
        meta: &EventMeta,
        content: &str,
        _ctx: &RenderContext,
    ) -> Result<EventDraft, Error> {
        let mut draft = EventDraft::new(KIND_WIKI, content, meta.published_at);
        draft.tags = common_tags(meta);
        for field in ["fork", "defer"] {
            if let Some((address, event_id)) =
                meta.fields.get(field).and_then(|v| parse_reference_pair(v))
            {
                draft.push_tag(EventTag::new(
                    "a",
                    vec![address, field.to_string()],
                ));
                draft.push_tag(EventTag::new("e", vec![event_id, field.to_string()]));
            }
        }
        Ok(draft)
    }

    fn normalize_identifier(&self, title: &str) -> Option<String> {
        Some(normalize_wiki_identifier(title))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalization_strips_accents_and_punctuation() {
        assert_eq!(normalize_wiki_identifier("Café Guide!"), "caf-guide");
        assert_eq!(normalize_wiki_identifier("Hello, World"), "hello-world");
        // Digits are not ASCII letters under this rule.
        assert_eq!(normalize_wiki_identifier("Top 10 Tips"), "top-tips");
        assert_eq!(normalize_wiki_identifier("---"), "");
    }

    #[test]
    fn handler_overrides_identifier_generation() {
        let handler = WikiHandler::new();
        assert_eq!(
            handler.normalize_identifier("Café Guide!").as_deref(),
            Some("caf-guide")
        );
    }

    #[test]
    fn fork_pair_renders_address_and_event_tags() {
        let handler = WikiHandler::new();
        let mut meta = EventMeta {
            d_tag: "page".to_string(),
            title: "Page".to_string(),
            published_at: 1_700_000_000,
            ..Default::default()
        };
        meta.fields.insert(
            "fork".to_string(),
            "30818:origpk:page,origevent".to_string(),
        );
        assert!(handler.validate(&meta).is_empty());
        let draft = handler
            .render(&meta, "text", &RenderContext::default())
            .unwrap();
        assert!(draft
            .tags
            .iter()
            .any(|t| t.name == "a" && t.values == vec!["30818:origpk:page", "fork"]));
        assert!(draft
            .tags
            .iter()
            .any(|t| t.name == "e" && t.values == vec!["origevent", "fork"]));
    }

    #[test]
    fn malformed_defer_pair_is_invalid() {
        let handler = WikiHandler::new();
        let mut meta = EventMeta {
            d_tag: "page".to_string(),
            title: "Page".to_string(),
            published_at: 1_700_000_000,
            ..Default::default()
        };
        meta.fields
            .insert("defer".to_string(), "not-an-address".to_string());
        let errors = handler.validate(&meta);
        assert!(errors.iter().any(|e| e.contains("defer must be")));
    }
}
