//! Publication index (table of contents) handler.
//!
//! Index events never carry content: their payload is the ordered list of
//! `a` reference tags addressing the units they collect.

use crate::events::{EventDraft, EventTag, KIND_PUBLICATION_INDEX};
use crate::kinds::{common_tags, validate_common, EventMeta, KindHandler, RenderContext};
use crate::Error;

const AUTO_UPDATE_VALUES: [&str; 5] = ["yes", "no", "ask", "true", "false"];

pub struct PublicationIndexHandler;

impl PublicationIndexHandler {
    pub fn new() -> Self {
        Self
    }
}

impl Default for PublicationIndexHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl KindHandler for PublicationIndexHandler {
    fn kind(&self) -> u16 {
        KIND_PUBLICATION_INDEX
    }

    fn name(&self) -> &'static str {
        "publication-index"
    }

    fn required_fields(&self) -> &'static [&'static str] {
        &["d", "title", "auto-update"]
    }

    fn optional_fields(&self) -> &'static [&'static str] {
        &[
            "summary",
            "image",
            "t",
            "published_at",
            "author",
            "type",
            "version",
            "published_by",
            "published_on",
            "source",
            "isbn",
            "original-author",
            "original-event",
        ]
    }

    fn validate(&self, meta: &EventMeta) -> Vec<String> {
        let mut errors = validate_common(meta);
        match meta.fields.get("auto-update") {
            None => errors.push("auto-update is required for publication indexes".to_string()),
            Some(value) => {
                if !AUTO_UPDATE_VALUES.contains(&value.to_ascii_lowercase().as_str()) {
                    errors.push(format!(
                        "auto-update must be one of yes/no/ask/true/false, got: {value}"
                    ));
                }
            }
        }
        errors
    }

    fn render(
        &self,
        meta: &EventMeta,
        _content: &str,
        ctx: &RenderContext,
    ) -> Result<EventDraft, Error> {
        // Content is forced empty regardless of what the caller passed.
        let mut draft = EventDraft::new(KIND_PUBLICATION_INDEX, "", meta.published_at);
        draft.tags = common_tags(meta);

        for field in [
            "author",
            "auto-update",
            "type",
            "version",
            "published_by",
            "published_on",
            "source",
        ] {
            if let Some(value) = meta.fields.get(field) {
                draft.push_tag(EventTag::single(field, value.clone()));
            }
        }

        if let Some(isbn) = meta.fields.get("isbn") {
            let value = if isbn.starts_with("isbn:") {
                isbn.clone()
            } else {
                format!("isbn:{isbn}")
            };
            draft.push_tag(EventTag::single("i", value));
        }

        // Derivative-work provenance: original author and original event.
        if let Some(original) = meta.fields.get("original-author") {
            draft.push_tag(EventTag::single("p", original.clone()));
        }
        if let Some(original) = meta.fields.get("original-event") {
            draft.push_tag(EventTag::single("E", original.clone()));
        }

        for unit_ref in &meta.refs {
            let address = format!("{}:{}:{}", unit_ref.kind, ctx.pubkey, unit_ref.d_tag);
            let mut values = vec![address];
            if let Some(hint) = unit_ref.relay_hint.as_ref().or(ctx.relay_hint.as_ref()) {
                values.push(hint.clone());
            }
            draft.push_tag(EventTag::new("a", values));
            if let Some(event_id) = ctx.event_hints.get(&unit_ref.d_tag) {
                draft.push_tag(EventTag::single("e", event_id.clone()));
            }
        }

        Ok(draft)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use doc_compiler::UnitRef;

    fn meta() -> EventMeta {
        let mut meta = EventMeta {
            d_tag: "my-book".to_string(),
            title: "My Book".to_string(),
            published_at: 1_700_000_000,
            ..Default::default()
        };
        meta.fields
            .insert("auto-update".to_string(), "yes".to_string());
        meta.refs = vec![
            UnitRef {
                kind: 30041,
                d_tag: "chapter-one".to_string(),
                relay_hint: None,
                order: 0,
            },
            UnitRef {
                kind: 30041,
                d_tag: "chapter-two".to_string(),
                relay_hint: Some("wss://hint.example".to_string()),
                order: 1,
            },
        ];
        meta
    }

    #[test]
    fn content_is_forced_empty() {
        let handler = PublicationIndexHandler::new();
        let draft = handler
            .render(&meta(), "should be dropped", &RenderContext::default())
            .unwrap();
        assert!(draft.content.is_empty());
    }

    #[test]
    fn references_render_as_ordered_a_tags() {
        let handler = PublicationIndexHandler::new();
        let ctx = RenderContext::new("pk");
        let draft = handler.render(&meta(), "", &ctx).unwrap();
        let a_tags: Vec<&EventTag> = draft.tags.iter().filter(|t| t.name == "a").collect();
        assert_eq!(a_tags.len(), 2);
        assert_eq!(a_tags[0].values[0], "30041:pk:chapter-one");
        assert_eq!(a_tags[1].values[0], "30041:pk:chapter-two");
        assert_eq!(a_tags[1].values[1], "wss://hint.example");
    }

    #[test]
    fn event_hints_add_e_tags() {
        let handler = PublicationIndexHandler::new();
        let mut ctx = RenderContext::new("pk");
        ctx.event_hints
            .insert("chapter-one".to_string(), "eventid1".to_string());
        let draft = handler.render(&meta(), "", &ctx).unwrap();
        let e_tags: Vec<&EventTag> = draft.tags.iter().filter(|t| t.name == "e").collect();
        assert_eq!(e_tags.len(), 1);
        assert_eq!(e_tags[0].values[0], "eventid1");
    }

    #[test]
    fn missing_auto_update_is_invalid() {
        let handler = PublicationIndexHandler::new();
        let mut m = meta();
        m.fields.shift_remove("auto-update");
        let errors = handler.validate(&m);
        assert!(errors.iter().any(|e| e.contains("auto-update is required")));
    }

    #[test]
    fn auto_update_must_be_boolean_like() {
        let handler = PublicationIndexHandler::new();
        let mut m = meta();
        m.fields
            .insert("auto-update".to_string(), "sometimes".to_string());
        let errors = handler.validate(&m);
        assert!(errors.iter().any(|e| e.contains("auto-update must be")));
    }

    #[test]
    fn isbn_gets_prefixed_i_tag() {
        let handler = PublicationIndexHandler::new();
        let mut m = meta();
        m.fields
            .insert("isbn".to_string(), "978-3-16-148410-0".to_string());
        let draft = handler.render(&m, "", &RenderContext::default()).unwrap();
        let i = draft.tags.iter().find(|t| t.name == "i").unwrap();
        assert_eq!(i.values[0], "isbn:978-3-16-148410-0");
    }

    #[test]
    fn derivative_tags_render_when_present() {
        let handler = PublicationIndexHandler::new();
        let mut m = meta();
        m.fields
            .insert("original-author".to_string(), "origpk".to_string());
        m.fields
            .insert("original-event".to_string(), "origid".to_string());
        let draft = handler.render(&m, "", &RenderContext::default()).unwrap();
        assert!(draft
            .tags
            .iter()
            .any(|t| t.name == "p" && t.values[0] == "origpk"));
        assert!(draft
            .tags
            .iter()
            .any(|t| t.name == "E" && t.values[0] == "origid"));
    }
}
