//! Publication content section handler.

use regex::Regex;

use crate::events::{EventDraft, EventTag, KIND_PUBLICATION_CONTENT};
use crate::kinds::{common_tags, validate_common, EventMeta, KindHandler, RenderContext};
use crate::Error;

/// Renders content sections, tagging in-text `[[glossary]]` references.
pub struct PublicationContentHandler {
    wikilinks: Regex,
}

impl PublicationContentHandler {
    pub fn new() -> Self {
        let wikilinks = Regex::new(r"\[\[([^\]]+)\]\]").expect("static regex");
        Self { wikilinks }
    }

    fn wikilink_tags(&self, content: &str) -> Vec<EventTag> {
        let mut tags = Vec::new();
        for caps in self.wikilinks.captures_iter(content) {
            // A link may carry a display part: [[target|shown text]].
            let target = caps[1].split('|').next().unwrap_or("").trim();
            if !target.is_empty() {
                tags.push(EventTag::single("wikilink", target));
            }
        }
        tags
    }
}

impl Default for PublicationContentHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl KindHandler for PublicationContentHandler {
    fn kind(&self) -> u16 {
        KIND_PUBLICATION_CONTENT
    }

    fn name(&self) -> &'static str {
        "publication-content"
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
        let mut draft = EventDraft::new(KIND_PUBLICATION_CONTENT, content, meta.published_at);
        draft.tags = common_tags(meta);
        draft.tags.extend(self.wikilink_tags(content));
        Ok(draft)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::tag_values;

    fn meta() -> EventMeta {
        EventMeta {
            d_tag: "basics".to_string(),
            title: "Basics".to_string(),
            published_at: 1_700_000_000,
            ..Default::default()
        }
    }

    #[test]
    fn wikilinks_become_tags() {
        let handler = PublicationContentHandler::new();
        let content = "See [[Relay]] and [[Event Kinds|the kinds list]] for more.";
        let draft = handler
            .render(&meta(), content, &RenderContext::default())
            .unwrap();
        assert_eq!(
            tag_values(&draft.tags, "wikilink"),
            vec!["Relay", "Event Kinds"]
        );
    }

    #[test]
    fn content_without_links_has_no_wikilink_tags() {
        let handler = PublicationContentHandler::new();
        let draft = handler
            .render(&meta(), "plain text", &RenderContext::default())
            .unwrap();
        assert!(tag_values(&draft.tags, "wikilink").is_empty());
        assert_eq!(draft.content, "plain text");
    }
}
