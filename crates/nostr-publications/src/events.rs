//! Event drafts and tag plumbing.
//!
//! A [`EventDraft`] is a fully tagged but unsigned event: the compiler's
//! output and the publisher's input. Signing and transport belong to the
//! publisher side.

use std::time::{SystemTime, UNIX_EPOCH};

use nostr_sdk::prelude::*;
use serde::Serialize;

use crate::Error;

/// NIP-23 long-form article.
pub const KIND_LONG_FORM: u16 = 30023;
/// Publication index (table of contents, empty content).
pub const KIND_PUBLICATION_INDEX: u16 = 30040;
/// Publication content section.
pub const KIND_PUBLICATION_CONTENT: u16 = 30041;
/// NIP-54 wiki article.
pub const KIND_WIKI: u16 = 30818;
/// Plain note, used for companion notifications.
pub const KIND_NOTIFICATION: u16 = 1;

/// One event tag: a name and its ordered values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventTag {
    pub name: String,
    pub values: Vec<String>,
}

impl EventTag {
    pub fn new(name: impl Into<String>, values: Vec<String>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    pub fn single(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(name, vec![value.into()])
    }

    pub fn to_sdk_tag(&self) -> Result<Tag, Error> {
        let mut parts = Vec::with_capacity(1 + self.values.len());
        parts.push(self.name.clone());
        parts.extend(self.values.clone());
        Ok(Tag::parse(parts)?)
    }
}

/// A rendered, unsigned event ready for hand-off to a publisher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventDraft {
    pub kind: u16,
    pub content: String,
    pub tags: Vec<EventTag>,
    pub created_at: u64,
}

impl EventDraft {
    pub fn new(kind: u16, content: impl Into<String>, created_at: u64) -> Self {
        Self {
            kind,
            content: content.into(),
            tags: Vec::new(),
            created_at,
        }
    }

    pub fn push_tag(&mut self, tag: EventTag) {
        self.tags.push(tag);
    }

    /// First value of the `d` tag, when present.
    pub fn d_tag(&self) -> Option<&str> {
        tag_value(&self.tags, "d")
    }

    /// Converts the draft into an SDK event builder for signing and sending.
    pub fn to_builder(&self) -> Result<EventBuilder, Error> {
        let mut tags = Vec::with_capacity(self.tags.len());
        for tag in &self.tags {
            tags.push(tag.to_sdk_tag()?);
        }
        Ok(EventBuilder::new(Kind::Custom(self.kind), self.content.clone())
            .custom_created_at(Timestamp::from(self.created_at))
            .tags(tags))
    }

    /// Address of a parameterized replaceable event: `kind:pubkey:d-tag`.
    pub fn address(&self, pubkey: &str) -> Option<String> {
        self.d_tag()
            .map(|d| format!("{}:{}:{}", self.kind, pubkey, d))
    }
}

pub fn d_tag(id: &str) -> EventTag {
    EventTag::single("d", id)
}

pub fn title_tag(title: &str) -> EventTag {
    EventTag::single("title", title)
}

pub fn t_tag(topic: &str) -> EventTag {
    EventTag::single("t", topic)
}

pub fn tag_value<'a>(tags: &'a [EventTag], name: &str) -> Option<&'a str> {
    tags.iter()
        .find(|tag| tag.name == name)
        .and_then(|tag| tag.values.first().map(|s| s.as_str()))
}

pub fn tag_values<'a>(tags: &'a [EventTag], name: &str) -> Vec<&'a str> {
    tags.iter()
        .filter(|tag| tag.name == name)
        .filter_map(|tag| tag.values.first().map(|s| s.as_str()))
        .collect()
}

pub fn unix_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
