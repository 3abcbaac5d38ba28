//! Relay hint resolution.
//!
//! Relay hints are opaque strings placed inside reference tags. The resolver
//! maps a named category (or a literal URL list) to concrete relay URLs;
//! where the hints come from is the host application's concern.

use indexmap::IndexMap;

/// Supplies relay URLs for a category name or passes literal URLs through.
pub trait RelayConfigResolver: Send + Sync {
    fn resolve(&self, category_or_url: &str) -> Vec<String>;
}

/// Resolver over a fixed category map.
#[derive(Debug, Clone, Default)]
pub struct StaticRelayResolver {
    categories: IndexMap<String, Vec<String>>,
}

impl StaticRelayResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_category(mut self, name: impl Into<String>, relays: Vec<String>) -> Self {
        self.categories.insert(name.into(), relays);
        self
    }
}

impl RelayConfigResolver for StaticRelayResolver {
    fn resolve(&self, category_or_url: &str) -> Vec<String> {
        if category_or_url.starts_with("wss://") || category_or_url.starts_with("ws://") {
            return vec![category_or_url.to_string()];
        }
        self.categories
            .get(category_or_url)
            .cloned()
            .unwrap_or_default()
    }
}
