//! Flattening of a section tree into index and content units.
//!
//! The content level picks the depth at which the compiler stops producing
//! index units (tables of contents) and merges remaining subtree text into a
//! single content unit. Level 0 ignores structure entirely and yields exactly
//! one content unit for the whole body.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;
use tracing::debug;

use crate::error::CompileError;
use crate::section::{SectionNode, MAX_DEPTH};

/// Identifier generation mode for compiled units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IdMode {
    /// Slug plus a monotonic timestamp suffix; unique across runs.
    #[default]
    Timestamped,
    /// Bare slug; identical input yields identical identifiers.
    Static,
}

/// Ordered reference from an index unit to another compiled unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnitRef {
    pub kind: u16,
    pub d_tag: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relay_hint: Option<String>,
    pub order: usize,
}

/// An empty-content unit whose only purpose is its ordered reference list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexUnit {
    pub kind: u16,
    pub d_tag: String,
    pub title: String,
    pub refs: Vec<UnitRef>,
}

/// A unit carrying actual text payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContentUnit {
    pub kind: u16,
    pub d_tag: String,
    pub title: String,
    pub content: String,
}

/// One compiled unit of the flattened document graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "unit", rename_all = "snake_case")]
pub enum CompiledUnit {
    Index(IndexUnit),
    Content(ContentUnit),
}

impl CompiledUnit {
    pub fn kind(&self) -> u16 {
        match self {
            CompiledUnit::Index(u) => u.kind,
            CompiledUnit::Content(u) => u.kind,
        }
    }

    pub fn d_tag(&self) -> &str {
        match self {
            CompiledUnit::Index(u) => &u.d_tag,
            CompiledUnit::Content(u) => &u.d_tag,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            CompiledUnit::Index(u) => &u.title,
            CompiledUnit::Content(u) => &u.title,
        }
    }

    pub fn is_index(&self) -> bool {
        matches!(self, CompiledUnit::Index(_))
    }
}

/// Output of one compile call: units in document order plus the position of
/// the main index, when one exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledGraph {
    pub units: Vec<CompiledUnit>,
    pub main_index: Option<usize>,
}

impl CompiledGraph {
    pub fn content_count(&self) -> usize {
        self.units.iter().filter(|u| !u.is_index()).count()
    }

    pub fn index_count(&self) -> usize {
        self.units.iter().filter(|u| u.is_index()).count()
    }
}

/// Generates `d` identifiers from unit titles.
///
/// In timestamped mode each identifier carries a strictly increasing
/// millisecond suffix, so two units generated in the same instant still
/// differ. Static mode returns the bare slug for reproducible runs.
#[derive(Debug)]
pub struct DTagGenerator {
    mode: IdMode,
}

/// Strictly increasing across the whole process, so separate compiles in the
/// same millisecond still produce distinct suffixes.
static LAST_STAMP: AtomicU64 = AtomicU64::new(0);

impl DTagGenerator {
    pub fn new(mode: IdMode) -> Self {
        Self { mode }
    }

    pub fn generate(&mut self, title: &str) -> String {
        self.generate_with_suffix(title, "")
    }

    /// Generates an identifier with a fixed slug suffix inserted before any
    /// timestamp, e.g. `-content` for an index node's own-text unit.
    pub fn generate_with_suffix(&mut self, title: &str, suffix: &str) -> String {
        let base = format!("{}{}", slugify(title), suffix);
        match self.mode {
            IdMode::Static => base,
            IdMode::Timestamped => format!("{}-{}", base, self.next_stamp()),
        }
    }

    fn next_stamp(&mut self) -> u64 {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64;
        let mut last = LAST_STAMP.load(Ordering::Relaxed);
        loop {
            let next = now.max(last + 1);
            match LAST_STAMP.compare_exchange(last, next, Ordering::Relaxed, Ordering::Relaxed) {
                Ok(_) => return next,
                Err(actual) => last = actual,
            }
        }
    }
}

/// Lowercase, dash-joined slug of a title. Alphanumerics are kept, every
/// other character becomes a dash, and dash runs collapse.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut last_dash = true;
    for c in title.chars() {
        if c.is_alphanumeric() {
            for lower in c.to_lowercase() {
                slug.push(lower);
            }
            last_dash = false;
        } else if !last_dash {
            slug.push('-');
            last_dash = true;
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

/// Flattens a section tree into compiled units.
pub struct GraphCompiler {
    content_level: u8,
    index_kind: u16,
    content_kind: u16,
    marker: char,
    root_identifier: Option<String>,
    ids: DTagGenerator,
}

impl GraphCompiler {
    pub fn new(content_level: u8, index_kind: u16, content_kind: u16, marker: char) -> Self {
        Self {
            content_level,
            index_kind,
            content_kind,
            marker,
            root_identifier: None,
            ids: DTagGenerator::new(IdMode::Timestamped),
        }
    }

    /// Switches identifier generation mode (default: timestamped).
    pub fn with_id_mode(mut self, mode: IdMode) -> Self {
        self.ids = DTagGenerator::new(mode);
        self
    }

    /// Uses a caller-supplied identifier for the top-level unit instead of a
    /// generated one.
    pub fn with_root_identifier(mut self, identifier: Option<String>) -> Self {
        self.root_identifier = identifier;
        self
    }

    /// Compiles the tree rooted at `root` into a unit graph.
    ///
    /// Fatal on duplicate identifiers; on error no units are returned.
    pub fn compile(mut self, root: &SectionNode) -> Result<CompiledGraph, CompileError> {
        if self.content_level > MAX_DEPTH {
            return Err(CompileError::InvalidContentLevel(self.content_level));
        }

        let graph = if self.content_level == 0 {
            let d_tag = match self.root_identifier.take() {
                Some(id) => id,
                None => self.ids.generate(&root.title),
            };
            let unit = CompiledUnit::Content(ContentUnit {
                kind: self.content_kind,
                d_tag,
                title: root.title.clone(),
                content: root.merged_text(self.marker),
            });
            CompiledGraph {
                units: vec![unit],
                main_index: None,
            }
        } else {
            let units = self.compile_node(root, true);
            CompiledGraph {
                units,
                main_index: Some(0),
            }
        };

        check_unique(&graph.units)?;
        debug!(
            content = graph.content_count(),
            index = graph.index_count(),
            "compiled document graph"
        );
        Ok(graph)
    }

    /// Compiles one node depth-first. The node's own unit is first in the
    /// returned list; document order is preserved throughout.
    fn compile_node(&mut self, node: &SectionNode, is_root: bool) -> Vec<CompiledUnit> {
        let treat_as_index =
            node.level <= self.content_level && (!node.children.is_empty() || is_root);

        if !treat_as_index {
            let d_tag = self.ids.generate(&node.title);
            return vec![CompiledUnit::Content(ContentUnit {
                kind: self.content_kind,
                d_tag,
                title: node.title.clone(),
                content: node.merged_text(self.marker),
            })];
        }

        let d_tag = if is_root {
            match self.root_identifier.take() {
                Some(id) => id,
                None => self.ids.generate(&node.title),
            }
        } else {
            self.ids.generate(&node.title)
        };

        let mut refs: Vec<UnitRef> = Vec::new();
        let mut tail: Vec<CompiledUnit> = Vec::new();

        // The node's own direct text becomes the first referenced content
        // unit. An index over trivial content (no children) always carries
        // exactly one content unit, even when the text is empty.
        let own = node.own_text();
        if !own.is_empty() || node.children.is_empty() {
            let own_d = self.ids.generate_with_suffix(&node.title, "-content");
            refs.push(UnitRef {
                kind: self.content_kind,
                d_tag: own_d.clone(),
                relay_hint: None,
                order: refs.len(),
            });
            tail.push(CompiledUnit::Content(ContentUnit {
                kind: self.content_kind,
                d_tag: own_d,
                title: node.title.clone(),
                content: own,
            }));
        }

        for child in &node.children {
            let child_units = self.compile_node(child, false);
            if let Some(first) = child_units.first() {
                refs.push(UnitRef {
                    kind: first.kind(),
                    d_tag: first.d_tag().to_string(),
                    relay_hint: None,
                    order: refs.len(),
                });
            }
            tail.extend(child_units);
        }

        let mut units = vec![CompiledUnit::Index(IndexUnit {
            kind: self.index_kind,
            d_tag,
            title: node.title.clone(),
            refs,
        })];
        units.extend(tail);
        units
    }
}

fn check_unique(units: &[CompiledUnit]) -> Result<(), CompileError> {
    let mut seen = HashSet::new();
    for unit in units {
        if !seen.insert(unit.d_tag()) {
            return Err(CompileError::DuplicateIdentifier(unit.d_tag().to_string()));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::section::{parse_tree, DocumentFormat};

    const KIND_INDEX: u16 = 30040;
    const KIND_CONTENT: u16 = 30041;

    fn compile(body: &str, level: u8) -> CompiledGraph {
        let root = parse_tree("Doc", body, DocumentFormat::AsciiDoc).unwrap();
        GraphCompiler::new(level, KIND_INDEX, KIND_CONTENT, '=')
            .with_id_mode(IdMode::Static)
            .compile(&root)
            .unwrap()
    }

    #[test]
    fn level_zero_yields_single_content_unit() {
        let graph = compile("intro\n== A\ntext\n=== A1\ndeep", 0);
        assert_eq!(graph.units.len(), 1);
        assert_eq!(graph.index_count(), 0);
        assert_eq!(graph.main_index, None);
        match &graph.units[0] {
            CompiledUnit::Content(unit) => {
                assert!(unit.content.contains("intro"));
                assert!(unit.content.contains("== A"));
                assert!(unit.content.contains("deep"));
                assert!(!unit.content.contains("= Doc"));
            }
            CompiledUnit::Index(_) => panic!("expected content unit"),
        }
    }

    #[test]
    fn trivial_document_still_gets_an_index_at_level_one() {
        let graph = compile("just text", 1);
        assert_eq!(graph.index_count(), 1);
        assert_eq!(graph.content_count(), 1);
        assert_eq!(graph.main_index, Some(0));
        match &graph.units[0] {
            CompiledUnit::Index(index) => {
                assert_eq!(index.refs.len(), 1);
                assert_eq!(index.refs[0].kind, KIND_CONTENT);
                assert_eq!(index.refs[0].d_tag, graph.units[1].d_tag());
            }
            CompiledUnit::Content(_) => panic!("expected index first"),
        }
    }

    #[test]
    fn leaf_sections_below_level_merge_descendants() {
        // Sections at depth 2 are past the content level, so each becomes a
        // single content unit including its deeper text.
        let graph = compile("== A\na text\n=== A1\ndeep\n== B\nb text", 1);
        assert_eq!(graph.index_count(), 1);
        assert_eq!(graph.content_count(), 2);
        let a = match &graph.units[1] {
            CompiledUnit::Content(u) => u,
            _ => panic!("expected content"),
        };
        assert!(a.content.contains("a text"));
        assert!(a.content.contains("=== A1"));
        assert!(a.content.contains("deep"));
    }

    #[test]
    fn reference_order_matches_document_order() {
        let graph = compile("preamble\n== One\ntext\n== Two\ntext\n== Three\ntext", 1);
        let index = match &graph.units[0] {
            CompiledUnit::Index(u) => u,
            _ => panic!("expected index"),
        };
        // Preamble content first, then the three merged sections.
        assert_eq!(index.refs.len(), 4);
        let orders: Vec<usize> = index.refs.iter().map(|r| r.order).collect();
        assert_eq!(orders, vec![0, 1, 2, 3]);
        assert_eq!(index.refs[0].d_tag, "doc-content");
        assert_eq!(index.refs[1].d_tag, "one");
        assert_eq!(index.refs[2].d_tag, "two");
        assert_eq!(index.refs[3].d_tag, "three");
    }

    #[test]
    fn nested_levels_produce_nested_indexes() {
        let body = "== Part One\n=== Chapter One\nc1\n=== Chapter Two\nc2\n== Part Two\n=== Chapter Three\nc3";
        let graph = compile(body, 2);
        // Indexes: root, Part One, Part Two. Content: three chapters.
        assert_eq!(graph.index_count(), 3);
        assert_eq!(graph.content_count(), 3);
        assert_eq!(graph.units.len(), 6);
        let root = match &graph.units[0] {
            CompiledUnit::Index(u) => u,
            _ => panic!("expected root index"),
        };
        assert_eq!(root.refs.len(), 2);
        assert!(root.refs.iter().all(|r| r.kind == KIND_INDEX));
    }

    #[test]
    fn index_content_is_always_empty() {
        let graph = compile("preamble\n== A\ntext", 1);
        for unit in &graph.units {
            if let CompiledUnit::Index(index) = unit {
                assert!(!index.refs.is_empty());
            }
        }
        // Index units carry no content field at all; only contents do.
        assert_eq!(graph.index_count(), 1);
    }

    #[test]
    fn static_mode_is_reproducible() {
        let body = "intro\n== A\ntext\n== B\ntext";
        let first = compile(body, 1);
        let second = compile(body, 1);
        let first_tags: Vec<&str> = first.units.iter().map(|u| u.d_tag()).collect();
        let second_tags: Vec<&str> = second.units.iter().map(|u| u.d_tag()).collect();
        assert_eq!(first_tags, second_tags);
    }

    #[test]
    fn timestamped_mode_differs_between_runs() {
        let root = parse_tree("Doc", "intro\n== A\ntext", DocumentFormat::AsciiDoc).unwrap();
        let first = GraphCompiler::new(1, KIND_INDEX, KIND_CONTENT, '=')
            .compile(&root)
            .unwrap();
        let second = GraphCompiler::new(1, KIND_INDEX, KIND_CONTENT, '=')
            .compile(&root)
            .unwrap();
        assert_ne!(first.units[0].d_tag(), second.units[0].d_tag());
    }

    #[test]
    fn all_identifiers_are_unique() {
        let body = "intro\n== A\ntext\n=== A1\nx\n== B\ntext";
        let graph = compile(body, 2);
        let mut seen = std::collections::HashSet::new();
        for unit in &graph.units {
            assert!(seen.insert(unit.d_tag().to_string()), "dup {}", unit.d_tag());
        }
    }

    #[test]
    fn duplicate_section_titles_collide_in_static_mode() {
        let body = "== Notes\na\n== Notes\nb";
        let root = parse_tree("Doc", body, DocumentFormat::AsciiDoc).unwrap();
        let err = GraphCompiler::new(1, KIND_INDEX, KIND_CONTENT, '=')
            .with_id_mode(IdMode::Static)
            .compile(&root)
            .unwrap_err();
        assert!(matches!(err, CompileError::DuplicateIdentifier(_)));
    }

    #[test]
    fn explicit_root_identifier_is_used_verbatim() {
        let root = parse_tree("Doc", "text", DocumentFormat::AsciiDoc).unwrap();
        let graph = GraphCompiler::new(1, KIND_INDEX, KIND_CONTENT, '=')
            .with_id_mode(IdMode::Static)
            .with_root_identifier(Some("my-book-v2".to_string()))
            .compile(&root)
            .unwrap();
        assert_eq!(graph.units[0].d_tag(), "my-book-v2");
    }

    #[test]
    fn slugify_lowercases_and_collapses() {
        assert_eq!(slugify("Simple Nostr Guide"), "simple-nostr-guide");
        assert_eq!(slugify("  Lots -- of !! noise  "), "lots-of-noise");
        assert_eq!(slugify("Chapter 12"), "chapter-12");
    }

    #[test]
    fn content_level_above_max_depth_is_rejected() {
        let root = parse_tree("Doc", "text", DocumentFormat::AsciiDoc).unwrap();
        let err = GraphCompiler::new(7, KIND_INDEX, KIND_CONTENT, '=')
            .compile(&root)
            .unwrap_err();
        assert!(matches!(err, CompileError::InvalidContentLevel(7)));
    }
}
