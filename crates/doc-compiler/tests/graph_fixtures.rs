//! Unit-count fixtures for the recursive flattening rule.
//!
//! Counts are derived from reference documents rather than a closed-form
//! formula; each fixture spells out the structure it encodes.

use doc_compiler::{parse_tree, CompiledUnit, DocumentFormat, GraphCompiler, IdMode};

const KIND_INDEX: u16 = 30040;
const KIND_CONTENT: u16 = 30041;

fn compile(title: &str, body: &str, level: u8) -> doc_compiler::CompiledGraph {
    let root = parse_tree(title, body, DocumentFormat::AsciiDoc).unwrap();
    GraphCompiler::new(level, KIND_INDEX, KIND_CONTENT, '=')
        .with_id_mode(IdMode::Static)
        .compile(&root)
        .unwrap()
}

/// Preamble plus two level-2 sections, each holding one level-3 subsection,
/// compiled at level 2: indexes for the root and both sections, content for
/// the preamble and both merged subsections.
#[test]
fn simple_guide_at_level_two() {
    let body = "\
Welcome to the guide.

== Getting Started
=== Install
Install the tools.

== Going Further
=== Publish
Publish your first event.";
    let graph = compile("Simple Nostr Guide", body, 2);
    assert_eq!(graph.content_count(), 3);
    assert_eq!(graph.index_count(), 3);
    assert_eq!(graph.units.len(), 6);
    assert_eq!(graph.main_index, Some(0));
}

/// Two parts with two chapters each, three chapters holding a deeper
/// section, compiled at level 3: six indexes (root, parts, the three
/// chapters with children) and four content units (three merged subsections
/// plus the leaf chapter).
#[test]
fn two_part_book_at_level_three() {
    let body = "\
== Part One
=== Chapter One
==== Origins
First text.
=== Chapter Two
==== Growth
Second text.

== Part Two
=== Chapter Three
==== Decline
Third text.
=== Chapter Four
Fourth text.";
    let graph = compile("Rise and Fall", body, 3);
    assert_eq!(graph.content_count(), 4);
    assert_eq!(graph.index_count(), 6);
    assert_eq!(graph.units.len(), 10);
}

#[test]
fn level_zero_is_always_one_event() {
    let body = "intro\n== A\ntext\n=== A1\ndeep\n== B\nmore";
    let graph = compile("Any Doc", body, 0);
    assert_eq!(graph.units.len(), 1);
    assert_eq!(graph.index_count(), 0);
}

#[test]
fn index_references_carry_child_kinds() {
    let body = "== Part\n=== Chapter\ntext";
    let graph = compile("Doc", body, 2);
    let root = match &graph.units[0] {
        CompiledUnit::Index(index) => index,
        CompiledUnit::Content(_) => panic!("expected root index"),
    };
    assert_eq!(root.refs.len(), 1);
    assert_eq!(root.refs[0].kind, KIND_INDEX);
    let part = match &graph.units[1] {
        CompiledUnit::Index(index) => index,
        CompiledUnit::Content(_) => panic!("expected part index"),
    };
    assert_eq!(part.refs.len(), 1);
    assert_eq!(part.refs[0].kind, KIND_CONTENT);
}
