//! Hierarchical document compiler for AsciiDoc and Markdown sources.
//!
//! This crate turns a single structured text document into a flat graph of
//! index and content units suitable for rendering as addressable protocol
//! events. It defines:
//!
//! - [`metadata::extract`] - Header attribute extraction into an
//!   [`AttributeDictionary`]
//! - [`section::parse_tree`] - Section tree construction from nested headers
//! - [`GraphCompiler`] - Flattening of the tree into [`CompiledUnit`]s at a
//!   caller-chosen content level
//!
//! The pipeline is synchronous and pure: each compile call is a function from
//! `(document text, configuration)` to `(unit list, errors)` with no state
//! kept between invocations.
//!
//! # Example
//!
//! ```rust
//! use doc_compiler::{extract, parse_tree, DocumentFormat, GraphCompiler, IdMode};
//!
//! let text = "= Guide\n:summary: short\n\nintro\n\n== Basics\nbody text";
//! let doc = extract(text, DocumentFormat::AsciiDoc);
//! let root = parse_tree(doc.attributes.title().unwrap(), &doc.body, DocumentFormat::AsciiDoc)?;
//! let graph = GraphCompiler::new(1, 30040, 30041, '=')
//!     .with_id_mode(IdMode::Static)
//!     .compile(&root)?;
//! assert_eq!(graph.index_count(), 1);
//! # Ok::<(), doc_compiler::CompileError>(())
//! ```

mod error;
mod graph;
mod metadata;
mod section;

pub use error::CompileError;
pub use graph::{
    slugify, CompiledGraph, CompiledUnit, ContentUnit, DTagGenerator, GraphCompiler, IdMode,
    IndexUnit, UnitRef,
};
pub use metadata::{
    extract, parse_author_line, AttrValue, Author, AttributeDictionary, ExtractedDocument,
};
pub use section::{parse_tree, DocumentFormat, SectionNode, MAX_DEPTH};

/// Crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
