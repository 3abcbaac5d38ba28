//! Structural header scanning and section tree construction.

use serde::Serialize;

use crate::error::CompileError;

/// Maximum structural header depth. Deeper markers are literal body text.
pub const MAX_DEPTH: u8 = 6;

/// Source markup family of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    AsciiDoc,
    Markdown,
}

impl DocumentFormat {
    /// Header marker character repeated once per depth level.
    pub fn marker(&self) -> char {
        match self {
            DocumentFormat::AsciiDoc => '=',
            DocumentFormat::Markdown => '#',
        }
    }

    /// Detects the format from a file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "adoc" | "asciidoc" | "asc" => Some(DocumentFormat::AsciiDoc),
            "md" | "markdown" => Some(DocumentFormat::Markdown),
            _ => None,
        }
    }
}

impl std::fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DocumentFormat::AsciiDoc => write!(f, "asciidoc"),
            DocumentFormat::Markdown => write!(f, "markdown"),
        }
    }
}

/// One section of a document: its header, direct body lines, and children.
///
/// The document root is the single level-1 section; preamble text before the
/// first sub-header lands in the root's `raw_lines`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionNode {
    pub level: u8,
    pub title: String,
    pub raw_lines: Vec<String>,
    pub children: Vec<SectionNode>,
    pub source_order: usize,
}

impl SectionNode {
    pub fn new(level: u8, title: impl Into<String>, source_order: usize) -> Self {
        Self {
            level,
            title: title.into(),
            raw_lines: Vec::new(),
            children: Vec::new(),
            source_order,
        }
    }

    /// Direct body text of this section, trimmed of blank edges.
    pub fn own_text(&self) -> String {
        self.raw_lines.join("\n").trim().to_string()
    }

    /// Own text plus the literal text of all descendants in document order,
    /// with descendant headers re-rendered using `marker`.
    pub fn merged_text(&self, marker: char) -> String {
        let mut out = String::new();
        self.append_text(marker, true, &mut out);
        out.trim().to_string()
    }

    fn append_text(&self, marker: char, skip_header: bool, out: &mut String) {
        if !skip_header {
            if !out.is_empty() {
                out.push_str("\n\n");
            }
            for _ in 0..self.level {
                out.push(marker);
            }
            out.push(' ');
            out.push_str(&self.title);
            out.push('\n');
        }
        let own = self.own_text();
        if !own.is_empty() {
            if !out.is_empty() && skip_header {
                out.push_str("\n\n");
            } else if !out.is_empty() && !out.ends_with('\n') {
                out.push('\n');
            }
            out.push_str(&own);
        }
        for child in &self.children {
            child.append_text(marker, false, out);
        }
    }

    /// Total number of sections in this subtree, root included.
    pub fn count(&self) -> usize {
        1 + self.children.iter().map(SectionNode::count).sum::<usize>()
    }
}

/// Parses body text (with the level-1 title line already stripped) into a
/// section tree rooted at `title`.
///
/// A header at depth `d` closes every open section at depth >= `d` and opens
/// a child under the nearest open ancestor at depth < `d`. Depth skips are
/// accepted at their literal depth; no intermediate sections are synthesized.
/// Markers deeper than [`MAX_DEPTH`] are not structural and stay body text.
/// Any further level-1 header in the body is a structural error: a document
/// carries exactly one level-1 header.
pub fn parse_tree(
    title: &str,
    body: &str,
    format: DocumentFormat,
) -> Result<SectionNode, CompileError> {
    let marker = format.marker();
    let mut order = 0usize;
    let mut stack: Vec<SectionNode> = vec![SectionNode::new(1, title, order)];

    for line in body.lines() {
        match parse_header(line, marker) {
            Some((1, extra_title)) => {
                return Err(CompileError::Structure(format!(
                    "document must contain exactly one level-1 header, found another: {extra_title}"
                )));
            }
            Some((depth, section_title)) => {
                while stack.len() > 1 && stack.last().map(|s| s.level).unwrap_or(0) >= depth {
                    let done = stack.pop().expect("stack underflow");
                    if let Some(parent) = stack.last_mut() {
                        parent.children.push(done);
                    }
                }
                order += 1;
                stack.push(SectionNode::new(depth, section_title, order));
            }
            None => {
                if let Some(open) = stack.last_mut() {
                    open.raw_lines.push(line.to_string());
                }
            }
        }
    }

    while stack.len() > 1 {
        let done = stack.pop().expect("stack underflow");
        if let Some(parent) = stack.last_mut() {
            parent.children.push(done);
        }
    }

    Ok(stack.pop().expect("root section"))
}

/// Returns `(depth, title)` when the line is a structural header.
fn parse_header(line: &str, marker: char) -> Option<(u8, String)> {
    let trimmed = line.trim_end();
    let depth = trimmed.chars().take_while(|c| *c == marker).count();
    if depth == 0 || depth > MAX_DEPTH as usize {
        return None;
    }
    let rest = &trimmed[depth..];
    if !rest.starts_with(' ') {
        return None;
    }
    let title = rest.trim();
    if title.is_empty() {
        return None;
    }
    Some((depth as u8, title.to_string()))
}
