//! Structured compile/publish report.

use serde::Serialize;

/// One compiled unit as it appears in the report structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SectionSummary {
    pub kind: u16,
    pub d_tag: String,
    pub title: String,
}

/// Layout of the compiled graph: which units are content, which are
/// indexes, and which index is the top-level one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReportStructure {
    pub content_sections: Vec<SectionSummary>,
    pub index_sections: Vec<SectionSummary>,
    pub main_index: Option<SectionSummary>,
}

/// Result of one compile (and optionally publish) run.
#[derive(Debug, Clone, Serialize)]
pub struct PublishReport {
    pub success: bool,
    pub errors: Vec<String>,
    pub document_title: String,
    pub content_sections: usize,
    pub index_sections: usize,
    pub total_events: usize,
    pub structure: ReportStructure,
    /// Normalized attribute dictionary of the source document.
    pub metadata: serde_json::Value,
}
