use thiserror::Error;

/// Errors raised while compiling a document into units.
#[derive(Debug, Error)]
pub enum CompileError {
    /// Document structure violates the single level-1 header invariant.
    #[error("document structure error: {0}")]
    Structure(String),

    /// Two compiled units ended up with the same `d` identifier.
    #[error("duplicate identifier: {0}")]
    DuplicateIdentifier(String),

    /// Content level outside the supported structural depth.
    #[error("invalid content level {0}: must be between 0 and 6")]
    InvalidContentLevel(u8),
}
