use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Configuration constraint violation. The message text is part of the
    /// external contract and is displayed verbatim.
    #[error("{0}")]
    Constraint(String),

    #[error(transparent)]
    Compile(#[from] doc_compiler::CompileError),

    #[error("unknown event kind: {0}")]
    UnknownKind(u16),

    #[error("unknown content kind: {0}")]
    UnknownContentKind(String),

    #[error("unsupported file extension: {0}")]
    UnsupportedExtension(String),

    #[error("nostr client error: {0}")]
    NostrClient(#[from] nostr_sdk::client::Error),

    #[error("nostr key error: {0}")]
    NostrKey(#[from] nostr_sdk::nostr::key::Error),

    #[error("nostr tag error: {0}")]
    NostrTag(#[from] nostr_sdk::nostr::event::tag::Error),

    #[error("serde json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("publish quorum failed: required {required}, got {actual}")]
    Quorum { required: usize, actual: usize },

    #[error("operation timed out")]
    Timeout,
}
