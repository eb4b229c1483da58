use thiserror::Error;

/// Failure taxonomy shared by every pipeline stage.
///
/// Empty retrieval results are *not* errors; they are represented by empty
/// `SearchResult`s and the fixed cannot-answer response. Errors here always
/// mean an operation could not complete.
#[derive(Debug, Error)]
pub enum Error {
    /// An external provider (embedding, chat, text extraction) failed or
    /// returned malformed data. Never retried internally.
    #[error("provider call failed: {0}")]
    Provider(String),

    /// Vector-store I/O failure.
    #[error("vector store failure: {0}")]
    Store(String),

    /// A required input was missing or invalid. Raised before any external
    /// call is made.
    #[error("invalid input: {0}")]
    Validation(String),
}

impl Error {
    pub fn provider(msg: impl std::fmt::Display) -> Self {
        Self::Provider(msg.to_string())
    }

    pub fn store(msg: impl std::fmt::Display) -> Self {
        Self::Store(msg.to_string())
    }

    pub fn validation(msg: impl std::fmt::Display) -> Self {
        Self::Validation(msg.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
