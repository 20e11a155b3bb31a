//! Error types for the AgroAssist pipeline
//!
//! Every expected, handleable failure mode is an `AssistantError` variant.
//! Stage-local failures are captured into the pipeline state as a
//! `StageError` and carried forward; they are never thrown across stage
//! boundaries.

use thiserror::Error;

/// Main error type for the assistant core
#[derive(Error, Debug)]
pub enum AssistantError {
    /// Empty or malformed query/prompt; fails fast, never retried
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Embedding provider unreachable or rejected the request
    #[error("Embedding backend error: {0}")]
    EmbeddingBackend(String),

    /// Vector store transport failure; retryable (503-equivalent)
    #[error("Retrieval service unavailable: {0}")]
    RetrievalUnavailable(String),

    /// Unexpected store-side fault; non-retryable (500-equivalent)
    #[error("Retrieval internal error: {0}")]
    RetrievalInternal(String),

    /// Generation backend failure or unrecognized response shape
    #[error("Generation backend error: {0}")]
    GenerationBackend(String),

    /// A stage's required input is missing despite no upstream error
    #[error("Internal inconsistency: {0}")]
    InternalInconsistency(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// HTTP client errors
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
}

impl AssistantError {
    /// Whether a caller may reasonably retry the failed operation.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AssistantError::RetrievalUnavailable(_))
    }
}

/// Result type alias for assistant operations
pub type Result<T> = std::result::Result<T, AssistantError>;
