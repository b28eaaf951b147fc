//! Error types for the MedAssist domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each external collaborator has its own error enum; the top-level
//! [`Error`] carries the one kind a turn can fail with.

use thiserror::Error;

/// The top-level error type for MedAssist operations.
///
/// Classification and retrieval failures are recovered inside a turn, so
/// only a failed completion reaches the caller.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Collaborator errors ---

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError {
        status_code: u16,
        message: String,
    },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Empty completion: {0}")]
    EmptyResponse(String),
}

/// Failures of the follow-up classifier. Always recovered by the dialogue
/// manager, never surfaced from `handle_query`.
#[derive(Debug, Error)]
pub enum ClassifierError {
    #[error("Classification request failed: {0}")]
    Provider(#[from] ProviderError),

    #[error("Malformed classification payload: {0}")]
    Malformed(String),
}

#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error("Failed to read corpus at {path}: {reason}")]
    Io { path: String, reason: String },

    #[error("Embedding generation failed: {0}")]
    EmbeddingFailed(String),

    #[error("Embedding count mismatch: expected {expected}, got {actual}")]
    EmbeddingMismatch { expected: usize, actual: usize },
}
