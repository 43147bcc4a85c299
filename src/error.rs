//! Error types for payload loading and settings parsing.

use thiserror::Error;

/// Result type for overlay operations.
pub type OverlayResult<T> = Result<T, OverlayError>;

/// Errors surfaced while loading results or interpreting settings.
///
/// Nothing in the per-frame render path returns these; a tick degrades to a
/// fallback instead.
#[derive(Debug, Error)]
pub enum OverlayError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("Invalid result payload: {0}")]
    InvalidPayload(String),

    #[error("Invalid mode: {0}")]
    InvalidMode(String),

    #[error("Invalid color: {0}")]
    InvalidColor(String),
}

impl OverlayError {
    /// Create an invalid payload error.
    pub fn invalid_payload(message: impl Into<String>) -> Self {
        Self::InvalidPayload(message.into())
    }
}
