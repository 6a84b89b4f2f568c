//! Error taxonomy
//!
//! Only the validation entry point treats an error as fatal. Every other
//! path recovers locally: the loader falls back to static markup, the link
//! builder returns its input, the renderer skips the step.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SiteError {
    #[error("Content unavailable: {0}")]
    ContentUnavailable(String),

    #[error("Content validation failed with {0} violation(s)")]
    SchemaViolation(usize),

    #[error("Unexpected schema metadata: {0}")]
    SchemaMetadata(String),

    #[error("Malformed URL: {0}")]
    MalformedUrl(String),

    #[error("Missing element: {0}")]
    MissingElement(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

pub type SiteResult<T> = Result<T, SiteError>;
