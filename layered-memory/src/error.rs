//! Error types for layered-memory

use thiserror::Error;

/// Errors that can occur in the memory subsystem.
///
/// Coordinator operations are total and report degraded conditions through
/// return values; errors here only surface from explicit fallible helpers
/// such as serializing caller content or parsing ids from strings.
#[derive(Debug, Error)]
pub enum MemoryError {
    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// UUID parsing error
    #[error("UUID error: {0}")]
    Uuid(#[from] uuid::Error),

    /// Memory not found
    #[error("Memory not found: {0}")]
    NotFound(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl MemoryError {
    /// Create a not found error
    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound(id.into())
    }

    /// Create a generic error
    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }
}

/// Result type for memory operations
pub type Result<T> = std::result::Result<T, MemoryError>;
