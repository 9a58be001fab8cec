//! Error taxonomy for quote operations

use thiserror::Error;

use crate::storage::StorageError;

/// Errors returned by the quote store and the sync reconciler
#[derive(Error, Debug)]
pub enum QuoteError {
    /// A required field was empty after trimming
    #[error("Quote {field} cannot be empty")]
    Validation { field: &'static str },

    /// Import payload had the wrong shape
    #[error("Invalid quote data: {0}")]
    Format(String),

    /// The remote feed could not be reached or answered with an error status
    #[error("Network error: {0}")]
    Network(String),

    /// JSON could not be parsed
    #[error("Malformed JSON: {0}")]
    Parse(#[from] serde_json::Error),

    /// The persistence backend failed
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl QuoteError {
    /// Short label for the kind of failure
    pub fn kind(&self) -> &'static str {
        match self {
            QuoteError::Validation { .. } => "validation",
            QuoteError::Format(_) => "format",
            QuoteError::Network(_) => "network",
            QuoteError::Parse(_) => "parse",
            QuoteError::Storage(_) => "storage",
        }
    }
}

/// Result type for quote operations
pub type QuoteResult<T> = Result<T, QuoteError>;
