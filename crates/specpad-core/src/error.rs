//! Error types for document persistence

use std::path::PathBuf;
use thiserror::Error;

/// Document error type
#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("Failed to load document from {}: {source}", .path.display())]
    Load {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to flush document to {}: {source}", .path.display())]
    Flush {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl DocumentError {
    /// Whether the error came from the initial load
    pub fn is_load(&self) -> bool {
        matches!(self, DocumentError::Load { .. })
    }

    /// Whether the error came from a flush tick
    pub fn is_flush(&self) -> bool {
        matches!(self, DocumentError::Flush { .. })
    }
}

/// Result type for document operations
pub type Result<T> = std::result::Result<T, DocumentError>;
