//! Error types for imsg

use thiserror::Error;

/// Result type alias for imsg operations
pub type Result<T> = std::result::Result<T, ImsgError>;

/// Main error type for imsg
#[derive(Error, Debug)]
pub enum ImsgError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Store '{store}' unavailable at {path}: {reason}")]
    StoreUnavailable {
        store: String,
        path: String,
        reason: String,
    },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("All {} contact sources failed: {}", failures.len(), failures.join("; "))]
    AllSourcesFailed { failures: Vec<String> },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl ImsgError {
    /// Get error code for MCP protocol
    pub fn code(&self) -> i64 {
        match self {
            ImsgError::InvalidInput(_) => -32602,
            ImsgError::StoreUnavailable { .. } | ImsgError::AllSourcesFailed { .. } => -32002,
            _ => -32000,
        }
    }

    /// Whether the failure came from a store that could not be opened or read at all
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            ImsgError::StoreUnavailable { .. } | ImsgError::AllSourcesFailed { .. }
        )
    }
}
