//! Error types for usecase sync
//!
//! Errors are classified by recoverability:
//! - Transient: network failures, timeouts, 5xx responses
//! - Permanent: 4xx responses, malformed payloads, bad configuration

use thiserror::Error;

/// Error types for collaborator calls and coordinator operations
#[derive(Debug, Error)]
pub enum SyncError {
    // Transient errors
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out after {0} seconds")]
    Timeout(u64),

    // Status-dependent
    #[error("API error {status}: {body}")]
    Http { status: u16, body: String },

    // Permanent errors
    #[error("Failed to parse response: {0}")]
    Parse(String),

    #[error("Usecase not found: {0}")]
    NotFound(String),

    #[error("Unknown model: {0}")]
    UnknownModel(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(String),
}

impl SyncError {
    /// Returns true if retrying the same request may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            SyncError::Network(_) | SyncError::Timeout(_) => true,
            SyncError::Http { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

impl From<std::io::Error> for SyncError {
    fn from(err: std::io::Error) -> Self {
        SyncError::Io(err.to_string())
    }
}
