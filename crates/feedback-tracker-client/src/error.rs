//! Error types for the tracker client

use thiserror::Error;

/// Tracker client error
#[derive(Debug, Error)]
pub enum TrackerError {
    /// HTTP request failed before a response arrived
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Tracker answered with a status outside 200-299
    #[error("Server error {status}: {message}")]
    Server { status: u16, message: String },

    /// Issue not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Request rejected before dispatch
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Operation not offered by this tracker
    #[error("Unsupported operation: {0}")]
    Unsupported(String),
}

impl TrackerError {
    /// HTTP status code, when the tracker produced one
    pub fn status(&self) -> Option<u16> {
        match self {
            TrackerError::Server { status, .. } => Some(*status),
            TrackerError::NotFound(_) => Some(404),
            TrackerError::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

/// Result type for tracker operations
pub type Result<T> = std::result::Result<T, TrackerError>;
