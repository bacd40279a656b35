//! Error types for the feedback SDK

use feedback_tracker_client::TrackerError;
use thiserror::Error;

/// Result type for SDK operations
pub type Result<T> = std::result::Result<T, FeedbackError>;

/// SDK error types
#[derive(Error, Debug)]
pub enum FeedbackError {
    /// Rejected before any remote call was made
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Listing or fetching records failed
    #[error("Failed to fetch feedback: {0}")]
    Fetch(#[source] TrackerError),

    /// Creating a record or comment failed
    #[error("Failed to submit feedback: {0}")]
    Create(#[source] TrackerError),

    /// Writing a record back failed
    #[error("Failed to update feedback #{number}: {reason}")]
    Update {
        number: u64,
        reason: String,
        #[source]
        source: Option<TrackerError>,
    },

    /// This device already voted for the record; no remote call was made
    #[error("Already voted for #{0}")]
    AlreadyVoted(u64),

    /// Local vote ledger could not be persisted
    #[error("Vote ledger error: {0}")]
    Ledger(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl FeedbackError {
    /// True for the informational duplicate-vote case, which a UI shows
    /// differently from failures.
    pub fn is_already_voted(&self) -> bool {
        matches!(self, FeedbackError::AlreadyVoted(_))
    }

    pub(crate) fn update(number: u64, source: TrackerError) -> Self {
        FeedbackError::Update {
            number,
            reason: source.to_string(),
            source: Some(source),
        }
    }
}

impl From<std::io::Error> for FeedbackError {
    fn from(err: std::io::Error) -> Self {
        FeedbackError::Ledger(err.to_string())
    }
}

impl From<toml::de::Error> for FeedbackError {
    fn from(err: toml::de::Error) -> Self {
        FeedbackError::Config(err.to_string())
    }
}
