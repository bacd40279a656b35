//! Issue tracker client used as the remote store for mobile feedback
//!
//! The feedback SDK never talks HTTP directly. It goes through the
//! [`IssueTracker`] trait, which this crate implements twice:
//! - [`GitHubClient`]: GitHub REST v3 over `reqwest` with bearer-token auth
//! - [`MockTracker`]: in-memory tracker with call counters for tests
//!
//! # Example
//!
//! ```rust,no_run
//! use feedback_tracker_client::{GitHubClient, IssueTracker, TrackerConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = GitHubClient::new(TrackerConfig {
//!     owner: "acme".into(),
//!     repo: "mobile-feedback".into(),
//!     token: Some("ghp_example".into()),
//!     ..Default::default()
//! })?;
//!
//! let open_bugs = client.list_issues(&["bug".to_string()]).await?;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod error;
pub mod mock;
pub mod traits;
pub mod types;

// Re-export main types
pub use client::GitHubClient;
pub use error::{Result, TrackerError};
pub use mock::{MockOperation, MockTracker};
pub use traits::IssueTracker;
pub use types::*;
