//! The `IssueTracker` trait - the seam between the feedback core and the
//! remote issue service.

use async_trait::async_trait;

use crate::error::{Result, TrackerError};
use crate::types::{Comment, Issue, ReactionKind};

/// Remote issue service used as a makeshift record store.
///
/// Every call is a suspend point with no timeout beyond what the
/// implementation's transport applies. Nothing here retries.
#[async_trait]
pub trait IssueTracker: Send + Sync {
    /// List open issues carrying every label in `labels`, newest first.
    /// An empty slice means no label filter.
    async fn list_issues(&self, labels: &[String]) -> Result<Vec<Issue>>;

    /// Create an issue.
    async fn create_issue(&self, title: &str, body: &str, labels: &[String]) -> Result<Issue>;

    /// Fetch one issue by number.
    async fn get_issue(&self, number: u64) -> Result<Issue>;

    /// Replace the whole body of an issue.
    async fn update_issue_body(&self, number: u64, body: &str) -> Result<()>;

    /// List comments on an issue.
    async fn list_comments(&self, number: u64) -> Result<Vec<Comment>>;

    /// Add a comment to an issue.
    async fn add_comment(&self, number: u64, body: &str) -> Result<Comment>;

    /// Add a reaction to an issue.
    async fn add_reaction(&self, number: u64, kind: ReactionKind) -> Result<()>;

    /// Whether [`IssueTracker::update_issue_body_if_unchanged`] is available.
    fn supports_conditional_update(&self) -> bool {
        false
    }

    /// Replace the body only if it still equals `expected`.
    ///
    /// Returns `Ok(false)` when the body changed since it was read.
    async fn update_issue_body_if_unchanged(
        &self,
        number: u64,
        expected: &str,
        body: &str,
    ) -> Result<bool> {
        let _ = (number, expected, body);
        Err(TrackerError::Unsupported("conditional body update".to_string()))
    }
}
