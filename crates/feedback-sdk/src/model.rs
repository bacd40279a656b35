//! Feedback records and their derived views

use feedback_tracker_client::{Issue, Label, User};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::codec;

/// Label marking a bug report
pub const BUG_LABEL: &str = "bug";

/// Label marking a feature request
pub const FEATURE_LABEL: &str = "feature-request";

/// Label added to everything submitted through the SDK
pub const USER_SUBMITTED_LABEL: &str = "user-submitted";

/// Kind of feedback being submitted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Bug,
    FeatureRequest,
}

impl Category {
    /// Tracker label for this category
    pub fn label(&self) -> &'static str {
        match self {
            Category::Bug => BUG_LABEL,
            Category::FeatureRequest => FEATURE_LABEL,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "bug" => Ok(Category::Bug),
            "feature" | "feature-request" | "feature_request" => Ok(Category::FeatureRequest),
            other => Err(format!("unknown category '{}'", other)),
        }
    }
}

/// Which records a listing covers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordFilter {
    /// Bugs and feature requests
    #[default]
    All,
    Bugs,
    Features,
}

impl RecordFilter {
    /// Server-side label filter. `All` spans two labels, which the
    /// tracker cannot OR, so it sends none.
    pub fn server_labels(&self) -> Vec<String> {
        match self {
            RecordFilter::All => Vec::new(),
            RecordFilter::Bugs => vec![BUG_LABEL.to_string()],
            RecordFilter::Features => vec![FEATURE_LABEL.to_string()],
        }
    }

    /// Client-side membership test applied to whatever the tracker returned.
    pub fn matches(&self, record: &Record) -> bool {
        match self {
            RecordFilter::All => record.is_bug() || record.is_feature_request(),
            RecordFilter::Bugs => record.is_bug(),
            RecordFilter::Features => record.is_feature_request(),
        }
    }
}

impl FromStr for RecordFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(RecordFilter::All),
            "bugs" | "bug" => Ok(RecordFilter::Bugs),
            "features" | "feature" => Ok(RecordFilter::Features),
            other => Err(format!("unknown filter '{}'", other)),
        }
    }
}

/// A feedback item as stored on the tracker.
///
/// Immutable once fetched. Votes, category and the displayable text are
/// derived from `body` and `labels` on demand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: u64,
    pub number: u64,
    pub title: String,
    pub body: Option<String>,
    pub state: String,
    pub labels: Vec<String>,
    pub created_at: String,
    pub updated_at: String,
    pub author: Option<String>,
}

impl Record {
    pub fn has_label(&self, name: &str) -> bool {
        self.labels.iter().any(|l| l == name)
    }

    pub fn is_bug(&self) -> bool {
        self.has_label(BUG_LABEL)
    }

    pub fn is_feature_request(&self) -> bool {
        self.has_label(FEATURE_LABEL)
    }

    pub fn category(&self) -> Option<Category> {
        if self.is_bug() {
            Some(Category::Bug)
        } else if self.is_feature_request() {
            Some(Category::FeatureRequest)
        } else {
            None
        }
    }

    /// Vote count embedded in the body, 0 when absent or malformed
    pub fn vote_count(&self) -> u64 {
        codec::parse_vote_count(self.body.as_deref())
    }

    /// Body without the vote, device, contact and footer sections
    pub fn displayable_body(&self) -> String {
        self.body
            .as_deref()
            .map(codec::strip_sections)
            .unwrap_or_default()
    }

    /// Listing order: most votes first, then newest first.
    ///
    /// Timestamps compare as strings; the tracker's ISO-8601 format is
    /// fixed-width and zero-padded.
    pub fn listing_order(a: &Record, b: &Record) -> Ordering {
        b.vote_count()
            .cmp(&a.vote_count())
            .then_with(|| b.created_at.cmp(&a.created_at))
    }
}

/// Feedback about to be submitted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewFeedback {
    pub title: String,
    pub description: String,
    pub category: Category,
    /// Pre-assembled device summary, rendered verbatim
    pub device_info: String,
    pub contact_email: Option<String>,
}

impl NewFeedback {
    pub fn new(title: impl Into<String>, description: impl Into<String>, category: Category) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            category,
            device_info: String::new(),
            contact_email: None,
        }
    }

    pub fn with_device_info(mut self, device_info: impl Into<String>) -> Self {
        self.device_info = device_info.into();
        self
    }

    pub fn with_contact_email(mut self, email: impl Into<String>) -> Self {
        self.contact_email = Some(email.into());
        self
    }

    /// Contact email if one was actually given
    pub fn contact(&self) -> Option<&str> {
        self.contact_email
            .as_deref()
            .map(str::trim)
            .filter(|e| !e.is_empty())
    }

    /// Labels the record is created with
    pub fn labels(&self) -> Vec<String> {
        vec![
            self.category.label().to_string(),
            USER_SUBMITTED_LABEL.to_string(),
        ]
    }

    /// Full record body with a zero vote count
    pub fn body(&self) -> String {
        codec::compose_body(&self.description, &self.device_info, self.contact())
    }

    /// Reject drafts that should never reach the tracker
    pub fn validate(&self) -> Result<(), String> {
        if self.title.trim().is_empty() {
            return Err("title is required".to_string());
        }
        if self.description.trim().is_empty() {
            return Err("description is required".to_string());
        }
        if let Some(email) = self.contact() {
            if !email.contains('@') || email.chars().any(char::is_whitespace) {
                return Err(format!("'{}' is not an email address", email));
            }
        }
        Ok(())
    }
}

impl From<Issue> for Record {
    fn from(issue: Issue) -> Self {
        Self {
            id: issue.id,
            number: issue.number,
            title: issue.title,
            body: issue.body,
            state: issue.state,
            labels: issue.labels.into_iter().map(|Label { name, .. }| name).collect(),
            created_at: issue.created_at,
            updated_at: issue.updated_at,
            author: issue.user.map(|User { login, .. }| login),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(number: u64, labels: &[&str], body: Option<&str>, created_at: &str) -> Record {
        let mut issue = Issue::new(number, format!("#{}", number))
            .with_labels(labels)
            .with_created_at(created_at);
        issue.body = body.map(str::to_string);
        issue.into()
    }

    #[test]
    fn test_from_issue() {
        let issue = Issue::new(3, "Crash")
            .with_body("Boom\n\n---\n👍 Votes: 4")
            .with_labels(&["bug", "user-submitted"])
            .with_author("octocat");
        let record = Record::from(issue);

        assert_eq!(record.number, 3);
        assert_eq!(record.labels, vec!["bug", "user-submitted"]);
        assert_eq!(record.author.as_deref(), Some("octocat"));
        assert!(record.is_bug());
        assert!(!record.is_feature_request());
        assert_eq!(record.category(), Some(Category::Bug));
        assert_eq!(record.vote_count(), 4);
        assert_eq!(record.displayable_body(), "Boom");
    }

    #[test]
    fn test_missing_body() {
        let record = record(1, &["feature-request"], None, "2024-01-01T00:00:00Z");
        assert_eq!(record.vote_count(), 0);
        assert_eq!(record.displayable_body(), "");
        assert_eq!(record.category(), Some(Category::FeatureRequest));
    }

    #[test]
    fn test_filter_membership() {
        let bug = record(1, &["bug"], None, "2024-01-01T00:00:00Z");
        let feature = record(2, &["feature-request"], None, "2024-01-01T00:00:00Z");
        let other = record(3, &["enhancement"], None, "2024-01-01T00:00:00Z");

        assert!(RecordFilter::All.matches(&bug));
        assert!(RecordFilter::All.matches(&feature));
        assert!(!RecordFilter::All.matches(&other));
        assert!(RecordFilter::Bugs.matches(&bug));
        assert!(!RecordFilter::Bugs.matches(&feature));
        assert!(RecordFilter::Features.matches(&feature));
        assert!(RecordFilter::All.server_labels().is_empty());
        assert_eq!(RecordFilter::Bugs.server_labels(), vec!["bug"]);
    }

    #[test]
    fn test_listing_order_ties_break_on_newest() {
        let older = record(1, &["bug"], Some("👍 Votes: 3"), "2024-01-01T08:00:00Z");
        let newer = record(2, &["bug"], Some("👍 Votes: 3"), "2024-01-02T08:00:00Z");
        let popular = record(3, &["bug"], Some("👍 Votes: 10"), "2023-06-01T00:00:00Z");

        let mut records = vec![older, newer, popular];
        records.sort_by(Record::listing_order);

        let numbers: Vec<u64> = records.iter().map(|r| r.number).collect();
        assert_eq!(numbers, vec![3, 2, 1]);
    }

    #[test]
    fn test_new_feedback_body_and_labels() {
        let draft = NewFeedback::new("Dark mode", "Great idea!", Category::FeatureRequest)
            .with_device_info("<info>");

        assert_eq!(draft.labels(), vec!["feature-request", "user-submitted"]);
        assert_eq!(
            draft.body(),
            "Great idea!\n\n---\n**Device Information:**\n<info>\n\n**Contact Email:**\nN/A\n\n*Submitted via mobile app*\n\n---\n👍 Votes: 0"
        );
        assert!(draft.validate().is_ok());
    }

    #[test]
    fn test_new_feedback_validation() {
        let ok = NewFeedback::new("t", "d", Category::Bug);
        assert!(ok.clone().with_contact_email("  ").validate().is_ok());
        assert!(ok.clone().with_contact_email("me@example.com").validate().is_ok());
        assert!(ok.clone().with_contact_email("not-an-email").validate().is_err());
        assert!(NewFeedback::new(" ", "d", Category::Bug).validate().is_err());
        assert!(NewFeedback::new("t", "\n", Category::Bug).validate().is_err());
    }

    #[test]
    fn test_parse_category_and_filter() {
        assert_eq!("feature".parse::<Category>().unwrap(), Category::FeatureRequest);
        assert_eq!(Category::FeatureRequest.to_string(), "feature-request");
        assert!("question".parse::<Category>().is_err());
        assert_eq!("bugs".parse::<RecordFilter>().unwrap(), RecordFilter::Bugs);
    }
}
