//! Types for the tracker API

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackerConfig {
    /// Base URL of the tracker REST API
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    /// Repository owner (user or organization)
    #[serde(default)]
    pub owner: String,
    /// Repository holding the feedback issues
    #[serde(default)]
    pub repo: String,
    /// Bearer token sent on every request
    #[serde(default)]
    pub token: Option<String>,
    /// Request timeout in seconds (default: 30)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// User-Agent header (GitHub rejects requests without one)
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Page size for list calls
    #[serde(default = "default_per_page")]
    pub per_page: u32,
}

fn default_api_base_url() -> String {
    "https://api.github.com".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_user_agent() -> String {
    format!("feedback-sdk/{}", env!("CARGO_PKG_VERSION"))
}

fn default_per_page() -> u32 {
    100
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            owner: String::new(),
            repo: String::new(),
            token: None,
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
            per_page: default_per_page(),
        }
    }
}

/// Issue author
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub login: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

/// Issue label
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Label {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            color: None,
            description: None,
        }
    }
}

/// Issue as returned by the tracker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    /// Tracker-wide stable id
    pub id: u64,
    /// Per-repository number, used for every operation
    pub number: u64,
    pub title: String,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default = "default_state")]
    pub state: String,
    #[serde(default)]
    pub labels: Vec<Label>,
    /// ISO-8601, fixed width (`2024-01-02T03:04:05Z`)
    pub created_at: String,
    pub updated_at: String,
    #[serde(default)]
    pub user: Option<User>,
    /// Present only when the item is a pull request
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pull_request: Option<serde_json::Value>,
}

fn default_state() -> String {
    "open".to_string()
}

impl Issue {
    /// Minimal open issue, mostly useful for tests and fixtures
    pub fn new(number: u64, title: impl Into<String>) -> Self {
        Self {
            id: number,
            number,
            title: title.into(),
            body: None,
            state: default_state(),
            labels: Vec::new(),
            created_at: "1970-01-01T00:00:00Z".to_string(),
            updated_at: "1970-01-01T00:00:00Z".to_string(),
            user: None,
            pull_request: None,
        }
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn with_labels(mut self, labels: &[&str]) -> Self {
        self.labels = labels.iter().map(|l| Label::named(*l)).collect();
        self
    }

    pub fn with_created_at(mut self, created_at: impl Into<String>) -> Self {
        self.created_at = created_at.into();
        self.updated_at = self.created_at.clone();
        self
    }

    pub fn with_author(mut self, login: impl Into<String>) -> Self {
        self.user = Some(User {
            login: login.into(),
            avatar_url: None,
        });
        self
    }

    pub fn has_label(&self, name: &str) -> bool {
        self.labels.iter().any(|l| l.name == name)
    }

    pub fn label_names(&self) -> impl Iterator<Item = &str> {
        self.labels.iter().map(|l| l.name.as_str())
    }

    pub fn is_open(&self) -> bool {
        self.state == "open"
    }

    pub fn is_pull_request(&self) -> bool {
        self.pull_request.is_some()
    }
}

/// Comment on an issue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: u64,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub user: Option<User>,
    pub created_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

/// Reaction content accepted by the tracker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReactionKind {
    #[serde(rename = "+1")]
    ThumbsUp,
    #[serde(rename = "-1")]
    ThumbsDown,
    #[serde(rename = "laugh")]
    Laugh,
    #[serde(rename = "confused")]
    Confused,
    #[serde(rename = "heart")]
    Heart,
    #[serde(rename = "hooray")]
    Hooray,
    #[serde(rename = "rocket")]
    Rocket,
    #[serde(rename = "eyes")]
    Eyes,
}

impl ReactionKind {
    pub const ALL: [ReactionKind; 8] = [
        ReactionKind::ThumbsUp,
        ReactionKind::ThumbsDown,
        ReactionKind::Laugh,
        ReactionKind::Confused,
        ReactionKind::Heart,
        ReactionKind::Hooray,
        ReactionKind::Rocket,
        ReactionKind::Eyes,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReactionKind::ThumbsUp => "+1",
            ReactionKind::ThumbsDown => "-1",
            ReactionKind::Laugh => "laugh",
            ReactionKind::Confused => "confused",
            ReactionKind::Heart => "heart",
            ReactionKind::Hooray => "hooray",
            ReactionKind::Rocket => "rocket",
            ReactionKind::Eyes => "eyes",
        }
    }
}

impl fmt::Display for ReactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReactionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ReactionKind::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| format!("unknown reaction '{}'", s))
    }
}

/// Request body for issue creation
#[derive(Debug, Clone, Serialize)]
pub struct CreateIssueRequest<'a> {
    pub title: &'a str,
    pub body: &'a str,
    pub labels: &'a [String],
}

/// Request body for a body-only issue update
#[derive(Debug, Clone, Serialize)]
pub struct UpdateIssueRequest<'a> {
    pub body: &'a str,
}

/// Request body for a new comment
#[derive(Debug, Clone, Serialize)]
pub struct CreateCommentRequest<'a> {
    pub body: &'a str,
}

/// Request body for a new reaction
#[derive(Debug, Clone, Serialize)]
pub struct CreateReactionRequest {
    pub content: ReactionKind,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_deserializes_github_shape() {
        let json = r#"{
            "id": 1296269,
            "number": 42,
            "title": "Crash on launch",
            "body": "It crashes",
            "state": "open",
            "labels": [{"id": 1, "name": "bug", "color": "f29513"}],
            "created_at": "2024-01-02T10:00:00Z",
            "updated_at": "2024-01-03T10:00:00Z",
            "user": {"login": "octocat", "id": 1}
        }"#;

        let issue: Issue = serde_json::from_str(json).unwrap();
        assert_eq!(issue.number, 42);
        assert!(issue.has_label("bug"));
        assert!(!issue.is_pull_request());
        assert_eq!(issue.user.unwrap().login, "octocat");
    }

    #[test]
    fn test_issue_null_body() {
        let json = r#"{"id": 1, "number": 1, "title": "t", "body": null,
            "created_at": "2024-01-01T00:00:00Z", "updated_at": "2024-01-01T00:00:00Z"}"#;
        let issue: Issue = serde_json::from_str(json).unwrap();
        assert!(issue.body.is_none());
        assert!(issue.is_open());
        assert!(issue.labels.is_empty());
    }

    #[test]
    fn test_reaction_wire_names() {
        let json = serde_json::to_string(&CreateReactionRequest {
            content: ReactionKind::ThumbsUp,
        })
        .unwrap();
        assert_eq!(json, r#"{"content":"+1"}"#);

        assert_eq!("rocket".parse::<ReactionKind>().unwrap(), ReactionKind::Rocket);
        assert!("thumbsup".parse::<ReactionKind>().is_err());
    }

    #[test]
    fn test_config_defaults_from_partial_toml_shape() {
        let config: TrackerConfig =
            serde_json::from_str(r#"{"owner": "acme", "repo": "app"}"#).unwrap();
        assert_eq!(config.api_base_url, "https://api.github.com");
        assert_eq!(config.timeout_secs, 30);
        assert_eq!(config.per_page, 100);
        assert!(config.user_agent.starts_with("feedback-sdk/"));
    }
}
