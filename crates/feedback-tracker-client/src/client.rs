//! HTTP client for the GitHub issues API

use async_trait::async_trait;
use reqwest::{header, Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;

use crate::error::{Result, TrackerError};
use crate::traits::IssueTracker;
use crate::types::*;

/// GitHub REST v3 implementation of [`IssueTracker`]
///
/// # Example
///
/// ```rust,no_run
/// use feedback_tracker_client::{GitHubClient, IssueTracker, TrackerConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = GitHubClient::new(TrackerConfig {
///     owner: "acme".into(),
///     repo: "mobile-feedback".into(),
///     token: std::env::var("GITHUB_TOKEN").ok(),
///     ..Default::default()
/// })?;
///
/// let issue = client.get_issue(42).await?;
/// println!("{}", issue.title);
/// # Ok(())
/// # }
/// ```
pub struct GitHubClient {
    config: TrackerConfig,
    client: Client,
}

impl GitHubClient {
    /// Create a new client. Fails if owner/repo are missing or the token
    /// cannot be used as a header value.
    pub fn new(config: TrackerConfig) -> Result<Self> {
        if config.owner.trim().is_empty() || config.repo.trim().is_empty() {
            return Err(TrackerError::InvalidRequest(
                "tracker owner and repo must be set".to_string(),
            ));
        }

        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );
        headers.insert(
            "X-GitHub-Api-Version",
            header::HeaderValue::from_static("2022-11-28"),
        );
        if let Some(ref token) = config.token {
            let mut value = header::HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|_| {
                    TrackerError::InvalidRequest("token is not a valid header value".to_string())
                })?;
            value.set_sensitive(true);
            headers.insert(header::AUTHORIZATION, value);
        }

        let client = Client::builder()
            .default_headers(headers)
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { config, client })
    }

    /// Get the client configuration
    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    fn repo_url(&self) -> String {
        format!(
            "{}/repos/{}/{}",
            self.config.api_base_url.trim_end_matches('/'),
            urlencoding::encode(&self.config.owner),
            urlencoding::encode(&self.config.repo)
        )
    }

    fn issue_url(&self, number: u64) -> String {
        format!("{}/issues/{}", self.repo_url(), number)
    }

    fn list_url(&self, labels: &[String]) -> String {
        let mut url = format!(
            "{}/issues?state=open&sort=created&direction=desc&per_page={}",
            self.repo_url(),
            self.config.per_page
        );
        if !labels.is_empty() {
            let joined: Vec<String> = labels
                .iter()
                .map(|l| urlencoding::encode(l).into_owned())
                .collect();
            url.push_str("&labels=");
            url.push_str(&joined.join(","));
        }
        url
    }

    // ==================== Helper Methods ====================

    async fn check_status(response: Response, what: &str) -> Result<Response> {
        if response.status() == StatusCode::NOT_FOUND {
            return Err(TrackerError::NotFound(what.to_string()));
        }

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(TrackerError::Server {
                status,
                message: body,
            });
        }

        Ok(response)
    }

    async fn handle_response<T: DeserializeOwned>(response: Response, what: &str) -> Result<T> {
        let response = Self::check_status(response, what).await?;
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[async_trait]
impl IssueTracker for GitHubClient {
    async fn list_issues(&self, labels: &[String]) -> Result<Vec<Issue>> {
        let url = self.list_url(labels);
        tracing::debug!(%url, "Listing issues");

        let response = self.client.get(&url).send().await?;
        let issues: Vec<Issue> = Self::handle_response(response, "issue list").await?;

        Ok(issues.into_iter().filter(|i| !i.is_pull_request()).collect())
    }

    async fn create_issue(&self, title: &str, body: &str, labels: &[String]) -> Result<Issue> {
        let url = format!("{}/issues", self.repo_url());
        let request = CreateIssueRequest { title, body, labels };

        let response = self.client.post(&url).json(&request).send().await?;
        Self::handle_response(response, "repository").await
    }

    async fn get_issue(&self, number: u64) -> Result<Issue> {
        let response = self.client.get(self.issue_url(number)).send().await?;
        Self::handle_response(response, &format!("issue #{}", number)).await
    }

    async fn update_issue_body(&self, number: u64, body: &str) -> Result<()> {
        let request = UpdateIssueRequest { body };

        let response = self
            .client
            .patch(self.issue_url(number))
            .json(&request)
            .send()
            .await?;
        Self::check_status(response, &format!("issue #{}", number)).await?;
        Ok(())
    }

    async fn list_comments(&self, number: u64) -> Result<Vec<Comment>> {
        let url = format!(
            "{}/comments?per_page={}",
            self.issue_url(number),
            self.config.per_page
        );

        let response = self.client.get(&url).send().await?;
        Self::handle_response(response, &format!("issue #{}", number)).await
    }

    async fn add_comment(&self, number: u64, body: &str) -> Result<Comment> {
        let url = format!("{}/comments", self.issue_url(number));
        let request = CreateCommentRequest { body };

        let response = self.client.post(&url).json(&request).send().await?;
        Self::handle_response(response, &format!("issue #{}", number)).await
    }

    async fn add_reaction(&self, number: u64, kind: ReactionKind) -> Result<()> {
        let url = format!("{}/reactions", self.issue_url(number));
        let request = CreateReactionRequest { content: kind };

        let response = self.client.post(&url).json(&request).send().await?;
        Self::check_status(response, &format!("issue #{}", number)).await?;
        Ok(())
    }
}
