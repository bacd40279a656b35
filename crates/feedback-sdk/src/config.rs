//! Configuration for the feedback SDK

use feedback_tracker_client::TrackerConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{FeedbackError, Result};

/// Environment variable overriding the GitHub token
pub const ENV_TOKEN: &str = "FEEDBACK_GITHUB_TOKEN";
/// Environment variable overriding the repository owner
pub const ENV_OWNER: &str = "FEEDBACK_GITHUB_OWNER";
/// Environment variable overriding the repository name
pub const ENV_REPO: &str = "FEEDBACK_GITHUB_REPO";
/// Environment variable overriding the API base URL
pub const ENV_API_URL: &str = "FEEDBACK_API_URL";
/// Environment variable overriding the vote ledger path
pub const ENV_LEDGER_PATH: &str = "FEEDBACK_LEDGER_PATH";

/// Default vote ledger location
pub fn default_ledger_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("feedback-sdk")
        .join("voted.json")
}

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeedbackConfig {
    /// Remote tracker connection
    #[serde(default)]
    pub tracker: TrackerConfig,

    /// Local vote ledger
    #[serde(default)]
    pub ledger: LedgerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// File holding the voted record numbers
    #[serde(default = "default_ledger_path")]
    pub path: PathBuf,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            path: default_ledger_path(),
        }
    }
}

impl FeedbackConfig {
    /// Load from a TOML file if it exists, then apply environment overrides
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(path).map_err(|e| {
                FeedbackError::Config(format!("failed to read {}: {}", path.display(), e))
            })?;
            Self::from_toml(&contents)?
        } else {
            tracing::debug!(path = %path.display(), "No config file, using defaults");
            Self::default()
        };

        config.apply_env();
        Ok(config)
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Apply `FEEDBACK_*` environment overrides
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from any key lookup. Empty values are ignored.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(token) = get(ENV_TOKEN) {
            self.tracker.token = Some(token);
        }
        if let Some(owner) = get(ENV_OWNER) {
            self.tracker.owner = owner;
        }
        if let Some(repo) = get(ENV_REPO) {
            self.tracker.repo = repo;
        }
        if let Some(url) = get(ENV_API_URL) {
            self.tracker.api_base_url = url;
        }
        if let Some(path) = get(ENV_LEDGER_PATH) {
            self.ledger.path = PathBuf::from(path);
        }
    }

    /// Check the fields every remote call depends on
    pub fn validate(&self) -> Result<()> {
        if self.tracker.owner.trim().is_empty() {
            return Err(FeedbackError::Config("tracker.owner is required".to_string()));
        }
        if self.tracker.repo.trim().is_empty() {
            return Err(FeedbackError::Config("tracker.repo is required".to_string()));
        }
        if !self.tracker.api_base_url.starts_with("http://")
            && !self.tracker.api_base_url.starts_with("https://")
        {
            return Err(FeedbackError::Config(format!(
                "tracker.api_base_url must be an http(s) URL, got '{}'",
                self.tracker.api_base_url
            )));
        }
        if self.tracker.per_page == 0 || self.tracker.per_page > 100 {
            return Err(FeedbackError::Config(
                "tracker.per_page must be between 1 and 100".to_string(),
            ));
        }
        Ok(())
    }
}
