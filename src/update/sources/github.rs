//! GitHub commits/tags API source implementation

use std::time::Duration;

use serde::de::DeserializeOwned;
use tracing::warn;

use crate::config::FETCH_TIMEOUT_MS;
use crate::update::error::SourceError;
use crate::update::source::{CommitEntry, ReleaseSource, TagEntry};

/// Release source backed by the GitHub REST API
pub struct GitHubSource {
    client: reqwest::Client,
    base_url: String,
    repository: String,
}

impl GitHubSource {
    /// Creates a GitHubSource for `repository` (`owner/name`) at `base_url`
    pub fn new(base_url: &str, repository: &str) -> Result<Self, SourceError> {
        let client = reqwest::Client::builder()
            .user_agent("upstream-check")
            .timeout(Duration::from_millis(FETCH_TIMEOUT_MS))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            repository: repository.to_string(),
        })
    }

    async fn get_list<T: DeserializeOwned>(&self, resource: &str) -> Result<Vec<T>, SourceError> {
        if self.repository.is_empty() {
            return Err(SourceError::NotConfigured("repository".to_string()));
        }
        let url = format!("{}/repos/{}/{}", self.base_url, self.repository, resource);

        let response = self
            .client
            .get(&url)
            .header("Accept", "application/vnd.github+json")
            .send()
            .await?;

        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse().ok());
            return Err(SourceError::RateLimited {
                retry_after_secs: retry_after,
            });
        }

        if !status.is_success() {
            warn!("GitHub API returned status {}: {}", status, url);
            return Err(SourceError::UnexpectedStatus(status.as_u16()));
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| {
            warn!("Failed to parse GitHub {} response: {}", resource, e);
            SourceError::Parse(e.to_string())
        })
    }
}

#[async_trait::async_trait]
impl ReleaseSource for GitHubSource {
    async fn fetch_commits(&self) -> Result<Vec<CommitEntry>, SourceError> {
        self.get_list("commits").await
    }

    async fn fetch_tags(&self) -> Result<Vec<TagEntry>, SourceError> {
        self.get_list("tags").await
    }
}
