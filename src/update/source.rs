//! Remote source traits and the payload schema they return

#[cfg(test)]
use mockall::automock;

use serde::Deserialize;

use crate::update::error::SourceError;

/// Entry of the upstream commit list
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CommitEntry {
    pub sha: String,
    pub commit: CommitDetail,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CommitDetail {
    pub author: CommitAuthor,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CommitAuthor {
    pub name: String,
    /// RFC 3339 timestamp
    pub date: String,
}

/// Entry of the upstream tag list
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TagEntry {
    pub name: String,
    pub commit: TagCommit,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TagCommit {
    pub sha: String,
    pub url: String,
}

/// Trait for fetching release information from upstream
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait ReleaseSource: Send + Sync {
    /// Fetches commits, ordered from newest to oldest
    async fn fetch_commits(&self) -> Result<Vec<CommitEntry>, SourceError>;

    /// Fetches release tags, ordered from newest to oldest
    async fn fetch_tags(&self) -> Result<Vec<TagEntry>, SourceError>;
}

/// Usage metrics reported by the usage provider
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Usage {
    pub used: f64,
    pub total: f64,
}

/// Trait for fetching usage metrics from the single upstream provider
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait UsageSource: Send + Sync {
    /// Provider name, used for logging
    fn name(&self) -> String;

    async fn usage(&self) -> Result<Usage, SourceError>;
}
