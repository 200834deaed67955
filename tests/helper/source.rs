//! Fake sources and store utilities

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tempfile::TempDir;

use upstream_check::update::error::SourceError;
use upstream_check::update::source::{
    CommitAuthor, CommitDetail, CommitEntry, ReleaseSource, TagCommit, TagEntry, Usage,
    UsageSource,
};
use upstream_check::update::store::SqliteStateStore;

/// Release source serving canned lists and counting fetches
#[derive(Default)]
pub struct FakeReleaseSource {
    tags: Vec<TagEntry>,
    commits: Vec<CommitEntry>,
    fail: bool,
    fetches: AtomicUsize,
}

impl FakeReleaseSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tags(mut self, names: &[&str]) -> Self {
        self.tags = names
            .iter()
            .map(|name| TagEntry {
                name: name.to_string(),
                commit: TagCommit {
                    sha: format!("sha-{}", name),
                    url: format!("https://api.github.com/repos/owner/app/commits/{}", name),
                },
            })
            .collect();
        self
    }

    pub fn with_commit_dates(mut self, dates: &[&str]) -> Self {
        self.commits = dates
            .iter()
            .enumerate()
            .map(|(i, date)| CommitEntry {
                sha: format!("sha{}", i),
                commit: CommitDetail {
                    author: CommitAuthor {
                        name: "octocat".to_string(),
                        date: date.to_string(),
                    },
                },
            })
            .collect();
        self
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ReleaseSource for FakeReleaseSource {
    async fn fetch_commits(&self) -> Result<Vec<CommitEntry>, SourceError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(SourceError::UnexpectedStatus(500));
        }
        Ok(self.commits.clone())
    }

    async fn fetch_tags(&self) -> Result<Vec<TagEntry>, SourceError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(SourceError::UnexpectedStatus(500));
        }
        Ok(self.tags.clone())
    }
}

/// Usage source returning queued results in order
#[derive(Default)]
pub struct FakeUsageSource {
    results: Mutex<Vec<Result<Usage, SourceError>>>,
    calls: AtomicUsize,
}

impl FakeUsageSource {
    pub fn new(results: Vec<Result<Usage, SourceError>>) -> Self {
        Self {
            results: Mutex::new(results.into_iter().rev().collect()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl UsageSource for FakeUsageSource {
    fn name(&self) -> String {
        "fake".to_string()
    }

    async fn usage(&self) -> Result<Usage, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.results
            .lock()
            .unwrap()
            .pop()
            .unwrap_or(Err(SourceError::EmptyResult))
    }
}

/// Create a SQLite store in a temporary directory
pub fn create_test_store() -> (TempDir, Arc<SqliteStateStore>) {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("state.db");
    let store = SqliteStateStore::new(&db_path, "update").unwrap();
    (temp_dir, Arc::new(store))
}
