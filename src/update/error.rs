use thiserror::Error;

#[derive(Debug, Error)]
pub enum StateError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Database lock poisoned")]
    LockPoisoned,

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unsupported state schema version {found} (supported up to {supported})")]
    UnsupportedSchema { found: i64, supported: i64 },
}

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Rate limited: retry after {retry_after_secs:?} seconds")]
    RateLimited { retry_after_secs: Option<u64> },

    #[error("Unexpected status: {0}")]
    UnexpectedStatus(u16),

    #[error("Remote returned an empty list")]
    EmptyResult,

    #[error("Invalid response: {0}")]
    Parse(String),

    #[error("Source not configured: {0}")]
    NotConfigured(String),
}
