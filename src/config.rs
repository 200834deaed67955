use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::update::scheme::VersionType;

// =============================================================================
// Time-related constants
// =============================================================================

const ONE_MINUTE_MS: i64 = 60 * 1000;

/// Minimum gap between two remote version checks in milliseconds (120 minutes)
pub const VERSION_CHECK_INTERVAL_MS: i64 = 120 * ONE_MINUTE_MS;

/// Minimum gap between two usage checks in milliseconds (1 minute)
pub const USAGE_CHECK_INTERVAL_MS: i64 = ONE_MINUTE_MS;

/// Transport timeout for fetch operations in milliseconds (30 seconds)
pub const FETCH_TIMEOUT_MS: u64 = 30_000;

/// Key under which the update state record is persisted
pub const STATE_STORE_KEY: &str = "update";

/// Default base URL for GitHub API
pub const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";

/// Application configuration structure
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct AppConfig {
    /// Which scheme resolves the "latest" remote version
    pub version_type: VersionType,
    /// The running build's own version (tag scheme)
    pub version: String,
    /// The running build's commit time as epoch milliseconds (date scheme)
    pub commit_date: String,
    /// Whether the host is a desktop app able to show OS notifications
    pub is_app: bool,
    /// Upstream repository as `owner/name`
    pub repository: String,
    pub github_api_url: String,
    /// Version check interval in milliseconds
    pub version_check_interval: i64,
    /// Usage check interval in milliseconds
    pub usage_check_interval: i64,
    pub usage: UsageConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            version_type: VersionType::Tag,
            version: "unknown".to_string(),
            commit_date: "unknown".to_string(),
            is_app: false,
            repository: String::new(),
            github_api_url: DEFAULT_GITHUB_API_URL.to_string(),
            version_check_interval: VERSION_CHECK_INTERVAL_MS,
            usage_check_interval: USAGE_CHECK_INTERVAL_MS,
            usage: UsageConfig::default(),
        }
    }
}

impl AppConfig {
    /// Loads configuration from a JSON file.
    /// A missing file yields the defaults; a malformed one is an error.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config = serde_json::from_str(&content)
            .map_err(|e| anyhow::anyhow!("invalid config {}: {}", path.display(), e))?;
        Ok(config)
    }

    /// The local version identifier in the active scheme's raw format
    pub fn local_version(&self) -> &str {
        match self.version_type {
            VersionType::Date => &self.commit_date,
            VersionType::Tag => &self.version,
        }
    }
}

/// Usage provider configuration
#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct UsageConfig {
    /// Endpoint returning `{ "used": number, "total": number }`
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
}

/// Returns the path to the data directory for upstream-check.
/// Uses $XDG_DATA_HOME/upstream-check if XDG_DATA_HOME is set,
/// otherwise falls back to ~/.local/share/upstream-check,
/// or ./upstream-check if neither is available.
pub fn data_dir() -> PathBuf {
    data_dir_with_env(std::env::var("XDG_DATA_HOME").ok(), dirs::home_dir())
}

/// Returns the path to the database file.
pub fn db_path() -> PathBuf {
    data_dir().join("state.db")
}

/// Returns the path to the log file.
pub fn log_path() -> PathBuf {
    data_dir().join("upstream-check.log")
}

/// Returns the default path to the configuration file.
pub fn config_path() -> PathBuf {
    data_dir().join("config.json")
}

fn data_dir_with_env(xdg_data_home: Option<String>, home_dir: Option<PathBuf>) -> PathBuf {
    let data_dir = xdg_data_home
        .map(PathBuf::from)
        .or_else(|| home_dir.map(|home| home.join(".local/share")))
        .unwrap_or_else(|| PathBuf::from("."));

    data_dir.join("upstream-check")
}
