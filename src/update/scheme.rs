//! Versioning schemes and their comparison formats

use chrono::DateTime;
use serde::{Deserialize, Serialize};

/// Strategy for representing the "latest" version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VersionType {
    /// Calendar date of the newest upstream commit
    Date,
    /// Name of the newest upstream release tag
    #[default]
    Tag,
}

impl VersionType {
    /// Returns the string representation of the version type
    pub fn as_str(&self) -> &'static str {
        match self {
            VersionType::Date => "date",
            VersionType::Tag => "tag",
        }
    }
}

impl std::str::FromStr for VersionType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "date" => Ok(VersionType::Date),
            "tag" => Ok(VersionType::Tag),
            _ => Err(()),
        }
    }
}

/// Format an epoch-millisecond string as `YYYYMMDD` using UTC calendar fields.
///
/// Returns None when the input is not an epoch-millisecond integer.
pub fn format_version_date(epoch_ms: &str) -> Option<String> {
    let millis: i64 = epoch_ms.trim().parse().ok()?;
    let date = DateTime::from_timestamp_millis(millis)?;
    Some(date.format("%Y%m%d").to_string())
}

/// Bring a version identifier into the comparison format of `version_type`.
///
/// Tags are opaque and pass through untouched. Date identifiers that are not
/// epoch milliseconds (e.g. "unknown") are returned as-is.
pub fn format_version(version_type: VersionType, version: &str) -> String {
    match version_type {
        VersionType::Tag => version.to_string(),
        VersionType::Date => {
            format_version_date(version).unwrap_or_else(|| version.to_string())
        }
    }
}
