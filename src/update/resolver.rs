//! Resolves the canonical remote version identifier for a scheme

use chrono::DateTime;
use tracing::debug;

use crate::update::error::SourceError;
use crate::update::scheme::VersionType;
use crate::update::source::ReleaseSource;

/// Fetch and normalize the newest remote version identifier.
///
/// - Tag scheme: name of the first tag.
/// - Date scheme: author date of the first commit as epoch milliseconds.
///
/// An empty list fails with [`SourceError::EmptyResult`].
pub async fn resolve(
    source: &dyn ReleaseSource,
    version_type: VersionType,
) -> Result<String, SourceError> {
    match version_type {
        VersionType::Tag => {
            let tags = source.fetch_tags().await?;
            let latest = tags.into_iter().next().ok_or(SourceError::EmptyResult)?;
            debug!("Newest tag is {}", latest.name);
            Ok(latest.name)
        }
        VersionType::Date => {
            let commits = source.fetch_commits().await?;
            let latest = commits.into_iter().next().ok_or(SourceError::EmptyResult)?;
            let millis = commit_date_to_epoch_ms(&latest.commit.author.date)?;
            debug!(
                "Newest commit {} authored at {} ({})",
                latest.sha, latest.commit.author.date, millis
            );
            Ok(millis.to_string())
        }
    }
}

fn commit_date_to_epoch_ms(date: &str) -> Result<i64, SourceError> {
    DateTime::parse_from_rfc3339(date)
        .map(|d| d.timestamp_millis())
        .map_err(|e| SourceError::Parse(format!("invalid commit date {:?}: {}", date, e)))
}
