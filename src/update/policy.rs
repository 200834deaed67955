//! Classification of current vs remote version

#[cfg(test)]
use mockall::automock;

use tracing::info;

/// Outcome of comparing the running version with the remote one
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateDecision {
    /// Remote version equals the current one
    UpToDate,
    /// A different remote version exists
    UpdateAvailable(String),
    /// No remote version is known, so no claim can be made
    Indeterminate,
}

/// Classify `current` against `remote`. Both must already be in the
/// active scheme's comparison format.
pub fn classify(current: &str, remote: Option<&str>) -> UpdateDecision {
    match remote {
        None => UpdateDecision::Indeterminate,
        Some(remote) if remote == current => UpdateDecision::UpToDate,
        Some(remote) => UpdateDecision::UpdateAvailable(remote.to_string()),
    }
}

/// Renders a decision to the user. Rendering itself lives outside this crate.
#[cfg_attr(test, automock)]
pub trait Notifier: Send + Sync {
    fn notify(&self, current: &str, decision: &UpdateDecision);
}

/// Notifier that emits decisions as log events
#[derive(Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, current: &str, decision: &UpdateDecision) {
        match decision {
            UpdateDecision::UpToDate => info!(current, "Running the latest version"),
            UpdateDecision::UpdateAvailable(remote) => {
                info!(current, remote = remote.as_str(), "Found a new version")
            }
            UpdateDecision::Indeterminate => info!(current, "Remote version unknown"),
        }
    }
}
