//! Remote source implementations

pub mod github;
pub mod usage_api;

pub use github::GitHubSource;
pub use usage_api::UsageApiSource;
