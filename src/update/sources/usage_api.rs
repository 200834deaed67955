//! HTTP usage provider

use std::time::Duration;

use tracing::warn;

use crate::config::FETCH_TIMEOUT_MS;
use crate::update::error::SourceError;
use crate::update::source::{Usage, UsageSource};

const PROVIDER_NAME: &str = "openai";

/// Usage source reading `{ "used": number, "total": number }` from an endpoint
pub struct UsageApiSource {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

impl UsageApiSource {
    pub fn new(endpoint: &str, api_key: Option<String>) -> Result<Self, SourceError> {
        let client = reqwest::Client::builder()
            .user_agent("upstream-check")
            .timeout(Duration::from_millis(FETCH_TIMEOUT_MS))
            .build()?;
        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
            api_key,
        })
    }
}

#[async_trait::async_trait]
impl UsageSource for UsageApiSource {
    fn name(&self) -> String {
        PROVIDER_NAME.to_string()
    }

    async fn usage(&self) -> Result<Usage, SourceError> {
        let mut request = self.client.get(&self.endpoint);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            warn!("Usage endpoint returned status {}: {}", status, self.endpoint);
            return Err(SourceError::UnexpectedStatus(status.as_u16()));
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| {
            warn!("Failed to parse usage response: {}", e);
            SourceError::Parse(e.to_string())
        })
    }
}

/// Stand-in used when no usage endpoint is configured
pub struct UnconfiguredUsageSource;

#[async_trait::async_trait]
impl UsageSource for UnconfiguredUsageSource {
    fn name(&self) -> String {
        PROVIDER_NAME.to_string()
    }

    async fn usage(&self) -> Result<Usage, SourceError> {
        Err(SourceError::NotConfigured("usage.endpoint".to_string()))
    }
}
