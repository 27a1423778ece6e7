//! Schema service configuration

use crate::ClientError;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

/// Default schema service endpoint
pub const DEFAULT_BASE_URL: &str = "https://dynamic-form-generator-9rl7.onrender.com";

/// Schema service configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Service base URL
    pub base_url: String,
    /// Per-request timeout
    pub timeout_secs: u64,
    /// Retries after the first attempt, for transport errors and 5xx
    pub max_retries: u32,
    /// Base delay, doubled on every retry
    pub retry_delay_ms: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.into(),
            timeout_secs: 30,
            max_retries: 2,
            retry_delay_ms: 500,
        }
    }
}

impl ServiceConfig {
    /// Defaults with a different base URL
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    /// Per-request timeout
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Backoff before retry number `attempt` (0-based).
    pub fn retry_delay(&self, attempt: u32) -> Duration {
        Duration::from_millis(self.retry_delay_ms.saturating_mul(1 << attempt.min(16)))
    }

    /// Base URL with a trailing slash so relative joins keep any path prefix.
    pub fn endpoint(&self) -> Result<Url, ClientError> {
        let mut base = self.base_url.trim().to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        let url = Url::parse(&base)
            .map_err(|e| ClientError::Config(format!("invalid base url {:?}: {}", self.base_url, e)))?;
        if url.cannot_be_a_base() {
            return Err(ClientError::Config(format!(
                "base url {:?} cannot be a base",
                self.base_url
            )));
        }
        Ok(url)
    }
}
