//! Client configuration

use tracing::debug;

/// Default service address used when `TH_API_URL` is not set.
pub const DEFAULT_API_URL: &str = "http://localhost:3001";

/// Connection settings for the remote task service.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base address of the task service, without a trailing slash.
    pub base_url: String,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Read the configuration from the environment.
    pub fn from_env() -> Self {
        let base_url = std::env::var("TH_API_URL")
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());
        debug!("Using task service at {}", base_url);
        Self::new(base_url)
    }
}
