//! Client configuration

use std::time::Duration;

/// Default polling period for the complaint list
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(30);

/// Client configuration for connecting to the complaints API
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// API base URL (e.g., "https://abc.execute-api.ap-south-1.amazonaws.com/prod")
    pub base_url: String,

    /// Request timeout in seconds
    pub timeout: u64,

    /// Auto-refresh period for the complaint store
    pub refresh_interval: Duration,
}

impl ClientConfig {
    /// Create a new client configuration
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: 30,
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
        }
    }

    /// Read configuration from the environment.
    ///
    /// - `SAMADHAN_API_URL` (default `http://localhost:3000`)
    /// - `SAMADHAN_TIMEOUT_SECS` (default 30)
    /// - `SAMADHAN_REFRESH_SECS` (default 30)
    pub fn from_env() -> Self {
        let base_url =
            std::env::var("SAMADHAN_API_URL").unwrap_or_else(|_| "http://localhost:3000".into());
        let timeout = std::env::var("SAMADHAN_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(30);
        let refresh_secs = std::env::var("SAMADHAN_REFRESH_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .filter(|secs: &u64| *secs > 0)
            .unwrap_or(DEFAULT_REFRESH_INTERVAL.as_secs());

        Self::new(base_url)
            .with_timeout(timeout)
            .with_refresh_interval(Duration::from_secs(refresh_secs))
    }

    /// Set the request timeout
    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout = seconds;
        self
    }

    /// Set the auto-refresh period
    pub fn with_refresh_interval(mut self, interval: Duration) -> Self {
        self.refresh_interval = interval;
        self
    }

    /// Create an HTTP client from this configuration
    pub fn build_http_client(&self) -> crate::ClientResult<crate::NetworkComplaintsApi> {
        crate::NetworkComplaintsApi::new(self)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new("http://localhost:3000")
    }
}
