//! HTTP client configuration

use std::fmt;
use std::time::Duration;

/// Configuration for the billing API client
#[derive(Clone)]
pub struct HttpClientConfig {
    /// Base URL of the API, e.g. "https://clinic.example.com/api"
    pub base_url: String,

    /// Bearer token sent with every request, when set
    pub auth_token: Option<String>,

    /// Request timeout in seconds
    pub timeout_secs: u64,

    /// User-Agent header
    pub user_agent: String,
}

impl fmt::Debug for HttpClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpClientConfig")
            .field("base_url", &self.base_url)
            .field("auth_token", &self.auth_token.as_ref().map(|_| "<redacted>"))
            .field("timeout_secs", &self.timeout_secs)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000/api".to_string(),
            auth_token: None,
            timeout_secs: 30,
            user_agent: format!("clinic-billing/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl HttpClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
