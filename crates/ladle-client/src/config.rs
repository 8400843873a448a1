use std::time::Duration;

use crate::errors::ClientError;

/// Configuration for the Ladle API client.
#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// Base URL of the Ladle backend.
    pub base_url: String,
    /// Bearer token attached to owner-scoped calls when present.
    ///
    /// Resolved once here; the streaming core never reads ambient state.
    pub token: Option<String>,
    /// Default HTTP timeout for non-streaming requests.
    pub timeout: Duration,
}

impl ClientConfig {
    /// Creates a config for the given base URL with default settings.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            token: None,
            timeout: Duration::from_secs(30),
        }
    }

    /// Builds a config from `LADLE_API_BASE_URL` and, when set,
    /// `LADLE_API_TOKEN`.
    pub fn from_env() -> Result<Self, ClientError> {
        let base_url = std::env::var("LADLE_API_BASE_URL").unwrap_or_default();
        if base_url.trim().is_empty() {
            return Err(ClientError::Config(
                "missing LADLE_API_BASE_URL for Ladle client".into(),
            ));
        }
        let token = std::env::var("LADLE_API_TOKEN")
            .ok()
            .filter(|t| !t.trim().is_empty());
        Ok(Self {
            token,
            ..Self::new(base_url)
        })
    }

    /// Sets the bearer token.
    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Overrides the default HTTP timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub(crate) fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }
}
