//! HTTP gateway configuration and shared error mapping.

use std::env;
use std::time::Duration;

use reqwest::{Client, Response, StatusCode};

use opsdesk_core::error::{OpsdeskError, Result};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Configuration shared by both HTTP gateways.
///
/// Request signing and the global 401 redirect are the embedding
/// application's concern; this layer only attaches the bearer token it is
/// given and reports `Unauthorized` upward.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub base_url: String,
    pub bearer_token: Option<String>,
    pub timeout: Duration,
}

impl GatewayConfig {
    /// Creates a config for the given API base URL, e.g.
    /// `https://support.example.com`.
    pub fn new(base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self {
            base_url,
            bearer_token: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Loads configuration from environment variables.
    ///
    /// `OPSDESK_API_URL` is required; `OPSDESK_API_TOKEN` is attached as
    /// a bearer token when present.
    pub fn try_from_env() -> Result<Self> {
        let base_url = env::var("OPSDESK_API_URL").map_err(|_| {
            OpsdeskError::internal("OPSDESK_API_URL not found in environment variables")
        })?;
        let mut config = Self::new(base_url);
        if let Ok(token) = env::var("OPSDESK_API_TOKEN") {
            config.bearer_token = Some(token);
        }
        Ok(config)
    }

    /// Attaches a bearer token sent with every request.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }

    /// Overrides the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Builds the reqwest client for this config.
    pub(crate) fn build_client(&self) -> Result<Client> {
        Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|err| OpsdeskError::internal(format!("failed to build HTTP client: {err}")))
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

/// Maps a transport-level failure: no response at all means the backend
/// is unreachable.
pub(crate) fn transport_error(err: reqwest::Error) -> OpsdeskError {
    OpsdeskError::network_unavailable(err.to_string())
}

/// Maps a body-decoding failure.
pub(crate) fn decode_error(err: reqwest::Error) -> OpsdeskError {
    OpsdeskError::Serialization {
        format: "JSON".to_string(),
        message: err.to_string(),
    }
}

/// Checks a response's status, collapsing every non-2xx into the error
/// taxonomy: 401 is `Unauthorized`, everything else `Rejected`.
pub(crate) async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    if status == StatusCode::UNAUTHORIZED {
        return Err(OpsdeskError::Unauthorized);
    }
    let body = response.text().await.unwrap_or_default();
    tracing::warn!(status = status.as_u16(), "backend rejected request");
    Err(OpsdeskError::rejected(Some(status.as_u16()), body))
}
