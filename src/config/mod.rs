//! Configuration module for the EKDSend client.
//!
//! Provides configuration management including the API key, base URL,
//! request timeout and debug mode. All values are fixed once the client
//! is built.

use secrecy::{ExposeSecret, SecretString};
use std::time::Duration;

use crate::auth::{self, KeyMode};
use crate::errors::{EkdSendError, EkdSendResult};

/// Version of this client library.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// User agent sent with every request.
pub const USER_AGENT: &str = concat!("ekdsend-rust/", env!("CARGO_PKG_VERSION"));

/// Default base URL for the EKDSend API.
pub const DEFAULT_BASE_URL: &str = "https://es.ekddigital.com/v1";

/// Default request timeout (30 seconds).
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default number of retries after the first attempt.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default sustained request rate of the built-in rate limiter.
pub const DEFAULT_RATE_LIMIT_PER_SECOND: f64 = 100.0;

/// Default burst size of the built-in rate limiter.
pub const DEFAULT_RATE_LIMIT_BURST: u32 = 10;

/// Default page size for list operations.
pub const DEFAULT_LIST_LIMIT: u32 = 20;

/// Configuration for the EKDSend client.
#[derive(Clone)]
pub struct EkdSendConfig {
    /// API key for authentication (stored securely).
    pub(crate) api_key: SecretString,
    /// Base URL for API requests, without a trailing slash.
    pub base_url: String,
    /// Request timeout.
    pub timeout: Duration,
    /// Whether request/response bodies are written to the diagnostic sink.
    pub debug: bool,
}

impl EkdSendConfig {
    /// Creates a new configuration builder.
    pub fn builder() -> EkdSendConfigBuilder {
        EkdSendConfigBuilder::new()
    }

    /// Creates a configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `EKDSEND_API_KEY` (required): API key for authentication
    /// - `EKDSEND_BASE_URL` (optional): Custom base URL
    /// - `EKDSEND_TIMEOUT` (optional): Request timeout in seconds
    /// - `EKDSEND_DEBUG` (optional): `1` or `true` enables debug output
    pub fn from_env() -> EkdSendResult<Self> {
        let api_key = std::env::var("EKDSEND_API_KEY").map_err(|_| {
            EkdSendError::configuration("EKDSEND_API_KEY environment variable not set")
        })?;

        let mut builder = EkdSendConfigBuilder::new().api_key(api_key);

        if let Ok(base_url) = std::env::var("EKDSEND_BASE_URL") {
            builder = builder.base_url(base_url);
        }

        if let Ok(timeout_str) = std::env::var("EKDSEND_TIMEOUT") {
            if let Ok(timeout_secs) = timeout_str.parse::<u64>() {
                builder = builder.timeout(Duration::from_secs(timeout_secs));
            }
        }

        if let Ok(debug) = std::env::var("EKDSEND_DEBUG") {
            builder = builder.debug(matches!(debug.as_str(), "1" | "true" | "TRUE"));
        }

        builder.build()
    }

    /// Returns the API key (exposing the secret).
    pub(crate) fn api_key(&self) -> &str {
        self.api_key.expose_secret()
    }

    /// Returns whether the key targets live or test traffic.
    pub fn key_mode(&self) -> KeyMode {
        if self.api_key().starts_with(auth::LIVE_KEY_PREFIX) {
            KeyMode::Live
        } else {
            KeyMode::Test
        }
    }

    /// Returns the API key hint (last 4 characters) for debugging.
    pub fn api_key_hint(&self) -> String {
        auth::key_hint(self.api_key())
    }

    /// Returns the full URL for an endpoint.
    pub fn endpoint_url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

impl std::fmt::Debug for EkdSendConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EkdSendConfig")
            .field("api_key", &"[REDACTED]")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("debug", &self.debug)
            .finish()
    }
}

/// Builder for `EkdSendConfig`.
#[derive(Default)]
pub struct EkdSendConfigBuilder {
    api_key: Option<String>,
    base_url: Option<String>,
    timeout: Option<Duration>,
    debug: bool,
}

impl EkdSendConfigBuilder {
    /// Creates a new configuration builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the API key.
    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Sets the API key from an environment variable.
    pub fn api_key_from_env(mut self, var_name: &str) -> EkdSendResult<Self> {
        let api_key = std::env::var(var_name).map_err(|_| {
            EkdSendError::configuration(format!("Environment variable {} not set", var_name))
        })?;
        self.api_key = Some(api_key);
        Ok(self)
    }

    /// Sets the base URL.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Sets the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets the timeout in seconds.
    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.timeout = Some(Duration::from_secs(secs));
        self
    }

    /// Enables or disables debug output.
    pub fn debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Builds the configuration.
    ///
    /// Fails before any network activity if the key is missing or
    /// malformed, or the base URL is not an `http(s)` URL.
    pub fn build(self) -> EkdSendResult<EkdSendConfig> {
        let api_key = self.api_key.unwrap_or_default();
        auth::validate_api_key(&api_key)?;

        let base_url = self
            .base_url
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let parsed = url::Url::parse(&base_url)?;
        if !matches!(parsed.scheme(), "https" | "http") {
            return Err(EkdSendError::configuration(
                "Base URL must use HTTP or HTTPS",
            ));
        }

        let timeout = self.timeout.unwrap_or(DEFAULT_TIMEOUT);
        if timeout.is_zero() {
            return Err(EkdSendError::configuration("Timeout must be non-zero"));
        }

        Ok(EkdSendConfig {
            api_key: SecretString::new(api_key),
            base_url,
            timeout,
            debug: self.debug,
        })
    }
}
