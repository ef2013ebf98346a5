//! EKDSend API client.
//!
//! Provides the main client interface and the request executor shared by
//! the email, SMS and voice services.

mod executor;

pub use executor::RequestExecutor;

use std::sync::Arc;
use std::time::Duration;

use crate::auth::{ApiKeyAuth, AuthProvider};
use crate::config::{EkdSendConfig, EkdSendConfigBuilder};
use crate::errors::{EkdSendError, EkdSendResult};
use crate::observability::{ConsoleLogger, LogConfig, Logger, NoopLogger};
use crate::resilience::{RateLimiter, RetryConfig, TokenBucketLimiter};
use crate::services::{CallsService, EmailsService, SmsService};
use crate::transport::{HttpTransport, HttpTransportImpl};

/// The main EKDSend client.
///
/// Cheap to share: wrap it in an `Arc` and call it from as many tasks as
/// needed. All services draw from one rate limiter.
///
/// # Example
///
/// ```rust,no_run
/// use ekdsend_client::{EkdSendClient, SendEmailParams};
/// use tokio_util::sync::CancellationToken;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let client = EkdSendClient::builder()
///         .api_key("ek_live_your_api_key")
///         .build()?;
///
///     let params = SendEmailParams::new("hello@example.com", ["user@example.com"], "Welcome!")
///         .html("<h1>Welcome!</h1>");
///
///     let email = client.emails().send(&params, &CancellationToken::new()).await?;
///     println!("queued {}", email.id);
///     Ok(())
/// }
/// ```
pub struct EkdSendClient {
    config: EkdSendConfig,
    emails: EmailsService,
    sms: SmsService,
    calls: CallsService,
}

impl EkdSendClient {
    /// Creates a new client builder.
    pub fn builder() -> EkdSendClientBuilder {
        EkdSendClientBuilder::new()
    }

    /// Creates a client from environment variables.
    ///
    /// Reads `EKDSEND_API_KEY` and optionally `EKDSEND_BASE_URL`,
    /// `EKDSEND_TIMEOUT`, and `EKDSEND_DEBUG`.
    pub fn from_env() -> EkdSendResult<Self> {
        let config = EkdSendConfig::from_env()?;
        EkdSendClientBuilder::from_config(&config).build()
    }

    /// Creates a client from an API key.
    pub fn from_api_key(api_key: impl Into<String>) -> EkdSendResult<Self> {
        EkdSendClientBuilder::new().api_key(api_key).build()
    }

    /// Returns the emails service.
    pub fn emails(&self) -> &EmailsService {
        &self.emails
    }

    /// Returns the SMS service.
    pub fn sms(&self) -> &SmsService {
        &self.sms
    }

    /// Returns the voice calls service.
    pub fn calls(&self) -> &CallsService {
        &self.calls
    }

    /// Returns the configuration.
    pub fn config(&self) -> &EkdSendConfig {
        &self.config
    }
}

impl std::fmt::Debug for EkdSendClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EkdSendClient")
            .field("config", &self.config)
            .finish()
    }
}

/// Builder for the EKDSend client.
pub struct EkdSendClientBuilder {
    config_builder: EkdSendConfigBuilder,
    transport: Option<Arc<dyn HttpTransport>>,
    http_client: Option<reqwest::Client>,
    rate_limiter: Option<Arc<dyn RateLimiter>>,
    retry_config: RetryConfig,
    logger: Option<Arc<dyn Logger>>,
}

impl EkdSendClientBuilder {
    /// Creates a new client builder.
    pub fn new() -> Self {
        Self {
            config_builder: EkdSendConfigBuilder::new(),
            transport: None,
            http_client: None,
            rate_limiter: None,
            retry_config: RetryConfig::default(),
            logger: None,
        }
    }

    /// Creates a builder from an existing configuration.
    pub fn from_config(config: &EkdSendConfig) -> Self {
        Self {
            config_builder: EkdSendConfigBuilder::new()
                .api_key(config.api_key())
                .base_url(&config.base_url)
                .timeout(config.timeout)
                .debug(config.debug),
            ..Self::new()
        }
    }

    /// Sets the API key.
    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.config_builder = self.config_builder.api_key(api_key);
        self
    }

    /// Sets the API key from an environment variable.
    pub fn api_key_from_env(mut self, var_name: &str) -> EkdSendResult<Self> {
        self.config_builder = self.config_builder.api_key_from_env(var_name)?;
        Ok(self)
    }

    /// Sets the base URL.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.config_builder = self.config_builder.base_url(base_url);
        self
    }

    /// Sets the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config_builder = self.config_builder.timeout(timeout);
        self
    }

    /// Sets the timeout in seconds.
    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.config_builder = self.config_builder.timeout_secs(secs);
        self
    }

    /// Writes requests and responses to the diagnostic sink.
    pub fn debug(mut self, debug: bool) -> Self {
        self.config_builder = self.config_builder.debug(debug);
        self
    }

    /// Sets a custom transport. Takes precedence over [`Self::http_client`].
    pub fn transport(mut self, transport: Arc<dyn HttpTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Sends through a caller-configured reqwest client.
    pub fn http_client(mut self, client: reqwest::Client) -> Self {
        self.http_client = Some(client);
        self
    }

    /// Sets a custom rate limiter.
    pub fn rate_limiter(mut self, rate_limiter: Arc<dyn RateLimiter>) -> Self {
        self.rate_limiter = Some(rate_limiter);
        self
    }

    /// Sets the retry configuration.
    pub fn retry(mut self, config: RetryConfig) -> Self {
        self.retry_config = config;
        self
    }

    /// Sets a custom diagnostic sink.
    pub fn logger(mut self, logger: Arc<dyn Logger>) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Builds the client.
    ///
    /// The API key and base URL are validated here; no request is sent.
    pub fn build(self) -> EkdSendResult<EkdSendClient> {
        let config = self.config_builder.build()?;
        let auth = ApiKeyAuth::new(config.api_key.clone());
        auth.validate()?;

        let transport: Arc<dyn HttpTransport> = match (self.transport, self.http_client) {
            (Some(transport), _) => transport,
            (None, Some(client)) => Arc::new(HttpTransportImpl::with_client(
                client,
                &config.base_url,
                config.timeout,
            )),
            (None, None) => Arc::new(
                HttpTransportImpl::new(&config.base_url, config.timeout)
                    .map_err(|e| EkdSendError::configuration(e.to_string()))?,
            ),
        };

        let rate_limiter: Arc<dyn RateLimiter> = match self.rate_limiter {
            Some(limiter) => limiter,
            None => Arc::new(TokenBucketLimiter::default()),
        };

        let logger: Arc<dyn Logger> = match self.logger {
            Some(logger) => logger,
            None if config.debug => Arc::new(ConsoleLogger::new(LogConfig::debug())),
            None => Arc::new(NoopLogger),
        };

        let executor = Arc::new(
            RequestExecutor::new(
                transport,
                Arc::new(auth),
                rate_limiter,
                logger,
            )
            .with_retry(self.retry_config)
            .with_debug(config.debug),
        );

        tracing::debug!(
            base_url = %config.base_url,
            key = %config.api_key_hint(),
            "EKDSend client ready"
        );

        Ok(EkdSendClient {
            emails: EmailsService::new(Arc::clone(&executor)),
            sms: SmsService::new(Arc::clone(&executor)),
            calls: CallsService::new(executor),
            config,
        })
    }
}

impl Default for EkdSendClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}
