//! Error types for the EKDSend client.
//!
//! Every failure surfaces as exactly one [`EkdSendError`] variant. API
//! failures share an [`ApiErrorInfo`] payload (message, HTTP status, machine
//! code, request id) and add kind-specific fields on top of it.

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

use crate::transport::TransportError;

/// Result type alias for EKDSend operations.
pub type EkdSendResult<T> = Result<T, EkdSendError>;

/// Response header carrying the server-side correlation id.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Fields shared by every API error variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiErrorInfo {
    /// Human-readable message.
    pub message: String,
    /// HTTP status code.
    pub status_code: u16,
    /// Machine-readable error code.
    pub code: String,
    /// Correlation id from the `x-request-id` response header.
    pub request_id: Option<String>,
}

impl fmt::Display for ApiErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.request_id {
            Some(request_id) => write!(
                f,
                "{} (code: {}, status: {}, request_id: {})",
                self.message, self.code, self.status_code, request_id
            ),
            None => write!(
                f,
                "{} (code: {}, status: {})",
                self.message, self.code, self.status_code
            ),
        }
    }
}

/// Comprehensive error type for EKDSend client operations.
#[derive(Debug, Error)]
pub enum EkdSendError {
    /// Configuration error (missing or malformed API key, bad base URL).
    #[error("Configuration error: {message}")]
    Configuration {
        /// Error message describing the configuration issue.
        message: String,
    },

    /// A request was rejected locally before reaching the network.
    #[error("Invalid request: {message}")]
    InvalidRequest {
        /// Error message.
        message: String,
        /// The parameter at fault.
        param: Option<String>,
    },

    /// Network-level failure after all retries were used.
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// The caller cancelled while waiting for a rate limiter permit.
    #[error("Rate limiter error: {message}")]
    RateLimiter {
        /// Error message.
        message: String,
    },

    /// The caller cancelled while the request was in flight or backing off.
    #[error("Request cancelled")]
    Cancelled,

    /// The request body could not be serialized.
    #[error("Serialization error: {message}")]
    Serialization {
        /// Error message.
        message: String,
    },

    /// A successful response body did not match the expected shape.
    #[error("Decode error (HTTP {status_code}): {message}")]
    Decode {
        /// Error message.
        message: String,
        /// HTTP status code of the response.
        status_code: u16,
        /// Correlation id from the response.
        request_id: Option<String>,
    },

    /// Request validation failed (HTTP 400).
    #[error("Validation error: {info}")]
    Validation {
        /// Shared error payload.
        info: ApiErrorInfo,
        /// Per-field validation details.
        details: HashMap<String, serde_json::Value>,
    },

    /// The API key was rejected (HTTP 401).
    #[error("Authentication failed: {info}")]
    Authentication {
        /// Shared error payload.
        info: ApiErrorInfo,
    },

    /// The resource does not exist (HTTP 404).
    #[error("Not found: {info}")]
    NotFound {
        /// Shared error payload.
        info: ApiErrorInfo,
    },

    /// The server rejected the request as over its rate limit (HTTP 429).
    #[error("Rate limit exceeded: {info}")]
    RateLimit {
        /// Shared error payload.
        info: ApiErrorInfo,
        /// Server-suggested wait before retrying.
        retry_after: Option<Duration>,
    },

    /// Any other 4xx/5xx response.
    #[error("EKDSend API error: {info}")]
    Api {
        /// Shared error payload.
        info: ApiErrorInfo,
    },
}

impl EkdSendError {
    /// Returns true if the executor may retry after this error.
    ///
    /// Only network-level transport failures and 429/5xx responses qualify.
    pub fn is_retryable(&self) -> bool {
        match self {
            EkdSendError::Transport(e) => e.is_retryable(),
            _ => self
                .status_code()
                .is_some_and(|status| status == 429 || status >= 500),
        }
    }

    /// Returns true if the call stopped because the caller cancelled it.
    pub fn is_cancellation(&self) -> bool {
        matches!(
            self,
            EkdSendError::RateLimiter { .. } | EkdSendError::Cancelled
        )
    }

    /// Returns the shared API error payload, if this is an API error.
    pub fn api_info(&self) -> Option<&ApiErrorInfo> {
        match self {
            EkdSendError::Validation { info, .. }
            | EkdSendError::Authentication { info }
            | EkdSendError::NotFound { info }
            | EkdSendError::RateLimit { info, .. }
            | EkdSendError::Api { info } => Some(info),
            _ => None,
        }
    }

    /// Returns the HTTP status code, if a response was received.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            EkdSendError::Decode { status_code, .. } => Some(*status_code),
            _ => self.api_info().map(|info| info.status_code),
        }
    }

    /// Returns the server correlation id, if one was received.
    pub fn request_id(&self) -> Option<&str> {
        match self {
            EkdSendError::Decode { request_id, .. } => request_id.as_deref(),
            _ => self.api_info().and_then(|info| info.request_id.as_deref()),
        }
    }

    /// Returns the retry-after duration if available.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            EkdSendError::RateLimit { retry_after, .. } => *retry_after,
            _ => None,
        }
    }

    /// Returns true for HTTP 400 validation errors.
    pub fn is_validation(&self) -> bool {
        matches!(self, EkdSendError::Validation { .. })
    }

    /// Returns true for HTTP 401 authentication errors.
    pub fn is_authentication(&self) -> bool {
        matches!(self, EkdSendError::Authentication { .. })
    }

    /// Returns true for HTTP 404 errors.
    pub fn is_not_found(&self) -> bool {
        matches!(self, EkdSendError::NotFound { .. })
    }

    /// Returns true for HTTP 429 errors.
    pub fn is_rate_limit(&self) -> bool {
        matches!(self, EkdSendError::RateLimit { .. })
    }

    /// Creates a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        EkdSendError::Configuration {
            message: message.into(),
        }
    }

    /// Creates a client-side invalid request error.
    pub fn invalid_request(message: impl Into<String>) -> Self {
        EkdSendError::InvalidRequest {
            message: message.into(),
            param: None,
        }
    }

    /// Creates a client-side invalid request error naming the parameter.
    pub fn invalid_param(message: impl Into<String>, param: impl Into<String>) -> Self {
        EkdSendError::InvalidRequest {
            message: message.into(),
            param: Some(param.into()),
        }
    }

    /// Classifies a non-2xx response into a typed error.
    ///
    /// A body that is not a valid error envelope yields a generic
    /// [`EkdSendError::Api`] that still carries the status code.
    pub fn from_response(status: u16, body: &[u8], request_id: Option<String>) -> Self {
        let Ok(envelope) = serde_json::from_slice::<ApiErrorResponse>(body) else {
            return EkdSendError::Api {
                info: ApiErrorInfo {
                    message: "API request failed".to_string(),
                    status_code: status,
                    code: "UNKNOWN_ERROR".to_string(),
                    request_id,
                },
            };
        };

        let detail = envelope.error;
        let info = |default_code: &str| ApiErrorInfo {
            message: detail.message.clone(),
            status_code: status,
            code: detail
                .code
                .clone()
                .filter(|code| !code.is_empty())
                .unwrap_or_else(|| default_code.to_string()),
            request_id: request_id.clone(),
        };

        match status {
            400 => EkdSendError::Validation {
                info: info("VALIDATION_ERROR"),
                details: detail.details.clone().unwrap_or_default(),
            },
            401 => EkdSendError::Authentication {
                info: info("AUTHENTICATION_ERROR"),
            },
            404 => EkdSendError::NotFound {
                info: info("NOT_FOUND"),
            },
            429 => EkdSendError::RateLimit {
                info: info("RATE_LIMIT_EXCEEDED"),
                retry_after: detail.retry_after.map(Duration::from_secs),
            },
            _ => EkdSendError::Api {
                info: info("UNKNOWN_ERROR"),
            },
        }
    }
}

/// Error envelope returned by the EKDSend API.
#[derive(Debug, serde::Deserialize)]
pub struct ApiErrorResponse {
    /// The error details.
    pub error: ApiErrorDetail,
}

/// Detailed API error information.
#[derive(Debug, serde::Deserialize)]
pub struct ApiErrorDetail {
    /// The error message.
    #[serde(default)]
    pub message: String,
    /// The machine-readable error code.
    pub code: Option<String>,
    /// Structured per-field details.
    pub details: Option<HashMap<String, serde_json::Value>>,
    /// Seconds to wait before retrying.
    pub retry_after: Option<u64>,
}

impl From<serde_json::Error> for EkdSendError {
    fn from(err: serde_json::Error) -> Self {
        EkdSendError::Serialization {
            message: err.to_string(),
        }
    }
}

impl From<url::ParseError> for EkdSendError {
    fn from(err: url::ParseError) -> Self {
        EkdSendError::Configuration {
            message: format!("Invalid URL: {}", err),
        }
    }
}
