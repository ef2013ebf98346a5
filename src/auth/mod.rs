//! Authentication module for the EKDSend client.
//!
//! Provides the bearer API key credential and the provider trait the
//! executor uses to stamp it onto outgoing requests.

use reqwest::header::HeaderValue;
use secrecy::{ExposeSecret, SecretString};
use std::collections::HashMap;

use crate::errors::{EkdSendError, EkdSendResult};

/// Prefix of keys that act on live traffic.
pub const LIVE_KEY_PREFIX: &str = "ek_live_";

/// Prefix of keys that act in the sandbox.
pub const TEST_KEY_PREFIX: &str = "ek_test_";

/// Authentication provider trait.
///
/// Implementations of this trait provide authentication credentials
/// for API requests.
pub trait AuthProvider: Send + Sync {
    /// Apply authentication to request headers.
    fn apply_auth(&self, headers: &mut HashMap<String, String>);

    /// Validate the credentials.
    fn validate(&self) -> EkdSendResult<()>;
}

/// Which environment an API key targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyMode {
    /// `ek_live_` key.
    Live,
    /// `ek_test_` key.
    Test,
}

impl KeyMode {
    /// Detects the mode from a raw key, or `None` for an unrecognized prefix.
    pub fn detect(key: &str) -> Option<Self> {
        if key.starts_with(LIVE_KEY_PREFIX) {
            Some(KeyMode::Live)
        } else if key.starts_with(TEST_KEY_PREFIX) {
            Some(KeyMode::Test)
        } else {
            None
        }
    }
}

/// Validates the shape of a raw API key.
///
/// The key must carry a known prefix and be sendable as a bearer
/// `Authorization` header value.
pub fn validate_api_key(key: &str) -> EkdSendResult<KeyMode> {
    if key.is_empty() {
        return Err(EkdSendError::configuration("API key is required"));
    }

    let mode = KeyMode::detect(key).ok_or_else(|| {
        EkdSendError::configuration(format!(
            "invalid API key format: must start with '{}' or '{}'",
            LIVE_KEY_PREFIX, TEST_KEY_PREFIX
        ))
    })?;

    HeaderValue::from_str(&format!("Bearer {}", key)).map_err(|_| {
        EkdSendError::configuration(
            "invalid API key format: contains characters not allowed in a header",
        )
    })?;

    Ok(mode)
}

/// API key authentication provider.
///
/// Uses Bearer token authentication with the EKDSend API key.
pub struct ApiKeyAuth {
    api_key: SecretString,
}

impl ApiKeyAuth {
    /// Creates a new API key authentication provider.
    pub fn new(api_key: SecretString) -> Self {
        Self { api_key }
    }

    /// Creates from a string API key.
    pub fn from_string(api_key: impl Into<String>) -> Self {
        Self {
            api_key: SecretString::new(api_key.into()),
        }
    }

    /// Returns the mode the key targets, if its prefix is recognized.
    pub fn mode(&self) -> Option<KeyMode> {
        KeyMode::detect(self.api_key.expose_secret())
    }

    /// Gets a hint of the API key for debugging (last 4 characters).
    pub fn key_hint(&self) -> String {
        key_hint(self.api_key.expose_secret())
    }
}

pub(crate) fn key_hint(key: &str) -> String {
    if key.len() > 4 && key.is_char_boundary(key.len() - 4) {
        format!("...{}", &key[key.len() - 4..])
    } else {
        "****".to_string()
    }
}

impl AuthProvider for ApiKeyAuth {
    fn apply_auth(&self, headers: &mut HashMap<String, String>) {
        headers.insert(
            "Authorization".to_string(),
            format!("Bearer {}", self.api_key.expose_secret()),
        );
    }

    fn validate(&self) -> EkdSendResult<()> {
        validate_api_key(self.api_key.expose_secret()).map(|_| ())
    }
}

impl std::fmt::Debug for ApiKeyAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiKeyAuth")
            .field("api_key", &"[REDACTED]")
            .field("key_hint", &self.key_hint())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn test_api_key_auth_apply() {
        let auth = ApiKeyAuth::from_string("ek_test_key_12345");
        let mut headers = HashMap::new();

        auth.apply_auth(&mut headers);

        assert_eq!(
            headers.get("Authorization"),
            Some(&"Bearer ek_test_key_12345".to_string())
        );
    }

    #[test_case("ek_live_abc", KeyMode::Live ; "live key")]
    #[test_case("ek_test_abc", KeyMode::Test ; "test key")]
    fn test_validate_accepts_known_prefixes(key: &str, mode: KeyMode) {
        assert_eq!(validate_api_key(key).unwrap(), mode);
        assert_eq!(ApiKeyAuth::from_string(key).mode(), Some(mode));
        assert!(ApiKeyAuth::from_string(key).validate().is_ok());
    }

    #[test_case("" ; "empty")]
    #[test_case("sk_live_abc" ; "foreign prefix")]
    #[test_case("ek_prod_abc" ; "unknown mode")]
    #[test_case("EK_LIVE_abc" ; "wrong case")]
    #[test_case(" ek_live_abc" ; "leading space")]
    #[test_case("ek_test_abc\ndef" ; "embedded newline")]
    #[test_case("ek_live_abc\r\nX-Injected: 1" ; "header injection")]
    #[test_case("ek_live_abc\u{7f}" ; "control character")]
    fn test_validate_rejects_bad_keys(key: &str) {
        let err = validate_api_key(key).unwrap_err();
        assert!(matches!(err, EkdSendError::Configuration { .. }));
        assert!(ApiKeyAuth::from_string(key).validate().is_err());
    }

    #[test]
    fn test_api_key_hint() {
        let auth = ApiKeyAuth::from_string("ek_test_key_12345");
        assert_eq!(auth.key_hint(), "...2345");
    }

    #[test]
    fn test_api_key_hint_short_key() {
        let auth = ApiKeyAuth::from_string("abc");
        assert_eq!(auth.key_hint(), "****");
    }

    #[test]
    fn test_debug_redacts_key() {
        let auth = ApiKeyAuth::from_string("ek_live_secret_key");
        let debug_str = format!("{:?}", auth);

        assert!(debug_str.contains("[REDACTED]"));
        assert!(!debug_str.contains("ek_live_secret_key"));
    }
}
