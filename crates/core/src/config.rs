//! Client runtime configuration.
//!
//! Configuration is resolved once at process startup and then passed into the client. Nothing
//! below reads process-wide environment variables; callers hand in whatever values they read so
//! that tests and multi-threaded runtimes see one consistent view.

use crate::constants::DEFAULT_API_URL;
use crate::validation::validate_api_base_url;
use crate::{ClinicError, ClinicResult};
use clinic_types::NonEmptyText;
use std::fmt;
use std::time::Duration;

/// Connection settings for the records backend.
#[derive(Clone, PartialEq, Eq)]
pub struct ClientConfig {
    base_url: String,
    token: Option<NonEmptyText>,
    timeout: Option<Duration>,
}

impl ClientConfig {
    /// Create a config for `base_url` with no token and no timeout.
    pub fn new(base_url: &str) -> ClinicResult<Self> {
        Ok(Self {
            base_url: validate_api_base_url(base_url)?,
            token: None,
            timeout: None,
        })
    }

    /// Attach the bearer token. A blank token is treated as absent.
    pub fn with_token(mut self, token: Option<&str>) -> Self {
        self.token = token.and_then(|t| NonEmptyText::new(t).ok());
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_ref().map(NonEmptyText::as_str)
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Absolute URL of a resource path such as `/appointments/7`.
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Resolve the base URL from an optional string value, falling back to [`DEFAULT_API_URL`].
pub fn base_url_from_env_value(value: Option<String>) -> ClinicResult<String> {
    let value = value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());
    validate_api_base_url(value.as_deref().unwrap_or(DEFAULT_API_URL))
}

/// Parse the request timeout from an optional string value.
///
/// `None`, empty or `0` mean no timeout.
pub fn timeout_from_env_value(value: Option<String>) -> ClinicResult<Option<Duration>> {
    let Some(raw) = value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty()) else {
        return Ok(None);
    };
    let secs: u64 = raw
        .parse()
        .map_err(|_| ClinicError::InvalidTimeout(raw.clone()))?;
    Ok((secs > 0).then(|| Duration::from_secs(secs)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_joins_without_double_slash() {
        let config = ClientConfig::new("http://localhost:3000/").expect("valid url");
        assert_eq!(config.url("/patients/3/appointments"), "http://localhost:3000/patients/3/appointments");
        assert_eq!(config.url("doctors"), "http://localhost:3000/doctors");
    }

    #[test]
    fn test_blank_token_is_absent_and_debug_redacts() {
        let config = ClientConfig::new(DEFAULT_API_URL)
            .expect("default url")
            .with_token(Some("  "));
        assert_eq!(config.token(), None);

        let config = config.with_token(Some("secret-token"));
        assert_eq!(config.token(), Some("secret-token"));
        let debug = format!("{config:?}");
        assert!(!debug.contains("secret-token"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_base_url_defaults_when_unset() {
        assert_eq!(base_url_from_env_value(None).expect("default"), DEFAULT_API_URL);
        assert_eq!(base_url_from_env_value(Some(" ".into())).expect("blank"), DEFAULT_API_URL);
        assert!(base_url_from_env_value(Some("localhost".into())).is_err());
    }

    #[test]
    fn test_timeout_values() {
        assert_eq!(timeout_from_env_value(None).expect("unset"), None);
        assert_eq!(timeout_from_env_value(Some("0".into())).expect("zero"), None);
        assert_eq!(
            timeout_from_env_value(Some("15".into())).expect("seconds"),
            Some(Duration::from_secs(15))
        );
        assert!(matches!(
            timeout_from_env_value(Some("soon".into())),
            Err(ClinicError::InvalidTimeout(_))
        ));
    }
}
