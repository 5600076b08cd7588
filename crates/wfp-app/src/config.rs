//! Configuration types.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Environment variable holding the reporting endpoint URL.
pub const COMMCARE_API_ENV: &str = "WFP_COMMCARE_API";
/// Environment variable holding the request timeout in seconds.
pub const REQUEST_TIMEOUT_ENV: &str = "WFP_REQUEST_TIMEOUT_SECS";

const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

/// App configuration.
///
/// Without `commcare_api` the app runs in dummy mode: finished reports are
/// logged instead of sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Reporting endpoint, called with `sender` and `message` query parameters.
    #[serde(default)]
    pub commcare_api: Option<String>,
    /// Timeout applied to each reporting request.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            commcare_api: None,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

impl AppConfig {
    /// Parses a JSON configuration document; blank text yields the defaults.
    pub fn from_json(config_json: &str) -> Result<Self, ConfigError> {
        let config = if config_json.trim().is_empty() {
            Self::default()
        } else {
            serde_json::from_str(config_json).map_err(ConfigError::Parse)?
        };
        config.validated()
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an environment-style lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let request_timeout_secs = match lookup(REQUEST_TIMEOUT_ENV) {
            Some(raw) => raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
                key: REQUEST_TIMEOUT_ENV.to_string(),
                message: format!("expected a whole number of seconds, got '{raw}'"),
            })?,
            None => DEFAULT_REQUEST_TIMEOUT_SECS,
        };
        Self {
            commcare_api: lookup(COMMCARE_API_ENV),
            request_timeout_secs,
        }
        .validated()
    }

    /// The configured endpoint, ignoring blank values.
    pub fn endpoint(&self) -> Option<&str> {
        self.commcare_api
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    fn validated(self) -> Result<Self, ConfigError> {
        if let Some(url) = self.endpoint()
            && !(url.starts_with("http://") || url.starts_with("https://"))
        {
            return Err(ConfigError::InvalidValue {
                key: "commcare_api".to_string(),
                message: format!("'{url}' is not an http(s) URL"),
            });
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "request_timeout_secs".to_string(),
                message: "timeout must be at least one second".to_string(),
            });
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn blank_json_selects_dummy_mode() {
        let config = AppConfig::from_json("  ").expect("defaults");
        assert_eq!(config, AppConfig::default());
        assert!(config.endpoint().is_none());
        assert_eq!(config.request_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn json_endpoint_is_read() {
        let config =
            AppConfig::from_json(r#"{"commcare_api": "http://example.com/commcare/api/"}"#)
                .expect("config");
        assert_eq!(config.endpoint(), Some("http://example.com/commcare/api/"));
    }

    #[test]
    fn blank_endpoint_counts_as_absent() {
        let config = AppConfig::from_json(r#"{"commcare_api": "   "}"#).expect("config");
        assert!(config.endpoint().is_none());
    }

    #[test]
    fn non_http_endpoint_is_rejected() {
        let err = AppConfig::from_json(r#"{"commcare_api": "ftp://example.com"}"#).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { key, .. } if key == "commcare_api"));
    }

    #[test]
    fn lookup_reads_both_variables() {
        let vars = HashMap::from([
            (COMMCARE_API_ENV, "https://example.com/api"),
            (REQUEST_TIMEOUT_ENV, "3"),
        ]);
        let config = AppConfig::from_lookup(|key| vars.get(key).map(|value| value.to_string()))
            .expect("config");
        assert_eq!(config.endpoint(), Some("https://example.com/api"));
        assert_eq!(config.request_timeout_secs, 3);
    }

    #[test]
    fn lookup_rejects_bad_timeout() {
        let err = AppConfig::from_lookup(|key| {
            (key == REQUEST_TIMEOUT_ENV).then(|| "soon".to_string())
        })
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }
}
