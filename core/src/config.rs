//! Client configuration and service constants.
//!
//! Defaults target the hosted SwipeList API; every value can be overridden
//! from the environment.

use std::env;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ApiError, ApiResult};

/// Integration domain, used as the prefix of unique ids.
pub const DOMAIN: &str = "swipelist";

/// Hosted SwipeList API.
pub const DEFAULT_API_URL: &str = "https://swipelist.corsch.net/api";

/// Bound applied to every request.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Interval at which the host polls `GET /lists`.
pub const DEFAULT_SCAN_INTERVAL: Duration = Duration::from_secs(30);

/// Client configuration.
///
/// Deserializing goes through `ClientConfig::new` and `validate`, so a
/// loaded config is normalized exactly like a constructed one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawClientConfig")]
pub struct ClientConfig {
    /// Base URL the endpoint paths are appended to.
    pub base_url: String,
    /// Request timeout
    #[serde(with = "duration_secs")]
    pub timeout: Duration,
}

#[derive(Deserialize)]
struct RawClientConfig {
    base_url: String,
    #[serde(with = "duration_secs", default = "default_timeout")]
    timeout: Duration,
}

fn default_timeout() -> Duration {
    DEFAULT_TIMEOUT
}

impl TryFrom<RawClientConfig> for ClientConfig {
    type Error = ApiError;

    fn try_from(raw: RawClientConfig) -> ApiResult<Self> {
        let config = Self::new(&raw.base_url).with_timeout(raw.timeout);
        config.validate()?;
        Ok(config)
    }
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        duration.as_secs().serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl ClientConfig {
    /// Configuration for `base_url` with the default timeout.
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Create configuration from environment variables
    ///
    /// Reads the following environment variables:
    /// - `SWIPELIST_API_URL`: base URL (defaults to the hosted API)
    /// - `SWIPELIST_TIMEOUT_SECS`: request timeout in seconds
    pub fn from_env() -> ApiResult<Self> {
        let base_url = env::var("SWIPELIST_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());

        let timeout = match env::var("SWIPELIST_TIMEOUT_SECS") {
            Ok(raw) => raw
                .parse()
                .map(Duration::from_secs)
                .map_err(|_| ApiError::Config(format!("SWIPELIST_TIMEOUT_SECS is not a number: {raw}")))?,
            Err(_) => DEFAULT_TIMEOUT,
        };

        let config = Self::new(&base_url).with_timeout(timeout);
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> ApiResult<()> {
        if self.base_url.is_empty() {
            return Err(ApiError::Config("base_url cannot be empty".into()));
        }
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(ApiError::Config(format!(
                "base_url must start with http:// or https://: {}",
                self.base_url
            )));
        }
        if self.timeout.is_zero() {
            return Err(ApiError::Config("timeout must be greater than zero".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_targets_hosted_api() {
        let config = ClientConfig::default();
        assert_eq!(config.base_url, DEFAULT_API_URL);
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn trailing_slash_is_stripped() {
        assert_eq!(ClientConfig::new("http://localhost:3000/").base_url, "http://localhost:3000");
    }

    #[test]
    fn validate_rejects_bad_values() {
        assert!(ClientConfig::new("").validate().is_err());
        assert!(ClientConfig::new("ftp://example.com").validate().is_err());
        assert!(ClientConfig::new("http://localhost")
            .with_timeout(Duration::ZERO)
            .validate()
            .is_err());
    }

    #[test]
    fn timeout_serializes_as_seconds() {
        let config = ClientConfig::new("http://localhost").with_timeout(Duration::from_secs(5));
        let value = serde_json::to_value(&config).unwrap();
        assert_eq!(value["timeout"], 5);
        let back: ClientConfig = serde_json::from_value(value).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn deserialized_config_is_normalized() {
        let config: ClientConfig =
            serde_json::from_value(serde_json::json!({"base_url": "http://localhost:3000/api/"})).unwrap();
        assert_eq!(config.base_url, "http://localhost:3000/api");
        assert_eq!(config.timeout, DEFAULT_TIMEOUT);
    }

    #[test]
    fn deserializing_rejects_invalid_config() {
        let bad_scheme = serde_json::json!({"base_url": "ftp://example.com", "timeout": 5});
        let zero_timeout = serde_json::json!({"base_url": "http://localhost", "timeout": 0});
        let err = serde_json::from_value::<ClientConfig>(bad_scheme).unwrap_err();
        assert!(err.to_string().contains("http://"));
        assert!(serde_json::from_value::<ClientConfig>(zero_timeout).is_err());
    }
}
