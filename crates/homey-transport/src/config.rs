//! Client configuration.

use std::time::Duration;

use crate::endpoint::{normalize_base_url, validate_base_url};
use crate::error::{HomeyError, HomeyResult};
use crate::websocket::ChannelConfig;

/// Environment variable holding the hub base URL.
pub const ENV_URL: &str = "HOMEY_URL";
/// Environment variable holding the bearer token.
pub const ENV_TOKEN: &str = "HOMEY_TOKEN";
/// Environment variable overriding the request timeout (seconds).
pub const ENV_TIMEOUT_SECS: &str = "HOMEY_TIMEOUT_SECS";

/// Connection settings for a Homey hub
#[derive(Clone)]
pub struct ClientConfig {
    /// Normalized base URL, e.g. `http://192.168.1.100`
    pub base_url: String,

    /// Personal access token
    pub token: String,

    /// Default timeout for REST requests and the authentication probe
    pub timeout: Duration,

    /// Verify TLS certificates (disable only for self-signed hubs)
    pub verify_tls: bool,

    /// Optional User-Agent header
    pub user_agent: Option<String>,

    /// Event channel settings
    pub channel: ChannelConfig,
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url)
            .field("token", &"<redacted>")
            .field("timeout", &self.timeout)
            .field("verify_tls", &self.verify_tls)
            .field("user_agent", &self.user_agent)
            .field("channel", &self.channel)
            .finish()
    }
}

impl ClientConfig {
    /// Create a configuration with default timeouts
    pub fn new(base_url: impl AsRef<str>, token: impl Into<String>) -> Self {
        Self {
            base_url: normalize_base_url(base_url.as_ref()),
            token: token.into(),
            timeout: Duration::from_secs(30),
            verify_tls: true,
            user_agent: None,
            channel: ChannelConfig::default(),
        }
    }

    /// Build a configuration from `HOMEY_URL`, `HOMEY_TOKEN` and optional `HOMEY_TIMEOUT_SECS`.
    ///
    /// # Errors
    ///
    /// Returns [`HomeyError::Validation`] when a variable is missing or malformed.
    pub fn from_env() -> HomeyResult<Self> {
        let url = std::env::var(ENV_URL)
            .map_err(|_| HomeyError::Validation(format!("{} is not set", ENV_URL)))?;
        let token = std::env::var(ENV_TOKEN)
            .map_err(|_| HomeyError::Validation(format!("{} is not set", ENV_TOKEN)))?;

        let mut config = Self::new(url, token);
        if let Ok(raw) = std::env::var(ENV_TIMEOUT_SECS) {
            let secs: u64 = raw.trim().parse().map_err(|_| {
                HomeyError::Validation(format!("{} must be a whole number: {}", ENV_TIMEOUT_SECS, raw))
            })?;
            config.timeout = Duration::from_secs(secs);
        }
        Ok(config)
    }

    /// Set request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Enable or disable TLS certificate verification
    pub fn with_verify_tls(mut self, verify: bool) -> Self {
        self.verify_tls = verify;
        self
    }

    /// Set User-Agent header
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Set event channel configuration
    pub fn with_channel_config(mut self, channel: ChannelConfig) -> Self {
        self.channel = channel;
        self
    }

    /// Validate URL and token without touching the network.
    ///
    /// # Errors
    ///
    /// Returns [`HomeyError::Validation`] describing the first problem found.
    pub fn validate(&self) -> HomeyResult<()> {
        validate_base_url(&self.base_url)?;
        validate_token(&self.token)?;
        if self.timeout.is_zero() {
            return Err(HomeyError::Validation(
                "Timeout must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// A token is acceptable when it contains at least one non-whitespace character.
///
/// # Errors
///
/// Returns [`HomeyError::Validation`] for empty or whitespace-only tokens.
pub fn validate_token(token: &str) -> HomeyResult<()> {
    if token.trim().is_empty() {
        return Err(HomeyError::Validation("Token cannot be empty".to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_normalizes_url() {
        let config = ClientConfig::new("http://192.168.1.100/ ", "abc");
        assert_eq!(config.base_url, "http://192.168.1.100");
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert!(config.verify_tls);
    }

    #[test]
    fn test_validate() {
        assert!(ClientConfig::new("http://192.168.1.100", "abc").validate().is_ok());
        assert!(matches!(
            ClientConfig::new("http://192.168.1.100", "   ").validate(),
            Err(HomeyError::Validation(_))
        ));
        assert!(matches!(
            ClientConfig::new("hub.local", "abc").validate(),
            Err(HomeyError::Validation(_))
        ));
        assert!(matches!(
            ClientConfig::new("http://192.168.1.100", "abc")
                .with_timeout(Duration::ZERO)
                .validate(),
            Err(HomeyError::Validation(_))
        ));
    }

    #[test]
    fn test_debug_redacts_token() {
        let config = ClientConfig::new("http://192.168.1.100", "super-secret");
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains("<redacted>"));
    }
}
