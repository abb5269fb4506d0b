//! Fluent construction of [`HomeyClient`]

use std::sync::Arc;
use std::time::Duration;

use homey_transport::{
    ChannelConfig, ClientConfig, HomeyError, HomeyResult, ReconnectConfig, SocketConnector,
};

use super::core::HomeyClient;

/// Builder for [`HomeyClient`].
///
/// # Examples
///
/// ```rust,no_run
/// use std::time::Duration;
/// use homey_client::{HomeyClient, ReconnectConfig};
///
/// # fn example() -> homey_client::HomeyResult<()> {
/// let client = HomeyClient::builder()
///     .with_base_url("https://192-168-1-100.homey.homeylocal.com")
///     .with_token("my-token")
///     .with_timeout(Duration::from_secs(10))
///     .with_reconnect_config(ReconnectConfig::new().with_max_attempts(5))
///     .build()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct ClientBuilder {
    base_url: Option<String>,
    token: Option<String>,
    timeout: Option<Duration>,
    verify_tls: Option<bool>,
    user_agent: Option<String>,
    channel: ChannelConfig,
    connector: Option<Arc<dyn SocketConnector>>,
}

impl ClientBuilder {
    /// Create a builder with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing configuration
    pub fn from_config(config: ClientConfig) -> Self {
        Self {
            base_url: Some(config.base_url),
            token: Some(config.token),
            timeout: Some(config.timeout),
            verify_tls: Some(config.verify_tls),
            user_agent: config.user_agent,
            channel: config.channel,
            connector: None,
        }
    }

    // ============================================================================
    // CONNECTION
    // ============================================================================

    /// Hub address, e.g. `http://192.168.1.100`
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Personal access token
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Default REST timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Enable or disable TLS certificate verification
    pub fn with_verify_tls(mut self, verify: bool) -> Self {
        self.verify_tls = Some(verify);
        self
    }

    /// User-Agent header for REST requests
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    // ============================================================================
    // EVENT CHANNEL
    // ============================================================================

    /// Replace the whole event channel configuration
    pub fn with_channel_config(mut self, channel: ChannelConfig) -> Self {
        self.channel = channel;
        self
    }

    /// Reconnection policy for the event channel
    pub fn with_reconnect_config(mut self, reconnect: ReconnectConfig) -> Self {
        self.channel.reconnect = reconnect;
        self
    }

    /// Socket paths tried during discovery, in order
    pub fn with_discovery_paths<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.channel = self.channel.with_discovery_paths(paths);
        self
    }

    /// Custom socket connector (proxies, tests)
    pub fn with_socket_connector(mut self, connector: Arc<dyn SocketConnector>) -> Self {
        self.connector = Some(connector);
        self
    }

    /// Validate and build. Performs no network I/O.
    ///
    /// # Errors
    ///
    /// [`HomeyError::Validation`] when the URL or token is missing or invalid.
    pub fn build(self) -> HomeyResult<HomeyClient> {
        let base_url = self
            .base_url
            .ok_or_else(|| HomeyError::Validation("Base URL is required".to_string()))?;
        let token = self
            .token
            .ok_or_else(|| HomeyError::Validation("Token is required".to_string()))?;

        let mut config = ClientConfig::new(base_url, token).with_channel_config(self.channel);
        if let Some(timeout) = self.timeout {
            config = config.with_timeout(timeout);
        }
        if let Some(verify) = self.verify_tls {
            config = config.with_verify_tls(verify);
        }
        if let Some(user_agent) = self.user_agent {
            config = config.with_user_agent(user_agent);
        }

        HomeyClient::assemble(config, self.connector)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_missing_fields() {
        let err = ClientBuilder::new().with_token("t").build().unwrap_err();
        assert!(matches!(err, HomeyError::Validation(ref m) if m.contains("Base URL")));

        let err = ClientBuilder::new()
            .with_base_url("http://192.168.1.10")
            .build()
            .unwrap_err();
        assert!(matches!(err, HomeyError::Validation(ref m) if m.contains("Token")));
    }

    #[test]
    fn test_settings_reach_config() {
        let client = ClientBuilder::new()
            .with_base_url("http://192.168.1.10/")
            .with_token("token")
            .with_timeout(Duration::from_secs(7))
            .with_discovery_paths(["/events"])
            .with_reconnect_config(ReconnectConfig::disabled())
            .build()
            .unwrap();

        let config = client.config();
        assert_eq!(config.base_url, "http://192.168.1.10");
        assert_eq!(config.timeout, Duration::from_secs(7));
        assert_eq!(config.channel.discovery_paths, vec!["/events".to_string()]);
        assert!(!config.channel.reconnect.enabled);
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let err = ClientBuilder::new()
            .with_base_url("http://192.168.1.10")
            .with_token("token")
            .with_timeout(Duration::ZERO)
            .build()
            .unwrap_err();
        assert!(matches!(err, HomeyError::Validation(_)));
    }
}
