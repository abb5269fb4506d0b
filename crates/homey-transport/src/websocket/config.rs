//! Configuration for the real-time event channel

use std::time::Duration;

/// Socket paths tried in order during endpoint discovery.
pub const DEFAULT_DISCOVERY_PATHS: [&str; 3] =
    ["/socket.io/", "/api/socket.io/", "/api/manager/socket.io/"];

/// Event channel configuration
#[derive(Clone, Debug)]
pub struct ChannelConfig {
    /// Candidate socket paths, appended to the ws/wss base in order
    pub discovery_paths: Vec<String>,

    /// Handshake timeout for each candidate
    pub connect_timeout: Duration,

    /// Upper bound on waiting for the consumption task during close
    pub close_timeout: Duration,

    /// Reconnection configuration
    pub reconnect: ReconnectConfig,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            discovery_paths: DEFAULT_DISCOVERY_PATHS
                .iter()
                .map(|p| (*p).to_string())
                .collect(),
            connect_timeout: Duration::from_secs(30),
            close_timeout: Duration::from_secs(5),
            reconnect: ReconnectConfig::default(),
        }
    }
}

impl ChannelConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the discovery path list
    pub fn with_discovery_paths<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.discovery_paths = paths.into_iter().map(Into::into).collect();
        self
    }

    /// Set the per-candidate handshake timeout
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the bound on close()
    pub fn with_close_timeout(mut self, timeout: Duration) -> Self {
        self.close_timeout = timeout;
        self
    }

    /// Set reconnection configuration
    pub fn with_reconnect_config(mut self, config: ReconnectConfig) -> Self {
        self.reconnect = config;
        self
    }
}

/// Reconnection configuration
#[derive(Clone, Debug)]
pub struct ReconnectConfig {
    /// Allow automatic reconnection when the caller asks for it
    pub enabled: bool,

    /// Delay before the first attempt
    pub initial_delay: Duration,

    /// Maximum retry delay
    pub max_delay: Duration,

    /// Exponential backoff factor
    pub backoff_factor: f64,

    /// Maximum number of attempts
    pub max_attempts: u32,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            initial_delay: Duration::from_secs(5),
            max_delay: Duration::from_secs(60),
            backoff_factor: 2.0,
            max_attempts: 3,
        }
    }
}

impl ReconnectConfig {
    /// Create new reconnection configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Disable reconnection
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    /// Set the delay before the first attempt
    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Set maximum delay
    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Set backoff factor
    pub fn with_backoff_factor(mut self, factor: f64) -> Self {
        self.backoff_factor = factor;
        self
    }

    /// Set maximum attempts
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }

    /// Wait before attempt `attempt` (1-based): `initial_delay * factor^(attempt-1)`,
    /// capped at `max_delay` and never negative.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
        let secs = self.initial_delay.as_secs_f64() * self.backoff_factor.powi(exponent);
        if !secs.is_finite() || secs >= self.max_delay.as_secs_f64() {
            return self.max_delay;
        }
        Duration::from_secs_f64(secs.max(0.0))
    }
}
