//! Shared reqwest client construction and transport error mapping.

use std::time::Duration;

use tracing::warn;

use crate::config::ClientConfig;
use crate::error::{HomeyError, HomeyResult};

/// Build the HTTP client used for the probe and every REST request.
///
/// # Errors
///
/// Returns [`HomeyError::Connection`] if the TLS backend cannot be initialized.
pub fn build_http_client(config: &ClientConfig) -> HomeyResult<reqwest::Client> {
    let mut builder = reqwest::Client::builder().timeout(config.timeout);

    if !config.verify_tls {
        warn!(
            "TLS certificate verification disabled for {}; only use this with self-signed hubs",
            config.base_url
        );
        builder = builder.danger_accept_invalid_certs(true);
    }

    if let Some(user_agent) = &config.user_agent {
        builder = builder.user_agent(user_agent.clone());
    }

    builder
        .build()
        .map_err(|e| HomeyError::Connection(format!("Failed to build HTTP client: {}", e)))
}

/// Map a reqwest failure on a REST call: timeouts become [`HomeyError::Timeout`],
/// everything else (refused, DNS, TLS, reset) becomes [`HomeyError::Connection`].
pub(crate) fn request_error(err: &reqwest::Error, operation: &str, timeout: Duration) -> HomeyError {
    if err.is_timeout() {
        HomeyError::Timeout {
            operation: operation.to_string(),
            timeout,
        }
    } else if err.is_connect() {
        HomeyError::Connection(format!("Failed to connect to Homey: {}", err))
    } else {
        HomeyError::Connection(format!("Request failed: {}", err))
    }
}
