//! Base URL validation and derivation of REST and socket addresses.

use url::Url;

use crate::error::{HomeyError, HomeyResult};

/// Path of the diagnostic endpoint used to probe credentials.
pub const PROBE_PATH: &str = "api/manager/system";

/// Minimum length (exclusive) of an acceptable base URL.
const MIN_URL_LEN: usize = 10;

/// Trim whitespace and trailing slashes. No scheme is inferred.
pub fn normalize_base_url(raw: &str) -> String {
    raw.trim().trim_end_matches('/').to_string()
}

/// Check that `url` is an absolute `http://` or `https://` address longer than 10 characters.
///
/// # Errors
///
/// Returns [`HomeyError::Validation`] when the address is unusable.
pub fn validate_base_url(url: &str) -> HomeyResult<()> {
    if url.is_empty() {
        return Err(HomeyError::Validation("Base URL cannot be empty".to_string()));
    }
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(HomeyError::Validation(format!(
            "Base URL must start with http:// or https://: {}",
            url
        )));
    }
    if url.len() <= MIN_URL_LEN {
        return Err(HomeyError::Validation(format!(
            "Base URL is too short: {}",
            url
        )));
    }
    Url::parse(url)?;
    Ok(())
}

/// Resolve an API path against the base URL: `{base}/api/{path}`.
pub fn api_url(base_url: &str, path: &str) -> String {
    format!("{}/api/{}", base_url, path.trim_start_matches('/'))
}

/// Where a personal access token can be created for this hub.
pub fn token_url(base_url: &str) -> String {
    format!("{}/manager/users/token", normalize_base_url(base_url))
}

/// Upgrade the transport scheme for the real-time socket (`http` → `ws`, `https` → `wss`).
///
/// # Errors
///
/// Returns [`HomeyError::Validation`] for unparseable URLs or unsupported schemes.
pub fn websocket_base(base_url: &str) -> HomeyResult<String> {
    let mut url = Url::parse(base_url)?;
    let scheme = match url.scheme() {
        "http" => "ws",
        "https" => "wss",
        other => {
            return Err(HomeyError::Validation(format!(
                "Unsupported scheme for event channel: {}",
                other
            )));
        }
    };
    url.set_scheme(scheme)
        .map_err(|()| HomeyError::Validation(format!("Cannot upgrade scheme of {}", base_url)))?;
    Ok(url.as_str().trim_end_matches('/').to_string())
}

/// Ordered socket URLs to try during discovery.
///
/// # Errors
///
/// Propagates [`websocket_base`] failures.
pub fn discovery_candidates(base_url: &str, paths: &[String]) -> HomeyResult<Vec<String>> {
    let ws_base = websocket_base(base_url)?;
    Ok(paths
        .iter()
        .map(|path| format!("{}/{}", ws_base, path.trim_start_matches('/')))
        .collect())
}
