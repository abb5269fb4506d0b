//! Authenticated REST calls and status-code mapping.
//!
//! Resource managers never touch reqwest directly: they build an [`ApiRequest`]
//! and hand it to a [`RequestGateway`]. [`HttpGateway`] is the production
//! implementation; tests can substitute their own.
//!
//! Status mapping:
//!
//! ```text
//! 2xx        → parsed JSON body ({} when empty)
//! 401 / 403  → HomeyError::Permission
//! 404        → HomeyError::NotFound
//! other ≥400 → HomeyError::Api { status, details }
//! timeout    → HomeyError::Timeout
//! refused/DNS/TLS → HomeyError::Connection
//! ```
//!
//! There are no retries at this layer.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Method;
use serde_json::{Map, Value};
use tracing::{debug, trace};

use crate::auth::AuthSession;
use crate::endpoint::api_url;
use crate::error::{HomeyError, HomeyResult};
use crate::http::request_error;

/// One REST call, relative to `{base}/api/`.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    /// HTTP method
    pub method: Method,
    /// Path such as `manager/devices/device`
    pub path: String,
    /// Optional JSON body
    pub body: Option<Value>,
    /// Query parameters
    pub query: Vec<(String, String)>,
    /// Per-request timeout; the gateway default applies when `None`
    pub timeout: Option<Duration>,
}

impl ApiRequest {
    /// Create a request with an arbitrary method
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
            query: Vec::new(),
            timeout: None,
        }
    }

    /// GET request
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    /// POST request
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    /// PUT request
    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    /// DELETE request
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Attach a JSON body
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Append a query parameter
    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Override the timeout for this request
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    fn describe(&self) -> String {
        format!("{} {}", self.method, self.path)
    }
}

/// The authenticated request capability consumed by resource managers.
#[async_trait]
pub trait RequestGateway: Send + Sync + std::fmt::Debug {
    /// Issue one request and return the parsed JSON body.
    async fn request(&self, request: ApiRequest) -> HomeyResult<Value>;
}

/// [`RequestGateway`] backed by reqwest and an [`AuthSession`].
#[derive(Debug, Clone)]
pub struct HttpGateway {
    http: reqwest::Client,
    auth: Arc<AuthSession>,
    default_timeout: Duration,
}

impl HttpGateway {
    /// Create a gateway sharing the session's HTTP client settings
    pub fn new(http: reqwest::Client, auth: Arc<AuthSession>) -> Self {
        let default_timeout = auth.timeout();
        Self {
            http,
            auth,
            default_timeout,
        }
    }

    /// Override the default timeout
    pub fn with_default_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = timeout;
        self
    }
}

#[async_trait]
impl RequestGateway for HttpGateway {
    async fn request(&self, request: ApiRequest) -> HomeyResult<Value> {
        let url = api_url(&self.auth.base_url(), &request.path);
        let timeout = request.timeout.unwrap_or(self.default_timeout);
        let operation = request.describe();
        debug!("{} -> {}", operation, url);

        let mut builder = self
            .http
            .request(request.method.clone(), &url)
            .headers(self.auth.header_map())
            .timeout(timeout);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| request_error(&e, &operation, timeout))?;

        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| request_error(&e, &operation, timeout))?;
        trace!("{} returned {} ({} bytes)", operation, status, body.len());

        map_response(status, &request.path, &body)
    }
}

/// Translate a status code and raw body into a JSON value or typed error.
///
/// # Errors
///
/// See the module documentation for the mapping table.
pub fn map_response(status: u16, path: &str, body: &[u8]) -> HomeyResult<Value> {
    match status {
        200..=299 => {
            if body.iter().all(u8::is_ascii_whitespace) {
                return Ok(Value::Object(Map::new()));
            }
            serde_json::from_slice(body).map_err(|e| {
                HomeyError::Serialization(format!("Invalid JSON in response to {}: {}", path, e))
            })
        }
        401 => Err(HomeyError::Permission("Authentication failed".to_string())),
        403 => Err(HomeyError::Permission("Insufficient permissions".to_string())),
        404 => Err(HomeyError::NotFound(format!("Resource not found: {}", path))),
        400..=u16::MAX => Err(HomeyError::Api {
            status,
            message: format!("API request failed: {}", status),
            details: serde_json::from_slice(body).unwrap_or_else(|_| Value::Object(Map::new())),
        }),
        _ => Ok(Value::Object(Map::new())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_success_parses_body() {
        let value = map_response(200, "manager/zones/zone", br#"{"z1":{"id":"z1"}}"#).unwrap();
        assert_eq!(value, json!({"z1": {"id": "z1"}}));
    }

    #[test]
    fn test_empty_success_body_is_empty_object() {
        assert_eq!(map_response(200, "x", b"").unwrap(), json!({}));
        assert_eq!(map_response(204, "x", b"  ").unwrap(), json!({}));
    }

    #[test]
    fn test_invalid_json_on_success() {
        assert!(matches!(
            map_response(200, "x", b"<html>"),
            Err(HomeyError::Serialization(_))
        ));
    }

    #[test]
    fn test_error_statuses() {
        assert!(matches!(
            map_response(404, "manager/devices/device/d1", b""),
            Err(HomeyError::NotFound(msg)) if msg.contains("manager/devices/device/d1")
        ));
        assert!(matches!(map_response(401, "x", b""), Err(HomeyError::Permission(_))));
        assert!(matches!(map_response(403, "x", b""), Err(HomeyError::Permission(_))));
    }

    #[test]
    fn test_api_error_details_are_best_effort() {
        match map_response(500, "x", br#"{"error":"boom"}"#) {
            Err(HomeyError::Api { status, details, .. }) => {
                assert_eq!(status, 500);
                assert_eq!(details, json!({"error": "boom"}));
            }
            other => panic!("unexpected: {:?}", other),
        }

        match map_response(502, "x", b"Bad Gateway") {
            Err(HomeyError::Api { status, details, .. }) => {
                assert_eq!(status, 502);
                assert_eq!(details, json!({}));
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_request_builders() {
        let req = ApiRequest::put("manager/devices/device/d1/capability/onoff")
            .with_body(json!({"value": true}))
            .with_query("opts", "1")
            .with_timeout(Duration::from_secs(5));
        assert_eq!(req.method, Method::PUT);
        assert_eq!(req.query, vec![("opts".to_string(), "1".to_string())]);
        assert_eq!(req.timeout, Some(Duration::from_secs(5)));
        assert_eq!(req.describe(), "PUT manager/devices/device/d1/capability/onoff");
    }
}
