//! Bearer-token session and the authentication probe.
//!
//! [`AuthSession`] validates its inputs on construction (no network traffic),
//! then [`AuthSession::authenticate`] sends a single `GET /api/manager/system`
//! and records the hub's answer as session metadata.

use std::collections::HashMap;
use std::time::Duration;

use parking_lot::RwLock;
use reqwest::header::{self, HeaderMap, HeaderValue};
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::config::{ClientConfig, validate_token};
use crate::endpoint::{PROBE_PATH, normalize_base_url, token_url, validate_base_url};
use crate::error::{HomeyError, HomeyResult};
use crate::http::build_http_client;

/// Authentication state for one hub.
#[derive(Clone, Default, PartialEq)]
pub struct Session {
    /// Validated base URL
    pub endpoint: String,
    /// Bearer token
    pub token: String,
    /// Set by a successful probe
    pub authenticated: bool,
    /// Probe response body, stored verbatim
    pub metadata: Map<String, Value>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("endpoint", &self.endpoint)
            .field("token", &"<redacted>")
            .field("authenticated", &self.authenticated)
            .field("metadata", &self.metadata)
            .finish()
    }
}

/// Holds the endpoint and token, performs the probe and produces request headers.
#[derive(Debug)]
pub struct AuthSession {
    http: reqwest::Client,
    timeout: Duration,
    session: RwLock<Session>,
}

impl AuthSession {
    /// Validate `base_url` and `token` and build a session with default settings.
    ///
    /// # Errors
    ///
    /// Returns [`HomeyError::Validation`] before any network call when either input is invalid.
    pub fn new(base_url: impl AsRef<str>, token: impl Into<String>) -> HomeyResult<Self> {
        let config = ClientConfig::new(base_url, token);
        config.validate()?;
        let http = build_http_client(&config)?;
        Self::with_client(&config, http)
    }

    /// Build a session sharing an existing HTTP client.
    ///
    /// # Errors
    ///
    /// Returns [`HomeyError::Validation`] when the configuration is invalid.
    pub fn with_client(config: &ClientConfig, http: reqwest::Client) -> HomeyResult<Self> {
        let endpoint = normalize_base_url(&config.base_url);
        validate_base_url(&endpoint)?;
        validate_token(&config.token)?;

        Ok(Self {
            http,
            timeout: config.timeout,
            session: RwLock::new(Session {
                endpoint,
                token: config.token.clone(),
                authenticated: false,
                metadata: Map::new(),
            }),
        })
    }

    /// Probe the hub with the bearer token.
    ///
    /// # Errors
    ///
    /// - [`HomeyError::Authentication`] on 401/403 or any other non-2xx status
    /// - [`HomeyError::Connection`] on timeout, refused connection or DNS failure
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// # use homey_transport::AuthSession;
    /// # tokio_test::block_on(async {
    /// let auth = AuthSession::new("http://192.168.1.100", "my-token")?;
    /// let session = auth.authenticate().await?;
    /// println!("connected to {:?}", session.metadata.get("name"));
    /// # Ok::<(), homey_transport::HomeyError>(())
    /// # });
    /// ```
    pub async fn authenticate(&self) -> HomeyResult<Session> {
        let url = format!("{}/{}", self.base_url(), PROBE_PATH);
        debug!("Authenticating against {}", url);

        let response = self
            .http
            .get(&url)
            .headers(self.header_map())
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    HomeyError::Connection(format!(
                        "Authentication probe timed out after {:?}",
                        self.timeout
                    ))
                } else {
                    HomeyError::Connection(format!("Failed to reach Homey: {}", e))
                }
            })?;

        let status = response.status();
        match status.as_u16() {
            401 => {
                return Err(HomeyError::Authentication {
                    message: "Invalid or expired token".to_string(),
                    status: Some(401),
                });
            }
            403 => {
                return Err(HomeyError::Authentication {
                    message: "Token lacks the required permissions".to_string(),
                    status: Some(403),
                });
            }
            code if !status.is_success() => {
                return Err(HomeyError::Authentication {
                    message: format!("Unexpected status {} from authentication probe", code),
                    status: Some(code),
                });
            }
            _ => {}
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| HomeyError::Connection(format!("Failed to read probe response: {}", e)))?;

        let metadata = match serde_json::from_slice::<Value>(&body) {
            Ok(Value::Object(map)) => map,
            Ok(_) | Err(_) => {
                warn!("Authentication probe returned a non-object body; storing empty metadata");
                Map::new()
            }
        };

        let snapshot = {
            let mut session = self.session.write();
            session.authenticated = true;
            session.metadata = metadata;
            session.clone()
        };

        info!("Authenticated with Homey at {}", snapshot.endpoint);
        Ok(snapshot)
    }

    /// Request headers: bearer authorization and JSON content type.
    pub fn headers(&self) -> HashMap<String, String> {
        let session = self.session.read();
        HashMap::from([
            ("Authorization".to_string(), format!("Bearer {}", session.token)),
            ("Content-Type".to_string(), "application/json".to_string()),
        ])
    }

    /// Same headers as [`headers`](Self::headers), typed for reqwest.
    pub fn header_map(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        let token = self.session.read().token.clone();
        if let Ok(value) = HeaderValue::from_str(&format!("Bearer {}", token)) {
            headers.insert(header::AUTHORIZATION, value);
        } else {
            warn!("Token contains characters not allowed in an HTTP header");
        }
        headers
    }

    /// Whether the last probe succeeded
    pub fn is_authenticated(&self) -> bool {
        self.session.read().authenticated
    }

    /// Snapshot of the current session
    pub fn session(&self) -> Session {
        self.session.read().clone()
    }

    /// Metadata returned by the last successful probe
    pub fn metadata(&self) -> Map<String, Value> {
        self.session.read().metadata.clone()
    }

    /// Normalized base URL
    pub fn base_url(&self) -> String {
        self.session.read().endpoint.clone()
    }

    /// Where a personal access token can be created for this hub
    pub fn token_url(&self) -> String {
        token_url(&self.base_url())
    }

    /// Default timeout for requests made with this session
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}
