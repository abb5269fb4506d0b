//! # homey-transport
//!
//! Low-level building blocks for talking to a Homey hub over its local API:
//!
//! - [`AuthSession`]: token validation, the authentication probe and request headers
//! - [`RequestGateway`] / [`HttpGateway`]: authenticated REST calls with typed errors
//! - [`websocket`]: endpoint discovery, socket abstraction and the push-event wire format
//! - [`HomeyError`]: the error taxonomy shared by every layer
//!
//! Most applications should use `homey-client`, which layers the connection
//! lifecycle, event routing and resource managers on top of this crate.

pub mod auth;
pub mod config;
pub mod endpoint;
pub mod error;
pub mod gateway;
pub mod http;
pub mod websocket;

pub use auth::{AuthSession, Session};
pub use config::{ClientConfig, validate_token};
pub use endpoint::{normalize_base_url, validate_base_url};
pub use error::{HomeyError, HomeyResult};
pub use gateway::{ApiRequest, HttpGateway, RequestGateway, map_response};
pub use http::build_http_client;
pub use reqwest::Method;
pub use websocket::{
    BoxedSocket, ChannelConfig, EventSocket, InboundEvent, ReconnectConfig, SocketConnector,
    TungsteniteConnector,
};
