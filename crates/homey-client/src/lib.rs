//! # Homey Client
//!
//! Async client for the local API of a Homey home-automation hub.
//!
//! ## Features
//!
//! - Token authentication with a diagnostic probe and typed failures
//! - REST access through resource managers (devices, zones, flows, apps, system)
//! - Optional real-time event channel with endpoint discovery and bounded reconnection
//! - Topic-keyed event handlers, sync or async, isolated from each other
//!
//! ## Architecture
//!
//! ```text
//! Application
//!        ↓
//! HomeyClient (lifecycle, event API, manager access)
//!   ├── managers/   → RequestGateway → HTTP
//!   └── events/     → EventChannel → socket → EventRouter → handlers
//!        ↓
//! homey-transport (AuthSession, HttpGateway, socket discovery, HomeyError)
//! ```
//!
//! The event channel is independent of the REST path: a caller that never
//! opens it gets full request/response functionality and no socket at all.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use homey_client::prelude::*;
//!
//! # async fn example() -> HomeyResult<()> {
//! let client = HomeyClient::create("http://192.168.1.100", "my-token").await?;
//!
//! client.on_fn(topics::DEVICE, |payload| {
//!     println!("device update: {payload}");
//!     Ok(())
//! });
//! client.open_channel(true).await?;
//!
//! client.devices().turn_on("a1b2c3").await?;
//!
//! client.disconnect().await;
//! # Ok(())
//! # }
//! ```
//!
//! ## Scoped use
//!
//! ```rust,no_run
//! # use homey_client::prelude::*;
//! # async fn example(client: HomeyClient) -> HomeyResult<()> {
//! let zones = client
//!     .scoped(|client| async move { client.zones().list().await })
//!     .await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! Every synchronous call fails with one [`HomeyError`] variant. Failures of
//! the background reconnection and of individual event frames or handlers are
//! logged through `tracing` and never surface to callers.

pub mod client;
pub mod events;
pub mod managers;
pub mod models;
pub mod prelude;

pub use client::{ClientBuilder, ConnectionState, ConnectionStatus, HomeyClient};
pub use events::{
    AsyncFnHandler, ChannelState, EventChannel, EventHandler, EventRouter, FnHandler,
    HandlerError, HandlerResult, WILDCARD_TOPIC, topics,
};
pub use managers::{AppManager, DeviceManager, FlowManager, SystemManager, ZoneManager};
pub use models::{App, Device, DeviceCapability, Flow, SystemConfig, Zone};

pub use homey_transport::{
    ApiRequest, AuthSession, ChannelConfig, ClientConfig, HomeyError, HomeyResult,
    InboundEvent, ReconnectConfig, RequestGateway, Session, SocketConnector,
};

/// Crate name
pub const CRATE_NAME: &str = env!("CARGO_PKG_NAME");
/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
