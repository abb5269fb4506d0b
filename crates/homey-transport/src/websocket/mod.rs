//! Real-time socket plumbing
//!
//! ## Architecture
//!
//! ```text
//! websocket/
//! ├── config.rs     # ChannelConfig / ReconnectConfig
//! ├── discovery.rs  # Ordered endpoint probing
//! ├── message.rs    # {"type", "data"} frame codec
//! └── socket.rs     # EventSocket / SocketConnector traits + tungstenite impl
//! ```
//!
//! The state machine that drives these pieces lives in the client crate.

pub mod config;
pub mod discovery;
pub mod message;
pub mod socket;

pub use config::{ChannelConfig, DEFAULT_DISCOVERY_PATHS, ReconnectConfig};
pub use discovery::discover;
pub use message::InboundEvent;
pub use socket::{BoxedSocket, EventSocket, SocketConnector, TungsteniteConnector, TungsteniteSocket};
