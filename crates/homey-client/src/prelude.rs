//! Prelude module for convenient imports
//!
//! ```rust,no_run
//! use homey_client::prelude::*;
//! ```

pub use crate::{CRATE_NAME, VERSION};

pub use crate::{
    // Client
    ClientBuilder,
    ClientConfig,
    ConnectionState,
    HomeyClient,
    // Errors
    HomeyError,
    HomeyResult,
    // Events
    ChannelState,
    EventHandler,
    HandlerError,
    HandlerResult,
    InboundEvent,
    ReconnectConfig,
    WILDCARD_TOPIC,
    topics,
    // Models
    App,
    Device,
    Flow,
    SystemConfig,
    Zone,
};
