//! Real-time events: routing and the socket channel
//!
//! ## Architecture
//!
//! ```text
//! events/
//! ├── handler.rs   # EventHandler trait, HandlerError, closure adapters
//! ├── router.rs    # EventRouter: topic → handler, isolated dispatch
//! ├── channel.rs   # EventChannel state machine (open / close / state)
//! └── tasks.rs     # consumer loop and reconnect supervisor
//! ```

pub mod channel;
pub mod handler;
pub mod router;
mod tasks;

#[cfg(test)]
pub(crate) mod testing;

pub use channel::{ChannelState, EventChannel};
pub use handler::{AsyncFnHandler, EventHandler, FnHandler, HandlerError, HandlerResult};
pub use router::{EventRouter, WILDCARD_TOPIC, topics};
