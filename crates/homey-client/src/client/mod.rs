//! Client lifecycle and construction
//!
//! - `core`: [`HomeyClient`], the entry point
//! - `builder`: [`ClientBuilder`]
//! - `state`: [`ConnectionState`] and the shared status cell

pub mod builder;
pub mod core;
pub mod state;

pub use builder::ClientBuilder;
pub use self::core::HomeyClient;
pub use state::{ConnectionState, ConnectionStatus};
