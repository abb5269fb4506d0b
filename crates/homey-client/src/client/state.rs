//! Client lifecycle state

use std::sync::Arc;

use parking_lot::RwLock;

/// Overall client lifecycle.
///
/// Driven only by explicit `authenticate`/`connect`/`disconnect` calls, never
/// by the event channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    /// Constructed, not yet authenticated
    #[default]
    Uninitialized,
    /// Probe succeeded
    Authenticated,
    /// `connect()` completed
    Connected,
    /// `disconnect()` was called
    Disconnected,
}

/// Shared, read-mostly view of the lifecycle state.
///
/// The event channel holds a clone so it can check whether reconnecting still
/// makes sense; only the client changes the value.
#[derive(Debug, Clone, Default)]
pub struct ConnectionStatus {
    state: Arc<RwLock<ConnectionState>>,
}

impl ConnectionStatus {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Current state
    pub fn get(&self) -> ConnectionState {
        *self.state.read()
    }

    /// Whether the client is connected
    pub fn is_connected(&self) -> bool {
        self.get() == ConnectionState::Connected
    }

    /// Replace the state, returning the previous one
    pub(crate) fn set(&self, next: ConnectionState) -> ConnectionState {
        std::mem::replace(&mut *self.state.write(), next)
    }
}
