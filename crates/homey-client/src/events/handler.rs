//! Event handler trait and closure adapters
//!
//! Every handler is asynchronous. Synchronous closures are wrapped into
//! [`FnHandler`] at registration time so the router only ever awaits.

use std::fmt;
use std::future::Future;

use async_trait::async_trait;
use homey_transport::InboundEvent;
use serde_json::Value;
use thiserror::Error;

/// Errors a handler can report back to the router
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum HandlerError {
    /// The payload did not have the expected shape
    #[error("Invalid payload: {details}")]
    InvalidPayload { details: String },

    /// Generic handler error
    #[error("Handler error: {message}")]
    Generic { message: String },

    /// External system error (database, UI, ...)
    #[error("External system error: {source}")]
    External {
        #[from]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl HandlerError {
    /// Shorthand for [`HandlerError::Generic`]
    pub fn msg(message: impl Into<String>) -> Self {
        Self::Generic {
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for HandlerError {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidPayload {
            details: err.to_string(),
        }
    }
}

/// Result type returned by handlers
pub type HandlerResult = Result<(), HandlerError>;

/// Receives push events for one topic.
///
/// Errors and panics are caught by the router and logged; they never reach
/// the event channel.
#[async_trait]
pub trait EventHandler: Send + Sync + fmt::Debug {
    /// Handle one event
    async fn handle(&self, event: InboundEvent) -> HandlerResult;
}

/// Adapter for synchronous closures taking the payload
pub struct FnHandler<F> {
    f: F,
}

impl<F> FnHandler<F>
where
    F: Fn(Value) -> HandlerResult + Send + Sync,
{
    /// Wrap a closure
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F> fmt::Debug for FnHandler<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FnHandler")
    }
}

#[async_trait]
impl<F> EventHandler for FnHandler<F>
where
    F: Fn(Value) -> HandlerResult + Send + Sync,
{
    async fn handle(&self, event: InboundEvent) -> HandlerResult {
        (self.f)(event.payload)
    }
}

/// Adapter for closures returning a future
pub struct AsyncFnHandler<F> {
    f: F,
}

impl<F, Fut> AsyncFnHandler<F>
where
    F: Fn(Value) -> Fut + Send + Sync,
    Fut: Future<Output = HandlerResult> + Send,
{
    /// Wrap an async closure
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F> fmt::Debug for AsyncFnHandler<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AsyncFnHandler")
    }
}

#[async_trait]
impl<F, Fut> EventHandler for AsyncFnHandler<F>
where
    F: Fn(Value) -> Fut + Send + Sync,
    Fut: Future<Output = HandlerResult> + Send,
{
    async fn handle(&self, event: InboundEvent) -> HandlerResult {
        (self.f)(event.payload).await
    }
}
