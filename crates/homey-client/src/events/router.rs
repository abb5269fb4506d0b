//! Topic → handler routing
//!
//! One handler per topic; registering again replaces the previous one.
//! The registry sits behind a single lock that is never held across an
//! `.await`, so `on`/`off` may be called from inside a running handler.

use std::collections::HashMap;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt as _;
use homey_transport::InboundEvent;
use parking_lot::RwLock;
use serde_json::Value;
use tracing::{debug, error, trace};

use super::handler::{AsyncFnHandler, EventHandler, FnHandler, HandlerResult};

/// Topic that receives every event, after the topic-specific handler
pub const WILDCARD_TOPIC: &str = "*";

/// Topics pushed by the hub
pub mod topics {
    /// Device state changes
    pub const DEVICE: &str = "device";
    /// Zone changes
    pub const ZONE: &str = "zone";
    /// Flow changes
    pub const FLOW: &str = "flow";
    /// App changes
    pub const APP: &str = "app";
}

type Registry = HashMap<String, Arc<dyn EventHandler>>;

/// Maps topics to handlers and dispatches events to them.
///
/// Cloning is cheap; clones share the same registry.
#[derive(Clone, Default)]
pub struct EventRouter {
    handlers: Arc<RwLock<Registry>>,
}

impl std::fmt::Debug for EventRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventRouter")
            .field("topics", &self.topics())
            .finish()
    }
}

impl EventRouter {
    /// Create an empty router
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for `topic`, replacing any existing handler
    pub fn on(&self, topic: impl Into<String>, handler: Arc<dyn EventHandler>) {
        let topic = topic.into();
        debug!("Registering handler for topic {}", topic);
        if self.handlers.write().insert(topic.clone(), handler).is_some() {
            trace!("Replaced previous handler for topic {}", topic);
        }
    }

    /// Register a synchronous closure
    pub fn on_fn<F>(&self, topic: impl Into<String>, f: F)
    where
        F: Fn(Value) -> HandlerResult + Send + Sync + 'static,
    {
        self.on(topic, Arc::new(FnHandler::new(f)));
    }

    /// Register an async closure
    pub fn on_async<F, Fut>(&self, topic: impl Into<String>, f: F)
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.on(topic, Arc::new(AsyncFnHandler::new(f)));
    }

    /// Remove the handler for `topic`. Returns whether one was registered.
    pub fn off(&self, topic: &str) -> bool {
        let removed = self.handlers.write().remove(topic).is_some();
        if removed {
            debug!("Removed handler for topic {}", topic);
        }
        removed
    }

    /// Check if a handler is registered for `topic`
    pub fn has_handler(&self, topic: &str) -> bool {
        self.handlers.read().contains_key(topic)
    }

    /// Registered topics, sorted
    pub fn topics(&self) -> Vec<String> {
        let mut topics: Vec<String> = self.handlers.read().keys().cloned().collect();
        topics.sort();
        topics
    }

    /// Remove every handler
    pub fn clear(&self) {
        self.handlers.write().clear();
    }

    /// Invoke the handler for the event's topic (then the wildcard handler, if any).
    ///
    /// Unregistered topics are dropped silently. Handler errors and panics are
    /// logged and swallowed. Returns whether any handler ran.
    pub async fn dispatch(&self, event: InboundEvent) -> bool {
        let (specific, wildcard) = {
            let handlers = self.handlers.read();
            let wildcard = if event.topic == WILDCARD_TOPIC {
                None
            } else {
                handlers.get(WILDCARD_TOPIC).cloned()
            };
            (handlers.get(&event.topic).cloned(), wildcard)
        };

        match (specific, wildcard) {
            (None, None) => {
                trace!("No handler for topic {}, dropping event", event.topic);
                false
            }
            (Some(handler), None) => {
                invoke(&handler, event).await;
                true
            }
            (None, Some(wildcard)) => {
                invoke(&wildcard, event).await;
                true
            }
            (Some(handler), Some(wildcard)) => {
                invoke(&handler, event.clone()).await;
                invoke(&wildcard, event).await;
                true
            }
        }
    }
}

async fn invoke(handler: &Arc<dyn EventHandler>, event: InboundEvent) {
    let topic = event.topic.clone();
    match AssertUnwindSafe(handler.handle(event)).catch_unwind().await {
        Ok(Ok(())) => trace!("Handler for topic {} completed", topic),
        Ok(Err(e)) => error!("Handler for topic {} failed: {}", topic, e),
        Err(_) => error!("Handler for topic {} panicked", topic),
    }
}
