//! Background work for one channel activation
//!
//! A single task per activation: it consumes frames until the socket ends,
//! then (if allowed) becomes the reconnect supervisor. A successful reconnect
//! spawns a fresh consumer and the supervisor exits, so at most one task is
//! ever alive for a channel.

use std::sync::Arc;

use futures::FutureExt as _;
use futures::future::BoxFuture;
use homey_transport::{BoxedSocket, InboundEvent};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use super::channel::{ChannelInner, ChannelState};

/// Consume frames from `socket` until it closes or `token` is cancelled.
pub(super) fn consume(
    inner: Arc<ChannelInner>,
    mut socket: BoxedSocket,
    generation: u64,
    token: CancellationToken,
) -> BoxFuture<'static, ()> {
    async move {
        loop {
            tokio::select! {
                biased;
                () = token.cancelled() => {
                    debug!("Event consumer cancelled; closing socket");
                    if let Err(e) = socket.close().await {
                        trace!("Socket close failed: {}", e);
                    }
                    return;
                }
                frame = socket.next_frame() => match frame {
                    Some(Ok(text)) => process_frame(&inner, &text).await,
                    Some(Err(e)) => {
                        warn!("Event socket error: {}", e);
                        break;
                    }
                    None => {
                        info!("Event socket closed by hub");
                        break;
                    }
                },
            }
        }
        drop(socket);

        if connection_lost(&inner, generation) {
            reconnect(&inner, generation, token).await;
        }
    }
    .boxed()
}

async fn process_frame(inner: &ChannelInner, text: &str) {
    match InboundEvent::parse(text) {
        Ok(event) => {
            trace!("Received {} event", event.topic);
            inner.router.dispatch(event).await;
        }
        Err(e) => warn!("Dropping malformed event frame: {}", e),
    }
}

/// Record the loss; returns whether the reconnect procedure should run.
fn connection_lost(inner: &ChannelInner, generation: u64) -> bool {
    let mut slot = inner.slot.lock();
    if slot.generation != generation {
        return false;
    }
    slot.endpoint = None;
    inner.transition(&mut slot, ChannelState::Closed);

    let reconnect = slot.auto_reconnect
        && inner.config.reconnect.enabled
        && inner.lifecycle.is_connected();
    slot.reconnecting = reconnect;
    if !reconnect {
        debug!("Event channel stays closed (auto-reconnect off or client not connected)");
    }
    reconnect
}

/// Bounded reconnect with exponential backoff. Failures are logged, never returned.
async fn reconnect(inner: &Arc<ChannelInner>, generation: u64, token: CancellationToken) {
    let policy = &inner.config.reconnect;

    for attempt in 1..=policy.max_attempts {
        let delay = policy.delay_for(attempt);
        info!(
            "Reconnecting event channel in {:?} (attempt {}/{})",
            delay, attempt, policy.max_attempts
        );

        tokio::select! {
            biased;
            () = token.cancelled() => {
                debug!("Reconnect cancelled");
                return;
            }
            () = tokio::time::sleep(delay) => {}
        }

        {
            let mut slot = inner.slot.lock();
            if slot.generation != generation || !slot.auto_reconnect {
                return;
            }
            if !inner.lifecycle.is_connected() {
                debug!("Client no longer connected; abandoning reconnect");
                slot.reconnecting = false;
                return;
            }
            inner.transition(&mut slot, ChannelState::Connecting);
        }

        match inner.connect(generation, token.clone()).await {
            Ok(()) => {
                info!("Event channel reconnected on attempt {}", attempt);
                return;
            }
            Err(e) => warn!("Reconnect attempt {} failed: {}", attempt, e),
        }
    }

    let mut slot = inner.slot.lock();
    if slot.generation == generation {
        slot.reconnecting = false;
        warn!(
            "Giving up on event channel after {} attempts",
            policy.max_attempts
        );
    }
}
