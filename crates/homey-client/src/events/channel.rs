//! Real-time event channel
//!
//! Owns zero or one socket. All mutable state lives in a single [`Slot`]
//! behind one mutex, and every state change goes through
//! [`ChannelInner::transition`].
//!
//! ```text
//!            open()                 handshake ok
//!   Idle ───────────► Connecting ─────────────────► Open
//!   Closed ─────────►     │                          │
//!                         │ all candidates fail      │ remote close / error
//!                         ▼                          ▼
//!                       Closed ◄──────────────────── Closed ──► (reconnect supervisor)
//!
//!   close(): Open | Connecting | reconnecting ──► Closing ──► Closed
//! ```
//!
//! `open()` is rejected while `Closing`. A `close()` issued during another
//! `close()` waits for the first one to reach `Closed`. A handler may close
//! its own channel: the consumer is cancelled but not joined, and the
//! channel becomes `Closed` before `close()` returns. The handler that
//! called it still runs to completion.
//!
//! Each `open()` starts a new *activation* identified by a generation number
//! and a cancellation token. The consumer task and the reconnect supervisor
//! only touch the slot while their generation is still current, so a
//! `close()` (which bumps the generation) can never be undone by a late
//! background step.

use std::sync::Arc;

use homey_transport::websocket::discover;
use homey_transport::{
    AuthSession, BoxedSocket, ChannelConfig, HomeyError, HomeyResult, SocketConnector,
};
use parking_lot::Mutex;
use tokio::sync::Notify;
use tokio::sync::futures::Notified;
use tokio::task::{Id, JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use super::router::EventRouter;
use super::tasks;
use crate::client::state::ConnectionStatus;

/// Event channel states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChannelState {
    /// Never opened
    #[default]
    Idle,
    /// Discovery / handshake in progress
    Connecting,
    /// Socket open, consumer task running
    Open,
    /// `close()` in progress
    Closing,
    /// Closed by the caller, the hub, or after a failed connect
    Closed,
}

impl ChannelState {
    fn can_transition_to(self, next: ChannelState) -> bool {
        use ChannelState::{Closed, Closing, Connecting, Idle, Open};
        matches!(
            (self, next),
            (Idle | Closed, Connecting)
                | (Connecting, Open | Closed)
                | (Open, Closed)
                | (Open | Connecting | Closed, Closing)
                | (Closing, Closed)
        )
    }
}

#[derive(Debug, Default)]
pub(super) struct Slot {
    pub(super) state: ChannelState,
    pub(super) generation: u64,
    pub(super) auto_reconnect: bool,
    pub(super) reconnecting: bool,
    pub(super) endpoint: Option<String>,
    cancel: Option<CancellationToken>,
    task: Option<JoinHandle<()>>,
    /// Id of the last spawned consumer, kept after `close()` takes the handle
    task_id: Option<Id>,
}

impl Slot {
    /// Whether the caller is running on this channel's consumer task
    fn on_consumer_task(&self) -> bool {
        self.task_id.is_some() && tokio::task::try_id() == self.task_id
    }
}

pub(super) struct ChannelInner {
    pub(super) auth: Arc<AuthSession>,
    pub(super) config: ChannelConfig,
    pub(super) connector: Arc<dyn SocketConnector>,
    pub(super) router: EventRouter,
    pub(super) lifecycle: ConnectionStatus,
    pub(super) slot: Mutex<Slot>,
    /// Fired whenever a `close()` finishes
    closed: Notify,
}

impl ChannelInner {
    /// The single place where `slot.state` changes.
    pub(super) fn transition(&self, slot: &mut Slot, next: ChannelState) {
        if slot.state == next {
            return;
        }
        if !slot.state.can_transition_to(next) {
            warn!(
                "Unexpected event channel transition {:?} -> {:?}",
                slot.state, next
            );
        }
        debug!("Event channel {:?} -> {:?}", slot.state, next);
        slot.state = next;
    }

    /// Run discovery for activation `generation` and, on success, start the consumer.
    ///
    /// The caller has already moved the slot to `Connecting`.
    pub(super) async fn connect(
        self: &Arc<Self>,
        generation: u64,
        token: CancellationToken,
    ) -> HomeyResult<()> {
        let headers = self.auth.headers();
        let base_url = self.auth.base_url();

        let result = tokio::select! {
            biased;
            () = token.cancelled() => Err(HomeyError::WebSocket(
                "event channel closed while connecting".to_string(),
            )),
            result = discover(
                self.connector.as_ref(),
                &base_url,
                &self.config.discovery_paths,
                &headers,
            ) => result,
        };

        let orphan: Option<BoxedSocket> = {
            let mut slot = self.slot.lock();
            if slot.generation != generation {
                result.ok().map(|(_, socket)| socket)
            } else {
                return match result {
                    Ok((url, socket)) => {
                        let handle = tokio::spawn(tasks::consume(
                            self.clone(),
                            socket,
                            generation,
                            token,
                        ));
                        slot.task_id = Some(handle.id());
                        slot.task = Some(handle);
                        slot.endpoint = Some(url);
                        slot.reconnecting = false;
                        self.transition(&mut slot, ChannelState::Open);
                        Ok(())
                    }
                    Err(e) => {
                        self.transition(&mut slot, ChannelState::Closed);
                        Err(e)
                    }
                };
            }
        };

        if let Some(mut socket) = orphan {
            debug!("Discarding socket opened after close()");
            if let Err(e) = socket.close().await {
                trace!("Closing orphaned socket failed: {}", e);
            }
        }
        Err(HomeyError::WebSocket(
            "event channel closed while connecting".to_string(),
        ))
    }

    /// Final step of `close()` for activation `generation`.
    fn finish_close(&self, generation: u64) {
        let mut slot = self.slot.lock();
        if slot.generation == generation {
            slot.endpoint = None;
            self.transition(&mut slot, ChannelState::Closed);
            info!("Event channel closed");
        } else {
            debug!("Event channel changed hands during close(); leaving it as is");
        }
        self.closed.notify_waiters();
    }
}

/// What a `close()` call has to do once the slot lock is released
enum CloseStep<'a> {
    Nothing,
    WaitForOther(Notified<'a>),
    Stop {
        generation: u64,
        task: Option<JoinHandle<()>>,
        token: Option<CancellationToken>,
        own_task: bool,
    },
}

/// The real-time event channel.
///
/// Cloning is cheap; clones control the same socket.
#[derive(Clone)]
pub struct EventChannel {
    inner: Arc<ChannelInner>,
}

impl std::fmt::Debug for EventChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let slot = self.inner.slot.lock();
        f.debug_struct("EventChannel")
            .field("state", &slot.state)
            .field("endpoint", &slot.endpoint)
            .field("auto_reconnect", &slot.auto_reconnect)
            .field("reconnecting", &slot.reconnecting)
            .finish()
    }
}

impl EventChannel {
    pub(crate) fn new(
        auth: Arc<AuthSession>,
        config: ChannelConfig,
        connector: Arc<dyn SocketConnector>,
        router: EventRouter,
        lifecycle: ConnectionStatus,
    ) -> Self {
        Self {
            inner: Arc::new(ChannelInner {
                auth,
                config,
                connector,
                router,
                lifecycle,
                slot: Mutex::new(Slot::default()),
                closed: Notify::new(),
            }),
        }
    }

    /// Discover an endpoint and start consuming events.
    ///
    /// Rejected without side effects while the channel is open, connecting, or
    /// a reconnection procedure is running.
    ///
    /// # Errors
    ///
    /// - [`HomeyError::AlreadyConnected`] if a socket is open, being
    ///   established, or being closed
    /// - [`HomeyError::WebSocket`] if no candidate endpoint accepted the handshake
    pub async fn open(&self, auto_reconnect: bool) -> HomeyResult<()> {
        let (generation, token) = {
            let mut slot = self.inner.slot.lock();
            if matches!(
                slot.state,
                ChannelState::Open | ChannelState::Connecting | ChannelState::Closing
            ) || slot.reconnecting
            {
                warn!(
                    "Event channel already {:?}{}; ignoring open()",
                    slot.state,
                    if slot.reconnecting { " (reconnecting)" } else { "" }
                );
                return Err(HomeyError::AlreadyConnected);
            }

            slot.generation += 1;
            slot.auto_reconnect = auto_reconnect;
            let token = CancellationToken::new();
            slot.cancel = Some(token.clone());
            slot.task = None;
            self.inner.transition(&mut slot, ChannelState::Connecting);
            (slot.generation, token)
        };

        info!("Opening event channel (auto_reconnect={})", auto_reconnect);
        self.inner.connect(generation, token).await
    }

    /// Stop the channel.
    ///
    /// Disables auto-reconnect, cancels the consumer task or reconnect
    /// supervisor, waits (bounded by `close_timeout`) for it to finish and
    /// closes the socket. No handler runs after this returns, apart from the
    /// handler that called it. Calling it on an idle or closed channel does
    /// nothing; calling it while another `close()` is running waits for that
    /// one.
    pub async fn close(&self) {
        let step = {
            let mut slot = self.inner.slot.lock();
            slot.auto_reconnect = false;

            if slot.state == ChannelState::Closing {
                if slot.on_consumer_task() {
                    trace!("close() from a handler while already closing");
                    CloseStep::Nothing
                } else {
                    CloseStep::WaitForOther(self.inner.closed.notified())
                }
            } else if matches!(slot.state, ChannelState::Open | ChannelState::Connecting)
                || slot.reconnecting
                || slot.task.as_ref().is_some_and(|t| !t.is_finished())
            {
                slot.generation += 1;
                slot.reconnecting = false;
                self.inner.transition(&mut slot, ChannelState::Closing);
                CloseStep::Stop {
                    generation: slot.generation,
                    task: slot.task.take(),
                    token: slot.cancel.take(),
                    own_task: slot.on_consumer_task(),
                }
            } else {
                trace!("close() on inactive event channel");
                CloseStep::Nothing
            }
        };

        let (generation, task, token, own_task) = match step {
            CloseStep::Nothing => return,
            CloseStep::WaitForOther(closed) => {
                debug!("close() already in progress; waiting for it");
                closed.await;
                return;
            }
            CloseStep::Stop {
                generation,
                task,
                token,
                own_task,
            } => (generation, task, token, own_task),
        };

        if let Some(token) = token {
            token.cancel();
        }

        match task {
            Some(_) if own_task => {
                debug!("close() called from the event consumer; not joining it");
            }
            Some(mut task) => {
                let bound = self.inner.config.close_timeout;
                if tokio::time::timeout(bound, &mut task).await.is_err() {
                    warn!("Event consumer did not stop within {:?}; aborting it", bound);
                    task.abort();
                    if let Err(e) = task.await {
                        trace!("Aborted event consumer: {}", e);
                    }
                }
            }
            None => {}
        }

        self.inner.finish_close(generation);
    }

    /// Cancel everything without waiting. Used when the owning client is dropped.
    pub(crate) fn shutdown_now(&self) {
        let mut slot = self.inner.slot.lock();
        slot.auto_reconnect = false;
        slot.reconnecting = false;
        slot.generation += 1;
        if let Some(token) = slot.cancel.take() {
            token.cancel();
        }
        slot.task = None;
        slot.endpoint = None;
        if slot.state != ChannelState::Idle {
            self.inner.transition(&mut slot, ChannelState::Closed);
        }
        self.inner.closed.notify_waiters();
    }

    /// Current state
    pub fn state(&self) -> ChannelState {
        self.inner.slot.lock().state
    }

    /// Whether a socket is open
    pub fn is_open(&self) -> bool {
        self.state() == ChannelState::Open
    }

    /// Whether the reconnection procedure is running
    pub fn is_reconnecting(&self) -> bool {
        self.inner.slot.lock().reconnecting
    }

    /// Socket URL chosen by discovery, while open
    pub fn endpoint(&self) -> Option<String> {
        self.inner.slot.lock().endpoint.clone()
    }
}
