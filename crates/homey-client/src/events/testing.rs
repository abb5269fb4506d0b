//! In-memory socket connector for channel tests

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use homey_transport::{BoxedSocket, EventSocket, HomeyError, HomeyResult, SocketConnector};
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::time::Instant;

/// What the connector does for the next handshake
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Step {
    /// Open a socket fed through a [`Feed`]
    Accept,
    /// Open a socket that is already closed by the peer
    AcceptThenClose,
    /// Fail the handshake
    Refuse,
}

/// Pushes frames into an accepted socket
#[derive(Debug, Clone)]
pub(crate) struct Feed {
    tx: mpsc::UnboundedSender<String>,
    closed: Arc<AtomicBool>,
}

impl Feed {
    pub(crate) fn text(&self, frame: String) {
        let _ = self.tx.send(frame);
    }

    /// Whether the client closed the socket
    pub(crate) fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

struct ScriptedSocket {
    rx: mpsc::UnboundedReceiver<String>,
    closed: Arc<AtomicBool>,
}

#[async_trait]
impl EventSocket for ScriptedSocket {
    async fn next_frame(&mut self) -> Option<HomeyResult<String>> {
        self.rx.recv().await.map(Ok)
    }

    async fn close(&mut self) -> HomeyResult<()> {
        self.closed.store(true, Ordering::SeqCst);
        self.rx.close();
        Ok(())
    }
}

/// Follows a script of [`Step`]s; refuses once the script runs out.
#[derive(Debug, Default)]
pub(crate) struct ScriptedConnector {
    steps: Mutex<VecDeque<Step>>,
    attempts: Mutex<Vec<(String, Instant)>>,
    headers: Mutex<HashMap<String, String>>,
    feeds: Mutex<Vec<Feed>>,
}

impl ScriptedConnector {
    pub(crate) fn new(steps: Vec<Step>) -> Arc<Self> {
        Arc::new(Self {
            steps: Mutex::new(steps.into()),
            ..Self::default()
        })
    }

    pub(crate) fn attempts(&self) -> usize {
        self.attempts.lock().len()
    }

    pub(crate) fn urls(&self) -> Vec<String> {
        self.attempts.lock().iter().map(|(u, _)| u.clone()).collect()
    }

    pub(crate) fn attempt_times(&self) -> Vec<Instant> {
        self.attempts.lock().iter().map(|(_, t)| *t).collect()
    }

    pub(crate) fn last_headers(&self) -> HashMap<String, String> {
        self.headers.lock().clone()
    }

    /// Feed of the `index`-th socket opened with [`Step::Accept`]
    pub(crate) fn feed(&self, index: usize) -> Feed {
        self.feeds.lock()[index].clone()
    }
}

#[async_trait]
impl SocketConnector for ScriptedConnector {
    async fn connect(
        &self,
        url: &str,
        headers: &HashMap<String, String>,
    ) -> HomeyResult<BoxedSocket> {
        self.attempts.lock().push((url.to_string(), Instant::now()));
        *self.headers.lock() = headers.clone();

        let step = self.steps.lock().pop_front().unwrap_or(Step::Refuse);
        let (tx, rx) = mpsc::unbounded_channel();
        let closed = Arc::new(AtomicBool::new(false));
        match step {
            Step::Refuse => Err(HomeyError::WebSocket(format!("{} refused", url))),
            Step::AcceptThenClose => {
                drop(tx);
                Ok(Box::new(ScriptedSocket { rx, closed }))
            }
            Step::Accept => {
                self.feeds.lock().push(Feed {
                    tx,
                    closed: closed.clone(),
                });
                Ok(Box::new(ScriptedSocket { rx, closed }))
            }
        }
    }
}
