//! Socket abstraction and the tokio-tungstenite implementation

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt as _;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::header::{HeaderName, HeaderValue};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, trace, warn};

use crate::error::{HomeyError, HomeyResult};

/// An open real-time socket.
#[async_trait]
pub trait EventSocket: Send {
    /// Next text frame. `None` once the peer has closed the socket.
    ///
    /// Must be cancel-safe: the consumption loop drops this future on shutdown.
    async fn next_frame(&mut self) -> Option<HomeyResult<String>>;

    /// Send a close frame and release the connection.
    async fn close(&mut self) -> HomeyResult<()>;
}

/// Boxed socket handed from a connector to the event channel
pub type BoxedSocket = Box<dyn EventSocket>;

/// Opens sockets for endpoint discovery.
#[async_trait]
pub trait SocketConnector: Send + Sync + std::fmt::Debug {
    /// Perform the handshake against `url`, sending `headers`.
    async fn connect(
        &self,
        url: &str,
        headers: &HashMap<String, String>,
    ) -> HomeyResult<BoxedSocket>;
}

/// [`SocketConnector`] using tokio-tungstenite
#[derive(Debug, Clone)]
pub struct TungsteniteConnector {
    connect_timeout: Duration,
}

impl TungsteniteConnector {
    /// Create a connector with the given handshake timeout
    pub fn new(connect_timeout: Duration) -> Self {
        Self { connect_timeout }
    }
}

impl Default for TungsteniteConnector {
    fn default() -> Self {
        Self::new(Duration::from_secs(30))
    }
}

#[async_trait]
impl SocketConnector for TungsteniteConnector {
    async fn connect(
        &self,
        url: &str,
        headers: &HashMap<String, String>,
    ) -> HomeyResult<BoxedSocket> {
        let mut request = url
            .into_client_request()
            .map_err(|e| HomeyError::WebSocket(format!("Invalid socket URL {}: {}", url, e)))?;

        for (name, value) in headers {
            match (
                HeaderName::from_bytes(name.as_bytes()),
                HeaderValue::from_str(value),
            ) {
                (Ok(name), Ok(value)) => {
                    request.headers_mut().insert(name, value);
                }
                _ => warn!("Skipping invalid handshake header {}", name),
            }
        }

        let (stream, response) = tokio::time::timeout(self.connect_timeout, connect_async(request))
            .await
            .map_err(|_| {
                HomeyError::WebSocket(format!(
                    "Handshake with {} timed out after {:?}",
                    url, self.connect_timeout
                ))
            })?
            .map_err(|e| handshake_error(url, e))?;

        debug!("Handshake with {} completed ({})", url, response.status());
        Ok(Box::new(TungsteniteSocket { stream }))
    }
}

fn handshake_error(url: &str, err: tokio_tungstenite::tungstenite::Error) -> HomeyError {
    use tokio_tungstenite::tungstenite::Error;

    match err {
        Error::Http(response) => {
            let status = response.status().as_u16();
            match status {
                401 | 403 => HomeyError::WebSocket(format!(
                    "Handshake with {} rejected the token ({})",
                    url, status
                )),
                _ => HomeyError::WebSocket(format!(
                    "Handshake with {} failed with status {}",
                    url, status
                )),
            }
        }
        other => HomeyError::WebSocket(format!("Handshake with {} failed: {}", url, other)),
    }
}

/// Socket backed by a tungstenite stream
pub struct TungsteniteSocket {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

#[async_trait]
impl EventSocket for TungsteniteSocket {
    async fn next_frame(&mut self) -> Option<HomeyResult<String>> {
        loop {
            match self.stream.next().await? {
                Ok(Message::Text(text)) => return Some(Ok(text.as_str().to_owned())),
                Ok(Message::Binary(data)) => match String::from_utf8(data.to_vec()) {
                    Ok(text) => return Some(Ok(text)),
                    Err(_) => debug!("Ignoring non UTF-8 binary frame ({} bytes)", data.len()),
                },
                Ok(Message::Close(frame)) => {
                    debug!("Socket closed by peer: {:?}", frame);
                    return None;
                }
                Ok(Message::Ping(_) | Message::Pong(_) | Message::Frame(_)) => {
                    trace!("Control frame");
                }
                Err(e) => {
                    return Some(Err(HomeyError::WebSocket(format!("Receive failed: {}", e))));
                }
            }
        }
    }

    async fn close(&mut self) -> HomeyResult<()> {
        match self.stream.close(None).await {
            Ok(()) => Ok(()),
            Err(tokio_tungstenite::tungstenite::Error::ConnectionClosed) => Ok(()),
            Err(e) => Err(HomeyError::WebSocket(format!("Close failed: {}", e))),
        }
    }
}
