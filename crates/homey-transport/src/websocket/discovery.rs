//! Ordered endpoint discovery for the event channel

use std::collections::HashMap;

use tracing::{debug, info};

use super::socket::{BoxedSocket, SocketConnector};
use crate::endpoint::discovery_candidates;
use crate::error::{HomeyError, HomeyResult};

/// Try each candidate path in order; the first successful handshake wins.
///
/// Returns the winning URL together with the open socket.
///
/// # Errors
///
/// - [`HomeyError::Validation`] if the base URL cannot be upgraded to ws/wss
/// - [`HomeyError::WebSocket`] ("no valid endpoint found") when every candidate fails
pub async fn discover(
    connector: &dyn SocketConnector,
    base_url: &str,
    paths: &[String],
    headers: &HashMap<String, String>,
) -> HomeyResult<(String, BoxedSocket)> {
    let candidates = discovery_candidates(base_url, paths)?;

    for url in candidates {
        debug!("Trying event endpoint {}", url);
        match connector.connect(&url, headers).await {
            Ok(socket) => {
                info!("Event channel connected via {}", url);
                return Ok((url, socket));
            }
            Err(e) => debug!("Event endpoint {} failed: {}", url, e),
        }
    }

    Err(HomeyError::WebSocket("no valid endpoint found".to_string()))
}
