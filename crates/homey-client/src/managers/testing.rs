//! In-memory gateway for manager tests

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use homey_transport::{ApiRequest, HomeyResult, Method, RequestGateway};
use parking_lot::Mutex;
use serde_json::{Value, json};

/// Replays queued responses in order and records every request.
/// Once the queue is empty it answers `{}`.
#[derive(Debug, Default)]
pub(crate) struct RecordingGateway {
    responses: Mutex<VecDeque<HomeyResult<Value>>>,
    requests: Mutex<Vec<ApiRequest>>,
}

impl RecordingGateway {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn respond(&self, value: Value) {
        self.responses.lock().push_back(Ok(value));
    }

    pub(crate) fn fail(&self, err: homey_transport::HomeyError) {
        self.responses.lock().push_back(Err(err));
    }

    /// (method, path, body) of every request so far
    pub(crate) fn calls(&self) -> Vec<(Method, String, Option<Value>)> {
        self.requests
            .lock()
            .iter()
            .map(|r| (r.method.clone(), r.path.clone(), r.body.clone()))
            .collect()
    }
}

#[async_trait]
impl RequestGateway for RecordingGateway {
    async fn request(&self, request: ApiRequest) -> HomeyResult<Value> {
        self.requests.lock().push(request);
        self.responses
            .lock()
            .pop_front()
            .unwrap_or_else(|| Ok(json!({})))
    }
}
