//! Wire format of push events: `{"type": <topic>, "data": <payload>}`

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::HomeyResult;

/// One push notification from the hub.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InboundEvent {
    /// Topic such as `device`, `zone`, `flow` or `app`
    #[serde(rename = "type")]
    pub topic: String,

    /// Event payload, forwarded to the handler untouched
    #[serde(rename = "data", default = "empty_object")]
    pub payload: Value,
}

fn empty_object() -> Value {
    Value::Object(Map::new())
}

impl InboundEvent {
    /// Create an event
    pub fn new(topic: impl Into<String>, payload: Value) -> Self {
        Self {
            topic: topic.into(),
            payload,
        }
    }

    /// Parse one text frame. Frames without a string `type` are rejected.
    ///
    /// # Errors
    ///
    /// Returns [`HomeyError::Serialization`](crate::HomeyError::Serialization) for malformed frames.
    pub fn parse(frame: &str) -> HomeyResult<Self> {
        Ok(serde_json::from_str(frame)?)
    }

    /// Encode as a text frame
    ///
    /// # Errors
    ///
    /// Returns [`HomeyError::Serialization`](crate::HomeyError::Serialization) if encoding fails.
    pub fn to_frame(&self) -> HomeyResult<String> {
        Ok(serde_json::to_string(self)?)
    }
}
