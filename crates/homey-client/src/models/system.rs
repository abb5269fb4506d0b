//! Hub-wide settings

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Location, address, language and unit system of the hub.
///
/// Assembled from the geolocation and i18n managers; any of them may be
/// missing on older firmware.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SystemConfig {
    /// Coordinates as reported by the hub
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<HashMap<String, Value>>,
    /// Street address
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    /// Language code (`en`, `nl`, ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    /// `metric` or `imperial`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub units: Option<String>,
}
