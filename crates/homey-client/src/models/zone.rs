//! Zones (rooms, floors)

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::default_true;

/// A zone; zones form a tree through `parent`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    /// Zone id
    #[serde(default)]
    pub id: String,
    /// Display name
    #[serde(default)]
    pub name: String,
    /// Parent zone id; `None` for the root
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    /// Icon name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    /// Whether presence is currently detected
    #[serde(default = "default_true")]
    pub active: bool,
    /// Remaining fields
    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

impl Zone {
    /// Has no parent
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }
}
