//! Flows (automations)

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::default_true;

/// A standard flow
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Flow {
    /// Flow id
    #[serde(default)]
    pub id: String,
    /// Display name
    #[serde(default)]
    pub name: String,
    /// Whether the flow runs when triggered
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Whether a card refers to something that no longer exists
    #[serde(default)]
    pub broken: bool,
    /// Folder id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folder: Option<String>,
    /// Trigger card, kept raw
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trigger: Option<Value>,
    /// Remaining fields
    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}
