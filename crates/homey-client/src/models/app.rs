//! Installed apps

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::default_true;

/// An app installed on the hub
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct App {
    /// App id (`com.example.app`)
    #[serde(default)]
    pub id: String,
    /// Display name
    #[serde(default)]
    pub name: String,
    /// Installed version
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Where the app came from (`appstore`, `devkit_install`, ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
    /// Whether the app is enabled
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Whether installation finished
    #[serde(default)]
    pub installed: bool,
    /// Whether the app process crashed
    #[serde(default)]
    pub crashed: bool,
    /// Runtime state reported by the hub
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    /// Remaining fields
    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

impl App {
    /// Installed, enabled and not crashed
    pub fn is_running(&self) -> bool {
        self.installed && self.enabled && !self.crashed
    }
}
