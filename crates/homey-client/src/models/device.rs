//! Devices and their capabilities

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::default_true;

/// One capability of a device (`onoff`, `dim`, `measure_temperature`, ...)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceCapability {
    /// Capability id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Human-readable title
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Value type (`boolean`, `number`, `string`, `enum`)
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    /// Current value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    /// Units of measurement
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub units: Option<String>,
    /// Whether the value can be read
    #[serde(default = "default_true")]
    pub getable: bool,
    /// Whether the value can be written
    #[serde(default = "default_true")]
    pub setable: bool,
    /// Remaining fields
    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

/// A device paired with the hub
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    /// Device id
    #[serde(default)]
    pub id: String,
    /// Display name
    #[serde(default)]
    pub name: String,
    /// Zone the device lives in
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zone: Option<String>,
    /// Device class (`light`, `socket`, `thermostat`, ...)
    #[serde(rename = "class", default, skip_serializing_if = "Option::is_none")]
    pub class: Option<String>,
    /// Driver id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub driver_id: Option<String>,
    /// Capability ids
    #[serde(default)]
    pub capabilities: Vec<String>,
    /// Capability details keyed by id
    #[serde(default)]
    pub capabilities_obj: HashMap<String, DeviceCapability>,
    /// Whether the device is reachable
    #[serde(default = "default_true")]
    pub available: bool,
    /// Whether the driver finished initialising the device
    #[serde(default = "default_true")]
    pub ready: bool,
    /// Remaining fields
    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

impl Device {
    /// Available and ready
    pub fn is_online(&self) -> bool {
        self.available && self.ready
    }

    /// Check if the device lists `capability`
    pub fn has_capability(&self, capability: &str) -> bool {
        self.capabilities.iter().any(|c| c == capability)
    }

    /// Capability details, if present
    pub fn capability(&self, capability: &str) -> Option<&DeviceCapability> {
        self.capabilities_obj.get(capability)
    }

    /// Last known value of `capability`
    pub fn capability_value(&self, capability: &str) -> Option<&Value> {
        self.capability(capability).and_then(|c| c.value.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_device_from_hub_payload() {
        let device: Device = serde_json::from_value(json!({
            "id": "d1",
            "name": "Kitchen light",
            "zone": "z1",
            "class": "light",
            "driverId": "homey:virtual",
            "capabilities": ["onoff", "dim"],
            "capabilitiesObj": {
                "onoff": {"id": "onoff", "type": "boolean", "value": true},
                "dim": {"id": "dim", "type": "number", "value": 0.4, "min": 0, "max": 1}
            },
            "available": true,
            "iconObj": {"url": "/icon.svg"}
        }))
        .unwrap();

        assert_eq!(device.class.as_deref(), Some("light"));
        assert_eq!(device.driver_id.as_deref(), Some("homey:virtual"));
        assert!(device.is_online());
        assert!(device.has_capability("dim"));
        assert!(!device.has_capability("measure_power"));
        assert_eq!(device.capability_value("onoff"), Some(&json!(true)));
        assert_eq!(device.capability("dim").unwrap().extra["max"], json!(1));
        assert_eq!(device.extra["iconObj"], json!({"url": "/icon.svg"}));
    }

    #[test]
    fn test_unavailable_device_is_offline() {
        let device: Device =
            serde_json::from_value(json!({"id": "d2", "available": false})).unwrap();
        assert!(!device.is_online());
        assert!(device.capabilities.is_empty());
        assert_eq!(device.capability_value("onoff"), None);
    }
}
