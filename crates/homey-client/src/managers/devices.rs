//! Device listing, filtering and capability control

use std::sync::Arc;

use homey_transport::{ApiRequest, HomeyError, HomeyResult, RequestGateway};
use serde_json::{Value, json};
use tracing::debug;

use super::base::{Collection, name_matches, validate_id};
use crate::models::Device;

const ROOT: &str = "manager/devices/device";

/// Devices paired with the hub.
#[derive(Debug, Clone)]
pub struct DeviceManager {
    devices: Collection,
}

impl DeviceManager {
    /// Create a manager on top of `gateway`
    pub fn new(gateway: Arc<dyn RequestGateway>) -> Self {
        Self {
            devices: Collection::new(gateway, ROOT),
        }
    }

    /// All devices
    pub async fn list(&self) -> HomeyResult<Vec<Device>> {
        self.devices.list().await
    }

    /// One device by id
    pub async fn get(&self, device_id: &str) -> HomeyResult<Device> {
        self.devices.get("Device", device_id).await
    }

    /// Current value of one capability; `None` when the hub reports no value
    pub async fn capability_value(
        &self,
        device_id: &str,
        capability: &str,
    ) -> HomeyResult<Option<Value>> {
        validate_id("Device", device_id)?;
        validate_id("Capability", capability)?;
        let response = self
            .devices
            .send(ApiRequest::get(self.capability_path(device_id, capability)))
            .await?;
        Ok(response.get("value").filter(|v| !v.is_null()).cloned())
    }

    /// Write one capability value
    pub async fn set_capability_value(
        &self,
        device_id: &str,
        capability: &str,
        value: impl Into<Value>,
    ) -> HomeyResult<()> {
        validate_id("Device", device_id)?;
        validate_id("Capability", capability)?;
        let value = value.into();
        debug!("Setting {} on device {} to {}", capability, device_id, value);
        self.devices
            .send(
                ApiRequest::put(self.capability_path(device_id, capability))
                    .with_body(json!({ "value": value })),
            )
            .await?;
        Ok(())
    }

    /// Set `onoff` to true
    pub async fn turn_on(&self, device_id: &str) -> HomeyResult<()> {
        self.set_capability_value(device_id, "onoff", true).await
    }

    /// Set `onoff` to false
    pub async fn turn_off(&self, device_id: &str) -> HomeyResult<()> {
        self.set_capability_value(device_id, "onoff", false).await
    }

    /// Flip `onoff`, returning the new value
    pub async fn toggle(&self, device_id: &str) -> HomeyResult<bool> {
        let current = self
            .capability_value(device_id, "onoff")
            .await?
            .and_then(|v| v.as_bool())
            .ok_or_else(|| {
                HomeyError::Validation(format!("Device {device_id} has no onoff value"))
            })?;
        self.set_capability_value(device_id, "onoff", !current)
            .await?;
        Ok(!current)
    }

    /// Set `dim`; `level` must be within 0.0..=1.0
    pub async fn set_dim_level(&self, device_id: &str, level: f64) -> HomeyResult<()> {
        if !(0.0..=1.0).contains(&level) {
            return Err(HomeyError::Validation(format!(
                "Dim level must be between 0.0 and 1.0, got {level}"
            )));
        }
        self.set_capability_value(device_id, "dim", level).await
    }

    /// Set `target_temperature`
    pub async fn set_target_temperature(&self, device_id: &str, temperature: f64) -> HomeyResult<()> {
        self.set_capability_value(device_id, "target_temperature", temperature)
            .await
    }

    /// Devices in `zone_id`
    pub async fn by_zone(&self, zone_id: &str) -> HomeyResult<Vec<Device>> {
        validate_id("Zone", zone_id)?;
        self.filtered(|d| d.zone.as_deref() == Some(zone_id)).await
    }

    /// Devices of `class` (`light`, `socket`, ...)
    pub async fn by_class(&self, class: &str) -> HomeyResult<Vec<Device>> {
        self.filtered(|d| d.class.as_deref() == Some(class)).await
    }

    /// Devices exposing `capability`
    pub async fn by_capability(&self, capability: &str) -> HomeyResult<Vec<Device>> {
        self.filtered(|d| d.has_capability(capability)).await
    }

    /// Devices that are available and ready
    pub async fn online(&self) -> HomeyResult<Vec<Device>> {
        self.filtered(Device::is_online).await
    }

    /// Devices whose name contains `query`, ignoring case
    pub async fn search(&self, query: &str) -> HomeyResult<Vec<Device>> {
        self.filtered(|d| name_matches(&d.name, query)).await
    }

    async fn filtered(&self, keep: impl Fn(&Device) -> bool) -> HomeyResult<Vec<Device>> {
        let mut devices = self.list().await?;
        devices.retain(|d| keep(d));
        Ok(devices)
    }

    fn capability_path(&self, device_id: &str, capability: &str) -> String {
        self.devices
            .item_path(device_id, Some(format!("capability/{capability}").as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::managers::testing::RecordingGateway;
    use homey_transport::Method;
    use pretty_assertions::assert_eq;

    fn devices_payload() -> Value {
        json!({
            "d1": {"id": "d1", "name": "Kitchen Light", "zone": "z1", "class": "light",
                   "capabilities": ["onoff", "dim"]},
            "d2": {"id": "d2", "name": "Hall Sensor", "zone": "z2", "class": "sensor",
                   "capabilities": ["measure_temperature"], "available": false},
            "d3": {"id": "d3", "name": "Desk lamp", "zone": "z1", "class": "light",
                   "capabilities": ["onoff"]}
        })
    }

    fn ids(devices: &[Device]) -> Vec<&str> {
        devices.iter().map(|d| d.id.as_str()).collect()
    }

    #[tokio::test]
    async fn test_filters() {
        let gateway = RecordingGateway::new();
        for _ in 0..5 {
            gateway.respond(devices_payload());
        }
        let manager = DeviceManager::new(gateway.clone());

        assert_eq!(ids(&manager.by_zone("z1").await.unwrap()), vec!["d1", "d3"]);
        assert_eq!(ids(&manager.by_class("sensor").await.unwrap()), vec!["d2"]);
        assert_eq!(ids(&manager.by_capability("dim").await.unwrap()), vec!["d1"]);
        assert_eq!(ids(&manager.online().await.unwrap()), vec!["d1", "d3"]);
        assert_eq!(ids(&manager.search("LIGHT").await.unwrap()), vec!["d1"]);
        assert!(gateway.calls().iter().all(|(m, p, _)| *m == Method::GET && p == ROOT));
    }

    #[tokio::test]
    async fn test_set_capability_value_body() {
        let gateway = RecordingGateway::new();
        let manager = DeviceManager::new(gateway.clone());

        manager.turn_on("d1").await.unwrap();
        manager.set_dim_level("d1", 0.5).await.unwrap();

        assert_eq!(
            gateway.calls(),
            vec![
                (
                    Method::PUT,
                    "manager/devices/device/d1/capability/onoff".to_string(),
                    Some(json!({"value": true}))
                ),
                (
                    Method::PUT,
                    "manager/devices/device/d1/capability/dim".to_string(),
                    Some(json!({"value": 0.5}))
                ),
            ]
        );
    }

    #[tokio::test]
    async fn test_toggle_flips_current_value() {
        let gateway = RecordingGateway::new();
        gateway.respond(json!({"value": true}));
        let manager = DeviceManager::new(gateway.clone());

        assert!(!manager.toggle("d1").await.unwrap());
        let calls = gateway.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[1].2, Some(json!({"value": false})));
    }

    #[tokio::test]
    async fn test_toggle_without_onoff_value() {
        let gateway = RecordingGateway::new();
        gateway.respond(json!({"value": null}));
        let manager = DeviceManager::new(gateway.clone());

        let err = manager.toggle("d1").await.unwrap_err();
        assert!(matches!(err, HomeyError::Validation(_)));
        assert_eq!(gateway.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_validation_happens_before_requests() {
        let gateway = RecordingGateway::new();
        let manager = DeviceManager::new(gateway.clone());

        assert!(matches!(manager.get("").await, Err(HomeyError::Validation(_))));
        assert!(matches!(
            manager.set_dim_level("d1", 1.5).await,
            Err(HomeyError::Validation(_))
        ));
        assert!(matches!(
            manager.capability_value("d1", "").await,
            Err(HomeyError::Validation(_))
        ));
        assert!(gateway.calls().is_empty());
    }

    #[tokio::test]
    async fn test_errors_propagate_unchanged() {
        let gateway = RecordingGateway::new();
        gateway.fail(HomeyError::NotFound("manager/devices/device/nope".into()));
        let manager = DeviceManager::new(gateway);

        assert!(matches!(manager.get("nope").await, Err(HomeyError::NotFound(_))));
    }
}
