//! Zone tree management

use std::sync::Arc;

use homey_transport::{ApiRequest, HomeyError, HomeyResult, RequestGateway};
use serde_json::{Map, Value, json};

use super::base::{Collection, name_matches, parse_single, validate_id};
use crate::models::Zone;

const ROOT: &str = "manager/zones/zone";

/// Zones (rooms, floors) configured on the hub.
#[derive(Debug, Clone)]
pub struct ZoneManager {
    zones: Collection,
}

impl ZoneManager {
    /// Create a manager on top of `gateway`
    pub fn new(gateway: Arc<dyn RequestGateway>) -> Self {
        Self {
            zones: Collection::new(gateway, ROOT),
        }
    }

    /// All zones
    pub async fn list(&self) -> HomeyResult<Vec<Zone>> {
        self.zones.list().await
    }

    /// One zone by id
    pub async fn get(&self, zone_id: &str) -> HomeyResult<Zone> {
        self.zones.get("Zone", zone_id).await
    }

    /// Create a zone under `parent` (or at the top level)
    pub async fn create(&self, name: &str, parent: Option<&str>) -> HomeyResult<Zone> {
        let name = valid_name(name)?;
        let mut body = Map::new();
        body.insert("name".into(), json!(name));
        if let Some(parent) = parent {
            validate_id("Parent zone", parent)?;
            body.insert("parent".into(), json!(parent));
        }
        let response = self
            .zones
            .send(ApiRequest::post(ROOT).with_body(Value::Object(body)))
            .await?;
        parse_single(response)
    }

    /// Change the display name
    pub async fn rename(&self, zone_id: &str, name: &str) -> HomeyResult<Zone> {
        let name = valid_name(name)?;
        self.update(zone_id, json!({ "name": name })).await
    }

    /// Remove a zone
    pub async fn delete(&self, zone_id: &str) -> HomeyResult<()> {
        validate_id("Zone", zone_id)?;
        self.zones
            .send(ApiRequest::delete(self.zones.item_path(zone_id, None)))
            .await?;
        Ok(())
    }

    /// Mark a zone active or inactive
    pub async fn set_active(&self, zone_id: &str, active: bool) -> HomeyResult<Zone> {
        self.update(zone_id, json!({ "active": active })).await
    }

    /// Zones without a parent
    pub async fn roots(&self) -> HomeyResult<Vec<Zone>> {
        let mut zones = self.list().await?;
        zones.retain(Zone::is_root);
        Ok(zones)
    }

    /// Direct children of `parent_id`
    pub async fn children(&self, parent_id: &str) -> HomeyResult<Vec<Zone>> {
        validate_id("Zone", parent_id)?;
        let mut zones = self.list().await?;
        zones.retain(|z| z.parent.as_deref() == Some(parent_id));
        Ok(zones)
    }

    /// Zones whose name contains `query`, ignoring case
    pub async fn search(&self, query: &str) -> HomeyResult<Vec<Zone>> {
        let mut zones = self.list().await?;
        zones.retain(|z| name_matches(&z.name, query));
        Ok(zones)
    }

    async fn update(&self, zone_id: &str, body: Value) -> HomeyResult<Zone> {
        validate_id("Zone", zone_id)?;
        let response = self
            .zones
            .send(ApiRequest::put(self.zones.item_path(zone_id, None)).with_body(body))
            .await?;
        let mut zone: Zone = parse_single(response)?;
        if zone.id.is_empty() {
            zone.id = zone_id.to_string();
        }
        Ok(zone)
    }
}

fn valid_name(name: &str) -> HomeyResult<&str> {
    let name = name.trim();
    if name.is_empty() {
        return Err(HomeyError::Validation("Zone name cannot be empty".into()));
    }
    Ok(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::managers::testing::RecordingGateway;
    use homey_transport::Method;
    use pretty_assertions::assert_eq;

    fn zones_payload() -> Value {
        json!([
            {"id": "home", "name": "Home"},
            {"id": "ground", "name": "Ground floor", "parent": "home"},
            {"id": "kitchen", "name": "Kitchen", "parent": "ground"},
            {"id": "garden", "name": "Garden", "parent": "home", "active": false}
        ])
    }

    fn names(zones: &[Zone]) -> Vec<&str> {
        zones.iter().map(|z| z.name.as_str()).collect()
    }

    #[tokio::test]
    async fn test_tree_helpers() {
        let gateway = RecordingGateway::new();
        for _ in 0..3 {
            gateway.respond(zones_payload());
        }
        let manager = ZoneManager::new(gateway);

        assert_eq!(names(&manager.roots().await.unwrap()), vec!["Home"]);
        assert_eq!(
            names(&manager.children("home").await.unwrap()),
            vec!["Ground floor", "Garden"]
        );
        assert_eq!(names(&manager.search("floor").await.unwrap()), vec!["Ground floor"]);
    }

    #[tokio::test]
    async fn test_create_sends_trimmed_name_and_parent() {
        let gateway = RecordingGateway::new();
        gateway.respond(json!({"id": "attic", "name": "Attic", "parent": "home"}));
        let manager = ZoneManager::new(gateway.clone());

        let zone = manager.create("  Attic ", Some("home")).await.unwrap();

        assert_eq!(zone.id, "attic");
        assert_eq!(
            gateway.calls(),
            vec![(
                Method::POST,
                ROOT.to_string(),
                Some(json!({"name": "Attic", "parent": "home"}))
            )]
        );
    }

    #[tokio::test]
    async fn test_rename_fills_missing_id() {
        let gateway = RecordingGateway::new();
        gateway.respond(json!({"name": "Study"}));
        let manager = ZoneManager::new(gateway.clone());

        let zone = manager.rename("z9", "Study").await.unwrap();

        assert_eq!(zone.id, "z9");
        assert_eq!(gateway.calls()[0].1, "manager/zones/zone/z9");
        assert_eq!(gateway.calls()[0].0, Method::PUT);
    }

    #[tokio::test]
    async fn test_blank_name_rejected() {
        let gateway = RecordingGateway::new();
        let manager = ZoneManager::new(gateway.clone());

        assert!(matches!(
            manager.create("   ", None).await,
            Err(HomeyError::Validation(_))
        ));
        assert!(matches!(manager.delete("").await, Err(HomeyError::Validation(_))));
        assert!(gateway.calls().is_empty());
    }
}
