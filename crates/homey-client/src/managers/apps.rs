//! Installed app management

use std::sync::Arc;

use homey_transport::{ApiRequest, HomeyResult, RequestGateway};
use serde_json::Value;
use tracing::info;

use super::base::{Collection, name_matches, parse_single, validate_id};
use crate::models::App;

const ROOT: &str = "manager/apps";

/// Apps installed on the hub.
#[derive(Debug, Clone)]
pub struct AppManager {
    apps: Collection,
}

impl AppManager {
    /// Create a manager on top of `gateway`
    pub fn new(gateway: Arc<dyn RequestGateway>) -> Self {
        Self {
            apps: Collection::new(gateway, ROOT),
        }
    }

    /// All apps
    pub async fn list(&self) -> HomeyResult<Vec<App>> {
        self.apps.list().await
    }

    /// One app by id
    pub async fn get(&self, app_id: &str) -> HomeyResult<App> {
        self.apps.get("App", app_id).await
    }

    /// Enable an app
    pub async fn enable(&self, app_id: &str) -> HomeyResult<App> {
        self.action(app_id, "enable").await
    }

    /// Disable an app
    pub async fn disable(&self, app_id: &str) -> HomeyResult<App> {
        self.action(app_id, "disable").await
    }

    /// Restart an app
    pub async fn restart(&self, app_id: &str) -> HomeyResult<App> {
        self.action(app_id, "restart").await
    }

    /// Raw settings object of an app
    pub async fn settings(&self, app_id: &str) -> HomeyResult<Value> {
        validate_id("App", app_id)?;
        self.apps
            .send(ApiRequest::get(self.apps.item_path(app_id, Some("settings"))))
            .await
    }

    /// Replace settings of an app
    pub async fn set_settings(&self, app_id: &str, settings: Value) -> HomeyResult<()> {
        validate_id("App", app_id)?;
        self.apps
            .send(ApiRequest::put(self.apps.item_path(app_id, Some("settings"))).with_body(settings))
            .await?;
        Ok(())
    }

    /// Apps that are installed, enabled and not crashed
    pub async fn running(&self) -> HomeyResult<Vec<App>> {
        let mut apps = self.list().await?;
        apps.retain(App::is_running);
        Ok(apps)
    }

    /// Apps whose name contains `query`, ignoring case
    pub async fn search(&self, query: &str) -> HomeyResult<Vec<App>> {
        let mut apps = self.list().await?;
        apps.retain(|a| name_matches(&a.name, query));
        Ok(apps)
    }

    async fn action(&self, app_id: &str, action: &str) -> HomeyResult<App> {
        validate_id("App", app_id)?;
        let response = self
            .apps
            .send(ApiRequest::post(self.apps.item_path(app_id, Some(action))))
            .await?;
        info!("App {} {}", app_id, action);
        let mut app: App = parse_single(response)?;
        if app.id.is_empty() {
            app.id = app_id.to_string();
        }
        Ok(app)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::managers::testing::RecordingGateway;
    use homey_transport::{HomeyError, Method};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[tokio::test]
    async fn test_running_apps() {
        let gateway = RecordingGateway::new();
        gateway.respond(json!([
            {"id": "a1", "name": "Weather", "installed": true},
            {"id": "a2", "name": "Crashy", "installed": true, "crashed": true},
            {"id": "a3", "name": "Off", "installed": true, "enabled": false},
            {"id": "a4", "name": "Pending"}
        ]));
        let manager = AppManager::new(gateway.clone());

        let running: Vec<String> = manager.running().await.unwrap().into_iter().map(|a| a.id).collect();
        assert_eq!(running, vec!["a1"]);
        assert_eq!(gateway.calls()[0].1, "manager/apps");
    }

    #[tokio::test]
    async fn test_restart_posts_action() {
        let gateway = RecordingGateway::new();
        gateway.respond(json!({}));
        let manager = AppManager::new(gateway.clone());

        let app = manager.restart("com.example.weather").await.unwrap();

        assert_eq!(app.id, "com.example.weather");
        assert_eq!(
            gateway.calls(),
            vec![(
                Method::POST,
                "manager/apps/com.example.weather/restart".to_string(),
                None
            )]
        );
    }

    #[tokio::test]
    async fn test_settings_round_trip() {
        let gateway = RecordingGateway::new();
        gateway.respond(json!({"interval": 10}));
        let manager = AppManager::new(gateway.clone());

        assert_eq!(manager.settings("a1").await.unwrap(), json!({"interval": 10}));
        manager.set_settings("a1", json!({"interval": 20})).await.unwrap();

        let calls = gateway.calls();
        assert_eq!(calls[1].0, Method::PUT);
        assert_eq!(calls[1].1, "manager/apps/a1/settings");
        assert_eq!(calls[1].2, Some(json!({"interval": 20})));
    }

    #[tokio::test]
    async fn test_empty_id_rejected() {
        let gateway = RecordingGateway::new();
        let manager = AppManager::new(gateway.clone());
        assert!(matches!(manager.enable("").await, Err(HomeyError::Validation(_))));
        assert!(gateway.calls().is_empty());
    }
}
