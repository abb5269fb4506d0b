//! Hub-wide settings: location, address, language, units

use std::sync::Arc;

use homey_transport::{ApiRequest, HomeyError, HomeyResult, RequestGateway};
use serde_json::{Value, json};
use tracing::debug;

use crate::models::SystemConfig;

const LOCATION: &str = "manager/geolocation/option/location";
const ADDRESS: &str = "manager/geolocation/option/address";
const LANGUAGE: &str = "manager/i18n/option/language";
const UNITS: &str = "manager/i18n/option/units";

/// Reads and writes hub-wide options.
#[derive(Debug, Clone)]
pub struct SystemManager {
    gateway: Arc<dyn RequestGateway>,
}

impl SystemManager {
    /// Create a manager on top of `gateway`
    pub fn new(gateway: Arc<dyn RequestGateway>) -> Self {
        Self { gateway }
    }

    /// Collect location, address, language and units.
    ///
    /// The four options are fetched concurrently; the first error aborts.
    pub async fn config(&self) -> HomeyResult<SystemConfig> {
        let (location, address, language, units) = futures::try_join!(
            self.option(LOCATION),
            self.option(ADDRESS),
            self.option(LANGUAGE),
            self.option(UNITS),
        )?;

        let location = match location {
            Value::Object(map) if !map.is_empty() => {
                Some(map.into_iter().collect())
            }
            _ => None,
        };

        Ok(SystemConfig {
            location,
            address: option_string(address, "address"),
            language: option_string(language, "language"),
            units: option_string(units, "units"),
        })
    }

    /// Set the street address
    pub async fn set_address(&self, address: &str) -> HomeyResult<()> {
        self.set_option(ADDRESS, json!({ "address": address })).await
    }

    /// Set the language code
    pub async fn set_language(&self, language: &str) -> HomeyResult<()> {
        if language.trim().is_empty() {
            return Err(HomeyError::Validation("Language cannot be empty".into()));
        }
        self.set_option(LANGUAGE, json!({ "language": language })).await
    }

    /// Set the unit system (`metric` or `imperial`)
    pub async fn set_units(&self, units: &str) -> HomeyResult<()> {
        if units.trim().is_empty() {
            return Err(HomeyError::Validation("Units cannot be empty".into()));
        }
        self.set_option(UNITS, json!({ "units": units })).await
    }

    async fn option(&self, path: &str) -> HomeyResult<Value> {
        self.gateway.request(ApiRequest::get(path)).await
    }

    async fn set_option(&self, path: &str, body: Value) -> HomeyResult<()> {
        debug!("Updating {}", path);
        self.gateway
            .request(ApiRequest::put(path).with_body(body))
            .await?;
        Ok(())
    }
}

/// Options come back as a bare string, `{"<key>": ...}` or `{"value": ...}`.
fn option_string(value: Value, key: &str) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        Value::Object(map) => map
            .get(key)
            .or_else(|| map.get("value"))
            .and_then(Value::as_str)
            .map(str::to_string),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::managers::testing::RecordingGateway;
    use homey_transport::Method;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_option_string_shapes() {
        assert_eq!(option_string(json!("nl"), "language"), Some("nl".into()));
        assert_eq!(option_string(json!({"language": "en"}), "language"), Some("en".into()));
        assert_eq!(option_string(json!({"value": "metric"}), "units"), Some("metric".into()));
        assert_eq!(option_string(json!({}), "units"), None);
        assert_eq!(option_string(json!(42), "units"), None);
    }

    #[tokio::test]
    async fn test_config_aggregates_four_options() {
        let gateway = RecordingGateway::new();
        gateway.respond(json!({"latitude": 52.1, "longitude": 5.1}));
        gateway.respond(json!({"value": "Main St 1"}));
        gateway.respond(json!("en"));
        gateway.respond(json!({"units": "metric"}));
        let manager = SystemManager::new(gateway.clone());

        let config = manager.config().await.unwrap();

        assert_eq!(config.address.as_deref(), Some("Main St 1"));
        assert_eq!(config.language.as_deref(), Some("en"));
        assert_eq!(config.units.as_deref(), Some("metric"));
        assert_eq!(config.location.unwrap()["latitude"], json!(52.1));
        let paths: Vec<String> = gateway.calls().into_iter().map(|(_, p, _)| p).collect();
        assert_eq!(paths, vec![LOCATION, ADDRESS, LANGUAGE, UNITS]);
    }

    #[tokio::test]
    async fn test_setters() {
        let gateway = RecordingGateway::new();
        let manager = SystemManager::new(gateway.clone());

        manager.set_units("imperial").await.unwrap();
        assert!(matches!(manager.set_language("").await, Err(HomeyError::Validation(_))));

        assert_eq!(
            gateway.calls(),
            vec![(Method::PUT, UNITS.to_string(), Some(json!({"units": "imperial"})))]
        );
    }
}
