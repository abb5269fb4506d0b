//! Flow control

use std::sync::Arc;

use homey_transport::{ApiRequest, HomeyResult, RequestGateway};
use serde_json::{Map, Value, json};
use tracing::info;

use super::base::{Collection, name_matches, parse_single, validate_id};
use crate::models::Flow;

const ROOT: &str = "manager/flow/flow";

/// Standard flows.
#[derive(Debug, Clone)]
pub struct FlowManager {
    flows: Collection,
}

impl FlowManager {
    /// Create a manager on top of `gateway`
    pub fn new(gateway: Arc<dyn RequestGateway>) -> Self {
        Self {
            flows: Collection::new(gateway, ROOT),
        }
    }

    /// All flows
    pub async fn list(&self) -> HomeyResult<Vec<Flow>> {
        self.flows.list().await
    }

    /// One flow by id
    pub async fn get(&self, flow_id: &str) -> HomeyResult<Flow> {
        self.flows.get("Flow", flow_id).await
    }

    /// Enable a flow
    pub async fn enable(&self, flow_id: &str) -> HomeyResult<Flow> {
        self.set_enabled(flow_id, true).await
    }

    /// Disable a flow
    pub async fn disable(&self, flow_id: &str) -> HomeyResult<Flow> {
        self.set_enabled(flow_id, false).await
    }

    /// Run a flow now, optionally passing trigger tokens
    pub async fn trigger(&self, flow_id: &str, tokens: Option<Value>) -> HomeyResult<()> {
        validate_id("Flow", flow_id)?;
        let mut body = Map::new();
        if let Some(tokens) = tokens {
            body.insert("tokens".into(), tokens);
        }
        self.flows
            .send(
                ApiRequest::post(self.flows.item_path(flow_id, Some("trigger")))
                    .with_body(Value::Object(body)),
            )
            .await?;
        info!("Triggered flow {}", flow_id);
        Ok(())
    }

    /// Remove a flow
    pub async fn delete(&self, flow_id: &str) -> HomeyResult<()> {
        validate_id("Flow", flow_id)?;
        self.flows
            .send(ApiRequest::delete(self.flows.item_path(flow_id, None)))
            .await?;
        Ok(())
    }

    /// Flows that are enabled
    pub async fn enabled(&self) -> HomeyResult<Vec<Flow>> {
        let mut flows = self.list().await?;
        flows.retain(|f| f.enabled);
        Ok(flows)
    }

    /// Flows with a broken card
    pub async fn broken(&self) -> HomeyResult<Vec<Flow>> {
        let mut flows = self.list().await?;
        flows.retain(|f| f.broken);
        Ok(flows)
    }

    /// Flows whose name contains `query`, ignoring case
    pub async fn search(&self, query: &str) -> HomeyResult<Vec<Flow>> {
        let mut flows = self.list().await?;
        flows.retain(|f| name_matches(&f.name, query));
        Ok(flows)
    }

    async fn set_enabled(&self, flow_id: &str, enabled: bool) -> HomeyResult<Flow> {
        validate_id("Flow", flow_id)?;
        let response = self
            .flows
            .send(
                ApiRequest::put(self.flows.item_path(flow_id, None))
                    .with_body(json!({ "enabled": enabled })),
            )
            .await?;
        let mut flow: Flow = parse_single(response)?;
        if flow.id.is_empty() {
            flow.id = flow_id.to_string();
        }
        Ok(flow)
    }
}
