//! Shared plumbing for resource managers

use std::fmt;
use std::sync::Arc;

use homey_transport::{ApiRequest, HomeyError, HomeyResult, RequestGateway};
use serde::de::DeserializeOwned;
use serde_json::Value;

/// A REST collection rooted at one path, e.g. `manager/zones/zone`.
#[derive(Clone)]
pub(crate) struct Collection {
    gateway: Arc<dyn RequestGateway>,
    root: &'static str,
}

impl fmt::Debug for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collection").field("root", &self.root).finish()
    }
}

impl Collection {
    pub(crate) fn new(gateway: Arc<dyn RequestGateway>, root: &'static str) -> Self {
        Self { gateway, root }
    }

    /// `{root}/{id}` or `{root}/{id}/{suffix}`
    pub(crate) fn item_path(&self, id: &str, suffix: Option<&str>) -> String {
        match suffix {
            Some(suffix) => format!("{}/{}/{}", self.root, id, suffix),
            None => format!("{}/{}", self.root, id),
        }
    }

    pub(crate) async fn list<T: DeserializeOwned>(&self) -> HomeyResult<Vec<T>> {
        let value = self.gateway.request(ApiRequest::get(self.root)).await?;
        parse_list(value)
    }

    pub(crate) async fn get<T: DeserializeOwned>(&self, kind: &str, id: &str) -> HomeyResult<T> {
        validate_id(kind, id)?;
        let value = self
            .gateway
            .request(ApiRequest::get(self.item_path(id, None)))
            .await?;
        parse_single(value)
    }

    pub(crate) async fn send(&self, request: ApiRequest) -> HomeyResult<Value> {
        self.gateway.request(request).await
    }
}

/// Reject empty or blank ids before anything goes on the wire
pub(crate) fn validate_id(kind: &str, id: &str) -> HomeyResult<()> {
    if id.trim().is_empty() {
        return Err(HomeyError::Validation(format!("{kind} id cannot be empty")));
    }
    Ok(())
}

fn unwrap_result(value: Value) -> Value {
    match value {
        Value::Object(mut map) if map.len() == 1 && map.contains_key("result") => {
            map.remove("result").unwrap_or(Value::Null)
        }
        other => other,
    }
}

/// Accepts an array, an id-keyed object, or either wrapped in `{"result": ...}`.
pub(crate) fn parse_list<T: DeserializeOwned>(value: Value) -> HomeyResult<Vec<T>> {
    match unwrap_result(value) {
        Value::Array(items) => items
            .into_iter()
            .map(|item| serde_json::from_value(item).map_err(HomeyError::from))
            .collect(),
        Value::Object(map) => map
            .into_iter()
            .map(|(_, item)| serde_json::from_value(item).map_err(HomeyError::from))
            .collect(),
        Value::Null => Ok(Vec::new()),
        other => Err(HomeyError::Serialization(format!(
            "expected a list of resources, got {other}"
        ))),
    }
}

pub(crate) fn parse_single<T: DeserializeOwned>(value: Value) -> HomeyResult<T> {
    Ok(serde_json::from_value(unwrap_result(value))?)
}

/// Case-insensitive substring match used by the `search` helpers
pub(crate) fn name_matches(name: &str, query: &str) -> bool {
    name.to_lowercase().contains(&query.to_lowercase())
}
