//! Request/response envelope shared by every front-end.

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const ENABLE_PROXY: &str = "ENABLE_PROXY";
pub const DISABLE_PROXY: &str = "DISABLE_PROXY";
pub const TOGGLE_PROXY: &str = "TOGGLE_PROXY";
pub const CHECK_ALL_CONFIGS: &str = "CHECK_ALL_CONFIGS";
pub const GET_STATE: &str = "GET_STATE";
pub const SWITCH_CONFIG: &str = "SWITCH_CONFIG";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageRequest {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
}

impl MessageRequest {
    pub fn new(kind: impl Into<String>) -> Self {
        Self { kind: kind.into(), payload: None }
    }

    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = Some(payload);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl MessageResponse {
    pub fn ok() -> Self {
        Self { success: true, data: None, error: None }
    }

    pub fn ok_with(data: Value) -> Self {
        Self { success: true, data: Some(data), error: None }
    }

    pub fn err(error: impl Into<String>) -> Self {
        Self { success: false, data: None, error: Some(error.into()) }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwitchConfigPayload {
    pub config_id: String,
}
