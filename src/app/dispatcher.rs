use serde_json::Value;

use crate::core::orchestrator::{Orchestrator, OrchestratorError};

use super::messages::{
    MessageRequest, MessageResponse, SwitchConfigPayload, CHECK_ALL_CONFIGS, DISABLE_PROXY,
    ENABLE_PROXY, GET_STATE, SWITCH_CONFIG, TOGGLE_PROXY,
};

/// Route one request to the matching orchestrator operation.
///
/// Never fails: every error is folded into `{success: false, error}`.
pub async fn handle_message(orch: &Orchestrator, req: MessageRequest) -> MessageResponse {
    tracing::debug!(target = "app", kind = %req.kind, "message received");
    let resp = match req.kind.as_str() {
        ENABLE_PROXY => unit(orch.enable_proxy().await),
        DISABLE_PROXY => unit(orch.disable_proxy().await),
        TOGGLE_PROXY => unit(orch.toggle_proxy().await),
        CHECK_ALL_CONFIGS => unit(orch.check_all_configs().await.map(|_| ())),
        GET_STATE => get_state(orch).await,
        SWITCH_CONFIG => match parse_switch_payload(req.payload) {
            Ok(payload) => unit(orch.switch_config(&payload.config_id).await),
            Err(msg) => MessageResponse::err(msg),
        },
        other => MessageResponse::err(format!("Unknown message type: {other}")),
    };
    if let Some(error) = &resp.error {
        tracing::info!(target = "app", kind = %req.kind, error = %error, "message failed");
    }
    resp
}

fn unit(result: Result<(), OrchestratorError>) -> MessageResponse {
    match result {
        Ok(()) => MessageResponse::ok(),
        Err(e) => MessageResponse::err(e.to_string()),
    }
}

async fn get_state(orch: &Orchestrator) -> MessageResponse {
    let state = match orch.store().snapshot().await {
        Ok(state) => state,
        Err(e) => return MessageResponse::err(e.to_string()),
    };
    match serde_json::to_value(state) {
        Ok(data) => MessageResponse::ok_with(data),
        Err(e) => MessageResponse::err(e.to_string()),
    }
}

fn parse_switch_payload(payload: Option<Value>) -> Result<SwitchConfigPayload, String> {
    let Some(payload) = payload else {
        return Err(format!("Invalid payload for {SWITCH_CONFIG}: missing payload"));
    };
    serde_json::from_value::<SwitchConfigPayload>(payload)
        .map_err(|e| format!("Invalid payload for {SWITCH_CONFIG}: {e}"))
}
