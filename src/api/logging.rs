use crate::util::env_switch;
use serde_json::Value;

const DEBUG_PAYLOAD_ENV: &str = "THREADCHAT_DEBUG_PAYLOAD";

pub fn debug_payload_enabled() -> bool {
    env_switch(DEBUG_PAYLOAD_ENV).unwrap_or(false)
}

pub fn emit_debug_payload(request_url: &str, payload: &Value) {
    let formatted_payload = serde_json::to_string_pretty(payload)
        .unwrap_or_else(|_| "<payload serialization error>".to_string());
    tracing::debug!(url = %request_url, payload = %formatted_payload, "outgoing request");
}

pub fn emit_stream_parse_error(
    event_type: Option<&str>,
    json_data: &str,
    parse_error: &serde_json::Error,
) {
    tracing::warn!(
        error = %parse_error,
        event_type = event_type.unwrap_or("<none>"),
        data = %json_data,
        "dropping undecodable stream frame"
    );
}
