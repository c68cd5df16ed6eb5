use crate::gateway::GatewayError;
use crate::ui::{notify, EventSink, Level};
use crate::ipc::error::HandlerErr;
use crate::ipc::types::Request;

/// Ids come from `<select>` values, so numbers and strings are both accepted.
/// Blank values count as missing.
pub fn param_id(req: &Request, key: &str) -> Option<String> {
    let v = req.params.get(key)?;
    let s = match v {
        serde_json::Value::String(s) => s.trim().to_string(),
        serde_json::Value::Number(n) => n.to_string(),
        _ => return None,
    };
    (!s.is_empty()).then_some(s)
}

pub fn required_id(req: &Request, key: &str) -> Result<String, HandlerErr> {
    param_id(req, key).ok_or_else(|| HandlerErr::bad_params(format!("missing params.{key}")))
}

pub fn param_bool(req: &Request, key: &str) -> Option<bool> {
    req.params.get(key).and_then(|v| v.as_bool())
}

pub fn param_str<'a>(req: &'a Request, key: &str) -> Option<&'a str> {
    req.params.get(key).and_then(|v| v.as_str())
}

/// Logs a failed remote call, shows it as a toast and turns it into an error
/// response.
pub fn gateway_failure(events: &dyn EventSink, scope: &str, e: GatewayError) -> HandlerErr {
    tracing::warn!(scope, error = %e, "gateway call failed");
    notify(events, Level::Error, e.to_string());
    HandlerErr::from(e)
}
