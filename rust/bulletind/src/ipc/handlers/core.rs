use crate::gateway;
use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use serde_json::json;

fn handle_health(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(
        &req.id,
        json!({
            "version": env!("CARGO_PKG_VERSION"),
            "configured": state.gateway.is_configured(),
            "baseUrl": state.config.base_url,
            "today": state.config.today().to_string(),
        }),
    )
}

fn handle_session_configure(state: &mut AppState, req: &Request) -> serde_json::Value {
    if !req.params.is_object() {
        return err(&req.id, "bad_params", "params must be an object", None);
    }
    let mut next = state.config.clone();
    next.apply_params(&req.params);

    match gateway::from_config(&next) {
        Ok(g) => {
            tracing::info!(base_url = ?next.base_url, "session configured");
            state.gateway = g;
            state.config = next;
            ok(
                &req.id,
                json!({
                    "configured": state.gateway.is_configured(),
                    "baseUrl": state.config.base_url,
                }),
            )
        }
        Err(e) => err(&req.id, "gateway_init_failed", e.to_string(), None),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "health" => Some(handle_health(state, req)),
        "session.configure" => Some(handle_session_configure(state, req)),
        _ => None,
    }
}
