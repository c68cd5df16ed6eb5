use crate::ipc::error::{ok, HandlerErr};
use crate::ipc::helpers::{gateway_failure, param_id, required_id};
use crate::ipc::types::{AppState, Request};
use crate::ui::Loading;
use serde_json::json;

fn show(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let student_id = required_id(req, "studentId")?;
    let class_id = param_id(req, "classId")
        .or_else(|| state.roster.class_id().map(str::to_string))
        .ok_or_else(|| HandlerErr::bad_params("missing params.classId and no class selected"))?;

    state.bulletin.visible = false;
    let fetched = {
        let _loading = Loading::start(state.events.as_ref(), "bulletin");
        state.gateway.student_detail(&student_id, &class_id)
    };
    state.bulletin.visible = true;

    let resp = fetched.map_err(|e| gateway_failure(state.events.as_ref(), "bulletin", e))?;
    if let Err(e) = state.bulletin.populate(&student_id, &resp) {
        tracing::error!(student_id = %student_id, class_id = %class_id, "invalid grade data: {e}");
        return Err(HandlerErr {
            code: "empty_bulletin",
            message: "Données de notes invalides".to_string(),
            details: Some(json!({ "reason": e.to_string() })),
        });
    }
    Ok(json!({ "bulletin": state.bulletin }))
}

fn handle_show(state: &mut AppState, req: &Request) -> serde_json::Value {
    match show(state, req) {
        Ok(v) => ok(&req.id, v),
        Err(e) => e.response(&req.id),
    }
}

fn handle_view(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(&req.id, json!({ "bulletin": state.bulletin }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "bulletin.show" => Some(handle_show(state, req)),
        "bulletin.view" => Some(handle_view(state, req)),
        _ => None,
    }
}
