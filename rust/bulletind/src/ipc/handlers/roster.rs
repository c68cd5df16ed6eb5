use crate::ipc::error::{err, ok, HandlerErr};
use crate::ipc::helpers::{gateway_failure, param_bool, param_str, required_id};
use crate::ipc::types::{AppState, Request};
use crate::ui::{notify, Level, Loading};
use serde_json::json;

const EMPTY_CLASS: &str = "Aucun élève trouvé dans cette classe";
const EMPTY_SELECTION: &str = "Veuillez sélectionner au moins un élève";

fn roster_view(state: &AppState) -> serde_json::Value {
    json!({ "roster": state.roster.view() })
}

fn select_class(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let class_id = required_id(req, "classId")?;

    let fetched = {
        let _loading = Loading::start(state.events.as_ref(), "roster");
        state.gateway.students_by_class(&class_id)
    };
    let roster = match fetched {
        Ok(r) => r,
        Err(e) => {
            // The new class is selected either way; never keep the previous
            // class's students (or selection) on screen.
            state.roster.replace(&class_id, Vec::new());
            return Err(gateway_failure(state.events.as_ref(), "roster", e));
        }
    };

    tracing::debug!(
        class_id = %class_id,
        count = roster.eleves.len(),
        server_count = ?roster.count,
        "roster loaded"
    );
    state.roster.replace(&class_id, roster.eleves);
    if state.roster.is_empty() {
        notify(state.events.as_ref(), Level::Error, EMPTY_CLASS);
    }
    Ok(roster_view(state))
}

fn handle_select_class(state: &mut AppState, req: &Request) -> serde_json::Value {
    match select_class(state, req) {
        Ok(v) => ok(&req.id, v),
        Err(e) => e.response(&req.id),
    }
}

fn handle_toggle(state: &mut AppState, req: &Request) -> serde_json::Value {
    let student_id = match required_id(req, "studentId") {
        Ok(v) => v,
        Err(e) => return e.response(&req.id),
    };
    let checked = param_bool(req, "checked");
    match state.roster.toggle(&student_id, checked) {
        Some(_) => ok(&req.id, roster_view(state)),
        None => err(
            &req.id,
            "not_found",
            "student not in current roster",
            Some(json!({ "studentId": student_id })),
        ),
    }
}

fn handle_select_all(state: &mut AppState, req: &Request) -> serde_json::Value {
    state.roster.select_all();
    ok(&req.id, roster_view(state))
}

fn handle_deselect_all(state: &mut AppState, req: &Request) -> serde_json::Value {
    state.roster.clear_selection();
    ok(&req.id, roster_view(state))
}

fn handle_filter(state: &mut AppState, req: &Request) -> serde_json::Value {
    state.roster.set_filter(param_str(req, "text").unwrap_or(""));
    ok(&req.id, roster_view(state))
}

fn handle_view(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(&req.id, roster_view(state))
}

fn generate(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let ids = state.roster.selected_ids();
    if ids.is_empty() {
        notify(state.events.as_ref(), Level::Error, EMPTY_SELECTION);
        return Ok(json!({
            "status": "blocked",
            "message": EMPTY_SELECTION,
            "roster": state.roster.view(),
        }));
    }
    let Some(class_id) = state.roster.class_id().map(str::to_string) else {
        return Err(HandlerErr::bad_params("no class selected"));
    };

    if param_bool(req, "confirmed") != Some(true) {
        return Ok(json!({
            "status": "confirm",
            "prompt": format!("Générer {} bulletin(s) ?", ids.len()),
            "count": ids.len(),
        }));
    }

    state.roster.set_generating(true);
    let result = {
        let _loading = Loading::start(state.events.as_ref(), "generate");
        state.gateway.generate_bulletins(&ids, &class_id)
    };
    state.roster.set_generating(false);

    match result {
        Ok(count) => {
            tracing::info!(class_id = %class_id, requested = ids.len(), count, "bulletins generated");
            state.roster.clear_selection();
            notify(
                state.events.as_ref(),
                Level::Success,
                format!("{count} bulletin(s) générés avec succès !"),
            );
            Ok(json!({
                "status": "generated",
                "count": count,
                "roster": state.roster.view(),
            }))
        }
        Err(e) => Err(gateway_failure(state.events.as_ref(), "generate", e)),
    }
}

fn handle_generate(state: &mut AppState, req: &Request) -> serde_json::Value {
    match generate(state, req) {
        Ok(v) => ok(&req.id, v),
        Err(e) => e.response(&req.id),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "roster.selectClass" => Some(handle_select_class(state, req)),
        "roster.toggle" => Some(handle_toggle(state, req)),
        "roster.selectAll" => Some(handle_select_all(state, req)),
        "roster.deselectAll" => Some(handle_deselect_all(state, req)),
        "roster.filter" => Some(handle_filter(state, req)),
        "roster.view" => Some(handle_view(state, req)),
        "roster.generate" => Some(handle_generate(state, req)),
        _ => None,
    }
}
