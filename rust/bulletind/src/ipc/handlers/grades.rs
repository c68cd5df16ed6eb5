use crate::exam::{self, BlockReason, Validity};
use crate::ipc::error::{ok, HandlerErr};
use crate::ipc::helpers::{gateway_failure, param_id};
use crate::ipc::types::{AppState, Request};
use crate::ui::{notify, Level, Loading};
use crate::views::grades::{check_submission, GradeKind, Selection, LOAD_FAILED_MESSAGE};
use serde_json::json;

fn grades_view(state: &AppState) -> serde_json::Value {
    json!({ "grades": state.grades.view() })
}

/// Re-runs the exam window check for the selected exam. Anything short of
/// readable exam metadata blocks entry.
fn refresh_validity(state: &mut AppState) {
    let today = state.config.today();
    let validity = match state.grades.selection.exam_id.clone() {
        None => exam::evaluate(None, today),
        Some(exam_id) => {
            let fetched = {
                let _loading = Loading::start(state.events.as_ref(), "exam");
                state.gateway.exam(&exam_id)
            };
            match fetched {
                Ok(meta) => exam::evaluate(Some(&meta), today),
                Err(e) => {
                    tracing::warn!(exam_id = %exam_id, error = %e, "exam metadata unavailable");
                    Validity::blocked(BlockReason::ExamUnavailable {
                        detail: e.to_string(),
                    })
                }
            }
        }
    };
    if let Some(reason) = &validity.reason {
        tracing::debug!(?reason, "grade entry blocked");
    }
    state.grades.set_validity(validity);
}

fn load(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let previous_exam = state.grades.selection.exam_id.take();
    state.grades.selection = Selection {
        class_id: param_id(req, "classId"),
        subject_id: param_id(req, "subjectId"),
        exam_id: param_id(req, "examId"),
    };
    let Some((class_id, subject_id, exam_id)) = state
        .grades
        .selection
        .complete()
        .map(|(c, s, e)| (c.to_string(), s.to_string(), e.to_string()))
    else {
        // Rows from the previous triple never stay on screen.
        state.grades.clear_rows();
        let exam_id = &state.grades.selection.exam_id;
        if exam_id.is_none() || *exam_id != previous_exam {
            state.grades.set_validity(Validity::default());
        }
        return Ok(grades_view(state));
    };

    let fetched = {
        let _loading = Loading::start(state.events.as_ref(), "grades");
        state
            .gateway
            .grade_entry_students(&class_id, &subject_id, &exam_id)
    };
    match fetched {
        Ok(rows) => {
            tracing::debug!(class_id = %class_id, subject_id = %subject_id, count = rows.len(), "grade rows loaded");
            state.grades.replace_rows(rows);
            refresh_validity(state);
            Ok(grades_view(state))
        }
        Err(e) => {
            state.grades.load_failed(LOAD_FAILED_MESSAGE);
            state.grades.set_validity(Validity::blocked(BlockReason::ExamUnavailable {
                detail: e.to_string(),
            }));
            let mut failure = gateway_failure(state.events.as_ref(), "grades", e);
            failure.details = Some(json!({
                "status": failure.details.as_ref().and_then(|d| d.get("status")).cloned(),
                "grades": state.grades.view(),
            }));
            Err(failure)
        }
    }
}

fn handle_load(state: &mut AppState, req: &Request) -> serde_json::Value {
    match load(state, req) {
        Ok(v) => ok(&req.id, v),
        Err(e) => e.response(&req.id),
    }
}

fn handle_check_exam(state: &mut AppState, req: &Request) -> serde_json::Value {
    if req.params.get("examId").is_some() {
        state.grades.selection.exam_id = param_id(req, "examId");
    }
    refresh_validity(state);
    ok(&req.id, grades_view(state))
}

/// Accepts `{"note_classe_1": "12.5", ...}` or `[{"name", "value"}, ...]`.
fn submitted_values(params: &serde_json::Value) -> Result<Vec<(String, String)>, HandlerErr> {
    let as_text = |v: &serde_json::Value| match v {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Number(n) => n.to_string(),
        _ => String::new(),
    };
    let pairs: Vec<(String, String)> = match params.get("values") {
        Some(serde_json::Value::Object(map)) => map
            .iter()
            .map(|(k, v)| (k.clone(), as_text(v)))
            .collect(),
        Some(serde_json::Value::Array(items)) => items
            .iter()
            .filter_map(|it| {
                let name = it.get("name")?.as_str()?.to_string();
                Some((name, it.get("value").map(as_text).unwrap_or_default()))
            })
            .collect(),
        _ => return Err(HandlerErr::bad_params("missing params.values")),
    };
    if let Some((bad, _)) = pairs.iter().find(|(name, _)| GradeKind::parse_field(name).is_none()) {
        return Err(HandlerErr {
            code: "bad_params",
            message: "unknown grade field".to_string(),
            details: Some(json!({ "name": bad })),
        });
    }
    Ok(pairs)
}

fn validate(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let values = submitted_values(&req.params)?;
    let check = check_submission(
        state.grades.selection.exam_id.as_deref(),
        state.grades.validity(),
        state.grades.load_error(),
        &values,
    );
    state.grades.set_invalid(check.invalid_fields.iter().cloned());
    if let Some(message) = check.message.as_deref() {
        notify(state.events.as_ref(), Level::Error, message);
    }
    Ok(json!({
        "check": check,
        "grades": state.grades.view(),
    }))
}

fn handle_validate(state: &mut AppState, req: &Request) -> serde_json::Value {
    match validate(state, req) {
        Ok(v) => ok(&req.id, v),
        Err(e) => e.response(&req.id),
    }
}

fn handle_view(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(&req.id, grades_view(state))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "grades.load" => Some(handle_load(state, req)),
        "grades.checkExam" => Some(handle_check_exam(state, req)),
        "grades.validate" => Some(handle_validate(state, req)),
        "grades.view" => Some(handle_view(state, req)),
        _ => None,
    }
}
