use crate::ipc::error::{err, ok};
use crate::ipc::helpers::parse_string_array;
use crate::ipc::types::{AppState, Request};
use crate::store::model::{Section, RESOURCE_SCHOOL_CATEGORY};
use crate::store::Store;
use serde_json::{json, Value as JsonValue};

fn draft_result(state: &AppState, req: &Request) -> JsonValue {
    ok(&req.id, json!({ "draft": state.draft.to_json() }))
}

fn school_category_values(state: &AppState) -> Vec<String> {
    let Some(backend) = state.store.as_ref() else {
        return Vec::new();
    };
    match backend.list_resources(RESOURCE_SCHOOL_CATEGORY) {
        Ok(rows) => rows.into_iter().map(|r| r.value).collect(),
        Err(e) => {
            log::warn!("could not load school categories: {e}");
            Vec::new()
        }
    }
}

fn handle_draft_get(state: &mut AppState, req: &Request) -> JsonValue {
    draft_result(state, req)
}

fn handle_draft_update(state: &mut AppState, req: &Request) -> JsonValue {
    let Some(patch) = req.params.get("patch") else {
        return err(&req.id, "bad_params", "missing patch", None);
    };
    if let Err(msg) = state.draft.apply_patch(patch) {
        return err(&req.id, "bad_params", msg, None);
    }
    if !state.draft.selected_schools.is_empty() {
        let categories = school_category_values(state);
        state.draft.fill_school_categories(&categories);
    }
    draft_result(state, req)
}

fn handle_draft_clear(state: &mut AppState, req: &Request) -> JsonValue {
    state.draft.clear_plan_data();
    draft_result(state, req)
}

fn handle_draft_select_exercises(state: &mut AppState, req: &Request) -> JsonValue {
    let section = match req
        .params
        .get("section")
        .and_then(|v| v.as_str())
        .map(Section::parse)
    {
        Some(Some(s)) => s,
        Some(None) => {
            return err(
                &req.id,
                "bad_params",
                "section must be one of: prep, main, final",
                None,
            )
        }
        None => return err(&req.id, "bad_params", "missing section", None),
    };
    let exercise_ids = match parse_string_array(req.params.get("exerciseIds")) {
        Ok(v) => v,
        Err(e) => return err(&req.id, "bad_params", format!("exerciseIds {e}"), None),
    };
    state.draft.select_exercises(section, exercise_ids);
    draft_result(state, req)
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<JsonValue> {
    match req.method.as_str() {
        "draft.get" => Some(handle_draft_get(state, req)),
        "draft.update" => Some(handle_draft_update(state, req)),
        "draft.clear" => Some(handle_draft_clear(state, req)),
        "draft.selectExercises" => Some(handle_draft_select_exercises(state, req)),
        _ => None,
    }
}
