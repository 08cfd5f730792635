use crate::catalog::parse_exercise_input;
use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{
    parse_opt_string, parse_string_array, require_admin, required_str, store, store_err,
};
use crate::ipc::types::{AppState, Request};
use crate::selection;
use crate::store::model::{Exercise, ExerciseFilter, Location, Section, CONSTRUCT_TYPES};
use crate::store::{Source, Store};
use serde_json::{json, Value as JsonValue};

fn exercise_json(ex: &Exercise) -> JsonValue {
    json!({
        "id": ex.id,
        "name": ex.name,
        "description": ex.description,
        "location": ex.location.as_str(),
        "materials": ex.materials,
    })
}

fn parse_section(req: &Request, key: &str) -> Result<Option<Section>, JsonValue> {
    match parse_opt_string(req.params.get(key)) {
        Ok(None) => Ok(None),
        Ok(Some(raw)) => Section::parse(&raw).map(Some).ok_or_else(|| {
            err(
                &req.id,
                "bad_params",
                format!("{key} must be one of: prep, main, final"),
                None,
            )
        }),
        Err(e) => Err(err(&req.id, "bad_params", format!("{key} {e}"), None)),
    }
}

fn parse_filter(req: &Request) -> Result<ExerciseFilter, JsonValue> {
    let construct_type = parse_opt_string(req.params.get("constructType"))
        .map_err(|e| err(&req.id, "bad_params", format!("constructType {e}"), None))?;
    let subcategory = parse_opt_string(req.params.get("subcategory"))
        .map_err(|e| err(&req.id, "bad_params", format!("subcategory {e}"), None))?;
    let section = parse_section(req, "section")?;
    Ok(ExerciseFilter {
        construct_type,
        subcategory,
        section,
    })
}

fn handle_construct_types(_state: &mut AppState, req: &Request) -> JsonValue {
    ok(&req.id, json!({ "constructTypes": CONSTRUCT_TYPES }))
}

fn handle_subcategories(state: &mut AppState, req: &Request) -> JsonValue {
    let backend = match store(state, req) {
        Ok(b) => b,
        Err(e) => return e,
    };
    let construct_type = match required_str(req, "constructType") {
        Ok(v) => v,
        Err(e) => return e,
    };
    match backend.list_resources(&construct_type) {
        Ok(rows) => {
            let values: Vec<String> = rows.into_iter().map(|r| r.value).collect();
            ok(
                &req.id,
                json!({ "constructType": construct_type, "subcategories": values }),
            )
        }
        Err(e) => store_err(req, e),
    }
}

fn handle_exercises_list(state: &mut AppState, req: &Request) -> JsonValue {
    let backend = match store(state, req) {
        Ok(b) => b,
        Err(e) => return e,
    };
    let filter = match parse_filter(req) {
        Ok(f) => f,
        Err(e) => return e,
    };
    match backend.list_exercises(&filter) {
        Ok(rows) => {
            let exercises: Vec<JsonValue> = rows.iter().map(exercise_json).collect();
            ok(
                &req.id,
                json!({ "exercises": exercises, "source": backend.last_source().map(Source::as_str) }),
            )
        }
        Err(e) => store_err(req, e),
    }
}

fn handle_exercises_open(state: &mut AppState, req: &Request) -> JsonValue {
    let backend = match store(state, req) {
        Ok(b) => b,
        Err(e) => return e,
    };
    let exercise_id = match required_str(req, "exerciseId") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let exercise = match backend.get_exercise(&exercise_id) {
        Ok(Some(ex)) => ex,
        Ok(None) => return err(&req.id, "not_found", "exercise not found", None),
        Err(e) => return store_err(req, e),
    };
    let categories = match backend.exercise_categories(&exercise_id) {
        Ok(rows) => rows,
        Err(e) => return store_err(req, e),
    };
    let sections = match backend.exercise_sections(&exercise_id) {
        Ok(rows) => rows,
        Err(e) => return store_err(req, e),
    };

    let categories: Vec<JsonValue> = categories
        .iter()
        .map(|c| json!({ "constructType": c.construct_type, "subcategory": c.subcategory }))
        .collect();
    let sections: Vec<&str> = sections.iter().map(|s| s.as_str()).collect();
    ok(
        &req.id,
        json!({
            "exercise": exercise_json(&exercise),
            "categories": categories,
            "sections": sections,
        }),
    )
}

fn handle_exercises_create(state: &mut AppState, req: &Request) -> JsonValue {
    if let Err(e) = require_admin(state, req) {
        return e;
    }
    let backend = match store(state, req) {
        Ok(b) => b,
        Err(e) => return e,
    };
    let input = match parse_exercise_input(req.params.get("input")) {
        Ok(i) => i,
        Err(msg) => return err(&req.id, "bad_params", msg, None),
    };
    match backend.add_exercise(&input) {
        Ok(exercise_id) => {
            log::info!("added exercise {} ({})", input.name, exercise_id);
            ok(&req.id, json!({ "exerciseId": exercise_id }))
        }
        Err(e) => store_err(req, e),
    }
}

fn handle_exercises_update(state: &mut AppState, req: &Request) -> JsonValue {
    if let Err(e) = require_admin(state, req) {
        return e;
    }
    let backend = match store(state, req) {
        Ok(b) => b,
        Err(e) => return e,
    };
    let exercise_id = match required_str(req, "exerciseId") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let input = match parse_exercise_input(req.params.get("input")) {
        Ok(i) => i,
        Err(msg) => return err(&req.id, "bad_params", msg, None),
    };
    match backend.update_exercise(&exercise_id, &input) {
        Ok(true) => ok(&req.id, json!({ "ok": true })),
        Ok(false) => err(&req.id, "not_found", "exercise not found", None),
        Err(e) => store_err(req, e),
    }
}

fn handle_exercises_delete(state: &mut AppState, req: &Request) -> JsonValue {
    if let Err(e) = require_admin(state, req) {
        return e;
    }
    let backend = match store(state, req) {
        Ok(b) => b,
        Err(e) => return e,
    };
    let exercise_id = match required_str(req, "exerciseId") {
        Ok(v) => v,
        Err(e) => return e,
    };
    match backend.delete_exercise(&exercise_id) {
        Ok(true) => {
            log::info!("deleted exercise {}", exercise_id);
            ok(&req.id, json!({ "ok": true }))
        }
        Ok(false) => err(&req.id, "not_found", "exercise not found", None),
        Err(e) => store_err(req, e),
    }
}

fn handle_exercises_candidates(state: &mut AppState, req: &Request) -> JsonValue {
    let section = match parse_section(req, "section") {
        Ok(Some(s)) => s,
        Ok(None) => return err(&req.id, "bad_params", "missing section", None),
        Err(e) => return e,
    };
    let filter = match parse_filter(req) {
        Ok(f) => f,
        Err(e) => return e,
    };

    let environment = match parse_opt_string(req.params.get("environment")) {
        Ok(Some(raw)) => match Location::parse(&raw) {
            Some(Location::Both) | None => {
                return err(
                    &req.id,
                    "bad_params",
                    "environment must be gym or field",
                    None,
                )
            }
            Some(loc) => Some(loc),
        },
        Ok(None) => state.draft.environment,
        Err(e) => return err(&req.id, "bad_params", format!("environment {e}"), None),
    };
    let Some(environment) = environment else {
        return err(
            &req.id,
            "no_environment",
            "choose gym or field before picking exercises",
            None,
        );
    };
    let equipment = if req.params.get("equipment").is_some_and(|v| !v.is_null()) {
        match parse_string_array(req.params.get("equipment")) {
            Ok(v) => v,
            Err(e) => return err(&req.id, "bad_params", format!("equipment {e}"), None),
        }
    } else {
        state.draft.equipment.clone()
    };

    let backend = match store(state, req) {
        Ok(b) => b,
        Err(e) => return e,
    };
    let filter = ExerciseFilter {
        section: Some(section),
        ..filter
    };
    let rows = match backend.list_exercises(&filter) {
        Ok(rows) => rows,
        Err(e) => return store_err(req, e),
    };
    let picked = selection::candidates(&rows, environment, &equipment);
    let options: Vec<JsonValue> = picked
        .iter()
        .map(|ex| {
            let mut v = exercise_json(ex);
            v["label"] = json!(selection::option_label(ex));
            v
        })
        .collect();
    ok(
        &req.id,
        json!({
            "section": section.as_str(),
            "environment": environment.as_str(),
            "candidates": options,
        }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<JsonValue> {
    match req.method.as_str() {
        "catalog.constructTypes" => Some(handle_construct_types(state, req)),
        "catalog.subcategories" => Some(handle_subcategories(state, req)),
        "exercises.list" => Some(handle_exercises_list(state, req)),
        "exercises.open" => Some(handle_exercises_open(state, req)),
        "exercises.create" => Some(handle_exercises_create(state, req)),
        "exercises.update" => Some(handle_exercises_update(state, req)),
        "exercises.delete" => Some(handle_exercises_delete(state, req)),
        "exercises.candidates" => Some(handle_exercises_candidates(state, req)),
        _ => None,
    }
}
