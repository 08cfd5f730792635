use crate::ai::{AiClient, SuggestionRequest};
use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{parse_opt_string, parse_string_array, required_str};
use crate::ipc::types::{AppState, Request};
use crate::store::model::Location;
use serde_json::{json, Value as JsonValue};

fn handle_suggest_exercise(state: &mut AppState, req: &Request) -> JsonValue {
    let construct_type = match required_str(req, "constructType") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let subcategory = match required_str(req, "subcategory") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let location = match parse_opt_string(req.params.get("location")) {
        Ok(Some(raw)) => match Location::parse(&raw) {
            Some(loc) => loc,
            None => {
                return err(
                    &req.id,
                    "bad_params",
                    "location must be one of: gym, field, both",
                    None,
                )
            }
        },
        Ok(None) => state.draft.environment.unwrap_or(Location::Both),
        Err(e) => return err(&req.id, "bad_params", format!("location {e}"), None),
    };
    let materials = if req.params.get("materials").is_some_and(|v| !v.is_null()) {
        match parse_string_array(req.params.get("materials")) {
            Ok(v) => v,
            Err(e) => return err(&req.id, "bad_params", format!("materials {e}"), None),
        }
    } else {
        state.draft.equipment.clone()
    };

    let suggestion = AiClient::from_config(&state.config.ai).and_then(|client| {
        client.suggest_exercise(&SuggestionRequest {
            construct_type,
            subcategory,
            location: location.as_str().to_string(),
            materials,
        })
    });
    match suggestion {
        Ok(s) => ok(
            &req.id,
            json!({ "name": s.name, "description": s.description, "time": s.time }),
        ),
        Err(e) => {
            log::warn!("exercise suggestion failed: {e}");
            err(&req.id, "ai_failed", e.to_string(), None)
        }
    }
}

fn handle_optimize_plan(state: &mut AppState, req: &Request) -> JsonValue {
    let Some(exercises) = req.params.get("exercises").and_then(|v| v.as_array()) else {
        return err(&req.id, "bad_params", "exercises must be an array", None);
    };
    let optimized =
        AiClient::from_config(&state.config.ai).and_then(|client| client.optimize_plan(exercises));
    match optimized {
        Ok(list) => ok(&req.id, json!({ "exercises": list, "optimized": true })),
        Err(e) => {
            log::warn!("plan optimisation failed, keeping original order: {e}");
            ok(
                &req.id,
                json!({
                    "exercises": exercises,
                    "optimized": false,
                    "warning": e.to_string(),
                }),
            )
        }
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<JsonValue> {
    match req.method.as_str() {
        "ai.suggestExercise" => Some(handle_suggest_exercise(state, req)),
        "ai.optimizePlan" => Some(handle_optimize_plan(state, req)),
        _ => None,
    }
}
