use crate::export::{write_export, ExportFormat};
use crate::ipc::error::{err, ok};
use crate::ipc::handlers::series::plan_json;
use crate::ipc::helpers::{parse_opt_string, required_str, store, store_err};
use crate::ipc::types::{AppState, Request};
use crate::outputs;
use crate::plan;
use crate::store::model::{Exercise, ExerciseFilter, LessonPlan};
use crate::store::Store;
use chrono::{Local, NaiveDate};
use serde_json::{json, Value as JsonValue};
use std::path::PathBuf;

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn catalog(state: &AppState, req: &Request) -> Result<Vec<Exercise>, JsonValue> {
    let backend = store(state, req)?;
    backend
        .list_exercises(&ExerciseFilter::default())
        .map_err(|e| store_err(req, e))
}

/// Rendered plan text together with the catalog it was rendered from.
fn render_draft(state: &AppState, req: &Request) -> Result<(String, Vec<Exercise>), JsonValue> {
    let exercises = catalog(state, req)?;
    let text = plan::render(&state.draft, &exercises, today())
        .map_err(|e| err(&req.id, "incomplete_plan", e.to_string(), None))?;
    Ok((text, exercises))
}

fn output_dir(state: &AppState, req: &Request) -> Result<PathBuf, JsonValue> {
    state
        .output_dir()
        .ok_or_else(|| err(&req.id, "no_workspace", "select a workspace first", None))
}

fn handle_plan_render(state: &mut AppState, req: &Request) -> JsonValue {
    match render_draft(state, req) {
        Ok((text, _)) => ok(
            &req.id,
            json!({ "text": text, "date": plan::plan_date(&state.draft, today()) }),
        ),
        Err(e) => e,
    }
}

fn handle_plan_export(state: &mut AppState, req: &Request) -> JsonValue {
    let format = match req
        .params
        .get("format")
        .and_then(|v| v.as_str())
        .map(ExportFormat::parse)
    {
        Some(Some(f)) => f,
        Some(None) => {
            return err(
                &req.id,
                "bad_params",
                "format must be one of: txt, pdf, docx",
                None,
            )
        }
        None => return err(&req.id, "bad_params", "missing format", None),
    };
    let (text, _) = match render_draft(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let out_path = match parse_opt_string(req.params.get("outPath")) {
        Ok(Some(p)) => PathBuf::from(p),
        Ok(None) => {
            let dir = match output_dir(state, req) {
                Ok(d) => d,
                Err(e) => return e,
            };
            let title = state.draft.meta.title.clone().unwrap_or_default();
            let date = plan::plan_date(&state.draft, today());
            dir.join(outputs::plan_file_name(&title, &date))
                .with_extension(format.as_str())
        }
        Err(e) => return err(&req.id, "bad_params", format!("outPath {e}"), None),
    };
    match write_export(format, &text, &out_path) {
        Ok(summary) => ok(
            &req.id,
            json!({
                "path": out_path.to_string_lossy(),
                "format": summary.format.as_str(),
                "mimeType": summary.format.mime_type(),
                "bytes": summary.bytes,
            }),
        ),
        Err(e) => err(&req.id, "export_failed", format!("{e:?}"), None),
    }
}

fn handle_plan_save(state: &mut AppState, req: &Request) -> JsonValue {
    let dir = match output_dir(state, req) {
        Ok(d) => d,
        Err(e) => return e,
    };
    let (text, _) = match render_draft(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let title = match parse_opt_string(req.params.get("title")) {
        Ok(v) => v.or_else(|| state.draft.meta.title.clone()).unwrap_or_default(),
        Err(e) => return err(&req.id, "bad_params", format!("title {e}"), None),
    };
    let date = match parse_opt_string(req.params.get("date")) {
        Ok(v) => v.unwrap_or_else(|| plan::plan_date(&state.draft, today())),
        Err(e) => return err(&req.id, "bad_params", format!("date {e}"), None),
    };
    match outputs::save_plan(&dir, &title, &date, &text) {
        Ok(path) => {
            let file_name = path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();
            ok(
                &req.id,
                json!({ "path": path.to_string_lossy(), "fileName": file_name }),
            )
        }
        Err(e) => err(&req.id, "export_failed", format!("{e:?}"), None),
    }
}

fn handle_plans_list(state: &mut AppState, req: &Request) -> JsonValue {
    let dir = match output_dir(state, req) {
        Ok(d) => d,
        Err(e) => return e,
    };
    match outputs::list_plans(&dir) {
        Ok(names) => ok(&req.id, json!({ "plans": names })),
        Err(e) => err(&req.id, "store_failed", format!("{e:?}"), None),
    }
}

fn handle_plans_load(state: &mut AppState, req: &Request) -> JsonValue {
    let dir = match output_dir(state, req) {
        Ok(d) => d,
        Err(e) => return e,
    };
    let file_name = match required_str(req, "fileName") {
        Ok(v) => v,
        Err(e) => return e,
    };
    if !outputs::list_plans(&dir)
        .map(|names| names.contains(&file_name))
        .unwrap_or(false)
    {
        return err(&req.id, "not_found", "saved plan not found", None);
    }
    match outputs::load_plan(&dir, &file_name) {
        Ok(text) => {
            state.draft.loaded_plan = Some(text.clone());
            ok(&req.id, json!({ "fileName": file_name, "text": text }))
        }
        Err(e) => err(&req.id, "store_failed", format!("{e:?}"), None),
    }
}

fn handle_plan_persist(state: &mut AppState, req: &Request) -> JsonValue {
    let series_id = match required_str(req, "seriesId") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let date = match parse_opt_string(req.params.get("date")) {
        Ok(v) => v.unwrap_or_else(|| plan::plan_date(&state.draft, today())),
        Err(e) => return err(&req.id, "bad_params", format!("date {e}"), None),
    };
    let (text, exercises) = match render_draft(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let backend = match store(state, req) {
        Ok(b) => b,
        Err(e) => return e,
    };
    let sequence_index = match backend.next_sequence_index(&series_id) {
        Ok(n) => n,
        Err(e) => return store_err(req, e),
    };
    let lesson = LessonPlan {
        id: None,
        series_id,
        sequence_index,
        date,
        params: state.draft.to_json(),
        content: plan::content_blob(&state.draft, &exercises, &text),
    };
    match backend.add_lesson_plan(&lesson) {
        Ok(stored) => {
            log::info!(
                "persisted lesson {} of series {}",
                stored.sequence_index,
                stored.series_id
            );
            ok(&req.id, json!({ "lesson": plan_json(&stored) }))
        }
        Err(e) => store_err(req, e),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<JsonValue> {
    match req.method.as_str() {
        "plan.render" => Some(handle_plan_render(state, req)),
        "plan.export" => Some(handle_plan_export(state, req)),
        "plan.save" => Some(handle_plan_save(state, req)),
        "plan.persist" => Some(handle_plan_persist(state, req)),
        "plans.list" => Some(handle_plans_list(state, req)),
        "plans.load" => Some(handle_plans_load(state, req)),
        _ => None,
    }
}
