use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{required_str, store, store_err};
use crate::ipc::types::{AppState, Request};
use crate::store::model::{LessonPlan, LessonSeries, SeriesInput};
use crate::store::{Store, DEFAULT_RECENT_LESSONS};
use serde_json::{json, Value as JsonValue};

const MAX_RECENT_LESSONS: u64 = 50;

fn series_json(s: &LessonSeries) -> JsonValue {
    json!({
        "id": s.id,
        "teacherId": s.teacher_id,
        "schoolId": s.school_id,
        "className": s.class_name,
        "subject": s.subject,
        "schoolYear": s.school_year,
        "createdAt": s.created_at,
    })
}

pub(crate) fn plan_json(p: &LessonPlan) -> JsonValue {
    json!({
        "id": p.id,
        "seriesId": p.series_id,
        "sequenceIndex": p.sequence_index,
        "date": p.date,
        "params": p.params,
        "content": p.content,
    })
}

fn parse_series_input(req: &Request) -> Result<SeriesInput, JsonValue> {
    Ok(SeriesInput {
        teacher_id: required_str(req, "teacherId")?,
        school_id: required_str(req, "schoolId")?,
        class_name: required_str(req, "className")?,
        subject: required_str(req, "subject")?,
        school_year: required_str(req, "schoolYear")?,
    })
}

fn handle_series_list(state: &mut AppState, req: &Request) -> JsonValue {
    let backend = match store(state, req) {
        Ok(b) => b,
        Err(e) => return e,
    };
    let teacher_id = match required_str(req, "teacherId") {
        Ok(v) => v,
        Err(e) => return e,
    };
    match backend.series_for_teacher(&teacher_id) {
        Ok(rows) => {
            let series: Vec<JsonValue> = rows.iter().map(series_json).collect();
            ok(&req.id, json!({ "series": series }))
        }
        Err(e) => store_err(req, e),
    }
}

fn handle_series_create(state: &mut AppState, req: &Request) -> JsonValue {
    let backend = match store(state, req) {
        Ok(b) => b,
        Err(e) => return e,
    };
    let input = match parse_series_input(req) {
        Ok(i) => i,
        Err(e) => return e,
    };
    match backend.create_series(&input) {
        Ok(series) => ok(&req.id, json!({ "series": series_json(&series) })),
        Err(e) => store_err(req, e),
    }
}

fn handle_lessons_recent(state: &mut AppState, req: &Request) -> JsonValue {
    let backend = match store(state, req) {
        Ok(b) => b,
        Err(e) => return e,
    };
    let series_id = match required_str(req, "seriesId") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let limit = match req.params.get("limit") {
        None | Some(JsonValue::Null) => DEFAULT_RECENT_LESSONS,
        Some(v) => match v.as_u64() {
            Some(n) if (1..=MAX_RECENT_LESSONS).contains(&n) => n as usize,
            _ => {
                return err(
                    &req.id,
                    "bad_params",
                    format!("limit must be between 1 and {}", MAX_RECENT_LESSONS),
                    None,
                )
            }
        },
    };
    match backend.last_lessons(&series_id, limit) {
        Ok(lessons) => ok(&req.id, json!({ "lessons": lessons })),
        Err(e) => store_err(req, e),
    }
}

fn handle_lessons_next_index(state: &mut AppState, req: &Request) -> JsonValue {
    let backend = match store(state, req) {
        Ok(b) => b,
        Err(e) => return e,
    };
    let series_id = match required_str(req, "seriesId") {
        Ok(v) => v,
        Err(e) => return e,
    };
    match backend.next_sequence_index(&series_id) {
        Ok(n) => ok(&req.id, json!({ "sequenceIndex": n })),
        Err(e) => store_err(req, e),
    }
}

fn handle_lessons_create(state: &mut AppState, req: &Request) -> JsonValue {
    let backend = match store(state, req) {
        Ok(b) => b,
        Err(e) => return e,
    };
    let series_id = match required_str(req, "seriesId") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let date = match required_str(req, "date") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let sequence_index = match req.params.get("sequenceIndex") {
        None | Some(JsonValue::Null) => match backend.next_sequence_index(&series_id) {
            Ok(n) => n,
            Err(e) => return store_err(req, e),
        },
        Some(v) => match v.as_i64() {
            Some(n) if n >= 1 => n,
            _ => {
                return err(
                    &req.id,
                    "bad_params",
                    "sequenceIndex must be a positive integer",
                    None,
                )
            }
        },
    };
    let plan = LessonPlan {
        id: None,
        series_id,
        sequence_index,
        date,
        params: req.params.get("params").cloned().unwrap_or(JsonValue::Null),
        content: req.params.get("content").cloned().unwrap_or(JsonValue::Null),
    };
    match backend.add_lesson_plan(&plan) {
        Ok(stored) => ok(&req.id, json!({ "lesson": plan_json(&stored) })),
        Err(e) => store_err(req, e),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<JsonValue> {
    match req.method.as_str() {
        "series.list" => Some(handle_series_list(state, req)),
        "series.create" => Some(handle_series_create(state, req)),
        "lessons.recent" => Some(handle_lessons_recent(state, req)),
        "lessons.nextIndex" => Some(handle_lessons_next_index(state, req)),
        "lessons.create" => Some(handle_lessons_create(state, req)),
        _ => None,
    }
}
