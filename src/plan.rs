use crate::draft::LessonDraft;
use crate::store::model::{Exercise, Section};
use chrono::NaiveDate;
use serde_json::{json, Value as JsonValue};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PlanError {
    #[error("select exercises for every part of the lesson (missing: {})", .0.label())]
    MissingExercises(Section),
}

/// Date printed on the plan: the draft's own date if set, else `today`.
pub fn plan_date(draft: &LessonDraft, today: NaiveDate) -> String {
    draft
        .meta
        .date
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| today.format("%Y-%m-%d").to_string())
}

/// Renders the written lesson plan. Exercises appear in catalog order; ids no
/// longer in the catalog are skipped.
pub fn render(
    draft: &LessonDraft,
    catalog: &[Exercise],
    today: NaiveDate,
) -> Result<String, PlanError> {
    for section in Section::ALL {
        if draft.selected_exercises.get(section).is_empty() {
            return Err(PlanError::MissingExercises(section));
        }
    }

    let mut lines: Vec<String> = Vec::new();
    lines.push(format!(
        "{} — Written lesson plan {}",
        draft.class_grade,
        plan_date(draft, today)
    ));
    for (label, value) in draft.meta.lines() {
        lines.push(format!("{label}: {value}"));
    }
    lines.push(String::new());

    for section in Section::ALL {
        let selected = draft.selected_exercises.get(section);
        lines.push(format!(
            "--- {} ({} min) ---",
            section.label(),
            draft.minutes.get(section)
        ));
        for ex in catalog.iter().filter(|e| selected.contains(&e.id)) {
            lines.push(format!("- {}: {}", ex.name, ex.description));
        }
        lines.push(String::new());
    }

    Ok(lines.join("\n"))
}

/// Content blob stored with a persisted lesson plan.
pub fn content_blob(draft: &LessonDraft, catalog: &[Exercise], text: &str) -> JsonValue {
    let mut sections = serde_json::Map::new();
    for section in Section::ALL {
        let selected = draft.selected_exercises.get(section);
        let exercises: Vec<JsonValue> = catalog
            .iter()
            .filter(|e| selected.contains(&e.id))
            .map(|e| json!({ "id": e.id, "name": e.name, "description": e.description }))
            .collect();
        sections.insert(
            section.as_str().to_string(),
            json!({
                "minutes": draft.minutes.get(section),
                "exercises": exercises,
            }),
        );
    }
    json!({
        "text": text,
        "sections": sections,
    })
}
