use crate::store::model::{CategoryTag, ExerciseInput, Location, Section};
use serde_json::Value as JsonValue;

/// Splits the admin form's comma-separated materials field.
pub fn split_materials(raw: &str) -> Vec<String> {
    dedup_trimmed(raw.split(','))
}

fn dedup_trimmed<'a>(items: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for item in items {
        let s = item.trim();
        if !s.is_empty() && !out.iter().any(|o| o == s) {
            out.push(s.to_string());
        }
    }
    out
}

/// Trimmed, non-empty resource value. `None` means it must not be stored.
pub fn normalize_resource_value(value: &str) -> Option<String> {
    let v = value.trim();
    if v.is_empty() {
        None
    } else {
        Some(v.to_string())
    }
}

/// Parses the `input` object of `exercises.create` / `exercises.update`.
///
/// `materials` may be an array or the comma-separated string the admin form
/// submits. `categories` rows need both fields.
pub fn parse_exercise_input(raw: Option<&JsonValue>) -> Result<ExerciseInput, String> {
    let Some(obj) = raw.and_then(|v| v.as_object()) else {
        return Err("missing input object".to_string());
    };

    let name = obj
        .get("name")
        .and_then(|v| v.as_str())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| "input.name must be a non-empty string".to_string())?;

    let description = match obj.get("description") {
        None | Some(JsonValue::Null) => String::new(),
        Some(v) => v
            .as_str()
            .ok_or_else(|| "input.description must be a string".to_string())?
            .trim()
            .to_string(),
    };

    let location = match obj.get("location").and_then(|v| v.as_str()) {
        Some(raw) => Location::parse(raw)
            .ok_or_else(|| "input.location must be one of: gym, field, both".to_string())?,
        None => return Err("missing input.location".to_string()),
    };

    let materials = match obj.get("materials") {
        None | Some(JsonValue::Null) => Vec::new(),
        Some(JsonValue::String(s)) => split_materials(s),
        Some(JsonValue::Array(items)) => {
            let mut strs = Vec::with_capacity(items.len());
            for item in items {
                strs.push(
                    item.as_str()
                        .ok_or_else(|| "input.materials must be array of strings".to_string())?,
                );
            }
            dedup_trimmed(strs.into_iter())
        }
        Some(_) => return Err("input.materials must be array of strings".to_string()),
    };

    let mut categories: Vec<CategoryTag> = Vec::new();
    if let Some(v) = obj.get("categories").filter(|v| !v.is_null()) {
        let arr = v
            .as_array()
            .ok_or_else(|| "input.categories must be an array".to_string())?;
        for item in arr {
            let field = |key: &str| {
                item.get(key)
                    .and_then(|v| v.as_str())
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
            };
            let (Some(construct_type), Some(subcategory)) =
                (field("constructType"), field("subcategory"))
            else {
                return Err(
                    "each input.categories row needs constructType and subcategory".to_string(),
                );
            };
            let tag = CategoryTag {
                construct_type,
                subcategory,
            };
            if !categories.contains(&tag) {
                categories.push(tag);
            }
        }
    }

    let mut sections: Vec<Section> = Vec::new();
    if let Some(v) = obj.get("sections").filter(|v| !v.is_null()) {
        let arr = v
            .as_array()
            .ok_or_else(|| "input.sections must be an array".to_string())?;
        for item in arr {
            let section = item
                .as_str()
                .and_then(Section::parse)
                .ok_or_else(|| "input.sections must contain prep, main or final".to_string())?;
            if !sections.contains(&section) {
                sections.push(section);
            }
        }
    }

    Ok(ExerciseInput {
        name,
        description,
        location,
        materials,
        categories,
        sections,
    })
}
