use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value as JsonValue;

/// Where an exercise can be run. An exercise tagged `Both` fits either environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Location {
    #[serde(alias = "Tělocvična")]
    Gym,
    #[serde(alias = "Hřiště")]
    Field,
    #[serde(alias = "Obojí")]
    Both,
}

impl Location {
    pub fn as_str(self) -> &'static str {
        match self {
            Location::Gym => "gym",
            Location::Field => "field",
            Location::Both => "both",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "gym" | "tělocvična" => Some(Location::Gym),
            "field" | "hřiště" => Some(Location::Field),
            "both" | "obojí" => Some(Location::Both),
            _ => None,
        }
    }
}

/// Which third of the lesson an exercise belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Section {
    Prep,
    Main,
    Final,
}

impl Section {
    pub const ALL: [Section; 3] = [Section::Prep, Section::Main, Section::Final];

    pub fn as_str(self) -> &'static str {
        match self {
            Section::Prep => "prep",
            Section::Main => "main",
            Section::Final => "final",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Section::Prep => "Preparatory part",
            Section::Main => "Main part",
            Section::Final => "Final part",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "prep" => Some(Section::Prep),
            "main" => Some(Section::Main),
            "final" => Some(Section::Final),
            _ => None,
        }
    }
}

pub const CONSTRUCT_TYPES: [&str; 3] = ["fitness", "manipulation", "locomotion"];

pub const RESOURCE_SCHOOL_CATEGORY: &str = "school_category";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exercise {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    pub location: Location,
    #[serde(default, deserialize_with = "null_as_default")]
    pub materials: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExerciseCategory {
    #[serde(deserialize_with = "id_string")]
    pub exercise_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub construct_type: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub subcategory: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExerciseSection {
    #[serde(deserialize_with = "id_string")]
    pub exercise_id: String,
    pub section: Section,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    pub resource_type: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LessonSeries {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    pub teacher_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub school_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub class_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub subject: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub school_year: String,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LessonPlan {
    #[serde(default, deserialize_with = "opt_id_string", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(deserialize_with = "id_string")]
    pub series_id: String,
    pub sequence_index: i64,
    pub date: String,
    #[serde(default)]
    pub params: JsonValue,
    #[serde(default)]
    pub content: JsonValue,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryTag {
    pub construct_type: String,
    pub subcategory: String,
}

/// Normalised form submission for creating or overwriting an exercise.
#[derive(Debug, Clone, PartialEq)]
pub struct ExerciseInput {
    pub name: String,
    pub description: String,
    pub location: Location,
    pub materials: Vec<String>,
    pub categories: Vec<CategoryTag>,
    pub sections: Vec<Section>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeriesInput {
    pub teacher_id: String,
    pub school_id: String,
    pub class_name: String,
    pub subject: String,
    pub school_year: String,
}

/// Construct type and subcategory must match on the same category row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExerciseFilter {
    pub construct_type: Option<String>,
    pub subcategory: Option<String>,
    pub section: Option<Section>,
}

impl ExerciseFilter {
    pub fn has_category_filter(&self) -> bool {
        self.construct_type.is_some() || self.subcategory.is_some()
    }

    pub fn matches_category(&self, row: &ExerciseCategory) -> bool {
        self.construct_type
            .as_deref()
            .map(|ct| row.construct_type == ct)
            .unwrap_or(true)
            && self
                .subcategory
                .as_deref()
                .map(|sub| row.subcategory == sub)
                .unwrap_or(true)
    }
}

// Hosted backends hand out integer or uuid keys; both are carried as strings.
fn id_string<'de, D>(de: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match JsonValue::deserialize(de)? {
        JsonValue::String(s) => Ok(s),
        JsonValue::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number id, got {}",
            other
        ))),
    }
}

// Hosted tables leave optional columns as null rather than omitting them.
fn null_as_default<'de, D, T>(de: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(de)?.unwrap_or_default())
}

fn opt_id_string<'de, D>(de: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match JsonValue::deserialize(de)? {
        JsonValue::Null => Ok(None),
        JsonValue::String(s) => Ok(Some(s)),
        JsonValue::Number(n) => Ok(Some(n.to_string())),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number id, got {}",
            other
        ))),
    }
}
