use crate::store::model::{Location, Section};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;

pub const DEFAULT_CLASS_GRADE: &str = "3. třída";
pub const MIN_SECTION_MINUTES: u32 = 1;
pub const MAX_SECTION_MINUTES: u32 = 45;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Leader {
    Teacher,
    Coach,
    Both,
}

/// One value per lesson section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerSection<T> {
    pub prep: T,
    pub main: T,
    #[serde(rename = "final")]
    pub closing: T,
}

impl<T> PerSection<T> {
    pub fn get(&self, section: Section) -> &T {
        match section {
            Section::Prep => &self.prep,
            Section::Main => &self.main,
            Section::Final => &self.closing,
        }
    }

    pub fn get_mut(&mut self, section: Section) -> &mut T {
        match section {
            Section::Prep => &mut self.prep,
            Section::Main => &mut self.main,
            Section::Final => &mut self.closing,
        }
    }
}

impl Default for PerSection<u32> {
    fn default() -> Self {
        Self {
            prep: 10,
            main: 25,
            closing: 10,
        }
    }
}

impl Default for PerSection<Vec<String>> {
    fn default() -> Self {
        Self {
            prep: Vec::new(),
            main: Vec::new(),
            closing: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlanMeta {
    pub title: Option<String>,
    pub goal: Option<String>,
    pub summary: Option<String>,
    pub date: Option<String>,
    pub place: Option<String>,
    pub material: Option<String>,
    pub methods: Option<String>,
    pub safety: Option<String>,
    pub instructor: Option<String>,
}

impl PlanMeta {
    /// Labelled lines for the non-empty fields, in display order.
    pub fn lines(&self) -> Vec<(&'static str, &str)> {
        [
            ("Title", &self.title),
            ("Lesson goal", &self.goal),
            ("Summary", &self.summary),
            ("Place", &self.place),
            ("Material", &self.material),
            ("Methods", &self.methods),
            ("Safety", &self.safety),
            ("Instructor", &self.instructor),
        ]
        .into_iter()
        .filter_map(|(label, v)| {
            v.as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(|s| (label, s))
        })
        .collect()
    }
}

/// Wizard state for one lesson, filled page by page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonDraft {
    pub class_grade: String,
    pub selected_schools: Vec<String>,
    pub school_category: BTreeMap<String, String>,
    pub environment: Option<Location>,
    pub equipment: Vec<String>,
    pub prep_leader: Leader,
    pub main_leader: Leader,
    pub final_leader: Leader,
    pub fitness: Vec<String>,
    pub manipulation: Vec<String>,
    pub locomotion: Vec<String>,
    pub selected_exercises: PerSection<Vec<String>>,
    pub minutes: PerSection<u32>,
    pub meta: PlanMeta,
    pub loaded_plan: Option<String>,
}

impl Default for LessonDraft {
    fn default() -> Self {
        Self {
            class_grade: DEFAULT_CLASS_GRADE.to_string(),
            selected_schools: Vec::new(),
            school_category: BTreeMap::new(),
            environment: None,
            equipment: Vec::new(),
            prep_leader: Leader::Coach,
            main_leader: Leader::Teacher,
            final_leader: Leader::Teacher,
            fitness: Vec::new(),
            manipulation: Vec::new(),
            locomotion: Vec::new(),
            selected_exercises: PerSection::default(),
            minutes: PerSection::default(),
            meta: PlanMeta::default(),
            loaded_plan: None,
        }
    }
}

impl LessonDraft {
    pub fn to_json(&self) -> JsonValue {
        serde_json::to_value(self).unwrap_or(JsonValue::Null)
    }

    /// Applies a partial update given as camelCase keys. The draft is left
    /// untouched when any key is unknown or the result fails validation.
    pub fn apply_patch(&mut self, patch: &JsonValue) -> Result<(), String> {
        let Some(changes) = patch.as_object() else {
            return Err("patch must be an object".to_string());
        };
        let mut merged = serde_json::to_value(&*self).map_err(|e| e.to_string())?;
        let Some(fields) = merged.as_object_mut() else {
            return Err("draft is not an object".to_string());
        };
        for (key, value) in changes {
            if key == "prepLeader" {
                return Err("prepLeader is fixed to coach".to_string());
            }
            if !fields.contains_key(key) {
                return Err(format!("unknown draft field: {}", key));
            }
            fields.insert(key.clone(), value.clone());
        }
        let next: LessonDraft = serde_json::from_value(merged).map_err(|e| e.to_string())?;
        next.validate()?;
        *self = next;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.class_grade.trim().is_empty() {
            return Err("classGrade must not be empty".to_string());
        }
        if self.environment == Some(Location::Both) {
            return Err("environment must be gym or field".to_string());
        }
        if self.prep_leader != Leader::Coach {
            return Err("prepLeader is fixed to coach".to_string());
        }
        if self.main_leader == Leader::Both {
            return Err("mainLeader must be teacher or coach".to_string());
        }
        for section in Section::ALL {
            let m = *self.minutes.get(section);
            if !(MIN_SECTION_MINUTES..=MAX_SECTION_MINUTES).contains(&m) {
                return Err(format!(
                    "minutes.{} must be between {} and {}",
                    section.as_str(),
                    MIN_SECTION_MINUTES,
                    MAX_SECTION_MINUTES
                ));
            }
        }
        Ok(())
    }

    /// Gives every selected school a category, defaulting to the first one offered.
    pub fn fill_school_categories(&mut self, categories: &[String]) {
        let Some(first) = categories.first() else {
            return;
        };
        for school in &self.selected_schools {
            let current = self.school_category.get(school);
            if current.map(|c| !categories.contains(c)).unwrap_or(true) {
                self.school_category.insert(school.clone(), first.clone());
            }
        }
    }

    pub fn select_exercises(&mut self, section: Section, exercise_ids: Vec<String>) {
        *self.selected_exercises.get_mut(section) = exercise_ids;
    }

    /// Drops plan metadata, exercise picks and timing. Class, schools,
    /// environment and roles survive so the next lesson starts from them.
    pub fn clear_plan_data(&mut self) {
        self.meta = PlanMeta::default();
        self.selected_exercises = PerSection::default();
        self.minutes = PerSection::default();
    }
}
