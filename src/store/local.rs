use super::model::{
    Exercise, ExerciseCategory, ExerciseFilter, ExerciseInput, ExerciseSection, LessonPlan,
    LessonSeries, Resource, Section, SeriesInput,
};
use super::{
    matching_exercise_ids, recent_contents, resource_value, sort_exercises, sort_resources, Store,
    StoreResult,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::path::{Path, PathBuf};
use uuid::Uuid;

#[derive(Debug, Default, Serialize, Deserialize)]
struct LocalDb {
    #[serde(default)]
    exercises: Vec<Exercise>,
    #[serde(default)]
    categories: Vec<ExerciseCategory>,
    #[serde(default)]
    sections: Vec<ExerciseSection>,
    #[serde(default)]
    series: Vec<LessonSeries>,
    #[serde(default)]
    plans: Vec<LessonPlan>,
    #[serde(default)]
    resources: Vec<Resource>,
}

/// All collections in one JSON document, re-read on every call.
#[derive(Debug, Clone)]
pub struct LocalStore {
    path: PathBuf,
}

impl LocalStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> StoreResult<LocalDb> {
        if !self.path.is_file() {
            return Ok(LocalDb::default());
        }
        let raw = std::fs::read_to_string(&self.path)?;
        if raw.trim().is_empty() {
            return Ok(LocalDb::default());
        }
        Ok(serde_json::from_str(&raw)?)
    }

    fn save(&self, db: &LocalDb) -> StoreResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, serde_json::to_vec_pretty(db)?)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    fn push_tags(db: &mut LocalDb, exercise_id: &str, input: &ExerciseInput) {
        for tag in &input.categories {
            db.categories.push(ExerciseCategory {
                exercise_id: exercise_id.to_string(),
                construct_type: tag.construct_type.clone(),
                subcategory: tag.subcategory.clone(),
            });
        }
        for section in &input.sections {
            db.sections.push(ExerciseSection {
                exercise_id: exercise_id.to_string(),
                section: *section,
            });
        }
    }

    fn drop_tags(db: &mut LocalDb, exercise_id: &str) {
        db.categories.retain(|c| c.exercise_id != exercise_id);
        db.sections.retain(|s| s.exercise_id != exercise_id);
    }
}

impl Store for LocalStore {
    fn list_exercises(&self, filter: &ExerciseFilter) -> StoreResult<Vec<Exercise>> {
        let db = self.load()?;
        let ids = matching_exercise_ids(&db.categories, &db.sections, filter);
        let mut out: Vec<Exercise> = db
            .exercises
            .into_iter()
            .filter(|e| ids.as_ref().map(|ids| ids.contains(&e.id)).unwrap_or(true))
            .collect();
        sort_exercises(&mut out);
        Ok(out)
    }

    fn get_exercise(&self, exercise_id: &str) -> StoreResult<Option<Exercise>> {
        let db = self.load()?;
        Ok(db.exercises.into_iter().find(|e| e.id == exercise_id))
    }

    fn exercise_categories(&self, exercise_id: &str) -> StoreResult<Vec<ExerciseCategory>> {
        let db = self.load()?;
        Ok(db
            .categories
            .into_iter()
            .filter(|c| c.exercise_id == exercise_id)
            .collect())
    }

    fn exercise_sections(&self, exercise_id: &str) -> StoreResult<Vec<Section>> {
        let db = self.load()?;
        let mut out: Vec<Section> = db
            .sections
            .into_iter()
            .filter(|s| s.exercise_id == exercise_id)
            .map(|s| s.section)
            .collect();
        out.sort();
        out.dedup();
        Ok(out)
    }

    fn add_exercise(&self, input: &ExerciseInput) -> StoreResult<String> {
        let mut db = self.load()?;
        let id = Uuid::new_v4().to_string();
        db.exercises.push(Exercise {
            id: id.clone(),
            name: input.name.clone(),
            description: input.description.clone(),
            location: input.location,
            materials: input.materials.clone(),
        });
        Self::push_tags(&mut db, &id, input);
        self.save(&db)?;
        Ok(id)
    }

    fn update_exercise(&self, exercise_id: &str, input: &ExerciseInput) -> StoreResult<bool> {
        let mut db = self.load()?;
        let Some(ex) = db.exercises.iter_mut().find(|e| e.id == exercise_id) else {
            return Ok(false);
        };
        ex.name = input.name.clone();
        ex.description = input.description.clone();
        ex.location = input.location;
        ex.materials = input.materials.clone();
        Self::drop_tags(&mut db, exercise_id);
        Self::push_tags(&mut db, exercise_id, input);
        self.save(&db)?;
        Ok(true)
    }

    fn delete_exercise(&self, exercise_id: &str) -> StoreResult<bool> {
        let mut db = self.load()?;
        let before = db.exercises.len();
        db.exercises.retain(|e| e.id != exercise_id);
        let removed = db.exercises.len() != before;
        Self::drop_tags(&mut db, exercise_id);
        self.save(&db)?;
        Ok(removed)
    }

    fn list_resources(&self, resource_type: &str) -> StoreResult<Vec<Resource>> {
        let db = self.load()?;
        let mut out: Vec<Resource> = db
            .resources
            .into_iter()
            .filter(|r| r.resource_type == resource_type)
            .collect();
        sort_resources(&mut out);
        Ok(out)
    }

    fn add_resource(&self, resource_type: &str, value: &str) -> StoreResult<Resource> {
        let value = resource_value(resource_type, value)?;
        let mut db = self.load()?;
        let resource = Resource {
            id: Uuid::new_v4().to_string(),
            resource_type: resource_type.to_string(),
            value,
        };
        db.resources.push(resource.clone());
        self.save(&db)?;
        Ok(resource)
    }

    fn delete_resource(&self, resource_id: &str) -> StoreResult<bool> {
        let mut db = self.load()?;
        let before = db.resources.len();
        db.resources.retain(|r| r.id != resource_id);
        let removed = db.resources.len() != before;
        if removed {
            self.save(&db)?;
        }
        Ok(removed)
    }

    fn series_for_teacher(&self, teacher_id: &str) -> StoreResult<Vec<LessonSeries>> {
        let db = self.load()?;
        let mut out: Vec<LessonSeries> = db
            .series
            .into_iter()
            .filter(|s| s.teacher_id == teacher_id)
            .collect();
        // Newest first; `created_at` is RFC 3339 so it sorts lexically.
        out.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(out)
    }

    fn create_series(&self, input: &SeriesInput) -> StoreResult<LessonSeries> {
        let mut db = self.load()?;
        let series = LessonSeries {
            id: Uuid::new_v4().to_string(),
            teacher_id: input.teacher_id.clone(),
            school_id: input.school_id.clone(),
            class_name: input.class_name.clone(),
            subject: input.subject.clone(),
            school_year: input.school_year.clone(),
            created_at: Some(Utc::now().to_rfc3339()),
        };
        db.series.push(series.clone());
        self.save(&db)?;
        Ok(series)
    }

    fn last_lessons(&self, series_id: &str, limit: usize) -> StoreResult<Vec<JsonValue>> {
        let db = self.load()?;
        let plans: Vec<LessonPlan> = db
            .plans
            .into_iter()
            .filter(|p| p.series_id == series_id)
            .collect();
        Ok(recent_contents(plans, limit))
    }

    fn next_sequence_index(&self, series_id: &str) -> StoreResult<i64> {
        let db = self.load()?;
        Ok(db
            .plans
            .iter()
            .filter(|p| p.series_id == series_id)
            .map(|p| p.sequence_index)
            .max()
            .map(|max| max + 1)
            .unwrap_or(1))
    }

    fn add_lesson_plan(&self, plan: &LessonPlan) -> StoreResult<LessonPlan> {
        let mut db = self.load()?;
        let mut stored = plan.clone();
        if stored.id.is_none() {
            stored.id = Some(Uuid::new_v4().to_string());
        }
        db.plans.push(stored.clone());
        self.save(&db)?;
        Ok(stored)
    }
}
