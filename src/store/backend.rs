use super::model::{
    Exercise, ExerciseCategory, ExerciseFilter, ExerciseInput, LessonPlan, LessonSeries, Resource,
    Section, SeriesInput,
};
use super::{LocalStore, RemoteStore, Store, StoreResult};
use serde_json::Value as JsonValue;
use std::cell::Cell;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Remote,
    Local,
}

impl Source {
    pub fn as_str(self) -> &'static str {
        match self {
            Source::Remote => "remote",
            Source::Local => "local",
        }
    }
}

/// Remote store when configured, local JSON file otherwise or whenever a
/// remote call fails. Writes are never mirrored between the two.
pub struct Backend {
    remote: Option<RemoteStore>,
    local: LocalStore,
    last_source: Cell<Option<Source>>,
}

impl Backend {
    pub fn new(remote: Option<RemoteStore>, local: LocalStore) -> Self {
        Self {
            remote,
            local,
            last_source: Cell::new(None),
        }
    }

    pub fn remote_configured(&self) -> bool {
        self.remote.is_some()
    }

    /// Which store answered the most recent call, `None` before the first one.
    pub fn last_source(&self) -> Option<Source> {
        self.last_source.get()
    }

    fn run<T>(
        &self,
        op: &str,
        remote: impl FnOnce(&RemoteStore) -> StoreResult<T>,
        local: impl FnOnce(&LocalStore) -> StoreResult<T>,
    ) -> StoreResult<T> {
        if let Some(r) = &self.remote {
            match remote(r) {
                Ok(v) => {
                    self.last_source.set(Some(Source::Remote));
                    return Ok(v);
                }
                Err(e) => {
                    log::warn!("remote store failed during {op}, using local file: {e}");
                }
            }
        }
        self.last_source.set(Some(Source::Local));
        local(&self.local)
    }
}

impl Store for Backend {
    fn list_exercises(&self, filter: &ExerciseFilter) -> StoreResult<Vec<Exercise>> {
        self.run(
            "list_exercises",
            |r| r.list_exercises(filter),
            |l| l.list_exercises(filter),
        )
    }

    fn get_exercise(&self, exercise_id: &str) -> StoreResult<Option<Exercise>> {
        self.run(
            "get_exercise",
            |r| r.get_exercise(exercise_id),
            |l| l.get_exercise(exercise_id),
        )
    }

    fn exercise_categories(&self, exercise_id: &str) -> StoreResult<Vec<ExerciseCategory>> {
        self.run(
            "exercise_categories",
            |r| r.exercise_categories(exercise_id),
            |l| l.exercise_categories(exercise_id),
        )
    }

    fn exercise_sections(&self, exercise_id: &str) -> StoreResult<Vec<Section>> {
        self.run(
            "exercise_sections",
            |r| r.exercise_sections(exercise_id),
            |l| l.exercise_sections(exercise_id),
        )
    }

    fn add_exercise(&self, input: &ExerciseInput) -> StoreResult<String> {
        self.run("add_exercise", |r| r.add_exercise(input), |l| l.add_exercise(input))
    }

    fn update_exercise(&self, exercise_id: &str, input: &ExerciseInput) -> StoreResult<bool> {
        self.run(
            "update_exercise",
            |r| r.update_exercise(exercise_id, input),
            |l| l.update_exercise(exercise_id, input),
        )
    }

    fn delete_exercise(&self, exercise_id: &str) -> StoreResult<bool> {
        self.run(
            "delete_exercise",
            |r| r.delete_exercise(exercise_id),
            |l| l.delete_exercise(exercise_id),
        )
    }

    fn list_resources(&self, resource_type: &str) -> StoreResult<Vec<Resource>> {
        self.run(
            "list_resources",
            |r| r.list_resources(resource_type),
            |l| l.list_resources(resource_type),
        )
    }

    fn add_resource(&self, resource_type: &str, value: &str) -> StoreResult<Resource> {
        self.run(
            "add_resource",
            |r| r.add_resource(resource_type, value),
            |l| l.add_resource(resource_type, value),
        )
    }

    fn delete_resource(&self, resource_id: &str) -> StoreResult<bool> {
        self.run(
            "delete_resource",
            |r| r.delete_resource(resource_id),
            |l| l.delete_resource(resource_id),
        )
    }

    fn series_for_teacher(&self, teacher_id: &str) -> StoreResult<Vec<LessonSeries>> {
        self.run(
            "series_for_teacher",
            |r| r.series_for_teacher(teacher_id),
            |l| l.series_for_teacher(teacher_id),
        )
    }

    fn create_series(&self, input: &SeriesInput) -> StoreResult<LessonSeries> {
        self.run("create_series", |r| r.create_series(input), |l| l.create_series(input))
    }

    fn last_lessons(&self, series_id: &str, limit: usize) -> StoreResult<Vec<JsonValue>> {
        self.run(
            "last_lessons",
            |r| r.last_lessons(series_id, limit),
            |l| l.last_lessons(series_id, limit),
        )
    }

    fn next_sequence_index(&self, series_id: &str) -> StoreResult<i64> {
        self.run(
            "next_sequence_index",
            |r| r.next_sequence_index(series_id),
            |l| l.next_sequence_index(series_id),
        )
    }

    fn add_lesson_plan(&self, plan: &LessonPlan) -> StoreResult<LessonPlan> {
        self.run("add_lesson_plan", |r| r.add_lesson_plan(plan), |l| l.add_lesson_plan(plan))
    }
}
