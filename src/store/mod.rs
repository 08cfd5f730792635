mod backend;
mod error;
mod local;
pub mod model;
mod remote;

pub use backend::{Backend, Source};
pub use error::{StoreError, StoreResult};
pub use local::LocalStore;
pub use remote::RemoteStore;

use model::{
    Exercise, ExerciseCategory, ExerciseFilter, ExerciseInput, ExerciseSection, LessonPlan,
    LessonSeries, Resource, Section, SeriesInput,
};
use crate::config::PlannerConfig;
use anyhow::Context;
use serde_json::Value as JsonValue;
use std::collections::HashSet;
use std::path::Path;

pub const DEFAULT_RECENT_LESSONS: usize = 3;

/// Data-access operations shared by the remote backend and the local JSON file.
///
/// Both implementations must give the same answers for the same inputs so the
/// fallback path is indistinguishable from the remote one.
pub trait Store {
    fn list_exercises(&self, filter: &ExerciseFilter) -> StoreResult<Vec<Exercise>>;
    fn get_exercise(&self, exercise_id: &str) -> StoreResult<Option<Exercise>>;
    fn exercise_categories(&self, exercise_id: &str) -> StoreResult<Vec<ExerciseCategory>>;
    fn exercise_sections(&self, exercise_id: &str) -> StoreResult<Vec<Section>>;
    fn add_exercise(&self, input: &ExerciseInput) -> StoreResult<String>;
    /// Returns false when no exercise has that id.
    fn update_exercise(&self, exercise_id: &str, input: &ExerciseInput) -> StoreResult<bool>;
    /// Removes the exercise together with its category and section rows.
    fn delete_exercise(&self, exercise_id: &str) -> StoreResult<bool>;

    fn list_resources(&self, resource_type: &str) -> StoreResult<Vec<Resource>>;
    fn add_resource(&self, resource_type: &str, value: &str) -> StoreResult<Resource>;
    fn delete_resource(&self, resource_id: &str) -> StoreResult<bool>;

    fn series_for_teacher(&self, teacher_id: &str) -> StoreResult<Vec<LessonSeries>>;
    fn create_series(&self, input: &SeriesInput) -> StoreResult<LessonSeries>;
    /// Content blobs of the `limit` most recent plans, oldest first.
    fn last_lessons(&self, series_id: &str, limit: usize) -> StoreResult<Vec<JsonValue>>;
    fn next_sequence_index(&self, series_id: &str) -> StoreResult<i64>;
    fn add_lesson_plan(&self, plan: &LessonPlan) -> StoreResult<LessonPlan>;
}

/// Trimmed resource value; blank values are refused so no store ever keeps one.
pub(crate) fn resource_value(resource_type: &str, value: &str) -> StoreResult<String> {
    crate::catalog::normalize_resource_value(value)
        .ok_or_else(|| StoreError::EmptyValue(resource_type.to_string()))
}

/// Builds the storage backend for a workspace. The remote store is attached
/// only when both its URL and key are configured.
pub fn open_backend(workspace: &Path, config: &PlannerConfig) -> anyhow::Result<Backend> {
    let data_file = config.storage.data_file_in(workspace);
    if let Some(parent) = data_file.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.to_string_lossy()))?;
    }
    let local = LocalStore::new(data_file);

    let remote = if config.backend.is_configured() {
        match RemoteStore::new(&config.backend.url, &config.backend.key) {
            Ok(r) => {
                log::info!("using remote store at {}", r.base_url());
                Some(r)
            }
            Err(e) => {
                log::warn!("remote store client could not be built, using local file only: {e}");
                None
            }
        }
    } else {
        log::info!(
            "remote store not configured, using {}",
            local.path().to_string_lossy()
        );
        None
    };

    Ok(Backend::new(remote, local))
}

/// Ids of exercises whose tag rows satisfy the filter, or `None` when the
/// filter has no tag constraints at all.
pub(crate) fn matching_exercise_ids(
    categories: &[ExerciseCategory],
    sections: &[ExerciseSection],
    filter: &ExerciseFilter,
) -> Option<HashSet<String>> {
    let mut ids: Option<HashSet<String>> = None;
    if filter.has_category_filter() {
        ids = Some(
            categories
                .iter()
                .filter(|c| filter.matches_category(c))
                .map(|c| c.exercise_id.clone())
                .collect(),
        );
    }
    if let Some(section) = filter.section {
        let by_section: HashSet<String> = sections
            .iter()
            .filter(|s| s.section == section)
            .map(|s| s.exercise_id.clone())
            .collect();
        ids = Some(match ids {
            Some(prev) => prev.intersection(&by_section).cloned().collect(),
            None => by_section,
        });
    }
    ids
}

pub(crate) fn sort_exercises(exercises: &mut [Exercise]) {
    exercises.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
}

pub(crate) fn sort_resources(resources: &mut [Resource]) {
    resources.sort_by(|a, b| a.value.cmp(&b.value).then_with(|| a.id.cmp(&b.id)));
}

/// Orders plans by descending sequence index, keeps `limit`, and returns their
/// contents in ascending order.
pub(crate) fn recent_contents(mut plans: Vec<LessonPlan>, limit: usize) -> Vec<JsonValue> {
    plans.sort_by(|a, b| b.sequence_index.cmp(&a.sequence_index));
    plans.truncate(limit);
    plans.into_iter().rev().map(|p| p.content).collect()
}
