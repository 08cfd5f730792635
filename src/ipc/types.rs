use std::path::PathBuf;

use serde::Deserialize;

use crate::config::PlannerConfig;
use crate::draft::LessonDraft;
use crate::store::Backend;

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

/// Everything one planner session remembers between requests.
#[derive(Default)]
pub struct AppState {
    pub workspace: Option<PathBuf>,
    pub config: PlannerConfig,
    pub store: Option<Backend>,
    pub draft: LessonDraft,
    pub admin_unlocked: bool,
}

impl AppState {
    pub fn output_dir(&self) -> Option<PathBuf> {
        self.workspace
            .as_ref()
            .map(|ws| self.config.storage.output_dir_in(ws))
    }
}
