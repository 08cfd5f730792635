//! Layered configuration for a planner workspace.
//!
//! Sources, highest priority first:
//! 1. Environment variables with the `LESSONPLAN_` prefix, `__` between
//!    section and key (`LESSONPLAN_BACKEND__URL` -> `backend.url`)
//! 2. `<workspace>/secrets.toml`
//! 3. Built-in defaults

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const SECRETS_FILE: &str = "secrets.toml";
pub const ENV_PREFIX: &str = "LESSONPLAN_";

pub const DEFAULT_ADMIN_PASSWORD: &str = "admin";
const DEFAULT_AI_URL: &str = "https://api.groq.com/openai/v1/chat/completions";
const DEFAULT_AI_MODEL: &str = "llama-3.1-8b-instant";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration error: {0}")]
    Figment(#[from] figment::Error),
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct PlannerConfig {
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub ai: AiConfig,
    #[serde(default)]
    pub admin: AdminConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

/// Hosted REST data store.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct BackendConfig {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub key: String,
}

impl BackendConfig {
    pub fn is_configured(&self) -> bool {
        !self.url.trim().is_empty() && !self.key.trim().is_empty()
    }
}

fn default_ai_url() -> String {
    DEFAULT_AI_URL.to_string()
}

fn default_ai_model() -> String {
    DEFAULT_AI_MODEL.to_string()
}

const fn default_temperature() -> f32 {
    0.7
}

const fn default_timeout_secs() -> u64 {
    60
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AiConfig {
    #[serde(default = "default_ai_url")]
    pub url: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_ai_model")]
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            url: default_ai_url(),
            api_key: String::new(),
            model: default_ai_model(),
            temperature: default_temperature(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl AiConfig {
    pub fn is_configured(&self) -> bool {
        !self.api_key.trim().is_empty() && !self.url.trim().is_empty()
    }
}

fn default_admin_password() -> String {
    DEFAULT_ADMIN_PASSWORD.to_string()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AdminConfig {
    #[serde(default = "default_admin_password")]
    pub password: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            password: default_admin_password(),
        }
    }
}

fn default_data_file() -> String {
    "data/db.json".to_string()
}

fn default_output_dir() -> String {
    "output".to_string()
}

/// Paths are resolved against the workspace unless absolute.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    #[serde(default = "default_data_file")]
    pub data_file: String,
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_file: default_data_file(),
            output_dir: default_output_dir(),
        }
    }
}

impl StorageConfig {
    pub fn data_file_in(&self, workspace: &Path) -> PathBuf {
        workspace.join(&self.data_file)
    }

    pub fn output_dir_in(&self, workspace: &Path) -> PathBuf {
        workspace.join(&self.output_dir)
    }
}

impl PlannerConfig {
    pub fn load(workspace: &Path) -> Result<Self, ConfigError> {
        Self::figment(workspace).extract().map_err(ConfigError::from)
    }

    pub fn figment(workspace: &Path) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        let secrets = workspace.join(SECRETS_FILE);
        if secrets.exists() {
            figment = figment.merge(Toml::file(secrets));
        }
        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }
}
