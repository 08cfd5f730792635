use crate::config::PlannerConfig;
use crate::draft::LessonDraft;
use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::store::{self, Source};
use serde_json::json;
use std::path::PathBuf;

fn handle_health(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(
        &req.id,
        json!({
            "version": env!("CARGO_PKG_VERSION"),
            "workspacePath": state.workspace.as_ref().map(|p| p.to_string_lossy().to_string()),
            "remoteConfigured": state.store.as_ref().map(|s| s.remote_configured()).unwrap_or(false),
            "lastSource": state
                .store
                .as_ref()
                .and_then(|s| s.last_source())
                .map(Source::as_str),
            "aiConfigured": state.config.ai.is_configured(),
            "adminUnlocked": state.admin_unlocked,
        }),
    )
}

fn handle_workspace_select(state: &mut AppState, req: &Request) -> serde_json::Value {
    let p = req
        .params
        .get("path")
        .and_then(|v| v.as_str())
        .map(PathBuf::from);
    let Some(path) = p else {
        return err(&req.id, "bad_params", "missing params.path", None);
    };

    if let Err(e) = std::fs::create_dir_all(&path) {
        return err(&req.id, "store_failed", e.to_string(), None);
    }
    let config = match PlannerConfig::load(&path) {
        Ok(c) => c,
        Err(e) => return err(&req.id, "config_failed", e.to_string(), None),
    };
    let backend = match store::open_backend(&path, &config) {
        Ok(b) => b,
        Err(e) => return err(&req.id, "store_failed", format!("{e:?}"), None),
    };
    let output_dir = config.storage.output_dir_in(&path);
    if let Err(e) = std::fs::create_dir_all(&output_dir) {
        return err(&req.id, "store_failed", e.to_string(), None);
    }

    log::info!("workspace opened at {}", path.to_string_lossy());
    let remote_configured = backend.remote_configured();
    state.workspace = Some(path.clone());
    state.config = config;
    state.store = Some(backend);
    state.draft = LessonDraft::default();
    state.admin_unlocked = false;

    ok(
        &req.id,
        json!({
            "workspacePath": path.to_string_lossy(),
            "remoteConfigured": remote_configured,
            "outputDir": output_dir.to_string_lossy(),
        }),
    )
}

fn handle_admin_unlock(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(password) = req.params.get("password").and_then(|v| v.as_str()) else {
        return err(&req.id, "bad_params", "missing password", None);
    };
    if password != state.config.admin.password {
        log::warn!("rejected admin unlock attempt");
        return err(&req.id, "unauthorized", "wrong admin password", None);
    }
    state.admin_unlocked = true;
    ok(&req.id, json!({ "adminUnlocked": true }))
}

fn handle_admin_lock(state: &mut AppState, req: &Request) -> serde_json::Value {
    state.admin_unlocked = false;
    ok(&req.id, json!({ "adminUnlocked": false }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "health" => Some(handle_health(state, req)),
        "workspace.select" => Some(handle_workspace_select(state, req)),
        "admin.unlock" => Some(handle_admin_unlock(state, req)),
        "admin.lock" => Some(handle_admin_lock(state, req)),
        _ => None,
    }
}
