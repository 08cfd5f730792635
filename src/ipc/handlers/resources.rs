use crate::catalog::normalize_resource_value;
use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{require_admin, required_str, store, store_err};
use crate::ipc::types::{AppState, Request};
use crate::store::model::Resource;
use crate::store::Store;
use serde_json::{json, Value as JsonValue};

fn resource_json(r: &Resource) -> JsonValue {
    json!({
        "id": r.id,
        "resourceType": r.resource_type,
        "value": r.value,
    })
}

fn handle_resources_list(state: &mut AppState, req: &Request) -> JsonValue {
    let backend = match store(state, req) {
        Ok(b) => b,
        Err(e) => return e,
    };
    let resource_type = match required_str(req, "resourceType") {
        Ok(v) => v,
        Err(e) => return e,
    };
    match backend.list_resources(&resource_type) {
        Ok(rows) => {
            let resources: Vec<JsonValue> = rows.iter().map(resource_json).collect();
            ok(&req.id, json!({ "resources": resources }))
        }
        Err(e) => store_err(req, e),
    }
}

fn handle_resources_create(state: &mut AppState, req: &Request) -> JsonValue {
    if let Err(e) = require_admin(state, req) {
        return e;
    }
    let backend = match store(state, req) {
        Ok(b) => b,
        Err(e) => return e,
    };
    let resource_type = match required_str(req, "resourceType") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let raw = req
        .params
        .get("value")
        .and_then(|v| v.as_str())
        .unwrap_or("");
    let Some(value) = normalize_resource_value(raw) else {
        return err(&req.id, "bad_params", "value must not be empty", None);
    };
    match backend.add_resource(&resource_type, &value) {
        Ok(r) => {
            log::info!("added {} resource {:?}", r.resource_type, r.value);
            ok(&req.id, json!({ "resource": resource_json(&r) }))
        }
        Err(e) => store_err(req, e),
    }
}

fn handle_resources_delete(state: &mut AppState, req: &Request) -> JsonValue {
    if let Err(e) = require_admin(state, req) {
        return e;
    }
    let backend = match store(state, req) {
        Ok(b) => b,
        Err(e) => return e,
    };
    let resource_id = match required_str(req, "resourceId") {
        Ok(v) => v,
        Err(e) => return e,
    };
    match backend.delete_resource(&resource_id) {
        Ok(true) => ok(&req.id, json!({ "ok": true })),
        Ok(false) => err(&req.id, "not_found", "resource not found", None),
        Err(e) => store_err(req, e),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<JsonValue> {
    match req.method.as_str() {
        "resources.list" => Some(handle_resources_list(state, req)),
        "resources.create" => Some(handle_resources_create(state, req)),
        "resources.delete" => Some(handle_resources_delete(state, req)),
        _ => None,
    }
}
