use crate::ipc::error::err;
use crate::ipc::types::{AppState, Request};
use crate::store::{Backend, StoreError};
use serde_json::Value as JsonValue;

pub fn store<'a>(state: &'a AppState, req: &Request) -> Result<&'a Backend, JsonValue> {
    state
        .store
        .as_ref()
        .ok_or_else(|| err(&req.id, "no_workspace", "select a workspace first", None))
}

pub fn require_admin(state: &AppState, req: &Request) -> Result<(), JsonValue> {
    if state.admin_unlocked {
        Ok(())
    } else {
        Err(err(
            &req.id,
            "unauthorized",
            "administration is locked; call admin.unlock first",
            None,
        ))
    }
}

pub fn required_str(req: &Request, key: &str) -> Result<String, JsonValue> {
    req.params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|v| v.trim().to_string())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| err(&req.id, "bad_params", format!("missing {}", key), None))
}

pub fn parse_opt_string(v: Option<&JsonValue>) -> Result<Option<String>, &'static str> {
    match v {
        None => Ok(None),
        Some(v) if v.is_null() => Ok(None),
        Some(v) => {
            let s = v.as_str().ok_or("must be string or null")?.trim().to_string();
            if s.is_empty() {
                Ok(None)
            } else {
                Ok(Some(s))
            }
        }
    }
}

pub fn parse_string_array(v: Option<&JsonValue>) -> Result<Vec<String>, &'static str> {
    match v {
        None => Ok(Vec::new()),
        Some(v) if v.is_null() => Ok(Vec::new()),
        Some(v) => {
            let arr = v.as_array().ok_or("must be array of strings")?;
            let mut out = Vec::with_capacity(arr.len());
            for item in arr {
                let s = item
                    .as_str()
                    .ok_or("must be array of strings")?
                    .trim()
                    .to_string();
                if !s.is_empty() && !out.contains(&s) {
                    out.push(s);
                }
            }
            Ok(out)
        }
    }
}

pub fn store_err(req: &Request, e: StoreError) -> JsonValue {
    err(&req.id, "store_failed", e.to_string(), None)
}
