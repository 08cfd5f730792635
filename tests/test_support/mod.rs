#![allow(dead_code)]

use serde_json::{json, Value};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::io::{BufRead, BufReader, Read, Write};
use std::path::PathBuf;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::sync::{Arc, Mutex};

pub const REMOTE_KEY: &str = "anon-test-key";
pub const AI_KEY: &str = "sk-test";

pub fn temp_dir(prefix: &str) -> PathBuf {
    let dir = tempfile::Builder::new()
        .prefix(prefix)
        .tempdir()
        .expect("create temp dir");
    // Kept on disk so the sidecar can keep using it after this returns.
    dir.keep()
}

pub fn spawn_sidecar() -> (Child, ChildStdin, BufReader<ChildStdout>) {
    spawn_sidecar_with_env(&[])
}

/// Starts the sidecar with only the given `LESSONPLAN_*` variables set.
pub fn spawn_sidecar_with_env(
    vars: &[(&str, String)],
) -> (Child, ChildStdin, BufReader<ChildStdout>) {
    let exe = env!("CARGO_BIN_EXE_lessonplannerd");
    let mut cmd = Command::new(exe);
    for (key, _) in std::env::vars() {
        if key.starts_with("LESSONPLAN_") {
            cmd.env_remove(key);
        }
    }
    for (key, value) in vars {
        cmd.env(key, value);
    }
    let mut child = cmd
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn lessonplannerd");
    let stdin = child.stdin.take().expect("child stdin");
    let stdout = child.stdout.take().expect("child stdout");
    (child, stdin, BufReader::new(stdout))
}

pub fn remote_env(base_url: &str) -> Vec<(&'static str, String)> {
    vec![
        ("LESSONPLAN_BACKEND__URL", base_url.to_string()),
        ("LESSONPLAN_BACKEND__KEY", REMOTE_KEY.to_string()),
    ]
}

pub fn ai_env(url: &str) -> Vec<(&'static str, String)> {
    vec![
        ("LESSONPLAN_AI__URL", url.to_string()),
        ("LESSONPLAN_AI__API_KEY", AI_KEY.to_string()),
        ("LESSONPLAN_AI__TIMEOUT_SECS", "5".to_string()),
    ]
}

pub fn request(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: Value,
) -> Value {
    let payload = json!({
        "id": id,
        "method": method,
        "params": params,
    });
    writeln!(stdin, "{}", payload).expect("write request");
    stdin.flush().expect("flush request");

    let mut line = String::new();
    reader.read_line(&mut line).expect("read response line");
    assert!(!line.trim().is_empty(), "empty response for {}", method);
    let value: Value = serde_json::from_str(line.trim()).expect("parse response json");
    assert_eq!(value.get("id").and_then(|v| v.as_str()), Some(id));
    value
}

pub fn request_ok(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: Value,
) -> Value {
    let value = request(stdin, reader, id, method, params);
    assert_eq!(
        value.get("ok").and_then(|v| v.as_bool()),
        Some(true),
        "{} failed: {}",
        method,
        value
    );
    value.get("result").cloned().unwrap_or(Value::Null)
}

/// Returns the error code of a request that must fail.
pub fn request_err(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: Value,
) -> String {
    let value = request(stdin, reader, id, method, params);
    assert_eq!(
        value.get("ok").and_then(|v| v.as_bool()),
        Some(false),
        "{} unexpectedly succeeded: {}",
        method,
        value
    );
    value
        .get("error")
        .and_then(|e| e.get("code"))
        .and_then(|v| v.as_str())
        .unwrap_or("")
        .to_string()
}

pub fn str_field(v: &Value, key: &str) -> String {
    v.get(key)
        .and_then(|v| v.as_str())
        .unwrap_or_else(|| panic!("missing string field {key} in {v}"))
        .to_string()
}

pub fn names(list: &Value, key: &str) -> Vec<String> {
    list.get(key)
        .and_then(|v| v.as_array())
        .map(|arr| {
            arr.iter()
                .filter_map(|v| v.get("name").and_then(|n| n.as_str()))
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Opens a fresh workspace and unlocks administration.
pub fn open_admin_workspace(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    prefix: &str,
) -> PathBuf {
    let workspace = temp_dir(prefix);
    request_ok(
        stdin,
        reader,
        "ws",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    request_ok(
        stdin,
        reader,
        "unlock",
        "admin.unlock",
        json!({ "password": "admin" }),
    );
    workspace
}

/// A port nothing listens on.
pub fn closed_port_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().expect("addr").port();
    drop(listener);
    format!("http://127.0.0.1:{port}")
}

fn percent_decode(raw: &str) -> String {
    let bytes = raw.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'+' => out.push(b' '),
            b'%' if i + 2 < bytes.len() => {
                let hex = std::str::from_utf8(&bytes[i + 1..i + 3]).unwrap_or("");
                match u8::from_str_radix(hex, 16) {
                    Ok(b) => {
                        out.push(b);
                        i += 2;
                    }
                    Err(_) => out.push(b'%'),
                }
            }
            b => out.push(b),
        }
        i += 1;
    }
    String::from_utf8_lossy(&out).to_string()
}

fn parse_query(url: &str) -> (String, Vec<(String, String)>) {
    let (path, query) = url.split_once('?').unwrap_or((url, ""));
    let pairs = query
        .split('&')
        .filter(|p| !p.is_empty())
        .map(|p| {
            let (k, v) = p.split_once('=').unwrap_or((p, ""));
            (percent_decode(k), percent_decode(v))
        })
        .collect();
    (path.to_string(), pairs)
}

fn cell_text(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn parse_in_list(raw: &str) -> Vec<String> {
    let inner = raw.trim_start_matches('(').trim_end_matches(')');
    let mut out = Vec::new();
    let mut cur = String::new();
    let mut quoted = false;
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' if quoted => {
                if let Some(n) = chars.next() {
                    cur.push(n);
                }
            }
            '"' => quoted = !quoted,
            ',' if !quoted => out.push(std::mem::take(&mut cur)),
            c => cur.push(c),
        }
    }
    if !inner.is_empty() {
        out.push(cur);
    }
    out
}

fn row_matches(row: &Value, filters: &[(String, String)]) -> bool {
    filters.iter().all(|(col, cond)| {
        let cell = cell_text(row.get(col).unwrap_or(&Value::Null));
        if let Some(v) = cond.strip_prefix("eq.") {
            cell == v
        } else if let Some(list) = cond.strip_prefix("in.") {
            parse_in_list(list).contains(&cell)
        } else {
            false
        }
    })
}

fn compare_cells(a: &Value, b: &Value) -> Ordering {
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
        _ => cell_text(a).cmp(&cell_text(b)),
    }
}

#[derive(Default)]
struct FakeDb {
    tables: HashMap<String, Vec<Value>>,
    next_id: i64,
}

/// In-process PostgREST stand-in: `eq.`/`in.` filters, `order`, `limit`,
/// and POST/PATCH/DELETE with `return=representation`. Ids are integers.
pub struct FakeRest {
    pub base_url: String,
    requests: Arc<Mutex<usize>>,
    db: Arc<Mutex<FakeDb>>,
}

impl FakeRest {
    pub fn start() -> Self {
        let server = tiny_http::Server::http("127.0.0.1:0").expect("bind fake rest");
        let port = server
            .server_addr()
            .to_ip()
            .map(|a| a.port())
            .expect("fake rest port");
        let requests = Arc::new(Mutex::new(0usize));
        let counter = Arc::clone(&requests);
        let db = Arc::new(Mutex::new(FakeDb::default()));
        let shared = Arc::clone(&db);
        std::thread::spawn(move || {
            for mut request in server.incoming_requests() {
                *counter.lock().expect("counter") += 1;
                let authed = request
                    .headers()
                    .iter()
                    .any(|h| h.field.equiv("apikey") && h.value.as_str() == REMOTE_KEY);
                let (status, body) = if authed {
                    let mut raw = String::new();
                    let _ = request.as_reader().read_to_string(&mut raw);
                    let method = request.method().to_string();
                    let url = request.url().to_string();
                    shared.lock().expect("fake db").handle(&method, &url, &raw)
                } else {
                    (401, json!({ "message": "missing api key" }))
                };
                let response = tiny_http::Response::from_string(body.to_string())
                    .with_status_code(status)
                    .with_header(
                        tiny_http::Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..])
                            .expect("header"),
                    );
                let _ = request.respond(response);
            }
        });
        Self {
            base_url: format!("http://127.0.0.1:{port}"),
            requests,
            db,
        }
    }

    /// Inserts rows as-is, the way another client of the hosted tables would.
    pub fn seed(&self, table: &str, rows: Vec<Value>) {
        let mut db = self.db.lock().expect("fake db");
        for row in &rows {
            if let Some(id) = row.get("id").and_then(|v| v.as_i64()) {
                db.next_id = db.next_id.max(id);
            }
        }
        db.tables.entry(table.to_string()).or_default().extend(rows);
    }

    pub fn request_count(&self) -> usize {
        *self.requests.lock().expect("counter")
    }
}

impl FakeDb {
    fn handle(&mut self, method: &str, url: &str, body: &str) -> (u16, Value) {
        let (path, pairs) = parse_query(url);
        let Some(table) = path.strip_prefix("/rest/v1/") else {
            return (404, json!({ "message": "no such route" }));
        };
        let table = table.to_string();
        let mut order: Option<String> = None;
        let mut limit: Option<usize> = None;
        let mut filters = Vec::new();
        for (k, v) in pairs {
            match k.as_str() {
                "select" => {}
                "order" => order = Some(v),
                "limit" => limit = v.parse().ok(),
                _ => filters.push((k, v)),
            }
        }

        match method {
            "GET" => {
                let mut rows: Vec<Value> = self
                    .tables
                    .get(&table)
                    .map(|t| t.iter().filter(|r| row_matches(r, &filters)).cloned().collect())
                    .unwrap_or_default();
                if let Some(order) = order {
                    let keys: Vec<(String, bool)> = order
                        .split(',')
                        .map(|part| {
                            let (col, dir) = part.split_once('.').unwrap_or((part, "asc"));
                            (col.to_string(), dir == "desc")
                        })
                        .collect();
                    rows.sort_by(|a, b| {
                        for (col, desc) in &keys {
                            let ord = compare_cells(
                                a.get(col).unwrap_or(&Value::Null),
                                b.get(col).unwrap_or(&Value::Null),
                            );
                            let ord = if *desc { ord.reverse() } else { ord };
                            if ord != Ordering::Equal {
                                return ord;
                            }
                        }
                        Ordering::Equal
                    });
                }
                if let Some(n) = limit {
                    rows.truncate(n);
                }
                (200, Value::Array(rows))
            }
            "POST" => {
                let parsed: Value = match serde_json::from_str(body) {
                    Ok(v) => v,
                    Err(e) => return (400, json!({ "message": e.to_string() })),
                };
                let incoming = match parsed {
                    Value::Array(rows) => rows,
                    other => vec![other],
                };
                let mut created = Vec::new();
                for mut row in incoming {
                    self.next_id += 1;
                    row["id"] = json!(self.next_id);
                    if table == "lesson_series" {
                        row["created_at"] =
                            json!(format!("2026-09-01T08:00:{:02}+00:00", self.next_id % 60));
                    }
                    created.push(row.clone());
                    self.tables.entry(table.clone()).or_default().push(row);
                }
                (201, Value::Array(created))
            }
            "PATCH" => {
                let patch: Value = serde_json::from_str(body).unwrap_or(Value::Null);
                let mut changed = Vec::new();
                if let Some(rows) = self.tables.get_mut(&table) {
                    for row in rows.iter_mut().filter(|r| row_matches(r, &filters)) {
                        if let (Some(dst), Some(src)) = (row.as_object_mut(), patch.as_object()) {
                            for (k, v) in src {
                                dst.insert(k.clone(), v.clone());
                            }
                        }
                        changed.push(row.clone());
                    }
                }
                (200, Value::Array(changed))
            }
            "DELETE" => {
                let mut removed = Vec::new();
                if let Some(rows) = self.tables.get_mut(&table) {
                    let (gone, kept): (Vec<Value>, Vec<Value>) =
                        rows.drain(..).partition(|r| row_matches(r, &filters));
                    *rows = kept;
                    removed = gone;
                }
                (200, Value::Array(removed))
            }
            _ => (405, json!({ "message": "method not allowed" })),
        }
    }
}

/// Chat-completions stand-in. Replies with `reply_for(request_body)` wrapped
/// as the first choice's message content, or with HTTP 500 when it returns `None`.
pub struct MockAi {
    pub url: String,
    prompts: Arc<Mutex<Vec<Value>>>,
}

impl MockAi {
    pub fn start<F>(reply_for: F) -> Self
    where
        F: Fn(&Value) -> Option<String> + Send + 'static,
    {
        let server = tiny_http::Server::http("127.0.0.1:0").expect("bind mock ai");
        let port = server
            .server_addr()
            .to_ip()
            .map(|a| a.port())
            .expect("mock ai port");
        let prompts = Arc::new(Mutex::new(Vec::new()));
        let seen = Arc::clone(&prompts);
        std::thread::spawn(move || {
            for mut request in server.incoming_requests() {
                let mut raw = String::new();
                let _ = request.as_reader().read_to_string(&mut raw);
                let body: Value = serde_json::from_str(&raw).unwrap_or(Value::Null);
                seen.lock().expect("prompts").push(body.clone());
                let response = match reply_for(&body) {
                    Some(content) => tiny_http::Response::from_string(
                        json!({
                            "choices": [{ "message": { "role": "assistant", "content": content } }]
                        })
                        .to_string(),
                    )
                    .with_status_code(200),
                    None => tiny_http::Response::from_string("upstream exploded")
                        .with_status_code(500),
                };
                let _ = request.respond(response);
            }
        });
        Self {
            url: format!("http://127.0.0.1:{port}/v1/chat/completions"),
            prompts,
        }
    }

    /// Request bodies received so far.
    pub fn received(&self) -> Vec<Value> {
        self.prompts.lock().expect("prompts").clone()
    }
}
