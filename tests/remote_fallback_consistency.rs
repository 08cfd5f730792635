mod test_support;

use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::io::BufReader;
use std::process::{ChildStdin, ChildStdout};
use test_support::{
    closed_port_url, names, open_admin_workspace, remote_env, request_ok, spawn_sidecar,
    spawn_sidecar_with_env, str_field, FakeRest,
};

#[test]
fn remote_rows_with_null_columns_are_served_by_the_remote() {
    let rest = FakeRest::start();
    rest.seed(
        "exercises",
        vec![
            json!({ "id": 1, "name": "Relay", "description": null, "location": "gym", "materials": null }),
            json!({ "id": 2, "name": "Přeskoky", "description": "Skoky přes lavičku.", "location": "Tělocvična", "materials": ["lavička"] }),
            json!({ "id": 3, "name": "Kop na branku", "description": null, "location": "Hřiště", "materials": null }),
        ],
    );
    rest.seed(
        "exercise_sections",
        vec![
            json!({ "id": 4, "exercise_id": 1, "section": "main" }),
            json!({ "id": 5, "exercise_id": 3, "section": "main" }),
        ],
    );
    rest.seed(
        "resources",
        vec![
            json!({ "id": 6, "resource_type": "equipment", "value": "cones" }),
            json!({ "id": 7, "resource_type": "equipment", "value": null }),
        ],
    );
    rest.seed(
        "lesson_series",
        vec![json!({
            "id": 8,
            "teacher_id": "t-1",
            "school_id": null,
            "class_name": "3.A",
            "subject": null,
            "school_year": "2026/2027",
            "created_at": null
        })],
    );

    let (_child, mut stdin, mut reader) = spawn_sidecar_with_env(&remote_env(&rest.base_url));
    let workspace = open_admin_workspace(&mut stdin, &mut reader, "lessonplan-remote-nulls");
    let health = request_ok(&mut stdin, &mut reader, "h0", "health", json!({}));
    assert_eq!(health["lastSource"], Value::Null);

    let listed = request_ok(&mut stdin, &mut reader, "1", "exercises.list", json!({}));
    assert_eq!(listed["source"], json!("remote"));
    assert_eq!(
        listed["exercises"],
        json!([
            { "id": "3", "name": "Kop na branku", "description": "", "location": "field", "materials": [] },
            { "id": "2", "name": "Přeskoky", "description": "Skoky přes lavičku.", "location": "gym", "materials": ["lavička"] },
            { "id": "1", "name": "Relay", "description": "", "location": "gym", "materials": [] },
        ])
    );

    let main = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "exercises.list",
        json!({ "section": "main" }),
    );
    assert_eq!(names(&main, "exercises"), vec!["Kop na branku", "Relay"]);
    assert_eq!(main["source"], json!("remote"));

    let resources = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "resources.list",
        json!({ "resourceType": "equipment" }),
    );
    assert_eq!(resources["resources"].as_array().map(|a| a.len()), Some(1));
    assert_eq!(resources["resources"][0]["value"], json!("cones"));

    let series = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "series.list",
        json!({ "teacherId": "t-1" }),
    );
    assert_eq!(series["series"][0]["className"], json!("3.A"));
    assert_eq!(series["series"][0]["subject"], json!(""));

    let health = request_ok(&mut stdin, &mut reader, "h1", "health", json!({}));
    assert_eq!(health["lastSource"], json!("remote"));
    // Nothing fell through to the local file.
    assert!(!workspace.join("data").join("db.json").exists());
}

/// Runs the same catalog and series workload and returns everything a user
/// could observe, with backend-specific ids left out.
fn run_workload(stdin: &mut ChildStdin, reader: &mut BufReader<ChildStdout>) -> Vec<Value> {
    let mut seen = Vec::new();

    let exercises = [
        ("Shuttle run", "gym", "fitness", "speed", vec!["prep", "main"]),
        ("Ball relay", "field", "manipulation", "throwing", vec!["main"]),
        ("Animal walks", "both", "locomotion", "crawling", vec!["prep", "final"]),
        ("Sprint ladder", "gym", "fitness", "agility", vec!["main"]),
    ];
    let mut ids = Vec::new();
    for (i, (name, location, ct, sub, sections)) in exercises.iter().enumerate() {
        let created = request_ok(
            stdin,
            reader,
            &format!("ex{i}"),
            "exercises.create",
            json!({ "input": {
                "name": name,
                "description": format!("{name} description"),
                "location": location,
                "materials": ["cones"],
                "categories": [{ "constructType": ct, "subcategory": sub }],
                "sections": sections
            }}),
        );
        ids.push(str_field(&created, "exerciseId"));
    }

    for (i, filter) in [
        json!({}),
        json!({ "constructType": "fitness" }),
        json!({ "subcategory": "throwing" }),
        json!({ "section": "prep" }),
        json!({ "section": "main", "constructType": "fitness" }),
        json!({ "constructType": "fitness", "subcategory": "crawling" }),
    ]
    .into_iter()
    .enumerate()
    {
        let listed = request_ok(stdin, reader, &format!("list{i}"), "exercises.list", filter);
        seen.push(json!(names(&listed, "exercises")));
    }

    request_ok(stdin, reader, "del", "exercises.delete", json!({ "exerciseId": ids[0] }));
    let after_delete = request_ok(
        stdin,
        reader,
        "after-del",
        "exercises.list",
        json!({ "section": "prep" }),
    );
    seen.push(json!(names(&after_delete, "exercises")));

    for (i, value) in ["strength", " endurance ", "speed"].into_iter().enumerate() {
        request_ok(
            stdin,
            reader,
            &format!("res{i}"),
            "resources.create",
            json!({ "resourceType": "fitness", "value": value }),
        );
    }
    let subs = request_ok(
        stdin,
        reader,
        "subs",
        "catalog.subcategories",
        json!({ "constructType": "fitness" }),
    );
    seen.push(subs["subcategories"].clone());

    let series = request_ok(
        stdin,
        reader,
        "series",
        "series.create",
        json!({
            "teacherId": "t-1",
            "schoolId": "zs-lipova",
            "className": "3.A",
            "subject": "PE",
            "schoolYear": "2026/2027"
        }),
    );
    let series_id = str_field(&series["series"], "id");
    let first = request_ok(
        stdin,
        reader,
        "next0",
        "lessons.nextIndex",
        json!({ "seriesId": series_id }),
    );
    seen.push(first["sequenceIndex"].clone());
    for n in 1..=4 {
        request_ok(
            stdin,
            reader,
            &format!("lesson{n}"),
            "lessons.create",
            json!({ "seriesId": series_id, "date": format!("2026-09-0{n}"), "content": { "n": n } }),
        );
    }
    let next = request_ok(
        stdin,
        reader,
        "next1",
        "lessons.nextIndex",
        json!({ "seriesId": series_id }),
    );
    seen.push(next["sequenceIndex"].clone());
    let recent = request_ok(
        stdin,
        reader,
        "recent",
        "lessons.recent",
        json!({ "seriesId": series_id }),
    );
    seen.push(recent["lessons"].clone());

    seen
}

#[test]
fn local_file_answers_like_the_remote_store() {
    let rest = FakeRest::start();

    let (_remote_child, mut r_stdin, mut r_reader) =
        spawn_sidecar_with_env(&remote_env(&rest.base_url));
    let remote_ws = open_admin_workspace(&mut r_stdin, &mut r_reader, "lessonplan-remote");
    let remote_seen = run_workload(&mut r_stdin, &mut r_reader);
    let health = request_ok(&mut r_stdin, &mut r_reader, "h", "health", json!({}));
    assert_eq!(health["remoteConfigured"], json!(true));
    assert_eq!(health["lastSource"], json!("remote"));
    assert!(rest.request_count() > 0);
    // Remote writes are not mirrored into the local file.
    assert!(!remote_ws.join("data").join("db.json").exists());

    let (_local_child, mut l_stdin, mut l_reader) = spawn_sidecar();
    open_admin_workspace(&mut l_stdin, &mut l_reader, "lessonplan-local");
    let local_seen = run_workload(&mut l_stdin, &mut l_reader);
    let health = request_ok(&mut l_stdin, &mut l_reader, "h", "health", json!({}));
    assert_eq!(health["remoteConfigured"], json!(false));
    assert_eq!(health["lastSource"], json!("local"));

    assert_eq!(local_seen, remote_seen);
    assert_eq!(local_seen[0], json!(["Animal walks", "Ball relay", "Shuttle run", "Sprint ladder"]));
    assert_eq!(local_seen[5], json!([]));
}

#[test]
fn unreachable_remote_falls_back_to_local_file() {
    let (_child, mut stdin, mut reader) = spawn_sidecar_with_env(&remote_env(&closed_port_url()));
    let workspace = open_admin_workspace(&mut stdin, &mut reader, "lessonplan-fallback");

    let created = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "exercises.create",
        json!({ "input": { "name": "Relay", "location": "field", "sections": ["main"] } }),
    );
    let exercise_id = str_field(&created, "exerciseId");
    let health = request_ok(&mut stdin, &mut reader, "2", "health", json!({}));
    assert_eq!(health["remoteConfigured"], json!(true));
    assert_eq!(health["lastSource"], json!("local"));

    let listed = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "exercises.list",
        json!({ "section": "main" }),
    );
    assert_eq!(names(&listed, "exercises"), vec!["Relay"]);
    assert_eq!(listed["source"], json!("local"));

    let raw = std::fs::read_to_string(workspace.join("data").join("db.json")).expect("db file");
    let db: Value = serde_json::from_str(&raw).expect("db json");
    assert_eq!(db["exercises"][0]["id"], json!(exercise_id));
}

#[test]
fn rejected_remote_credentials_fall_back_to_local_file() {
    let rest = FakeRest::start();
    let mut env = remote_env(&rest.base_url);
    env[1].1 = "wrong-key".to_string();
    let (_child, mut stdin, mut reader) = spawn_sidecar_with_env(&env);
    open_admin_workspace(&mut stdin, &mut reader, "lessonplan-fallback-auth");

    request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "resources.create",
        json!({ "resourceType": "equipment", "value": "hoops" }),
    );
    let listed = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "resources.list",
        json!({ "resourceType": "equipment" }),
    );
    assert_eq!(listed["resources"][0]["value"], json!("hoops"));
    assert!(rest.request_count() >= 2);
    let health = request_ok(&mut stdin, &mut reader, "3", "health", json!({}));
    assert_eq!(health["lastSource"], json!("local"));
}
