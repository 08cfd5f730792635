mod test_support;

use pretty_assertions::assert_eq;
use serde_json::json;
use test_support::{open_admin_workspace, request_err, request_ok, spawn_sidecar, str_field};

fn values(list: &serde_json::Value) -> Vec<String> {
    list["resources"]
        .as_array()
        .expect("resources")
        .iter()
        .filter_map(|r| r["value"].as_str().map(str::to_string))
        .collect()
}

#[test]
fn resource_values_are_trimmed_and_never_empty() {
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    open_admin_workspace(&mut stdin, &mut reader, "lessonplan-resources");

    for (i, value) in ["", "   ", "\t\n"].into_iter().enumerate() {
        let code = request_err(
            &mut stdin,
            &mut reader,
            &format!("empty{i}"),
            "resources.create",
            json!({ "resourceType": "equipment", "value": value }),
        );
        assert_eq!(code, "bad_params");
    }
    let code = request_err(
        &mut stdin,
        &mut reader,
        "missing",
        "resources.create",
        json!({ "resourceType": "equipment" }),
    );
    assert_eq!(code, "bad_params");

    let created = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "resources.create",
        json!({ "resourceType": "equipment", "value": "  skipping ropes " }),
    );
    assert_eq!(created["resource"]["value"], json!("skipping ropes"));
    request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "resources.create",
        json!({ "resourceType": "equipment", "value": "balls" }),
    );
    request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "resources.create",
        json!({ "resourceType": "place", "value": "school yard" }),
    );

    let listed = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "resources.list",
        json!({ "resourceType": "equipment" }),
    );
    assert_eq!(values(&listed), vec!["balls", "skipping ropes"]);

    let rope_id = str_field(&created["resource"], "id");
    request_ok(
        &mut stdin,
        &mut reader,
        "5",
        "resources.delete",
        json!({ "resourceId": rope_id }),
    );
    let code = request_err(
        &mut stdin,
        &mut reader,
        "6",
        "resources.delete",
        json!({ "resourceId": rope_id }),
    );
    assert_eq!(code, "not_found");
    let listed = request_ok(
        &mut stdin,
        &mut reader,
        "7",
        "resources.list",
        json!({ "resourceType": "equipment" }),
    );
    assert_eq!(values(&listed), vec!["balls"]);
}

#[test]
fn subcategories_are_resources_of_the_construct_type() {
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    open_admin_workspace(&mut stdin, &mut reader, "lessonplan-subcategories");

    let types = request_ok(&mut stdin, &mut reader, "1", "catalog.constructTypes", json!({}));
    assert_eq!(
        types["constructTypes"],
        json!(["fitness", "manipulation", "locomotion"])
    );

    for (i, value) in ["strength", "endurance", "speed"].into_iter().enumerate() {
        request_ok(
            &mut stdin,
            &mut reader,
            &format!("s{i}"),
            "resources.create",
            json!({ "resourceType": "fitness", "value": value }),
        );
    }
    let subs = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "catalog.subcategories",
        json!({ "constructType": "fitness" }),
    );
    assert_eq!(subs["subcategories"], json!(["endurance", "speed", "strength"]));
    let none = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "catalog.subcategories",
        json!({ "constructType": "locomotion" }),
    );
    assert_eq!(none["subcategories"], json!([]));
}

#[test]
fn selected_schools_default_to_first_school_category() {
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    open_admin_workspace(&mut stdin, &mut reader, "lessonplan-school-category");

    for (i, value) in ["urban", "rural"].into_iter().enumerate() {
        request_ok(
            &mut stdin,
            &mut reader,
            &format!("c{i}"),
            "resources.create",
            json!({ "resourceType": "school_category", "value": value }),
        );
    }
    let updated = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "draft.update",
        json!({ "patch": {
            "selectedSchools": ["ZŠ Lipová", "ZŠ Dubová"],
            "schoolCategory": { "ZŠ Dubová": "urban" }
        }}),
    );
    // Sorted by value, so "rural" comes first.
    assert_eq!(
        updated["draft"]["schoolCategory"],
        json!({ "ZŠ Dubová": "urban", "ZŠ Lipová": "rural" })
    );
}
