use super::model::{
    Exercise, ExerciseCategory, ExerciseFilter, ExerciseInput, ExerciseSection, LessonPlan,
    LessonSeries, Resource, Section, SeriesInput,
};
use super::{
    matching_exercise_ids, recent_contents, resource_value, Store, StoreError, StoreResult,
};
use reqwest::blocking::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::{json, Value as JsonValue};
use std::time::Duration;

const TABLE_EXERCISES: &str = "exercises";
const TABLE_CATEGORIES: &str = "exercise_categories";
const TABLE_SECTIONS: &str = "exercise_sections";
const TABLE_RESOURCES: &str = "resources";
const TABLE_SERIES: &str = "lesson_series";
const TABLE_PLANS: &str = "lesson_plan";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

type Query = Vec<(&'static str, String)>;

/// Hosted relational store exposed through a PostgREST-style API
/// (`{url}/rest/v1/{table}` with `col=eq.value` filters).
pub struct RemoteStore {
    base_url: String,
    key: String,
    client: Client,
}

impl RemoteStore {
    pub fn new(url: &str, key: &str) -> StoreResult<Self> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            base_url: url.trim_end_matches('/').to_string(),
            key: key.to_string(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    fn authed(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .header("apikey", &self.key)
            .header("Authorization", format!("Bearer {}", self.key))
    }

    fn check(resp: Response) -> StoreResult<Response> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().unwrap_or_default();
        Err(StoreError::Status {
            status: status.as_u16(),
            body,
        })
    }

    fn select<T: DeserializeOwned>(&self, table: &str, query: &Query) -> StoreResult<Vec<T>> {
        let resp = self
            .authed(self.client.get(self.table_url(table)))
            .query(query)
            .send()?;
        Ok(Self::check(resp)?.json::<Vec<T>>()?)
    }

    fn insert<T: DeserializeOwned>(&self, table: &str, rows: JsonValue) -> StoreResult<Vec<T>> {
        let resp = self
            .authed(self.client.post(self.table_url(table)))
            .header("Prefer", "return=representation")
            .json(&rows)
            .send()?;
        Ok(Self::check(resp)?.json::<Vec<T>>()?)
    }

    fn insert_one<T: DeserializeOwned>(&self, table: &str, row: JsonValue) -> StoreResult<T> {
        self.insert::<T>(table, row)?
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::EmptyInsert(table.to_string()))
    }

    fn update<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &Query,
        patch: JsonValue,
    ) -> StoreResult<Vec<T>> {
        let resp = self
            .authed(self.client.patch(self.table_url(table)))
            .header("Prefer", "return=representation")
            .query(query)
            .json(&patch)
            .send()?;
        Ok(Self::check(resp)?.json::<Vec<T>>()?)
    }

    fn delete<T: DeserializeOwned>(&self, table: &str, query: &Query) -> StoreResult<Vec<T>> {
        let resp = self
            .authed(self.client.delete(self.table_url(table)))
            .header("Prefer", "return=representation")
            .query(query)
            .send()?;
        Ok(Self::check(resp)?.json::<Vec<T>>()?)
    }

    fn insert_tags(&self, exercise_id: &str, input: &ExerciseInput) -> StoreResult<()> {
        if !input.categories.is_empty() {
            let rows: Vec<JsonValue> = input
                .categories
                .iter()
                .map(|tag| {
                    json!({
                        "exercise_id": exercise_id,
                        "construct_type": tag.construct_type,
                        "subcategory": tag.subcategory,
                    })
                })
                .collect();
            self.insert::<JsonValue>(TABLE_CATEGORIES, JsonValue::Array(rows))?;
        }
        if !input.sections.is_empty() {
            let rows: Vec<JsonValue> = input
                .sections
                .iter()
                .map(|s| json!({ "exercise_id": exercise_id, "section": s.as_str() }))
                .collect();
            self.insert::<JsonValue>(TABLE_SECTIONS, JsonValue::Array(rows))?;
        }
        Ok(())
    }

    fn delete_tags(&self, exercise_id: &str) -> StoreResult<()> {
        let by_exercise = vec![("exercise_id", eq(exercise_id))];
        self.delete::<JsonValue>(TABLE_CATEGORIES, &by_exercise)?;
        self.delete::<JsonValue>(TABLE_SECTIONS, &by_exercise)?;
        Ok(())
    }
}

fn eq(value: &str) -> String {
    format!("eq.{}", value)
}

fn in_list(values: &[String]) -> String {
    let quoted: Vec<String> = values
        .iter()
        .map(|v| format!("\"{}\"", v.replace('\\', "\\\\").replace('"', "\\\"")))
        .collect();
    format!("in.({})", quoted.join(","))
}

fn exercise_row(input: &ExerciseInput) -> JsonValue {
    json!({
        "name": input.name,
        "description": input.description,
        "location": input.location.as_str(),
        "materials": input.materials,
    })
}

impl Store for RemoteStore {
    fn list_exercises(&self, filter: &ExerciseFilter) -> StoreResult<Vec<Exercise>> {
        let mut categories: Vec<ExerciseCategory> = Vec::new();
        if filter.has_category_filter() {
            let mut q: Query = vec![("select", "exercise_id,construct_type,subcategory".into())];
            if let Some(ct) = &filter.construct_type {
                q.push(("construct_type", eq(ct)));
            }
            if let Some(sub) = &filter.subcategory {
                q.push(("subcategory", eq(sub)));
            }
            categories = self.select(TABLE_CATEGORIES, &q)?;
        }
        let mut sections: Vec<ExerciseSection> = Vec::new();
        if let Some(section) = filter.section {
            let q: Query = vec![
                ("select", "exercise_id,section".into()),
                ("section", eq(section.as_str())),
            ];
            sections = self.select(TABLE_SECTIONS, &q)?;
        }

        let mut q: Query = vec![("select", "*".into())];
        if let Some(ids) = matching_exercise_ids(&categories, &sections, filter) {
            if ids.is_empty() {
                return Ok(Vec::new());
            }
            let mut ids: Vec<String> = ids.into_iter().collect();
            ids.sort();
            q.push(("id", in_list(&ids)));
        }
        q.push(("order", "name.asc,id.asc".into()));
        self.select(TABLE_EXERCISES, &q)
    }

    fn get_exercise(&self, exercise_id: &str) -> StoreResult<Option<Exercise>> {
        let q: Query = vec![("select", "*".into()), ("id", eq(exercise_id)), ("limit", "1".into())];
        Ok(self.select::<Exercise>(TABLE_EXERCISES, &q)?.into_iter().next())
    }

    fn exercise_categories(&self, exercise_id: &str) -> StoreResult<Vec<ExerciseCategory>> {
        let q: Query = vec![("select", "*".into()), ("exercise_id", eq(exercise_id))];
        self.select(TABLE_CATEGORIES, &q)
    }

    fn exercise_sections(&self, exercise_id: &str) -> StoreResult<Vec<Section>> {
        let q: Query = vec![("select", "*".into()), ("exercise_id", eq(exercise_id))];
        let mut out: Vec<Section> = self
            .select::<ExerciseSection>(TABLE_SECTIONS, &q)?
            .into_iter()
            .map(|s| s.section)
            .collect();
        out.sort();
        out.dedup();
        Ok(out)
    }

    fn add_exercise(&self, input: &ExerciseInput) -> StoreResult<String> {
        let created: Exercise = self.insert_one(TABLE_EXERCISES, exercise_row(input))?;
        self.insert_tags(&created.id, input)?;
        Ok(created.id)
    }

    fn update_exercise(&self, exercise_id: &str, input: &ExerciseInput) -> StoreResult<bool> {
        let q: Query = vec![("id", eq(exercise_id))];
        let rows: Vec<JsonValue> = self.update(TABLE_EXERCISES, &q, exercise_row(input))?;
        if rows.is_empty() {
            return Ok(false);
        }
        self.delete_tags(exercise_id)?;
        self.insert_tags(exercise_id, input)?;
        Ok(true)
    }

    fn delete_exercise(&self, exercise_id: &str) -> StoreResult<bool> {
        self.delete_tags(exercise_id)?;
        let q: Query = vec![("id", eq(exercise_id))];
        let rows: Vec<JsonValue> = self.delete(TABLE_EXERCISES, &q)?;
        Ok(!rows.is_empty())
    }

    fn list_resources(&self, resource_type: &str) -> StoreResult<Vec<Resource>> {
        let q: Query = vec![
            ("select", "*".into()),
            ("resource_type", eq(resource_type)),
            ("order", "value.asc,id.asc".into()),
        ];
        let mut rows: Vec<Resource> = self.select(TABLE_RESOURCES, &q)?;
        rows.retain(|r| !r.value.trim().is_empty());
        Ok(rows)
    }

    fn add_resource(&self, resource_type: &str, value: &str) -> StoreResult<Resource> {
        let value = resource_value(resource_type, value)?;
        self.insert_one(
            TABLE_RESOURCES,
            json!({ "resource_type": resource_type, "value": value }),
        )
    }

    fn delete_resource(&self, resource_id: &str) -> StoreResult<bool> {
        let q: Query = vec![("id", eq(resource_id))];
        let rows: Vec<JsonValue> = self.delete(TABLE_RESOURCES, &q)?;
        Ok(!rows.is_empty())
    }

    fn series_for_teacher(&self, teacher_id: &str) -> StoreResult<Vec<LessonSeries>> {
        let q: Query = vec![
            ("select", "*".into()),
            ("teacher_id", eq(teacher_id)),
            ("order", "created_at.desc".into()),
        ];
        self.select(TABLE_SERIES, &q)
    }

    fn create_series(&self, input: &SeriesInput) -> StoreResult<LessonSeries> {
        self.insert_one(
            TABLE_SERIES,
            json!({
                "teacher_id": input.teacher_id,
                "school_id": input.school_id,
                "class_name": input.class_name,
                "subject": input.subject,
                "school_year": input.school_year,
            }),
        )
    }

    fn last_lessons(&self, series_id: &str, limit: usize) -> StoreResult<Vec<JsonValue>> {
        let q: Query = vec![
            ("select", "*".into()),
            ("series_id", eq(series_id)),
            ("order", "sequence_index.desc".into()),
            ("limit", limit.to_string()),
        ];
        let plans: Vec<LessonPlan> = self.select(TABLE_PLANS, &q)?;
        Ok(recent_contents(plans, limit))
    }

    fn next_sequence_index(&self, series_id: &str) -> StoreResult<i64> {
        let q: Query = vec![
            ("select", "sequence_index".into()),
            ("series_id", eq(series_id)),
            ("order", "sequence_index.desc".into()),
            ("limit", "1".into()),
        ];
        let rows: Vec<JsonValue> = self.select(TABLE_PLANS, &q)?;
        Ok(rows
            .first()
            .and_then(|r| r.get("sequence_index"))
            .and_then(|v| v.as_i64())
            .map(|max| max + 1)
            .unwrap_or(1))
    }

    fn add_lesson_plan(&self, plan: &LessonPlan) -> StoreResult<LessonPlan> {
        self.insert_one(
            TABLE_PLANS,
            json!({
                "series_id": plan.series_id,
                "sequence_index": plan.sequence_index,
                "date": plan.date,
                "params": plan.params,
                "content": plan.content,
            }),
        )
    }
}
