//! Chat-completion client used for exercise suggestions and plan ordering.

use crate::config::AiConfig;
use reqwest::blocking::Client;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value as JsonValue;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AiError {
    #[error("AI endpoint is not configured (missing api key)")]
    NotConfigured,

    #[error("AI request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("AI endpoint returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("AI response had no message content")]
    EmptyResponse,

    #[error("could not find JSON in AI response")]
    NoJson,

    #[error("AI response JSON is invalid: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Clone)]
pub struct SuggestionRequest {
    pub construct_type: String,
    pub subcategory: String,
    pub location: String,
    pub materials: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseSuggestion {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Suggested minutes.
    #[serde(default, deserialize_with = "lenient_minutes")]
    pub time: Option<u32>,
}

// Models answer `"time": 5` or `"time": "5"` with equal conviction.
fn lenient_minutes<'de, D>(de: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match JsonValue::deserialize(de)? {
        JsonValue::Number(n) => n.as_u64().and_then(|v| u32::try_from(v).ok()),
        JsonValue::String(s) => s.trim().parse::<u32>().ok(),
        _ => None,
    })
}

pub struct AiClient {
    client: Client,
    url: String,
    api_key: String,
    model: String,
    temperature: f32,
}

impl AiClient {
    pub fn from_config(cfg: &AiConfig) -> Result<Self, AiError> {
        if !cfg.is_configured() {
            return Err(AiError::NotConfigured);
        }
        let client = Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs.max(1)))
            .build()?;
        Ok(Self {
            client,
            url: cfg.url.trim().to_string(),
            api_key: cfg.api_key.trim().to_string(),
            model: cfg.model.clone(),
            temperature: cfg.temperature,
        })
    }

    /// One POST, no retries. Returns the first choice's message content.
    pub fn complete(&self, prompt: &str) -> Result<String, AiError> {
        let body = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: self.temperature,
        };
        let resp = self
            .client
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().unwrap_or_default();
            return Err(AiError::Status {
                status: status.as_u16(),
                body,
            });
        }
        let parsed: ChatResponse = resp.json()?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or(AiError::EmptyResponse)
    }

    pub fn suggest_exercise(&self, req: &SuggestionRequest) -> Result<ExerciseSuggestion, AiError> {
        let reply = self.complete(&suggestion_prompt(req))?;
        let json = extract_json_object(&reply).ok_or(AiError::NoJson)?;
        Ok(serde_json::from_str(json)?)
    }

    pub fn optimize_plan(&self, exercises: &[JsonValue]) -> Result<Vec<JsonValue>, AiError> {
        let reply = self.complete(&optimize_prompt(exercises)?)?;
        let json = extract_json_array(&reply).ok_or(AiError::NoJson)?;
        Ok(serde_json::from_str(json)?)
    }
}

fn span(text: &str, open: char, close: char) -> Option<&str> {
    let start = text.find(open)?;
    let end = text.rfind(close)?;
    if end > start {
        Some(&text[start..=end])
    } else {
        None
    }
}

/// Span from the first `{` to the last `}`.
pub fn extract_json_object(text: &str) -> Option<&str> {
    span(text, '{', '}')
}

/// Span from the first `[` to the last `]`.
pub fn extract_json_array(text: &str) -> Option<&str> {
    span(text, '[', ']')
}

pub fn suggestion_prompt(req: &SuggestionRequest) -> String {
    let materials = if req.materials.is_empty() {
        "none".to_string()
    } else {
        req.materials.join(", ")
    };
    format!(
        r#"Suggest an exercise for a school physical-education lesson with these parameters:
- Exercise construct: {construct}
- Subcategory: {sub}
- Location: {location}
- Available materials: {materials}

Answer in JSON with the keys:
- name: short, descriptive exercise name
- description: detailed description including how it is performed
- time: recommended duration in minutes (number only)

Example answer:
{{
    "name": "Shuttle run",
    "description": "Place cones in a row 5 metres apart. Pupils start at the first cone, run to the second, touch it, return to the first, then run to the third, and so on.",
    "time": 5
}}"#,
        construct = req.construct_type,
        sub = req.subcategory,
        location = req.location,
    )
}

pub fn optimize_prompt(exercises: &[JsonValue]) -> Result<String, AiError> {
    let listing = serde_json::to_string(exercises)?;
    Ok(format!(
        "Optimise the following exercise plan for a school physical-education lesson:\n{listing}\n\n\
         Put the exercises in a logical order, adjust the time allotments so their sum does not \
         exceed 70% of the lesson, and suggest changes to exercises where useful.\n\n\
         Answer in JSON as a list of exercises with the same structure as the input."
    ))
}
