//! Minimal Gemini `generateContent` client with structured JSON output.

use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use log::{debug, error};
use reqwest::Client;
use serde_json::{json, Value};

use crate::sensing::EncodedFrame;

pub const DEFAULT_API_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";

const REQUEST_TIMEOUT_SECS: u64 = 60;
const MAX_ERROR_BODY_CHARS: usize = 1024;

pub struct GeminiClient {
    http: Client,
    base_url: String,
    model: String,
    api_key: String,
}

impl GeminiClient {
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            api_key: api_key.into(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }

    /// Send the parts as one user turn and return the parsed JSON the model produced.
    pub async fn generate_json(&self, parts: Vec<Value>, schema: Value) -> Result<Value> {
        let body = build_request_body(parts, schema);
        debug!("POST {} (model {})", self.endpoint(), self.model);

        let response = self
            .http
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|err| {
                if err.is_timeout() {
                    anyhow!("model API timeout after {REQUEST_TIMEOUT_SECS}s")
                } else {
                    anyhow!("model API request failed: {err}")
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<failed to read body>".to_string());
            let msg = format!("model API error {status}: {}", truncate(&body, MAX_ERROR_BODY_CHARS));
            error!("{msg}");
            bail!(msg);
        }

        let envelope: Value = response
            .json()
            .await
            .context("model API returned a non-JSON envelope")?;
        let text = extract_text(&envelope)?;
        let cleaned = strip_markdown_json(&text);
        serde_json::from_str(&cleaned).with_context(|| {
            format!(
                "model output is not valid JSON: {}",
                truncate(&cleaned, 500)
            )
        })
    }
}

pub fn text_part(text: impl Into<String>) -> Value {
    json!({ "text": text.into() })
}

pub fn image_part(frame: &EncodedFrame) -> Value {
    json!({
        "inline_data": {
            "mime_type": frame.media_type(),
            "data": frame.to_base64(),
        }
    })
}

pub fn build_request_body(parts: Vec<Value>, schema: Value) -> Value {
    json!({
        "contents": [
            { "role": "user", "parts": parts }
        ],
        "generationConfig": {
            "responseMimeType": "application/json",
            "responseSchema": schema,
        }
    })
}

/// Concatenate the text parts of the first candidate.
pub fn extract_text(envelope: &Value) -> Result<String> {
    let candidate = envelope
        .get("candidates")
        .and_then(|c| c.get(0))
        .ok_or_else(|| {
            let reason = envelope
                .pointer("/promptFeedback/blockReason")
                .and_then(Value::as_str)
                .unwrap_or("no candidates returned");
            anyhow!("model returned no answer: {reason}")
        })?;

    let parts = candidate
        .pointer("/content/parts")
        .and_then(Value::as_array)
        .ok_or_else(|| anyhow!("model answer has no content parts"))?;

    let text: String = parts
        .iter()
        .filter_map(|part| part.get("text").and_then(Value::as_str))
        .collect();

    if text.trim().is_empty() {
        bail!("model answer is empty");
    }
    Ok(text)
}

pub fn strip_markdown_json(text: &str) -> String {
    let trimmed = text.trim();
    if !trimmed.starts_with("```") {
        return trimmed.to_string();
    }

    let after_open = match trimmed.find('\n') {
        Some(pos) => &trimmed[pos + 1..],
        None => trimmed.trim_start_matches('`'),
    };
    let cleaned = after_open.trim_end();
    cleaned
        .strip_suffix("```")
        .unwrap_or(cleaned)
        .trim()
        .to_string()
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let head: String = text.chars().take(max_chars).collect();
        format!("{head}...")
    }
}
