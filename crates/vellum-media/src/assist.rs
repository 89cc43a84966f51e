//! The AI content-assist client.
//!
//! The generator endpoint returns raw markup that the container appends to
//! the document, so the prompt builder pins the output contract hard:
//! markup only, no commentary. The response body may carry the result under
//! either a `content` or a `result` field.

use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AssistError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("assist endpoint returned status {0}")]
    BadStatus(u16),
    #[error("generator returned no content")]
    MissingContent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ContextOption {
    None,
    Selection,
    Document,
}

#[derive(Debug, Clone)]
pub struct AssistRequest {
    pub prompt: String,
    pub selected_text: Option<String>,
    pub preset: Option<String>,
    pub full_content: Option<String>,
    pub context_option: ContextOption,
}

impl AssistRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            selected_text: None,
            preset: None,
            full_content: None,
            context_option: ContextOption::None,
        }
    }
}

/// The instruction that keeps the generator's output insertable as-is.
const OUTPUT_CONTRACT: &str = "Respond with HTML markup only. Do not include commentary, \
     explanations, markdown fences, or any text outside the HTML.";

/// Assemble the full prompt: user intent, optional context, and the strict
/// output contract last so it is hardest to ignore.
pub fn build_prompt(request: &AssistRequest) -> String {
    let mut prompt = String::new();
    if let Some(preset) = &request.preset {
        prompt.push_str(preset);
        prompt.push_str("\n\n");
    }
    prompt.push_str(&request.prompt);

    match request.context_option {
        ContextOption::Selection => {
            if let Some(selected) = &request.selected_text {
                prompt.push_str("\n\nSelected text:\n");
                prompt.push_str(selected);
            }
        }
        ContextOption::Document => {
            if let Some(full) = &request.full_content {
                prompt.push_str("\n\nCurrent document:\n");
                prompt.push_str(full);
            }
        }
        ContextOption::None => {}
    }

    prompt.push_str("\n\n");
    prompt.push_str(OUTPUT_CONTRACT);
    prompt
}

pub struct AssistClient {
    client: reqwest::Client,
    endpoint: String,
}

impl AssistClient {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
        }
    }

    /// `POST { prompt, selectedText?, preset?, fullContent?, contextOption }`
    /// → generated markup.
    pub async fn generate(&self, request: &AssistRequest) -> Result<String, AssistError> {
        let mut body = serde_json::json!({
            "prompt": build_prompt(request),
            "contextOption": request.context_option,
        });
        if let Some(selected) = &request.selected_text {
            body["selectedText"] = serde_json::Value::String(selected.clone());
        }
        if let Some(preset) = &request.preset {
            body["preset"] = serde_json::Value::String(preset.clone());
        }
        if let Some(full) = &request.full_content {
            body["fullContent"] = serde_json::Value::String(full.clone());
        }

        let response = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(AssistError::BadStatus(response.status().as_u16()));
        }

        let payload: serde_json::Value = response.json().await?;
        extract_content(&payload).ok_or(AssistError::MissingContent)
    }
}

/// The generator has shipped both shapes; accept either.
pub fn extract_content(payload: &serde_json::Value) -> Option<String> {
    payload
        .get("content")
        .or_else(|| payload.get("result"))
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
}

/// Copy with the legacy fallback: try the modern clipboard path first, then
/// the selection-based technique, then give up.
pub fn copy_with_fallback(
    text: &str,
    mut primary: impl FnMut(&str) -> bool,
    mut fallback: impl FnMut(&str) -> bool,
) -> bool {
    if primary(text) {
        return true;
    }
    log::debug!("clipboard: primary copy failed, trying legacy fallback");
    fallback(text)
}
