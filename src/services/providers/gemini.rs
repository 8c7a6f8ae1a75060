/// Generative language provider (Gemini REST)
///
/// The API itself is stateless; conversational memory is an append-only
/// history the session keeps on this side and replays with every call. A
/// failed call leaves the history untouched, so one bad turn never poisons
/// the session.
use reqwest::{Client as HttpClient, StatusCode};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::{
    error::{AppError, AppResult},
    services::providers::{LanguageModel, ModelSession},
};

#[derive(Clone)]
pub struct GeminiModel {
    http_client: HttpClient,
    api_url: String,
    api_key: String,
    model: String,
}

impl GeminiModel {
    pub fn new(api_url: String, api_key: String, model: String) -> Self {
        Self {
            http_client: HttpClient::new(),
            api_url,
            api_key,
            model,
        }
    }
}

impl LanguageModel for GeminiModel {
    fn start_session(&self) -> Box<dyn ModelSession> {
        Box::new(GeminiSession {
            http_client: self.http_client.clone(),
            api_url: self.api_url.clone(),
            api_key: self.api_key.clone(),
            model: self.model.clone(),
            history: Mutex::new(Vec::new()),
        })
    }

    fn name(&self) -> &'static str {
        "gemini"
    }
}

/// One conversational exchange history with the model
///
/// The history mutex is held across the whole network call, which also makes
/// the at-most-one-in-flight discipline a hard guarantee per session.
pub struct GeminiSession {
    http_client: HttpClient,
    api_url: String,
    api_key: String,
    model: String,
    history: Mutex<Vec<Content>>,
}

#[async_trait::async_trait]
impl ModelSession for GeminiSession {
    async fn send(&self, prompt: &str) -> AppResult<String> {
        let mut history = self.history.lock().await;

        let mut contents = history.clone();
        contents.push(Content::user(prompt));

        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.api_url, self.model, self.api_key
        );

        let response = self
            .http_client
            .post(&url)
            .json(&GenerateContentRequest { contents })
            .send()
            .await
            .map_err(|e| AppError::ModelUnavailable(format!("model request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(map_http_error(status, body));
        }

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| AppError::ModelUnavailable(format!("unreadable model response: {}", e)))?;

        let text = extract_text(parsed)?;

        history.push(Content::user(prompt));
        history.push(Content::model(&text));

        tracing::debug!(turns = history.len() / 2, model = %self.model, "Model exchange appended");

        Ok(text)
    }
}

// ============================================================================
// Wire types
// ============================================================================

#[derive(Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
}

#[derive(Clone, Serialize)]
struct Content {
    role: String,
    parts: Vec<Part>,
}

impl Content {
    fn user(text: &str) -> Self {
        Self {
            role: "user".to_string(),
            parts: vec![Part { text: text.to_string() }],
        }
    }

    fn model(text: &str) -> Self {
        Self {
            role: "model".to_string(),
            parts: vec![Part { text: text.to_string() }],
        }
    }
}

#[derive(Clone, Serialize)]
struct Part {
    text: String,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Option<Vec<Candidate>>,
}

#[derive(Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Deserialize)]
struct ErrorWrapper {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    status: Option<String>,
}

fn extract_text(response: GenerateContentResponse) -> AppResult<String> {
    response
        .candidates
        .and_then(|candidates| candidates.into_iter().next())
        .and_then(|candidate| candidate.content)
        .and_then(|content| content.parts.into_iter().find_map(|part| part.text))
        .filter(|text| !text.trim().is_empty())
        .ok_or_else(|| AppError::ModelUnavailable("model returned no text".to_string()))
}

fn map_http_error(status: StatusCode, body: String) -> AppError {
    let message = serde_json::from_str::<ErrorWrapper>(&body)
        .map(|wrapper| {
            let status_text = wrapper.error.status.unwrap_or_default();
            let msg = wrapper.error.message.unwrap_or_else(|| body.clone());
            if status_text.is_empty() {
                msg
            } else {
                format!("{status_text}: {msg}")
            }
        })
        .unwrap_or(body);

    AppError::ModelUnavailable(format!("model returned status {}: {}", status, message))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response_with_text(text: &str) -> GenerateContentResponse {
        serde_json::from_value(serde_json::json!({
            "candidates": [
                { "content": { "parts": [ { "text": text } ] } }
            ]
        }))
        .unwrap()
    }

    #[test]
    fn test_extract_text_from_first_part() {
        let text = extract_text(response_with_text("Try Nova!")).unwrap();
        assert_eq!(text, "Try Nova!");
    }

    #[test]
    fn test_extract_text_rejects_empty_candidates() {
        let response: GenerateContentResponse =
            serde_json::from_value(serde_json::json!({ "candidates": [] })).unwrap();
        assert!(matches!(
            extract_text(response),
            Err(AppError::ModelUnavailable(_))
        ));
    }

    #[test]
    fn test_extract_text_rejects_blank_text() {
        assert!(matches!(
            extract_text(response_with_text("   ")),
            Err(AppError::ModelUnavailable(_))
        ));
    }

    #[test]
    fn test_map_http_error_uses_structured_message() {
        let body = r#"{ "error": { "message": "quota exhausted", "status": "RESOURCE_EXHAUSTED" } }"#;
        let err = map_http_error(StatusCode::TOO_MANY_REQUESTS, body.to_string());
        let rendered = err.to_string();
        assert!(rendered.contains("RESOURCE_EXHAUSTED"));
        assert!(rendered.contains("quota exhausted"));
    }

    #[tokio::test]
    async fn test_failed_send_leaves_history_empty() {
        // Unroutable address: the request errors before any exchange happens
        let model = GeminiModel::new(
            "http://127.0.0.1:1".to_string(),
            "test_key".to_string(),
            "test-model".to_string(),
        );
        let session = GeminiSession {
            http_client: model.http_client.clone(),
            api_url: model.api_url.clone(),
            api_key: model.api_key.clone(),
            model: model.model.clone(),
            history: Mutex::new(Vec::new()),
        };

        let result = session.send("hello").await;
        assert!(matches!(result, Err(AppError::ModelUnavailable(_))));
        assert!(session.history.lock().await.is_empty());
    }
}
