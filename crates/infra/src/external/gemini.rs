//! Minimal `generateContent` client.

use reqwest::StatusCode;
use serde_json::{Value, json};
use thiserror::Error;

use labtrack_ai::{AiError, candidate_text};

/// Low sampling temperature keeps predictions stable between calls.
const TEMPERATURE: f64 = 0.2;

#[derive(Debug, Error)]
pub enum GeminiError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error ({status}): {body}")]
    Api { status: StatusCode, body: String },

    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl From<GeminiError> for AiError {
    fn from(err: GeminiError) -> Self {
        match err {
            GeminiError::InvalidResponse(msg) => AiError::InvalidResponse(msg),
            other => AiError::Request(other.to_string()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct GeminiClient {
    api_key: String,
    model: String,
    base_url: String,
    client: reqwest::Client,
}

impl GeminiClient {
    pub fn new(api_key: String, model: String) -> Self {
        Self {
            api_key,
            model,
            base_url: crate::config::DEFAULT_GEMINI_API_URL.to_string(),
            client: reqwest::Client::new(),
        }
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    /// Send `prompt` as a single user turn and return the first candidate's text.
    pub async fn generate_json(&self, prompt: &str) -> Result<String, GeminiError> {
        let body = json!({
            "contents": [{
                "role": "user",
                "parts": [{ "text": prompt }]
            }],
            "generationConfig": {
                "temperature": TEMPERATURE,
                "response_mime_type": "application/json"
            }
        });

        let response = self
            .client
            .post(format!("{}/models/{}:generateContent", self.base_url, self.model))
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(%status, body = %body, "gemini request failed");
            return Err(GeminiError::Api { status, body });
        }

        let payload: Value = response.json().await?;
        candidate_text(&payload)
            .map(str::to_string)
            .map_err(|e| GeminiError::InvalidResponse(e.to_string()))
    }
}
