//! Google Gemini `generateContent` client.
//!
//! One prompt goes out as the only part of the only content entry, and the
//! first text part of the first candidate comes back. The API key travels as
//! the `key` query parameter, so request URLs are never logged and transport
//! errors are stripped of their URL before they leave this module.

use std::time::Duration;

use reqwest::Url;
use serde::Deserialize;
use serde_json::{Value, json};
use thiserror::Error;

use crate::retry::RetryableError;
use crate::{DEFAULT_GEMINI_MODEL, GEMINI_API_BASE_URL, http_client, join_url, read_capped_error_body};

/// Failure of a single `generateContent` attempt.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GenerateError {
    #[error("connection error: {0}")]
    Connection(String),
    #[error("request timed out after {}s", .after.as_secs())]
    Timeout { after: Duration },
    #[error("API error {status}: {body}")]
    Status { status: u16, body: String },
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),
}

impl RetryableError for GenerateError {
    fn timed_out(after: Duration) -> Self {
        Self::Timeout { after }
    }

    /// Every transport, status, and timeout failure is retried. A malformed
    /// endpoint will not fix itself, so it is not.
    fn is_retryable(&self) -> bool {
        !matches!(self, Self::InvalidEndpoint(_))
    }
}

#[derive(Debug, Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    base_url: String,
    model: String,
}

impl Default for GeminiClient {
    fn default() -> Self {
        Self::new(GEMINI_API_BASE_URL, DEFAULT_GEMINI_MODEL)
    }
}

impl GeminiClient {
    #[must_use]
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self::with_http_client(http_client().clone(), base_url, model)
    }

    #[must_use]
    pub fn with_http_client(
        http: reqwest::Client,
        base_url: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            model: model.into(),
        }
    }

    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// `{base}/models/{model}:generateContent?key={api_key}`
    pub fn endpoint(&self, api_key: &str) -> Result<Url, GenerateError> {
        let raw = join_url(
            &self.base_url,
            &format!("models/{}:generateContent", self.model),
        );
        let mut url = Url::parse(&raw).map_err(|e| GenerateError::InvalidEndpoint(e.to_string()))?;
        url.query_pairs_mut().append_pair("key", api_key);
        Ok(url)
    }

    /// Issue one `generateContent` call.
    ///
    /// Returns `Ok(None)` when the service answered successfully but the body
    /// has no usable text; callers substitute their placeholder.
    pub async fn generate_content(
        &self,
        api_key: &str,
        prompt: &str,
    ) -> Result<Option<String>, GenerateError> {
        let url = self.endpoint(api_key)?;
        let body = build_request_body(prompt);

        let response = self
            .http
            .post(url)
            .json(&body)
            .send()
            .await
            .map_err(|e| GenerateError::Connection(e.without_url().to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = read_capped_error_body(response).await;
            tracing::warn!(status = status.as_u16(), model = %self.model, "Gemini returned an error status");
            return Err(GenerateError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let text = response
            .text()
            .await
            .map_err(|e| GenerateError::Connection(e.without_url().to_string()))?;

        let reply = extract_reply_text(&text);
        if reply.is_none() {
            tracing::warn!(model = %self.model, bytes = text.len(), "Gemini reply had no text part");
        }
        Ok(reply)
    }
}

/// `{ "contents": [ { "parts": [ { "text": prompt } ] } ] }`
#[must_use]
pub fn build_request_body(prompt: &str) -> Value {
    json!({
        "contents": [{
            "parts": [{ "text": prompt }]
        }]
    })
}

#[derive(Debug, Default, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Default, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
}

#[derive(Debug, Default, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Default, Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

/// Pull `candidates[0].content.parts[0].text` out of a response body.
///
/// Any deviation from that shape, including an empty string, yields `None`.
#[must_use]
pub fn extract_reply_text(body: &str) -> Option<String> {
    let parsed: GenerateContentResponse = match serde_json::from_str(body) {
        Ok(parsed) => parsed,
        Err(e) => {
            tracing::debug!("Unparseable generateContent body: {e}");
            return None;
        }
    };

    parsed
        .candidates
        .into_iter()
        .next()?
        .content?
        .parts
        .into_iter()
        .next()?
        .text
        .filter(|text| !text.is_empty())
}
