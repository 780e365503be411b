//! Shared test utilities and fixtures
//!
//! Builds an [`App`] wired to real HTTP clients pointed at a wiremock server.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use orion_engine::{
    App, AppOptions, CredentialStore, GeminiClient, GitHubClient, RecordingSpeech, RetryConfig,
    Services,
};

pub const MODEL: &str = "gemini-test";
pub const GEMINI_PATH: &str = "/models/gemini-test:generateContent";

/// Retry policy with the production attempt count and millisecond delays.
pub fn fast_retry() -> RetryConfig {
    RetryConfig {
        max_attempts: 5,
        initial_delay: Duration::from_millis(1),
        max_delay: Duration::from_millis(4),
        jitter_factor: 0.0,
        attempt_timeout: Some(Duration::from_secs(5)),
    }
}

pub fn gemini_reply(text: &str) -> serde_json::Value {
    serde_json::json!({
        "candidates": [{
            "content": {
                "role": "model",
                "parts": [{ "text": text }]
            },
            "finishReason": "STOP"
        }]
    })
}

/// Answer every generateContent call with `text`.
pub async fn mount_gemini_reply(server: &MockServer, text: &str) {
    Mock::given(method("POST"))
        .and(path(GEMINI_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(gemini_reply(text)))
        .mount(server)
        .await;
}

/// Fail the next `times` generateContent calls with `status`.
pub async fn mount_gemini_failures(server: &MockServer, status: u16, times: u64) {
    Mock::given(method("POST"))
        .and(path(GEMINI_PATH))
        .respond_with(ResponseTemplate::new(status).set_body_string("upstream unavailable"))
        .up_to_n_times(times)
        .with_priority(1)
        .mount(server)
        .await;
}

pub async fn gemini_requests(server: &MockServer) -> Vec<wiremock::Request> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .into_iter()
        .filter(|r| r.url.path() == GEMINI_PATH)
        .collect()
}

pub struct TestApp {
    pub app: App,
    pub speech: RecordingSpeech,
}

pub fn app_with(server: &MockServer, store: Box<dyn CredentialStore>, options: AppOptions) -> TestApp {
    let speech = RecordingSpeech::default();
    let services = Services {
        store,
        transport: Arc::new(GeminiClient::new(server.uri(), MODEL)),
        host: Arc::new(GitHubClient::new(server.uri())),
        speech: Box::new(speech.clone()),
        startup_notice: None,
    };
    TestApp {
        app: App::new(options, services),
        speech,
    }
}

pub fn test_options() -> AppOptions {
    AppOptions {
        retry: fast_retry(),
        preview_path: None,
        ..AppOptions::default()
    }
}
