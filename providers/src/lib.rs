//! HTTP clients for the two remote services Orion talks to.
//!
//! # Architecture
//!
//! - [`gemini`] - Google Gemini `generateContent` client (one prompt in, one reply out)
//! - [`github`] - GitHub repository creation (`POST /user/repos`)
//! - [`retry`] - Bounded retry with exponential backoff, independent of any transport
//!
//! Both clients share one pooled [`reqwest::Client`] built by [`http_client`].
//!
//! # Error Handling
//!
//! Each client has its own typed error. The generative client never fails on a
//! well-formed HTTP success: a reply with an unexpected JSON shape comes back as
//! `Ok(None)` so the caller can substitute its placeholder text.

pub mod gemini;
pub mod github;
pub mod retry;

use std::sync::OnceLock;
use std::time::Duration;

pub use gemini::{GeminiClient, GenerateError};
pub use github::{CreatedRepository, DeployError, GitHubClient};
pub use retry::{RetryConfig, RetryOutcome, RetryableError, run_with_retry};

/// Canonical Gemini API base URL.
pub const GEMINI_API_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
/// Model used when the config does not name one.
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash-preview-09-2025";
/// Canonical GitHub REST API base URL.
pub const GITHUB_API_BASE_URL: &str = "https://api.github.com";

const CONNECT_TIMEOUT_SECS: u64 = 30;

// Note: reqwest only exposes tcp_keepalive (idle time); interval/retries use platform defaults.
const TCP_KEEPALIVE_SECS: u64 = 60;

const POOL_MAX_IDLE_PER_HOST: usize = 16;
const POOL_IDLE_TIMEOUT_SECS: u64 = 90;

const MAX_ERROR_BODY_BYTES: usize = 32 * 1024;

const USER_AGENT: &str = concat!("orion-architect/", env!("CARGO_PKG_VERSION"));

/// Shared HTTP client.
///
/// HTTPS is not enforced here because the base URLs are configurable and
/// the test suite points them at a local mock server.
pub fn http_client() -> &'static reqwest::Client {
    static CLIENT: OnceLock<reqwest::Client> = OnceLock::new();
    CLIENT.get_or_init(|| {
        base_client_builder().build().unwrap_or_else(|e| {
            tracing::error!("Failed to build tuned HTTP client: {e}. Falling back to defaults.");
            reqwest::Client::new()
        })
    })
}

fn base_client_builder() -> reqwest::ClientBuilder {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
        .redirect(reqwest::redirect::Policy::none())
        .tcp_keepalive(Some(Duration::from_secs(TCP_KEEPALIVE_SECS)))
        .pool_max_idle_per_host(POOL_MAX_IDLE_PER_HOST)
        .pool_idle_timeout(Some(Duration::from_secs(POOL_IDLE_TIMEOUT_SECS)))
}

/// Read an error response body, stopping after 32 KiB.
pub async fn read_capped_error_body(response: reqwest::Response) -> String {
    use futures_util::StreamExt;
    let mut body = Vec::new();
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let Ok(chunk) = chunk else { break };
        body.extend_from_slice(&chunk);
        if body.len() > MAX_ERROR_BODY_BYTES {
            body.truncate(MAX_ERROR_BODY_BYTES);
            let text = String::from_utf8_lossy(&body);
            return format!("{text}...(truncated)");
        }
    }
    String::from_utf8_lossy(&body).into_owned()
}

/// Join a configured base URL and an API path without doubling slashes.
pub(crate) fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn join_url_handles_slashes() {
        assert_eq!(join_url("http://x/", "/user/repos"), "http://x/user/repos");
        assert_eq!(join_url("http://x", "user/repos"), "http://x/user/repos");
    }

    #[tokio::test]
    async fn capped_error_body_truncates_large_payloads() {
        let server = MockServer::start().await;
        let big = "x".repeat(MAX_ERROR_BODY_BYTES + 100);

        Mock::given(method("GET"))
            .and(path("/big"))
            .respond_with(ResponseTemplate::new(500).set_body_string(big))
            .mount(&server)
            .await;

        let response = reqwest::get(format!("{}/big", server.uri())).await.unwrap();
        let body = read_capped_error_body(response).await;

        assert!(body.ends_with("...(truncated)"));
        assert_eq!(body.len(), MAX_ERROR_BODY_BYTES + "...(truncated)".len());
    }

    #[tokio::test]
    async fn capped_error_body_returns_small_payloads_verbatim() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/small"))
            .respond_with(ResponseTemplate::new(400).set_body_string("bad key"))
            .mount(&server)
            .await;

        let response = reqwest::get(format!("{}/small", server.uri())).await.unwrap();
        assert_eq!(read_capped_error_body(response).await, "bad key");
    }
}
