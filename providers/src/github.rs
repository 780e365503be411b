//! GitHub repository creation.
//!
//! A single `POST /user/repos`. No retry: a repeated call with the same name
//! fails remotely, and that failure is reported as [`DeployError::AlreadyExists`].

use serde::Deserialize;
use serde_json::json;
use thiserror::Error;

use crate::{GITHUB_API_BASE_URL, http_client, join_url, read_capped_error_body};

const GITHUB_ACCEPT: &str = "application/vnd.github+json";
const GITHUB_API_VERSION: &str = "2022-11-28";

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DeployError {
    #[error("no GitHub token is stored in the vault")]
    MissingToken,
    #[error("repository name must not be empty")]
    InvalidName,
    #[error("repository {name} already exists")]
    AlreadyExists { name: String },
    #[error("GitHub rejected the token (HTTP {status})")]
    Unauthorized { status: u16 },
    #[error("repository creation failed (HTTP {status}): {message}")]
    Rejected { status: u16, message: String },
    #[error("connection error: {0}")]
    Connection(String),
    #[error("unexpected response from GitHub: {0}")]
    MalformedResponse(String),
}

/// The parts of the created repository the UI reports back.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CreatedRepository {
    pub html_url: String,
    #[serde(default)]
    pub full_name: String,
}

#[derive(Debug, Default, Deserialize)]
struct GitHubErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    errors: Vec<GitHubFieldError>,
}

#[derive(Debug, Default, Deserialize)]
struct GitHubFieldError {
    #[serde(default)]
    message: String,
}

impl GitHubErrorBody {
    fn mentions_existing(&self) -> bool {
        self.errors
            .iter()
            .map(|e| e.message.as_str())
            .chain(std::iter::once(self.message.as_str()))
            .any(|m| m.to_ascii_lowercase().contains("already exists"))
    }
}

#[derive(Debug, Clone)]
pub struct GitHubClient {
    http: reqwest::Client,
    base_url: String,
}

impl Default for GitHubClient {
    fn default() -> Self {
        Self::new(GITHUB_API_BASE_URL)
    }
}

impl GitHubClient {
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_http_client(http_client().clone(), base_url)
    }

    #[must_use]
    pub fn with_http_client(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }

    /// Create a repository for the authenticated user, initialised with a README.
    pub async fn create_repository(
        &self,
        token: &str,
        name: &str,
    ) -> Result<CreatedRepository, DeployError> {
        if token.trim().is_empty() {
            return Err(DeployError::MissingToken);
        }
        let name = name.trim();
        if name.is_empty() {
            return Err(DeployError::InvalidName);
        }

        let url = join_url(&self.base_url, "user/repos");
        let response = self
            .http
            .post(url)
            .bearer_auth(token.trim())
            .header(reqwest::header::ACCEPT, GITHUB_ACCEPT)
            .header("X-GitHub-Api-Version", GITHUB_API_VERSION)
            .json(&json!({ "name": name, "auto_init": true }))
            .send()
            .await
            .map_err(|e| DeployError::Connection(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            let body = response
                .text()
                .await
                .map_err(|e| DeployError::Connection(e.to_string()))?;
            let created: CreatedRepository = serde_json::from_str(&body)
                .map_err(|e| DeployError::MalformedResponse(e.to_string()))?;
            tracing::info!(repository = %created.full_name, "Created GitHub repository");
            return Ok(created);
        }

        let raw = read_capped_error_body(response).await;
        let parsed: GitHubErrorBody = serde_json::from_str(&raw).unwrap_or_default();
        tracing::warn!(status = status.as_u16(), message = %parsed.message, "GitHub repository creation failed");

        Err(match status.as_u16() {
            401 | 403 => DeployError::Unauthorized {
                status: status.as_u16(),
            },
            422 if parsed.mentions_existing() => DeployError::AlreadyExists {
                name: name.to_string(),
            },
            code => DeployError::Rejected {
                status: code,
                message: if parsed.message.is_empty() {
                    raw
                } else {
                    parsed.message
                },
            },
        })
    }
}
