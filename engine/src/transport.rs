//! Seams between the engine and the remote services.
//!
//! The engine only ever sees these traits, so tests can script replies and
//! failures without HTTP.

use futures_util::future::BoxFuture;

use orion_providers::{CreatedRepository, DeployError, GeminiClient, GenerateError, GitHubClient};

/// One conversational round trip: prompt in, optional reply text out.
pub trait ChatTransport: Send + Sync {
    fn generate(
        &self,
        api_key: &str,
        prompt: &str,
    ) -> BoxFuture<'static, Result<Option<String>, GenerateError>>;
}

impl ChatTransport for GeminiClient {
    fn generate(
        &self,
        api_key: &str,
        prompt: &str,
    ) -> BoxFuture<'static, Result<Option<String>, GenerateError>> {
        let client = self.clone();
        let api_key = api_key.to_string();
        let prompt = prompt.to_string();
        Box::pin(async move { client.generate_content(&api_key, &prompt).await })
    }
}

/// Creates remote repositories.
pub trait RepositoryHost: Send + Sync {
    fn create_repository(
        &self,
        token: &str,
        name: &str,
    ) -> BoxFuture<'static, Result<CreatedRepository, DeployError>>;
}

impl RepositoryHost for GitHubClient {
    fn create_repository(
        &self,
        token: &str,
        name: &str,
    ) -> BoxFuture<'static, Result<CreatedRepository, DeployError>> {
        let client = self.clone();
        let token = token.to_string();
        let name = name.to_string();
        Box::pin(async move { GitHubClient::create_repository(&client, &token, &name).await })
    }
}
