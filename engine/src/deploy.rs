//! Repository creation from the Deploy tab.
//!
//! One request per user action, no retry. The result is turned into a
//! one-shot notice.

use std::sync::Arc;

use tokio::sync::oneshot;

use orion_providers::{CreatedRepository, DeployError};

use crate::state::Notice;
use crate::transport::RepositoryHost;

/// An in-progress creation request.
#[derive(Debug)]
pub struct DeployTask {
    name: String,
    rx: oneshot::Receiver<Result<CreatedRepository, DeployError>>,
}

impl DeployTask {
    /// Start creating `name`. Must be called inside a tokio runtime.
    pub fn spawn(host: &Arc<dyn RepositoryHost>, token: &str, name: &str) -> Self {
        let (tx, rx) = oneshot::channel();
        let request = host.create_repository(token, name);
        tokio::spawn(async move {
            let _ = tx.send(request.await);
        });
        tracing::info!(repository = name, "Creating repository");
        Self {
            name: name.to_string(),
            rx,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Non-blocking check. `None` while still running.
    pub fn try_finish(&mut self) -> Option<Result<CreatedRepository, DeployError>> {
        match self.rx.try_recv() {
            Ok(result) => Some(result),
            Err(oneshot::error::TryRecvError::Empty) => None,
            Err(oneshot::error::TryRecvError::Closed) => Some(Err(DeployError::Connection(
                "deployment task ended without a result".to_string(),
            ))),
        }
    }

    pub async fn finish(self) -> Result<CreatedRepository, DeployError> {
        self.rx.await.unwrap_or_else(|_| {
            Err(DeployError::Connection(
                "deployment task ended without a result".to_string(),
            ))
        })
    }
}

/// Notice shown for a finished deployment.
#[must_use]
pub fn deploy_notice(result: &Result<CreatedRepository, DeployError>) -> Notice {
    match result {
        Ok(created) => Notice::info(format!("Repository created: {}", created.html_url)),
        Err(DeployError::AlreadyExists { name }) => {
            Notice::error(format!("A repository named {name} already exists."))
        }
        Err(err) => Notice::error(format!("Repository creation failed: {err}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::future::BoxFuture;

    struct FixedHost(Result<CreatedRepository, DeployError>);

    impl RepositoryHost for FixedHost {
        fn create_repository(
            &self,
            _token: &str,
            _name: &str,
        ) -> BoxFuture<'static, Result<CreatedRepository, DeployError>> {
            let result = self.0.clone();
            Box::pin(async move { result })
        }
    }

    #[tokio::test]
    async fn task_reports_host_result() {
        let created = CreatedRepository {
            html_url: "https://github.com/octo/site".to_string(),
            full_name: "octo/site".to_string(),
        };
        let host: Arc<dyn RepositoryHost> = Arc::new(FixedHost(Ok(created.clone())));

        let task = DeployTask::spawn(&host, "t", "site");
        assert_eq!(task.name(), "site");
        assert_eq!(task.finish().await, Ok(created));
    }

    #[test]
    fn notices_distinguish_outcomes() {
        let ok = deploy_notice(&Ok(CreatedRepository {
            html_url: "https://github.com/octo/site".to_string(),
            full_name: String::new(),
        }));
        assert_eq!(
            ok,
            Notice::info("Repository created: https://github.com/octo/site")
        );

        let exists = deploy_notice(&Err(DeployError::AlreadyExists {
            name: "site".to_string(),
        }));
        assert_eq!(exists, Notice::error("A repository named site already exists."));

        let failed = deploy_notice(&Err(DeployError::Unauthorized { status: 401 }));
        assert!(failed.text.starts_with("Repository creation failed"));
    }
}
