//! Repository creation from the Deploy tab against a mocked GitHub API.

use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use orion_engine::{CredentialName, MemoryCredentialStore, Notice, NoticeKind, Tab, UiEvent};

use crate::common::{app_with, test_options};

fn token_store() -> Box<MemoryCredentialStore> {
    Box::new(MemoryCredentialStore::with(CredentialName::GitHub, "ghp_test"))
}

async fn deploy(server: &MockServer, store: Box<MemoryCredentialStore>, name: &str) -> Option<Notice> {
    let mut t = app_with(server, store, test_options());
    t.app.dispatch(UiEvent::SwitchTab(Tab::Deploy));
    t.app.dispatch(UiEvent::InsertText(name.to_string()));
    t.app.deploy();
    t.app.settle().await;
    t.app.state().notice.clone()
}

#[tokio::test]
async fn creates_repository_and_reports_url() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/user/repos"))
        .and(header("authorization", "Bearer ghp_test"))
        .and(body_json(serde_json::json!({ "name": "launch-site", "auto_init": true })))
        .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
            "html_url": "https://github.com/octo/launch-site",
            "full_name": "octo/launch-site"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let notice = deploy(&server, token_store(), "launch-site").await;

    assert_eq!(
        notice,
        Some(Notice::info(
            "Repository created: https://github.com/octo/launch-site"
        ))
    );
}

#[tokio::test]
async fn existing_name_is_reported_distinctly() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/user/repos"))
        .respond_with(ResponseTemplate::new(422).set_body_json(serde_json::json!({
            "message": "Repository creation failed.",
            "errors": [{ "resource": "Repository", "field": "name", "message": "name already exists on this account" }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let notice = deploy(&server, token_store(), "launch-site").await;

    assert_eq!(
        notice,
        Some(Notice::error("A repository named launch-site already exists."))
    );
}

#[tokio::test]
async fn missing_token_makes_no_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let notice = deploy(&server, Box::new(MemoryCredentialStore::default()), "site").await;

    assert_eq!(notice.map(|n| n.kind), Some(NoticeKind::Error));
}

#[tokio::test]
async fn unauthorized_token_is_an_error_notice() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/user/repos"))
        .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
            "message": "Bad credentials"
        })))
        .mount(&server)
        .await;

    let notice = deploy(&server, token_store(), "site").await.unwrap();

    assert_eq!(notice.kind, NoticeKind::Error);
    assert!(notice.text.starts_with("Repository creation failed"));
}
