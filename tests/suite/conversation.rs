//! End-to-end chat turns against a mocked Gemini endpoint.

use wiremock::MockServer;

use orion_engine::{
    CredentialName, MemoryCredentialStore, NO_RESPONSE_PLACEHOLDER, PersonaId, Role, UiEvent,
};

use crate::common::{
    app_with, gemini_requests, mount_gemini_failures, mount_gemini_reply, test_options,
};

fn keyed_store() -> Box<MemoryCredentialStore> {
    Box::new(MemoryCredentialStore::with(CredentialName::Gemini, "test-key"))
}

#[tokio::test]
async fn legal_question_gets_one_tagged_reply() {
    let server = MockServer::start().await;
    mount_gemini_reply(&server, "Add a POPIA clause.").await;
    let mut t = app_with(&server, keyed_store(), test_options());

    t.app.dispatch(UiEvent::SelectPersona(PersonaId::Justus));
    t.app.dispatch(UiEvent::InsertText("Do we need a privacy policy?".to_string()));
    assert!(t.app.submit().is_sent());
    t.app.settle().await;

    let log = t.app.log();
    assert_eq!(log.len(), 2);
    assert_eq!(log[0].role(), Role::User);
    assert_eq!(log[0].text(), "Do we need a privacy policy?");
    assert_eq!(log[1].role(), Role::Assistant);
    assert_eq!(log[1].persona(), Some(PersonaId::Justus));
    assert_eq!(log[1].text(), "Add a POPIA clause.");

    let requests = gemini_requests(&server).await;
    assert_eq!(requests.len(), 1);
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    let prompt = body["contents"][0]["parts"][0]["text"].as_str().unwrap();
    assert!(prompt.contains(PersonaId::Justus.persona().instruction));
    assert!(prompt.contains("Do we need a privacy policy?"));
    assert!(
        requests[0]
            .url
            .query_pairs()
            .any(|(k, v)| k == "key" && v == "test-key")
    );
}

#[tokio::test]
async fn four_failures_then_success_is_invisible() {
    let server = MockServer::start().await;
    mount_gemini_failures(&server, 503, 4).await;
    mount_gemini_reply(&server, "Recovered.").await;
    let mut t = app_with(&server, keyed_store(), test_options());

    t.app.submit_text("status?");
    t.app.settle().await;

    assert_eq!(gemini_requests(&server).await.len(), 5);
    let log = t.app.log();
    assert_eq!(log.len(), 2);
    assert_eq!(log[1].role(), Role::Assistant);
    assert_eq!(log[1].text(), "Recovered.");
}

#[tokio::test]
async fn persistent_failure_yields_one_system_message_after_five_attempts() {
    let server = MockServer::start().await;
    mount_gemini_failures(&server, 500, 100).await;
    let mut t = app_with(&server, keyed_store(), test_options());

    t.app.submit_text("anyone there?");
    t.app.settle().await;

    assert_eq!(gemini_requests(&server).await.len(), 5);
    let log = t.app.log();
    assert_eq!(log.len(), 2);
    assert_eq!(log[1].role(), Role::System);
    assert!(log[1].text().starts_with("Connection error after 5 attempts."));
    assert!(!log[1].text().contains("test-key"));
}

#[tokio::test]
async fn client_errors_are_retried_too() {
    let server = MockServer::start().await;
    mount_gemini_failures(&server, 400, 100).await;
    let mut t = app_with(&server, keyed_store(), test_options());

    t.app.submit_text("bad request");
    t.app.settle().await;

    assert_eq!(gemini_requests(&server).await.len(), 5);
    assert_eq!(t.app.log()[1].role(), Role::System);
}

#[tokio::test]
async fn empty_candidates_become_placeholder() {
    let server = MockServer::start().await;
    wiremock::Mock::given(wiremock::matchers::method("POST"))
        .respond_with(
            wiremock::ResponseTemplate::new(200).set_body_json(serde_json::json!({ "candidates": [] })),
        )
        .mount(&server)
        .await;
    let mut t = app_with(&server, keyed_store(), test_options());

    t.app.submit_text("hello");
    t.app.settle().await;

    assert_eq!(t.app.log()[1].role(), Role::Assistant);
    assert_eq!(t.app.log()[1].text(), NO_RESPONSE_PLACEHOLDER);
}

#[tokio::test]
async fn missing_key_sends_nothing() {
    let server = MockServer::start().await;
    mount_gemini_reply(&server, "unused").await;
    let mut t = app_with(
        &server,
        Box::new(MemoryCredentialStore::default()),
        test_options(),
    );

    t.app.dispatch(UiEvent::InsertText("hello".to_string()));
    assert!(!t.app.submit().is_sent());
    t.app.settle().await;

    assert!(t.app.log().is_empty());
    assert!(gemini_requests(&server).await.is_empty());
}

#[tokio::test]
async fn concurrent_sends_commit_in_send_order() {
    let server = MockServer::start().await;
    mount_gemini_reply(&server, "ack").await;
    let mut t = app_with(&server, keyed_store(), test_options());

    t.app.dispatch(UiEvent::SelectPersona(PersonaId::Mintaka));
    t.app.submit_text("first");
    t.app.dispatch(UiEvent::SelectPersona(PersonaId::Scribe));
    t.app.submit_text("second");
    t.app.settle().await;

    let log = t.app.log();
    let summary: Vec<(Role, Option<PersonaId>)> =
        log.iter().map(|m| (m.role(), m.persona())).collect();
    assert_eq!(
        summary,
        vec![
            (Role::User, None),
            (Role::User, None),
            (Role::Assistant, Some(PersonaId::Mintaka)),
            (Role::Assistant, Some(PersonaId::Scribe)),
        ]
    );
}

#[tokio::test]
async fn voice_reads_reply_prefix() {
    let server = MockServer::start().await;
    let reply = "word ".repeat(60);
    mount_gemini_reply(&server, &reply).await;
    let mut options = test_options();
    options.voice = true;
    let mut t = app_with(&server, keyed_store(), options);

    t.app.submit_text("read to me");
    t.app.settle().await;

    let spoken = t.speech.spoken();
    assert_eq!(spoken.len(), 1);
    assert_eq!(spoken[0].chars().count(), 150);
    assert!(reply.starts_with(&spoken[0]));
}
