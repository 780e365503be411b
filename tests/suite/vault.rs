//! Credential vault persistence and wipe.

use wiremock::MockServer;

use orion_engine::{
    CredentialName, CredentialStore, FileCredentialStore, PersonaId, Tab, Theme, UiEvent,
};

use crate::common::{app_with, gemini_requests, mount_gemini_reply, test_options};

#[tokio::test]
async fn saved_key_survives_restart_and_enables_sending() {
    let dir = tempfile::tempdir().unwrap();
    let vault = dir.path().join("vault.toml");
    let server = MockServer::start().await;
    mount_gemini_reply(&server, "hi").await;

    {
        let store = FileCredentialStore::open(&vault).unwrap();
        let mut t = app_with(&server, Box::new(store), test_options());
        t.app.dispatch(UiEvent::SwitchTab(Tab::Vault));
        t.app.dispatch(UiEvent::BeginCredentialEdit);
        t.app.dispatch(UiEvent::InsertText("gem-key".to_string()));
        t.app.commit_credential_edit();
        assert_eq!(t.app.credential(CredentialName::Gemini), "gem-key");
    }

    let store = FileCredentialStore::open(&vault).unwrap();
    assert_eq!(store.get(CredentialName::Gemini), "gem-key");

    let mut t = app_with(&server, Box::new(store), test_options());
    assert!(t.app.submit_text("hello").is_sent());
    t.app.settle().await;
    assert_eq!(gemini_requests(&server).await.len(), 1);
}

#[tokio::test]
async fn wipe_clears_every_credential_and_resets_the_session() {
    let dir = tempfile::tempdir().unwrap();
    let vault = dir.path().join("vault.toml");
    let server = MockServer::start().await;
    mount_gemini_reply(&server, "hi").await;

    let mut store = FileCredentialStore::open(&vault).unwrap();
    store.set(CredentialName::Gemini, "g").unwrap();
    store.set(CredentialName::GitHub, "ghp").unwrap();
    store.set(CredentialName::Drive, "folder").unwrap();

    let mut t = app_with(&server, Box::new(store), test_options());
    t.app.submit_text("hello");
    t.app.settle().await;
    t.app.dispatch(UiEvent::SelectPersona(PersonaId::Scribe));
    t.app.dispatch(UiEvent::ToggleTheme);
    t.app.dispatch(UiEvent::SwitchTab(Tab::Vault));

    t.app.wipe_credentials();

    for name in CredentialName::ALL {
        assert_eq!(t.app.credential(name), "");
    }
    assert!(t.app.log().is_empty());
    assert_eq!(t.app.state().persona, PersonaId::default());
    assert_eq!(t.app.state().theme, Theme::default());

    let reopened = FileCredentialStore::open(&vault).unwrap();
    for name in CredentialName::ALL {
        assert_eq!(reopened.get(name), "");
    }

    // With the key gone, sending is a no-op again.
    assert!(!t.app.submit_text("still there?").is_sent());
}
