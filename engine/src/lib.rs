//! Core engine for Orion - application state and orchestration.
//!
//! This crate contains the [`App`] controller without TUI dependencies. The
//! renderer reads [`App::state`] and [`App::log`], and turns key presses into
//! [`UiEvent`]s or calls to the action methods.

use std::path::PathBuf;
use std::sync::Arc;

mod conversation;
mod deploy;
mod preview;
mod speech;
mod state;
mod transport;

pub use conversation::{
    ConversationEngine, ConversationLog, NO_RESPONSE_PLACEHOLDER, SkipReason, SubmitOutcome,
    compose_prompt,
};
pub use deploy::{DeployTask, deploy_notice};
pub use preview::{export_preview, extract_html, latest_preview};
pub use speech::{CommandSpeech, NullSpeech, RecordingSpeech, SpeechSink, speech_excerpt};
pub use state::{AppState, Notice, NoticeKind, UiEvent, VaultForm};
pub use transport::{ChatTransport, RepositoryHost};

pub use orion_config::{
    ConfigError, CredentialStore, FileCredentialStore, MemoryCredentialStore, OrionConfig,
    StoreError, orion_dir,
};
pub use orion_providers::{
    self, CreatedRepository, DeployError, GeminiClient, GenerateError, GitHubClient, RetryConfig,
};
pub use orion_types::ui::{Tab, Theme};
pub use orion_types::{CredentialName, Message, PersonaId, Role};

use orion_providers::{DEFAULT_GEMINI_MODEL, GEMINI_API_BASE_URL, GITHUB_API_BASE_URL};

/// Settings resolved from config before the app starts.
#[derive(Debug, Clone)]
pub struct AppOptions {
    pub initial_persona: PersonaId,
    pub theme: Theme,
    pub voice: bool,
    pub speech_max_chars: usize,
    pub retry: RetryConfig,
    /// Where "export preview" writes. `None` disables export.
    pub preview_path: Option<PathBuf>,
}

impl Default for AppOptions {
    fn default() -> Self {
        Self {
            initial_persona: PersonaId::default(),
            theme: Theme::default(),
            voice: false,
            speech_max_chars: orion_config::DEFAULT_SPEECH_MAX_CHARS,
            retry: RetryConfig::default(),
            preview_path: orion_config::orion_dir().map(|dir| dir.join("preview.html")),
        }
    }
}

impl AppOptions {
    #[must_use]
    pub fn from_config(config: Option<&OrionConfig>) -> Self {
        let Some(config) = config else {
            return Self::default();
        };
        let retry = config.retry();
        Self {
            initial_persona: config.initial_persona(),
            theme: config.theme(),
            voice: config.voice_enabled(),
            speech_max_chars: config.speech_max_chars(),
            retry: RetryConfig {
                max_attempts: retry.max_attempts,
                initial_delay: retry.initial_delay,
                max_delay: retry.max_delay,
                jitter_factor: retry.jitter_factor,
                attempt_timeout: retry.request_timeout,
            },
            ..Self::default()
        }
    }
}

/// The collaborators the controller drives.
pub struct Services {
    pub store: Box<dyn CredentialStore>,
    pub transport: Arc<dyn ChatTransport>,
    pub host: Arc<dyn RepositoryHost>,
    pub speech: Box<dyn SpeechSink>,
    /// Shown on the first frame, e.g. when the vault could not be opened.
    pub startup_notice: Option<Notice>,
}

impl Services {
    /// Real services: the on-disk vault, Gemini, GitHub, and the configured speech command.
    #[must_use]
    pub fn from_config(config: Option<&OrionConfig>) -> Self {
        let (store, startup_notice) = open_vault(FileCredentialStore::open_default());

        let gemini = GeminiClient::new(
            config
                .and_then(OrionConfig::gemini_base_url)
                .unwrap_or(GEMINI_API_BASE_URL),
            config
                .and_then(OrionConfig::gemini_model)
                .unwrap_or(DEFAULT_GEMINI_MODEL),
        );
        let github = GitHubClient::new(
            config
                .and_then(OrionConfig::github_base_url)
                .unwrap_or(GITHUB_API_BASE_URL),
        );
        let speech: Box<dyn SpeechSink> = match config.and_then(OrionConfig::voice_command) {
            Some((program, args)) => Box::new(CommandSpeech::new(program, args.to_vec())),
            None => Box::new(NullSpeech),
        };

        Self {
            store,
            transport: Arc::new(gemini),
            host: Arc::new(github),
            speech,
            startup_notice,
        }
    }
}

/// The opened vault, or an empty in-memory one plus an error notice.
///
/// Credentials entered into the fallback last for the session only, and the
/// file on disk is left untouched.
fn open_vault(
    opened: Result<FileCredentialStore, StoreError>,
) -> (Box<dyn CredentialStore>, Option<Notice>) {
    match opened {
        Ok(store) => (Box::new(store), None),
        Err(e) => {
            tracing::warn!("Vault unavailable, using a session-only store: {e}");
            let notice = Notice::error(format!(
                "Vault unavailable ({e}). Credentials will not be saved this session."
            ));
            (Box::new(MemoryCredentialStore::default()), Some(notice))
        }
    }
}

/// Application controller. Owns the state, the log, and every side effect.
pub struct App {
    options: AppOptions,
    state: AppState,
    engine: ConversationEngine,
    store: Box<dyn CredentialStore>,
    transport: Arc<dyn ChatTransport>,
    host: Arc<dyn RepositoryHost>,
    speech: Box<dyn SpeechSink>,
    deploy: Option<DeployTask>,
}

impl App {
    #[must_use]
    pub fn new(options: AppOptions, services: Services) -> Self {
        let state = AppState::new(options.initial_persona, options.theme, options.voice);
        let engine = ConversationEngine::new(Arc::clone(&services.transport), options.retry.clone());
        let state = match services.startup_notice {
            Some(notice) => state.apply(UiEvent::ShowNotice(notice)),
            None => state,
        };
        Self {
            options,
            state,
            engine,
            store: services.store,
            transport: services.transport,
            host: services.host,
            speech: services.speech,
            deploy: None,
        }
    }

    #[must_use]
    pub fn from_config(config: Option<&OrionConfig>) -> Self {
        Self::new(AppOptions::from_config(config), Services::from_config(config))
    }

    #[must_use]
    pub fn state(&self) -> &AppState {
        &self.state
    }

    #[must_use]
    pub fn log(&self) -> &[Message] {
        self.engine.log().messages()
    }

    #[must_use]
    pub fn is_generating(&self) -> bool {
        self.engine.is_generating()
    }

    #[must_use]
    pub fn is_deploying(&self) -> bool {
        self.deploy.is_some()
    }

    #[must_use]
    pub fn credential(&self, name: CredentialName) -> &str {
        self.store.get(name)
    }

    /// Credential value for display. Values longer than eight characters keep
    /// their last four visible; shorter ones are fully hidden.
    #[must_use]
    pub fn masked_credential(&self, name: CredentialName) -> String {
        mask_secret(self.store.get(name))
    }

    #[must_use]
    pub fn preview(&self) -> Option<&str> {
        latest_preview(self.log())
    }

    pub fn dispatch(&mut self, event: UiEvent) {
        let begins_edit =
            matches!(event, UiEvent::BeginCredentialEdit) && self.state.vault.editing.is_none();
        let state = std::mem::take(&mut self.state);
        self.state = state.apply(event);
        if begins_edit {
            self.seed_credential_edit();
        }
    }

    /// An edit starts from the stored value, so committing it unchanged keeps it.
    fn seed_credential_edit(&mut self) {
        let name = self.state.vault.selected_name();
        if let Some(buffer) = self.state.vault.editing.as_mut() {
            buffer.push_str(self.store.get(name));
        }
    }

    /// Send the chat draft to the active persona.
    pub fn submit(&mut self) -> SubmitOutcome {
        let draft = std::mem::take(&mut self.state.draft);
        let outcome = self.submit_text(&draft);
        if !outcome.is_sent() {
            self.state.draft = draft;
        }
        outcome
    }

    /// Shared send path for the composer and any other input source.
    pub fn submit_text(&mut self, raw: &str) -> SubmitOutcome {
        let api_key = self.store.get(CredentialName::Gemini);
        self.engine.submit(raw, self.state.persona, api_key)
    }

    pub fn cancel_generation(&mut self) {
        self.engine.cancel_all();
    }

    /// Advance background work: commit finished turns, speak them, and
    /// surface a finished deployment.
    pub fn tick(&mut self) {
        let before = self.engine.log().len();
        let appended = self.engine.poll();
        if appended > 0 {
            self.speak_new_replies(before);
        }

        if let Some(task) = self.deploy.as_mut()
            && let Some(result) = task.try_finish()
        {
            self.deploy = None;
            self.dispatch(UiEvent::ShowNotice(deploy_notice(&result)));
        }
    }

    /// Wait for every outstanding turn and deployment to finish.
    pub async fn settle(&mut self) {
        let before = self.engine.log().len();
        self.engine.settle().await;
        self.speak_new_replies(before);

        if let Some(task) = self.deploy.take() {
            let result = task.finish().await;
            self.dispatch(UiEvent::ShowNotice(deploy_notice(&result)));
        }
    }

    fn speak_new_replies(&mut self, from: usize) {
        if !self.state.voice {
            return;
        }
        let max_chars = self.options.speech_max_chars;
        for message in &self.engine.log().messages()[from..] {
            if message.role() == Role::Assistant {
                self.speech.speak(speech_excerpt(message.text(), max_chars));
            }
        }
    }

    /// Store the value typed into the Vault form.
    pub fn commit_credential_edit(&mut self) {
        let Some(value) = self.state.vault.editing.take() else {
            return;
        };
        let name = self.state.vault.selected_name();
        let notice = match self.store.set(name, value.trim()) {
            Ok(()) if value.trim().is_empty() => Notice::info(format!("{} removed.", name.label())),
            Ok(()) => Notice::info(format!("{} saved.", name.label())),
            Err(e) => {
                tracing::warn!("Failed to save credential: {e}");
                Notice::error(format!("Could not save {}: {e}", name.label()))
            }
        };
        self.dispatch(UiEvent::ShowNotice(notice));
    }

    /// Set one credential directly.
    pub fn set_credential(&mut self, name: CredentialName, value: &str) -> Result<(), StoreError> {
        self.store.set(name, value)
    }

    /// Remove every stored credential and reload the whole application state.
    pub fn wipe_credentials(&mut self) {
        if let Err(e) = self.store.clear_all() {
            tracing::warn!("Failed to wipe vault: {e}");
            self.dispatch(UiEvent::ShowNotice(Notice::error(format!(
                "Could not wipe the vault: {e}"
            ))));
            return;
        }
        self.reload();
        self.dispatch(UiEvent::ShowNotice(Notice::info("Vault wiped.")));
    }

    fn reload(&mut self) {
        self.engine.cancel_all();
        self.engine = ConversationEngine::new(Arc::clone(&self.transport), self.options.retry.clone());
        self.deploy = None;
        self.state = AppState::new(
            self.options.initial_persona,
            self.options.theme,
            self.options.voice,
        );
        tracing::info!("Application state reloaded");
    }

    /// Create a repository named after the Deploy tab's input.
    pub fn deploy(&mut self) {
        if self.deploy.is_some() {
            return;
        }
        let name = self.state.repo_name.trim().to_string();
        let token = self.store.get(CredentialName::GitHub);

        let precheck = if token.is_empty() {
            Some(DeployError::MissingToken)
        } else if name.is_empty() {
            Some(DeployError::InvalidName)
        } else {
            None
        };
        if let Some(err) = precheck {
            self.dispatch(UiEvent::ShowNotice(deploy_notice(&Err(err))));
            return;
        }

        self.deploy = Some(DeployTask::spawn(&self.host, token, &name));
        self.dispatch(UiEvent::ShowNotice(Notice::info(format!(
            "Creating repository {name}..."
        ))));
    }

    /// Write the current preview to disk.
    pub fn export_preview(&mut self) {
        let notice = match (self.preview(), self.options.preview_path.as_deref()) {
            (None, _) => Notice::error("Nothing to export: the latest reply has no HTML."),
            (Some(_), None) => Notice::error("No data directory available for the preview."),
            (Some(html), Some(path)) => match export_preview(path, html) {
                Ok(()) => Notice::info(format!("Preview saved to {}", path.display())),
                Err(e) => Notice::error(format!("Could not save preview: {e}")),
            },
        };
        self.dispatch(UiEvent::ShowNotice(notice));
    }
}

fn mask_secret(value: &str) -> String {
    let count = value.chars().count();
    let visible = if count > 8 { 4 } else { 0 };
    let tail: String = value.chars().skip(count - visible).collect();
    format!("{}{tail}", "•".repeat(count - visible))
}
