//! Explicit UI state with pure transitions.
//!
//! Everything the renderer needs that is not the conversation log lives in
//! [`AppState`]. [`AppState::apply`] maps `(state, event)` to the next state
//! and performs no IO; side effects belong to [`crate::App`].

use orion_types::ui::{Tab, Theme};
use orion_types::{CredentialName, PersonaId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Info,
    Error,
}

/// One-shot message shown until dismissed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub text: String,
}

impl Notice {
    #[must_use]
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Info,
            text: text.into(),
        }
    }

    #[must_use]
    pub fn error(text: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Error,
            text: text.into(),
        }
    }
}

/// Credential form on the Vault tab.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VaultForm {
    pub selected: usize,
    /// `Some` while the selected field is being edited.
    pub editing: Option<String>,
}

impl VaultForm {
    #[must_use]
    pub fn selected_name(&self) -> CredentialName {
        CredentialName::ALL[self.selected % CredentialName::ALL.len()]
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEvent {
    SelectPersona(PersonaId),
    NextPersona,
    PreviousPersona,
    ToggleTheme,
    SwitchTab(Tab),
    NextTab,
    /// Typed into whichever buffer the active tab owns.
    InsertChar(char),
    InsertText(String),
    Backspace,
    ClearInput,
    ToggleVoice,
    TogglePreview,
    NextCredential,
    PreviousCredential,
    BeginCredentialEdit,
    CancelCredentialEdit,
    ShowNotice(Notice),
    DismissNotice,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppState {
    pub tab: Tab,
    pub theme: Theme,
    pub persona: PersonaId,
    /// Chat composer contents.
    pub draft: String,
    pub vault: VaultForm,
    /// Repository name on the Deploy tab.
    pub repo_name: String,
    pub voice: bool,
    pub preview: bool,
    pub notice: Option<Notice>,
}

impl AppState {
    #[must_use]
    pub fn new(persona: PersonaId, theme: Theme, voice: bool) -> Self {
        Self {
            tab: Tab::Chat,
            theme,
            persona,
            draft: String::new(),
            vault: VaultForm::default(),
            repo_name: String::new(),
            voice,
            preview: false,
            notice: None,
        }
    }

    #[must_use]
    pub fn apply(mut self, event: UiEvent) -> Self {
        match event {
            UiEvent::SelectPersona(id) => self.persona = id,
            UiEvent::NextPersona => self.persona = self.persona.next(),
            UiEvent::PreviousPersona => self.persona = self.persona.prev(),
            UiEvent::ToggleTheme => self.theme = self.theme.toggle(),
            UiEvent::SwitchTab(tab) => self.tab = tab,
            UiEvent::NextTab => self.tab = self.tab.next(),
            UiEvent::InsertChar(c) => {
                if let Some(buffer) = self.active_buffer_mut() {
                    buffer.push(c);
                }
            }
            UiEvent::InsertText(text) => {
                if let Some(buffer) = self.active_buffer_mut() {
                    buffer.push_str(&text);
                }
            }
            UiEvent::Backspace => {
                if let Some(buffer) = self.active_buffer_mut() {
                    buffer.pop();
                }
            }
            UiEvent::ClearInput => {
                if let Some(buffer) = self.active_buffer_mut() {
                    buffer.clear();
                }
            }
            UiEvent::ToggleVoice => self.voice = !self.voice,
            UiEvent::TogglePreview => self.preview = !self.preview,
            UiEvent::NextCredential => {
                if self.vault.editing.is_none() {
                    self.vault.selected = (self.vault.selected + 1) % CredentialName::ALL.len();
                }
            }
            UiEvent::PreviousCredential => {
                if self.vault.editing.is_none() {
                    let len = CredentialName::ALL.len();
                    self.vault.selected = (self.vault.selected + len - 1) % len;
                }
            }
            UiEvent::BeginCredentialEdit => {
                if self.vault.editing.is_none() {
                    self.vault.editing = Some(String::new());
                }
            }
            UiEvent::CancelCredentialEdit => self.vault.editing = None,
            UiEvent::ShowNotice(notice) => self.notice = Some(notice),
            UiEvent::DismissNotice => self.notice = None,
        }
        self
    }

    /// Text buffer owned by the active tab, if it accepts typing right now.
    fn active_buffer_mut(&mut self) -> Option<&mut String> {
        match self.tab {
            Tab::Chat => Some(&mut self.draft),
            Tab::Vault => self.vault.editing.as_mut(),
            Tab::Deploy => Some(&mut self.repo_name),
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(PersonaId::default(), Theme::default(), false)
    }
}
