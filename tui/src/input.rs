//! Input handling for the Orion TUI.
//!
//! A blocking reader thread feeds crossterm events into a bounded channel;
//! the frame loop drains it with [`handle_events`]. Key mapping is a pure
//! function of the current state so it can be tested without a terminal.

use anyhow::{Result, anyhow};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};
use tokio::sync::mpsc;

use orion_engine::{App, AppState, PersonaId, Tab, UiEvent};

const INPUT_POLL_TIMEOUT: Duration = Duration::from_millis(25); // shutdown responsiveness
const INPUT_CHANNEL_CAPACITY: usize = 1024; // bounded: no OOM
const MAX_EVENTS_PER_FRAME: usize = 64; // never starve rendering

enum InputMsg {
    Event(Event),
    Error(String),
}

pub struct InputPump {
    rx: mpsc::Receiver<InputMsg>,
    stop: Arc<AtomicBool>,
    join: Option<tokio::task::JoinHandle<()>>,
}

impl InputPump {
    /// Start the reader thread. Must be called inside a tokio runtime.
    #[must_use]
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel(INPUT_CHANNEL_CAPACITY);
        let stop = Arc::new(AtomicBool::new(false));
        let stop2 = stop.clone();

        let join = tokio::task::spawn_blocking(move || input_loop(stop2, tx));
        Self {
            rx,
            stop,
            join: Some(join),
        }
    }

    pub async fn shutdown(&mut self) {
        // Close first so a reader blocked on a full channel wakes up.
        self.rx.close();

        self.stop.store(true, Ordering::Release);
        if let Some(join) = self.join.take() {
            let _ = tokio::time::timeout(Duration::from_secs(2), join).await;
        }
    }
}

impl Default for InputPump {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for InputPump {
    fn drop(&mut self) {
        // Do not block in Drop.
        self.rx.close();
        self.stop.store(true, Ordering::Release);
    }
}

fn input_loop(stop: Arc<AtomicBool>, tx: mpsc::Sender<InputMsg>) {
    while !stop.load(Ordering::Acquire) {
        match event::poll(INPUT_POLL_TIMEOUT) {
            Ok(true) => match event::read() {
                Ok(ev) => {
                    // Backpressure instead of dropping events.
                    if tx.blocking_send(InputMsg::Event(ev)).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    let _ = tx.blocking_send(InputMsg::Error(e.to_string()));
                    break;
                }
            },
            Ok(false) => {}
            Err(e) => {
                let _ = tx.blocking_send(InputMsg::Error(e.to_string()));
                break;
            }
        }
    }
}

/// What a key press asks the app to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Ui(UiEvent),
    Submit,
    CancelGeneration,
    CommitCredential,
    WipeVault,
    Deploy,
    ExportPreview,
    Quit,
}

/// Drain pending input. Returns `Ok(true)` when the user asked to quit.
pub fn handle_events(app: &mut App, input: &mut InputPump) -> Result<bool> {
    let mut processed = 0;
    while processed < MAX_EVENTS_PER_FRAME {
        let ev = match input.rx.try_recv() {
            Ok(InputMsg::Event(ev)) => ev,
            Ok(InputMsg::Error(msg)) => return Err(anyhow!("input error: {msg}")),
            Err(mpsc::error::TryRecvError::Empty) => break,
            Err(mpsc::error::TryRecvError::Disconnected) => {
                return Err(anyhow!("input pump disconnected"));
            }
        };
        processed += 1;

        if apply_event(app, ev) {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Apply one terminal event. Returns true on quit.
pub fn apply_event(app: &mut App, ev: Event) -> bool {
    let action = match ev {
        Event::Key(key) if key.kind != KeyEventKind::Release => {
            action_for_key(app.state(), app.is_generating(), key)
        }
        Event::Paste(text) => Some(Action::Ui(UiEvent::InsertText(normalize_paste(
            app.state(),
            &text,
        )))),
        _ => None,
    };
    let Some(action) = action else {
        return false;
    };

    match action {
        Action::Ui(event) => app.dispatch(event),
        Action::Submit => {
            app.submit();
        }
        Action::CancelGeneration => app.cancel_generation(),
        Action::CommitCredential => app.commit_credential_edit(),
        Action::WipeVault => app.wipe_credentials(),
        Action::Deploy => app.deploy(),
        Action::ExportPreview => app.export_preview(),
        Action::Quit => return true,
    }
    false
}

fn normalize_paste(state: &AppState, text: &str) -> String {
    let text = text.replace("\r\n", "\n").replace('\r', "\n");
    match state.tab {
        Tab::Chat => text,
        // Single-line fields.
        Tab::Vault | Tab::Deploy => text.lines().collect::<Vec<_>>().join(""),
    }
}

/// Map a key press to an action given the current state.
#[must_use]
pub fn action_for_key(state: &AppState, generating: bool, key: KeyEvent) -> Option<Action> {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    let editing = state.vault.editing.is_some();

    if ctrl {
        return match key.code {
            KeyCode::Char('c' | 'q') => Some(Action::Quit),
            KeyCode::Char('t') => Some(Action::Ui(UiEvent::ToggleTheme)),
            KeyCode::Char('n') => Some(Action::Ui(UiEvent::NextPersona)),
            KeyCode::Char('p') => Some(Action::Ui(UiEvent::PreviousPersona)),
            KeyCode::Char('v') => Some(Action::Ui(UiEvent::ToggleVoice)),
            KeyCode::Char('o') => Some(Action::Ui(UiEvent::TogglePreview)),
            KeyCode::Char('s') => Some(Action::ExportPreview),
            KeyCode::Char('u') => Some(Action::Ui(UiEvent::ClearInput)),
            KeyCode::Char('w') if state.tab == Tab::Vault && !editing => Some(Action::WipeVault),
            _ => None,
        };
    }

    match key.code {
        KeyCode::Tab if !editing => Some(Action::Ui(UiEvent::NextTab)),
        KeyCode::F(n @ 1..=4) => {
            let id = PersonaId::ALL[usize::from(n - 1)];
            Some(Action::Ui(UiEvent::SelectPersona(id)))
        }
        KeyCode::Esc => {
            if editing {
                Some(Action::Ui(UiEvent::CancelCredentialEdit))
            } else if generating && state.tab == Tab::Chat {
                Some(Action::CancelGeneration)
            } else {
                Some(Action::Ui(UiEvent::DismissNotice))
            }
        }
        KeyCode::Enter => match state.tab {
            Tab::Chat => Some(Action::Submit),
            Tab::Vault if editing => Some(Action::CommitCredential),
            Tab::Vault => Some(Action::Ui(UiEvent::BeginCredentialEdit)),
            Tab::Deploy => Some(Action::Deploy),
        },
        KeyCode::Up if state.tab == Tab::Vault => Some(Action::Ui(UiEvent::PreviousCredential)),
        KeyCode::Down if state.tab == Tab::Vault => Some(Action::Ui(UiEvent::NextCredential)),
        KeyCode::Backspace => Some(Action::Ui(UiEvent::Backspace)),
        KeyCode::Char(c) => Some(Action::Ui(UiEvent::InsertChar(c))),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orion_engine::Theme;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }

    fn state_on(tab: Tab) -> AppState {
        AppState::default().apply(UiEvent::SwitchTab(tab))
    }

    #[test]
    fn enter_depends_on_tab() {
        let chat = state_on(Tab::Chat);
        assert_eq!(
            action_for_key(&chat, false, key(KeyCode::Enter)),
            Some(Action::Submit)
        );

        let vault = state_on(Tab::Vault);
        assert_eq!(
            action_for_key(&vault, false, key(KeyCode::Enter)),
            Some(Action::Ui(UiEvent::BeginCredentialEdit))
        );
        let editing = vault.apply(UiEvent::BeginCredentialEdit);
        assert_eq!(
            action_for_key(&editing, false, key(KeyCode::Enter)),
            Some(Action::CommitCredential)
        );

        let deploy = state_on(Tab::Deploy);
        assert_eq!(
            action_for_key(&deploy, false, key(KeyCode::Enter)),
            Some(Action::Deploy)
        );
    }

    #[test]
    fn escape_cancels_generation_before_dismissing() {
        let chat = state_on(Tab::Chat);
        assert_eq!(
            action_for_key(&chat, true, key(KeyCode::Esc)),
            Some(Action::CancelGeneration)
        );
        assert_eq!(
            action_for_key(&chat, false, key(KeyCode::Esc)),
            Some(Action::Ui(UiEvent::DismissNotice))
        );
    }

    #[test]
    fn function_keys_select_personas() {
        let state = AppState::default();
        assert_eq!(
            action_for_key(&state, false, key(KeyCode::F(4))),
            Some(Action::Ui(UiEvent::SelectPersona(PersonaId::Justus)))
        );
        assert_eq!(action_for_key(&state, false, key(KeyCode::F(5))), None);
    }

    #[test]
    fn wipe_only_on_vault_tab() {
        assert_eq!(action_for_key(&state_on(Tab::Chat), false, ctrl('w')), None);
        assert_eq!(
            action_for_key(&state_on(Tab::Vault), false, ctrl('w')),
            Some(Action::WipeVault)
        );
    }

    #[test]
    fn control_chords_are_not_typed() {
        let state = AppState::new(PersonaId::Bolt, Theme::Dark, false);
        assert_eq!(
            action_for_key(&state, false, ctrl('t')),
            Some(Action::Ui(UiEvent::ToggleTheme))
        );
        assert_eq!(action_for_key(&state, false, ctrl('z')), None);
        assert_eq!(
            action_for_key(&state, false, key(KeyCode::Char('z'))),
            Some(Action::Ui(UiEvent::InsertChar('z')))
        );
    }

    #[test]
    fn paste_is_single_line_outside_chat() {
        assert_eq!(
            normalize_paste(&state_on(Tab::Chat), "a\r\nb"),
            "a\nb".to_string()
        );
        assert_eq!(normalize_paste(&state_on(Tab::Deploy), "site\n"), "site");
    }
}
