//! TUI rendering for Orion using ratatui.

mod format;
mod input;
mod theme;

pub use input::{Action, InputPump, action_for_key, apply_event, handle_events};
pub use theme::{Palette, glyphs, palette, spinner_frame, styles};

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Position, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph},
};

use orion_engine::{App, CredentialName, Message, NoticeKind, Role, Tab};
use orion_types::sanitize_terminal_text;

use self::format::{fit_tail, wrap_text};

const APP_TITLE: &str = "Orion Architect";
const EMPTY_CHAT: &str = "Awaiting Brainstorm...";
const THINKING: &str = "The Team is thinking...";

/// Main draw function. `tick` drives the spinner.
pub fn draw(frame: &mut Frame, app: &App, tick: usize) {
    let palette = palette(app.state().theme);
    frame.render_widget(Block::default().style(styles::base(&palette)), frame.area());

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Header + tabs
            Constraint::Min(3),    // Tab body
            Constraint::Length(1), // Notice
            Constraint::Length(1), // Status bar
        ])
        .split(frame.area());

    draw_header(frame, app, chunks[0], &palette);
    match app.state().tab {
        Tab::Chat => draw_chat(frame, app, chunks[1], &palette),
        Tab::Vault => draw_vault(frame, app, chunks[1], &palette),
        Tab::Deploy => draw_deploy(frame, app, chunks[1], &palette),
    }
    draw_notice(frame, app, chunks[2], &palette);
    draw_status_bar(frame, app, chunks[3], &palette, tick);
}

fn draw_header(frame: &mut Frame, app: &App, area: Rect, palette: &Palette) {
    let state = app.state();
    let mut spans = vec![
        Span::styled(
            format!(" {APP_TITLE} "),
            Style::default()
                .fg(palette.primary)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(" "),
    ];
    for tab in Tab::ALL {
        let style = if tab == state.tab {
            styles::tab_active(palette)
        } else {
            styles::key_hint(palette)
        };
        spans.push(Span::styled(format!(" {} ", tab.title()), style));
        spans.push(Span::raw(" "));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), area);

    let mut right = vec![Span::styled(
        format!("{} ", state.theme.as_str()),
        styles::key_hint(palette),
    )];
    if state.voice {
        right.insert(
            0,
            Span::styled(format!("{} ", glyphs::VOICE_ON), styles::key_highlight(palette)),
        );
    }
    frame.render_widget(
        Paragraph::new(Line::from(right)).alignment(Alignment::Right),
        area,
    );
}

fn draw_chat(frame: &mut Frame, app: &App, area: Rect, palette: &Palette) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Persona bar
            Constraint::Min(1),    // Messages (+ preview)
            Constraint::Length(3), // Composer
        ])
        .split(area);

    draw_persona_bar(frame, app, rows[0], palette);

    if app.state().preview {
        let cols = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
            .split(rows[1]);
        draw_messages(frame, app, cols[0], palette);
        draw_preview(frame, app, cols[1], palette);
    } else {
        draw_messages(frame, app, rows[1], palette);
    }

    let persona = app.state().persona.persona();
    let title = format!(" Message {} ", persona.name);
    draw_text_input(
        frame,
        rows[2],
        palette,
        &title,
        &app.state().draft,
        palette.accent(persona.accent),
    );
}

fn draw_persona_bar(frame: &mut Frame, app: &App, area: Rect, palette: &Palette) {
    let active = app.state().persona;
    let mut spans = Vec::new();
    for (i, id) in orion_engine::PersonaId::ALL.into_iter().enumerate() {
        let persona = id.persona();
        let color = palette.accent(persona.accent);
        let style = if id == active {
            Style::default()
                .fg(palette.bg)
                .bg(color)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(color)
        };
        spans.push(Span::styled(
            format!(" F{} {} · {} ", i + 1, persona.name, persona.role),
            style,
        ));
        spans.push(Span::raw(" "));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn message_header(message: &Message, palette: &Palette) -> Line<'static> {
    let (icon, name, style) = match message.role() {
        Role::User => (glyphs::USER, "You".to_string(), styles::user_name(palette)),
        Role::Assistant => {
            let persona = message.persona().unwrap_or_default().persona();
            (
                glyphs::ASSISTANT,
                format!("{} · {}", persona.name, persona.role),
                Style::default()
                    .fg(palette.accent(persona.accent))
                    .add_modifier(Modifier::BOLD),
            )
        }
        Role::System => (
            glyphs::SYSTEM,
            "System".to_string(),
            Style::default()
                .fg(palette.error)
                .add_modifier(Modifier::BOLD),
        ),
    };
    Line::from(vec![
        Span::styled(format!("{icon} "), style),
        Span::styled(name, style),
    ])
}

fn draw_messages(frame: &mut Frame, app: &App, area: Rect, palette: &Palette) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(styles::border(palette));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let messages = app.log();
    if messages.is_empty() {
        let empty = Paragraph::new(Line::from(Span::styled(
            EMPTY_CHAT,
            styles::key_hint(palette),
        )))
        .alignment(Alignment::Center);
        let middle = Rect {
            y: inner.y + inner.height / 2,
            height: inner.height.min(1),
            ..inner
        };
        frame.render_widget(empty, middle);
        return;
    }

    let width = usize::from(inner.width.saturating_sub(2));
    let text_style = Style::default().fg(palette.text);
    let mut lines: Vec<Line> = Vec::new();
    for (i, message) in messages.iter().enumerate() {
        if i > 0 {
            lines.push(Line::from(""));
        }
        lines.push(message_header(message, palette));
        let body = sanitize_terminal_text(message.text());
        for row in wrap_text(&body, width) {
            lines.push(Line::from(Span::styled(format!("  {row}"), text_style)));
        }
    }

    // Keep the newest message in view.
    let overflow = lines.len().saturating_sub(usize::from(inner.height));
    let visible: Vec<Line> = lines.into_iter().skip(overflow).collect();
    frame.render_widget(Paragraph::new(visible), inner);
}

fn draw_preview(frame: &mut Frame, app: &App, area: Rect, palette: &Palette) {
    let block = Block::default()
        .title(" Preview (Ctrl+S export) ")
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(styles::border(palette))
        .style(Style::default().bg(palette.bg_panel));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let Some(html) = app.preview() else {
        frame.render_widget(
            Paragraph::new(Span::styled(
                "No HTML in the latest reply.",
                styles::key_hint(palette),
            )),
            inner,
        );
        return;
    };

    let html = sanitize_terminal_text(html);
    let lines: Vec<Line> = wrap_text(&html, usize::from(inner.width))
        .into_iter()
        .take(usize::from(inner.height))
        .map(|row| Line::from(Span::styled(row, Style::default().fg(palette.text))))
        .collect();
    frame.render_widget(Paragraph::new(lines), inner);
}

/// Single-line bordered input showing the tail of `text`, with the cursor at the end.
fn draw_text_input(
    frame: &mut Frame,
    area: Rect,
    palette: &Palette,
    title: &str,
    text: &str,
    accent: Color,
) {
    let block = Block::default()
        .title(title.to_string())
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(accent));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let flat = sanitize_terminal_text(text).replace('\n', " ");
    let (tail, used) = fit_tail(&flat, usize::from(inner.width.saturating_sub(1)));
    frame.render_widget(
        Paragraph::new(Span::styled(tail.to_string(), Style::default().fg(palette.text))),
        inner,
    );
    if inner.height > 0 {
        let x = inner.x + u16::try_from(used).unwrap_or(inner.width);
        frame.set_cursor_position(Position::new(x, inner.y));
    }
}

fn draw_vault(frame: &mut Frame, app: &App, area: Rect, palette: &Palette) {
    let state = app.state();
    let block = Block::default()
        .title(" Vault ")
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(styles::border(palette));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let selected = state.vault.selected_name();
    let mut lines = vec![
        Line::from(Span::styled(
            "Credentials are stored on this machine only.",
            styles::key_hint(palette),
        )),
        Line::from(""),
    ];
    for name in CredentialName::ALL {
        let is_selected = name == selected;
        let marker = if is_selected { glyphs::SELECTED } else { " " };
        let value = match (&state.vault.editing, is_selected) {
            (Some(buffer), true) => "•".repeat(buffer.chars().count()),
            _ if app.credential(name).is_empty() => "(not set)".to_string(),
            _ => app.masked_credential(name),
        };
        let label_style = if is_selected {
            styles::key_highlight(palette)
        } else {
            Style::default().fg(palette.text)
        };
        lines.push(Line::from(vec![
            Span::styled(format!("{marker} {:<16} ", name.label()), label_style),
            Span::styled(value, Style::default().fg(palette.text_muted)),
        ]));
    }
    frame.render_widget(Paragraph::new(lines), inner);

    if let Some(buffer) = &state.vault.editing {
        let row = 2 + CredentialName::ALL
            .iter()
            .position(|n| *n == selected)
            .unwrap_or(0);
        let x = inner.x + 19 + u16::try_from(buffer.chars().count()).unwrap_or(0);
        let y = inner.y + u16::try_from(row).unwrap_or(0);
        if y < inner.y + inner.height && x < inner.x + inner.width {
            frame.set_cursor_position(Position::new(x, y));
        }
    }
}

fn draw_deploy(frame: &mut Frame, app: &App, area: Rect, palette: &Palette) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(1)])
        .split(area);

    draw_text_input(
        frame,
        rows[0],
        palette,
        " Repository name ",
        &app.state().repo_name,
        palette.primary,
    );

    let token = if app.credential(CredentialName::GitHub).is_empty() {
        Span::styled(
            "GitHub token: missing (set it in the Vault)",
            Style::default().fg(palette.error),
        )
    } else {
        Span::styled("GitHub token: set", Style::default().fg(palette.success))
    };
    let mut lines = vec![Line::from(token)];
    if app.is_deploying() {
        lines.push(Line::from(Span::styled(
            "Creating repository...",
            styles::key_highlight(palette),
        )));
    }
    frame.render_widget(Paragraph::new(lines), rows[1]);
}

fn draw_notice(frame: &mut Frame, app: &App, area: Rect, palette: &Palette) {
    let Some(notice) = &app.state().notice else {
        return;
    };
    let color = match notice.kind {
        NoticeKind::Info => palette.success,
        NoticeKind::Error => palette.error,
    };
    let text = sanitize_terminal_text(&notice.text).replace('\n', " ");
    frame.render_widget(
        Paragraph::new(Span::styled(format!(" {text}"), Style::default().fg(color))),
        area,
    );
}

fn draw_status_bar(frame: &mut Frame, app: &App, area: Rect, palette: &Palette, tick: usize) {
    let line = if app.is_generating() {
        Line::from(vec![
            Span::styled(
                format!(" {} ", spinner_frame(tick)),
                styles::key_highlight(palette),
            ),
            Span::styled(THINKING, Style::default().fg(palette.text)),
            Span::styled("  Esc cancel", styles::key_hint(palette)),
        ])
    } else {
        let hints: &[(&str, &str)] = match app.state().tab {
            Tab::Chat => &[
                ("Enter", "send"),
                ("F1-F4", "persona"),
                ("Ctrl+O", "preview"),
                ("Ctrl+V", "voice"),
            ],
            Tab::Vault => &[("Enter", "edit"), ("↑/↓", "select"), ("Ctrl+W", "wipe")],
            Tab::Deploy => &[("Enter", "create repository")],
        };
        let mut spans = vec![Span::raw(" ")];
        for (key, label) in hints
            .iter()
            .chain(&[("Tab", "switch"), ("Ctrl+T", "theme"), ("Ctrl+Q", "quit")])
        {
            spans.push(Span::styled(*key, styles::key_highlight(palette)));
            spans.push(Span::styled(format!(" {label}  "), styles::key_hint(palette)));
        }
        Line::from(spans)
    };
    frame.render_widget(Paragraph::new(line), area);
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use futures_util::future::BoxFuture;
    use ratatui::{Terminal, backend::TestBackend};

    use orion_engine::{
        AppOptions, ChatTransport, GenerateError, GitHubClient, MemoryCredentialStore, NullSpeech,
        PersonaId, RetryConfig, Services, UiEvent,
    };

    use super::*;

    struct Echo;

    impl ChatTransport for Echo {
        fn generate(
            &self,
            _api_key: &str,
            _prompt: &str,
        ) -> BoxFuture<'static, Result<Option<String>, GenerateError>> {
            Box::pin(async { Ok(Some("```html\n<h1>Launch</h1>\n```".to_string())) })
        }
    }

    fn test_app(store: MemoryCredentialStore) -> App {
        let options = AppOptions {
            retry: RetryConfig {
                initial_delay: Duration::from_millis(1),
                max_delay: Duration::from_millis(1),
                attempt_timeout: None,
                ..RetryConfig::default()
            },
            preview_path: None,
            ..AppOptions::default()
        };
        App::new(
            options,
            Services {
                store: Box::new(store),
                transport: Arc::new(Echo),
                host: Arc::new(GitHubClient::new("http://127.0.0.1:9")),
                speech: Box::new(NullSpeech),
                startup_notice: None,
            },
        )
    }

    fn render(app: &App, tick: usize) -> String {
        let mut terminal = Terminal::new(TestBackend::new(100, 24)).unwrap();
        terminal.draw(|frame| draw(frame, app, tick)).unwrap();
        let buffer = terminal.backend().buffer();
        let mut out = String::new();
        for y in 0..buffer.area.height {
            for x in 0..buffer.area.width {
                out.push_str(buffer[(x, y)].symbol());
            }
            out.push('\n');
        }
        out
    }

    #[test]
    fn empty_chat_shows_placeholder_and_title() {
        let app = test_app(MemoryCredentialStore::default());
        let screen = render(&app, 0);
        assert!(screen.contains(APP_TITLE));
        assert!(screen.contains(EMPTY_CHAT));
        assert!(screen.contains("Bolt"));
        assert!(!screen.contains(THINKING));
    }

    #[tokio::test]
    async fn thinking_indicator_and_reply_render() {
        let mut app = test_app(MemoryCredentialStore::with(CredentialName::Gemini, "key"));
        app.dispatch(UiEvent::SelectPersona(PersonaId::Justus));
        app.submit_text("Draft the terms");

        let screen = render(&app, 0);
        assert!(screen.contains(THINKING));
        assert!(screen.contains("Draft the terms"));

        app.settle().await;
        let screen = render(&app, 1);
        assert!(!screen.contains(THINKING));
        assert!(screen.contains(PersonaId::Justus.persona().name));
    }

    #[tokio::test]
    async fn preview_pane_shows_latest_html() {
        let mut app = test_app(MemoryCredentialStore::with(CredentialName::Gemini, "key"));
        app.submit_text("landing page");
        app.settle().await;
        app.dispatch(UiEvent::TogglePreview);

        let screen = render(&app, 0);
        assert!(screen.contains("Preview"));
        assert!(screen.contains("<h1>Launch</h1>"));
    }

    #[test]
    fn vault_masks_credentials() {
        let app = test_app(MemoryCredentialStore::with(
            CredentialName::Gemini,
            "AIzaSecretValue1234",
        ));
        let mut app = app;
        app.dispatch(UiEvent::SwitchTab(Tab::Vault));

        let screen = render(&app, 0);
        assert!(screen.contains("Gemini API Key"));
        assert!(screen.contains("1234"));
        assert!(!screen.contains("AIzaSecret"));
        assert!(screen.contains("(not set)"));
    }

    #[test]
    fn deploy_tab_reports_missing_token() {
        let mut app = test_app(MemoryCredentialStore::default());
        app.dispatch(UiEvent::SwitchTab(Tab::Deploy));
        app.dispatch(UiEvent::InsertText("my-site".to_string()));

        let screen = render(&app, 0);
        assert!(screen.contains("my-site"));
        assert!(screen.contains("GitHub token: missing"));
    }

    #[test]
    fn light_theme_is_labelled() {
        let mut app = test_app(MemoryCredentialStore::default());
        app.dispatch(UiEvent::ToggleTheme);
        assert!(render(&app, 0).contains("light"));
    }
}
