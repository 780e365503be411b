//! Live HTML preview.
//!
//! Replies often carry a page inside a fenced `html` block. The preview pane
//! shows the last such block from the newest assistant reply, and it can be
//! exported to disk.

use std::io;
use std::path::Path;

use orion_types::{Message, Role};
use orion_utils::atomic_write;

const HTML_FENCE: &str = "```html";
const FENCE: &str = "```";

/// Extract the HTML document from one reply.
///
/// The last fenced `html` block wins. A reply that is itself a bare document
/// (starts with `<!DOCTYPE html` or `<html`) is returned whole.
#[must_use]
pub fn extract_html(text: &str) -> Option<&str> {
    if let Some(start) = rfind_ascii_case_insensitive(text, HTML_FENCE) {
        let after_tag = &text[start + HTML_FENCE.len()..];
        let body_start = after_tag.find('\n').map_or(after_tag.len(), |i| i + 1);
        let body = &after_tag[body_start..];
        let body = match body.find(FENCE) {
            Some(end) => &body[..end],
            // Unterminated fence: the reply was probably cut short.
            None => body,
        };
        let body = body.trim_matches('\n');
        return (!body.trim().is_empty()).then_some(body);
    }

    let trimmed = text.trim();
    let head: String = trimmed.chars().take(16).collect::<String>().to_ascii_lowercase();
    (head.starts_with("<!doctype html") || head.starts_with("<html")).then_some(trimmed)
}

/// HTML from the newest assistant message, if it has any.
#[must_use]
pub fn latest_preview(messages: &[Message]) -> Option<&str> {
    messages
        .iter()
        .rev()
        .find(|m| m.role() == Role::Assistant)
        .and_then(|m| extract_html(m.text()))
}

pub fn export_preview(path: &Path, html: &str) -> io::Result<()> {
    atomic_write(path, html.as_bytes())?;
    tracing::info!(path = %path.display(), bytes = html.len(), "Exported preview");
    Ok(())
}

fn rfind_ascii_case_insensitive(haystack: &str, needle: &str) -> Option<usize> {
    // ASCII lowercasing keeps byte offsets stable.
    haystack.to_ascii_lowercase().rfind(needle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use orion_types::{NonEmptyString, PersonaId};
    use std::time::SystemTime;

    fn assistant(text: &str) -> Message {
        Message::assistant(
            PersonaId::Mintaka,
            NonEmptyString::new(text).unwrap(),
            SystemTime::now(),
        )
    }

    #[test]
    fn extracts_fenced_block() {
        let reply = "Here you go:\n```html\n<h1>Hi</h1>\n```\nEnjoy.";
        assert_eq!(extract_html(reply), Some("<h1>Hi</h1>"));
    }

    #[test]
    fn last_block_wins() {
        let reply = "```html\n<p>old</p>\n```\nthen\n```HTML\n<p>new</p>\n```";
        assert_eq!(extract_html(reply), Some("<p>new</p>"));
    }

    #[test]
    fn unterminated_block_runs_to_end() {
        assert_eq!(extract_html("```html\n<div>cut"), Some("<div>cut"));
    }

    #[test]
    fn bare_document_is_accepted() {
        let doc = "  <!DOCTYPE html><html><body>x</body></html>\n";
        assert_eq!(
            extract_html(doc),
            Some("<!DOCTYPE html><html><body>x</body></html>")
        );
        assert_eq!(extract_html("no markup here"), None);
        assert_eq!(extract_html("```html\n\n```"), None);
    }

    #[test]
    fn latest_preview_ignores_non_assistant_messages() {
        let user = Message::user(
            NonEmptyString::new("```html\n<p>user</p>\n```").unwrap(),
            SystemTime::now(),
        );
        let messages = vec![assistant("```html\n<p>bot</p>\n```"), user];
        assert_eq!(latest_preview(&messages), Some("<p>bot</p>"));

        let messages = vec![assistant("```html\n<p>old</p>\n```"), assistant("plain")];
        assert_eq!(latest_preview(&messages), None);
    }

    #[test]
    fn export_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("preview.html");
        export_preview(&path, "<p>x</p>").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "<p>x</p>");
    }
}
