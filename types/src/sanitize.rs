//! Terminal text sanitization for model replies and remote error bodies.
//!
//! Remote text is untrusted. Escape sequences in it could move the cursor,
//! retitle the window, or write the clipboard (OSC 52), so everything
//! rendered in the terminal passes through [`sanitize_terminal_text`] first.

use std::borrow::Cow;

const ESC: char = '\x1b';
const BEL: char = '\x07';
/// C1 "control sequence introducer", the single-byte form of `ESC [`.
const C1_CSI: char = '\u{9b}';

#[derive(Clone, Copy)]
enum Scan {
    Text,
    /// Saw ESC, waiting for the sequence kind.
    Escape,
    /// Inside `ESC [` parameters, ends at a byte in `@..=~`.
    Csi,
    /// Inside an OSC/DCS/PM/APC string, ends at BEL or `ESC \`.
    StringCommand,
    /// Saw ESC inside a string command; `\` terminates it.
    StringEscape,
}

/// Strip escape sequences and control characters, keeping `\n`, `\t`, `\r`.
///
/// ```
/// use orion_types::sanitize_terminal_text;
///
/// assert_eq!(sanitize_terminal_text("plain"), "plain");
/// assert_eq!(sanitize_terminal_text("a\x1b[2Jb"), "ab");
/// ```
#[must_use]
pub fn sanitize_terminal_text(input: &str) -> Cow<'_, str> {
    if !input.chars().any(is_disallowed) {
        return Cow::Borrowed(input);
    }

    let mut out = String::with_capacity(input.len());
    let mut scan = Scan::Text;

    for c in input.chars() {
        scan = match scan {
            Scan::Text => {
                if c == ESC {
                    Scan::Escape
                } else if c == C1_CSI {
                    Scan::Csi
                } else {
                    if !is_disallowed(c) {
                        out.push(c);
                    }
                    Scan::Text
                }
            }
            Scan::Escape => match c {
                '[' => Scan::Csi,
                ']' | 'P' | '^' | '_' | 'X' => Scan::StringCommand,
                // Two-character sequences such as `ESC c` end here.
                _ => Scan::Text,
            },
            Scan::Csi => {
                if ('@'..='~').contains(&c) {
                    Scan::Text
                } else {
                    Scan::Csi
                }
            }
            Scan::StringCommand => match c {
                BEL => Scan::Text,
                ESC => Scan::StringEscape,
                _ => Scan::StringCommand,
            },
            Scan::StringEscape => {
                if c == '\\' {
                    Scan::Text
                } else {
                    Scan::StringCommand
                }
            }
        };
    }

    Cow::Owned(out)
}

fn is_disallowed(c: char) -> bool {
    if matches!(c, '\n' | '\t' | '\r') {
        return false;
    }
    c.is_ascii_control() || ('\u{80}'..='\u{9f}').contains(&c)
}
