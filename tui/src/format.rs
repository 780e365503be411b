//! Width-aware text helpers for the renderer.

use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Hard-wrap `text` into rows no wider than `width` columns.
///
/// Breaks at the last space when one exists in the row, otherwise mid-word.
/// Explicit newlines always start a new row.
pub(crate) fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut rows = Vec::new();

    for line in text.split('\n') {
        let mut row = String::new();
        let mut row_width = 0;
        for c in line.chars() {
            let w = c.width().unwrap_or(0);
            if row_width + w > width && !row.is_empty() {
                if c == ' ' {
                    rows.push(std::mem::take(&mut row));
                    row_width = 0;
                    continue;
                }
                match row.rfind(' ') {
                    Some(space) if space > 0 => {
                        let carry = row[space + 1..].to_string();
                        row.truncate(space);
                        rows.push(std::mem::take(&mut row));
                        row_width = carry.width();
                        row = carry;
                    }
                    _ => {
                        rows.push(std::mem::take(&mut row));
                        row_width = 0;
                    }
                }
            }
            row.push(c);
            row_width += w;
        }
        rows.push(row);
    }
    rows
}

/// Longest suffix of `text` that fits in `width` columns, with its width.
pub(crate) fn fit_tail(text: &str, width: usize) -> (&str, usize) {
    let mut used = 0;
    let mut start = text.len();
    for (idx, c) in text.char_indices().rev() {
        let w = c.width().unwrap_or(0);
        if used + w > width {
            break;
        }
        used += w;
        start = idx;
    }
    (&text[start..], used)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wraps_at_spaces() {
        assert_eq!(wrap_text("hello brave world", 11), vec!["hello brave", "world"]);
    }

    #[test]
    fn long_words_break_mid_word() {
        assert_eq!(wrap_text("abcdefgh", 3), vec!["abc", "def", "gh"]);
    }

    #[test]
    fn newlines_start_rows() {
        assert_eq!(wrap_text("a\n\nb", 10), vec!["a", "", "b"]);
    }

    #[test]
    fn wide_characters_count_double() {
        assert_eq!(wrap_text("日本語", 4), vec!["日本", "語"]);
    }

    #[test]
    fn tail_keeps_the_end() {
        assert_eq!(fit_tail("hello world", 5), ("world", 5));
        assert_eq!(fit_tail("hi", 5), ("hi", 2));
        assert_eq!(fit_tail("日本", 3), ("本", 2));
    }
}
