//! Removal of terminal control sequences from captured process output.
//!
//! Local model runners draw spinners and progress indicators on their
//! output stream even when it is not a TTY. Those CSI sequences must be
//! removed before the text can be parsed as JSON or scanned line by line.

use std::borrow::Cow;
use std::sync::OnceLock;

use regex_lite::Regex;

/// ESC `[`, parameter bytes 0x30-0x3F, intermediate bytes 0x20-0x2F,
/// final byte 0x40-0x7E.
const CSI_PATTERN: &str = r"\x1B\[[0-?]*[ -/]*[@-~]";

static CSI_RE: OnceLock<Regex> = OnceLock::new();

#[allow(clippy::expect_used)]
fn csi_regex() -> &'static Regex {
    CSI_RE.get_or_init(|| Regex::new(CSI_PATTERN).expect("valid CSI regex"))
}

/// Remove every CSI escape sequence from `text`.
///
/// Borrows the input when it contains no escape byte at all, which is the
/// common case for well-behaved runners.
///
/// ```
/// use triage_ansi_escape::strip_ansi;
///
/// assert_eq!(strip_ansi("\u{1b}[2K\u{1b}[1Gok"), "ok");
/// assert_eq!(strip_ansi("plain"), "plain");
/// ```
pub fn strip_ansi(text: &str) -> Cow<'_, str> {
    if !text.contains('\u{1b}') {
        return Cow::Borrowed(text);
    }
    let stripped = csi_regex().replace_all(text, "");
    tracing::trace!(
        removed_bytes = text.len() - stripped.len(),
        "stripped terminal escape sequences"
    );
    stripped
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn removes_spinner_and_cursor_moves() {
        let raw = "\u{1b}[?25l\u{1b}[2K\u{1b}[1G⠙ \u{1b}[?25h{\"a\": 1}";
        assert_eq!(strip_ansi(raw), "⠙ {\"a\": 1}");
    }

    #[test]
    fn removes_color_codes_with_parameters() {
        assert_eq!(strip_ansi("\u{1b}[1;31mErro\u{1b}[0m"), "Erro");
    }

    #[test]
    fn borrows_when_nothing_to_strip() {
        assert!(matches!(strip_ansi("sem escapes"), Cow::Borrowed(_)));
    }

    #[test]
    fn lone_escape_byte_is_kept() {
        // Not a CSI sequence: no '[' after ESC.
        assert_eq!(strip_ansi("a\u{1b}b"), "a\u{1b}b");
    }
}
