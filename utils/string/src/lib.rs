//! String helpers shared by the triage crates.
//!
//! Two concerns live here: taking bounded samples of model output without
//! splitting a character, and decoding uploaded bytes that may not be
//! UTF-8.

use std::borrow::Cow;

/// Marker appended to a sample when the source text was longer.
pub const ELLIPSIS: &str = "...";

/// Prefix of `s` holding at most `max_chars` characters.
///
/// # Examples
///
/// ```
/// use triage_utils_string::take_chars;
///
/// assert_eq!(take_chars("hello world", 5), "hello");
/// assert_eq!(take_chars("ação", 2), "aç");
/// assert_eq!(take_chars("ok", 10), "ok");
/// ```
#[inline]
pub fn take_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// Bounded sample of `s` for diagnostics.
///
/// Returns `s` unchanged when it has at most `max_chars` characters,
/// otherwise the first `max_chars` characters followed by [`ELLIPSIS`].
///
/// ```
/// use triage_utils_string::sample;
///
/// assert_eq!(sample("abcdef", 3), "abc...");
/// assert_eq!(sample("abc", 3), "abc");
/// ```
pub fn sample(s: &str, max_chars: usize) -> Cow<'_, str> {
    let head = take_chars(s, max_chars);
    if head.len() == s.len() {
        Cow::Borrowed(s)
    } else {
        Cow::Owned(format!("{head}{ELLIPSIS}"))
    }
}

/// Encoding that [`decode_text`] settled on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEncoding {
    Utf8,
    /// ISO-8859-1: every byte maps to the code point of the same value.
    Latin1,
}

/// Decode `bytes` as UTF-8, falling back to Latin-1 when they are not
/// valid UTF-8. Latin-1 decoding cannot fail, so this is total.
///
/// ```
/// use triage_utils_string::{decode_text, TextEncoding};
///
/// assert_eq!(decode_text("olá".as_bytes()), ("olá".to_string(), TextEncoding::Utf8));
/// assert_eq!(decode_text(&[0x6f, 0x6c, 0xe1]), ("olá".to_string(), TextEncoding::Latin1));
/// ```
pub fn decode_text(bytes: &[u8]) -> (String, TextEncoding) {
    match std::str::from_utf8(bytes) {
        Ok(text) => (text.to_owned(), TextEncoding::Utf8),
        Err(_) => (decode_latin1(bytes), TextEncoding::Latin1),
    }
}

/// Latin-1 decoding.
#[inline]
pub fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn take_chars_counts_characters_not_bytes() {
        assert_eq!(take_chars("relatório", 7), "relatór");
        assert_eq!(take_chars("😀abc", 1), "😀");
        assert_eq!(take_chars("abc", 0), "");
        assert_eq!(take_chars("", 4), "");
    }

    #[test]
    fn sample_borrows_short_text() {
        assert!(matches!(sample("curto", 2000), Cow::Borrowed("curto")));
    }

    #[test]
    fn sample_marks_truncation() {
        let long = "x".repeat(2001);
        let s = sample(&long, 2000);
        assert_eq!(s.len(), 2000 + ELLIPSIS.len());
        assert!(s.ends_with(ELLIPSIS));
    }

    #[test]
    fn sample_exact_length_is_not_truncated() {
        let exact = "é".repeat(10);
        assert_eq!(sample(&exact, 10), exact);
    }

    #[test]
    fn utf8_is_preferred() {
        let (text, enc) = decode_text("Atualização do servidor".as_bytes());
        assert_eq!(text, "Atualização do servidor");
        assert_eq!(enc, TextEncoding::Utf8);
    }

    #[test]
    fn invalid_utf8_falls_back_to_latin1() {
        // "relatório" encoded as ISO-8859-1
        let bytes = b"relat\xf3rio";
        let (text, enc) = decode_text(bytes);
        assert_eq!(text, "relatório");
        assert_eq!(enc, TextEncoding::Latin1);
    }

    #[test]
    fn latin1_maps_every_byte() {
        let all: Vec<u8> = (0..=255).collect();
        assert_eq!(decode_latin1(&all).chars().count(), 256);
    }
}
