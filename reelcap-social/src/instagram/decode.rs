//! Caption text normalization.
//!
//! Applied in a fixed order to whatever a strategy matched: HTML entities,
//! literal `\n` sequences, `\uXXXX` escapes, then trimming.
use std::borrow::Cow;
use std::sync::LazyLock;

use regex::{Captures, Regex};

static UNICODE_ESCAPE_RUN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:\\u[0-9a-fA-F]{4})+").expect("UNICODE_ESCAPE_RUN_RE should compile")
});

/// Decode HTML entities (`&amp;`, `&quot;`, `&#039;`, ...) in one pass.
///
/// Text without entities is returned unchanged.
pub fn decode_entities(text: &str) -> Cow<'_, str> {
    html_escape::decode_html_entities(text)
}

/// Replace literal two-character `\n` sequences with newlines.
pub fn decode_newlines(text: &str) -> Cow<'_, str> {
    if text.contains("\\n") {
        Cow::Owned(text.replace("\\n", "\n"))
    } else {
        Cow::Borrowed(text)
    }
}

/// Decode `\uXXXX` escapes. Consecutive escapes are decoded together so
/// surrogate pairs become one character; unpaired surrogates become U+FFFD.
pub fn decode_unicode_escapes(text: &str) -> Cow<'_, str> {
    UNICODE_ESCAPE_RUN_RE.replace_all(text, |caps: &Captures<'_>| {
        let units: Vec<u16> = caps[0]
            .split("\\u")
            .filter(|hex| !hex.is_empty())
            .filter_map(|hex| u16::from_str_radix(hex, 16).ok())
            .collect();
        char::decode_utf16(units)
            .map(|r| r.unwrap_or(char::REPLACEMENT_CHARACTER))
            .collect::<String>()
    })
}

/// Full normalization; `None` when nothing but whitespace is left.
///
/// ```
/// use reelcap_social::instagram::decode::normalize_caption;
///
/// assert_eq!(
///     normalize_caption("  Tom &amp; Jerry\\n\\u2764\\ufe0f ").as_deref(),
///     Some("Tom & Jerry\n\u{2764}\u{fe0f}")
/// );
/// assert_eq!(normalize_caption(" \\n "), None);
/// ```
pub fn normalize_caption(raw: &str) -> Option<String> {
    let text = decode_entities(raw);
    let text = decode_newlines(&text);
    let text = decode_unicode_escapes(&text);
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
