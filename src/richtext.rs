//! Plain-text recovery from rich-text message bodies
//!
//! Some messages store their displayed content only in a serialized
//! attributed-string container. Rather than decoding the container, the
//! text is cut out between well-known class-name markers and the fixed
//! header/footer framing is trimmed away. This is a heuristic and must stay
//! byte-for-byte stable so existing archives keep producing the same text.

use once_cell::sync::Lazy;
use regex::Regex;

/// Marks the numeric attribute section that follows the text
pub const NUMBER_MARKER: &str = "NSNumber";
/// Marks the start of the string payload
pub const STRING_MARKER: &str = "NSString";
/// Marks the attribute dictionary that follows the text
pub const DICTIONARY_MARKER: &str = "NSDictionary";

const HEADER_CHARS: usize = 6;
const FOOTER_CHARS: usize = 12;

static CONTROL_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\x{00}-\x{1F}\x{7F}-\x{9F}]").expect("valid regex"));
static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Recover plain text from a rich-text blob.
///
/// Never fails: an absent or empty blob, or one with nothing recoverable,
/// yields an empty string.
pub fn extract_text(blob: Option<&[u8]>) -> String {
    let Some(bytes) = blob.filter(|b| !b.is_empty()) else {
        return String::new();
    };

    let text = extract_from_bytes(bytes);
    if text.is_empty() {
        tracing::warn!(
            bytes = bytes.len(),
            "rich-text body yielded no text, using empty string"
        );
    }
    text
}

fn extract_from_bytes(bytes: &[u8]) -> String {
    let decoded = String::from_utf8_lossy(bytes);
    let mut text: &str = &decoded;

    if let Some(pos) = text.find(NUMBER_MARKER) {
        text = &text[..pos];
    }
    if let Some(pos) = text.find(STRING_MARKER) {
        text = &text[pos + STRING_MARKER.len()..];
    }
    if let Some(pos) = text.find(DICTIONARY_MARKER) {
        text = &text[..pos];
    }

    let char_count = text.chars().count();
    let framed: String = if char_count > HEADER_CHARS + FOOTER_CHARS {
        text.chars()
            .skip(HEADER_CHARS)
            .take(char_count - HEADER_CHARS - FOOTER_CHARS)
            .collect()
    } else {
        text.to_string()
    };

    let without_control = CONTROL_CHARS.replace_all(&framed, "");
    WHITESPACE_RUN
        .replace_all(&without_control, " ")
        .trim()
        .to_string()
}
