use std::sync::OnceLock;

use regex::Regex;
use unicode_normalization::UnicodeNormalization;

const LIGATURES: [(&str, &str); 7] = [
    ("\u{FB00}", "ff"),
    ("\u{FB01}", "fi"),
    ("\u{FB02}", "fl"),
    ("\u{FB03}", "ffi"),
    ("\u{FB04}", "ffl"),
    ("\u{FB05}", "st"),
    ("\u{FB06}", "st"),
];

/// Clean up the text of one extracted span.
///
/// Applies NFC normalization, expands ligatures, drops replacement and
/// control characters, collapses whitespace runs and trims.
pub fn cleanup_text(text: &str) -> String {
    let mut result: String = text.nfc().collect();

    for (ligature, replacement) in &LIGATURES {
        if result.contains(ligature) {
            result = result.replace(ligature, replacement);
        }
    }

    result.retain(|c| c != '\u{FFFD}' && (!c.is_control() || c.is_whitespace()));

    static RE_SPACES: OnceLock<Regex> = OnceLock::new();
    let re_spaces = RE_SPACES.get_or_init(|| Regex::new(r"\s+").unwrap());
    re_spaces.replace_all(&result, " ").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_passthrough() {
        assert_eq!(cleanup_text("Della guardia alta."), "Della guardia alta.");
    }

    #[test]
    fn test_ligature_fix() {
        assert_eq!(cleanup_text("\u{FB01}nta"), "finta");
    }

    #[test]
    fn test_ligature_ffl() {
        assert_eq!(cleanup_text("a\u{FB04}e"), "affle");
    }

    #[test]
    fn test_replacement_char_removed() {
        assert_eq!(cleanup_text("spa\u{FFFD}da"), "spada");
    }

    #[test]
    fn test_control_chars_removed() {
        assert_eq!(cleanup_text("stoc\u{0}cata"), "stoccata");
    }

    #[test]
    fn test_whitespace_collapsed_and_trimmed() {
        assert_eq!(cleanup_text("  tira   un\tmandritto  "), "tira un mandritto");
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(cleanup_text(""), "");
        assert_eq!(cleanup_text(" \u{FFFD} "), "");
    }

    #[test]
    fn test_nfc_normalization() {
        // e + combining acute becomes a single code point.
        assert_eq!(cleanup_text("Ope\u{0301}ra"), "Op\u{00E9}ra");
    }
}
