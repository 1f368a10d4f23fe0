use std::sync::OnceLock;

use regex::Regex;

/// Split an accumulated body-text block into paragraphs.
///
/// A paragraph boundary is a newline immediately followed by an uppercase
/// letter (accented capitals included). The newline at the boundary is
/// consumed; newlines followed by anything else stay inside the paragraph.
/// Each segment is trimmed. Blank input yields no paragraphs.
pub fn split_paragraphs(text: &str) -> Vec<String> {
    if text.trim().is_empty() {
        return Vec::new();
    }

    static RE_BOUNDARY: OnceLock<Regex> = OnceLock::new();
    let re_boundary = RE_BOUNDARY.get_or_init(|| Regex::new(r"\n\p{Lu}").unwrap());

    let mut paragraphs = Vec::new();
    let mut start = 0;
    for boundary in re_boundary.find_iter(text) {
        paragraphs.push(text[start..boundary.start()].trim().to_string());
        // Resume on the uppercase letter, skipping the 1-byte newline.
        start = boundary.start() + 1;
    }
    paragraphs.push(text[start..].trim().to_string());

    paragraphs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_two_lines_with_capital_start() {
        assert_eq!(
            split_paragraphs("Prima riga.\nSeconda riga."),
            vec!["Prima riga.", "Seconda riga."]
        );
    }

    #[test]
    fn test_lowercase_continuation_stays_in_paragraph() {
        let paragraphs = split_paragraphs("Prima riga che\ncontinua qui.");
        assert_eq!(paragraphs, vec!["Prima riga che\ncontinua qui."]);
    }

    #[test]
    fn test_no_newline_is_one_paragraph() {
        assert_eq!(split_paragraphs("Una sola riga."), vec!["Una sola riga."]);
    }

    #[test]
    fn test_empty_input_yields_nothing() {
        assert!(split_paragraphs("").is_empty());
        assert!(split_paragraphs(" \n ").is_empty());
    }

    #[test]
    fn test_accented_capital_starts_paragraph() {
        assert_eq!(
            split_paragraphs("Fin du coup.\nÉtant en garde, tu feras."),
            vec!["Fin du coup.", "Étant en garde, tu feras."]
        );
        assert_eq!(
            split_paragraphs("Prima.\nÈ detto così."),
            vec!["Prima.", "È detto così."]
        );
    }

    #[test]
    fn test_consecutive_boundaries() {
        assert_eq!(
            split_paragraphs("A.\nB.\nC."),
            vec!["A.", "B.", "C."]
        );
    }

    #[test]
    fn test_trailing_spaces_are_trimmed() {
        assert_eq!(
            split_paragraphs("Uno dopo \nDue "),
            vec!["Uno dopo", "Due"]
        );
    }
}
