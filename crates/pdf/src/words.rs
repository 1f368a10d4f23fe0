//! Conversion of assembled lines into hierarchy words.

use spada_core::hierarchy::Word;

use crate::cleanup::cleanup_text;
use crate::parser::layout::TextLine;

/// A word ending in a letter followed by `-` was split across lines.
fn is_broken_word(text: &str) -> bool {
    let mut chars = text.chars().rev();
    chars.next() == Some('-') && chars.next().is_some_and(char::is_alphabetic)
}

/// Words for one page.
///
/// `page_top` is the summed height of every preceding page of the document,
/// so offsets grow monotonically down the document. Each word carries a
/// trailing space, except a word broken by a line-end hyphen, which loses the
/// hyphen and joins the next word directly.
pub fn page_words(lines: &[TextLine], page_top: f32, page_height: f32) -> Vec<Word> {
    let mut words = Vec::new();
    for line in lines {
        let last = line.spans.len().saturating_sub(1);
        for (i, span) in line.spans.iter().enumerate() {
            let mut text = cleanup_text(&span.text);
            if text.is_empty() {
                continue;
            }
            if i == last && is_broken_word(&text) {
                text.pop();
            } else if !text.ends_with('-') {
                text.push(' ');
            }
            let offset = page_top + (page_height - span.y - span.font_size);
            words.push(Word::new(text, span.font_size, offset));
        }
    }
    words
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::layout::TextSpan;

    fn line(spans: &[(&str, f32)], y: f32) -> TextLine {
        TextLine {
            y,
            spans: spans
                .iter()
                .enumerate()
                .map(|(i, (text, size))| TextSpan {
                    text: text.to_string(),
                    x: 72.0 + 200.0 * i as f32,
                    y,
                    width: 100.0,
                    font_size: *size,
                    font_key: b"F1".to_vec(),
                })
                .collect(),
        }
    }

    #[test]
    fn test_trailing_space_and_offset() {
        let words = page_words(&[line(&[("Cap. 1", 20.0)], 800.0)], 0.0, 842.0);
        assert_eq!(words, vec![Word::new("Cap. 1 ", 20.0, 22.0)]);
    }

    #[test]
    fn test_page_top_is_added() {
        let words = page_words(&[line(&[("testo", 14.0)], 800.0)], 842.0, 842.0);
        assert!((words[0].vertical_offset - 870.0).abs() < 0.01);
    }

    #[test]
    fn test_line_end_hyphen_is_repaired() {
        let words = page_words(
            &[
                line(&[("in guar-", 14.0)], 770.0),
                line(&[("dia alta", 14.0)], 753.0),
            ],
            0.0,
            842.0,
        );
        let text: String = words.iter().map(|w| w.text.as_str()).collect();
        assert_eq!(text, "in guardia alta ");
    }

    #[test]
    fn test_hyphen_after_digit_is_kept() {
        let words = page_words(&[line(&[("1536-", 14.0)], 770.0)], 0.0, 842.0);
        assert_eq!(words[0].text, "1536-");
    }

    #[test]
    fn test_blank_spans_skipped() {
        let words = page_words(&[line(&[("  ", 14.0), ("spada", 14.0)], 700.0)], 0.0, 842.0);
        assert_eq!(words.len(), 1);
        assert_eq!(words[0].text, "spada ");
    }

    #[test]
    fn test_broken_word_detection() {
        assert!(is_broken_word("guar-"));
        assert!(is_broken_word("é-"));
        assert!(!is_broken_word("-"));
        assert!(!is_broken_word("12-"));
        assert!(!is_broken_word("guardia"));
    }
}
