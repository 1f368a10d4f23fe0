//! Positioned text from page content streams.
//!
//! ```text
//! content ops  ->  TextSpan[]  ->  TextLine[]
//!                  extract_page_spans   group_spans_into_lines
//! ```
//!
//! Coordinates are PDF user space: `y` is the baseline measured from the
//! bottom of the page.

use std::cmp::Ordering;

use super::backend::{decode_text_simple, ContentOp, PageId, PdfBackend, PdfValue};
use crate::PdfError;

/// A run of text drawn by one show operator.
#[derive(Debug, Clone, PartialEq)]
pub struct TextSpan {
    pub text: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub font_size: f32,
    /// Font resource key (`F1`), used to decide whether spans can merge.
    pub font_key: Vec<u8>,
}

/// Spans sharing a baseline, left to right.
#[derive(Debug, Clone, Default)]
pub struct TextLine {
    pub spans: Vec<TextSpan>,
    pub y: f32,
}

impl TextLine {
    pub fn text(&self) -> String {
        self.spans
            .iter()
            .map(|s| s.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Baselines closer than this belong to the same line.
const SAME_LINE_TOLERANCE: f32 = 1.0;

/// Glyph width as a fraction of the font size. No font metrics are read.
const CHAR_WIDTH_RATIO: f32 = 0.5;

/// Spans closer than this are glued without a space.
const JOIN_GAP: f32 = 1.5;

/// Font sizes closer than this count as equal when merging spans.
const SIZE_TOLERANCE: f32 = 0.5;

const IDENTITY: [f32; 6] = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];

#[derive(Debug, Clone)]
struct TextState {
    font_key: Vec<u8>,
    font_size: f32,
    /// [a, b, c, d, tx, ty]
    matrix: [f32; 6],
    line_matrix: [f32; 6],
    horiz_scale: f32,
    char_spacing: f32,
    word_spacing: f32,
    rise: f32,
    leading: f32,
}

impl Default for TextState {
    fn default() -> Self {
        Self {
            font_key: Vec::new(),
            font_size: 0.0,
            matrix: IDENTITY,
            line_matrix: IDENTITY,
            horiz_scale: 1.0,
            char_spacing: 0.0,
            word_spacing: 0.0,
            rise: 0.0,
            leading: 0.0,
        }
    }
}

impl TextState {
    fn position(&self) -> (f32, f32) {
        (self.matrix[4], self.matrix[5] + self.rise)
    }

    /// Font size scaled by the vertical component of the text matrix.
    fn rendered_size(&self) -> f32 {
        let scale = (self.matrix[1].powi(2) + self.matrix[3].powi(2)).sqrt();
        (self.font_size * scale).abs()
    }

    fn char_width(&self) -> f32 {
        self.font_size * CHAR_WIDTH_RATIO * self.horiz_scale
    }

    fn estimate_width(&self, text: &str) -> f32 {
        text.chars().count() as f32 * self.char_width()
    }

    fn advance(&mut self, dx: f32) {
        self.matrix[4] += dx * self.matrix[0];
        self.matrix[5] += dx * self.matrix[1];
    }

    fn advance_past(&mut self, text: &str) {
        let dx: f32 = text
            .chars()
            .map(|c| {
                let spacing = if c == ' ' { self.word_spacing } else { 0.0 };
                self.char_width() + self.char_spacing + spacing
            })
            .sum();
        self.advance(dx);
    }

    fn move_line(&mut self, tx: f32, ty: f32) {
        let m = self.line_matrix;
        self.line_matrix[4] = m[0] * tx + m[2] * ty + m[4];
        self.line_matrix[5] = m[1] * tx + m[3] * ty + m[5];
        self.matrix = self.line_matrix;
    }

    fn next_line(&mut self) {
        self.move_line(0.0, -self.leading);
    }
}

fn number(operands: &[PdfValue], i: usize) -> Option<f32> {
    operands.get(i).and_then(PdfValue::as_number)
}

/// Walks one page's operators and records every shown string.
struct SpanCollector<'a> {
    backend: &'a dyn PdfBackend,
    page: PageId,
    state: TextState,
    spans: Vec<TextSpan>,
}

impl SpanCollector<'_> {
    fn apply(&mut self, op: &ContentOp) {
        let operands = op.operands.as_slice();
        match op.operator.as_str() {
            "BT" => {
                self.state.matrix = IDENTITY;
                self.state.line_matrix = IDENTITY;
            }
            "Tf" => {
                let key = match operands.first() {
                    Some(PdfValue::Name(key)) | Some(PdfValue::Str(key)) => key.clone(),
                    _ => return,
                };
                self.state.font_key = key;
                self.state.font_size = number(operands, 1).unwrap_or(0.0);
            }
            "Tm" => {
                let values: Vec<f32> = operands.iter().take(6).filter_map(PdfValue::as_number).collect();
                if let [a, b, c, d, e, f] = values[..] {
                    self.state.matrix = [a, b, c, d, e, f];
                    self.state.line_matrix = self.state.matrix;
                }
            }
            "Td" => {
                if let (Some(tx), Some(ty)) = (number(operands, 0), number(operands, 1)) {
                    self.state.move_line(tx, ty);
                }
            }
            "TD" => {
                if let (Some(tx), Some(ty)) = (number(operands, 0), number(operands, 1)) {
                    self.state.leading = -ty;
                    self.state.move_line(tx, ty);
                }
            }
            "T*" => self.state.next_line(),
            "TL" => {
                if let Some(v) = number(operands, 0) {
                    self.state.leading = v;
                }
            }
            "Tc" => {
                if let Some(v) = number(operands, 0) {
                    self.state.char_spacing = v;
                }
            }
            "Tw" => {
                if let Some(v) = number(operands, 0) {
                    self.state.word_spacing = v;
                }
            }
            "Tz" => {
                if let Some(v) = number(operands, 0) {
                    self.state.horiz_scale = v / 100.0;
                }
            }
            "Ts" => {
                if let Some(v) = number(operands, 0) {
                    self.state.rise = v;
                }
            }
            "Tj" => {
                if let Some(operand) = operands.first() {
                    self.show(operand);
                }
            }
            "TJ" => {
                if let Some(PdfValue::Array(items)) = operands.first() {
                    self.show_array(items);
                }
            }
            "'" => {
                self.state.next_line();
                if let Some(operand) = operands.first() {
                    self.show(operand);
                }
            }
            "\"" => {
                if operands.len() >= 3 {
                    if let Some(aw) = number(operands, 0) {
                        self.state.word_spacing = aw;
                    }
                    if let Some(ac) = number(operands, 1) {
                        self.state.char_spacing = ac;
                    }
                    self.state.next_line();
                    self.show(&operands[2]);
                }
            }
            _ => {}
        }
    }

    fn decode(&self, operand: &PdfValue) -> String {
        let PdfValue::Str(bytes) = operand else {
            return String::new();
        };
        let decoded = self
            .backend
            .decode_text(self.page, &self.state.font_key, bytes);
        if decoded.is_empty() {
            decode_text_simple(bytes)
        } else {
            decoded
        }
    }

    fn show(&mut self, operand: &PdfValue) {
        let text = self.decode(operand);
        if text.is_empty() {
            return;
        }
        let (x, y) = self.state.position();
        self.push_span(text.clone(), x, y);
        self.state.advance_past(&text);
    }

    /// `TJ`: strings interleaved with kerning in thousandths of text space.
    /// A large negative kerning reads as a word gap.
    fn show_array(&mut self, items: &[PdfValue]) {
        let mut buffer = String::new();
        let (mut x, y) = self.state.position();
        for item in items {
            if let PdfValue::Str(_) = item {
                let fragment = self.decode(item);
                if buffer.is_empty() {
                    x = self.state.position().0;
                }
                buffer.push_str(&fragment);
                self.state.advance_past(&fragment);
            } else if let Some(kerning) = item.as_number() {
                let dx = -kerning / 1000.0 * self.state.font_size * self.state.horiz_scale;
                if dx > self.state.char_width() * 0.3 && !buffer.is_empty() {
                    buffer.push(' ');
                }
                self.state.advance(dx);
            }
        }
        let text = buffer.trim_end();
        if !text.is_empty() {
            self.push_span(text.to_string(), x, y);
        }
    }

    fn push_span(&mut self, text: String, x: f32, y: f32) {
        self.spans.push(TextSpan {
            width: self.state.estimate_width(&text),
            text,
            x,
            y,
            font_size: self.state.rendered_size(),
            font_key: self.state.font_key.clone(),
        });
    }
}

/// Run the text state machine over one page's content stream.
///
/// Handles `BT`, `Tf`, `Tm`, `Td`, `TD`, `T*`, `TL`, `Tc`, `Tw`, `Tz`, `Ts`,
/// `Tj`, `TJ`, `'` and `"`. Everything else is ignored.
pub fn extract_page_spans(
    backend: &dyn PdfBackend,
    page: PageId,
) -> Result<Vec<TextSpan>, PdfError> {
    let raw = backend.page_content(page)?;
    let ops = backend.decode_content(&raw)?;

    let mut collector = SpanCollector {
        backend,
        page,
        state: TextState::default(),
        spans: Vec::new(),
    };
    for op in &ops {
        collector.apply(op);
    }
    Ok(collector.spans)
}

fn by_position(a: &f32, b: &f32) -> Ordering {
    a.partial_cmp(b).unwrap_or(Ordering::Equal)
}

/// Group spans into lines, top of the page first.
pub fn group_spans_into_lines(mut spans: Vec<TextSpan>) -> Vec<TextLine> {
    spans.sort_by(|a, b| by_position(&b.y, &a.y).then(by_position(&a.x, &b.x)));

    let mut lines: Vec<TextLine> = Vec::new();
    let mut current: Vec<TextSpan> = Vec::new();
    for span in spans {
        let same_line = current
            .first()
            .is_some_and(|first| (span.y - first.y).abs() <= SAME_LINE_TOLERANCE);
        if !same_line && !current.is_empty() {
            lines.push(assemble_line(std::mem::take(&mut current)));
        }
        current.push(span);
    }
    if !current.is_empty() {
        lines.push(assemble_line(current));
    }
    lines
}

/// Merge neighbouring spans drawn with the same font into one span.
fn assemble_line(mut spans: Vec<TextSpan>) -> TextLine {
    spans.sort_by(|a, b| by_position(&a.x, &b.x));

    let mut merged: Vec<TextSpan> = Vec::with_capacity(spans.len());
    for span in spans {
        if let Some(prev) = merged.last_mut() {
            let gap = span.x - (prev.x + prev.width);
            let same_font = prev.font_key == span.font_key
                && (prev.font_size - span.font_size).abs() < SIZE_TOLERANCE;
            if same_font && gap > -prev.font_size && gap < prev.font_size * 2.0 {
                let boundary_has_space =
                    prev.text.ends_with(char::is_whitespace) || span.text.starts_with(char::is_whitespace);
                if gap >= JOIN_GAP && !boundary_has_space {
                    prev.text.push(' ');
                }
                prev.text.push_str(&span.text);
                prev.width = (span.x + span.width) - prev.x;
                continue;
            }
        }
        merged.push(span);
    }

    TextLine {
        y: merged.first().map(|s| s.y).unwrap_or(0.0),
        spans: merged,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{op, MockBackend, MockPage};

    fn span(text: &str, x: f32, y: f32, font_size: f32) -> TextSpan {
        TextSpan {
            text: text.to_string(),
            x,
            y,
            width: text.chars().count() as f32 * font_size * CHAR_WIDTH_RATIO,
            font_size,
            font_key: b"F1".to_vec(),
        }
    }

    fn spans_of(ops: Vec<ContentOp>) -> Vec<TextSpan> {
        let backend = MockBackend::new(vec![MockPage::new(842.0, ops)]);
        let page = backend.pages()[&1];
        extract_page_spans(&backend, page).unwrap()
    }

    #[test]
    fn test_tj_records_position_and_size() {
        let spans = spans_of(vec![
            op::bt(),
            op::tf(b"F1", 12.0),
            op::tm(1.0, 0.0, 0.0, 1.0, 72.0, 700.0),
            op::tj("Della guardia"),
            op::et(),
        ]);
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].text, "Della guardia");
        assert!((spans[0].x - 72.0).abs() < 0.01);
        assert!((spans[0].y - 700.0).abs() < 0.01);
        assert!((spans[0].font_size - 12.0).abs() < 0.01);
        assert_eq!(spans[0].font_key, b"F1");
    }

    #[test]
    fn test_matrix_scale_changes_rendered_size() {
        let spans = spans_of(vec![
            op::bt(),
            op::tf(b"F1", 1.0),
            op::tm(20.0, 0.0, 0.0, 20.0, 72.0, 700.0),
            op::tj("Cap. 1"),
            op::et(),
        ]);
        assert!((spans[0].font_size - 20.0).abs() < 0.01);
    }

    #[test]
    fn test_tj_array_kerning() {
        let spans = spans_of(vec![
            op::bt(),
            op::tf(b"F1", 12.0),
            op::tm(1.0, 0.0, 0.0, 1.0, 72.0, 700.0),
            op::tj_array(vec![
                PdfValue::Str(b"Man".to_vec()),
                PdfValue::Integer(-10),
                PdfValue::Str(b"dritto".to_vec()),
                PdfValue::Integer(-500),
                PdfValue::Str(b"tondo".to_vec()),
            ]),
            op::et(),
        ]);
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].text, "Mandritto tondo");
    }

    #[test]
    fn test_line_moves() {
        let spans = spans_of(vec![
            op::bt(),
            op::tf(b"F1", 12.0),
            op::raw("TL", vec![PdfValue::Real(14.0)]),
            op::td(72.0, 700.0),
            op::tj("Prima"),
            op::raw("T*", vec![]),
            op::tj("Seconda"),
            op::raw("'", vec![PdfValue::Str(b"Terza".to_vec())]),
            op::td(0.0, -30.0),
            op::tj("Quarta"),
            op::et(),
        ]);
        let ys: Vec<f32> = spans.iter().map(|s| s.y).collect();
        assert_eq!(ys, vec![700.0, 686.0, 672.0, 642.0]);
    }

    #[test]
    fn test_capital_td_sets_leading() {
        let spans = spans_of(vec![
            op::bt(),
            op::tf(b"F1", 12.0),
            op::raw("TD", vec![PdfValue::Real(72.0), PdfValue::Real(-14.0)]),
            op::tj("Una"),
            op::raw("T*", vec![]),
            op::tj("Due"),
            op::et(),
        ]);
        assert!((spans[1].y - (-28.0)).abs() < 0.01);
    }

    #[test]
    fn test_bt_resets_position() {
        let spans = spans_of(vec![
            op::bt(),
            op::tf(b"F1", 12.0),
            op::td(72.0, 700.0),
            op::tj("Uno"),
            op::et(),
            op::bt(),
            op::td(72.0, 600.0),
            op::tj("Due"),
            op::et(),
        ]);
        assert!((spans[1].y - 600.0).abs() < 0.01);
    }

    #[test]
    fn test_empty_strings_are_skipped() {
        let spans = spans_of(vec![
            op::bt(),
            op::tf(b"F1", 12.0),
            op::td(72.0, 700.0),
            op::tj(""),
            op::tj("Visibile"),
            op::et(),
        ]);
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].text, "Visibile");
    }

    #[test]
    fn test_group_spans_top_to_bottom() {
        let lines = group_spans_into_lines(vec![
            span("basso", 72.0, 100.0, 12.0),
            span("alto", 72.0, 700.0, 12.0),
            span("mezzo", 72.0, 400.0, 12.0),
        ]);
        let texts: Vec<String> = lines.iter().map(TextLine::text).collect();
        assert_eq!(texts, vec!["alto", "mezzo", "basso"]);
    }

    #[test]
    fn test_group_spans_within_tolerance_share_a_line() {
        let lines = group_spans_into_lines(vec![
            span("Tira", 72.0, 700.0, 12.0),
            span("un", 100.0, 700.5, 12.0),
        ]);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].spans.len(), 1);
        assert_eq!(lines[0].spans[0].text, "Tira un");
    }

    #[test]
    fn test_adjacent_spans_are_glued() {
        // "Man" is 18 wide at size 12, so "dritto" starts right after it.
        let lines = group_spans_into_lines(vec![
            span("Man", 72.0, 700.0, 12.0),
            span("dritto", 90.0, 700.0, 12.0),
        ]);
        assert_eq!(lines[0].spans[0].text, "Mandritto");
    }

    #[test]
    fn test_different_sizes_stay_separate() {
        let lines = group_spans_into_lines(vec![
            span("Cap. 3", 72.0, 700.0, 20.0),
            span("testo", 140.0, 700.0, 14.0),
        ]);
        assert_eq!(lines[0].spans.len(), 2);
    }

    #[test]
    fn test_group_spans_empty() {
        assert!(group_spans_into_lines(Vec::new()).is_empty());
    }
}
