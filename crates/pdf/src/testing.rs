//! In-memory backend for unit tests.

use std::collections::BTreeMap;

use crate::parser::backend::{decode_text_simple, ContentOp, PageId, PdfBackend};
use crate::PdfError;

pub struct MockPage {
    pub height: f32,
    pub ops: Vec<ContentOp>,
}

impl MockPage {
    pub fn new(height: f32, ops: Vec<ContentOp>) -> Self {
        Self { height, ops }
    }
}

/// Pages get ids `(n, 0)` with `n` starting at 1.
pub struct MockBackend {
    pages: Vec<MockPage>,
}

impl MockBackend {
    pub fn new(pages: Vec<MockPage>) -> Self {
        Self { pages }
    }

    fn page(&self, page: PageId) -> Result<&MockPage, PdfError> {
        self.pages
            .get((page.0 as usize).wrapping_sub(1))
            .ok_or_else(|| PdfError::Parse(format!("no page {:?}", page)))
    }
}

impl PdfBackend for MockBackend {
    fn pages(&self) -> BTreeMap<u32, PageId> {
        (1..=self.pages.len() as u32).map(|n| (n, (n, 0))).collect()
    }

    fn page_height(&self, page: PageId) -> Result<f32, PdfError> {
        Ok(self.page(page)?.height)
    }

    // The "content stream" is the page number; `decode_content` maps it back.
    fn page_content(&self, page: PageId) -> Result<Vec<u8>, PdfError> {
        self.page(page)?;
        Ok(page.0.to_string().into_bytes())
    }

    fn decode_content(&self, data: &[u8]) -> Result<Vec<ContentOp>, PdfError> {
        let number: u32 = std::str::from_utf8(data)
            .ok()
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| PdfError::Parse("bad mock content".to_string()))?;
        Ok(self.page((number, 0))?.ops.clone())
    }

    fn decode_text(&self, _page: PageId, _font_key: &[u8], bytes: &[u8]) -> String {
        decode_text_simple(bytes)
    }
}

/// Content-stream operator builders.
pub mod op {
    use crate::parser::backend::{ContentOp, PdfValue};

    pub fn raw(operator: &str, operands: Vec<PdfValue>) -> ContentOp {
        ContentOp {
            operator: operator.to_string(),
            operands,
        }
    }

    pub fn bt() -> ContentOp {
        raw("BT", vec![])
    }

    pub fn et() -> ContentOp {
        raw("ET", vec![])
    }

    pub fn tf(font: &[u8], size: f32) -> ContentOp {
        raw("Tf", vec![PdfValue::Name(font.to_vec()), PdfValue::Real(size)])
    }

    pub fn tm(a: f32, b: f32, c: f32, d: f32, e: f32, f: f32) -> ContentOp {
        raw(
            "Tm",
            [a, b, c, d, e, f].into_iter().map(PdfValue::Real).collect(),
        )
    }

    pub fn td(tx: f32, ty: f32) -> ContentOp {
        raw("Td", vec![PdfValue::Real(tx), PdfValue::Real(ty)])
    }

    pub fn tj(text: &str) -> ContentOp {
        raw("Tj", vec![PdfValue::Str(text.as_bytes().to_vec())])
    }

    pub fn tj_array(items: Vec<PdfValue>) -> ContentOp {
        raw("TJ", vec![PdfValue::Array(items)])
    }

    /// One line of text at `size` with its baseline at `y`.
    pub fn line(text: &str, size: f32, y: f32) -> Vec<ContentOp> {
        vec![bt(), tf(b"F1", size), tm(1.0, 0.0, 0.0, 1.0, 72.0, y), tj(text), et()]
    }
}
