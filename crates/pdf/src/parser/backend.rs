use std::collections::BTreeMap;
use std::path::Path;

use lopdf::content::Content;
use lopdf::{Dictionary, Document, Object};

use crate::PdfError;

/// A page identifier mirroring `lopdf::ObjectId`: (object number, generation number).
pub type PageId = (u32, u16);

/// Operand of a content-stream operator, detached from `lopdf::Object`.
#[derive(Debug, Clone, PartialEq)]
pub enum PdfValue {
    Null,
    Bool(bool),
    Integer(i64),
    Real(f32),
    Name(Vec<u8>),
    Str(Vec<u8>),
    Array(Vec<PdfValue>),
    Dict(Vec<(Vec<u8>, PdfValue)>),
    Reference(PageId),
}

impl PdfValue {
    /// Numeric value of an `Integer` or `Real` operand.
    pub fn as_number(&self) -> Option<f32> {
        match self {
            PdfValue::Integer(i) => Some(*i as f32),
            PdfValue::Real(f) => Some(*f),
            _ => None,
        }
    }
}

impl From<&Object> for PdfValue {
    fn from(obj: &Object) -> Self {
        let dict_entries = |dict: &Dictionary| {
            dict.iter()
                .map(|(k, v)| (k.clone(), PdfValue::from(v)))
                .collect()
        };
        match obj {
            Object::Null => PdfValue::Null,
            Object::Boolean(b) => PdfValue::Bool(*b),
            Object::Integer(i) => PdfValue::Integer(*i),
            Object::Real(f) => PdfValue::Real(*f),
            Object::Name(n) => PdfValue::Name(n.clone()),
            Object::String(s, _) => PdfValue::Str(s.clone()),
            Object::Array(items) => PdfValue::Array(items.iter().map(PdfValue::from).collect()),
            Object::Dictionary(dict) => PdfValue::Dict(dict_entries(dict)),
            // Stream payloads are only reachable through `page_content`.
            Object::Stream(stream) => PdfValue::Dict(dict_entries(&stream.dict)),
            Object::Reference(id) => PdfValue::Reference(*id),
        }
    }
}

/// A single content-stream operation (operator + operands).
#[derive(Debug, Clone)]
pub struct ContentOp {
    pub operator: String,
    pub operands: Vec<PdfValue>,
}

/// Decode string bytes without font information.
///
/// UTF-16BE with a byte order mark first, then UTF-8, then Latin-1 as the
/// catch-all (every byte maps to the code point of the same value).
pub fn decode_text_simple(bytes: &[u8]) -> String {
    if let Some(payload) = bytes.strip_prefix(&[0xFE_u8, 0xFF][..]) {
        return decode_utf16_be(payload);
    }
    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(_) => bytes.iter().map(|&b| b as char).collect(),
    }
}

fn decode_utf16_be(bytes: &[u8]) -> String {
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
        .collect();
    String::from_utf16_lossy(&units)
}

/// Page access needed by the word extractor.
///
/// Implemented over `lopdf` for real documents and by in-memory fixtures in
/// tests.
pub trait PdfBackend {
    /// Mapping from 1-based page number to [`PageId`].
    fn pages(&self) -> BTreeMap<u32, PageId>;

    /// Page height in points, from the MediaBox.
    fn page_height(&self, page: PageId) -> Result<f32, PdfError>;

    /// Raw (decompressed) content stream bytes for a page.
    fn page_content(&self, page: PageId) -> Result<Vec<u8>, PdfError>;

    /// Decode raw content-stream bytes into operations.
    fn decode_content(&self, data: &[u8]) -> Result<Vec<ContentOp>, PdfError>;

    /// Decode the bytes of a text-showing operand drawn with `font_key`.
    fn decode_text(&self, page: PageId, font_key: &[u8], bytes: &[u8]) -> String;
}

/// [`PdfBackend`] over a parsed [`lopdf::Document`].
pub struct LopdfBackend {
    doc: Document,
}

impl LopdfBackend {
    pub fn load_bytes(data: &[u8]) -> Result<Self, PdfError> {
        let doc = Document::load_mem(data).map_err(|e| PdfError::Parse(e.to_string()))?;
        Self::checked(doc)
    }

    pub fn load_file(path: &Path) -> Result<Self, PdfError> {
        let data = std::fs::read(path)?;
        Self::load_bytes(&data)
    }

    fn checked(doc: Document) -> Result<Self, PdfError> {
        if doc.is_encrypted() {
            return Err(PdfError::Encrypted);
        }
        Ok(Self { doc })
    }

    pub fn page_count(&self) -> usize {
        self.doc.get_pages().len()
    }

    /// MediaBox of a page, inherited from the page tree when absent.
    fn media_box(&self, dict: &Dictionary) -> Option<Vec<Object>> {
        if let Some(items) = dict.get(b"MediaBox").ok().and_then(|o| self.resolve_array(o)) {
            return Some(items);
        }
        let parent = dict.get(b"Parent").ok()?.as_reference().ok()?;
        let parent_dict = self.doc.get_object(parent).ok()?.as_dict().ok()?;
        self.media_box(parent_dict)
    }

    fn resolve_array(&self, obj: &Object) -> Option<Vec<Object>> {
        match obj {
            Object::Array(items) => Some(items.clone()),
            Object::Reference(id) => self
                .doc
                .get_object(*id)
                .ok()
                .and_then(|o| o.as_array().ok())
                .cloned(),
            _ => None,
        }
    }

    fn resolve_number(&self, obj: &Object) -> Result<f32, PdfError> {
        let resolved = match obj {
            Object::Reference(id) => self
                .doc
                .get_object(*id)
                .map_err(|e| PdfError::Parse(e.to_string()))?,
            other => other,
        };
        PdfValue::from(resolved)
            .as_number()
            .ok_or_else(|| PdfError::Parse(format!("expected a number, got {:?}", resolved)))
    }

    fn font_encoding(&self, page: PageId, font_key: &[u8]) -> Option<String> {
        let fonts = self.doc.get_page_fonts(page).ok()?;
        match fonts.get(font_key)?.get(b"Encoding").ok()? {
            Object::Name(name) => Some(String::from_utf8_lossy(name).into_owned()),
            _ => None,
        }
    }
}

impl PdfBackend for LopdfBackend {
    fn pages(&self) -> BTreeMap<u32, PageId> {
        self.doc.get_pages()
    }

    fn page_height(&self, page: PageId) -> Result<f32, PdfError> {
        let dict = self
            .doc
            .get_object(page)
            .and_then(Object::as_dict)
            .map_err(|e| PdfError::Parse(format!("cannot read page {:?}: {}", page, e)))?;
        let media_box = self
            .media_box(dict)
            .ok_or_else(|| PdfError::Parse(format!("MediaBox not found for page {:?}", page)))?;
        let [_, lly, _, ury] = media_box.as_slice() else {
            return Err(PdfError::Parse(format!(
                "MediaBox has {} elements, expected 4",
                media_box.len()
            )));
        };
        Ok(self.resolve_number(ury)? - self.resolve_number(lly)?)
    }

    fn page_content(&self, page: PageId) -> Result<Vec<u8>, PdfError> {
        self.doc
            .get_page_content(page)
            .map_err(|e| PdfError::Parse(format!("cannot get page content: {}", e)))
    }

    fn decode_content(&self, data: &[u8]) -> Result<Vec<ContentOp>, PdfError> {
        let content = Content::decode(data)
            .map_err(|e| PdfError::Parse(format!("content stream decode error: {}", e)))?;
        Ok(content
            .operations
            .into_iter()
            .map(|op| ContentOp {
                operands: op.operands.iter().map(PdfValue::from).collect(),
                operator: op.operator,
            })
            .collect())
    }

    fn decode_text(&self, page: PageId, font_key: &[u8], bytes: &[u8]) -> String {
        // Identity-encoded fonts carry 2-byte codes that are often UTF-16.
        let identity = self
            .font_encoding(page, font_key)
            .is_some_and(|enc| enc.contains("Identity"));
        if identity && !bytes.is_empty() && bytes.len().is_multiple_of(2) {
            let decoded = decode_utf16_be(bytes);
            if decoded.chars().any(|c| c != '\u{FFFD}' && c != '\0') {
                return decoded;
            }
        }
        decode_text_simple(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_utf8_with_accents() {
        assert_eq!(decode_text_simple("opéra".as_bytes()), "opéra");
    }

    #[test]
    fn decode_latin1_fallback() {
        // "opéra" in Latin-1: 0xE9 alone is not valid UTF-8.
        let input: &[u8] = &[0x6F, 0x70, 0xE9, 0x72, 0x61];
        assert_eq!(decode_text_simple(input), "opéra");
    }

    #[test]
    fn decode_utf16_with_bom() {
        let input: &[u8] = &[0xFE, 0xFF, 0x00, 0xC8, 0x00, 0x20];
        assert_eq!(decode_text_simple(input), "È ");
    }

    #[test]
    fn decode_utf16_ignores_odd_trailing_byte() {
        let input: &[u8] = &[0xFE, 0xFF, 0x00, 0x41, 0x00];
        assert_eq!(decode_text_simple(input), "A");
    }

    #[test]
    fn decode_empty() {
        assert_eq!(decode_text_simple(&[]), "");
    }

    #[test]
    fn number_operands() {
        assert_eq!(PdfValue::Integer(-10).as_number(), Some(-10.0));
        assert_eq!(PdfValue::Real(2.5).as_number(), Some(2.5));
        assert_eq!(PdfValue::Name(b"F1".to_vec()).as_number(), None);
        assert_eq!(PdfValue::Null.as_number(), None);
    }

    #[test]
    fn convert_nested_objects() {
        let mut dict = Dictionary::new();
        dict.set(
            "MediaBox",
            Object::Array(vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Real(595.0),
                Object::Real(842.0),
            ]),
        );
        match PdfValue::from(&Object::Dictionary(dict)) {
            PdfValue::Dict(entries) => {
                assert_eq!(entries[0].0, b"MediaBox");
                assert_eq!(
                    entries[0].1,
                    PdfValue::Array(vec![
                        PdfValue::Integer(0),
                        PdfValue::Integer(0),
                        PdfValue::Real(595.0),
                        PdfValue::Real(842.0),
                    ])
                );
            }
            other => panic!("expected Dict, got {:?}", other),
        }
    }

    #[test]
    fn convert_string_and_reference() {
        assert_eq!(
            PdfValue::from(&Object::String(b"Cap".to_vec(), lopdf::StringFormat::Literal)),
            PdfValue::Str(b"Cap".to_vec())
        );
        assert_eq!(
            PdfValue::from(&Object::Reference((7, 0))),
            PdfValue::Reference((7, 0))
        );
    }

    #[test]
    fn load_garbage_is_a_parse_error() {
        assert!(matches!(
            LopdfBackend::load_bytes(b"not a pdf"),
            Err(PdfError::Parse(_))
        ));
    }
}
