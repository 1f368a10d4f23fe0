//! Word stream adapter over PDF files.
//!
//! Reads the requested pages, runs each content stream through the text
//! state machine, groups the spans into lines and hands back
//! [`spada_core::hierarchy::Word`] values with document-relative offsets.

use std::path::Path;

use spada_core::hierarchy::Word;
use spada_core::page_range::PageRange;
use thiserror::Error;

use parser::backend::{LopdfBackend, PageId, PdfBackend};

pub mod cleanup;
pub mod parser;
pub mod words;

#[cfg(test)]
pub(crate) mod testing;

#[derive(Debug, Error)]
pub enum PdfError {
    #[error("PDF parsing error: {0}")]
    Parse(String),
    #[error("Document is encrypted")]
    Encrypted,
    #[error("Page {page} is out of range (document has {page_count} pages)")]
    PageOutOfRange { page: u32, page_count: usize },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// An opened PDF document.
pub struct PdfDocument {
    backend: LopdfBackend,
}

impl PdfDocument {
    pub fn open(path: &Path) -> Result<Self, PdfError> {
        Ok(Self {
            backend: LopdfBackend::load_file(path)?,
        })
    }

    pub fn page_count(&self) -> usize {
        self.backend.page_count()
    }

    /// Words of the requested pages, in request order, calling `on_page`
    /// before each page is read.
    pub fn words_with_progress(
        &self,
        range: &PageRange,
        on_page: impl FnMut(u32),
    ) -> Result<Vec<Word>, PdfError> {
        extract_words_with_progress(&self.backend, range, on_page)
    }
}

pub fn extract_words(backend: &dyn PdfBackend, range: &PageRange) -> Result<Vec<Word>, PdfError> {
    extract_words_with_progress(backend, range, |_| {})
}

pub fn extract_words_with_progress(
    backend: &dyn PdfBackend,
    range: &PageRange,
    mut on_page: impl FnMut(u32),
) -> Result<Vec<Word>, PdfError> {
    let page_ids: Vec<PageId> = backend.pages().into_values().collect();
    let page_count = page_ids.len();

    let Some(last) = range.last_page() else {
        return Ok(Vec::new());
    };
    if last as usize > page_count {
        return Err(PdfError::PageOutOfRange {
            page: last,
            page_count,
        });
    }

    // Top of each page relative to the start of the document.
    let mut tops = Vec::with_capacity(last as usize);
    let mut heights = Vec::with_capacity(last as usize);
    let mut top = 0.0;
    for id in page_ids.iter().take(last as usize) {
        let height = backend.page_height(*id)?;
        tops.push(top);
        heights.push(height);
        top += height;
    }

    let mut words = Vec::new();
    for index in range.zero_indexed() {
        let page = index as u32 + 1;
        on_page(page);
        let spans = parser::layout::extract_page_spans(backend, page_ids[index])?;
        let lines = parser::layout::group_spans_into_lines(spans);
        let page_words = words::page_words(&lines, tops[index], heights[index]);
        log::debug!("page {}: {} lines, {} words", page, lines.len(), page_words.len());
        words.extend(page_words);
    }
    Ok(words)
}
