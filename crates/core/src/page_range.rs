//! Page range parsing
//!
//! Pure functions turning a user-supplied page selector into concrete,
//! 1-indexed page numbers. Three shapes are accepted:
//!
//! - a single page: `"56"`
//! - a comma-separated list: `"32,34,60,63"` (spaces around items allowed)
//! - an inclusive range: `"34-102"`

use std::fmt;

use thiserror::Error;

/// Error type for page range parsing
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RangeParseError {
    #[error("Page range is empty")]
    Empty,
    #[error("Page range contains an invalid character: '{0}' (only digits, '-' and ',' are allowed)")]
    InvalidCharacter(char),
    #[error("'{0}' cannot be the first or last character, nor appear twice in a row")]
    MisplacedSeparator(char),
    #[error("Page range cannot mix '-' and ','")]
    MixedSeparators,
    #[error("Page 0 is not valid, pages are numbered from 1")]
    ZeroPage,
    #[error("Range start {start} is after range end {end}")]
    Reversed { start: u32, end: u32 },
    #[error("Invalid page number: {0}")]
    Number(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Pages {
    List(Vec<u32>),
    Span { start: u32, end: u32 },
}

impl Default for Pages {
    fn default() -> Self {
        Pages::List(Vec::new())
    }
}

/// A parsed selection of 1-indexed pages, in the order they were requested.
///
/// Inclusive ranges keep only their bounds and are walked lazily, so a wide
/// range costs nothing until it is iterated. Only the parsers build non-empty
/// ranges, which keeps every page number at 1 or above.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageRange {
    pages: Pages,
}

impl PageRange {
    pub(crate) fn list(pages: Vec<u32>) -> Self {
        Self {
            pages: Pages::List(pages),
        }
    }

    pub(crate) fn span(start: u32, end: u32) -> Self {
        Self {
            pages: Pages::Span { start, end },
        }
    }

    /// Requested pages as 1-indexed page numbers.
    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        let (list, span) = match &self.pages {
            Pages::List(pages) => (pages.as_slice(), None),
            Pages::Span { start, end } => (&[][..], Some(*start..=*end)),
        };
        list.iter().copied().chain(span.into_iter().flatten())
    }

    /// Requested pages adjusted for 0-indexed page access.
    pub fn zero_indexed(&self) -> impl Iterator<Item = usize> + '_ {
        self.iter().map(|p| p as usize - 1)
    }

    /// Highest requested page.
    pub fn last_page(&self) -> Option<u32> {
        match &self.pages {
            Pages::List(pages) => pages.iter().copied().max(),
            Pages::Span { end, .. } => Some(*end),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn len(&self) -> usize {
        match &self.pages {
            Pages::List(pages) => pages.len(),
            Pages::Span { start, end } => (end - start) as usize + 1,
        }
    }
}

impl fmt::Display for PageRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.pages {
            Pages::List(pages) => {
                let items: Vec<String> = pages.iter().map(u32::to_string).collect();
                write!(f, "{}", items.join(","))
            }
            Pages::Span { start, end } => write!(f, "{}-{}", start, end),
        }
    }
}

/// Parse a page selector into a [`PageRange`].
pub fn parse_page_range(input: &str) -> Result<PageRange, RangeParseError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(RangeParseError::Empty);
    }

    if let Some(c) = input
        .chars()
        .find(|c| !c.is_ascii_digit() && *c != '-' && *c != ',' && !c.is_whitespace())
    {
        return Err(RangeParseError::InvalidCharacter(c));
    }

    for sep in ['-', ','] {
        if input.starts_with(sep) || input.ends_with(sep) {
            return Err(RangeParseError::MisplacedSeparator(sep));
        }
    }

    let has_dash = input.contains('-');
    let has_comma = input.contains(',');

    match (has_dash, has_comma) {
        (true, true) => Err(RangeParseError::MixedSeparators),
        (true, false) => {
            let parts: Vec<&str> = input.split('-').map(str::trim).collect();
            if parts.len() != 2 || parts.iter().any(|p| p.is_empty()) {
                return Err(RangeParseError::MisplacedSeparator('-'));
            }
            let start = parse_page(parts[0])?;
            let end = parse_page(parts[1])?;
            if start > end {
                return Err(RangeParseError::Reversed { start, end });
            }
            Ok(PageRange::span(start, end))
        }
        (false, true) => {
            let pages = input
                .split(',')
                .map(str::trim)
                .map(|item| {
                    if item.is_empty() {
                        Err(RangeParseError::MisplacedSeparator(','))
                    } else {
                        parse_page(item)
                    }
                })
                .collect::<Result<Vec<_>, _>>()?;
            Ok(PageRange::list(pages))
        }
        (false, false) => Ok(PageRange::list(vec![parse_page(input)?])),
    }
}

/// Parse a page selector, recovering from errors with an empty range.
///
/// The diagnostic is logged so the caller only has to check for emptiness.
pub fn parse_page_range_lenient(input: &str) -> PageRange {
    match parse_page_range(input) {
        Ok(range) => range,
        Err(err) => {
            log::warn!("Invalid page range {:?}: {}", input, err);
            PageRange::default()
        }
    }
}

fn parse_page(item: &str) -> Result<u32, RangeParseError> {
    if item.chars().any(char::is_whitespace) {
        return Err(RangeParseError::Number(item.to_string()));
    }
    let page = item
        .parse::<u32>()
        .map_err(|_| RangeParseError::Number(item.to_string()))?;
    if page == 0 {
        return Err(RangeParseError::ZeroPage);
    }
    Ok(page)
}
