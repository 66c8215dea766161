//! Page range selection syntax
//!
//! Ranges are written as comma separated 1-indexed page numbers and
//! inclusive spans, e.g. `"1,3-5"`. Unlike a selection set, a range keeps the
//! order it was written in and may name the same page more than once, which
//! is how reordering and duplication are expressed to the engine.

use crate::error::PdfEditError;
use std::fmt;
use std::str::FromStr;

/// An inclusive span of 1-indexed pages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageSpan {
    pub start: u32,
    pub end: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageRange {
    spans: Vec<PageSpan>,
}

impl PageRange {
    /// Build a range from an explicit page sequence, folding ascending runs into spans
    pub fn from_pages(pages: &[u32]) -> Self {
        let mut spans: Vec<PageSpan> = Vec::new();
        for &page in pages {
            match spans.last_mut() {
                Some(span) if span.end.checked_add(1) == Some(page) => span.end = page,
                _ => spans.push(PageSpan {
                    start: page,
                    end: page,
                }),
            }
        }
        Self { spans }
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    /// Number of pages selected, counting repeats
    pub fn len(&self) -> usize {
        self.spans
            .iter()
            .map(|s| (s.end - s.start) as usize + 1)
            .sum()
    }

    /// Expand into the page sequence
    pub fn pages(&self) -> impl Iterator<Item = u32> + '_ {
        self.spans.iter().flat_map(|s| s.start..=s.end)
    }

    /// Check every page exists in a document with `page_count` pages
    pub fn validate(&self, page_count: u32) -> Result<(), PdfEditError> {
        for span in &self.spans {
            if span.start == 0 {
                return Err(PdfEditError::InvalidRange(
                    "Page numbers must be >= 1".into(),
                ));
            }
            if span.end > page_count {
                return Err(PdfEditError::InvalidRange(format!(
                    "Page {} does not exist (document has {} pages)",
                    span.end, page_count
                )));
            }
        }
        Ok(())
    }
}

impl FromStr for PageRange {
    type Err = PdfEditError;

    /// Parse page range string like "1-3, 5, 8-10"
    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let mut spans = Vec::new();

        for part in input.split(',') {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }

            if let Some((start, end)) = part.split_once('-') {
                let start: u32 = start
                    .trim()
                    .parse()
                    .map_err(|_| PdfEditError::InvalidRange(format!("Invalid start: {}", start)))?;
                let end: u32 = end
                    .trim()
                    .parse()
                    .map_err(|_| PdfEditError::InvalidRange(format!("Invalid end: {}", end)))?;

                if start > end {
                    return Err(PdfEditError::InvalidRange(format!(
                        "Start {} > end {}",
                        start, end
                    )));
                }

                spans.push(PageSpan { start, end });
            } else {
                let page: u32 = part
                    .parse()
                    .map_err(|_| PdfEditError::InvalidRange(format!("Invalid page: {}", part)))?;
                spans.push(PageSpan {
                    start: page,
                    end: page,
                });
            }
        }

        if spans.is_empty() {
            return Err(PdfEditError::InvalidRange("No pages specified".into()));
        }

        Ok(Self { spans })
    }
}

impl fmt::Display for PageRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, span) in self.spans.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            if span.start == span.end {
                write!(f, "{}", span.start)?;
            } else {
                write!(f, "{}-{}", span.start, span.end)?;
            }
        }
        Ok(())
    }
}
