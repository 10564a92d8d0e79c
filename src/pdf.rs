use anyhow::{Context, Result};
use log::{debug, warn};
use std::panic::{self, AssertUnwindSafe};

/// What to do with one PDF page after reading its text layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageDecision {
    /// The text layer is usable as-is.
    DirectText(String),
    /// Too little text; rasterize and OCR the page.
    NeedsOcr,
}

/// Text is sufficient when, trimmed, it has more than `min_chars` characters.
pub fn decide_page(text: &str, min_chars: usize) -> PageDecision {
    let trimmed = text.trim();
    if trimmed.chars().count() > min_chars {
        PageDecision::DirectText(trimmed.to_string())
    } else {
        PageDecision::NeedsOcr
    }
}

/// A parsed PDF held in memory.
pub struct PdfDocument {
    document: lopdf::Document,
    bytes: Vec<u8>,
    page_numbers: Vec<u32>,
    secondary_pages: Option<Vec<String>>,
}

impl PdfDocument {
    /// Parse a PDF; errors mean the file is not a readable PDF at all.
    pub fn load(bytes: Vec<u8>) -> Result<Self> {
        let document =
            lopdf::Document::load_mem(&bytes).context("Failed to load PDF document")?;
        let page_numbers: Vec<u32> = document.get_pages().keys().copied().collect();

        Ok(Self {
            document,
            bytes,
            page_numbers,
            secondary_pages: None,
        })
    }

    /// 1-based page numbers in document order.
    pub fn page_numbers(&self) -> &[u32] {
        &self.page_numbers
    }

    /// Text layer of one page via lopdf. Decoding failures yield an empty
    /// string so the page falls through to the next strategy.
    pub fn direct_text(&self, page_number: u32) -> String {
        match self.document.extract_text(&[page_number]) {
            Ok(text) => text,
            Err(e) => {
                warn!("Failed to extract text from page {}: {}", page_number, e);
                String::new()
            }
        }
    }

    /// Text of one page via pdf-extract, which handles some font encodings
    /// lopdf cannot. The whole document is decoded once, on first use.
    pub fn secondary_text(&mut self, page_number: u32) -> String {
        if self.secondary_pages.is_none() {
            self.secondary_pages = Some(extract_pages_with_pdf_extract(&self.bytes));
        }

        let index = self
            .page_numbers
            .iter()
            .position(|&n| n == page_number)
            .unwrap_or(page_number.saturating_sub(1) as usize);

        self.secondary_pages
            .as_ref()
            .and_then(|pages| pages.get(index))
            .cloned()
            .unwrap_or_default()
    }
}

/// pdf-extract panics on some malformed documents; a panic counts as "no text".
fn extract_pages_with_pdf_extract(bytes: &[u8]) -> Vec<String> {
    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        pdf_extract::extract_text_from_mem_by_pages(bytes)
    }));

    match result {
        Ok(Ok(pages)) => {
            debug!("pdf-extract decoded {} page(s)", pages.len());
            pages
        }
        Ok(Err(e)) => {
            warn!("pdf-extract fallback failed: {}", e);
            Vec::new()
        }
        Err(_) => {
            warn!("pdf-extract fallback panicked on a malformed document");
            Vec::new()
        }
    }
}
