//! PDF text extraction using lopdf and pdf-extract.

use lopdf::{Document, Object};
use tracing::{debug, trace, warn};

use super::{PdfProcessor, PdfType, Result};
use crate::error::PdfError;

/// Text shorter than this is treated as no text layer when analyzing.
const DEFAULT_MIN_TEXT_LENGTH: usize = 50;

/// PDF text extractor backed by lopdf.
pub struct PdfExtractor {
    document: Option<Document>,
    raw_data: Vec<u8>,
    min_text_length: usize,
}

impl PdfExtractor {
    /// Create a new PDF extractor.
    pub fn new() -> Self {
        Self {
            document: None,
            raw_data: Vec::new(),
            min_text_length: DEFAULT_MIN_TEXT_LENGTH,
        }
    }

    /// Set the minimum text length for [`PdfProcessor::analyze`] to report text.
    pub fn with_min_text_length(mut self, min_text_length: usize) -> Self {
        self.min_text_length = min_text_length;
        self
    }

    /// Extract text page by page.
    pub fn extract_pages(&self) -> Result<Vec<String>> {
        if self.document.is_none() {
            return Err(PdfError::Parse("No document loaded".to_string()));
        }

        // pdf-extract panics on some malformed content streams.
        let data = self.raw_data.as_slice();
        let pages =
            std::panic::catch_unwind(|| pdf_extract::extract_text_from_mem_by_pages(data))
                .map_err(|_| PdfError::TextExtraction("text extractor panicked".to_string()))?
                .map_err(|e| PdfError::TextExtraction(e.to_string()))?;

        trace!("Extracted text from {} pages", pages.len());
        Ok(pages)
    }

    /// Classify the loaded document from text already extracted from it.
    pub fn classify(&self, text: &str) -> PdfType {
        let text_len = text.trim().len();
        let has_text = text_len >= self.min_text_length;
        let has_images = self.count_images() > 0;

        let pdf_type = match (has_text, has_images) {
            (true, false) => PdfType::Text,
            (false, true) => PdfType::Image,
            (true, true) => PdfType::Hybrid,
            (false, false) => PdfType::Empty,
        };

        debug!(
            "PDF analysis: {} chars text, has_images={} -> {:?}",
            text_len, has_images, pdf_type
        );
        pdf_type
    }

    /// Count image XObjects anywhere in the document.
    fn count_images(&self) -> usize {
        let Some(doc) = self.document.as_ref() else {
            return 0;
        };

        doc.objects
            .values()
            .filter(|object| match object {
                Object::Stream(stream) => stream
                    .dict
                    .get(b"Subtype")
                    .and_then(|s| s.as_name())
                    .map(|name| name == b"Image")
                    .unwrap_or(false),
                _ => false,
            })
            .count()
    }
}

impl Default for PdfExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl PdfProcessor for PdfExtractor {
    fn load(&mut self, data: &[u8]) -> Result<()> {
        let mut doc = Document::load_mem(data).map_err(|e| PdfError::Parse(e.to_string()))?;

        // Handle PDFs with empty password encryption
        if doc.is_encrypted() {
            if doc.decrypt("").is_err() {
                return Err(PdfError::Encrypted);
            }
            debug!("Decrypted PDF with empty password");

            // pdf-extract reads the decrypted copy
            let mut decrypted_data = Vec::new();
            doc.save_to(&mut decrypted_data)
                .map_err(|e| PdfError::Parse(format!("Failed to save decrypted PDF: {}", e)))?;
            self.raw_data = decrypted_data;
        } else {
            self.raw_data = data.to_vec();
        }

        let page_count = doc.get_pages().len();
        if page_count == 0 {
            return Err(PdfError::NoPages);
        }

        debug!("Loaded PDF with {} pages", page_count);
        self.document = Some(doc);
        Ok(())
    }

    fn page_count(&self) -> u32 {
        self.document
            .as_ref()
            .map(|doc| doc.get_pages().len() as u32)
            .unwrap_or(0)
    }

    fn analyze(&self) -> PdfType {
        match self.extract_text() {
            Ok(text) => self.classify(&text),
            Err(e) => {
                warn!("Text extraction failed during analysis: {}", e);
                self.classify("")
            }
        }
    }

    fn extract_text(&self) -> Result<String> {
        Ok(self.extract_pages()?.join("\n"))
    }

    fn extract_page_text(&self, page: u32) -> Result<String> {
        if page == 0 || page > self.page_count() {
            return Err(PdfError::InvalidPage(page));
        }
        self.extract_pages()?
            .into_iter()
            .nth((page - 1) as usize)
            .ok_or(PdfError::InvalidPage(page))
    }
}
