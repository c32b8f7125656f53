//! Text layer extraction from invoice PDFs.

mod extractor;

pub use extractor::PdfExtractor;

use crate::error::PdfError;

/// What a loaded document carries, judged from its pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PdfType {
    /// Enough extractable text.
    Text,
    /// Images only, typically a scanned invoice.
    Image,
    /// Both a text layer and images.
    Hybrid,
    /// Neither text nor images.
    Empty,
}

impl PdfType {
    /// Whether line parsing can be expected to find anything.
    pub fn has_text_layer(&self) -> bool {
        matches!(self, PdfType::Text | PdfType::Hybrid)
    }
}

pub type Result<T> = std::result::Result<T, PdfError>;

/// Source of invoice text.
pub trait PdfProcessor {
    /// Load a document from bytes, replacing any previous one.
    fn load(&mut self, data: &[u8]) -> Result<()>;

    fn page_count(&self) -> u32;

    fn analyze(&self) -> PdfType;

    /// Text of every page, joined by newlines.
    fn extract_text(&self) -> Result<String>;

    /// Text of one page (1-indexed).
    fn extract_page_text(&self, page: u32) -> Result<String>;
}

/// Extract the text layer of a PDF held in memory.
///
/// A document without a text layer yields an empty string.
pub fn extract_text(data: &[u8]) -> Result<String> {
    let mut extractor = PdfExtractor::new();
    extractor.load(data)?;
    extractor.extract_text()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_layer_classification() {
        assert!(PdfType::Text.has_text_layer());
        assert!(PdfType::Hybrid.has_text_layer());
        assert!(!PdfType::Image.has_text_layer());
        assert!(!PdfType::Empty.has_text_layer());
    }
}
