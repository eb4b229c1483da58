use policyrag_core::traits::TextExtractor;
use policyrag_core::{Error, Result};

/// Extracts plain text from PDF bytes.
///
/// Scanned or image-only documents yield little or no text; the ingestion
/// pipeline treats that as a zero-chunk ingest, not an error.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfExtractor;

impl PdfExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl TextExtractor for PdfExtractor {
    fn extract(&self, bytes: &[u8]) -> Result<String> {
        pdf_extract::extract_text_from_mem(bytes).map_err(Error::provider)
    }
}
