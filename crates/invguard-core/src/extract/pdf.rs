//! PDF text extraction using lopdf and pdf-extract.

use lopdf::Document;
use tracing::debug;

use super::Result;
use crate::error::ExtractError;

/// PDF text extractor.
pub struct PdfTextExtractor {
    document: Option<Document>,
    raw_data: Vec<u8>,
    try_empty_password: bool,
}

impl PdfTextExtractor {
    /// Create a new PDF extractor.
    pub fn new() -> Self {
        Self {
            document: None,
            raw_data: Vec::new(),
            try_empty_password: true,
        }
    }

    /// Set whether encrypted PDFs are retried with an empty password.
    pub fn with_empty_password(mut self, enabled: bool) -> Self {
        self.try_empty_password = enabled;
        self
    }

    /// Load a PDF from bytes.
    pub fn load(&mut self, data: &[u8]) -> Result<()> {
        let mut doc = Document::load_mem(data).map_err(|e| ExtractError::Pdf(e.to_string()))?;

        if doc.is_encrypted() {
            if !self.try_empty_password || doc.decrypt("").is_err() {
                return Err(ExtractError::Encrypted);
            }
            debug!("Decrypted PDF with empty password");

            // pdf-extract reads bytes, so keep the decrypted serialization
            let mut decrypted_data = Vec::new();
            doc.save_to(&mut decrypted_data)
                .map_err(|e| ExtractError::Pdf(format!("failed to save decrypted PDF: {}", e)))?;
            self.raw_data = decrypted_data;
        } else {
            self.raw_data = data.to_vec();
        }

        let page_count = doc.get_pages().len();
        if page_count == 0 {
            return Err(ExtractError::Pdf("PDF has no pages".to_string()));
        }

        debug!("Loaded PDF with {} pages", page_count);
        self.document = Some(doc);
        Ok(())
    }

    /// Number of pages in the loaded PDF.
    pub fn page_count(&self) -> u32 {
        self.document
            .as_ref()
            .map(|doc| doc.get_pages().len() as u32)
            .unwrap_or(0)
    }

    /// Extract text from the entire PDF.
    pub fn extract_text(&self) -> Result<String> {
        if self.document.is_none() {
            return Err(ExtractError::Pdf("no document loaded".to_string()));
        }
        pdf_extract::extract_text_from_mem(&self.raw_data)
            .map_err(|e| ExtractError::Pdf(e.to_string()))
    }
}

impl Default for PdfTextExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pdf_extractor_new() {
        let extractor = PdfTextExtractor::new();
        assert!(extractor.document.is_none());
        assert_eq!(extractor.page_count(), 0);
        assert!(extractor.extract_text().is_err());
    }

    #[test]
    fn test_load_rejects_garbage() {
        let mut extractor = PdfTextExtractor::new();
        let err = extractor.load(b"definitely not a pdf").unwrap_err();
        assert!(matches!(err, ExtractError::Pdf(_)));
    }
}
