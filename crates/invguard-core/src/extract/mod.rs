//! Document content extraction.
//!
//! Format decoding is kept behind [`ContentExtractor`] so the rule engine only
//! ever sees [`ExtractedContent`]. [`FormatExtractor`] is the default
//! implementation and dispatches on the file extension.

mod office;
mod pdf;
mod tabular;

pub use office::{extract_docx_text, extract_xlsx_rows};
pub use pdf::PdfTextExtractor;
pub use tabular::parse_csv_rows;

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ExtractError;
use crate::models::config::ExtractionConfig;

/// Result type for extraction operations.
pub type Result<T> = std::result::Result<T, ExtractError>;

/// Content extracted from one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum ExtractedContent {
    /// A single text blob (PDF, word-processor documents).
    Text(String),
    /// Ordered rows of cell values (spreadsheets, CSV).
    Rows(Vec<Vec<String>>),
}

impl ExtractedContent {
    /// Text view of the content. Rows are joined with tabs and newlines.
    pub fn as_text(&self) -> String {
        match self {
            ExtractedContent::Text(text) => text.clone(),
            ExtractedContent::Rows(rows) => rows
                .iter()
                .map(|row| row.join("\t"))
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }

    /// Rows, if the source was tabular.
    pub fn rows(&self) -> Option<&[Vec<String>]> {
        match self {
            ExtractedContent::Rows(rows) => Some(rows),
            ExtractedContent::Text(_) => None,
        }
    }

    /// Whether nothing but whitespace was extracted.
    pub fn is_blank(&self) -> bool {
        match self {
            ExtractedContent::Text(text) => text.trim().is_empty(),
            ExtractedContent::Rows(rows) => rows
                .iter()
                .all(|row| row.iter().all(|cell| cell.trim().is_empty())),
        }
    }
}

/// Recognized document formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Pdf,
    Xlsx,
    Csv,
    Docx,
}

impl DocumentFormat {
    /// Determine the format from a file name or path.
    pub fn from_name(name: &str) -> Result<Self> {
        let extension = Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();

        match extension.as_str() {
            "pdf" => Ok(DocumentFormat::Pdf),
            "xlsx" | "xlsm" => Ok(DocumentFormat::Xlsx),
            "csv" => Ok(DocumentFormat::Csv),
            "docx" => Ok(DocumentFormat::Docx),
            _ => Err(ExtractError::UnsupportedFormat(extension)),
        }
    }
}

/// Turns raw document bytes into content the rules can read.
pub trait ContentExtractor: Send + Sync {
    /// Extract content from a named document.
    fn extract(&self, name: &str, data: &[u8]) -> Result<ExtractedContent>;
}

/// Default extractor choosing a decoder by file extension.
#[derive(Debug, Clone, Default)]
pub struct FormatExtractor {
    config: ExtractionConfig,
}

impl FormatExtractor {
    pub fn new(config: ExtractionConfig) -> Self {
        Self { config }
    }
}

impl ContentExtractor for FormatExtractor {
    fn extract(&self, name: &str, data: &[u8]) -> Result<ExtractedContent> {
        let format = DocumentFormat::from_name(name)?;
        debug!("Extracting {} as {:?} ({} bytes)", name, format, data.len());

        let content = match format {
            DocumentFormat::Pdf => {
                let mut extractor = PdfTextExtractor::new()
                    .with_empty_password(self.config.decrypt_empty_password);
                extractor.load(data)?;
                ExtractedContent::Text(extractor.extract_text()?)
            }
            DocumentFormat::Xlsx => {
                ExtractedContent::Rows(extract_xlsx_rows(data, self.config.max_rows)?)
            }
            DocumentFormat::Csv => ExtractedContent::Rows(parse_csv_rows(
                data,
                self.config.csv_delimiter,
                self.config.max_rows,
            )?),
            DocumentFormat::Docx => ExtractedContent::Text(extract_docx_text(data)?),
        };

        Ok(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_name() {
        assert_eq!(DocumentFormat::from_name("a.PDF").unwrap(), DocumentFormat::Pdf);
        assert_eq!(DocumentFormat::from_name("dir/b.xlsx").unwrap(), DocumentFormat::Xlsx);
        assert_eq!(DocumentFormat::from_name("c.csv").unwrap(), DocumentFormat::Csv);
        assert_eq!(DocumentFormat::from_name("d.docx").unwrap(), DocumentFormat::Docx);
    }

    #[test]
    fn test_unsupported_extension() {
        let err = DocumentFormat::from_name("notes.txt").unwrap_err();
        assert!(matches!(err, ExtractError::UnsupportedFormat(ref ext) if ext == "txt"));

        let err = FormatExtractor::default().extract("README", b"hello").unwrap_err();
        assert!(matches!(err, ExtractError::UnsupportedFormat(ref ext) if ext.is_empty()));
    }

    #[test]
    fn test_rows_as_text() {
        let content = ExtractedContent::Rows(vec![
            vec!["Item".to_string(), "Price".to_string()],
            vec!["Widget".to_string(), "10.00".to_string()],
        ]);
        assert_eq!(content.as_text(), "Item\tPrice\nWidget\t10.00");
        assert!(!content.is_blank());
        assert!(ExtractedContent::Rows(vec![vec![" ".to_string()]]).is_blank());
    }

    #[test]
    fn test_csv_dispatch() {
        let content = FormatExtractor::default()
            .extract("ledger.csv", b"Vendor,Amount\nAcme,12.50\n")
            .unwrap();
        assert_eq!(content.rows().map(|r| r.len()), Some(2));
    }
}
