//! Error types for the invguard-core library.

use thiserror::Error;

/// Main error type for the invguard library.
#[derive(Error, Debug)]
pub enum ScanError {
    /// Content extraction failed or the format is not supported.
    #[error("extraction error: {0}")]
    Extract(#[from] ExtractError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

impl ScanError {
    /// Whether the file was rejected because its extension is not recognized.
    pub fn is_unsupported_format(&self) -> bool {
        matches!(self, ScanError::Extract(ExtractError::UnsupportedFormat(_)))
    }
}

/// Errors raised while turning a file into scannable content.
#[derive(Error, Debug)]
pub enum ExtractError {
    /// The file extension is not one of the recognized document formats.
    #[error("unsupported file format: {0:?}")]
    UnsupportedFormat(String),

    /// Failed to parse or read text from a PDF.
    #[error("failed to read PDF: {0}")]
    Pdf(String),

    /// The PDF is encrypted with a non-empty password.
    #[error("PDF is encrypted")]
    Encrypted,

    /// Failed to read a spreadsheet workbook.
    #[error("failed to read spreadsheet: {0}")]
    Spreadsheet(String),

    /// Failed to read a word-processor document.
    #[error("failed to read document: {0}")]
    Document(String),

    /// Failed to parse delimited text.
    #[error("failed to read CSV: {0}")]
    Csv(#[from] csv::Error),

    /// The configured CSV delimiter is not a single-byte ASCII character.
    #[error("invalid CSV delimiter {0:?}: must be ASCII")]
    CsvDelimiter(char),

    /// I/O error while reading the source.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<zip::result::ZipError> for ExtractError {
    fn from(err: zip::result::ZipError) -> Self {
        ExtractError::Document(format!("invalid container: {}", err))
    }
}

/// Errors raised by the market price collaborator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    /// The price reference could not be reached.
    #[error("market prices unavailable: {0}")]
    Unavailable(String),

    /// The price reference answered with data that could not be read.
    #[error("invalid market price data: {0}")]
    Parse(String),
}

/// A single rule could not complete its evaluation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RuleError {
    /// The market price lookup failed.
    #[error(transparent)]
    PriceSource(#[from] PriceError),

    /// The rule received content it cannot evaluate.
    #[error("cannot evaluate content: {0}")]
    Content(String),
}

/// Result type for the invguard library.
pub type Result<T> = std::result::Result<T, ScanError>;
