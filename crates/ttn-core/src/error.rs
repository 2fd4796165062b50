//! Error types for the ТТН extraction pipeline.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for the library.
#[derive(Error, Debug)]
pub enum TtnError {
    #[error("Document error: {0}")]
    Document(#[from] DocumentError),

    #[error("OCR error: {0}")]
    Ocr(#[from] OcrError),

    #[error("Extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    #[error("Export error: {0}")]
    Export(#[from] ExportError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Errors raised while loading or rasterizing an uploaded document.
#[derive(Error, Debug)]
pub enum DocumentError {
    /// The upload is structurally readable but outside the supported
    /// envelope (wrong format, too many pages, password-protected).
    #[error("Unsupported document: {0}")]
    Unsupported(String),

    /// The bytes could not be decoded as the claimed format.
    #[error("Failed to decode document: {0}")]
    Decode(String),

    #[error("Document is password-protected")]
    Encrypted,

    #[error("Document contains no pages")]
    NoPages,

    #[error("Invalid page number: {0}")]
    InvalidPage(u32),
}

/// Errors raised by the recognition stage.
#[derive(Error, Debug)]
pub enum OcrError {
    #[error("Recognition engine unavailable: {0}")]
    EngineUnavailable(String),

    #[error("Recognition failed: {0}")]
    Recognition(String),

    #[error("Preprocessing failed: {0}")]
    Preprocessing(String),

    #[error("Recognition timed out after {0} s")]
    Timeout(u64),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while extracting or correcting fields.
#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("Failed to parse field '{field}': {value}")]
    Parse { field: String, value: String },

    #[error("Validation failed for field '{field}': {reason}")]
    Validation { field: String, reason: String },

    #[error("Pattern error: {0}")]
    Pattern(String),
}

/// Errors raised while rendering export payloads.
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Spreadsheet error: {0}")]
    Spreadsheet(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Stable, serializable classification of a processing failure.
///
/// This is what batch reports and API-facing callers see; the full
/// error chain stays in the logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    UnsupportedDocument,
    DocumentDecodeError,
    RecognitionTimeout,
    RecognitionFailed,
    ExtractionFailed,
    ExportFailed,
    Internal,
}

impl TtnError {
    /// Classify the error for reporting.
    pub fn kind(&self) -> ErrorKind {
        match self {
            TtnError::Document(DocumentError::Unsupported(_))
            | TtnError::Document(DocumentError::Encrypted) => ErrorKind::UnsupportedDocument,
            TtnError::Document(_) | TtnError::Image(_) => ErrorKind::DocumentDecodeError,
            TtnError::Ocr(OcrError::Timeout(_)) => ErrorKind::RecognitionTimeout,
            TtnError::Ocr(_) => ErrorKind::RecognitionFailed,
            TtnError::Extraction(_) => ErrorKind::ExtractionFailed,
            TtnError::Export(_) => ErrorKind::ExportFailed,
            TtnError::Io(_) | TtnError::Serialization(_) => ErrorKind::Internal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_maps_to_unsupported_kind() {
        let err = TtnError::from(DocumentError::Unsupported("7 pages".to_string()));
        assert_eq!(err.kind(), ErrorKind::UnsupportedDocument);
    }

    #[test]
    fn test_encrypted_maps_to_unsupported_kind() {
        let err = TtnError::from(DocumentError::Encrypted);
        assert_eq!(err.kind(), ErrorKind::UnsupportedDocument);
    }

    #[test]
    fn test_decode_maps_to_decode_kind() {
        let err = TtnError::from(DocumentError::Decode("truncated JPEG".to_string()));
        assert_eq!(err.kind(), ErrorKind::DocumentDecodeError);
    }

    #[test]
    fn test_timeout_maps_to_timeout_kind() {
        let err = TtnError::from(OcrError::Timeout(120));
        assert_eq!(err.kind(), ErrorKind::RecognitionTimeout);
    }

    #[test]
    fn test_error_kind_serializes_snake_case() {
        let json = serde_json::to_string(&ErrorKind::UnsupportedDocument).unwrap();
        assert_eq!(json, "\"unsupported_document\"");
    }
}
