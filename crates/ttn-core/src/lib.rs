//! # ttn-core
//!
//! OCR extraction pipeline for транспортные накладные (ТТН), the
//! transport documents uploaded to a municipal construction-oversight
//! system. Uploaded photos and PDF scans are rasterized, enhanced,
//! read with an external OCR engine (or a fixed demo fallback),
//! parsed into a closed twelve-field set, scored, and exported as CSV
//! or a spreadsheet.

pub mod batch;
pub mod error;
pub mod export;
pub mod extract;
pub mod models;
pub mod ocr;
pub mod pipeline;
pub mod raster;
pub mod score;

pub use batch::{BatchItem, BatchProcessor, process_with_timeout};
pub use error::{ErrorKind, TtnError};
pub use export::{ExportPayload, ResultExporter, SummaryStats};
pub use extract::TtnExtractor;
pub use models::config::PipelineConfig;
pub use models::document::{
    BatchReport, ExtractedField, ExtractionResult, FieldName, FieldValue, ProcessOutcome,
    QualityTier, RecognitionSource, ValidationStatus,
};
pub use pipeline::Pipeline;
pub use raster::DocumentKind;
pub use score::ConfidenceEngine;
