//! Data models for documents, extraction results and configuration.

pub mod config;
pub mod document;

pub use config::PipelineConfig;
pub use document::{
    BatchReport, ExtractedField, ExtractionResult, FieldName, FieldValue, ProcessOutcome,
    QualityTier, RecognitionSource, ValidationStatus, ValueKind,
};
