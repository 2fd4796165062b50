//! The document pipeline: rasterize, preprocess, recognize, extract,
//! assess. One call per document; no state survives between calls.

use std::collections::BTreeMap;
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::error::{ExtractionError, TtnError};
use crate::extract::TtnExtractor;
use crate::extract::rules::dates::parse_date;
use crate::extract::rules::inn::validate_inn;
use crate::extract::rules::plates::{normalize_plate, validate_plate};
use crate::extract::rules::quantities::{parse_count, parse_decimal_ru};
use crate::models::config::PipelineConfig;
use crate::models::document::{
    ExtractedField, ExtractionResult, FieldName, FieldValue, ProcessOutcome, RecognitionSource,
    ValueKind,
};
use crate::ocr::{ImagePreprocessor, Recognize, RecognitionResult, select_recognizer};
use crate::raster::{DocumentKind, PageRasterizer, PageSet};
use crate::score::ConfidenceEngine;

/// Marker inserted between concatenated pages.
fn page_marker(page_number: usize) -> String {
    format!("=== СТРАНИЦА {} ===", page_number)
}

pub struct Pipeline {
    rasterizer: PageRasterizer,
    preprocessor: ImagePreprocessor,
    recognizer: Box<dyn Recognize>,
    extractor: TtnExtractor,
    engine: ConfidenceEngine,
    embedded_text_confidence: f32,
}

impl Pipeline {
    /// Build a pipeline; the recognition engine is resolved here, once.
    pub fn new(config: &PipelineConfig) -> Self {
        let recognizer = select_recognizer(&config.recognition);
        Self::with_recognizer(config, recognizer)
    }

    /// Build with an explicit recognizer.
    pub fn with_recognizer(config: &PipelineConfig, recognizer: Box<dyn Recognize>) -> Self {
        Pipeline {
            rasterizer: PageRasterizer::new(config.raster.clone()),
            preprocessor: ImagePreprocessor::new(&config.preprocess),
            recognizer,
            extractor: TtnExtractor::new().with_corrections(config.extraction.enable_corrections),
            engine: ConfidenceEngine::new(),
            embedded_text_confidence: config.recognition.embedded_text_confidence,
        }
    }

    /// Process one document. Never panics and never returns `Err`;
    /// failures come back as a classified outcome.
    pub fn process(
        &self,
        document_id: &str,
        data: &[u8],
        kind: Option<DocumentKind>,
    ) -> ProcessOutcome {
        let started = Instant::now();
        match self.run(document_id, data, kind) {
            Ok(mut result) => {
                result.processing_time_ms = started.elapsed().as_millis() as u64;
                info!(
                    "processed {}: {:.1}% confidence, {:?}",
                    document_id, result.overall_confidence, result.quality_tier
                );
                ProcessOutcome::ok(result)
            }
            Err(err) => {
                warn!("processing {} failed: {}", document_id, err);
                ProcessOutcome::failed(document_id, err.kind(), err.to_string())
            }
        }
    }

    fn run(
        &self,
        document_id: &str,
        data: &[u8],
        kind: Option<DocumentKind>,
    ) -> Result<ExtractionResult, TtnError> {
        let page_set = self.rasterizer.rasterize(data, kind)?;
        let page_count = page_set.page_count();

        let (pages, source) = match page_set {
            PageSet::EmbeddedText(texts) => {
                let pages = texts
                    .into_iter()
                    .enumerate()
                    .map(|(index, text)| RecognitionResult {
                        page_index: index,
                        text,
                        mean_confidence: self.embedded_text_confidence,
                    })
                    .collect();
                (pages, RecognitionSource::EmbeddedText)
            }
            PageSet::Raster(raster_pages) => {
                let mut pages = Vec::with_capacity(raster_pages.len());
                for page in &raster_pages {
                    let prepared = self.preprocessor.process(&page.image);
                    if !prepared.is_enhanced() {
                        debug!("page {} processed without enhancement", page.index);
                    }
                    let recognized = self.recognizer.recognize(page.index, prepared.image())?;
                    pages.push(recognized);
                }
                let source = if self.recognizer.is_degraded() {
                    RecognitionSource::Demo
                } else {
                    RecognitionSource::Engine
                };
                (pages, source)
            }
        };

        let (raw_text, mean_ocr_confidence) = concatenate_pages(pages);
        let normalized = self.extractor.normalize(&raw_text);
        let fields = self.extractor.extract(&normalized);
        let assessment = self.engine.assess(mean_ocr_confidence, &fields);

        Ok(ExtractionResult {
            document_id: document_id.to_string(),
            fields,
            overall_confidence: assessment.overall_confidence,
            quality_tier: assessment.quality_tier,
            validation_status: assessment.validation_status,
            requires_manual_check: assessment.requires_manual_check,
            degraded: source == RecognitionSource::Demo,
            source,
            page_count,
            raw_text: normalized,
            processing_time_ms: 0,
        })
    }

    /// Apply operator corrections to a result. Corrected values are
    /// re-validated and the document verdict recomputed; the original
    /// recognition confidence and tier stay untouched. An empty
    /// correction removes the field.
    pub fn apply_corrections(
        &self,
        result: &mut ExtractionResult,
        corrections: &BTreeMap<FieldName, String>,
    ) -> Result<(), ExtractionError> {
        for (&name, raw) in corrections {
            let raw = raw.trim();
            if raw.is_empty() {
                result.fields.remove(&name);
                continue;
            }
            let field = parse_correction(name, raw)?;
            result.fields.insert(name, field);
        }

        let (status, requires_manual_check) = self.engine.revalidate(&result.fields);
        result.validation_status = status;
        result.requires_manual_check = requires_manual_check;
        Ok(())
    }
}

/// Join recognized pages in page order with page markers; returns the
/// combined text and the mean page confidence.
fn concatenate_pages(mut pages: Vec<RecognitionResult>) -> (String, f32) {
    pages.sort_by_key(|p| p.page_index);

    let mut combined = String::new();
    let mut confidence_sum = 0.0f32;
    for page in &pages {
        if !combined.is_empty() {
            combined.push('\n');
        }
        combined.push_str(&page_marker(page.page_index + 1));
        combined.push('\n');
        combined.push_str(page.text.trim_end());
        combined.push('\n');
        confidence_sum += page.mean_confidence;
    }

    let mean = if pages.is_empty() {
        0.0
    } else {
        confidence_sum / pages.len() as f32
    };
    (combined, mean)
}

/// Parse and validate a manual correction for one field.
fn parse_correction(name: FieldName, raw: &str) -> Result<ExtractedField, ExtractionError> {
    let parse_err = || ExtractionError::Parse {
        field: name.as_str().to_string(),
        value: raw.to_string(),
    };

    let (value, valid) = match name.value_kind() {
        ValueKind::Date => {
            let date = parse_date(raw).ok_or_else(parse_err)?;
            (FieldValue::Date(date), true)
        }
        ValueKind::Decimal => {
            let decimal = parse_decimal_ru(raw).ok_or_else(parse_err)?;
            (FieldValue::Decimal(decimal), true)
        }
        ValueKind::Integer => {
            let count = parse_count(raw).ok_or_else(parse_err)?;
            (FieldValue::Integer(count), true)
        }
        ValueKind::Text => match name {
            FieldName::SenderInn | FieldName::ReceiverInn => {
                (FieldValue::Text(raw.to_string()), validate_inn(raw))
            }
            FieldName::VehicleNumber => {
                let plate = normalize_plate(raw);
                let valid = validate_plate(&plate);
                (FieldValue::Text(plate), valid)
            }
            _ => (FieldValue::Text(raw.to_string()), true),
        },
    };

    Ok(ExtractedField {
        name,
        value,
        // Operator-entered values are trusted.
        confidence: 100.0,
        valid,
    })
}
