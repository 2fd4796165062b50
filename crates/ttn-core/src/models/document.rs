//! Result data model: the closed field set of a транспортная накладная
//! (ТТН), per-field extraction records and the per-document outcome.

use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::ErrorKind;

/// The twelve canonical ТТН fields. The set is closed: extraction,
/// correction and export all dispatch over this enum.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum FieldName {
    DocumentNumber,
    DocumentDate,
    SenderName,
    SenderInn,
    ReceiverName,
    ReceiverInn,
    VehicleNumber,
    DriverName,
    CargoDescription,
    CargoWeight,
    CargoVolume,
    PackagesCount,
}

/// Value shape a field carries after typed parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Text,
    Date,
    Decimal,
    Integer,
}

impl FieldName {
    /// All fields in canonical (export column) order.
    pub const ALL: [FieldName; 12] = [
        FieldName::DocumentNumber,
        FieldName::DocumentDate,
        FieldName::SenderName,
        FieldName::SenderInn,
        FieldName::ReceiverName,
        FieldName::ReceiverInn,
        FieldName::VehicleNumber,
        FieldName::DriverName,
        FieldName::CargoDescription,
        FieldName::CargoWeight,
        FieldName::CargoVolume,
        FieldName::PackagesCount,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FieldName::DocumentNumber => "document_number",
            FieldName::DocumentDate => "document_date",
            FieldName::SenderName => "sender_name",
            FieldName::SenderInn => "sender_inn",
            FieldName::ReceiverName => "receiver_name",
            FieldName::ReceiverInn => "receiver_inn",
            FieldName::VehicleNumber => "vehicle_number",
            FieldName::DriverName => "driver_name",
            FieldName::CargoDescription => "cargo_description",
            FieldName::CargoWeight => "cargo_weight",
            FieldName::CargoVolume => "cargo_volume",
            FieldName::PackagesCount => "packages_count",
        }
    }

    pub fn from_str_opt(s: &str) -> Option<Self> {
        FieldName::ALL.iter().find(|f| f.as_str() == s).copied()
    }

    /// Russian column header used by the export adapter.
    pub fn label_ru(&self) -> &'static str {
        match self {
            FieldName::DocumentNumber => "Номер ТТН",
            FieldName::DocumentDate => "Дата ТТН",
            FieldName::SenderName => "Отправитель",
            FieldName::SenderInn => "ИНН отправителя",
            FieldName::ReceiverName => "Получатель",
            FieldName::ReceiverInn => "ИНН получателя",
            FieldName::VehicleNumber => "Номер ТС",
            FieldName::DriverName => "ФИО водителя",
            FieldName::CargoDescription => "Описание груза",
            FieldName::CargoWeight => "Вес груза (кг)",
            FieldName::CargoVolume => "Объем груза (м³)",
            FieldName::PackagesCount => "Количество мест",
        }
    }

    pub fn value_kind(&self) -> ValueKind {
        match self {
            FieldName::DocumentDate => ValueKind::Date,
            FieldName::CargoWeight | FieldName::CargoVolume => ValueKind::Decimal,
            FieldName::PackagesCount => ValueKind::Integer,
            _ => ValueKind::Text,
        }
    }
}

impl fmt::Display for FieldName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Typed field value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum FieldValue {
    Text(String),
    Date(NaiveDate),
    Decimal(Decimal),
    Integer(u32),
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Text(s) => write!(f, "{}", s),
            FieldValue::Date(d) => write!(f, "{}", d.format("%d.%m.%Y")),
            FieldValue::Decimal(d) => write!(f, "{}", d),
            FieldValue::Integer(n) => write!(f, "{}", n),
        }
    }
}

/// One extracted field with its own confidence and validity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedField {
    pub name: FieldName,
    pub value: FieldValue,
    /// Matcher confidence on a 0-100 scale.
    pub confidence: f32,
    /// Whether the value passed its field validator.
    pub valid: bool,
}

/// Quality tier derived from the overall confidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityTier {
    High,
    Medium,
    Low,
    VeryLow,
}

impl QualityTier {
    pub fn from_confidence(confidence: f32) -> Self {
        if confidence >= 80.0 {
            QualityTier::High
        } else if confidence >= 60.0 {
            QualityTier::Medium
        } else if confidence >= 40.0 {
            QualityTier::Low
        } else {
            QualityTier::VeryLow
        }
    }

    pub fn label_ru(&self) -> &'static str {
        match self {
            QualityTier::High => "Высокое",
            QualityTier::Medium => "Среднее",
            QualityTier::Low => "Низкое",
            QualityTier::VeryLow => "Очень низкое",
        }
    }
}

/// Document-level validation verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationStatus {
    /// Every extracted field passed its validator.
    Valid,
    /// Some extracted fields passed, others failed.
    Partial,
    /// No extracted field passed, or nothing was extracted at all.
    Invalid,
    /// The document is queued and has not been processed yet.
    Pending,
}

impl ValidationStatus {
    pub fn label_ru(&self) -> &'static str {
        match self {
            ValidationStatus::Valid => "Валиден",
            ValidationStatus::Partial => "Частично валиден",
            ValidationStatus::Invalid => "Невалиден",
            ValidationStatus::Pending => "Ожидает обработки",
        }
    }
}

/// Where the raw text of a document came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecognitionSource {
    /// The external OCR engine read rasterized pages.
    Engine,
    /// The PDF carried a usable text layer; recognition was skipped.
    EmbeddedText,
    /// The engine was unavailable; a fixed synthetic result was used.
    Demo,
}

/// Complete result of processing one document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub document_id: String,
    /// Extracted fields, keyed by canonical name. Absent fields are
    /// absent keys, never empty values.
    pub fields: BTreeMap<FieldName, ExtractedField>,
    /// Aggregate confidence on a 0-100 scale.
    pub overall_confidence: f32,
    pub quality_tier: QualityTier,
    pub validation_status: ValidationStatus,
    pub requires_manual_check: bool,
    /// True when recognition ran in a degraded mode (demo fallback).
    pub degraded: bool,
    pub source: RecognitionSource,
    pub page_count: usize,
    /// Concatenated page text after OCR corrections.
    pub raw_text: String,
    #[serde(default)]
    pub processing_time_ms: u64,
}

impl ExtractionResult {
    pub fn field_value(&self, name: FieldName) -> Option<&FieldValue> {
        self.fields.get(&name).map(|f| &f.value)
    }

    pub fn valid_field_count(&self) -> usize {
        self.fields.values().filter(|f| f.valid).count()
    }
}

/// Per-document egress of the pipeline: a result or a classified error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessOutcome {
    pub document_id: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<ExtractionResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl ProcessOutcome {
    pub fn ok(result: ExtractionResult) -> Self {
        ProcessOutcome {
            document_id: result.document_id.clone(),
            success: true,
            result: Some(result),
            error: None,
            error_message: None,
        }
    }

    pub fn failed(document_id: impl Into<String>, kind: ErrorKind, message: String) -> Self {
        ProcessOutcome {
            document_id: document_id.into(),
            success: false,
            result: None,
            error: Some(kind),
            error_message: Some(message),
        }
    }
}

/// Batch report in input order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    pub processed: usize,
    pub failed: usize,
    pub outcomes: Vec<ProcessOutcome>,
}

impl BatchReport {
    pub fn from_outcomes(outcomes: Vec<ProcessOutcome>) -> Self {
        let processed = outcomes.iter().filter(|o| o.success).count();
        let failed = outcomes.len() - processed;
        BatchReport {
            processed,
            failed,
            outcomes,
        }
    }
}
