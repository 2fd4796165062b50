//! ТТН field extraction from recognized text.

pub mod corrections;
pub mod patterns;
pub mod rules;

use std::collections::BTreeMap;

use tracing::debug;

use crate::models::document::{ExtractedField, FieldName, FieldValue};
use patterns::{
    CARGO_LABELED, DOC_NUMBER_SHAPE, DOC_NUMBER_SIGN, DOC_NUMBER_TTN, DOC_NUMBER_WORD,
    DRIVER_LABELED, RECEIVER_LABELED, SENDER_LABELED,
};
use rules::dates::DateExtractor;
use rules::inn::{InnExtractor, validate_inn};
use rules::plates::{PlateExtractor, validate_plate};
use rules::{ExtractionMatch, FieldExtractor, best_match, quantities};

/// Extracts the canonical field set from recognized document text.
pub struct TtnExtractor {
    enable_corrections: bool,
    dates: DateExtractor,
    inns: InnExtractor,
    plates: PlateExtractor,
}

impl TtnExtractor {
    pub fn new() -> Self {
        TtnExtractor {
            enable_corrections: true,
            dates: DateExtractor::new(),
            inns: InnExtractor::new(),
            plates: PlateExtractor::new(),
        }
    }

    pub fn with_corrections(mut self, enable: bool) -> Self {
        self.enable_corrections = enable;
        self
    }

    /// Apply the OCR confusable-correction pass.
    pub fn normalize(&self, text: &str) -> String {
        if self.enable_corrections {
            corrections::apply(text)
        } else {
            text.to_string()
        }
    }

    /// Extract all recognizable fields from normalized text. Fields
    /// that do not appear are absent from the map, never empty.
    pub fn extract(&self, text: &str) -> BTreeMap<FieldName, ExtractedField> {
        let mut fields = BTreeMap::new();

        if let Some(field) = self.extract_document_number(text) {
            fields.insert(FieldName::DocumentNumber, field);
        }
        if let Some(m) = self.dates.extract(text) {
            fields.insert(
                FieldName::DocumentDate,
                make_field(FieldName::DocumentDate, FieldValue::Date(m.value), m.confidence, true),
            );
        }

        self.extract_parties(text, &mut fields);

        if let Some(m) = self.plates.extract(text) {
            let valid = validate_plate(&m.value);
            fields.insert(
                FieldName::VehicleNumber,
                make_field(
                    FieldName::VehicleNumber,
                    FieldValue::Text(m.value),
                    m.confidence,
                    valid,
                ),
            );
        }

        if let Some(value) = extract_labeled_text(&DRIVER_LABELED, text) {
            let valid = value.split_whitespace().count() >= 2;
            fields.insert(
                FieldName::DriverName,
                make_field(FieldName::DriverName, FieldValue::Text(value), 0.9, valid),
            );
        }

        if let Some(value) = extract_labeled_text(&CARGO_LABELED, text) {
            let valid = value.chars().count() >= 5;
            fields.insert(
                FieldName::CargoDescription,
                make_field(FieldName::CargoDescription, FieldValue::Text(value), 0.85, valid),
            );
        }

        if let Some(m) = quantities::extract_weight(text) {
            fields.insert(
                FieldName::CargoWeight,
                make_field(FieldName::CargoWeight, FieldValue::Decimal(m.value), m.confidence, true),
            );
        }
        if let Some(m) = quantities::extract_volume(text) {
            fields.insert(
                FieldName::CargoVolume,
                make_field(FieldName::CargoVolume, FieldValue::Decimal(m.value), m.confidence, true),
            );
        }
        if let Some(m) = quantities::extract_packages(text) {
            fields.insert(
                FieldName::PackagesCount,
                make_field(FieldName::PackagesCount, FieldValue::Integer(m.value), m.confidence, true),
            );
        }

        debug!("extracted {} of {} fields", fields.len(), FieldName::ALL.len());
        fields
    }

    fn extract_document_number(&self, text: &str) -> Option<ExtractedField> {
        let mut matches = Vec::new();
        for (pattern, confidence, source) in [
            (&*DOC_NUMBER_SIGN, 0.9, "doc_number_sign"),
            (&*DOC_NUMBER_TTN, 0.85, "doc_number_ttn"),
            (&*DOC_NUMBER_WORD, 0.8, "doc_number_word"),
        ] {
            for caps in pattern.captures_iter(text) {
                let value = caps[1].trim_end_matches(['-', '/', '\\']).to_string();
                if value.is_empty() {
                    continue;
                }
                let m = caps.get(1).map(|m| (m.start(), m.end()));
                let mut result = ExtractionMatch::new(value, confidence).with_source(source);
                result.position = m;
                matches.push(result);
            }
        }

        best_match(matches).map(|m| {
            let valid = DOC_NUMBER_SHAPE.is_match(&m.value);
            make_field(
                FieldName::DocumentNumber,
                FieldValue::Text(m.value),
                m.confidence,
                valid,
            )
        })
    }

    /// Sender and receiver names plus their INNs. Each INN is assigned
    /// to the party whose label most closely precedes it; leftover
    /// INNs fill empty slots in document order.
    fn extract_parties(&self, text: &str, fields: &mut BTreeMap<FieldName, ExtractedField>) {
        let sender = SENDER_LABELED.captures(text);
        let receiver = RECEIVER_LABELED.captures(text);

        let sender_start = sender.as_ref().and_then(|c| c.get(0)).map(|m| m.start());
        let receiver_start = receiver.as_ref().and_then(|c| c.get(0)).map(|m| m.start());

        if let Some(caps) = &sender {
            let value = clean_party_name(&caps[1]);
            if !value.is_empty() {
                fields.insert(
                    FieldName::SenderName,
                    make_field(FieldName::SenderName, FieldValue::Text(value), 0.9, true),
                );
            }
        }
        if let Some(caps) = &receiver {
            let value = clean_party_name(&caps[1]);
            if !value.is_empty() {
                fields.insert(
                    FieldName::ReceiverName,
                    make_field(FieldName::ReceiverName, FieldValue::Text(value), 0.9, true),
                );
            }
        }

        let mut sender_inn: Option<ExtractionMatch<String>> = None;
        let mut receiver_inn: Option<ExtractionMatch<String>> = None;
        let mut unassigned: Vec<ExtractionMatch<String>> = Vec::new();

        for m in self.inns.extract_all(text) {
            let pos = m.position.map(|p| p.0).unwrap_or(0);
            let sender_dist = sender_start.filter(|&s| pos >= s).map(|s| pos - s);
            let receiver_dist = receiver_start.filter(|&s| pos >= s).map(|s| pos - s);
            match (sender_dist, receiver_dist) {
                (Some(sd), Some(rd)) if sd <= rd => {
                    if sender_inn.is_none() {
                        sender_inn = Some(m);
                    } else {
                        unassigned.push(m);
                    }
                }
                (_, Some(_)) => {
                    if receiver_inn.is_none() {
                        receiver_inn = Some(m);
                    } else {
                        unassigned.push(m);
                    }
                }
                (Some(_), None) => {
                    if sender_inn.is_none() {
                        sender_inn = Some(m);
                    } else {
                        unassigned.push(m);
                    }
                }
                (None, None) => unassigned.push(m),
            }
        }
        for m in unassigned {
            if sender_inn.is_none() {
                sender_inn = Some(m);
            } else if receiver_inn.is_none() {
                receiver_inn = Some(m);
            }
        }

        if let Some(m) = sender_inn {
            let valid = validate_inn(&m.value);
            fields.insert(
                FieldName::SenderInn,
                make_field(FieldName::SenderInn, FieldValue::Text(m.value), m.confidence, valid),
            );
        }
        if let Some(m) = receiver_inn {
            let valid = validate_inn(&m.value);
            fields.insert(
                FieldName::ReceiverInn,
                make_field(FieldName::ReceiverInn, FieldValue::Text(m.value), m.confidence, valid),
            );
        }
    }
}

impl Default for TtnExtractor {
    fn default() -> Self {
        Self::new()
    }
}

fn make_field(name: FieldName, value: FieldValue, confidence: f32, valid: bool) -> ExtractedField {
    ExtractedField {
        name,
        value,
        confidence: (confidence * 100.0).clamp(0.0, 100.0),
        valid,
    }
}

fn extract_labeled_text(pattern: &regex::Regex, text: &str) -> Option<String> {
    let caps = pattern.captures(text)?;
    let value = clean_party_name(&caps[1]);
    if value.is_empty() { None } else { Some(value) }
}

/// Collapse whitespace and strip trailing punctuation from a captured
/// free-text value.
fn clean_party_name(value: &str) -> String {
    value
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .trim_end_matches([',', '.', ';', ':'])
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ocr::DEMO_PAGE_TEXT;
    use pretty_assertions::assert_eq;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn extractor() -> TtnExtractor {
        TtnExtractor::new()
    }

    #[test]
    fn test_demo_document_extracts_core_fields() {
        let fields = extractor().extract(DEMO_PAGE_TEXT);

        assert_eq!(
            fields[&FieldName::DocumentNumber].value,
            FieldValue::Text("ТТН-2024-001234".to_string())
        );
        assert_eq!(
            fields[&FieldName::SenderInn].value,
            FieldValue::Text("7712345678".to_string())
        );
        assert_eq!(
            fields[&FieldName::ReceiverInn].value,
            FieldValue::Text("7798765432".to_string())
        );
        assert_eq!(
            fields[&FieldName::VehicleNumber].value,
            FieldValue::Text("А123ВВ777".to_string())
        );
        assert_eq!(
            fields[&FieldName::DriverName].value,
            FieldValue::Text("Иванов Петр Сергеевич".to_string())
        );
        assert_eq!(
            fields[&FieldName::CargoWeight].value,
            FieldValue::Decimal(Decimal::from_str("1500.00").unwrap())
        );
        assert_eq!(fields[&FieldName::PackagesCount].value, FieldValue::Integer(30));
        assert!(fields.values().all(|f| f.valid));
        // The demo form carries no volume line.
        assert!(!fields.contains_key(&FieldName::CargoVolume));
    }

    #[test]
    fn test_empty_text_extracts_nothing() {
        assert!(extractor().extract("").is_empty());
        assert!(extractor().extract("случайный текст без полей").is_empty());
    }

    #[test]
    fn test_malformed_plate_not_extracted() {
        let fields = extractor().extract("Автомобиль: Ж123ВВ777 и прицеп");
        // Ж is not a series letter, so the labeled candidate is not
        // even matched; nothing is recorded.
        assert!(!fields.contains_key(&FieldName::VehicleNumber));
    }

    #[test]
    fn test_inn_assignment_follows_labels() {
        let text = "Получатель: ООО \"Приемка\"\nИНН: 1234567890\n\nОтправитель: ИП Иванов\nИНН: 987654321098";
        let fields = extractor().extract(text);
        assert_eq!(
            fields[&FieldName::ReceiverInn].value,
            FieldValue::Text("1234567890".to_string())
        );
        assert_eq!(
            fields[&FieldName::SenderInn].value,
            FieldValue::Text("987654321098".to_string())
        );
    }

    #[test]
    fn test_single_unlabeled_inn_goes_to_sender() {
        let fields = extractor().extract("организация 7712345678 отгрузила товар");
        assert_eq!(
            fields[&FieldName::SenderInn].value,
            FieldValue::Text("7712345678".to_string())
        );
        assert!(!fields.contains_key(&FieldName::ReceiverInn));
    }

    #[test]
    fn test_normalize_applies_corrections() {
        let normalized = extractor().normalize("ТТН Ne 18674/В");
        assert_eq!(normalized, "ТТН № 18674/Б");
    }

    #[test]
    fn test_corrections_can_be_disabled() {
        let normalized = extractor().with_corrections(false).normalize("ТТН Ne 18674");
        assert_eq!(normalized, "ТТН Ne 18674");
    }

    #[test]
    fn test_comma_weight_parsed() {
        let fields = extractor().extract("Вес: 1500,5 кг");
        assert_eq!(
            fields[&FieldName::CargoWeight].value,
            FieldValue::Decimal(Decimal::from_str("1500.5").unwrap())
        );
    }
}
