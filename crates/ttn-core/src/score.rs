//! Confidence aggregation and document-level validation.

use std::collections::BTreeMap;

use crate::models::document::{ExtractedField, FieldName, QualityTier, ValidationStatus};

/// Verdict produced for one document.
#[derive(Debug, Clone, PartialEq)]
pub struct Assessment {
    pub overall_confidence: f32,
    pub quality_tier: QualityTier,
    pub validation_status: ValidationStatus,
    pub requires_manual_check: bool,
}

/// Combines recognition confidence with extraction completeness.
///
/// The field component dominates: a page the engine reads cleanly but
/// from which nothing extracts is still a bad document.
pub struct ConfidenceEngine {
    ocr_weight: f32,
    field_weight: f32,
    manual_check_threshold: f32,
}

impl ConfidenceEngine {
    pub fn new() -> Self {
        ConfidenceEngine {
            ocr_weight: 0.4,
            field_weight: 0.6,
            manual_check_threshold: 60.0,
        }
    }

    /// Assess a document from its mean OCR confidence (0-100) and
    /// extracted fields.
    pub fn assess(
        &self,
        mean_ocr_confidence: f32,
        fields: &BTreeMap<FieldName, ExtractedField>,
    ) -> Assessment {
        let valid_count = fields.values().filter(|f| f.valid).count();
        let field_score = 100.0 * valid_count as f32 / FieldName::ALL.len() as f32;

        let overall_confidence = (self.ocr_weight * mean_ocr_confidence.clamp(0.0, 100.0)
            + self.field_weight * field_score)
            .clamp(0.0, 100.0);

        let validation_status = classify(valid_count, fields.len());

        let requires_manual_check = overall_confidence < self.manual_check_threshold
            || validation_status != ValidationStatus::Valid;

        Assessment {
            overall_confidence,
            quality_tier: QualityTier::from_confidence(overall_confidence),
            validation_status,
            requires_manual_check,
        }
    }

    /// Recompute the validation verdict after a manual correction.
    /// Confidence and tier are deliberately left as assessed at
    /// extraction time; only the human-reviewable flags move.
    pub fn revalidate(&self, fields: &BTreeMap<FieldName, ExtractedField>) -> (ValidationStatus, bool) {
        let valid_count = fields.values().filter(|f| f.valid).count();
        let status = classify(valid_count, fields.len());
        (status, status != ValidationStatus::Valid)
    }
}

/// Classify a field set: `valid` when every present field passed,
/// `partial` on a mix, `invalid` when nothing passed or nothing was
/// extracted. `pending` is reserved for documents that have not run.
fn classify(valid_count: usize, total: usize) -> ValidationStatus {
    if total == 0 || valid_count == 0 {
        ValidationStatus::Invalid
    } else if valid_count < total {
        ValidationStatus::Partial
    } else {
        ValidationStatus::Valid
    }
}

impl Default for ConfidenceEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::document::FieldValue;
    use pretty_assertions::assert_eq;

    fn field(name: FieldName, valid: bool) -> ExtractedField {
        ExtractedField {
            name,
            value: FieldValue::Text("x".to_string()),
            confidence: 90.0,
            valid,
        }
    }

    fn fields(valid_count: usize, invalid_count: usize) -> BTreeMap<FieldName, ExtractedField> {
        let mut map = BTreeMap::new();
        for (i, &name) in FieldName::ALL.iter().enumerate() {
            if i < valid_count {
                map.insert(name, field(name, true));
            } else if i < valid_count + invalid_count {
                map.insert(name, field(name, false));
            }
        }
        map
    }

    #[test]
    fn test_zero_extraction_never_above_low() {
        let engine = ConfidenceEngine::new();
        let assessment = engine.assess(100.0, &BTreeMap::new());
        assert!(assessment.overall_confidence <= 40.0);
        assert_ne!(assessment.quality_tier, QualityTier::High);
        assert_ne!(assessment.quality_tier, QualityTier::Medium);
        assert_eq!(assessment.validation_status, ValidationStatus::Invalid);
        assert!(assessment.requires_manual_check);
    }

    #[test]
    fn test_all_fields_valid_high_ocr_is_high_tier() {
        let engine = ConfidenceEngine::new();
        let assessment = engine.assess(95.0, &fields(12, 0));
        assert_eq!(assessment.quality_tier, QualityTier::High);
        assert_eq!(assessment.validation_status, ValidationStatus::Valid);
        assert!(!assessment.requires_manual_check);
    }

    #[test]
    fn test_confidence_monotonic_in_valid_fields() {
        let engine = ConfidenceEngine::new();
        let mut previous = -1.0f32;
        for count in 0..=12 {
            let assessment = engine.assess(70.0, &fields(count, 0));
            assert!(assessment.overall_confidence > previous);
            previous = assessment.overall_confidence;
        }
    }

    #[test]
    fn test_mixed_validity_classifies_partial() {
        let engine = ConfidenceEngine::new();
        let assessment = engine.assess(95.0, &fields(11, 1));
        assert_eq!(assessment.validation_status, ValidationStatus::Partial);
        assert!(assessment.requires_manual_check);
        let json = serde_json::to_string(&assessment.validation_status).unwrap();
        assert_eq!(json, "\"partial\"");
    }

    #[test]
    fn test_no_valid_fields_classifies_invalid() {
        let engine = ConfidenceEngine::new();
        let assessment = engine.assess(95.0, &fields(0, 3));
        assert_eq!(assessment.validation_status, ValidationStatus::Invalid);
        assert!(assessment.requires_manual_check);
    }

    #[test]
    fn test_low_confidence_forces_manual_check() {
        let engine = ConfidenceEngine::new();
        let assessment = engine.assess(30.0, &fields(6, 0));
        assert!(assessment.overall_confidence < 60.0);
        assert!(assessment.requires_manual_check);
    }

    #[test]
    fn test_revalidate_clears_flag_when_all_valid() {
        let engine = ConfidenceEngine::new();
        let (status, manual) = engine.revalidate(&fields(5, 0));
        assert_eq!(status, ValidationStatus::Valid);
        assert!(!manual);
    }

    #[test]
    fn test_revalidate_partial_keeps_flag() {
        let engine = ConfidenceEngine::new();
        let (status, manual) = engine.revalidate(&fields(4, 1));
        assert_eq!(status, ValidationStatus::Partial);
        assert!(manual);
    }

    #[test]
    fn test_revalidate_no_valid_fields_is_invalid() {
        let engine = ConfidenceEngine::new();
        let (status, manual) = engine.revalidate(&fields(0, 2));
        assert_eq!(status, ValidationStatus::Invalid);
        assert!(manual);
    }
}
