//! Vehicle registration plate extraction.
//!
//! Regional format: series letter, three digits, two series letters,
//! two-or-three-digit region code. Series letters come from the twelve
//! Cyrillic letters that have Latin glyph twins, so OCR output is
//! normalized from Latin lookalikes before the shape check.

use super::{ExtractionMatch, FieldExtractor};
use crate::extract::patterns::{PLATE_SHAPE, VEHICLE_LABELED, VEHICLE_STANDALONE};

/// Map Latin lookalike letters to their Cyrillic twins and strip
/// spacing.
pub fn normalize_plate(value: &str) -> String {
    value
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| match c.to_ascii_uppercase() {
            'A' => 'А',
            'B' => 'В',
            'E' => 'Е',
            'K' => 'К',
            'M' => 'М',
            'H' => 'Н',
            'O' => 'О',
            'P' => 'Р',
            'C' => 'С',
            'T' => 'Т',
            'Y' => 'У',
            'X' => 'Х',
            other => {
                if other.is_ascii_uppercase() {
                    other
                } else {
                    c.to_uppercase().next().unwrap_or(c)
                }
            }
        })
        .collect()
}

pub fn validate_plate(value: &str) -> bool {
    PLATE_SHAPE.is_match(value)
}

/// Extracts vehicle plate numbers.
pub struct PlateExtractor;

impl PlateExtractor {
    pub fn new() -> Self {
        PlateExtractor
    }
}

impl Default for PlateExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for PlateExtractor {
    type Output = ExtractionMatch<String>;

    fn extract(&self, text: &str) -> Option<Self::Output> {
        super::best_match(self.extract_all(text))
    }

    fn extract_all(&self, text: &str) -> Vec<Self::Output> {
        let mut matches = Vec::new();

        for caps in VEHICLE_LABELED.captures_iter(text) {
            let value = normalize_plate(&caps[1]);
            let m = caps.get(1).map(|m| (m.start(), m.end()));
            let confidence = if validate_plate(&value) { 0.95 } else { 0.6 };
            let mut result = ExtractionMatch::new(value, confidence).with_source("plate_labeled");
            result.position = m;
            matches.push(result);
        }

        for caps in VEHICLE_STANDALONE.captures_iter(text) {
            let value = caps[0].to_string();
            let m = caps.get(0).map(|m| (m.start(), m.end()));
            let overlaps = matches.iter().any(|existing: &ExtractionMatch<String>| {
                match (existing.position, m) {
                    (Some(a), Some(b)) => a.0 <= b.0 && b.1 <= a.1,
                    _ => false,
                }
            });
            if overlaps {
                continue;
            }
            let mut result = ExtractionMatch::new(value, 0.75).with_source("plate_standalone");
            result.position = m;
            matches.push(result);
        }

        matches
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_latin_lookalikes() {
        assert_eq!(normalize_plate("A123BB777"), "А123ВВ777");
        assert_eq!(normalize_plate("а 123 вв 777"), "А123ВВ777");
    }

    #[test]
    fn test_validate_plate_shapes() {
        assert!(validate_plate("А123ВВ777"));
        assert!(validate_plate("К845ОР77"));
        assert!(!validate_plate("А123ВВ7"));
        assert!(!validate_plate("Ж123ВВ777")); // Ж is not a series letter
        assert!(!validate_plate("А1234ВВ777"));
    }

    #[test]
    fn test_labeled_plate_extracted_and_normalized() {
        let extractor = PlateExtractor::new();
        let best = extractor
            .extract("Транспортное средство: A123BB777")
            .unwrap();
        assert_eq!(best.value, "А123ВВ777");
        assert_eq!(best.confidence, 0.95);
    }

    #[test]
    fn test_two_digit_region_accepted() {
        let extractor = PlateExtractor::new();
        let matches = extractor.extract_all("гос номер: А123ВВ77");
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].confidence, 0.95);
        assert!(validate_plate(&matches[0].value));
    }

    #[test]
    fn test_standalone_plate_found() {
        let extractor = PlateExtractor::new();
        let best = extractor.extract("доставка машиной К845ОР77 утром").unwrap();
        assert_eq!(best.value, "К845ОР77");
        assert_eq!(best.source, "plate_standalone");
    }
}
