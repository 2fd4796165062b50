//! INN (taxpayer number) extraction and validation.

use super::{ExtractionMatch, FieldExtractor};
use crate::extract::patterns::{INN_LABELED, INN_STANDALONE};

/// An INN is exactly 10 digits (organizations) or 12 digits
/// (individual entrepreneurs). Checksum digits are not verified.
pub fn validate_inn(value: &str) -> bool {
    (value.len() == 10 || value.len() == 12) && value.chars().all(|c| c.is_ascii_digit())
}

/// Extracts INN values from text.
pub struct InnExtractor;

impl InnExtractor {
    pub fn new() -> Self {
        InnExtractor
    }
}

impl Default for InnExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for InnExtractor {
    type Output = ExtractionMatch<String>;

    fn extract(&self, text: &str) -> Option<Self::Output> {
        self.extract_all(text).into_iter().next()
    }

    fn extract_all(&self, text: &str) -> Vec<Self::Output> {
        let mut matches = Vec::new();

        for caps in INN_LABELED.captures_iter(text) {
            let value = caps[1].to_string();
            if !validate_inn(&value) {
                continue;
            }
            let m = caps.get(1).map(|m| (m.start(), m.end()));
            let mut result = ExtractionMatch::new(value, 0.95).with_source("inn_labeled");
            result.position = m;
            matches.push(result);
        }

        for caps in INN_STANDALONE.captures_iter(text) {
            let value = caps[1].to_string();
            let m = caps.get(1).map(|m| (m.start(), m.end()));
            // Skip positions already claimed by a labeled match.
            if matches
                .iter()
                .any(|existing: &ExtractionMatch<String>| existing.position == m)
            {
                continue;
            }
            let mut result = ExtractionMatch::new(value, 0.7).with_source("inn_standalone");
            result.position = m;
            matches.push(result);
        }

        matches.sort_by_key(|m| m.position.map(|p| p.0).unwrap_or(usize::MAX));
        matches
    }
}
