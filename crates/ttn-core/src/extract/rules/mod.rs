//! Field extraction rules.
//!
//! Each rule module owns one value family: INNs, dates, vehicle
//! plates, quantities. Rules return matches with a confidence in
//! [0, 1]; labeled context scores higher than a bare shape match.

pub mod dates;
pub mod inn;
pub mod plates;
pub mod quantities;

/// Trait for field extractors.
pub trait FieldExtractor {
    type Output;

    /// Extract the best match from text.
    fn extract(&self, text: &str) -> Option<Self::Output>;

    /// Extract all matches from text.
    fn extract_all(&self, text: &str) -> Vec<Self::Output>;
}

/// A single extraction match with confidence and provenance.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionMatch<T> {
    /// The extracted value.
    pub value: T,
    /// Confidence score (0.0 to 1.0).
    pub confidence: f32,
    /// Byte offset of the match in the source text.
    pub position: Option<(usize, usize)>,
    /// Which pattern produced the match.
    pub source: String,
}

impl<T> ExtractionMatch<T> {
    pub fn new(value: T, confidence: f32) -> Self {
        Self {
            value,
            confidence,
            position: None,
            source: String::new(),
        }
    }

    pub fn with_position(mut self, start: usize, end: usize) -> Self {
        self.position = Some((start, end));
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }
}

/// Pick the winner among matches: highest confidence, ties broken by
/// earliest position.
pub fn best_match<T>(matches: Vec<ExtractionMatch<T>>) -> Option<ExtractionMatch<T>> {
    matches.into_iter().min_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| {
                let pos_a = a.position.map(|p| p.0).unwrap_or(usize::MAX);
                let pos_b = b.position.map(|p| p.0).unwrap_or(usize::MAX);
                pos_a.cmp(&pos_b)
            })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_best_match_prefers_confidence() {
        let matches = vec![
            ExtractionMatch::new("a", 0.7).with_position(0, 1),
            ExtractionMatch::new("b", 0.95).with_position(10, 11),
        ];
        assert_eq!(best_match(matches).unwrap().value, "b");
    }

    #[test]
    fn test_best_match_ties_break_by_position() {
        let matches = vec![
            ExtractionMatch::new("late", 0.9).with_position(50, 54),
            ExtractionMatch::new("early", 0.9).with_position(5, 10),
        ];
        assert_eq!(best_match(matches).unwrap().value, "early");
    }

    #[test]
    fn test_best_match_empty() {
        assert!(best_match(Vec::<ExtractionMatch<&str>>::new()).is_none());
    }
}
