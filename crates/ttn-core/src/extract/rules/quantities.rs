//! Cargo quantity extraction: weight, volume and package count.

use rust_decimal::Decimal;
use std::str::FromStr;

use super::ExtractionMatch;
use crate::extract::patterns::{
    PACKAGES_BEFORE, PACKAGES_LABELED, PACKAGES_SHORT, VOLUME_LABELED, VOLUME_STANDALONE,
    WEIGHT_LABELED, WEIGHT_STANDALONE,
};

/// Parse a decimal the way it appears on Russian forms: comma or dot
/// as the separator. Negative values never occur on a ТТН and are
/// rejected.
pub fn parse_decimal_ru(value: &str) -> Option<Decimal> {
    let normalized = value.trim().replace(',', ".");
    let decimal = Decimal::from_str(&normalized).ok()?;
    if decimal.is_sign_negative() {
        return None;
    }
    Some(decimal)
}

/// Parse a non-negative integer count.
pub fn parse_count(value: &str) -> Option<u32> {
    value.trim().parse::<u32>().ok()
}

/// Cargo weight in kilograms.
pub fn extract_weight(text: &str) -> Option<ExtractionMatch<Decimal>> {
    let mut matches = Vec::new();
    for caps in WEIGHT_LABELED.captures_iter(text) {
        if let Some(value) = parse_decimal_ru(&caps[1]) {
            let m = caps.get(1).map(|m| (m.start(), m.end()));
            let mut result = ExtractionMatch::new(value, 0.95).with_source("weight_labeled");
            result.position = m;
            matches.push(result);
        }
    }
    for caps in WEIGHT_STANDALONE.captures_iter(text) {
        if let Some(value) = parse_decimal_ru(&caps[1]) {
            let m = caps.get(1).map(|m| (m.start(), m.end()));
            if matches
                .iter()
                .any(|existing: &ExtractionMatch<Decimal>| existing.position == m)
            {
                continue;
            }
            let mut result = ExtractionMatch::new(value, 0.7).with_source("weight_standalone");
            result.position = m;
            matches.push(result);
        }
    }
    super::best_match(matches)
}

/// Cargo volume in cubic meters.
pub fn extract_volume(text: &str) -> Option<ExtractionMatch<Decimal>> {
    let mut matches = Vec::new();
    for caps in VOLUME_LABELED.captures_iter(text) {
        if let Some(value) = parse_decimal_ru(&caps[1]) {
            let m = caps.get(1).map(|m| (m.start(), m.end()));
            let mut result = ExtractionMatch::new(value, 0.95).with_source("volume_labeled");
            result.position = m;
            matches.push(result);
        }
    }
    for caps in VOLUME_STANDALONE.captures_iter(text) {
        if let Some(value) = parse_decimal_ru(&caps[1]) {
            let m = caps.get(1).map(|m| (m.start(), m.end()));
            if matches
                .iter()
                .any(|existing: &ExtractionMatch<Decimal>| existing.position == m)
            {
                continue;
            }
            let mut result = ExtractionMatch::new(value, 0.75).with_source("volume_standalone");
            result.position = m;
            matches.push(result);
        }
    }
    super::best_match(matches)
}

/// Number of packages ("мест").
pub fn extract_packages(text: &str) -> Option<ExtractionMatch<u32>> {
    let mut matches = Vec::new();
    for caps in PACKAGES_LABELED.captures_iter(text) {
        if let Some(value) = parse_count(&caps[1]) {
            let m = caps.get(1).map(|m| (m.start(), m.end()));
            let mut result = ExtractionMatch::new(value, 0.95).with_source("packages_labeled");
            result.position = m;
            matches.push(result);
        }
    }
    for pattern in [&*PACKAGES_SHORT, &*PACKAGES_BEFORE] {
        for caps in pattern.captures_iter(text) {
            if let Some(value) = parse_count(&caps[1]) {
                let m = caps.get(1).map(|m| (m.start(), m.end()));
                if matches
                    .iter()
                    .any(|existing: &ExtractionMatch<u32>| existing.position == m)
                {
                    continue;
                }
                let mut result =
                    ExtractionMatch::new(value, 0.75).with_source("packages_standalone");
                result.position = m;
                matches.push(result);
            }
        }
    }
    super::best_match(matches)
}
