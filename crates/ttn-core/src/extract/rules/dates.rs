//! Document date extraction.

use chrono::NaiveDate;

use super::{ExtractionMatch, FieldExtractor};
use crate::extract::patterns::{DATE_DMY, DATE_LABELED, DATE_YMD};

/// Parse a date string in the formats seen on ТТН forms:
/// dd.mm.yyyy, dd/mm/yyyy (two-digit years accepted) and yyyy-mm-dd.
/// Calendar-impossible dates parse to None.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();

    if let Some(caps) = DATE_YMD.captures(value) {
        let year: i32 = caps[1].parse().ok()?;
        let month: u32 = caps[2].parse().ok()?;
        let day: u32 = caps[3].parse().ok()?;
        return NaiveDate::from_ymd_opt(year, month, day);
    }

    if let Some(caps) = DATE_DMY.captures(value) {
        let day: u32 = caps[1].parse().ok()?;
        let month: u32 = caps[2].parse().ok()?;
        let year: i32 = caps[3].parse().ok()?;
        return NaiveDate::from_ymd_opt(year, month, day);
    }

    // Two-digit years: dd.mm.yy
    let parts: Vec<&str> = value.split(['.', '/']).collect();
    if parts.len() == 3 && parts[2].len() == 2 {
        let day: u32 = parts[0].parse().ok()?;
        let month: u32 = parts[1].parse().ok()?;
        let year: i32 = parts[2].parse().ok()?;
        return NaiveDate::from_ymd_opt(expand_year(year), month, day);
    }

    None
}

/// Expand a two-digit year; the pivot matches document archives that
/// reach back into the 1990s.
fn expand_year(year: i32) -> i32 {
    if year <= 49 { 2000 + year } else { 1900 + year }
}

/// Extracts the document date.
pub struct DateExtractor;

impl DateExtractor {
    pub fn new() -> Self {
        DateExtractor
    }
}

impl Default for DateExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for DateExtractor {
    type Output = ExtractionMatch<NaiveDate>;

    fn extract(&self, text: &str) -> Option<Self::Output> {
        super::best_match(self.extract_all(text))
    }

    fn extract_all(&self, text: &str) -> Vec<Self::Output> {
        let mut matches = Vec::new();

        for caps in DATE_LABELED.captures_iter(text) {
            if let Some(date) = parse_date(&caps[1]) {
                let m = caps.get(1).map(|m| (m.start(), m.end()));
                let mut result = ExtractionMatch::new(date, 0.95).with_source("date_labeled");
                result.position = m;
                matches.push(result);
            }
        }

        for caps in DATE_DMY.captures_iter(text) {
            if let Some(date) = parse_date(&caps[0]) {
                let m = caps.get(0).map(|m| (m.start(), m.end()));
                if matches
                    .iter()
                    .any(|existing: &ExtractionMatch<NaiveDate>| existing.position == m)
                {
                    continue;
                }
                let mut result = ExtractionMatch::new(date, 0.85).with_source("date_dmy");
                result.position = m;
                matches.push(result);
            }
        }

        for caps in DATE_YMD.captures_iter(text) {
            if let Some(date) = parse_date(&caps[0]) {
                let m = caps.get(0).map(|m| (m.start(), m.end()));
                let mut result = ExtractionMatch::new(date, 0.8).with_source("date_ymd");
                result.position = m;
                matches.push(result);
            }
        }

        matches
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_date_dmy() {
        assert_eq!(
            parse_date("15.09.2024"),
            NaiveDate::from_ymd_opt(2024, 9, 15)
        );
        assert_eq!(
            parse_date("1/2/2024"),
            NaiveDate::from_ymd_opt(2024, 2, 1)
        );
    }

    #[test]
    fn test_parse_date_ymd() {
        assert_eq!(
            parse_date("2024-09-15"),
            NaiveDate::from_ymd_opt(2024, 9, 15)
        );
    }

    #[test]
    fn test_impossible_dates_rejected() {
        assert_eq!(parse_date("32.01.2024"), None);
        assert_eq!(parse_date("29.02.2023"), None);
        assert_eq!(parse_date("15.13.2024"), None);
    }

    #[test]
    fn test_leap_day_accepted() {
        assert_eq!(
            parse_date("29.02.2024"),
            NaiveDate::from_ymd_opt(2024, 2, 29)
        );
    }

    #[test]
    fn test_two_digit_year() {
        assert_eq!(
            parse_date("15.09.24"),
            NaiveDate::from_ymd_opt(2024, 9, 15)
        );
        assert_eq!(
            parse_date("15.09.98"),
            NaiveDate::from_ymd_opt(1998, 9, 15)
        );
    }

    #[test]
    fn test_labeled_date_wins() {
        let extractor = DateExtractor::new();
        let text = "поставка 01.01.2024\nДата: 15.09.2024";
        let best = extractor.extract(text).unwrap();
        assert_eq!(best.value, NaiveDate::from_ymd_opt(2024, 9, 15).unwrap());
        assert_eq!(best.source, "date_labeled");
    }

    #[test]
    fn test_invalid_date_not_extracted() {
        let extractor = DateExtractor::new();
        assert!(extractor.extract("Дата: 32.01.2024 конец").is_none());
    }
}
