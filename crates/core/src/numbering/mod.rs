//! Document number formatting.
//!
//! Counters themselves live in the database (one row per document type
//! and year, incremented atomically). This module owns the presentation:
//! turning a counter value into the canonical document number string.

use chrono::{Datelike, NaiveDate};

/// Roman numerals for months 1 through 12.
const ROMAN_MONTHS: [&str; 12] = [
    "I", "II", "III", "IV", "V", "VI", "VII", "VIII", "IX", "X", "XI", "XII",
];

/// Returns the Roman numeral for a calendar month (1-12).
///
/// Out-of-range months fall back to the decimal representation rather
/// than panicking; chrono dates can never produce one.
#[must_use]
pub fn roman_month(month: u32) -> String {
    match month {
        1..=12 => ROMAN_MONTHS[(month - 1) as usize].to_string(),
        other => other.to_string(),
    }
}

/// The counter bucket year for a document date.
///
/// Counters reset per calendar year, so the bucket is just the year of
/// the document date.
#[must_use]
pub fn counter_year(date: NaiveDate) -> i32 {
    date.year()
}

/// Formats a document number as `{counter:04}/{TYPE}/{ROMAN_MONTH}-{YEAR}`.
///
/// Example: counter 42, type `JV`, March 2026 formats as `0042/JV/III-2026`.
/// Counters past 9999 widen naturally instead of truncating.
#[must_use]
pub fn format_document_number(counter: i64, type_code: &str, date: NaiveDate) -> String {
    format!(
        "{:04}/{}/{}-{}",
        counter,
        type_code,
        roman_month(date.month()),
        date.year()
    )
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
    }

    #[rstest]
    #[case(1, "I")]
    #[case(3, "III")]
    #[case(4, "IV")]
    #[case(8, "VIII")]
    #[case(9, "IX")]
    #[case(12, "XII")]
    fn test_roman_months(#[case] month: u32, #[case] expected: &str) {
        assert_eq!(roman_month(month), expected);
    }

    #[rstest]
    #[case(0, "0")]
    #[case(13, "13")]
    fn test_roman_month_out_of_range_falls_back(#[case] month: u32, #[case] expected: &str) {
        assert_eq!(roman_month(month), expected);
    }

    #[test]
    fn test_format_document_number() {
        assert_eq!(
            format_document_number(42, "JV", date(2026, 3, 15)),
            "0042/JV/III-2026"
        );
        assert_eq!(
            format_document_number(1, "INV", date(2026, 12, 1)),
            "0001/INV/XII-2026"
        );
    }

    #[test]
    fn test_counter_widens_past_four_digits() {
        assert_eq!(
            format_document_number(12345, "JV", date(2026, 1, 1)),
            "12345/JV/I-2026"
        );
    }

    #[test]
    fn test_counter_year_is_calendar_year() {
        assert_eq!(counter_year(date(2026, 1, 1)), 2026);
        assert_eq!(counter_year(date(2025, 12, 31)), 2025);
    }
}
