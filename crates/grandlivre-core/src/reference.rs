//! # Reference Numbers
//!
//! Human-readable references for journal entries and expenses.
//!
//! ## Formats
//! ```text
//! Journal entry:  {PREFIX}-{YYYYMMDD}-{NNNN}    JE-VTE-20261018-0001
//! Auto expense:   DEP-AUTO-{YYYYMMDD}-{NNNN}    DEP-AUTO-20261018-0003
//! Manual expense: DEP-{YYYYMMDD}-{NNNN}         DEP-20261018-0012
//! ```
//!
//! The sequence is per tenant, per prefix, per day. Allocation is the
//! database layer's job; this module only renders and parses.

use chrono::NaiveDate;

pub const AUTO_EXPENSE_PREFIX: &str = "DEP-AUTO";
pub const MANUAL_EXPENSE_PREFIX: &str = "DEP";

/// Day component of a reference (`YYYYMMDD`).
pub fn day_stamp(date: NaiveDate) -> String {
    date.format("%Y%m%d").to_string()
}

/// Renders `{prefix}-{YYYYMMDD}-{seq:04}`.
///
/// ## Example
/// ```rust
/// use chrono::NaiveDate;
/// use grandlivre_core::reference::format_reference;
///
/// let date = NaiveDate::from_ymd_opt(2026, 10, 18).unwrap();
/// assert_eq!(format_reference("JE-VTE", date, 7), "JE-VTE-20261018-0007");
/// ```
pub fn format_reference(prefix: &str, date: NaiveDate, sequence: i64) -> String {
    format!("{}-{}-{:04}", prefix, day_stamp(date), sequence)
}

/// `LIKE` pattern matching every reference of a prefix and day.
pub fn day_pattern(prefix: &str, date: NaiveDate) -> String {
    format!("{}-{}-%", prefix, day_stamp(date))
}

/// Splits a reference into prefix, day stamp and sequence.
///
/// Returns `None` when the trailing parts are not a date and a number.
pub fn parse_reference(reference: &str) -> Option<(&str, &str, i64)> {
    let (rest, sequence) = reference.rsplit_once('-')?;
    let (prefix, day) = rest.rsplit_once('-')?;

    if day.len() != 8 || !day.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    if prefix.is_empty() {
        return None;
    }

    Some((prefix, day, sequence.parse().ok()?))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 18).unwrap()
    }

    #[test]
    fn test_format_pads_to_four_digits() {
        assert_eq!(format_reference("JE-STK", day(), 1), "JE-STK-20261018-0001");
        assert_eq!(format_reference("JE-STK", day(), 42), "JE-STK-20261018-0042");
        assert_eq!(format_reference("JE-STK", day(), 12345), "JE-STK-20261018-12345");
    }

    #[test]
    fn test_expense_formats() {
        assert_eq!(
            format_reference(AUTO_EXPENSE_PREFIX, day(), 3),
            "DEP-AUTO-20261018-0003"
        );
        assert_eq!(
            format_reference(MANUAL_EXPENSE_PREFIX, day(), 12),
            "DEP-20261018-0012"
        );
    }

    #[test]
    fn test_manual_pattern_excludes_auto_references() {
        assert_eq!(day_pattern(MANUAL_EXPENSE_PREFIX, day()), "DEP-20261018-%");
        assert!(!"DEP-AUTO-20261018-0001".starts_with("DEP-20261018-"));
    }

    #[test]
    fn test_parse_reference() {
        assert_eq!(
            parse_reference("DEP-AUTO-20261018-0003"),
            Some(("DEP-AUTO", "20261018", 3))
        );
        assert_eq!(
            parse_reference("JE-VTE-20261018-0010"),
            Some(("JE-VTE", "20261018", 10))
        );
        assert_eq!(parse_reference("JE-VTE-2026-0010"), None);
        assert_eq!(parse_reference("garbage"), None);
    }
}
