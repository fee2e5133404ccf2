//! Normalized cell values.
//!
//! Source extracts disagree on layout and typing: dates arrive in four
//! different layouts, amounts carry thousands separators, and empty cells
//! show up as "", "nan" or "None" depending on the exporting system. Every
//! cell is coerced into a [`FieldValue`] before anything downstream looks
//! at it.

use chrono::NaiveDate;
use serde::{Serialize, Serializer};

/// Date layouts accepted from source extracts, tried in order.
const DATE_FORMATS: &[&str] = &["%d.%m.%Y", "%Y-%m-%d", "%d/%m/%Y", "%m/%d/%Y"];

/// A single normalized cell value.
///
/// `Absent` covers both a column the source never had and a cell holding
/// only a null marker. A present-but-empty text cell stays `Text("")` so
/// the two cases remain distinguishable.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Number(f64),
    Date(NaiveDate),
    Absent,
}

impl Default for FieldValue {
    fn default() -> Self {
        FieldValue::Absent
    }
}

impl FieldValue {
    pub fn is_absent(&self) -> bool {
        matches!(self, FieldValue::Absent)
    }

    /// Canonical string form used when comparing fields, `None` when absent.
    ///
    /// Numbers print in shortest form, so "1.5000" and "1.5" coerce to the
    /// same f64 and compare equal while 1.5 and 1.50001 stay distinct.
    /// Dates print as ISO-8601.
    pub fn comparable_form(&self) -> Option<String> {
        match self {
            FieldValue::Text(text) => Some(text.trim().to_string()),
            FieldValue::Number(number) => Some(format!("{number}")),
            FieldValue::Date(date) => Some(date.to_string()),
            FieldValue::Absent => None,
        }
    }
}

impl Serialize for FieldValue {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            FieldValue::Text(text) => serializer.serialize_str(text),
            FieldValue::Number(number) => serializer.serialize_f64(*number),
            FieldValue::Date(date) => serializer.serialize_str(&date.to_string()),
            FieldValue::Absent => serializer.serialize_none(),
        }
    }
}

/// Cell markers that mean "no value" in exported CSVs.
fn is_null_marker(cell: &str) -> bool {
    matches!(cell.to_ascii_lowercase().as_str(), "nan" | "none" | "null")
}

/// Coerce a free-text cell. Null markers become `Absent`; everything else
/// is kept verbatim, including an empty string.
pub fn coerce_text(raw: &str) -> FieldValue {
    if is_null_marker(raw.trim()) {
        return FieldValue::Absent;
    }
    FieldValue::Text(raw.to_string())
}

/// Coerce a numeric cell. Spaces and commas are stripped before parsing,
/// so "12 345,67" style thousands separators survive the trip.
pub fn coerce_number(raw: &str) -> FieldValue {
    let cleaned: String = raw.chars().filter(|c| *c != ' ' && *c != ',').collect();
    if cleaned.is_empty() || is_null_marker(&cleaned) {
        return FieldValue::Absent;
    }
    match cleaned.parse::<f64>() {
        Ok(number) => FieldValue::Number(number),
        Err(_) => FieldValue::Absent,
    }
}

/// Coerce a date cell, trying each supported layout in order.
///
/// A non-empty cell in an unrecognized layout passes through as trimmed
/// text rather than being discarded, so it still shows up in comparisons
/// and in the analysis payload.
pub fn coerce_date(raw: &str) -> FieldValue {
    let trimmed = raw.trim();
    if trimmed.is_empty() || is_null_marker(trimmed) {
        return FieldValue::Absent;
    }
    for layout in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, layout) {
            return FieldValue::Date(date);
        }
    }
    FieldValue::Text(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_all_supported_date_layouts() {
        let expected = FieldValue::Date(NaiveDate::from_ymd_opt(2024, 4, 15).unwrap());
        assert_eq!(coerce_date("15.04.2024"), expected);
        assert_eq!(coerce_date("2024-04-15"), expected);
        assert_eq!(coerce_date("15/04/2024"), expected);
        assert_eq!(coerce_date("04/15/2024"), expected);
    }

    #[test]
    fn iso_date_comparable_form_is_unchanged() {
        let value = coerce_date("2024-05-01");
        assert_eq!(value.comparable_form().as_deref(), Some("2024-05-01"));
    }

    #[test]
    fn unknown_date_layout_passes_through_as_text() {
        assert_eq!(
            coerce_date(" 2024 week 19 "),
            FieldValue::Text("2024 week 19".to_string())
        );
    }

    #[test]
    fn ambiguous_day_month_prefers_day_first() {
        // 03/04 parses under both slash layouts; the day-first one wins.
        assert_eq!(
            coerce_date("03/04/2024"),
            FieldValue::Date(NaiveDate::from_ymd_opt(2024, 4, 3).unwrap())
        );
    }

    #[test]
    fn numbers_strip_spaces_and_commas() {
        assert_eq!(coerce_number("12,345.67"), FieldValue::Number(12345.67));
        assert_eq!(coerce_number("1 000 000"), FieldValue::Number(1_000_000.0));
        assert_eq!(coerce_number(" 42.5 "), FieldValue::Number(42.5));
    }

    #[test]
    fn null_markers_coerce_to_absent() {
        for marker in ["nan", "NaN", "None", "NONE", "null", ""] {
            assert!(coerce_number(marker).is_absent(), "number {marker:?}");
            assert!(coerce_date(marker).is_absent(), "date {marker:?}");
        }
        assert!(coerce_text("nan").is_absent());
        // An empty text cell is present-but-empty, not absent.
        assert_eq!(coerce_text(""), FieldValue::Text(String::new()));
    }

    #[test]
    fn unparseable_number_is_absent() {
        assert!(coerce_number("12.3.4").is_absent());
        assert!(coerce_number("ten").is_absent());
    }

    #[test]
    fn trailing_zeros_compare_equal() {
        let a = coerce_number("1.5");
        let b = coerce_number("1.5000");
        assert_eq!(a.comparable_form(), b.comparable_form());
    }

    #[test]
    fn close_but_unequal_numbers_stay_distinct() {
        let a = coerce_number("1.5");
        let b = coerce_number("1.50001");
        assert_ne!(a.comparable_form(), b.comparable_form());
    }

    #[test]
    fn text_comparable_form_trims_whitespace() {
        let value = coerce_text("  JPMORGAN CHASE  ");
        assert_eq!(value.comparable_form().as_deref(), Some("JPMORGAN CHASE"));
    }

    #[test]
    fn absent_serializes_as_null() {
        let json = serde_json::to_value(FieldValue::Absent).unwrap();
        assert!(json.is_null());
    }

    #[test]
    fn date_serializes_as_iso_string() {
        let value = coerce_date("15.04.2024");
        let json = serde_json::to_value(value).unwrap();
        assert_eq!(json, serde_json::json!("2024-04-15"));
    }

    #[test]
    fn number_serializes_as_json_number() {
        let json = serde_json::to_value(FieldValue::Number(7.5)).unwrap();
        assert_eq!(json, serde_json::json!(7.5));
    }
}
