use chrono::NaiveDate;

use crate::sheet::Cell;

/// Text date formats tried in order: ISO first, then day-first (the common
/// bank-statement convention), then month-first and long-month forms.
const TEXT_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%d-%b-%Y",
    "%d-%B-%Y",
    "%d/%m/%Y",
    "%d-%m-%Y",
    "%d.%m.%Y",
    "%m/%d/%Y",
    "%m-%d-%Y",
    "%Y/%m/%d",
    "%d %b %Y",
    "%b %d, %Y",
];

const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

/// Lenient amount parsing: strip thousands separators, currency symbols and
/// spaces, then parse. Anything non-numeric (including empty) is 0 — a row
/// with an unusable amount is a classification concern, not a parse error.
pub fn parse_amount(raw: &str) -> f64 {
    let cleaned: String = raw.replace([',', '$', ' '], "");
    cleaned.trim().parse().unwrap_or(0.0)
}

/// Convert a spreadsheet date serial to a calendar date. Serials count days
/// from 1899-12-30 (the convention that absorbs Excel's 1900 leap-year bug).
pub fn serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !(1.0..100_000.0).contains(&serial) {
        return None;
    }
    let base = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    base.checked_add_signed(chrono::Duration::days(serial.floor() as i64))
}

/// Permissive text date parsing: a numeric string is treated as a date
/// serial, otherwise the format list is tried in order. Returns None rather
/// than failing — the caller decides whether a missing date drops the row,
/// flags it, or neither.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(serial) = s.parse::<f64>() {
        return serial_to_date(serial);
    }

    for fmt in TEXT_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return Some(date);
        }
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = chrono::NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.date());
        }
    }

    None
}

pub fn cell_date(cell: &Cell) -> Option<NaiveDate> {
    match cell {
        Cell::Number(n) => serial_to_date(*n),
        Cell::Text(s) => parse_date(s),
        Cell::Empty => None,
    }
}

pub fn cell_amount(cell: &Cell) -> f64 {
    match cell {
        Cell::Number(n) => *n,
        Cell::Text(s) => parse_amount(s),
        Cell::Empty => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    // ── parse_amount ──────────────────────────────────────────────────────────

    #[test]
    fn amount_with_thousands_separator() {
        assert_eq!(parse_amount("1,234.50"), 1234.50);
    }

    #[test]
    fn amount_with_currency_symbol() {
        assert_eq!(parse_amount("$1,200"), 1200.0);
    }

    #[test]
    fn amount_with_spaces() {
        assert_eq!(parse_amount(" 1 200.75 "), 1200.75);
    }

    #[test]
    fn amount_empty_is_zero() {
        assert_eq!(parse_amount(""), 0.0);
    }

    #[test]
    fn amount_non_numeric_is_zero() {
        assert_eq!(parse_amount("abc"), 0.0);
        assert_eq!(parse_amount("--"), 0.0);
    }

    #[test]
    fn amount_negative_preserved() {
        assert_eq!(parse_amount("-42.50"), -42.5);
    }

    // ── dates ─────────────────────────────────────────────────────────────────

    #[test]
    fn serial_for_known_date() {
        // 45306 is the Excel serial for 2024-01-15
        assert_eq!(serial_to_date(45306.0), Some(date(2024, 1, 15)));
    }

    #[test]
    fn serial_fractional_part_ignored() {
        assert_eq!(serial_to_date(45306.73), Some(date(2024, 1, 15)));
    }

    #[test]
    fn serial_out_of_range_rejected() {
        assert_eq!(serial_to_date(0.0), None);
        assert_eq!(serial_to_date(2_000_000.0), None);
    }

    #[test]
    fn numeric_string_treated_as_serial() {
        assert_eq!(parse_date("45306"), Some(date(2024, 1, 15)));
    }

    #[test]
    fn iso_date() {
        assert_eq!(parse_date("2024-01-15"), Some(date(2024, 1, 15)));
    }

    #[test]
    fn day_month_abbrev_year() {
        assert_eq!(parse_date("15-Jan-2024"), Some(date(2024, 1, 15)));
    }

    #[test]
    fn day_first_slash() {
        assert_eq!(parse_date("15/01/2024"), Some(date(2024, 1, 15)));
    }

    #[test]
    fn month_first_fallback() {
        // Day 25 cannot be a month, so only the month-first format accepts it
        assert_eq!(parse_date("01/25/2024"), Some(date(2024, 1, 25)));
    }

    #[test]
    fn datetime_string_truncated_to_date() {
        assert_eq!(parse_date("2024-01-15 10:30:00"), Some(date(2024, 1, 15)));
    }

    #[test]
    fn unparsable_date_is_none() {
        assert_eq!(parse_date("not a date"), None);
        assert_eq!(parse_date(""), None);
    }

    #[test]
    fn cell_date_from_number_and_text() {
        assert_eq!(cell_date(&Cell::Number(45306.0)), Some(date(2024, 1, 15)));
        assert_eq!(cell_date(&Cell::Text("15-Jan-2024".into())), Some(date(2024, 1, 15)));
        assert_eq!(cell_date(&Cell::Empty), None);
    }

    #[test]
    fn cell_amount_from_number_and_text() {
        assert_eq!(cell_amount(&Cell::Number(500.0)), 500.0);
        assert_eq!(cell_amount(&Cell::Text("$1,200".into())), 1200.0);
        assert_eq!(cell_amount(&Cell::Empty), 0.0);
    }
}
