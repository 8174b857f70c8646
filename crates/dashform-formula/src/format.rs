//! Value formatting: the TEXT function and KPI display formatting.
//!
//! Both surfaces share the rounding and grouping helpers here so the row and
//! column backends print numbers identically. Ties round away from zero
//! (1234.5 -> "1235").

use crate::runtime::ScriptValue;
use chrono::{Datelike, NaiveDate, NaiveDateTime};
use lazy_regex::regex_is_match;

/// Date-only input formats, tried in order
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%m/%d/%Y",
    "%d/%m/%Y",
    "%Y/%m/%d",
    "%d-%m-%Y",
    "%Y.%m.%d",
    "%m.%d.%Y",
    "%d.%m.%Y",
];

/// Date-time input formats, tried after the date-only ones
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
];

const MONTHS_SHORT: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

const MONTHS_LONG: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// Parse a date or date-time string in any of the supported formats.
///
/// ISO dates come first, then `MM/DD/YYYY` before `DD/MM/YYYY`, then the
/// slash, dash and dot variants, then date-times.
pub fn parse_date(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(text, format) {
            return date.and_hms_opt(0, 0, 0);
        }
    }

    for format in DATETIME_FORMATS {
        if let Ok(datetime) = NaiveDateTime::parse_from_str(text, format) {
            return Some(datetime);
        }
    }

    None
}

/// Round half away from zero to `decimals` places
pub fn round_to(n: f64, decimals: usize) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (n * factor).round() / factor
}

/// Fixed-point rendering with `decimals` places
pub fn fixed(n: f64, decimals: usize) -> String {
    format!("{:.*}", decimals, round_to(n, decimals))
}

/// Fixed-point rendering with thousands separators
pub fn grouped(n: f64, decimals: usize) -> String {
    let text = fixed(n, decimals);
    let (sign, digits) = match text.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", text.as_str()),
    };
    let (int_part, frac_part) = match digits.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (digits, None),
    };

    let mut out = String::with_capacity(text.len() + int_part.len() / 3);
    out.push_str(sign);
    for (i, c) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    if let Some(frac) = frac_part {
        out.push('.');
        out.push_str(frac);
    }
    out
}

fn format_date(date: &NaiveDateTime, code: &str) -> Option<String> {
    let month = date.month0() as usize;
    Some(match code {
        "mmm yyyy" | "mmm-yyyy" => format!("{} {}", MONTHS_SHORT[month], date.year()),
        "mmmm yyyy" | "mmmm-yyyy" => format!("{} {}", MONTHS_LONG[month], date.year()),
        "mm/yyyy" | "mm-yyyy" => format!("{:02}/{}", date.month(), date.year()),
        "yyyy-mm" | "yyyy/mm" => format!("{}-{:02}", date.year(), date.month()),
        "yyyy-mm-dd" => format!("{}-{:02}-{:02}", date.year(), date.month(), date.day()),
        "mm/dd/yyyy" => format!("{:02}/{:02}/{}", date.month(), date.day(), date.year()),
        "dd/mm/yyyy" => format!("{:02}/{:02}/{}", date.day(), date.month(), date.year()),
        "mmm" | "mon" => MONTHS_SHORT[month].to_string(),
        "mmmm" | "month" => MONTHS_LONG[month].to_string(),
        "yyyy" | "year" => date.year().to_string(),
        "mm" | "month_num" => format!("{:02}", date.month()),
        "dd" | "day" => format!("{:02}", date.day()),
        _ => return None,
    })
}

fn format_number_code(n: f64, code: &str) -> Option<String> {
    Some(match code {
        "0" | "#" => fixed(n, 0),
        "0.0" | "#.#" => fixed(n, 1),
        "0.00" | "#.##" => fixed(n, 2),
        "0%" | "#%" => format!("{}%", fixed(n * 100.0, 0)),
        "0.0%" | "#.#%" => format!("{}%", fixed(n * 100.0, 1)),
        "0.00%" | "#.##%" => format!("{}%", fixed(n * 100.0, 2)),
        "$0" | "$#" => format!("${}", fixed(n, 0)),
        "$0.00" | "$#.##" => format!("${}", fixed(n, 2)),
        _ if regex_is_match!(r"^[#0,]+$", code) => grouped(n, 0),
        _ if regex_is_match!(r"^[#0,]+\.[#0]+$", code) => {
            let decimals = code.split_once('.').map_or(0, |(_, d)| d.len());
            grouped(n, decimals)
        }
        _ => return None,
    })
}

/// The spreadsheet TEXT function.
///
/// The value is tried as a date first, then as a number; an unknown format
/// code or a value that is neither returns the value's own text.
///
/// ```rust
/// use dashform_formula::{excel_text, ScriptValue};
///
/// assert_eq!(excel_text(&ScriptValue::from("2024-03-15"), "mmm yyyy"), "Mar 2024");
/// assert_eq!(excel_text(&ScriptValue::from("1234.5"), "0.00"), "1234.50");
/// ```
pub fn excel_text(value: &ScriptValue, format_code: &str) -> String {
    let text = value.as_string();
    let text = text.trim();
    let code = format_code.trim().trim_matches('"').to_lowercase();

    if let Some(date) = parse_date(text) {
        if let Some(formatted) = format_date(&date, &code) {
            return formatted;
        }
    }

    if let Some(n) = value.as_number().filter(|n| !n.is_nan()) {
        if let Some(formatted) = format_number_code(n, &code) {
            return formatted;
        }
    }

    text.to_string()
}

/// Format a KPI value for display.
///
/// | type | output for 1234.5 |
/// |---|---|
/// | `number` | `1,235` |
/// | `currency`, `currency:usd` | `$1,235` |
/// | `percentage` | `1234.5%` (already scaled) |
/// | `decimal` | `1234.5` |
///
/// Missing or NaN values render as `--`; other types fall back to the plain
/// text of the value.
pub fn format_kpi(value: &ScriptValue, format_type: &str) -> String {
    if value.is_null_like() {
        return "--".to_string();
    }

    let number = match value {
        ScriptValue::Number(n) => Some(*n),
        ScriptValue::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    let Some(n) = number else {
        return value.as_string();
    };

    match format_type.trim().to_lowercase().as_str() {
        "number" => grouped(n, 0),
        "currency" | "currency:usd" => {
            if n < 0.0 && round_to(n, 0) != 0.0 {
                format!("-${}", grouped(-n, 0))
            } else {
                format!("${}", grouped(n.abs(), 0))
            }
        }
        "percentage" => format!("{}%", fixed(n, 1)),
        "decimal" => fixed(n, 1),
        _ => value.as_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;
    use pretty_assertions::assert_eq;

    fn text(value: &str, code: &str) -> String {
        excel_text(&ScriptValue::from(value), code)
    }

    #[test]
    fn test_parse_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 15)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        for input in [
            "2024-03-15",
            "03/15/2024",
            "15/03/2024",
            "2024/03/15",
            "15-03-2024",
            "2024.03.15",
            "03.15.2024",
            "15.03.2024",
        ] {
            assert_eq!(parse_date(input), Some(expected), "{}", input);
        }
        assert_eq!(parse_date("2024-03-15 14:30:00").map(|d| d.hour()), Some(14));
        assert_eq!(parse_date("not a date"), None);
    }

    #[test]
    fn test_month_day_order() {
        // MM/DD is tried before DD/MM
        let date = parse_date("03/04/2024").unwrap();
        assert_eq!((date.month(), date.day()), (3, 4));
    }

    #[test]
    fn test_text_date_codes() {
        assert_eq!(text("2024-03-15", "mmm yyyy"), "Mar 2024");
        assert_eq!(text("2024-03-15", "MMM-YYYY"), "Mar 2024");
        assert_eq!(text("2024-03-15", "mmmm yyyy"), "March 2024");
        assert_eq!(text("2024-03-15", "mm/yyyy"), "03/2024");
        assert_eq!(text("2024-03-15", "mm-yyyy"), "03/2024");
        assert_eq!(text("2024-03-15", "yyyy-mm"), "2024-03");
        assert_eq!(text("2024-03-15", "yyyy/mm"), "2024-03");
        assert_eq!(text("2024-03-15", "yyyy-mm-dd"), "2024-03-15");
        assert_eq!(text("2024-03-15", "mm/dd/yyyy"), "03/15/2024");
        assert_eq!(text("2024-03-15", "dd/mm/yyyy"), "15/03/2024");
        assert_eq!(text("2024-03-15", "mmm"), "Mar");
        assert_eq!(text("2024-03-15", "mon"), "Mar");
        assert_eq!(text("2024-03-15", "mmmm"), "March");
        assert_eq!(text("2024-03-15", "month"), "March");
        assert_eq!(text("2024-03-15", "yyyy"), "2024");
        assert_eq!(text("2024-03-15", "year"), "2024");
        assert_eq!(text("2024-03-15", "mm"), "03");
        assert_eq!(text("2024-03-15", "month_num"), "03");
        assert_eq!(text("2024-03-15", "dd"), "15");
        assert_eq!(text("2024-03-15", "day"), "15");
    }

    #[test]
    fn test_text_number_codes() {
        assert_eq!(text("1234.5", "0"), "1235");
        assert_eq!(text("1234.5", "#"), "1235");
        assert_eq!(text("1234.5", "0.0"), "1234.5");
        assert_eq!(text("1234.5", "0.00"), "1234.50");
        assert_eq!(text("0.5", "0%"), "50%");
        assert_eq!(text("0.5", "0.0%"), "50.0%");
        assert_eq!(text("0.5", "0.00%"), "50.00%");
        assert_eq!(text("1234.5", "$0"), "$1235");
        assert_eq!(text("1234.5", "$0.00"), "$1234.50");
        assert_eq!(text("1234.5", "#,##0"), "1,235");
        assert_eq!(text("1234.5", "#,##0.00"), "1,234.50");
        assert_eq!(
            excel_text(&ScriptValue::Number(1234.5), "\"0.00\""),
            "1234.50"
        );
    }

    #[test]
    fn test_text_fallback() {
        assert_eq!(text("not-a-date-or-number", "yyyy"), "not-a-date-or-number");
        assert_eq!(text("1234.5", "unknown"), "1234.5");
        assert_eq!(text("2024-03-15", "0.00"), "2024-03-15");
    }

    #[test]
    fn test_grouped() {
        assert_eq!(grouped(1234567.891, 2), "1,234,567.89");
        assert_eq!(grouped(-1234.5, 0), "-1,235");
        assert_eq!(grouped(999.0, 0), "999");
        assert_eq!(grouped(0.0, 0), "0");
    }

    #[test]
    fn test_format_kpi() {
        let v = ScriptValue::Number(1234.5);
        assert_eq!(format_kpi(&v, "number"), "1,235");
        assert_eq!(format_kpi(&v, "currency"), "$1,235");
        assert_eq!(format_kpi(&v, "currency:usd"), "$1,235");
        assert_eq!(format_kpi(&ScriptValue::Number(12.34), "percentage"), "12.3%");
        assert_eq!(format_kpi(&ScriptValue::Number(3.14159), "decimal"), "3.1");
        assert_eq!(format_kpi(&v, "other"), "1234.5");
        assert_eq!(format_kpi(&ScriptValue::Number(-50.0), "currency"), "-$50");
    }

    #[test]
    fn test_format_kpi_missing() {
        assert_eq!(format_kpi(&ScriptValue::Null, "number"), "--");
        assert_eq!(format_kpi(&ScriptValue::Number(f64::NAN), "currency"), "--");
        assert_eq!(format_kpi(&ScriptValue::from("east"), "number"), "east");
    }
}
