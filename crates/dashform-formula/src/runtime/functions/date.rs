//! Date and time functions
//!
//! Times are decimal hours rather than day fractions, so TIMEVALUE and TIME
//! results feed HOUR directly.

use crate::error::FormulaResult;
use crate::format::parse_date;
use crate::runtime::evaluator::{map_values, EvaluationContext, ScriptValue};
use chrono::{Datelike, Timelike};
use lazy_regex::regex_find;

/// Whole-number argument; `Some(0)` for blanks, `None` when unparsable
fn whole_number(v: &ScriptValue) -> Option<i64> {
    match v {
        ScriptValue::Null => Some(0),
        ScriptValue::String(s) if s.trim().is_empty() => Some(0),
        ScriptValue::String(s) => s.trim().parse::<i64>().ok(),
        v => v.as_number().filter(|n| n.is_finite()).map(|n| n.trunc() as i64),
    }
}

/// TIME(a, b, [c])
///
/// Argument roles follow the dashboards' formulas rather than Excel's: the
/// result is `c + a / 60 + b / 3600` decimal hours. Any unparsable argument
/// makes the result 0.
pub fn fn_time(args: &[ScriptValue], _ctx: &EvaluationContext) -> FormulaResult<ScriptValue> {
    let arg = |i: usize| args.get(i).map_or(Some(0), whole_number);
    let result = match (arg(0), arg(1), arg(2)) {
        (Some(minutes), Some(seconds), Some(hours)) => {
            hours as f64 + minutes as f64 / 60.0 + seconds as f64 / 3600.0
        }
        _ => 0.0,
    };
    Ok(ScriptValue::Number(result))
}

/// `HH:MM[:SS]` as (hour, minute, second)
fn parse_clock(text: &str) -> Option<(i64, i64, i64)> {
    let mut parts = text.trim().split(':');
    let hour = parts.next()?.trim().parse().ok()?;
    let minute = parts.next()?.trim().parse().ok()?;
    let second = match parts.next() {
        Some(s) => s.trim().parse().ok()?,
        None => 0,
    };
    Some((hour, minute, second))
}

fn hour_of(v: &ScriptValue) -> ScriptValue {
    let hour = match v {
        ScriptValue::Number(n) if n.is_finite() => n.trunc(),
        v => {
            let text = v.as_string();
            if let Some(datetime) = parse_date(&text) {
                datetime.hour() as f64
            } else if let Some((hour, _, _)) = parse_clock(&text) {
                hour as f64
            } else {
                text.trim().parse::<f64>().map_or(0.0, f64::trunc)
            }
        }
    };
    ScriptValue::Number(hour)
}

/// HOUR(value): hour of an ISO date-time, an `HH:MM[:SS]` string or a
/// decimal-hours number
pub fn fn_hour(args: &[ScriptValue], _ctx: &EvaluationContext) -> FormulaResult<ScriptValue> {
    Ok(map_values(&args[0], &hour_of))
}

/// TIMEVALUE(text): `HH:MM[:SS]` as decimal hours, 0 otherwise
pub fn fn_timevalue(args: &[ScriptValue], _ctx: &EvaluationContext) -> FormulaResult<ScriptValue> {
    Ok(map_values(&args[0], &|v| {
        let hours = parse_clock(&v.as_string()).map_or(0.0, |(h, m, s)| {
            h as f64 + m as f64 / 60.0 + s as f64 / 3600.0
        });
        ScriptValue::Number(hours)
    }))
}

fn year_of(v: &ScriptValue) -> ScriptValue {
    let text = v.as_string();
    let year = match parse_date(&text) {
        Some(date) => date.year() as f64,
        // Fall back to any 4-digit year in the text
        None => regex_find!(r"\b(?:19|20)\d{2}\b", &text)
            .and_then(|y| y.parse().ok())
            .unwrap_or(0.0),
    };
    ScriptValue::Number(year)
}

/// YEAR(date); broadcasts over a column
pub fn fn_year(args: &[ScriptValue], _ctx: &EvaluationContext) -> FormulaResult<ScriptValue> {
    Ok(map_values(&args[0], &year_of))
}

/// MONTH(date), 1-12, or 0 when the value is not a date; broadcasts over a column
pub fn fn_month(args: &[ScriptValue], _ctx: &EvaluationContext) -> FormulaResult<ScriptValue> {
    Ok(map_values(&args[0], &|v| {
        let month = parse_date(&v.as_string()).map_or(0, |date| date.month());
        ScriptValue::Number(month as f64)
    }))
}

/// TODAY() as `YYYY-MM-DD`
pub fn fn_today(_args: &[ScriptValue], ctx: &EvaluationContext) -> FormulaResult<ScriptValue> {
    Ok(ScriptValue::String(ctx.today.format("%Y-%m-%d").to_string()))
}
