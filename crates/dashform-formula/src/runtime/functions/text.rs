//! Text functions
//!
//! Functions taking a text first argument broadcast over arrays, so a
//! whole column can be sliced or parsed in one call.

use super::int_arg;
use crate::error::FormulaResult;
use crate::format::excel_text;
use crate::runtime::evaluator::{map_values, EvaluationContext, ScriptValue};

fn take_left(s: &str, n: usize) -> String {
    s.chars().take(n).collect()
}

fn take_right(s: &str, n: usize) -> String {
    let len = s.chars().count();
    if n >= len {
        return s.to_string();
    }
    s.chars().skip(len - n).collect()
}

fn take_mid(s: &str, start_1based: usize, n: usize) -> String {
    if start_1based == 0 {
        return String::new();
    }
    let start0 = start_1based - 1;
    s.chars().skip(start0).take(n).collect()
}

fn first(args: &[ScriptValue]) -> &ScriptValue {
    args.first().unwrap_or(&ScriptValue::Null)
}

/// LEFT(text, [num_chars])
pub fn fn_left(args: &[ScriptValue], _ctx: &EvaluationContext) -> FormulaResult<ScriptValue> {
    let n = int_arg(args, 1, 1).max(0) as usize;
    Ok(map_values(first(args), &|v| {
        ScriptValue::String(take_left(&v.as_string(), n))
    }))
}

/// RIGHT(text, [num_chars])
pub fn fn_right(args: &[ScriptValue], _ctx: &EvaluationContext) -> FormulaResult<ScriptValue> {
    let n = int_arg(args, 1, 1).max(0) as usize;
    Ok(map_values(first(args), &|v| {
        ScriptValue::String(take_right(&v.as_string(), n))
    }))
}

/// MID(text, start_num, num_chars)
pub fn fn_mid(args: &[ScriptValue], _ctx: &EvaluationContext) -> FormulaResult<ScriptValue> {
    let start = int_arg(args, 1, 1).max(0) as usize;
    let n = int_arg(args, 2, 0).max(0) as usize;
    Ok(map_values(first(args), &|v| {
        ScriptValue::String(take_mid(&v.as_string(), start, n))
    }))
}

fn parse_value(v: &ScriptValue) -> ScriptValue {
    match v.as_number() {
        Some(n) if !n.is_nan() => ScriptValue::Number(n),
        _ => ScriptValue::Number(0.0),
    }
}

/// VALUE(text): the number the text spells, 0 when it spells none
pub fn fn_value(args: &[ScriptValue], _ctx: &EvaluationContext) -> FormulaResult<ScriptValue> {
    Ok(map_values(first(args), &parse_value))
}

/// ISNUMBER(value): true when the value converts to a number other than NaN
pub fn fn_isnumber(args: &[ScriptValue], _ctx: &EvaluationContext) -> FormulaResult<ScriptValue> {
    Ok(map_values(first(args), &|v| {
        ScriptValue::Boolean(v.as_number().map_or(false, |n| !n.is_nan()))
    }))
}

/// 1-based case-insensitive position of `find` in `within` at or after `start`
fn search_position(find: &ScriptValue, within: &ScriptValue, start: i64) -> Option<usize> {
    let within = within.as_string().to_lowercase();
    let find = find.as_string().to_lowercase();
    let skip = usize::try_from(start.checked_sub(1)?).ok()?;

    let offset = within.char_indices().nth(skip).map(|(i, _)| i).or_else(|| {
        // Searching from just past the end still finds the empty string
        (skip == within.chars().count()).then_some(within.len())
    })?;

    within[offset..]
        .find(&find)
        .map(|byte| within[..offset + byte].chars().count() + 1)
}

fn search(args: &[ScriptValue], missing: f64) -> ScriptValue {
    let find = first(args).clone();
    let start = int_arg(args, 2, 1);
    map_values(args.get(1).unwrap_or(&ScriptValue::Null), &|within| {
        match search_position(&find, within, start) {
            Some(pos) => ScriptValue::Number(pos as f64),
            None => ScriptValue::Number(missing),
        }
    })
}

/// SEARCH(find_text, within_text, [start_num]): NaN when not found, so
/// ISNUMBER(SEARCH(..)) tests for containment
pub fn fn_search(args: &[ScriptValue], _ctx: &EvaluationContext) -> FormulaResult<ScriptValue> {
    Ok(search(args, f64::NAN))
}

/// Column-mode SEARCH: -1 when not found.
///
/// -1 is a number, so ISNUMBER(SEARCH(..)) is always true in column mode.
/// Test containment with `SEARCH(..) > 0` instead.
pub fn fn_search_index(args: &[ScriptValue], _ctx: &EvaluationContext) -> FormulaResult<ScriptValue> {
    Ok(search(args, -1.0))
}

/// TEXT(value, format_text)
pub fn fn_text(args: &[ScriptValue], _ctx: &EvaluationContext) -> FormulaResult<ScriptValue> {
    let code = args.get(1).map(ScriptValue::as_string).unwrap_or_default();
    Ok(map_values(first(args), &|v| {
        ScriptValue::String(excel_text(v, &code))
    }))
}

/// LEN(text); for an array, its length
pub fn fn_len(args: &[ScriptValue], _ctx: &EvaluationContext) -> FormulaResult<ScriptValue> {
    let len = match first(args) {
        ScriptValue::Array(items) => items.len(),
        v => v.as_string().chars().count(),
    };
    Ok(ScriptValue::Number(len as f64))
}

/// str(value)
pub fn fn_str(args: &[ScriptValue], _ctx: &EvaluationContext) -> FormulaResult<ScriptValue> {
    Ok(ScriptValue::String(first(args).as_string()))
}
