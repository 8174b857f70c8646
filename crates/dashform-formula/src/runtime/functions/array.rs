//! Array functions: aggregates, conditional aggregates, lookups and the
//! column data accessors

use super::int_arg;
use crate::criteria::CriteriaMatcher;
use crate::error::{FormulaError, FormulaResult};
use crate::runtime::evaluator::{compare_values, EvaluationContext, ScriptValue};
use std::cmp::Ordering;

/// Every argument, arrays flattened
fn values(args: &[ScriptValue]) -> impl Iterator<Item = &ScriptValue> {
    args.iter().flat_map(ScriptValue::items).flat_map(ScriptValue::items)
}

/// Numeric values among the arguments: numbers and numeric text.
/// Booleans, blanks and other text are skipped.
fn numbers(args: &[ScriptValue]) -> impl Iterator<Item = f64> + '_ {
    values(args).filter_map(|v| match v {
        ScriptValue::Number(n) if !n.is_nan() => Some(*n),
        ScriptValue::String(s) => s.trim().parse::<f64>().ok().filter(|n| !n.is_nan()),
        _ => None,
    })
}

/// SUM(value1, ...)
pub fn fn_sum(args: &[ScriptValue], _ctx: &EvaluationContext) -> FormulaResult<ScriptValue> {
    Ok(ScriptValue::Number(numbers(args).sum()))
}

/// AVERAGE(value1, ...); 0 when there is nothing to average
pub fn fn_average(args: &[ScriptValue], _ctx: &EvaluationContext) -> FormulaResult<ScriptValue> {
    let (sum, count) = numbers(args).fold((0.0, 0usize), |(s, c), n| (s + n, c + 1));
    if count == 0 {
        Ok(ScriptValue::Number(0.0))
    } else {
        Ok(ScriptValue::Number(sum / count as f64))
    }
}

/// COUNT(value1, ...): numeric values
pub fn fn_count(args: &[ScriptValue], _ctx: &EvaluationContext) -> FormulaResult<ScriptValue> {
    Ok(ScriptValue::Number(numbers(args).count() as f64))
}

/// COUNTA(value1, ...): non-blank values
pub fn fn_counta(args: &[ScriptValue], _ctx: &EvaluationContext) -> FormulaResult<ScriptValue> {
    let count = values(args).filter(|v| !v.is_null_like()).count();
    Ok(ScriptValue::Number(count as f64))
}

/// MAX(value1, ...); 0 when there are no numbers
pub fn fn_max(args: &[ScriptValue], _ctx: &EvaluationContext) -> FormulaResult<ScriptValue> {
    let max = numbers(args).fold(None, |acc: Option<f64>, n| Some(acc.map_or(n, |m| m.max(n))));
    Ok(ScriptValue::Number(max.unwrap_or(0.0)))
}

/// MIN(value1, ...); 0 when there are no numbers
pub fn fn_min(args: &[ScriptValue], _ctx: &EvaluationContext) -> FormulaResult<ScriptValue> {
    let min = numbers(args).fold(None, |acc: Option<f64>, n| Some(acc.map_or(n, |m| m.min(n))));
    Ok(ScriptValue::Number(min.unwrap_or(0.0)))
}

/// SUMIF(range, criteria, [sum_range])
pub fn fn_sumif(args: &[ScriptValue], _ctx: &EvaluationContext) -> FormulaResult<ScriptValue> {
    let range = args[0].items();
    let matcher = CriteriaMatcher::new(&args[1]);
    let sum_range = args.get(2).map_or(range, ScriptValue::items);

    let sum = range
        .iter()
        .zip(sum_range)
        .filter(|(value, _)| matcher.matches(value))
        .filter_map(|(_, addend)| addend.as_number())
        .filter(|n| !n.is_nan())
        .sum();

    Ok(ScriptValue::Number(sum))
}

/// COUNTIF(range, criteria)
pub fn fn_countif(args: &[ScriptValue], _ctx: &EvaluationContext) -> FormulaResult<ScriptValue> {
    let matcher = CriteriaMatcher::new(&args[1]);
    let count = args[0].items().iter().filter(|v| matcher.matches(v)).count();
    Ok(ScriptValue::Number(count as f64))
}

/// COUNTIFS(range1, criteria1, [range2, criteria2], ...)
///
/// Counts positions of the first range where every pair matches; positions
/// past the end of a shorter range never match.
pub fn fn_countifs(args: &[ScriptValue], _ctx: &EvaluationContext) -> FormulaResult<ScriptValue> {
    // Must have an even number of arguments (pairs)
    if args.len() % 2 != 0 {
        return Err(FormulaError::ArgumentCount {
            function: "COUNTIFS".to_string(),
            expected: "range/criteria pairs".to_string(),
            actual: args.len(),
        });
    }

    let pairs: Vec<(&[ScriptValue], CriteriaMatcher)> = args
        .chunks(2)
        .map(|pair| (pair[0].items(), CriteriaMatcher::new(&pair[1])))
        .collect();

    let rows = pairs.first().map_or(0, |(range, _)| range.len());
    let count = (0..rows)
        .filter(|&i| {
            pairs
                .iter()
                .all(|(range, matcher)| range.get(i).map_or(false, |v| matcher.matches(v)))
        })
        .count();

    Ok(ScriptValue::Number(count as f64))
}

/// Sort order for unique values: numbers, then text, then everything else
fn sort_key_cmp(a: &ScriptValue, b: &ScriptValue) -> Ordering {
    fn rank(v: &ScriptValue) -> u8 {
        match v {
            ScriptValue::Number(_) => 0,
            ScriptValue::String(_) => 1,
            _ => 2,
        }
    }

    match (a, b) {
        (ScriptValue::Number(_), ScriptValue::Number(_))
        | (ScriptValue::String(_), ScriptValue::String(_)) => {
            compare_values(a, b).unwrap_or(Ordering::Equal)
        }
        _ => rank(a).cmp(&rank(b)),
    }
}

/// UNIQUE(array, [sorted]): distinct non-blank values in first-occurrence
/// order, sorted when the flag is truthy
pub fn fn_unique(args: &[ScriptValue], _ctx: &EvaluationContext) -> FormulaResult<ScriptValue> {
    let mut unique: Vec<ScriptValue> = Vec::new();
    for value in args[0].items() {
        if value.is_null_like() || unique.contains(value) {
            continue;
        }
        unique.push(value.clone());
    }

    if args.get(1).map_or(false, ScriptValue::is_truthy) {
        unique.sort_by(sort_key_cmp);
    }

    Ok(ScriptValue::Array(unique))
}

/// INDEX(array, row_num): 1-based; null when out of range
pub fn fn_index(args: &[ScriptValue], _ctx: &EvaluationContext) -> FormulaResult<ScriptValue> {
    let index = int_arg(args, 1, 0);
    let value = usize::try_from(index)
        .ok()
        .and_then(|i| i.checked_sub(1))
        .and_then(|i| args[0].items().get(i))
        .cloned()
        .unwrap_or_default();
    Ok(value)
}

/// MATCH(value, array, [match_type]): 1-based position of the first equal
/// element, -1 when absent. Only exact matching is supported.
pub fn fn_match(args: &[ScriptValue], _ctx: &EvaluationContext) -> FormulaResult<ScriptValue> {
    let needle = &args[0];
    let position = args[1]
        .items()
        .iter()
        .position(|v| compare_values(needle, v) == Some(Ordering::Equal))
        .map_or(-1.0, |i| (i + 1) as f64);
    Ok(ScriptValue::Number(position))
}

/// Element-wise growth `((current - previous) / previous) * 100`, over the
/// rows both arrays have; a zero or non-numeric previous value yields 0
pub fn fn_percentage_growth(
    args: &[ScriptValue],
    _ctx: &EvaluationContext,
) -> FormulaResult<ScriptValue> {
    let growth = args[0]
        .items()
        .iter()
        .zip(args[1].items())
        .map(|(current, previous)| {
            let c = current.to_number();
            let p = previous.to_number();
            if p == 0.0 || p.is_nan() || c.is_nan() {
                ScriptValue::Number(0.0)
            } else {
                ScriptValue::Number((c - p) / p * 100.0)
            }
        })
        .collect();
    Ok(ScriptValue::Array(growth))
}

/// getColumnData(name, [start_row]): a column from a spreadsheet row on
pub fn fn_column_data(args: &[ScriptValue], ctx: &EvaluationContext) -> FormulaResult<ScriptValue> {
    let start = int_arg(args, 1, 2).max(0) as usize;
    Ok(ctx.column_data(&args[0].as_string(), start))
}

/// getCellValue(name, index): a column's value at a zero-based sheet row,
/// so `B2` (index 1) is the first data row
pub fn fn_cell_value(args: &[ScriptValue], ctx: &EvaluationContext) -> FormulaResult<ScriptValue> {
    let name = args[0].as_string();
    Ok(match usize::try_from(int_arg(args, 1, -1)) {
        Ok(index) => ctx.cell_value(&name, index),
        Err(_) => ScriptValue::Null,
    })
}
