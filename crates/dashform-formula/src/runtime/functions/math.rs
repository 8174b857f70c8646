//! Math functions

use super::int_arg;
use crate::error::FormulaResult;
use crate::runtime::evaluator::{map_values, EvaluationContext, ScriptValue};

/// ROUND(number, [digits]); halves round away from zero
pub fn fn_round(args: &[ScriptValue], _ctx: &EvaluationContext) -> FormulaResult<ScriptValue> {
    let digits = int_arg(args, 1, 0).clamp(-15, 15) as i32;
    let factor = 10f64.powi(digits.abs());
    Ok(map_values(&args[0], &|v| {
        let n = v.to_number();
        let rounded = if digits >= 0 {
            (n * factor).round() / factor
        } else {
            (n / factor).round() * factor
        };
        ScriptValue::Number(rounded)
    }))
}

/// ABS(number)
pub fn fn_abs(args: &[ScriptValue], _ctx: &EvaluationContext) -> FormulaResult<ScriptValue> {
    Ok(map_values(&args[0], &|v| ScriptValue::Number(v.to_number().abs())))
}

/// INT(number): rounds down; 0 for non-numbers
pub fn fn_floor(args: &[ScriptValue], _ctx: &EvaluationContext) -> FormulaResult<ScriptValue> {
    Ok(map_values(&args[0], &|v| {
        let n = v.to_number();
        ScriptValue::Number(if n.is_nan() { 0.0 } else { n.floor() })
    }))
}

/// int(number): truncates toward zero
pub fn fn_trunc(args: &[ScriptValue], _ctx: &EvaluationContext) -> FormulaResult<ScriptValue> {
    Ok(map_values(&args[0], &|v| ScriptValue::Number(v.to_number().trunc())))
}

/// CHOOSE(index, value1, [value2], ...): 1-based; null when out of range
pub fn fn_choose(args: &[ScriptValue], _ctx: &EvaluationContext) -> FormulaResult<ScriptValue> {
    let index = int_arg(args, 0, 0);
    let choice = usize::try_from(index)
        .ok()
        .filter(|i| *i >= 1)
        .and_then(|i| args.get(i))
        .cloned()
        .unwrap_or_default();
    Ok(choice)
}

#[cfg(test)]
mod tests {
    use crate::runtime::{evaluate_script, EvaluationContext, ScriptValue};
    use pretty_assertions::assert_eq;

    fn eval(script: &str) -> ScriptValue {
        evaluate_script(script, &EvaluationContext::simple()).unwrap()
    }

    #[test]
    fn test_round() {
        assert_eq!(eval("ROUND(2.5)"), ScriptValue::Number(3.0));
        assert_eq!(eval("Math.round(-2.5)"), ScriptValue::Number(-3.0));
        assert_eq!(eval("ROUND(3.14159, 2)"), ScriptValue::Number(3.14));
        assert_eq!(eval("ROUND(1234, -2)"), ScriptValue::Number(1200.0));
        assert_eq!(
            eval("Math.round([1.4, 1.6])"),
            ScriptValue::Array(vec![1.0.into(), 2.0.into()])
        );
    }

    #[test]
    fn test_abs_and_int() {
        assert_eq!(eval("ABS(-4)"), ScriptValue::Number(4.0));
        assert_eq!(eval("Math.floor(-1.5)"), ScriptValue::Number(-2.0));
        assert_eq!(eval(r#"INT("x")"#), ScriptValue::Number(0.0));
        assert_eq!(eval("int(-1.5)"), ScriptValue::Number(-1.0));
    }

    #[test]
    fn test_choose() {
        assert_eq!(eval(r#"CHOOSE(2, "a", "b", "c")"#), ScriptValue::from("b"));
        assert_eq!(eval(r#"excelChoose(4, "a", "b")"#), ScriptValue::Null);
        assert_eq!(eval(r#"excelChoose(0, "a")"#), ScriptValue::Null);
    }
}
