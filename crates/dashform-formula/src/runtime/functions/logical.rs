//! Logical functions

use crate::error::FormulaResult;
use crate::runtime::evaluator::{select, EvaluationContext, ScriptValue};

/// IF(condition, value_if_true, [value_if_false])
///
/// A column of conditions selects per row.
pub fn fn_if(args: &[ScriptValue], _ctx: &EvaluationContext) -> FormulaResult<ScriptValue> {
    let then = args.get(1).cloned().unwrap_or_default();
    let otherwise = args.get(2).cloned().unwrap_or(ScriptValue::Boolean(false));

    Ok(match &args[0] {
        ScriptValue::Array(flags) => select(flags, &then, &otherwise),
        condition if condition.is_truthy() => then,
        _ => otherwise,
    })
}

/// AND(logical1, ...): every value, arrays included element-wise, is truthy
pub fn fn_and(args: &[ScriptValue], _ctx: &EvaluationContext) -> FormulaResult<ScriptValue> {
    let result = args
        .iter()
        .flat_map(ScriptValue::items)
        .all(ScriptValue::is_truthy);
    Ok(ScriptValue::Boolean(result))
}

/// OR(logical1, ...): any value, arrays included element-wise, is truthy
pub fn fn_or(args: &[ScriptValue], _ctx: &EvaluationContext) -> FormulaResult<ScriptValue> {
    let result = args
        .iter()
        .flat_map(ScriptValue::items)
        .any(ScriptValue::is_truthy);
    Ok(ScriptValue::Boolean(result))
}
