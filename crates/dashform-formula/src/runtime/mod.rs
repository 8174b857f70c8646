//! Expression runtime for translated formulas.
//!
//! Parses and evaluates the script dialect the translator emits, so derived
//! columns, KPI values and filter value lists can be computed in-process.

pub mod ast;
pub mod evaluator;
pub mod functions;
pub mod parser;

pub use ast::{BinaryOperator, ScriptExpr, UnaryOperator};
pub use evaluator::{evaluate, EvaluationContext, ScriptValue};
pub use parser::parse_script;

use crate::error::FormulaResult;

/// Parse and evaluate a script expression
///
/// # Example
/// ```rust
/// use dashform_formula::runtime::{evaluate_script, EvaluationContext, ScriptValue};
///
/// let ctx = EvaluationContext::simple();
/// assert_eq!(
///     evaluate_script(r#"("adult" if 42 > 18 else "minor")"#, &ctx).unwrap(),
///     ScriptValue::from("adult")
/// );
/// ```
pub fn evaluate_script(script: &str, ctx: &EvaluationContext) -> FormulaResult<ScriptValue> {
    let expr = parse_script(script)?;
    evaluate(&expr, ctx)
}
