//! Script evaluator
//!
//! Evaluates translated expressions against a table. Binary operators and a
//! handful of functions broadcast element-wise when an operand is an array,
//! which is how whole-column expressions compute one value per row.

use super::ast::{BinaryOperator, ScriptExpr, UnaryOperator};
use super::functions::FunctionRegistry;
use crate::error::{FormulaError, FormulaResult};
use chrono::NaiveDate;
use dashform_core::{data_offset, format_number, CellValue, Table};
use once_cell::sync::Lazy;
use std::cmp::Ordering;
use std::fmt;

/// Global function registry (lazily initialized)
static FUNCTION_REGISTRY: Lazy<FunctionRegistry> = Lazy::new(FunctionRegistry::new);

/// Value types during script evaluation
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ScriptValue {
    #[default]
    Null,
    Boolean(bool),
    Number(f64),
    String(String),
    Array(Vec<ScriptValue>),
}

impl ScriptValue {
    /// Convert to number, if possible
    pub fn as_number(&self) -> Option<f64> {
        match self {
            ScriptValue::Number(n) => Some(*n),
            ScriptValue::Boolean(true) => Some(1.0),
            ScriptValue::Boolean(false) => Some(0.0),
            ScriptValue::String(s) => s.trim().parse().ok(),
            ScriptValue::Null | ScriptValue::Array(_) => None,
        }
    }

    /// Number for arithmetic: null is 0, anything unparsable is NaN
    pub fn to_number(&self) -> f64 {
        match self {
            ScriptValue::Null => 0.0,
            ScriptValue::String(s) if s.trim().is_empty() => 0.0,
            v => v.as_number().unwrap_or(f64::NAN),
        }
    }

    /// Convert to string
    pub fn as_string(&self) -> String {
        match self {
            ScriptValue::Null => String::new(),
            ScriptValue::Boolean(b) => b.to_string(),
            ScriptValue::Number(n) => format_number(*n),
            ScriptValue::String(s) => s.clone(),
            ScriptValue::Array(items) => items
                .iter()
                .map(ScriptValue::as_string)
                .collect::<Vec<_>>()
                .join(","),
        }
    }

    /// Truthiness used by conditionals and logical operators
    pub fn is_truthy(&self) -> bool {
        match self {
            ScriptValue::Null => false,
            ScriptValue::Boolean(b) => *b,
            ScriptValue::Number(n) => *n != 0.0 && !n.is_nan(),
            ScriptValue::String(s) => !s.is_empty(),
            ScriptValue::Array(items) => !items.is_empty(),
        }
    }

    /// Null, NaN or the empty string
    pub fn is_null_like(&self) -> bool {
        match self {
            ScriptValue::Null => true,
            ScriptValue::Number(n) => n.is_nan(),
            ScriptValue::String(s) => s.is_empty(),
            _ => false,
        }
    }

    /// Elements of an array, or the value itself as a one-element slice
    pub fn items(&self) -> &[ScriptValue] {
        match self {
            ScriptValue::Array(items) => items,
            v => std::slice::from_ref(v),
        }
    }

    /// Convert back to a table cell; arrays collapse to their text
    pub fn into_cell(self) -> CellValue {
        match self {
            ScriptValue::Null => CellValue::Empty,
            ScriptValue::Boolean(b) => CellValue::Boolean(b),
            ScriptValue::Number(n) if n.is_nan() => CellValue::Empty,
            ScriptValue::Number(n) => CellValue::Number(n),
            ScriptValue::String(s) => CellValue::String(s),
            v @ ScriptValue::Array(_) => CellValue::String(v.as_string()),
        }
    }
}

impl fmt::Display for ScriptValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_string())
    }
}

impl From<&CellValue> for ScriptValue {
    fn from(value: &CellValue) -> Self {
        match value {
            CellValue::Empty => ScriptValue::Null,
            CellValue::Boolean(b) => ScriptValue::Boolean(*b),
            CellValue::Number(n) => ScriptValue::Number(*n),
            CellValue::String(s) => ScriptValue::String(s.clone()),
        }
    }
}

impl From<CellValue> for ScriptValue {
    fn from(value: CellValue) -> Self {
        ScriptValue::from(&value)
    }
}

impl From<f64> for ScriptValue {
    fn from(n: f64) -> Self {
        ScriptValue::Number(n)
    }
}

impl From<bool> for ScriptValue {
    fn from(b: bool) -> Self {
        ScriptValue::Boolean(b)
    }
}

impl From<&str> for ScriptValue {
    fn from(s: &str) -> Self {
        ScriptValue::String(s.to_string())
    }
}

impl From<String> for ScriptValue {
    fn from(s: String) -> Self {
        ScriptValue::String(s)
    }
}

impl From<Vec<ScriptValue>> for ScriptValue {
    fn from(items: Vec<ScriptValue>) -> Self {
        ScriptValue::Array(items)
    }
}

/// Context for script evaluation
#[derive(Debug, Clone, Copy)]
pub struct EvaluationContext<'a> {
    /// Table the data accessors read from
    pub data: Option<&'a Table>,
    /// Date returned by TODAY
    pub today: NaiveDate,
}

impl<'a> EvaluationContext<'a> {
    /// Create a new evaluation context over `data`
    pub fn new(data: Option<&'a Table>) -> Self {
        Self {
            data,
            today: chrono::Local::now().date_naive(),
        }
    }

    /// Create a simple context without data (for testing)
    pub fn simple() -> Self {
        Self::new(None)
    }

    /// Pin the date TODAY returns
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = today;
        self
    }

    /// Values of a column from spreadsheet row `start_row` on.
    ///
    /// `name` is a column name, or a letter when no column carries that name.
    pub fn column_data(&self, name: &str, start_row: usize) -> ScriptValue {
        let values = self.column(name).map_or(&[][..], |(_, values)| values);
        ScriptValue::Array(
            values
                .iter()
                .skip(data_offset(start_row))
                .map(ScriptValue::from)
                .collect(),
        )
    }

    /// Value of a column at a zero-based sheet row: row 0 is the header (the
    /// column name), row 1 the first data row. Null when out of range.
    pub fn cell_value(&self, name: &str, index: usize) -> ScriptValue {
        let Some((column, values)) = self.column(name) else {
            return ScriptValue::Null;
        };
        match index.checked_sub(1) {
            None => ScriptValue::String(column.to_string()),
            Some(i) => values.get(i).map(ScriptValue::from).unwrap_or_default(),
        }
    }

    fn column(&self, name: &str) -> Option<(&'a str, &'a [CellValue])> {
        let table = self.data?;
        let schema = table.schema();
        let column = match schema.index_of(name) {
            Some(index) => schema.names().get(index).map(String::as_str),
            None => table.column_by_letter(name),
        };
        let Some(column) = column else {
            log::warn!("unknown column {:?} in data accessor", name);
            return None;
        };
        Some((column, table.column_values(column)?))
    }
}

/// Evaluate a script expression
pub fn evaluate(expr: &ScriptExpr, ctx: &EvaluationContext) -> FormulaResult<ScriptValue> {
    match expr {
        // === Literals ===
        ScriptExpr::Number(n) => Ok(ScriptValue::Number(*n)),
        ScriptExpr::String(s) => Ok(ScriptValue::String(s.clone())),
        ScriptExpr::Boolean(b) => Ok(ScriptValue::Boolean(*b)),
        ScriptExpr::Null => Ok(ScriptValue::Null),
        ScriptExpr::Array(items) => {
            let mut values = Vec::with_capacity(items.len());
            for item in items {
                values.push(evaluate(item, ctx)?);
            }
            Ok(ScriptValue::Array(values))
        }

        ScriptExpr::Identifier(name) => match name.as_str() {
            "NaN" => Ok(ScriptValue::Number(f64::NAN)),
            "Infinity" => Ok(ScriptValue::Number(f64::INFINITY)),
            _ => Err(FormulaError::UnknownName(name.clone())),
        },

        // === Operators ===
        ScriptExpr::BinaryOp { op, left, right } => evaluate_binary_op(*op, left, right, ctx),

        ScriptExpr::UnaryOp { op, operand } => {
            let value = evaluate(operand, ctx)?;
            Ok(match op {
                UnaryOperator::Negate => map_values(&value, &|v| ScriptValue::Number(-v.to_number())),
                UnaryOperator::Plus => map_values(&value, &|v| ScriptValue::Number(v.to_number())),
                UnaryOperator::Not => ScriptValue::Boolean(!value.is_truthy()),
            })
        }

        ScriptExpr::Conditional {
            condition,
            then,
            otherwise,
        } => {
            let condition = evaluate(condition, ctx)?;
            if let ScriptValue::Array(flags) = &condition {
                let then = evaluate(then, ctx)?;
                let otherwise = evaluate(otherwise, ctx)?;
                return Ok(select(flags, &then, &otherwise));
            }
            if condition.is_truthy() {
                evaluate(then, ctx)
            } else {
                evaluate(otherwise, ctx)
            }
        }

        // === Functions ===
        ScriptExpr::Call { name, args } => evaluate_function(name, args, ctx),
    }
}

/// Evaluate a binary operation
fn evaluate_binary_op(
    op: BinaryOperator,
    left: &ScriptExpr,
    right: &ScriptExpr,
    ctx: &EvaluationContext,
) -> FormulaResult<ScriptValue> {
    let left_val = evaluate(left, ctx)?;

    // Logical operators short-circuit and yield an operand
    match op {
        BinaryOperator::And if !left_val.is_truthy() => return Ok(left_val),
        BinaryOperator::Or if left_val.is_truthy() => return Ok(left_val),
        BinaryOperator::And | BinaryOperator::Or => return evaluate(right, ctx),
        _ => {}
    }

    let right_val = evaluate(right, ctx)?;
    Ok(broadcast(&left_val, &right_val, &|l, r| scalar_binary_op(op, l, r)))
}

fn scalar_binary_op(op: BinaryOperator, left: &ScriptValue, right: &ScriptValue) -> ScriptValue {
    match op {
        // Arithmetic operators; `+` concatenates when either side is text
        BinaryOperator::Add => match (left, right) {
            (ScriptValue::String(l), r) => ScriptValue::String(format!("{}{}", l, r.as_string())),
            (l, ScriptValue::String(r)) => ScriptValue::String(format!("{}{}", l.as_string(), r)),
            (l, r) => ScriptValue::Number(l.to_number() + r.to_number()),
        },
        BinaryOperator::Subtract => ScriptValue::Number(left.to_number() - right.to_number()),
        BinaryOperator::Multiply => ScriptValue::Number(left.to_number() * right.to_number()),
        BinaryOperator::Divide => {
            let r = right.to_number();
            if r == 0.0 {
                ScriptValue::Number(f64::NAN)
            } else {
                ScriptValue::Number(left.to_number() / r)
            }
        }
        BinaryOperator::Modulo => ScriptValue::Number(left.to_number() % right.to_number()),

        BinaryOperator::Concat => {
            ScriptValue::String(format!("{}{}", left.as_string(), right.as_string()))
        }

        // Comparison operators
        BinaryOperator::Equal => {
            ScriptValue::Boolean(compare_values(left, right) == Some(Ordering::Equal))
        }
        BinaryOperator::NotEqual => {
            ScriptValue::Boolean(compare_values(left, right) != Some(Ordering::Equal))
        }
        BinaryOperator::LessThan => {
            ScriptValue::Boolean(compare_values(left, right) == Some(Ordering::Less))
        }
        BinaryOperator::LessEqual => ScriptValue::Boolean(matches!(
            compare_values(left, right),
            Some(Ordering::Less | Ordering::Equal)
        )),
        BinaryOperator::GreaterThan => {
            ScriptValue::Boolean(compare_values(left, right) == Some(Ordering::Greater))
        }
        BinaryOperator::GreaterEqual => ScriptValue::Boolean(matches!(
            compare_values(left, right),
            Some(Ordering::Greater | Ordering::Equal)
        )),

        // Handled before operands are broadcast
        BinaryOperator::And | BinaryOperator::Or => ScriptValue::Null,
    }
}

/// Compare two values; `None` when they are not comparable.
///
/// Two strings compare as text. Otherwise values compare numerically when
/// both convert, so `"5" == 5` holds. Null only equals null.
pub fn compare_values(left: &ScriptValue, right: &ScriptValue) -> Option<Ordering> {
    match (left, right) {
        (ScriptValue::Null, ScriptValue::Null) => Some(Ordering::Equal),
        (ScriptValue::Null, _) | (_, ScriptValue::Null) => None,
        (ScriptValue::String(l), ScriptValue::String(r)) => Some(l.cmp(r)),
        (ScriptValue::Array(_), _) | (_, ScriptValue::Array(_)) => None,
        (l, r) => match (l.as_number(), r.as_number()) {
            (Some(a), Some(b)) => a.partial_cmp(&b),
            _ => None,
        },
    }
}

/// Apply `f` to each element of an array, or to a scalar directly
pub fn map_values(value: &ScriptValue, f: &dyn Fn(&ScriptValue) -> ScriptValue) -> ScriptValue {
    match value {
        ScriptValue::Array(items) => ScriptValue::Array(items.iter().map(|v| map_values(v, f)).collect()),
        v => f(v),
    }
}

/// Combine two values element-wise. Arrays pair up to the shorter length;
/// a scalar pairs with every element.
pub fn broadcast(
    left: &ScriptValue,
    right: &ScriptValue,
    f: &dyn Fn(&ScriptValue, &ScriptValue) -> ScriptValue,
) -> ScriptValue {
    match (left, right) {
        (ScriptValue::Array(l), ScriptValue::Array(r)) => ScriptValue::Array(
            l.iter().zip(r).map(|(a, b)| broadcast(a, b, f)).collect(),
        ),
        (ScriptValue::Array(l), r) => {
            ScriptValue::Array(l.iter().map(|a| broadcast(a, r, f)).collect())
        }
        (l, ScriptValue::Array(r)) => {
            ScriptValue::Array(r.iter().map(|b| broadcast(l, b, f)).collect())
        }
        (l, r) => f(l, r),
    }
}

/// Pick per element between `then` and `otherwise` by the truthiness of `flags`
pub fn select(flags: &[ScriptValue], then: &ScriptValue, otherwise: &ScriptValue) -> ScriptValue {
    let pick = |branch: &ScriptValue, i: usize| match branch {
        ScriptValue::Array(items) => items.get(i).cloned().unwrap_or_default(),
        v => v.clone(),
    };
    ScriptValue::Array(
        flags
            .iter()
            .enumerate()
            .map(|(i, flag)| {
                if flag.is_truthy() {
                    pick(then, i)
                } else {
                    pick(otherwise, i)
                }
            })
            .collect(),
    )
}

/// Evaluate a function call
fn evaluate_function(
    name: &str,
    args: &[ScriptExpr],
    ctx: &EvaluationContext,
) -> FormulaResult<ScriptValue> {
    let func = FUNCTION_REGISTRY
        .get(name)
        .ok_or_else(|| FormulaError::UnknownFunction(name.to_string()))?;

    // Check argument count
    if args.len() < func.min_args {
        return Err(FormulaError::ArgumentCount {
            function: name.to_string(),
            expected: format!("at least {}", func.min_args),
            actual: args.len(),
        });
    }

    if let Some(max) = func.max_args {
        if args.len() > max {
            return Err(FormulaError::ArgumentCount {
                function: name.to_string(),
                expected: format!("at most {}", max),
                actual: args.len(),
            });
        }
    }

    // Evaluate arguments
    let mut evaluated_args = Vec::with_capacity(args.len());
    for arg in args {
        evaluated_args.push(evaluate(arg, ctx)?);
    }

    (func.implementation)(&evaluated_args, ctx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::evaluate_script;
    use pretty_assertions::assert_eq;

    fn eval(script: &str) -> ScriptValue {
        evaluate_script(script, &EvaluationContext::simple()).unwrap()
    }

    fn nums(values: &[f64]) -> ScriptValue {
        ScriptValue::Array(values.iter().map(|n| ScriptValue::Number(*n)).collect())
    }

    #[test]
    fn test_arithmetic() {
        assert_eq!(eval("1 + 2 * 3"), ScriptValue::Number(7.0));
        assert_eq!(eval("(1 + 2) * 3"), ScriptValue::Number(9.0));
        assert_eq!(eval("7 % 4"), ScriptValue::Number(3.0));
        assert_eq!(eval("-2 + 5"), ScriptValue::Number(3.0));
        assert!(eval("1 / 0").to_number().is_nan());
        assert!(eval("\"abc\" - 1").to_number().is_nan());
        assert_eq!(eval("null + 4"), ScriptValue::Number(4.0));
    }

    #[test]
    fn test_string_concatenation() {
        assert_eq!(eval(r#""Bob" + " is " + 42"#), ScriptValue::from("Bob is 42"));
        assert_eq!(eval(r#"1 + "a""#), ScriptValue::from("1a"));
        assert_eq!(eval(r#""x" & 2"#), ScriptValue::from("x2"));
    }

    #[test]
    fn test_comparisons() {
        assert_eq!(eval("2 > 1"), ScriptValue::Boolean(true));
        assert_eq!(eval("2 <= 1"), ScriptValue::Boolean(false));
        assert_eq!(eval(r#""5" == 5"#), ScriptValue::Boolean(true));
        assert_eq!(eval(r#""b" > "a""#), ScriptValue::Boolean(true));
        assert_eq!(eval(r#""east" != "" "#), ScriptValue::Boolean(true));
        assert_eq!(eval(r#""x" > 1"#), ScriptValue::Boolean(false));
        assert_eq!(eval("null == null"), ScriptValue::Boolean(true));
        assert_eq!(eval("null == 0"), ScriptValue::Boolean(false));
    }

    #[test]
    fn test_logical_operators() {
        assert_eq!(eval("(42>18 and \"Bob\"!=\"\")"), ScriptValue::Boolean(true));
        assert_eq!(eval("0 or 5"), ScriptValue::Number(5.0));
        assert_eq!(eval("0 && 5"), ScriptValue::Number(0.0));
        assert_eq!(eval("not 0"), ScriptValue::Boolean(true));
        assert_eq!(eval("!1"), ScriptValue::Boolean(false));
        // Right side is not evaluated once the result is known
        assert_eq!(eval("1 or unknown_fn()"), ScriptValue::Number(1.0));
    }

    #[test]
    fn test_conditionals() {
        assert_eq!(
            eval(r#"("adult" if 42 > 18 else "minor")"#),
            ScriptValue::from("adult")
        );
        assert_eq!(eval(r#"0 ? "y" : "n""#), ScriptValue::from("n"));
        assert_eq!(
            eval(r#"("a" if [1, 0, 1] else "b")"#),
            ScriptValue::Array(vec!["a".into(), "b".into(), "a".into()])
        );
    }

    #[test]
    fn test_broadcasting() {
        assert_eq!(eval("[1, 2, 3] * 2"), nums(&[2.0, 4.0, 6.0]));
        assert_eq!(eval("[10, 20] - [1, 2, 3]"), nums(&[9.0, 18.0]));
        assert_eq!(
            eval("[1, 5] > 2"),
            ScriptValue::Array(vec![false.into(), true.into()])
        );
        assert_eq!(eval("-[1, 2]"), nums(&[-1.0, -2.0]));
    }

    #[test]
    fn test_unknown_names() {
        let ctx = EvaluationContext::simple();
        assert!(matches!(
            evaluate_script("region + 1", &ctx),
            Err(FormulaError::UnknownName(_))
        ));
        assert!(matches!(
            evaluate_script("NOPE(1)", &ctx),
            Err(FormulaError::UnknownFunction(_))
        ));
        assert!(matches!(
            evaluate_script("arrayIndex(1)", &ctx),
            Err(FormulaError::ArgumentCount { .. })
        ));
    }

    #[test]
    fn test_column_access() {
        let table = Table::from_rows(
            ["region", "sales"],
            vec![
                vec!["east".into(), 100.into()],
                vec!["west".into(), 200.into()],
            ],
        );
        let ctx = EvaluationContext::new(Some(&table));
        assert_eq!(ctx.column_data("sales", 2), nums(&[100.0, 200.0]));
        assert_eq!(ctx.column_data("sales", 3), nums(&[200.0]));
        assert_eq!(ctx.column_data("B", 2), nums(&[100.0, 200.0]));
        assert_eq!(ctx.column_data("missing", 2), ScriptValue::Array(vec![]));
        assert_eq!(ctx.cell_value("region", 0), ScriptValue::from("region"));
        assert_eq!(ctx.cell_value("region", 1), ScriptValue::from("east"));
        assert_eq!(ctx.cell_value("A", 2), ScriptValue::from("west"));
        assert_eq!(ctx.cell_value("region", 5), ScriptValue::Null);
    }

    #[test]
    fn test_value_conversions() {
        assert_eq!(ScriptValue::Boolean(true).as_string(), "true");
        assert_eq!(nums(&[1.0, 2.5]).as_string(), "1,2.5");
        assert!(!ScriptValue::Number(f64::NAN).is_truthy());
        assert!(ScriptValue::from("0").is_truthy());
        assert_eq!(ScriptValue::Number(f64::NAN).into_cell(), CellValue::Empty);
        assert_eq!(ScriptValue::from(&CellValue::Empty), ScriptValue::Null);
    }
}
