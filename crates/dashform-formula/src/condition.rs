//! Default filter conditions attached to charts and series.
//!
//! Grammar: `columnRef operator value`, where the column reference is a
//! letter (`C`), a letter range from row 2 (`C2:C`, meaning the column) or a
//! column name; the operator is one of `> >= < <= = !=`; the value is a bare
//! token or a double-quoted string (`\"` escapes a quote).

use crate::criteria::{ComparisonOp, Operand};
use crate::error::{FormulaError, FormulaResult};
use crate::reference::quote;
use crate::runtime::ScriptValue;
use dashform_core::{format_number, CellValue, ColumnSchema, RowView, Table};
use lazy_regex::regex_captures;
use std::fmt;

/// A parsed row filter
#[derive(Debug, Clone, PartialEq)]
pub struct FilterCondition {
    /// Column name the condition applies to
    pub column: String,
    /// Comparison operator
    pub op: ComparisonOp,
    /// Literal compared against
    pub value: CellValue,
}

impl FilterCondition {
    /// Parse a condition, resolving its column reference against `schema`
    pub fn parse(text: &str, schema: &ColumnSchema) -> FormulaResult<Self> {
        let (_, column_ref, op, value) =
            regex_captures!(r"^\s*(.+?)\s*(>=|<=|!=|<>|==|=|>|<)\s*(.*?)\s*$", text)
                .ok_or_else(|| FormulaError::InvalidCondition(text.to_string()))?;

        let op = ComparisonOp::parse(op)
            .ok_or_else(|| FormulaError::InvalidCondition(text.to_string()))?;

        if value.is_empty() {
            return Err(FormulaError::InvalidCondition(text.to_string()));
        }

        Ok(Self {
            column: resolve_column(column_ref, schema),
            op,
            value: parse_value(value),
        })
    }

    /// Whether a row satisfies the condition; rows lacking the column never do
    pub fn matches(&self, row: &RowView<'_>) -> bool {
        let Some(cell) = row.get(&self.column) else {
            return false;
        };
        let operand = match &self.value {
            CellValue::Number(n) => Operand::Number(*n),
            CellValue::Boolean(b) => Operand::Boolean(*b),
            CellValue::String(s) => Operand::Text(s.clone()),
            CellValue::Empty => Operand::Text(String::new()),
        };
        operand.compare(self.op, &ScriptValue::from(cell))
    }
}

fn resolve_column(column_ref: &str, schema: &ColumnSchema) -> String {
    if schema.contains(column_ref) {
        return column_ref.to_string();
    }

    if let Some((_, start, end)) = regex_captures!(r"^([A-Z]+)\d*:([A-Z]+)\d*$", column_ref) {
        if start == end {
            if let Some(name) = schema.name_for(start) {
                return name.to_string();
            }
        }
    }

    if let Some(name) = schema.name_for(column_ref) {
        if column_ref.chars().all(|c| c.is_ascii_uppercase()) {
            return name.to_string();
        }
    }

    column_ref.to_string()
}

fn parse_value(value: &str) -> CellValue {
    if value.len() >= 2 && value.starts_with('"') && value.ends_with('"') {
        let inner = &value[1..value.len() - 1];
        let mut out = String::with_capacity(inner.len());
        let mut chars = inner.chars();
        while let Some(c) = chars.next() {
            if c == '\\' {
                if let Some(next) = chars.next() {
                    out.push(next);
                    continue;
                }
            }
            out.push(c);
        }
        return CellValue::String(out);
    }

    match CellValue::detect(value) {
        CellValue::Empty => CellValue::string(value),
        detected => detected,
    }
}

impl fmt::Display for FilterCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = match &self.value {
            CellValue::String(s) => quote(s),
            CellValue::Number(n) => format_number(*n),
            CellValue::Boolean(b) => b.to_string(),
            CellValue::Empty => "\"\"".to_string(),
        };
        write!(f, "{} {} {}", self.column, self.op, value)
    }
}

/// Row filtering by default filter conditions
pub trait TableConditionExt {
    /// Rows satisfying every condition
    fn retain_matching(&self, conditions: &[FilterCondition]) -> Table;
}

impl TableConditionExt for Table {
    fn retain_matching(&self, conditions: &[FilterCondition]) -> Table {
        self.filter_rows(|row| conditions.iter().all(|c| c.matches(row)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn schema() -> ColumnSchema {
        ColumnSchema::from_headers(["region", "sales", "Product Name"])
    }

    #[test]
    fn test_parse_letter_reference() {
        let cond = FilterCondition::parse("B > 100", &schema()).unwrap();
        assert_eq!(cond.column, "sales");
        assert_eq!(cond.op, ComparisonOp::GreaterThan);
        assert_eq!(cond.value, CellValue::Number(100.0));
        assert_eq!(cond.to_string(), "sales > 100");
    }

    #[test]
    fn test_parse_range_idiom() {
        let cond = FilterCondition::parse(r#"A2:A = "east""#, &schema()).unwrap();
        assert_eq!(cond.column, "region");
        assert_eq!(cond.value, CellValue::string("east"));
        assert_eq!(cond.to_string(), r#"region = "east""#);
    }

    #[test]
    fn test_parse_name_and_escaped_quote() {
        let cond = FilterCondition::parse(r#"Product Name != "5\" screen""#, &schema()).unwrap();
        assert_eq!(cond.column, "Product Name");
        assert_eq!(cond.op, ComparisonOp::NotEqual);
        assert_eq!(cond.value, CellValue::string("5\" screen"));
    }

    #[test]
    fn test_parse_invalid() {
        assert!(FilterCondition::parse("sales", &schema()).is_err());
        assert!(FilterCondition::parse("sales >", &schema()).is_err());
    }

    #[test]
    fn test_retain_matching() {
        let table = Table::from_rows(
            ["region", "sales"],
            vec![
                vec!["east".into(), 100.into()],
                vec!["west".into(), 200.into()],
                vec!["east".into(), 300.into()],
            ],
        );
        let conditions = vec![
            FilterCondition::parse(r#"A = "east""#, table.schema()).unwrap(),
            FilterCondition::parse("sales >= 150", table.schema()).unwrap(),
        ];
        let filtered = table.retain_matching(&conditions);
        assert_eq!(filtered.row_count(), 1);
        assert_eq!(
            filtered.row(0).unwrap().get("sales"),
            Some(&CellValue::Number(300.0))
        );
    }
}
