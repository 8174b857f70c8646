//! The formula translation pipeline

use crate::mapper::FunctionTable;
use crate::reference::{quote, resolve_references, rewrite_growth_pattern, ResolveContext};
use crate::statements::{convert_operators, convert_statements};
use dashform_core::{ColumnSchema, RowView};

/// Translates spreadsheet formulas into script expressions.
///
/// A formula starts with `=`; anything else is a literal and translates to a
/// quoted string. Translation never fails: constructs it cannot handle are
/// passed through as-is.
///
/// # Example
///
/// ```rust
/// use dashform_core::ColumnSchema;
/// use dashform_formula::FormulaTranslator;
///
/// let schema = ColumnSchema::from_headers(["region", "sales"]);
/// let translator = FormulaTranslator::new();
///
/// assert_eq!(
///     translator.translate_column("=SUM(B2:B)", &schema),
///     r#"arraySum(getColumnData("sales", 2))"#
/// );
/// assert_eq!(translator.translate_column("Total", &schema), r#""Total""#);
/// ```
#[derive(Debug, Clone, Default)]
pub struct FormulaTranslator {
    functions: FunctionTable,
}

impl FormulaTranslator {
    /// Create a translator with the built-in function table
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a translator with a custom function table
    pub fn with_functions(functions: FunctionTable) -> Self {
        Self { functions }
    }

    /// The function table used in COLUMN mode
    pub fn functions(&self) -> &FunctionTable {
        &self.functions
    }

    /// Translate `formula` in the mode given by `ctx`
    pub fn translate(&self, formula: &str, ctx: &ResolveContext<'_>) -> String {
        let Some(body) = formula.strip_prefix('=') else {
            return quote(formula);
        };

        let translated = match ctx {
            ResolveContext::Row(_) => {
                let text = convert_statements(body);
                resolve_references(&text, ctx)
            }
            ResolveContext::Column(schema) => {
                let text = rewrite_growth_pattern(body, schema);
                let text = resolve_references(&text, ctx);
                let text = self.functions.apply(&text);
                convert_operators(&text)
            }
        };

        log::debug!("translated {:?} -> {:?}", formula, translated);
        translated
    }

    /// Translate for whole-column evaluation: references become data accessors
    pub fn translate_column(&self, formula: &str, schema: &ColumnSchema) -> String {
        self.translate(formula, &ResolveContext::Column(schema))
    }

    /// Translate for one row: references become that row's literal values
    pub fn translate_row(&self, formula: &str, row: RowView<'_>) -> String {
        self.translate(formula, &ResolveContext::Row(row))
    }

    /// Translate a filter-values formula into an immediately invoked function
    /// returning its result
    pub fn filter_values_script(&self, formula: &str, schema: &ColumnSchema) -> String {
        format!(
            "(function() {{ return {}; }})()",
            self.translate_column(formula, schema)
        )
    }
}
