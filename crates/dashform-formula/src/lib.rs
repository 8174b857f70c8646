//! # dashform-formula
//!
//! Spreadsheet formula translation engine for dashform.
//!
//! This crate provides:
//! - Formula translation (Excel text → script expression), in ROW mode
//!   (references become the current row's values) and COLUMN mode
//!   (references become whole-column data accessors)
//! - Criteria and default filter condition grammars
//! - TEXT and KPI value formatting
//! - A runtime that parses and evaluates translated expressions
//!
//! ## Example
//!
//! ```rust
//! use dashform_core::Table;
//! use dashform_formula::{evaluate_script, EvaluationContext, FormulaTranslator, ScriptValue};
//!
//! let table = Table::from_rows(
//!     ["region", "sales"],
//!     vec![vec!["east".into(), 100.into()], vec!["west".into(), 200.into()]],
//! );
//!
//! let script = FormulaTranslator::new().translate_column("=SUM(B2:B)", table.schema());
//! let total = evaluate_script(&script, &EvaluationContext::new(Some(&table))).unwrap();
//! assert_eq!(total, ScriptValue::Number(300.0));
//! ```

pub mod condition;
pub mod criteria;
pub mod engine;
pub mod error;
pub mod format;
pub mod mapper;
pub mod reference;
pub mod runtime;
pub mod splitter;
pub mod statements;

pub use condition::{FilterCondition, TableConditionExt};
pub use criteria::{ComparisonOp, CriteriaMatcher};
pub use engine::FormulaTranslator;
pub use error::{FormulaError, FormulaResult};
pub use format::{excel_text, fixed, format_kpi, grouped, parse_date};
pub use mapper::FunctionTable;
pub use reference::{
    quote, resolve_references, rewrite_growth_pattern, row_literal, EvaluationMode,
    ResolveContext,
};
pub use runtime::{evaluate_script, EvaluationContext, ScriptValue};
pub use splitter::{find_matching_paren, map_unquoted, split_arguments};
pub use statements::{convert_and, convert_if, convert_operators, convert_or, convert_statements};
