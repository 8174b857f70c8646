//! # dashform
//!
//! Spreadsheet-formula driven dashboards over CSV tables.
//!
//! Dashform translates Excel-style formulas into a small script dialect and
//! evaluates them against tabular data, either per row (derived columns) or
//! over whole columns (KPIs and filter value lists).
//!
//! ## Features
//!
//! - CSV loading with column letters assigned in header order
//! - Derived columns from transformation formulas
//! - KPI evaluation and display formatting
//! - Dashboard configuration with translated formulas and filter conditions
//!
//! ## Example
//!
//! ```rust
//! use dashform::prelude::*;
//!
//! let mut table = CsvReader::read_str(
//!     "name,age\nAnn,42\nBob,12\n",
//!     &CsvReadOptions::default(),
//! )
//! .unwrap();
//!
//! table
//!     .apply_transformations(&[TransformationSpec {
//!         name: "group".into(),
//!         formula: r#"=IF(B2>18,"adult","minor")"#.into(),
//!     }])
//!     .unwrap();
//!
//! assert_eq!(table.column_by_letter("C"), Some("group"));
//! assert_eq!(table.row(1).unwrap().get("group"), Some(&CellValue::from("minor")));
//! ```

pub mod dashboard;
pub mod error;
pub mod prelude;
pub mod transform;

pub use dashboard::{
    evaluate_kpi, filter_column_mapping, ChartAxisSpec, ChartConfig, ChartSeriesSpec, ChartSpec,
    ColumnConfig, ComponentConfig, ComponentSpec, DashboardConfig, DashboardMetadata,
    DashboardProcessor, DashboardSpec, FilterColumn, FilterConfig, FilterSpec, GridColumnSpec,
    GridRowSpec, GridSpec, KpiConfig, KpiSpec, RowConfig, TransformationSpec,
};
pub use error::{Error, Result};
pub use transform::{DerivedColumn, TableTransformExt};

// Re-export core types
pub use dashform_core::{CellValue, ColumnSchema, FilterValue, RowView, Table, TableSummary};

// Re-export formula types
pub use dashform_formula::{
    evaluate_script, format_kpi, EvaluationContext, EvaluationMode, FilterCondition,
    FormulaError, FormulaTranslator, FunctionTable, ScriptValue, TableConditionExt,
};

// Re-export I/O types
pub use dashform_csv::{CsvError, CsvReadOptions, CsvReader, CsvWriteOptions, CsvWriter};

use std::path::Path;

/// Load a CSV file and apply a dashboard's transformations to it
pub fn load_dashboard_table<P: AsRef<Path>>(path: P, spec: &DashboardSpec) -> Result<Table> {
    let mut table = CsvReader::read_file(path, &CsvReadOptions::default())?;
    table.apply_transformations(&spec.transformations)?;
    Ok(table)
}
