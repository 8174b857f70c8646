//! # dashform-core
//!
//! Core data structures for the dashform formula engine.
//!
//! This crate provides the fundamental types used throughout dashform:
//! - [`ColumnSchema`] - Bidirectional column letter <-> column name mapping
//! - [`CellValue`] - A single table value (number, string, boolean, empty)
//! - [`Table`] - Column-major tabular data with row views and filters
//!
//! ## Example
//!
//! ```rust
//! use dashform_core::{CellValue, Table};
//!
//! let table = Table::from_rows(
//!     ["region", "sales"],
//!     vec![vec!["east".into(), 100.into()], vec!["west".into(), 200.into()]],
//! );
//!
//! assert_eq!(table.column_by_letter("B"), Some("sales"));
//! assert_eq!(table.row(1).unwrap().get("sales"), Some(&CellValue::Number(200.0)));
//! ```

pub mod error;
pub mod schema;
pub mod table;
pub mod value;

pub use error::{Error, Result};
pub use schema::ColumnSchema;
pub use table::{compare_cells, data_offset, FilterValue, RowView, Table, TableSummary};
pub use value::{format_number, CellValue};
