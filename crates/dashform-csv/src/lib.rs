//! # dashform-csv
//!
//! CSV loader and writer for dashform tables.
//!
//! ```rust
//! use dashform_csv::{CsvReadOptions, CsvReader};
//!
//! let table = CsvReader::read_str("region,sales\neast,100\n", &CsvReadOptions::default()).unwrap();
//! assert_eq!(table.column_by_letter("B"), Some("sales"));
//! ```

mod error;
mod options;
mod reader;
mod writer;

pub use error::{CsvError, CsvResult};
pub use options::{CsvReadOptions, CsvWriteOptions, LineTerminator};
pub use reader::CsvReader;
pub use writer::CsvWriter;
