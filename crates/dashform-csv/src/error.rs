//! CSV error types

use thiserror::Error;

/// Result type for CSV operations
pub type CsvResult<T> = std::result::Result<T, CsvError>;

/// Errors that can occur while loading or writing a table
#[derive(Debug, Error)]
pub enum CsvError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV library error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// The input has no header row to build a schema from
    #[error("CSV input has no header row")]
    MissingHeader,

    /// Core error
    #[error("Core error: {0}")]
    Core(#[from] dashform_core::Error),
}
