//! Error types for the dashform facade

use thiserror::Error;

/// Result type alias using [`Error`]
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the facade: everything the lower crates can fail with
#[derive(Debug, Error)]
pub enum Error {
    /// Table error
    #[error(transparent)]
    Core(#[from] dashform_core::Error),

    /// Runtime evaluation error of a translated formula
    #[error(transparent)]
    Formula(#[from] dashform_formula::FormulaError),

    /// CSV loading error
    #[error(transparent)]
    Csv(#[from] dashform_csv::CsvError),

    /// Malformed dashboard specification
    #[error("Invalid dashboard specification: {0}")]
    Spec(#[from] serde_json::Error),
}
