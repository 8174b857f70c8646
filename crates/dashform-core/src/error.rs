//! Error types for dashform-core

use thiserror::Error;

/// Result type alias using [`Error`]
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in dashform-core
#[derive(Debug, Error)]
pub enum Error {
    /// Column name not present in the schema
    #[error("Unknown column: {0}")]
    UnknownColumn(String),

    /// Invalid column letters
    #[error("Invalid column letters: {0}")]
    InvalidLetters(String),

    /// Column data does not match the table height
    #[error("Column '{column}' has {actual} values, table has {expected} rows")]
    ColumnLength {
        column: String,
        expected: usize,
        actual: usize,
    },

    /// Row index out of bounds
    #[error("Row index {0} out of bounds (rows: {1})")]
    RowOutOfBounds(usize, usize),

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a new "other" error with a message
    pub fn other<S: Into<String>>(msg: S) -> Self {
        Error::Other(msg.into())
    }
}
