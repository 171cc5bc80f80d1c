//! Error types for the Q5 engine

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using the engine Error
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for the Q5 engine
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid or missing query configuration (thread count, dates, names)
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O failure on a table file or the result file
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        /// Offending path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// A cell could not be used by the join (missing column, bad number)
    #[error("Data error in {table} row {row}, column {column}: {message}")]
    Data {
        /// Table the row belongs to
        table: String,
        /// Zero-based row position in the table
        row: usize,
        /// Column name
        column: String,
        /// What went wrong
        message: String,
    },

    /// A table lacks a column the join reads
    #[error("Data error: table {table} has no column {column}")]
    MissingColumn {
        /// Table name
        table: String,
        /// Column that was looked up
        column: String,
    },

    /// A worker thread panicked before committing its partial total
    #[error("Worker error: {0}")]
    Worker(String),
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an I/O error bound to a path
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a data error for a single cell
    pub fn data(
        table: impl Into<String>,
        row: usize,
        column: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Data {
            table: table.into(),
            row,
            column: column.into(),
            message: message.into(),
        }
    }

    /// Create a worker error
    pub fn worker(msg: impl Into<String>) -> Self {
        Self::Worker(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_error_names_cell() {
        let err = Error::data("lineitem", 7, "L_EXTENDEDPRICE", "invalid float literal");
        let msg = err.to_string();
        assert!(msg.contains("lineitem"));
        assert!(msg.contains("row 7"));
        assert!(msg.contains("L_EXTENDEDPRICE"));
    }

    #[test]
    fn test_io_error_names_path() {
        let err = Error::io(
            "/data/orders.tbl",
            std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        );
        assert!(matches!(err, Error::Io { .. }));
        assert!(err.to_string().contains("/data/orders.tbl"));
    }
}
