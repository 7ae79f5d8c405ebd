//! Error types for data operations.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for data operations.
pub type Result<T> = std::result::Result<T, DataError>;

/// Errors that can occur while extracting or reshaping source data.
#[derive(Debug, Error)]
pub enum DataError {
    /// A source file is absent.
    #[error("Source file not found: {}", path.display())]
    MissingFile {
        /// Path that was looked up
        path: PathBuf,
    },

    /// Required columns are absent from a table.
    #[error("Missing required columns: {columns:?}")]
    MissingColumn {
        /// Every required column that was not found
        columns: Vec<String>,
    },

    /// Unknown utility, year or metric passed to a selector.
    #[error("Invalid selection: {0}")]
    InvalidSelector(String),

    /// Too few data points for the requested operation
    #[error("Insufficient data: need at least {required} rows, got {actual}")]
    InsufficientData {
        /// Required number of rows
        required: usize,
        /// Actual number of rows
        actual: usize,
    },

    /// Invalid parameter value
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Spreadsheet error
    #[error("Spreadsheet error in {}: {message}", path.display())]
    Excel {
        /// Workbook being read
        path: PathBuf,
        /// Underlying reader message
        message: String,
    },

    /// Polars error
    #[error("Polars error: {0}")]
    Polars(#[from] polars::prelude::PolarsError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl DataError {
    /// Build a [`DataError::MissingColumn`] from any list of names.
    pub fn missing_columns<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::MissingColumn {
            columns: columns.into_iter().map(Into::into).collect(),
        }
    }
}

/// Owned column names of a frame.
pub fn column_names(df: &polars::prelude::DataFrame) -> Vec<String> {
    df.get_column_names()
        .into_iter()
        .map(|n| n.to_string())
        .collect()
}

/// Return the entries of `required` that are not in `available`, preserving order.
pub fn missing_from<'a, S: AsRef<str>>(required: &[&'a str], available: &[S]) -> Vec<&'a str> {
    required
        .iter()
        .copied()
        .filter(|name| !available.iter().any(|a| a.as_ref() == *name))
        .collect()
}

/// Fail with [`DataError::MissingColumn`] unless every required column is available.
pub fn require_columns<S: AsRef<str>>(required: &[&str], available: &[S]) -> Result<()> {
    let missing = missing_from(required, available);
    if missing.is_empty() {
        Ok(())
    } else {
        Err(DataError::missing_columns(missing))
    }
}
