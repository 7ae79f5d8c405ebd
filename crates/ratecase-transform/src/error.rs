//! Error types for transform operations.

use ratecase_data::DataError;
use thiserror::Error;

/// Result type for transform operations.
pub type Result<T> = std::result::Result<T, TransformError>;

/// Errors raised while reshaping or validating frames.
#[derive(Debug, Error)]
pub enum TransformError {
    /// The analysis-ready table failed a quality check.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Required columns are absent from an input frame.
    #[error("Missing required columns: {columns:?}")]
    MissingColumn {
        /// Every required column that was not found
        columns: Vec<String>,
    },

    /// Polars error
    #[error("Polars error: {0}")]
    Polars(#[from] polars::prelude::PolarsError),

    /// Data layer error
    #[error(transparent)]
    Data(#[from] DataError),
}
