//! Error types for panel statistics.

use thiserror::Error;

/// Result type for statistics.
pub type Result<T> = std::result::Result<T, StatsError>;

/// Errors that can occur while computing statistics
#[derive(Debug, Error)]
pub enum StatsError {
    /// Unknown utility, metric or year
    #[error("Invalid selection: {0}")]
    InvalidSelector(String),

    /// Not enough observations
    #[error("Insufficient data: need at least {required} observations, got {actual}")]
    InsufficientData {
        /// Required number of observations
        required: usize,
        /// Actual number of observations
        actual: usize,
    },

    /// Design matrix is not invertible
    #[error("Design matrix is singular")]
    SingularMatrix,

    /// Invalid distribution parameters
    #[error("Distribution error: {0}")]
    Distribution(String),
}
