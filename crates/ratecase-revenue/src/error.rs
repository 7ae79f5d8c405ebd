//! Error types for revenue requirement and bill calculations.

use ratecase_data::DataError;
use thiserror::Error;

/// Result type for revenue operations.
pub type Result<T> = std::result::Result<T, RevenueError>;

/// Errors raised by revenue requirement and bill formulas.
#[derive(Debug, Error)]
pub enum RevenueError {
    /// A value the formula needs is missing from the record.
    #[error("Missing value for {0}")]
    MissingField(&'static str),

    /// A parameter is outside its valid range.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Unknown base year or utility.
    #[error("Invalid selection: {0}")]
    InvalidSelector(String),

    /// The current revenue requirement is zero, so no bill ratio exists.
    #[error("Current revenue requirement is zero")]
    ZeroRevenueRequirement,

    /// Data layer error
    #[error(transparent)]
    Data(#[from] DataError),
}
