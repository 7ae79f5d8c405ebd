//! Errors raised by the pipeline stages.

use thiserror::Error;

/// Result type for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Failure of any pipeline stage.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Extraction or record conversion failed
    #[error("Data error: {0}")]
    Data(#[from] ratecase_data::DataError),

    /// Transform chain failed
    #[error("Transform error: {0}")]
    Transform(#[from] ratecase_transform::TransformError),

    /// Revenue requirement or bill impact failed
    #[error("Revenue error: {0}")]
    Revenue(#[from] ratecase_revenue::RevenueError),

    /// Writing a table failed
    #[error("Export error: {0}")]
    Export(#[from] ratecase_output::ExportError),

    /// Writing the analysis results failed
    #[error("Report error: {0}")]
    Report(#[from] ratecase_output::ReportError),

    /// Drawing a figure failed
    #[error("Chart error: {0}")]
    Chart(#[from] ratecase_output::ChartError),

    /// Polars error
    #[error("Polars error: {0}")]
    Polars(#[from] polars::prelude::PolarsError),
}
