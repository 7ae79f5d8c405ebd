//! CSV and JSON export of result tables.

use polars::prelude::PolarsError;
use ratecase_data::{DataError, UtilityYearRecord};
use ratecase_revenue::{
    BillImpact, ClassShares, RevenueRequirementRow, ScenarioResult, TestYearForecast,
    WaccSensitivity,
};
use ratecase_stats::{BenchmarkRow, OutlierRow, UtilitySummary, YoyRow};
use serde::Serialize;
use std::{fs::File, io::Write, path::Path};
use thiserror::Error;

/// Result type for export operations.
pub type Result<T> = std::result::Result<T, ExportError>;

/// Errors that can occur during export operations.
#[derive(Debug, Error)]
pub enum ExportError {
    /// CSV serialization error.
    #[error("CSV serialization error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization error.
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// Frame construction or parquet error.
    #[error("Polars error: {0}")]
    Polars(#[from] PolarsError),

    /// Record conversion error.
    #[error(transparent)]
    Data(#[from] DataError),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid format error.
    #[error("Invalid format: {0}")]
    InvalidFormat(String),
}

/// Export format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// Comma-separated values format.
    Csv,

    /// Compact JSON format.
    Json,

    /// Pretty-printed JSON format.
    PrettyJson,
}

impl ExportFormat {
    /// Get the file extension for this format.
    pub const fn extension(&self) -> &str {
        match self {
            Self::Csv => "csv",
            Self::Json | Self::PrettyJson => "json",
        }
    }
}

/// Trait for exporting data in various formats.
pub trait Exporter {
    /// Export data to a string in the specified format.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    fn export_to_string(&self, format: ExportFormat) -> Result<String>;

    /// Export data to a file in the specified format.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or file writing fails.
    fn export_to_file(&self, path: &Path, format: ExportFormat) -> Result<()> {
        let content = self.export_to_string(format)?;
        let mut file = File::create(path)?;
        file.write_all(content.as_bytes())?;
        Ok(())
    }
}

fn csv_string<T: Serialize>(rows: &[T]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    for row in rows {
        wtr.serialize(row)?;
    }
    let bytes = wtr.into_inner().map_err(|e| e.into_error())?;
    String::from_utf8(bytes).map_err(|e| ExportError::InvalidFormat(e.to_string()))
}

fn json_string<T: Serialize + ?Sized>(value: &T, format: ExportFormat) -> Result<String> {
    Ok(match format {
        ExportFormat::PrettyJson => serde_json::to_string_pretty(value)?,
        _ => serde_json::to_string(value)?,
    })
}

macro_rules! flat_row_exporter {
    ($($row:ty),+ $(,)?) => {
        $(
            impl Exporter for [$row] {
                fn export_to_string(&self, format: ExportFormat) -> Result<String> {
                    match format {
                        ExportFormat::Csv => csv_string(self),
                        ExportFormat::Json | ExportFormat::PrettyJson => json_string(self, format),
                    }
                }
            }
        )+
    };
}

flat_row_exporter!(
    UtilityYearRecord,
    BillImpact,
    ClassShares,
    ScenarioResult,
    TestYearForecast,
    WaccSensitivity,
    BenchmarkRow,
    OutlierRow,
    UtilitySummary,
    YoyRow,
);

impl Exporter for [RevenueRequirementRow] {
    fn export_to_string(&self, format: ExportFormat) -> Result<String> {
        match format {
            ExportFormat::Csv => Err(ExportError::InvalidFormat(
                "revenue requirement rows nest the source record; export them as JSON or parquet"
                    .to_string(),
            )),
            ExportFormat::Json | ExportFormat::PrettyJson => json_string(self, format),
        }
    }
}
