//! Timestamped JSON report of the statistical analysis.

use chrono::{DateTime, Utc};
use ratecase_stats::{AnalysisResults, KeyFindings};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use tracing::info;

/// Errors that can occur during report generation.
#[derive(Debug, Error)]
pub enum ReportError {
    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Analysis results with their key findings.
///
/// Non-finite numbers (an infinite VIF, for instance) serialize as `null`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    /// Report generation timestamp.
    pub generated_at: DateTime<Utc>,

    /// Utility-years analyzed.
    pub n_records: usize,

    /// Condensed findings.
    pub key_findings: KeyFindings,

    /// Full results.
    #[serde(flatten)]
    pub results: AnalysisResults,
}

impl AnalysisReport {
    /// Create a report stamped with the current time.
    pub fn new(n_records: usize, results: AnalysisResults) -> Self {
        Self {
            generated_at: Utc::now(),
            n_records,
            key_findings: KeyFindings::from_results(&results),
            results,
        }
    }

    /// Convert report to JSON string.
    pub fn to_json(&self) -> Result<String, ReportError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write the report, creating the parent directory.
    pub fn write(&self, path: &Path) -> Result<(), ReportError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_json()?)?;
        info!(path = %path.display(), "Wrote analysis results");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratecase_stats::VifResult;

    #[test]
    fn test_report_json() {
        let results = AnalysisResults {
            vif: Some(vec![VifResult {
                variable: "rate_base".to_string(),
                vif: f64::INFINITY,
            }]),
            outliers_error: Some("Invalid selection: metric x not found".to_string()),
            ..Default::default()
        };
        let report = AnalysisReport::new(18, results);
        let value: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();

        assert_eq!(value["n_records"], 18);
        assert!(value["generated_at"].is_string());
        assert!(value["vif"][0]["vif"].is_null());
        assert_eq!(value["outliers_error"], "Invalid selection: metric x not found");
        assert!(value.get("outliers").is_none());
        assert_eq!(value["key_findings"]["high_vif"][0], "rate_base");
    }

    #[test]
    fn test_write_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("processed").join("analysis_results.json");
        AnalysisReport::new(0, AnalysisResults::default())
            .write(&path)
            .unwrap();
        assert!(path.exists());
    }
}
