//! Full statistical pass over the analysis-ready panel.

use crate::{
    StatsError,
    benchmark::{BenchmarkRow, peer_benchmark},
    outliers::{DEFAULT_Z_THRESHOLD, OutlierRow, detect_outliers},
    regression::{OlsResult, VifResult, check_multicollinearity, cost_driver_regression},
    summary::{UtilitySummary, summary_by_utility},
    trend::{TrendResult, trend_analysis},
    yoy::{YoyRow, calculate_yoy_change},
};
use ratecase_data::UtilityYearRecord;
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt};
use tracing::{info, warn};

/// Significance level for cost drivers.
pub const SIGNIFICANCE_LEVEL: f64 = 0.05;

/// VIF above which a regressor is reported as collinear.
pub const HIGH_VIF: f64 = 10.0;

/// Trend of one utility, or the reason it could not be computed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TrendOutcome {
    /// Computed trend
    Trend(TrendResult),
    /// Failure message
    Failed {
        /// Error text
        error: String,
    },
}

/// Results of [`run_analysis`]. Each part is either present or replaced by
/// its error message.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResults {
    /// `om_total` trend per utility name
    pub trend_results: BTreeMap<String, TrendOutcome>,
    /// Cost-driver regression
    #[serde(skip_serializing_if = "Option::is_none")]
    pub regression: Option<OlsResult>,
    /// Text table of the regression
    #[serde(skip_serializing_if = "Option::is_none")]
    pub regression_summary: Option<String>,
    /// Variance inflation factors
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vif: Option<Vec<VifResult>>,
    /// Regression or VIF failure
    #[serde(skip_serializing_if = "Option::is_none")]
    pub regression_error: Option<String>,
    /// Flagged `om_per_customer` outliers
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outliers: Option<Vec<OutlierRow>>,
    /// Outlier failure
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outliers_error: Option<String>,
    /// Latest-year `om_per_customer` benchmark
    #[serde(skip_serializing_if = "Option::is_none")]
    pub benchmarks: Option<Vec<BenchmarkRow>>,
    /// Benchmark failure
    #[serde(skip_serializing_if = "Option::is_none")]
    pub benchmarks_error: Option<String>,
    /// `om_total` year-over-year changes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub yoy_changes: Option<Vec<YoyRow>>,
    /// Year-over-year failure
    #[serde(skip_serializing_if = "Option::is_none")]
    pub yoy_changes_error: Option<String>,
    /// Per-utility summaries
    #[serde(skip_serializing_if = "Option::is_none")]
    pub utility_summaries: Option<Vec<UtilitySummary>>,
    /// Summary failure
    #[serde(skip_serializing_if = "Option::is_none")]
    pub utility_summaries_error: Option<String>,
}

fn split<T, E: fmt::Display>(step: &str, result: Result<T, E>) -> (Option<T>, Option<String>) {
    match result {
        Ok(v) => (Some(v), None),
        Err(e) => {
            warn!(step, error = %e, "Analysis step failed");
            (None, Some(e.to_string()))
        }
    }
}

/// Run every analysis, recording failures instead of aborting.
///
/// Trends use `om_total` for each utility; the regression and VIF use the
/// cost drivers; outliers and the latest-year benchmark use
/// `om_per_customer`; year-over-year changes use `om_total`.
pub fn run_analysis(records: &[UtilityYearRecord]) -> AnalysisResults {
    let mut results = AnalysisResults::default();

    let mut seen = Vec::new();
    for record in records {
        let id = record.utility_id_ferc1;
        if seen.contains(&id) {
            continue;
        }
        seen.push(id);
        let outcome = match trend_analysis(records, id, "om_total") {
            Ok(trend) => (record.utility_name.clone(), TrendOutcome::Trend(trend)),
            Err(e) => {
                warn!(utility_id = id, error = %e, "Trend analysis failed");
                (
                    format!("utility_{id}"),
                    TrendOutcome::Failed {
                        error: e.to_string(),
                    },
                )
            }
        };
        results.trend_results.insert(outcome.0, outcome.1);
    }

    let regression = cost_driver_regression(records)
        .and_then(|model| check_multicollinearity(records).map(|vif| (model, vif)));
    let (regression, regression_error) = split("regression", regression);
    if let Some((model, vif)) = regression {
        results.regression_summary = Some(model.summary());
        results.regression = Some(model);
        results.vif = Some(vif);
    }
    results.regression_error = regression_error;

    (results.outliers, results.outliers_error) = split(
        "outliers",
        detect_outliers(records, "om_per_customer", DEFAULT_Z_THRESHOLD),
    );

    let benchmarks = match records.iter().map(|r| r.report_year).max() {
        Some(latest) => peer_benchmark(records, latest, "om_per_customer"),
        None => Err(StatsError::InsufficientData {
            required: 1,
            actual: 0,
        }),
    };
    (results.benchmarks, results.benchmarks_error) = split("benchmarks", benchmarks);

    (results.yoy_changes, results.yoy_changes_error) =
        split("yoy_changes", calculate_yoy_change(records, "om_total"));

    (results.utility_summaries, results.utility_summaries_error) =
        split("utility_summaries", summary_by_utility(records));

    info!(
        trends = results.trend_results.len(),
        regression = results.regression.is_some(),
        outliers = results.outliers.as_ref().map_or(0, Vec::len),
        "Completed statistical analysis"
    );
    results
}

/// Utility and value pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedValue {
    /// Utility name
    pub utility_name: String,
    /// Value
    pub value: f64,
}

/// Headline conclusions of an [`AnalysisResults`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KeyFindings {
    /// Highest O&M per customer in the latest year
    pub highest_om_per_customer: Option<NamedValue>,
    /// Fastest O&M CAGR
    pub fastest_cagr: Option<NamedValue>,
    /// Cost drivers with `p < 0.05`, when the regression ran
    pub significant_drivers: Option<Vec<String>>,
    /// Regressors with VIF above 10
    pub high_vif: Vec<String>,
    /// Flagged outlier years
    pub outliers: Vec<OutlierRow>,
}

impl KeyFindings {
    /// Condense analysis results.
    pub fn from_results(results: &AnalysisResults) -> Self {
        let highest_om_per_customer = results.benchmarks.as_ref().and_then(|rows| {
            rows.iter()
                .max_by(|a, b| {
                    a.value
                        .unwrap_or(0.0)
                        .total_cmp(&b.value.unwrap_or(0.0))
                })
                .map(|r| NamedValue {
                    utility_name: r.utility_name.clone(),
                    value: r.value.unwrap_or(0.0),
                })
        });

        let fastest_cagr = results
            .trend_results
            .iter()
            .filter_map(|(name, outcome)| match outcome {
                TrendOutcome::Trend(t) => t.cagr_percent.map(|c| NamedValue {
                    utility_name: name.clone(),
                    value: c,
                }),
                TrendOutcome::Failed { .. } => None,
            })
            .max_by(|a, b| a.value.total_cmp(&b.value));

        Self {
            highest_om_per_customer,
            fastest_cagr,
            significant_drivers: results
                .regression
                .as_ref()
                .map(|m| m.significant(SIGNIFICANCE_LEVEL)),
            high_vif: results
                .vif
                .iter()
                .flatten()
                .filter(|v| v.vif > HIGH_VIF)
                .map(|v| v.variable.clone())
                .collect(),
            outliers: results.outliers.clone().unwrap_or_default(),
        }
    }
}

impl fmt::Display for KeyFindings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = "=".repeat(80);
        writeln!(f, "{rule}")?;
        writeln!(f, "KEY FINDINGS")?;
        writeln!(f, "{rule}")?;

        if let Some(h) = &self.highest_om_per_customer {
            writeln!(f, "1. Highest O&M per Customer: {} (${:.2})", h.utility_name, h.value)?;
        }
        if let Some(c) = &self.fastest_cagr {
            writeln!(f, "2. Fastest Cost Growth (CAGR): {} ({:.2}%)", c.utility_name, c.value)?;
        }
        if let Some(drivers) = &self.significant_drivers {
            let list = if drivers.is_empty() {
                "None".to_string()
            } else {
                drivers.join(", ")
            };
            writeln!(f, "3. Statistically Significant Cost Drivers (p < 0.05): {list}")?;
            if !self.high_vif.is_empty() {
                writeln!(
                    f,
                    "   Warning: High multicollinearity (VIF > 10) detected for: {}",
                    self.high_vif.join(", ")
                )?;
            }
        }
        if self.outliers.is_empty() {
            writeln!(f, "4. Outlier Years Flagged: None")?;
        } else {
            writeln!(f, "4. Outlier Years Flagged: {}", self.outliers.len())?;
            for o in self.outliers.iter().take(5) {
                writeln!(
                    f,
                    "   - {} ({}): z-score = {:.2}",
                    o.utility_name, o.report_year, o.z_score
                )?;
            }
        }
        write!(f, "{rule}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratecase_data::Utility;

    fn panel() -> Vec<UtilityYearRecord> {
        let mut records = Vec::new();
        for (k, utility) in Utility::ALL.iter().enumerate() {
            let scale = (k + 1) as f64;
            for (i, year) in (2018..=2023).enumerate() {
                let growth = 1.0 + 0.02 * (k + 1) as f64;
                let mut r = UtilityYearRecord::new(*utility, year);
                let om = 1_000.0 * scale * growth.powi(i as i32);
                let customers = 100.0 * scale + 3.0 * i as f64;
                r.om_total = Some(om);
                r.customers_total = Some(customers);
                r.sales_mwh_total = Some(900.0 * scale + (i * i) as f64 * 7.0 + k as f64 * 11.0);
                r.rate_base = Some(5_000.0 * scale + 150.0 * i as f64 - (k * i) as f64 * 20.0);
                r.om_per_customer = Some(om / customers);
                records.push(r);
            }
        }
        records
    }

    #[test]
    fn test_run_analysis_fills_every_section() {
        let results = run_analysis(&panel());
        assert_eq!(results.trend_results.len(), 3);
        assert!(matches!(results.trend_results["SDG&E"], TrendOutcome::Trend(_)));
        assert!(results.outliers.is_some());
        assert_eq!(results.benchmarks.as_ref().map(Vec::len), Some(3));
        assert_eq!(results.yoy_changes.as_ref().map(Vec::len), Some(18));
        assert!(results.utility_summaries.is_some());
        assert!(results.regression.is_some() || results.regression_error.is_some());
    }

    #[test]
    fn test_failures_are_captured() {
        let records = vec![UtilityYearRecord::new(Utility::PacificGasElectric, 2023)];
        let results = run_analysis(&records);
        assert!(matches!(
            results.trend_results["utility_183"],
            TrendOutcome::Failed { .. }
        ));
        assert!(results.regression_error.is_some());
        assert!(results.benchmarks_error.is_some());
        assert_eq!(results.yoy_changes.as_ref().map(Vec::len), Some(1));
        assert_eq!(results.utility_summaries.as_ref().map(Vec::len), Some(0));
    }

    #[test]
    fn test_key_findings() {
        let results = run_analysis(&panel());
        let findings = KeyFindings::from_results(&results);
        // SDG&E grows at 6% a year, the fastest of the three.
        let fastest = findings.fastest_cagr.as_ref().unwrap();
        assert_eq!(fastest.utility_name, "SDG&E");
        assert!((fastest.value - 6.0).abs() < 1e-9);
        assert!(findings.highest_om_per_customer.is_some());
        assert!(findings.to_string().contains("KEY FINDINGS"));
    }

    #[test]
    fn test_results_serialize_without_empty_sections() {
        let results = run_analysis(&[UtilityYearRecord::new(Utility::PacificGasElectric, 2023)]);
        let json = serde_json::to_value(&results).unwrap();
        assert!(json.get("regression_error").is_some());
        assert!(json.get("regression").is_none());
        assert_eq!(
            json["trend_results"]["utility_183"]["error"],
            "Insufficient data: need at least 2 observations, got 0"
        );
    }
}
