//! Per-utility descriptive statistics.

use crate::{
    descriptive::{cagr, mean, metric_value, sample_std},
    error::{Result, StatsError},
};
use ratecase_data::UtilityYearRecord;
use serde::{Deserialize, Serialize};

/// Metrics summarized by [`summary_by_utility`].
pub const SUMMARY_METRICS: [&str; 4] = ["om_total", "om_per_customer", "om_per_mwh", "rate_base"];

/// Summary of one metric for one utility.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UtilitySummary {
    /// FERC respondent id
    pub utility_id_ferc1: i64,
    /// Utility name
    pub utility_name: String,
    /// Metric summarized
    pub metric: String,
    /// Mean
    pub mean: f64,
    /// Sample standard deviation
    pub std: f64,
    /// Minimum
    pub min: f64,
    /// Maximum
    pub max: f64,
    /// Compound annual growth rate, first to last observed value over the
    /// utility's report-year span
    pub cagr_percent: Option<f64>,
    /// Years between the utility's first and last report year
    pub n_years: i64,
}

/// Mean, spread, range and CAGR of the headline metrics for each utility.
///
/// Utilities appear in first-seen order. Metrics with fewer than two values
/// for a utility are skipped. The year span counts every report year of the
/// utility, including years where the metric is null.
pub fn summary_by_utility(records: &[UtilityYearRecord]) -> Result<Vec<UtilitySummary>> {
    if records.is_empty() {
        return Err(StatsError::InsufficientData {
            required: 1,
            actual: 0,
        });
    }

    let mut utility_ids: Vec<i64> = Vec::new();
    for r in records {
        if !utility_ids.contains(&r.utility_id_ferc1) {
            utility_ids.push(r.utility_id_ferc1);
        }
    }

    let mut out = Vec::new();
    for id in utility_ids {
        let mut rows: Vec<&UtilityYearRecord> =
            records.iter().filter(|r| r.utility_id_ferc1 == id).collect();
        let utility_name = rows[0].utility_name.clone();
        rows.sort_by_key(|r| r.report_year);
        let n_years = rows[rows.len() - 1].report_year - rows[0].report_year;

        for metric in SUMMARY_METRICS {
            let mut observed = Vec::new();
            for r in &rows {
                if let Some(v) = metric_value(r, metric)? {
                    observed.push(v);
                }
            }
            if observed.len() < 2 {
                continue;
            }
            let first = observed[0];
            let last = observed[observed.len() - 1];

            out.push(UtilitySummary {
                utility_id_ferc1: id,
                utility_name: utility_name.clone(),
                metric: metric.to_string(),
                mean: mean(&observed).unwrap_or_default(),
                std: sample_std(&observed).unwrap_or_default(),
                min: observed.iter().copied().fold(f64::INFINITY, f64::min),
                max: observed.iter().copied().fold(f64::NEG_INFINITY, f64::max),
                cagr_percent: cagr(first, last, n_years as f64),
                n_years,
            });
        }
    }
    Ok(out)
}
