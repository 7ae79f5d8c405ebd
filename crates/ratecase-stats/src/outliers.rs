//! Z-score outlier flags.

use crate::{
    descriptive::{check_metric, mean, metric_value, sample_std},
    error::Result,
};
use ratecase_data::UtilityYearRecord;
use serde::{Deserialize, Serialize};

/// Default absolute z-score above which a value is flagged.
pub const DEFAULT_Z_THRESHOLD: f64 = 2.0;

/// A flagged utility-year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutlierRow {
    /// FERC respondent id
    pub utility_id_ferc1: i64,
    /// Utility name
    pub utility_name: String,
    /// Report year
    pub report_year: i64,
    /// Metric analyzed
    pub metric: String,
    /// Metric value
    pub value: f64,
    /// Standardized value
    pub z_score: f64,
}

/// Rows whose `metric` lies more than `threshold` sample standard deviations
/// from the panel mean.
///
/// Null values are ignored. A panel with zero (or undefined) spread flags
/// nothing.
pub fn detect_outliers(
    records: &[UtilityYearRecord],
    metric: &str,
    threshold: f64,
) -> Result<Vec<OutlierRow>> {
    check_metric(metric)?;

    let observed = records
        .iter()
        .filter_map(|r| metric_value(r, metric).ok().flatten().map(|v| (r, v)))
        .collect::<Vec<_>>();
    let values: Vec<f64> = observed.iter().map(|(_, v)| *v).collect();

    let (Some(m), Some(sd)) = (mean(&values), sample_std(&values)) else {
        return Ok(Vec::new());
    };
    if sd == 0.0 {
        return Ok(Vec::new());
    }

    Ok(observed
        .into_iter()
        .filter_map(|(r, value)| {
            let z_score = (value - m) / sd;
            (z_score.abs() > threshold).then(|| OutlierRow {
                utility_id_ferc1: r.utility_id_ferc1,
                utility_name: r.utility_name.clone(),
                report_year: r.report_year,
                metric: metric.to_string(),
                value,
                z_score,
            })
        })
        .collect())
}
