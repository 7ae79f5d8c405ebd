//! Per-utility trend of a metric over report years.

use crate::{
    descriptive::{cagr, check_metric, mean, metric_value, sample_std},
    error::{Result, StatsError},
};
use ratecase_data::UtilityYearRecord;
use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, StudentsT};

/// Simple linear regression of `y` on `x`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinearFit {
    /// Slope
    pub slope: f64,
    /// Intercept
    pub intercept: f64,
    /// Pearson correlation
    pub r_value: f64,
    /// Two-sided p-value of the slope (t distribution, n - 2 df)
    pub p_value: f64,
    /// Standard error of the slope
    pub std_err: f64,
}

/// Fit `y = intercept + slope * x` by least squares.
///
/// With exactly two points the line is exact: the p-value is 0, or 1 when
/// both `y` values are equal.
///
/// # Arguments
/// * `x` - Regressor values
/// * `y` - Response values, same length as `x`
///
/// # Returns
/// * The fit, or an error when there are fewer than two points or every `x`
///   is identical
pub fn linregress(x: &[f64], y: &[f64]) -> Result<LinearFit> {
    let n = x.len().min(y.len());
    if n < 2 {
        return Err(StatsError::InsufficientData {
            required: 2,
            actual: n,
        });
    }
    let (x, y) = (&x[..n], &y[..n]);
    let nf = n as f64;
    let xm = x.iter().sum::<f64>() / nf;
    let ym = y.iter().sum::<f64>() / nf;

    let ssxm = x.iter().map(|v| (v - xm).powi(2)).sum::<f64>() / nf;
    let ssym = y.iter().map(|v| (v - ym).powi(2)).sum::<f64>() / nf;
    let ssxym = x
        .iter()
        .zip(y)
        .map(|(a, b)| (a - xm) * (b - ym))
        .sum::<f64>()
        / nf;
    if ssxm == 0.0 {
        return Err(StatsError::SingularMatrix);
    }

    let r_value = if ssym == 0.0 {
        0.0
    } else {
        (ssxym / (ssxm * ssym).sqrt()).clamp(-1.0, 1.0)
    };
    let slope = ssxym / ssxm;
    let intercept = ym - slope * xm;

    let (p_value, std_err) = if n == 2 {
        (if y[0] == y[1] { 1.0 } else { 0.0 }, 0.0)
    } else {
        let df = nf - 2.0;
        let t = r_value * (df / ((1.0 - r_value) * (1.0 + r_value) + 1e-20)).sqrt();
        let dist = StudentsT::new(0.0, 1.0, df)
            .map_err(|e| StatsError::Distribution(e.to_string()))?;
        let std_err = ((1.0 - r_value * r_value) * ssym / ssxm / df).sqrt();
        (2.0 * dist.sf(t.abs()), std_err)
    };

    Ok(LinearFit {
        slope,
        intercept,
        r_value,
        p_value,
        std_err,
    })
}

/// Trend statistics of one metric for one utility.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendResult {
    /// FERC respondent id
    pub utility_id: i64,
    /// Utility name
    pub utility_name: String,
    /// Metric analyzed
    pub metric: String,
    /// Change per year
    pub slope: f64,
    /// Fitted value at year zero
    pub intercept: f64,
    /// Squared correlation of metric and year
    pub r_squared: f64,
    /// Two-sided p-value of the slope
    pub p_value: f64,
    /// Compound annual growth rate, first to last observed year
    pub cagr_percent: Option<f64>,
    /// Mean
    pub mean: f64,
    /// Sample standard deviation
    pub std: f64,
    /// `std / mean` in percent
    pub coefficient_of_variation: Option<f64>,
    /// Years between first and last observation
    pub n_years: i64,
}

/// Linear trend, CAGR and dispersion of `metric` for one utility.
///
/// Years where the metric is null are dropped before fitting; at least two
/// must remain.
pub fn trend_analysis(
    records: &[UtilityYearRecord],
    utility_id: i64,
    metric: &str,
) -> Result<TrendResult> {
    let mut rows: Vec<&UtilityYearRecord> = records
        .iter()
        .filter(|r| r.utility_id_ferc1 == utility_id)
        .collect();
    if rows.is_empty() {
        return Err(StatsError::InvalidSelector(format!(
            "utility id {utility_id} not found"
        )));
    }
    check_metric(metric)?;
    rows.sort_by_key(|r| r.report_year);

    let mut years = Vec::with_capacity(rows.len());
    let mut values = Vec::with_capacity(rows.len());
    for row in &rows {
        if let Some(v) = metric_value(row, metric)? {
            years.push(row.report_year);
            values.push(v);
        }
    }
    if values.len() < 2 {
        return Err(StatsError::InsufficientData {
            required: 2,
            actual: values.len(),
        });
    }

    let x: Vec<f64> = years.iter().map(|&y| y as f64).collect();
    let fit = linregress(&x, &values)?;

    let n_years = years[years.len() - 1] - years[0];
    let mean_val = mean(&values).unwrap_or_default();
    let std_val = sample_std(&values).unwrap_or_default();

    Ok(TrendResult {
        utility_id,
        utility_name: rows[0].utility_name.clone(),
        metric: metric.to_string(),
        slope: fit.slope,
        intercept: fit.intercept,
        r_squared: fit.r_value * fit.r_value,
        p_value: fit.p_value,
        cagr_percent: cagr(values[0], values[values.len() - 1], n_years as f64),
        mean: mean_val,
        std: std_val,
        coefficient_of_variation: (mean_val != 0.0).then(|| std_val / mean_val * 100.0),
        n_years,
    })
}
