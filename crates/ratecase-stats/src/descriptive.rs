//! Descriptive statistics shared by the analyses.

use crate::error::{Result, StatsError};
use ratecase_data::UtilityYearRecord;

/// Arithmetic mean, `None` for an empty slice.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample standard deviation (`ddof = 1`), `None` below two values.
pub fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let ss: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    Some((ss / (values.len() - 1) as f64).sqrt())
}

/// Compound annual growth rate in percent.
///
/// `((last / first)^(1 / n_years) - 1) * 100`; `None` when `first` is not
/// positive or the span is empty.
pub fn cagr(first: f64, last: f64, n_years: f64) -> Option<f64> {
    if first <= 0.0 || n_years <= 0.0 {
        return None;
    }
    Some(((last / first).powf(1.0 / n_years) - 1.0) * 100.0)
}

/// Value of `metric` on a record, or [`StatsError::InvalidSelector`] for an
/// unknown metric name.
pub fn metric_value(record: &UtilityYearRecord, metric: &str) -> Result<Option<f64>> {
    record
        .metric(metric)
        .map(|v| v.filter(|x| x.is_finite()))
        .ok_or_else(|| StatsError::InvalidSelector(format!("metric {metric} not found")))
}

/// Fail with [`StatsError::InvalidSelector`] unless `metric` is a record
/// column.
pub fn check_metric(metric: &str) -> Result<()> {
    metric_value(&UtilityYearRecord::default(), metric).map(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    #[test]
    fn test_mean_and_std() {
        let v = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert_relative_eq!(mean(&v).unwrap(), 5.0);
        assert_relative_eq!(sample_std(&v).unwrap(), (32.0_f64 / 7.0).sqrt());
        assert_eq!(sample_std(&[1.0]), None);
        assert_eq!(mean(&[]), None);
    }

    #[test]
    fn test_cagr() {
        assert_relative_eq!(cagr(100.0, 133.1, 3.0).unwrap(), 10.0, epsilon = 1e-9);
        assert_relative_eq!(cagr(100.0, 81.0, 2.0).unwrap(), -10.0, epsilon = 1e-9);
    }

    #[rstest]
    #[case(0.0, 10.0, 1.0)]
    #[case(-5.0, 10.0, 1.0)]
    #[case(5.0, 10.0, 0.0)]
    fn test_cagr_undefined(#[case] first: f64, #[case] last: f64, #[case] n: f64) {
        assert_eq!(cagr(first, last, n), None);
    }

    #[test]
    fn test_metric_lookup() {
        let mut r = UtilityYearRecord::default();
        r.om_total = Some(f64::NAN);
        r.rate_base = Some(3.0);
        assert_eq!(metric_value(&r, "rate_base").unwrap(), Some(3.0));
        assert_eq!(metric_value(&r, "om_total").unwrap(), None);
        assert!(matches!(
            check_metric("om_per_widget"),
            Err(StatsError::InvalidSelector(_))
        ));
    }
}
