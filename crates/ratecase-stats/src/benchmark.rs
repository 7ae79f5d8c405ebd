//! Peer ranking within one report year.

use crate::{
    descriptive::{check_metric, mean, metric_value, sample_std},
    error::{Result, StatsError},
};
use ratecase_data::UtilityYearRecord;
use serde::{Deserialize, Serialize};

/// One utility's standing among its peers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkRow {
    /// FERC respondent id
    pub utility_id_ferc1: i64,
    /// Utility name
    pub utility_name: String,
    /// Metric ranked
    pub metric: String,
    /// Metric value
    pub value: Option<f64>,
    /// Standardized value against the year's peers
    pub z_score: Option<f64>,
    /// Ascending percentile, average rank for ties
    pub percentile: Option<f64>,
    /// 1 for the highest value, ties share the best rank
    pub rank: Option<usize>,
}

/// Rank utilities on `metric` within `year`.
///
/// Rows with a null value are kept at the end with null statistics.
pub fn peer_benchmark(
    records: &[UtilityYearRecord],
    year: i64,
    metric: &str,
) -> Result<Vec<BenchmarkRow>> {
    check_metric(metric)?;
    let year_rows: Vec<&UtilityYearRecord> =
        records.iter().filter(|r| r.report_year == year).collect();
    if year_rows.is_empty() {
        return Err(StatsError::InvalidSelector(format!("no data for year {year}")));
    }

    let values = year_rows
        .iter()
        .map(|r| metric_value(r, metric))
        .collect::<Result<Vec<Option<f64>>>>()?;
    let valid: Vec<f64> = values.iter().flatten().copied().collect();
    if valid.is_empty() {
        return Err(StatsError::InsufficientData {
            required: 1,
            actual: 0,
        });
    }

    let m = mean(&valid).unwrap_or_default();
    let sd = sample_std(&valid);
    let n = valid.len() as f64;

    let mut rows: Vec<BenchmarkRow> = year_rows
        .iter()
        .zip(&values)
        .map(|(r, value)| {
            let stats = value.map(|v| {
                let below = valid.iter().filter(|&&o| o < v).count() as f64;
                let equal = valid.iter().filter(|&&o| o == v).count() as f64;
                let above = valid.iter().filter(|&&o| o > v).count();
                let z = match sd {
                    Some(s) if s == 0.0 => Some(0.0),
                    Some(s) => Some((v - m) / s),
                    None => None,
                };
                (z, (below + (equal + 1.0) / 2.0) / n * 100.0, above + 1)
            });
            BenchmarkRow {
                utility_id_ferc1: r.utility_id_ferc1,
                utility_name: r.utility_name.clone(),
                metric: metric.to_string(),
                value: *value,
                z_score: stats.and_then(|s| s.0),
                percentile: stats.map(|s| s.1),
                rank: stats.map(|s| s.2),
            }
        })
        .collect();

    rows.sort_by_key(|r| r.rank.unwrap_or(usize::MAX));
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ratecase_data::Utility;

    fn year(values: [Option<f64>; 3]) -> Vec<UtilityYearRecord> {
        Utility::ALL
            .iter()
            .zip(values)
            .map(|(u, v)| {
                let mut r = UtilityYearRecord::new(*u, 2023);
                r.om_per_customer = v;
                r
            })
            .collect()
    }

    #[test]
    fn test_ranks_and_percentiles() {
        let rows = peer_benchmark(&year([Some(10.0), Some(20.0), Some(30.0)]), 2023, "om_per_customer")
            .unwrap();
        let names: Vec<_> = rows.iter().map(|r| r.utility_name.as_str()).collect();
        assert_eq!(names, ["SDG&E", "SCE", "PG&E"]);
        assert_eq!(rows.iter().map(|r| r.rank).collect::<Vec<_>>(), [Some(1), Some(2), Some(3)]);
        assert_relative_eq!(rows[0].percentile.unwrap(), 100.0);
        assert_relative_eq!(rows[1].percentile.unwrap(), 200.0 / 3.0);
        assert_relative_eq!(rows[2].percentile.unwrap(), 100.0 / 3.0);
        assert_relative_eq!(rows[0].z_score.unwrap(), 1.0);
        assert_relative_eq!(rows[2].z_score.unwrap(), -1.0);
    }

    #[test]
    fn test_ties_share_rank() {
        let rows = peer_benchmark(&year([Some(5.0), Some(5.0), Some(1.0)]), 2023, "om_per_customer")
            .unwrap();
        assert_eq!(rows[0].rank, Some(1));
        assert_eq!(rows[1].rank, Some(1));
        assert_eq!(rows[2].rank, Some(3));
        assert_relative_eq!(rows[0].percentile.unwrap(), 2.5 / 3.0 * 100.0);
    }

    #[test]
    fn test_null_value_sorted_last() {
        let rows =
            peer_benchmark(&year([None, Some(2.0), Some(1.0)]), 2023, "om_per_customer").unwrap();
        assert_eq!(rows[2].utility_name, "PG&E");
        assert_eq!(rows[2].rank, None);
        assert_relative_eq!(rows[1].percentile.unwrap(), 50.0);
    }

    #[test]
    fn test_errors() {
        let records = year([None, None, None]);
        assert!(matches!(
            peer_benchmark(&records, 2023, "om_per_customer"),
            Err(StatsError::InsufficientData { .. })
        ));
        assert!(matches!(
            peer_benchmark(&records, 2019, "om_per_customer"),
            Err(StatsError::InvalidSelector(_))
        ));
        assert!(matches!(
            peer_benchmark(&records, 2023, "bogus"),
            Err(StatsError::InvalidSelector(_))
        ));
    }
}
