//! Year-over-year percent change.

use crate::{
    descriptive::{check_metric, metric_value},
    error::Result,
};
use ratecase_data::UtilityYearRecord;
use serde::{Deserialize, Serialize};

/// Metric value of one utility-year with its change from the prior row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YoyRow {
    /// FERC respondent id
    pub utility_id_ferc1: i64,
    /// Utility name
    pub utility_name: String,
    /// Report year
    pub report_year: i64,
    /// Metric value
    pub metric_value: Option<f64>,
    /// `(value - prev) / |prev| * 100`
    pub yoy_pct_change: Option<f64>,
}

/// Percent change of `metric` against each utility's previous report year.
///
/// The change is null for a utility's first row and whenever the previous
/// value is null or zero.
pub fn calculate_yoy_change(records: &[UtilityYearRecord], metric: &str) -> Result<Vec<YoyRow>> {
    check_metric(metric)?;
    let mut sorted: Vec<&UtilityYearRecord> = records.iter().collect();
    sorted.sort_by_key(|r| (r.utility_id_ferc1, r.report_year));

    let mut rows = Vec::with_capacity(sorted.len());
    let mut previous: Option<(i64, Option<f64>)> = None;
    for record in sorted {
        let value = metric_value(record, metric)?;
        let prev = previous
            .filter(|(id, _)| *id == record.utility_id_ferc1)
            .and_then(|(_, v)| v);
        let yoy_pct_change = match (value, prev) {
            (Some(v), Some(p)) if p != 0.0 => Some((v - p) / p.abs() * 100.0),
            _ => None,
        };
        rows.push(YoyRow {
            utility_id_ferc1: record.utility_id_ferc1,
            utility_name: record.utility_name.clone(),
            report_year: record.report_year,
            metric_value: value,
            yoy_pct_change,
        });
        previous = Some((record.utility_id_ferc1, value));
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ratecase_data::Utility;

    fn rec(utility: Utility, year: i64, v: Option<f64>) -> UtilityYearRecord {
        let mut r = UtilityYearRecord::new(utility, year);
        r.om_total = v;
        r
    }

    #[test]
    fn test_yoy() {
        let records = vec![
            rec(Utility::PacificGasElectric, 2020, Some(110.0)),
            rec(Utility::PacificGasElectric, 2019, Some(100.0)),
            rec(Utility::SouthernCaliforniaEdison, 2019, Some(-50.0)),
            rec(Utility::SouthernCaliforniaEdison, 2020, Some(-25.0)),
            rec(Utility::SouthernCaliforniaEdison, 2021, Some(0.0)),
            rec(Utility::SouthernCaliforniaEdison, 2022, Some(10.0)),
            rec(Utility::SouthernCaliforniaEdison, 2023, None),
        ];
        let rows = calculate_yoy_change(&records, "om_total").unwrap();

        // SCE (155) sorts before PG&E (183).
        assert_eq!(rows[0].utility_name, "SCE");
        assert_eq!(rows[0].yoy_pct_change, None);
        assert_relative_eq!(rows[1].yoy_pct_change.unwrap(), 50.0);
        assert_relative_eq!(rows[2].yoy_pct_change.unwrap(), 100.0);
        assert_eq!(rows[3].yoy_pct_change, None);
        assert_eq!(rows[4].yoy_pct_change, None);

        assert_eq!(rows[5].report_year, 2019);
        assert_eq!(rows[5].yoy_pct_change, None);
        assert_relative_eq!(rows[6].yoy_pct_change.unwrap(), 10.0);
    }
}
