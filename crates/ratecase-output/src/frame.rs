//! Typed rows to polars frames, and parquet I/O.

use crate::export::{ExportError, Result};
use polars::prelude::*;
use ratecase_data::{UtilityYearRecord, records_to_frame};
use ratecase_revenue::{BillImpact, RevenueRequirementRow};
use std::{fs::File, path::Path};
use tracing::info;

/// Conversion of a row collection into a [`DataFrame`].
pub trait ToFrame {
    /// Build a frame with one row per element.
    fn to_frame(&self) -> Result<DataFrame>;
}

fn f64_col<T>(name: &str, rows: &[T], get: impl Fn(&T) -> f64) -> Column {
    Column::new(name.into(), rows.iter().map(get).collect::<Vec<_>>())
}

fn opt_col<T>(name: &str, rows: &[T], get: impl Fn(&T) -> Option<f64>) -> Column {
    Column::new(name.into(), rows.iter().map(get).collect::<Vec<_>>())
}

impl ToFrame for [UtilityYearRecord] {
    fn to_frame(&self) -> Result<DataFrame> {
        Ok(records_to_frame(self)?)
    }
}

impl ToFrame for [RevenueRequirementRow] {
    fn to_frame(&self) -> Result<DataFrame> {
        let records: Vec<UtilityYearRecord> = self.iter().map(|r| r.record.clone()).collect();
        let mut df = records_to_frame(&records)?;

        let columns: [(&str, fn(&RevenueRequirementRow) -> Option<f64>); 15] = [
            ("depreciation", |r| r.depreciation),
            ("return_on_rate_base", |r| r.return_on_rate_base),
            ("taxes", |r| r.taxes),
            ("revenue_requirement", |r| r.revenue_requirement),
            ("actual_revenue", |r| r.actual_revenue),
            ("revenue_gap", |r| r.revenue_gap),
            ("revenue_gap_pct", |r| r.revenue_gap_pct),
            ("om_grc", |r| r.om_grc),
            ("om_ag_electric", |r| r.om_ag_electric),
            ("om_excluded", |r| r.om_excluded),
            ("taxes_grc", |r| r.taxes_grc),
            ("revenue_requirement_grc", |r| r.revenue_requirement_grc),
            ("om_per_customer_grc", |r| r.om_per_customer_grc),
            ("om_per_mwh_grc", |r| r.om_per_mwh_grc),
            ("grc_share_pct", |r| {
                r.revenue_requirement_grc
                    .zip(r.revenue_requirement)
                    .filter(|(_, total)| *total > 0.0)
                    .map(|(grc, total)| grc / total * 100.0)
            }),
        ];
        for (name, get) in columns {
            df.with_column(opt_col(name, self, get))?;
        }
        Ok(df)
    }
}

impl ToFrame for [BillImpact] {
    fn to_frame(&self) -> Result<DataFrame> {
        let rows = self;
        Ok(DataFrame::new(vec![
            Column::new(
                "utility_id_ferc1".into(),
                rows.iter().map(|r| r.utility_id_ferc1).collect::<Vec<_>>(),
            ),
            Column::new(
                "utility_name".into(),
                rows.iter().map(|r| r.utility_name.as_str()).collect::<Vec<_>>(),
            ),
            Column::new(
                "base_year".into(),
                rows.iter().map(|r| r.base_year).collect::<Vec<_>>(),
            ),
            f64_col("residential_share", rows, |r| r.residential_share),
            f64_col("residential_share_pct", rows, |r| r.residential_share_pct),
            f64_col("current_rr", rows, |r| r.current_rr),
            f64_col("proposed_rr", rows, |r| r.proposed_rr),
            f64_col("current_rate_per_kwh", rows, |r| r.current_rate_per_kwh),
            f64_col("proposed_rate_per_kwh", rows, |r| r.proposed_rate_per_kwh),
            f64_col("current_monthly_bill", rows, |r| r.current_monthly_bill),
            f64_col("proposed_monthly_bill", rows, |r| r.proposed_monthly_bill),
            f64_col("monthly_change_dollars", rows, |r| r.monthly_change_dollars),
            f64_col("monthly_change_pct", rows, |r| r.monthly_change_pct),
            f64_col("annual_change_dollars", rows, |r| r.annual_change_dollars),
            f64_col("avg_monthly_kwh", rows, |r| r.avg_monthly_kwh),
            f64_col("om_escalation", rows, |r| r.om_escalation),
            f64_col("rate_base_growth", rows, |r| r.rate_base_growth),
        ])?)
    }
}

/// Write a frame to parquet, creating the parent directory.
pub fn write_parquet(df: &mut DataFrame, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut file = File::create(path)?;
    ParquetWriter::new(&mut file).finish(df)?;
    info!(path = %path.display(), rows = df.height(), "Wrote parquet");
    Ok(())
}

/// Convert rows and write them to parquet.
pub fn write_rows<R: ToFrame + ?Sized>(rows: &R, path: &Path) -> Result<DataFrame> {
    let mut df = rows.to_frame()?;
    write_parquet(&mut df, path)?;
    Ok(df)
}

/// Float column as options, casting integer columns.
pub fn f64_values(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>> {
    let column = df.column(name)?.cast(&DataType::Float64)?;
    Ok(column.f64()?.into_iter().collect())
}

/// Integer column as options.
pub fn i64_values(df: &DataFrame, name: &str) -> Result<Vec<Option<i64>>> {
    let column = df.column(name)?.cast(&DataType::Int64)?;
    Ok(column.i64()?.into_iter().collect())
}

/// String column, with nulls as empty strings.
pub fn string_values(df: &DataFrame, name: &str) -> Result<Vec<String>> {
    let column = df.column(name)?.cast(&DataType::String)?;
    Ok(column
        .str()?
        .into_iter()
        .map(|s| s.unwrap_or_default().to_string())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratecase_data::{Utility, read_parquet};
    use ratecase_revenue::apply_rr_to_dataset;

    fn record() -> UtilityYearRecord {
        let mut r = UtilityYearRecord::new(Utility::PacificGasElectric, 2023);
        r.om_total = Some(1_000.0);
        r.om_other = Some(0.0);
        r.rate_base = Some(10_000.0);
        r.operating_revenues_ferc = Some(2_000.0);
        r
    }

    #[test]
    fn test_rr_frame_columns() {
        let rows = apply_rr_to_dataset(&[record()]).unwrap();
        let df = rows.to_frame().unwrap();
        assert_eq!(df.height(), 1);
        for name in ["om_total", "revenue_requirement", "revenue_gap", "revenue_requirement_grc"] {
            assert!(df.column(name).is_ok(), "missing {name}");
        }
        let gap = f64_values(&df, "revenue_gap").unwrap();
        assert!((gap[0].unwrap() - (2_100.0 / 0.73 - 2_000.0)).abs() < 1e-6);
        assert_eq!(f64_values(&df, "revenue_requirement_grc").unwrap(), vec![None]);
    }

    #[test]
    fn test_parquet_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("rr.parquet");
        let rows = apply_rr_to_dataset(&[record()]).unwrap();
        write_rows(rows.as_slice(), &path).unwrap();

        let back = read_parquet(&path).unwrap();
        assert_eq!(string_values(&back, "utility_name").unwrap(), ["PG&E"]);
        assert_eq!(i64_values(&back, "report_year").unwrap(), [Some(2023)]);
    }
}
