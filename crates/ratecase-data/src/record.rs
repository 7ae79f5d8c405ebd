//! Typed rows of the analysis-ready table.

use crate::{
    error::{DataError, Result, column_names, require_columns},
    universe::Utility,
};
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Identity columns every analysis-ready frame must carry.
pub const KEY_COLUMNS: [&str; 4] = [
    "utility_id_ferc1",
    "utility_id_eia",
    "utility_name",
    "report_year",
];

/// Numeric columns of the analysis-ready table, in output order.
pub const VALUE_COLUMNS: [&str; 27] = [
    "om_production",
    "om_transmission",
    "om_distribution",
    "om_customer_service",
    "om_admin_general",
    "om_other",
    "om_total",
    "grc_om",
    "rate_base",
    "operating_revenues_ferc",
    "sales_mwh_residential",
    "sales_mwh_commercial",
    "sales_mwh_industrial",
    "sales_mwh_total",
    "customers_residential",
    "customers_commercial",
    "customers_industrial",
    "customers_total",
    "revenue_residential_k",
    "revenue_commercial_k",
    "revenue_industrial_k",
    "revenue_total_k",
    "om_per_customer",
    "grc_om_per_customer",
    "om_per_mwh",
    "rate_base_per_customer",
    "revenue_per_customer",
];

/// One utility-year of joined FERC and EIA data.
///
/// Every measurement is optional; a missing source value stays `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UtilityYearRecord {
    /// FERC Form 1 respondent id
    pub utility_id_ferc1: i64,
    /// EIA utility number
    pub utility_id_eia: i64,
    /// Short utility name (`PG&E`, `SCE`, `SDG&E`)
    pub utility_name: String,
    /// Report year
    pub report_year: i64,

    /// Production O&M (accounts 500-557)
    pub om_production: Option<f64>,
    /// Transmission O&M (accounts 560-574)
    pub om_transmission: Option<f64>,
    /// Distribution O&M (accounts 580-598)
    pub om_distribution: Option<f64>,
    /// Customer service O&M (accounts 901-910)
    pub om_customer_service: Option<f64>,
    /// Administrative & general O&M (accounts 920-935)
    pub om_admin_general: Option<f64>,
    /// Accounts outside every band
    pub om_other: Option<f64>,
    /// Sum of the six O&M categories
    pub om_total: Option<f64>,
    /// Distribution + customer service + electric share of A&G
    pub grc_om: Option<f64>,
    /// Plant in service less accumulated depreciation
    pub rate_base: Option<f64>,
    /// Account 400 operating revenues
    pub operating_revenues_ferc: Option<f64>,

    /// Residential sales (MWh)
    pub sales_mwh_residential: Option<f64>,
    /// Commercial sales (MWh)
    pub sales_mwh_commercial: Option<f64>,
    /// Industrial sales (MWh)
    pub sales_mwh_industrial: Option<f64>,
    /// Total sales (MWh)
    pub sales_mwh_total: Option<f64>,
    /// Residential customer count
    pub customers_residential: Option<f64>,
    /// Commercial customer count
    pub customers_commercial: Option<f64>,
    /// Industrial customer count
    pub customers_industrial: Option<f64>,
    /// Total customer count
    pub customers_total: Option<f64>,
    /// Residential revenue (thousand dollars)
    pub revenue_residential_k: Option<f64>,
    /// Commercial revenue (thousand dollars)
    pub revenue_commercial_k: Option<f64>,
    /// Industrial revenue (thousand dollars)
    pub revenue_industrial_k: Option<f64>,
    /// Total revenue (thousand dollars)
    pub revenue_total_k: Option<f64>,

    /// `om_total / customers_total`
    pub om_per_customer: Option<f64>,
    /// `grc_om / customers_total`
    pub grc_om_per_customer: Option<f64>,
    /// `om_total / sales_mwh_total`
    pub om_per_mwh: Option<f64>,
    /// `rate_base / customers_total`
    pub rate_base_per_customer: Option<f64>,
    /// `revenue_total_k * 1000 / customers_total`
    pub revenue_per_customer: Option<f64>,
}

impl UtilityYearRecord {
    /// Create a record with identity fields set and every measurement missing.
    pub fn new(utility: Utility, report_year: i64) -> Self {
        Self {
            utility_id_ferc1: utility.ferc_id(),
            utility_id_eia: utility.eia_id(),
            utility_name: utility.name().to_string(),
            report_year,
            ..Default::default()
        }
    }

    /// The target utility this record belongs to.
    pub const fn utility(&self) -> Option<Utility> {
        Utility::from_ferc_id(self.utility_id_ferc1)
    }

    /// Look up a numeric column by name.
    ///
    /// Returns `None` for unknown names and `Some(None)` for a missing value.
    pub fn metric(&self, name: &str) -> Option<Option<f64>> {
        let value = match name {
            "om_production" => self.om_production,
            "om_transmission" => self.om_transmission,
            "om_distribution" => self.om_distribution,
            "om_customer_service" => self.om_customer_service,
            "om_admin_general" => self.om_admin_general,
            "om_other" => self.om_other,
            "om_total" => self.om_total,
            "grc_om" => self.grc_om,
            "rate_base" => self.rate_base,
            "operating_revenues_ferc" => self.operating_revenues_ferc,
            "sales_mwh_residential" => self.sales_mwh_residential,
            "sales_mwh_commercial" => self.sales_mwh_commercial,
            "sales_mwh_industrial" => self.sales_mwh_industrial,
            "sales_mwh_total" => self.sales_mwh_total,
            "customers_residential" => self.customers_residential,
            "customers_commercial" => self.customers_commercial,
            "customers_industrial" => self.customers_industrial,
            "customers_total" => self.customers_total,
            "revenue_residential_k" => self.revenue_residential_k,
            "revenue_commercial_k" => self.revenue_commercial_k,
            "revenue_industrial_k" => self.revenue_industrial_k,
            "revenue_total_k" => self.revenue_total_k,
            "om_per_customer" => self.om_per_customer,
            "grc_om_per_customer" => self.grc_om_per_customer,
            "om_per_mwh" => self.om_per_mwh,
            "rate_base_per_customer" => self.rate_base_per_customer,
            "revenue_per_customer" => self.revenue_per_customer,
            _ => return None,
        };
        Some(value)
    }

    /// Mutable access to a numeric column by name.
    pub fn metric_mut(&mut self, name: &str) -> Option<&mut Option<f64>> {
        let slot = match name {
            "om_production" => &mut self.om_production,
            "om_transmission" => &mut self.om_transmission,
            "om_distribution" => &mut self.om_distribution,
            "om_customer_service" => &mut self.om_customer_service,
            "om_admin_general" => &mut self.om_admin_general,
            "om_other" => &mut self.om_other,
            "om_total" => &mut self.om_total,
            "grc_om" => &mut self.grc_om,
            "rate_base" => &mut self.rate_base,
            "operating_revenues_ferc" => &mut self.operating_revenues_ferc,
            "sales_mwh_residential" => &mut self.sales_mwh_residential,
            "sales_mwh_commercial" => &mut self.sales_mwh_commercial,
            "sales_mwh_industrial" => &mut self.sales_mwh_industrial,
            "sales_mwh_total" => &mut self.sales_mwh_total,
            "customers_residential" => &mut self.customers_residential,
            "customers_commercial" => &mut self.customers_commercial,
            "customers_industrial" => &mut self.customers_industrial,
            "customers_total" => &mut self.customers_total,
            "revenue_residential_k" => &mut self.revenue_residential_k,
            "revenue_commercial_k" => &mut self.revenue_commercial_k,
            "revenue_industrial_k" => &mut self.revenue_industrial_k,
            "revenue_total_k" => &mut self.revenue_total_k,
            "om_per_customer" => &mut self.om_per_customer,
            "grc_om_per_customer" => &mut self.grc_om_per_customer,
            "om_per_mwh" => &mut self.om_per_mwh,
            "rate_base_per_customer" => &mut self.rate_base_per_customer,
            "revenue_per_customer" => &mut self.revenue_per_customer,
            _ => return None,
        };
        Some(slot)
    }
}

fn key_column(df: &DataFrame, name: &str) -> Result<Int64Chunked> {
    Ok(df.column(name)?.cast(&DataType::Int64)?.i64()?.clone())
}

fn required_key(values: &Int64Chunked, name: &str, row: usize) -> Result<i64> {
    values
        .get(row)
        .ok_or_else(|| DataError::InvalidParameter(format!("null {name} in row {row}")))
}

/// Convert an analysis-ready frame into typed records.
///
/// The identity columns are required; numeric columns absent from the frame
/// leave the corresponding fields `None`.
pub fn records_from_frame(df: &DataFrame) -> Result<Vec<UtilityYearRecord>> {
    let names = column_names(df);
    require_columns(&KEY_COLUMNS, &names)?;

    let ferc_ids = key_column(df, "utility_id_ferc1")?;
    let eia_ids = key_column(df, "utility_id_eia")?;
    let years = key_column(df, "report_year")?;
    let utility_names = df.column("utility_name")?.cast(&DataType::String)?;
    let utility_names = utility_names.str()?;

    let values = VALUE_COLUMNS
        .iter()
        .filter(|name| names.iter().any(|n| n == *name))
        .map(|&name| {
            let column = df.column(name)?.cast(&DataType::Float64)?;
            Ok((name, column.f64()?.clone()))
        })
        .collect::<Result<Vec<_>>>()?;

    (0..df.height())
        .map(|row| {
            let utility_id_ferc1 = required_key(&ferc_ids, "utility_id_ferc1", row)?;
            let utility_name = utility_names
                .get(row)
                .map(str::to_string)
                .or_else(|| Utility::from_ferc_id(utility_id_ferc1).map(|u| u.name().to_string()))
                .unwrap_or_default();

            let mut record = UtilityYearRecord {
                utility_id_ferc1,
                utility_id_eia: required_key(&eia_ids, "utility_id_eia", row)?,
                utility_name,
                report_year: required_key(&years, "report_year", row)?,
                ..Default::default()
            };
            for (name, column) in &values {
                if let Some(slot) = record.metric_mut(name) {
                    *slot = column.get(row).filter(|v| v.is_finite());
                }
            }
            Ok(record)
        })
        .collect()
}

/// Convert typed records back into a frame with every key and value column.
pub fn records_to_frame(records: &[UtilityYearRecord]) -> Result<DataFrame> {
    let mut columns = vec![
        Column::new(
            "utility_id_ferc1".into(),
            records.iter().map(|r| r.utility_id_ferc1).collect::<Vec<_>>(),
        ),
        Column::new(
            "utility_id_eia".into(),
            records.iter().map(|r| r.utility_id_eia).collect::<Vec<_>>(),
        ),
        Column::new(
            "utility_name".into(),
            records
                .iter()
                .map(|r| r.utility_name.as_str())
                .collect::<Vec<_>>(),
        ),
        Column::new(
            "report_year".into(),
            records.iter().map(|r| r.report_year).collect::<Vec<_>>(),
        ),
    ];
    for name in VALUE_COLUMNS {
        columns.push(Column::new(
            name.into(),
            records
                .iter()
                .map(|r| r.metric(name).flatten())
                .collect::<Vec<_>>(),
        ));
    }
    Ok(DataFrame::new(columns)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_lookup_covers_every_value_column() {
        let mut record = UtilityYearRecord::new(Utility::SouthernCaliforniaEdison, 2020);
        for (i, name) in VALUE_COLUMNS.iter().enumerate() {
            *record.metric_mut(name).unwrap() = Some(i as f64);
        }
        for (i, name) in VALUE_COLUMNS.iter().enumerate() {
            assert_eq!(record.metric(name), Some(Some(i as f64)));
        }
        assert_eq!(record.metric("not_a_column"), None);
    }

    #[test]
    fn test_from_frame_with_partial_columns() {
        let df = df! {
            "utility_id_ferc1" => [183i64, 155],
            "utility_id_eia" => [14328i64, 17609],
            "utility_name" => [Some("PG&E"), None],
            "report_year" => [2022i32, 2022],
            "om_total" => [Some(100.0), None],
            "customers_total" => [5_000_000i64, 4_000_000],
        }
        .unwrap();

        let records = records_from_frame(&df).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].report_year, 2022);
        assert_eq!(records[0].om_total, Some(100.0));
        assert_eq!(records[1].om_total, None);
        assert_eq!(records[1].utility_name, "SCE");
        assert_eq!(records[1].customers_total, Some(4_000_000.0));
        assert_eq!(records[0].rate_base, None);
    }

    #[test]
    fn test_from_frame_requires_keys() {
        let df = df! { "utility_id_ferc1" => [183i64], "report_year" => [2020i64] }.unwrap();
        match records_from_frame(&df).unwrap_err() {
            DataError::MissingColumn { columns } => {
                assert_eq!(columns, vec!["utility_id_eia", "utility_name"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_to_frame_layout() {
        let mut record = UtilityYearRecord::new(Utility::SanDiegoGasElectric, 2019);
        record.rate_base = Some(-5.0);
        let df = records_to_frame(&[record]).unwrap();
        assert_eq!(df.width(), KEY_COLUMNS.len() + VALUE_COLUMNS.len());
        let rate_base = df.column("rate_base").unwrap().f64().unwrap();
        assert_eq!(rate_base.get(0), Some(-5.0));
        assert_eq!(df.column("om_total").unwrap().null_count(), 1);
    }
}
