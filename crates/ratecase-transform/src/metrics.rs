//! Derived utility-year metrics.

use crate::{
    error::Result,
    step::{TransformStep, nonzero},
};
use polars::prelude::*;
use ratecase_data::config::AG_ELECTRIC_ALLOCATION;
use serde::{Deserialize, Serialize};

/// Configuration for derived metrics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeriveMetricsConfig {
    /// Share of A&G counted as electric in `grc_om` (default: 0.70)
    pub ag_electric_allocation: f64,
}

impl Default for DeriveMetricsConfig {
    fn default() -> Self {
        Self {
            ag_electric_allocation: AG_ELECTRIC_ALLOCATION,
        }
    }
}

/// Adds `grc_om` and the per-customer and per-MWh ratios.
///
/// A zero or missing denominator yields a null ratio.
#[derive(Debug, Default, Clone)]
pub struct DeriveMetrics {
    config: DeriveMetricsConfig,
}

impl DeriveMetrics {
    /// Create the step with an explicit configuration.
    pub const fn with_config(config: DeriveMetricsConfig) -> Self {
        Self { config }
    }
}

impl TransformStep for DeriveMetrics {
    fn name(&self) -> &str {
        "derive_metrics"
    }

    fn required_columns(&self) -> &[&str] {
        &[
            "om_total",
            "om_distribution",
            "om_customer_service",
            "om_admin_general",
            "rate_base",
            "customers_total",
            "sales_mwh_total",
            "revenue_total_k",
        ]
    }

    fn apply(&self, data: LazyFrame) -> Result<LazyFrame> {
        let customers = || nonzero(col("customers_total").cast(DataType::Float64));
        let sales = nonzero(col("sales_mwh_total").cast(DataType::Float64));

        Ok(data
            .with_column(
                (col("om_distribution")
                    + col("om_customer_service")
                    + col("om_admin_general") * lit(self.config.ag_electric_allocation))
                .alias("grc_om"),
            )
            .with_columns([
                (col("om_total") / customers()).alias("om_per_customer"),
                (col("grc_om") / customers()).alias("grc_om_per_customer"),
                (col("om_total") / sales).alias("om_per_mwh"),
                (col("rate_base") / customers()).alias("rate_base_per_customer"),
                (col("revenue_total_k") * lit(1000.0) / customers()).alias("revenue_per_customer"),
            ]))
    }
}

/// Add `grc_om` and the derived ratio columns.
pub fn derive_metrics(df: &DataFrame) -> Result<DataFrame> {
    DeriveMetrics::default().run(df)
}
