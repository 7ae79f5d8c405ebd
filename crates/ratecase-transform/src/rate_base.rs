//! Net plant rate base.

use crate::{error::Result, step::TransformStep};
use polars::prelude::*;

/// Adds `rate_base = utility_plant_in_service - accumulated_provision_for_depreciation`.
///
/// No floor is applied; a negative rate base is kept as reported and a
/// missing balance yields a null.
#[derive(Debug, Default, Clone, Copy)]
pub struct RateBase;

impl TransformStep for RateBase {
    fn name(&self) -> &str {
        "rate_base"
    }

    fn required_columns(&self) -> &[&str] {
        &[
            "utility_plant_in_service",
            "accumulated_provision_for_depreciation",
        ]
    }

    fn apply(&self, data: LazyFrame) -> Result<LazyFrame> {
        Ok(data.with_column(
            (col("utility_plant_in_service").cast(DataType::Float64)
                - col("accumulated_provision_for_depreciation").cast(DataType::Float64))
            .alias("rate_base"),
        ))
    }
}

/// Add the `rate_base` column to a utility plant frame.
pub fn calculate_rate_base(df: &DataFrame) -> Result<DataFrame> {
    RateBase.run(df)
}
