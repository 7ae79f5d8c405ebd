//! The complete transform chain.

use crate::{
    categorize::CategorizeExpenses,
    error::Result,
    expenses::PivotExpenses,
    join::join_ferc_eia_data,
    metrics::DeriveMetrics,
    rate_base::RateBase,
    step::TransformStep,
    validate::{select_final_columns, validate_output},
};
use polars::prelude::*;
use tracing::info;

/// Extracted frames feeding the transform chain.
#[derive(Debug, Clone)]
pub struct TransformInputs {
    /// Target-utility EIA rows, one per utility-year
    pub eia: DataFrame,
    /// Reported FERC operating expense rows
    pub operating_expenses: DataFrame,
    /// FERC plant balances, one row per utility-year
    pub utility_plant: DataFrame,
    /// FERC operating revenues, when available
    pub operating_revenues: Option<DataFrame>,
}

/// Categorize, pivot, compute rate base, join, derive metrics, select and
/// validate, returning the analysis-ready frame.
pub fn build_analysis_ready(inputs: &TransformInputs) -> Result<DataFrame> {
    let categorized = CategorizeExpenses.run(&inputs.operating_expenses)?;
    let wide = PivotExpenses.run(&categorized)?;
    info!(rows = wide.height(), "Pivoted operating expenses");

    let plant = RateBase.run(&inputs.utility_plant)?;
    let joined = join_ferc_eia_data(
        &wide,
        &plant,
        &inputs.eia,
        inputs.operating_revenues.as_ref(),
    )?;

    let derived = DeriveMetrics::default().run(&joined)?;
    let output = select_final_columns(&derived)?;
    validate_output(&output)?;

    info!(
        rows = output.height(),
        columns = output.width(),
        "Built analysis-ready table"
    );
    Ok(output)
}
