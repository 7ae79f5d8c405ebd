//! Linking FERC and EIA frames through the utility crosswalk.

use crate::error::{Result, TransformError};
use polars::prelude::*;
use ratecase_data::{
    Utility,
    error::{column_names, missing_from},
};
use tracing::info;

const FERC_KEYS: [&str; 2] = ["utility_id_ferc1", "report_year"];
const EIA_KEYS: [&str; 2] = ["utility_id_eia", "report_year"];

fn require(df: &DataFrame, required: &[&str]) -> Result<()> {
    let missing = missing_from(required, &column_names(df));
    if missing.is_empty() {
        Ok(())
    } else {
        Err(TransformError::MissingColumn {
            columns: missing.into_iter().map(String::from).collect(),
        })
    }
}

fn keyed(df: &DataFrame, keys: [&str; 2]) -> LazyFrame {
    df.clone().lazy().with_columns([
        col(keys[0]).cast(DataType::Int64),
        col(keys[1]).cast(DataType::Int64),
    ])
}

fn on(keys: [&str; 2]) -> [Expr; 2] {
    [col(keys[0]), col(keys[1])]
}

fn full_outer() -> JoinArgs {
    JoinArgs::new(JoinType::Full).with_coalesce(JoinCoalesce::CoalesceColumns)
}

/// Join wide expenses, rate base, optional FERC revenues and EIA data.
///
/// Expenses and plant are full-outer joined on FERC id and year, revenues are
/// left-joined onto that, the crosswalk supplies the EIA id, and the EIA data
/// is full-outer joined on EIA id and year. `utility_name` takes the
/// crosswalk name and falls back to the EIA name.
pub fn join_ferc_eia_data(
    expenses: &DataFrame,
    plant: &DataFrame,
    eia: &DataFrame,
    revenues: Option<&DataFrame>,
) -> Result<DataFrame> {
    require(expenses, &FERC_KEYS)?;
    require(plant, &["utility_id_ferc1", "report_year", "rate_base"])?;
    require(eia, &EIA_KEYS)?;

    let mut ferc = keyed(expenses, FERC_KEYS).join(
        keyed(plant, FERC_KEYS).select([
            col("utility_id_ferc1"),
            col("report_year"),
            col("rate_base"),
        ]),
        on(FERC_KEYS),
        on(FERC_KEYS),
        full_outer(),
    );

    if let Some(revenues) = revenues {
        require(
            revenues,
            &["utility_id_ferc1", "report_year", "operating_revenues_ferc"],
        )?;
        ferc = ferc.join(
            keyed(revenues, FERC_KEYS).select([
                col("utility_id_ferc1"),
                col("report_year"),
                col("operating_revenues_ferc"),
            ]),
            on(FERC_KEYS),
            on(FERC_KEYS),
            JoinArgs::new(JoinType::Left),
        );
    }

    let with_eia_id = ferc.join(
        Utility::crosswalk()?.lazy(),
        [col("utility_id_ferc1")],
        [col("utility_id_ferc1")],
        JoinArgs::new(JoinType::Left),
    );

    let mut joined = with_eia_id.join(
        keyed(eia, EIA_KEYS),
        on(EIA_KEYS),
        on(EIA_KEYS),
        full_outer(),
    );

    if column_names(eia).iter().any(|c| c == "utility_name") {
        joined = joined
            .with_column(col("utility_name").fill_null(col("utility_name_right")))
            .drop(["utility_name_right"]);
    }

    let df = joined
        .sort(FERC_KEYS, SortMultipleOptions::default().with_nulls_last(true))
        .collect()?;
    info!(rows = df.height(), "Joined FERC and EIA data");
    Ok(df)
}
