//! FERC Form 1 schedules published as PUDL parquet tables.

use crate::{
    config::{
        ASSET_ACCUMULATED_DEPRECIATION, ASSET_PLANT_IN_SERVICE, FERC_INCOME_STATEMENTS,
        FERC_OPERATING_EXPENSES, FERC_UTILITY_ASSOCIATION, FERC_UTILITY_PLANT,
        OPERATING_REVENUE_ACCOUNT, UTILITY_TYPE_ELECTRIC,
    },
    error::{DataError, Result, column_names, require_columns},
    universe::{Utility, id_filter, year_filter},
};
use polars::prelude::*;
use std::{fs::File, path::Path};
use tracing::{debug, info};

const KEYS: [&str; 2] = ["utility_id_ferc1", "report_year"];

/// Read a parquet file, failing with [`DataError::MissingFile`] when absent.
pub fn read_parquet(path: &Path) -> Result<DataFrame> {
    if !path.exists() {
        return Err(DataError::MissingFile {
            path: path.to_path_buf(),
        });
    }
    let file = File::open(path)?;
    let df = ParquetReader::new(file).finish()?;
    debug!(rows = df.height(), path = %path.display(), "Read parquet table");
    Ok(df)
}

/// Read a FERC table and check its required columns.
fn read_schedule(ferc_dir: &Path, file_name: &str, required: &[&str]) -> Result<LazyFrame> {
    let df = read_parquet(&ferc_dir.join(file_name))?;
    require_columns(required, &column_names(&df))?;
    Ok(df.lazy().with_columns([
        col("utility_id_ferc1").cast(DataType::Int64),
        col("report_year").cast(DataType::Int64),
    ]))
}

fn target_rows(years: &[i64]) -> Expr {
    id_filter("utility_id_ferc1", &Utility::ferc_ids()).and(year_filter(years))
}

/// Operating expenses (schedule 320) for the target utilities and years.
///
/// Only `reported_value` rows are kept so calculated subtotals are not
/// counted twice.
pub fn load_ferc_operating_expenses(ferc_dir: &Path, years: &[i64]) -> Result<DataFrame> {
    let df = read_schedule(
        ferc_dir,
        FERC_OPERATING_EXPENSES,
        &[
            "utility_id_ferc1",
            "report_year",
            "ferc_account",
            "dollar_value",
            "row_type_xbrl",
        ],
    )?
    .filter(target_rows(years).and(col("row_type_xbrl").eq(lit("reported_value"))))
    .with_column(col("dollar_value").cast(DataType::Float64))
    .collect()?;

    info!(rows = df.height(), "Loaded FERC operating expenses");
    Ok(df)
}

/// Plant in service and accumulated depreciation (schedule 200), one row per
/// utility-year.
///
/// Both balances are the `ending_balance` of `calculated_value` rows for
/// electric plant. Utility-years that report only one of the two keep a null
/// for the other.
pub fn load_ferc_utility_plant(ferc_dir: &Path, years: &[i64]) -> Result<DataFrame> {
    let plant = read_schedule(
        ferc_dir,
        FERC_UTILITY_PLANT,
        &[
            "utility_id_ferc1",
            "report_year",
            "utility_type",
            "utility_plant_asset_type",
            "row_type_xbrl",
            "ending_balance",
        ],
    )?
    .filter(
        target_rows(years)
            .and(col("utility_type").eq(lit(UTILITY_TYPE_ELECTRIC)))
            .and(col("row_type_xbrl").eq(lit("calculated_value"))),
    );

    let balance = |asset_type: &str, alias: &str| {
        plant
            .clone()
            .filter(col("utility_plant_asset_type").eq(lit(asset_type)))
            .select([
                col(KEYS[0]),
                col(KEYS[1]),
                col("ending_balance").cast(DataType::Float64).alias(alias),
            ])
    };

    let keys = [col(KEYS[0]), col(KEYS[1])];
    let df = balance(ASSET_PLANT_IN_SERVICE, "utility_plant_in_service")
        .join(
            balance(
                ASSET_ACCUMULATED_DEPRECIATION,
                "accumulated_provision_for_depreciation",
            ),
            keys.clone(),
            keys,
            JoinArgs::new(JoinType::Full).with_coalesce(JoinCoalesce::CoalesceColumns),
        )
        .sort(KEYS, SortMultipleOptions::default())
        .collect()?;

    info!(rows = df.height(), "Loaded FERC utility plant");
    Ok(df)
}

/// Income statements (schedule 114) for the target electric utilities.
pub fn load_ferc_income_statements(ferc_dir: &Path, years: &[i64]) -> Result<DataFrame> {
    let df = read_schedule(
        ferc_dir,
        FERC_INCOME_STATEMENTS,
        &["utility_id_ferc1", "report_year", "utility_type"],
    )?
    .filter(target_rows(years).and(col("utility_type").eq(lit(UTILITY_TYPE_ELECTRIC))))
    .collect()?;

    info!(rows = df.height(), "Loaded FERC income statements");
    Ok(df)
}

/// Electric operating revenues (account 400) summed per utility-year as
/// `operating_revenues_ferc`.
pub fn operating_revenues_from_income(income: &DataFrame) -> Result<DataFrame> {
    require_columns(
        &["utility_id_ferc1", "report_year", "ferc_account", "dollar_value"],
        &column_names(income),
    )?;

    let df = income
        .clone()
        .lazy()
        .filter(
            col("ferc_account")
                .cast(DataType::String)
                .eq(lit(OPERATING_REVENUE_ACCOUNT)),
        )
        .group_by([col(KEYS[0]), col(KEYS[1])])
        .agg([col("dollar_value")
            .cast(DataType::Float64)
            .sum()
            .alias("operating_revenues_ferc")])
        .sort(KEYS, SortMultipleOptions::default())
        .collect()?;

    debug!(rows = df.height(), "Derived FERC operating revenues");
    Ok(df)
}

/// FERC respondent to PUDL utility association rows for the target utilities.
pub fn load_ferc_utility_association(ferc_dir: &Path) -> Result<DataFrame> {
    let df = read_parquet(&ferc_dir.join(FERC_UTILITY_ASSOCIATION))?;
    require_columns(&["utility_id_ferc1"], &column_names(&df))?;

    let df = df
        .lazy()
        .with_column(col("utility_id_ferc1").cast(DataType::Int64))
        .filter(id_filter("utility_id_ferc1", &Utility::ferc_ids()))
        .collect()?;

    debug!(rows = df.height(), "Loaded FERC utility association");
    Ok(df)
}

/// Target utilities with no row in an association frame.
pub fn missing_associations(association: &DataFrame) -> Result<Vec<Utility>> {
    let ids = association
        .column("utility_id_ferc1")?
        .cast(&DataType::Int64)?;
    let ids = ids.i64()?;
    Ok(Utility::ALL
        .into_iter()
        .filter(|u| !ids.into_iter().any(|id| id == Some(u.ferc_id())))
        .collect())
}
