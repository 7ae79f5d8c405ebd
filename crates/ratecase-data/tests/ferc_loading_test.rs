//! Integration tests for the FERC Form 1 loaders against on-disk parquet fixtures.

use polars::prelude::*;
use ratecase_data::{
    DataError, Utility, config::YEARS, ferc::missing_associations,
    load_ferc_income_statements, load_ferc_operating_expenses, load_ferc_utility_association,
    load_ferc_utility_plant, operating_revenues_from_income,
};
use rstest::rstest;
use std::{fs::File, path::Path};

fn write_parquet(dir: &Path, name: &str, mut df: DataFrame) {
    let mut file = File::create(dir.join(name)).unwrap();
    ParquetWriter::new(&mut file).finish(&mut df).unwrap();
}

fn operating_expenses() -> DataFrame {
    df! {
        "utility_id_ferc1" => [183i64, 183, 183, 155, 999, 183],
        "report_year" => [2020i64, 2020, 2020, 2020, 2020, 2017],
        "ferc_account" => ["500", "920.1", "580", "901", "500", "500"],
        "dollar_value" => [100.0, 50.0, 25.0, 10.0, 1.0, 7.0],
        "row_type_xbrl" => [
            "reported_value",
            "reported_value",
            "calculated_value",
            "reported_value",
            "reported_value",
            "reported_value",
        ],
    }
    .unwrap()
}

fn utility_plant() -> DataFrame {
    let plant = "utility_plant_in_service_classified_and_unclassified";
    let accum =
        "accumulated_provision_for_depreciation_amortization_and_depletion_of_plant_utility";
    df! {
        "utility_id_ferc1" => [183i64, 183, 155, 183, 218],
        "report_year" => [2021i64, 2021, 2021, 2021, 2021],
        "utility_type" => ["electric", "electric", "electric", "gas", "electric"],
        "utility_plant_asset_type" => [plant, accum, plant, plant, accum],
        "row_type_xbrl" => [
            "calculated_value",
            "calculated_value",
            "calculated_value",
            "calculated_value",
            "calculated_value",
        ],
        "ending_balance" => [1000.0, 400.0, 800.0, 5.0, 300.0],
    }
    .unwrap()
}

fn income_statements() -> DataFrame {
    df! {
        "utility_id_ferc1" => [183i64, 183, 183, 155],
        "report_year" => [2022i64, 2022, 2022, 2022],
        "utility_type" => ["electric", "electric", "gas", "electric"],
        "ferc_account" => ["400", "400", "400", "401"],
        "dollar_value" => [700.0, 300.0, 99.0, 5.0],
    }
    .unwrap()
}

#[test]
fn test_operating_expenses_keep_reported_target_rows() {
    let dir = tempfile::tempdir().unwrap();
    write_parquet(
        dir.path(),
        "core_ferc1__yearly_operating_expenses_sched320.parquet",
        operating_expenses(),
    );

    let df = load_ferc_operating_expenses(dir.path(), &YEARS).unwrap();
    assert_eq!(df.height(), 3);
    let total: f64 = df.column("dollar_value").unwrap().f64().unwrap().sum().unwrap();
    assert_eq!(total, 160.0);
}

#[test]
fn test_utility_plant_outer_joins_balances() {
    let dir = tempfile::tempdir().unwrap();
    write_parquet(
        dir.path(),
        "core_ferc1__yearly_utility_plant_summary_sched200.parquet",
        utility_plant(),
    );

    let df = load_ferc_utility_plant(dir.path(), &YEARS).unwrap();
    assert_eq!(df.height(), 3);

    let ids = df.column("utility_id_ferc1").unwrap().i64().unwrap();
    let plant = df.column("utility_plant_in_service").unwrap().f64().unwrap();
    let accum = df
        .column("accumulated_provision_for_depreciation")
        .unwrap()
        .f64()
        .unwrap();

    // Sorted by id: SCE (155), PG&E (183), SDG&E (218).
    assert_eq!(ids.get(0), Some(155));
    assert_eq!(plant.get(0), Some(800.0));
    assert_eq!(accum.get(0), None);
    assert_eq!(plant.get(1), Some(1000.0));
    assert_eq!(accum.get(1), Some(400.0));
    assert_eq!(plant.get(2), None);
    assert_eq!(accum.get(2), Some(300.0));
}

#[test]
fn test_operating_revenues_sum_account_400() {
    let dir = tempfile::tempdir().unwrap();
    write_parquet(
        dir.path(),
        "core_ferc1__yearly_income_statements_sched114.parquet",
        income_statements(),
    );

    let income = load_ferc_income_statements(dir.path(), &YEARS).unwrap();
    assert_eq!(income.height(), 3);

    let revenues = operating_revenues_from_income(&income).unwrap();
    assert_eq!(revenues.height(), 1);
    let value = revenues
        .column("operating_revenues_ferc")
        .unwrap()
        .f64()
        .unwrap()
        .get(0);
    assert_eq!(value, Some(1000.0));
}

#[test]
fn test_association_reports_absent_targets() {
    let dir = tempfile::tempdir().unwrap();
    let assoc = df! {
        "utility_id_ferc1" => [183i64, 218, 42],
        "utility_id_pudl" => [1i64, 2, 3],
    }
    .unwrap();
    write_parquet(dir.path(), "core_pudl__assn_ferc1_pudl_utilities.parquet", assoc);

    let df = load_ferc_utility_association(dir.path()).unwrap();
    assert_eq!(df.height(), 2);
    assert_eq!(
        missing_associations(&df).unwrap(),
        vec![Utility::SouthernCaliforniaEdison]
    );
}

#[rstest]
#[case("core_ferc1__yearly_operating_expenses_sched320.parquet")]
#[case("core_ferc1__yearly_utility_plant_summary_sched200.parquet")]
#[case("core_ferc1__yearly_income_statements_sched114.parquet")]
fn test_missing_file(#[case] name: &str) {
    let dir = tempfile::tempdir().unwrap();
    let err = match name {
        "core_ferc1__yearly_operating_expenses_sched320.parquet" => {
            load_ferc_operating_expenses(dir.path(), &YEARS).unwrap_err()
        }
        "core_ferc1__yearly_utility_plant_summary_sched200.parquet" => {
            load_ferc_utility_plant(dir.path(), &YEARS).unwrap_err()
        }
        _ => load_ferc_income_statements(dir.path(), &YEARS).unwrap_err(),
    };
    match err {
        DataError::MissingFile { path } => assert!(path.ends_with(name)),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_missing_columns_are_named() {
    let dir = tempfile::tempdir().unwrap();
    let df = df! {
        "utility_id_ferc1" => [183i64],
        "report_year" => [2020i64],
        "dollar_value" => [1.0],
    }
    .unwrap();
    write_parquet(
        dir.path(),
        "core_ferc1__yearly_operating_expenses_sched320.parquet",
        df,
    );

    match load_ferc_operating_expenses(dir.path(), &YEARS).unwrap_err() {
        DataError::MissingColumn { columns } => {
            assert_eq!(columns, vec!["ferc_account", "row_type_xbrl"]);
        }
        other => panic!("unexpected error: {other}"),
    }
}
