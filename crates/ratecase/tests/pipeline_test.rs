//! End-to-end pipeline over synthetic FERC and EIA frames.

use polars::prelude::*;
use ratecase::{
    PipelineConfig, PipelineError, Utility,
    data::{
        DataError,
        config::{
            ASSET_ACCUMULATED_DEPRECIATION, ASSET_PLANT_IN_SERVICE, FERC_INCOME_STATEMENTS,
            FERC_OPERATING_EXPENSES, FERC_UTILITY_ASSOCIATION, FERC_UTILITY_PLANT,
            UTILITY_TYPE_ELECTRIC, YEARS,
        },
    },
    output::write_parquet,
    pipeline::{
        BILL_SENSITIVITY_FILE, WACC_SENSITIVITY_FILE, load_analysis_ready, run_etl,
        run_revenue_and_bill_analysis, run_statistics, transform_and_write,
    },
    revenue::RevenueError,
    transform::TransformInputs,
};
use rstest::rstest;
use tempfile::TempDir;

const ACCOUNTS: [(&str, f64); 6] = [
    ("500", 1000.0),
    ("561.2", 200.0),
    ("580", 300.0),
    ("901", 100.0),
    ("920", 400.0),
    ("426", 50.0),
];

fn inputs() -> TransformInputs {
    let mut ids = Vec::new();
    let mut report_years = Vec::new();
    let mut accounts = Vec::new();
    let mut dollars = Vec::new();

    let mut plant_ids = Vec::new();
    let mut plant_years = Vec::new();
    let mut plant_in_service = Vec::new();
    let mut accumulated = Vec::new();

    let mut eia_ids = Vec::new();
    let mut eia_years = Vec::new();
    let mut eia_names = Vec::new();
    let mut customers = Vec::new();
    let mut sales = Vec::new();
    let mut revenue = Vec::new();
    let mut residential_sales = Vec::new();
    let mut residential_revenue = Vec::new();

    for (k, utility) in Utility::ALL.iter().enumerate() {
        let scale = (k + 1) as f64;
        for year in YEARS {
            for (account, amount) in ACCOUNTS {
                ids.push(utility.ferc_id());
                report_years.push(year);
                accounts.push(account);
                dollars.push(amount * scale);
            }

            plant_ids.push(utility.ferc_id());
            plant_years.push(year);
            plant_in_service.push(10_000.0 * scale);
            accumulated.push(4_000.0 * scale + (year - 2018) as f64 * 100.0);

            eia_ids.push(utility.eia_id());
            eia_years.push(year);
            eia_names.push(utility.name().to_string());
            customers.push(100.0 * scale);
            sales.push(2_000.0 * scale);
            revenue.push(5.0 * scale);
            residential_sales.push(800.0 * scale);
            residential_revenue.push(2.0 * scale);
        }
    }

    let n_expense_rows = ids.len();
    TransformInputs {
        operating_expenses: df! {
            "utility_id_ferc1" => ids,
            "report_year" => report_years,
            "ferc_account" => accounts,
            "dollar_value" => dollars,
            "row_type_xbrl" => vec!["reported_value"; n_expense_rows],
        }
        .unwrap(),
        utility_plant: df! {
            "utility_id_ferc1" => plant_ids,
            "report_year" => plant_years,
            "utility_plant_in_service" => plant_in_service,
            "accumulated_provision_for_depreciation" => accumulated,
        }
        .unwrap(),
        eia: df! {
            "utility_id_eia" => eia_ids,
            "report_year" => eia_years,
            "utility_name" => eia_names,
            "customers_total" => customers,
            "sales_mwh_total" => sales,
            "revenue_total_k" => revenue,
            "sales_mwh_residential" => residential_sales,
            "revenue_residential_k" => residential_revenue,
        }
        .unwrap(),
        operating_revenues: None,
    }
}

fn config(dir: &TempDir) -> PipelineConfig {
    PipelineConfig::from_data_dir(dir.path().join("data"))
        .with_figures_dir(dir.path().join("figures"))
}

/// Revenue gap of a synthetic utility-year computed by hand.
fn expected_gap(scale: f64, year: i64) -> f64 {
    let om_total = 2_050.0 * scale;
    let om_other = 50.0 * scale;
    let rate_base = 10_000.0 * scale - (4_000.0 * scale + (year - 2018) as f64 * 100.0);
    let pre_tax = (om_total - om_other) + rate_base * 0.035 + rate_base * 0.075;
    pre_tax / (1.0 - 0.27) - 5.0 * scale * 1_000.0
}

#[rstest]
#[case(Utility::PacificGasElectric, 1.0, 2023)]
#[case(Utility::SouthernCaliforniaEdison, 2.0, 2020)]
#[case(Utility::SanDiegoGasElectric, 3.0, 2018)]
fn test_revenue_gap_to_the_cent(#[case] utility: Utility, #[case] scale: f64, #[case] year: i64) {
    let dir = tempfile::tempdir().unwrap();
    let config = config(&dir);
    let records = transform_and_write(&inputs(), &config).unwrap();
    assert_eq!(records.len(), 18);

    let outputs = run_revenue_and_bill_analysis(&records, &config).unwrap();
    let row = outputs
        .rows
        .iter()
        .find(|r| r.record.utility_id_ferc1 == utility.ferc_id() && r.record.report_year == year)
        .unwrap();
    assert!((row.revenue_gap.unwrap() - expected_gap(scale, year)).abs() < 0.005);
}

#[test]
fn test_stages_persist_their_outputs() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(&dir);
    let paths = config.paths();

    let records = transform_and_write(&inputs(), &config).unwrap();
    assert!(paths.analysis_ready().exists());
    assert_eq!(load_analysis_ready(&config).unwrap(), records);

    let outputs = run_revenue_and_bill_analysis(&records, &config).unwrap();
    assert!(paths.revenue_requirement().exists());
    assert!(paths.bill_impact().exists());
    assert!(paths.processed_dir.join(WACC_SENSITIVITY_FILE).exists());
    assert!(paths.processed_dir.join(BILL_SENSITIVITY_FILE).exists());

    assert_eq!(outputs.forecasts.len(), 3);
    assert_eq!(outputs.wacc_sensitivity.len(), 15);
    assert_eq!(outputs.bills.bill_impacts.len(), 3);
    assert_eq!(outputs.bills.sensitivity.len(), 21);
    for impact in &outputs.bills.bill_impacts {
        assert!((impact.residential_share - 0.4).abs() < 1e-12);
        assert!((impact.current_rate_per_kwh - 0.0025).abs() < 1e-12);
        assert!(impact.proposed_monthly_bill > impact.current_monthly_bill);
    }

    let summary = outputs.summary().to_string();
    assert!(summary.contains("SDG&E"));

    let report = run_statistics(&records, &config).unwrap();
    assert_eq!(report.n_records, 18);
    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(paths.analysis_results()).unwrap()).unwrap();
    assert_eq!(json["n_records"], 18);
}

#[test]
fn test_etl_without_sources_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(&dir);

    let err = run_etl(&config).unwrap_err();
    assert!(matches!(err, PipelineError::Data(DataError::MissingFile { .. })));
    assert!(!config.paths().analysis_ready().exists());
}

#[test]
fn test_invalid_table_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(&dir);
    let mut sparse = inputs();
    sparse.operating_expenses = sparse
        .operating_expenses
        .lazy()
        .filter(col("report_year").lt(lit(2019)))
        .collect()
        .unwrap();
    sparse.utility_plant = sparse
        .utility_plant
        .lazy()
        .filter(col("report_year").lt(lit(2019)))
        .collect()
        .unwrap();
    sparse.eia = sparse
        .eia
        .lazy()
        .filter(col("report_year").lt(lit(2019)))
        .collect()
        .unwrap();

    let err = transform_and_write(&sparse, &config).unwrap_err();
    assert!(matches!(err, PipelineError::Transform(_)));
    assert!(!config.paths().analysis_ready().exists());
}

#[test]
fn test_missing_income_statements_abort_etl() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(&dir);
    let ferc_dir = &config.ferc_dir;

    write_parquet(
        &mut inputs().operating_expenses,
        &ferc_dir.join(FERC_OPERATING_EXPENSES),
    )
    .unwrap();
    write_parquet(
        &mut df! {
            "utility_id_ferc1" => vec![Utility::PacificGasElectric.ferc_id(); 2],
            "report_year" => vec![2023_i64; 2],
            "utility_type" => vec![UTILITY_TYPE_ELECTRIC; 2],
            "utility_plant_asset_type" => vec![ASSET_PLANT_IN_SERVICE, ASSET_ACCUMULATED_DEPRECIATION],
            "row_type_xbrl" => vec!["calculated_value"; 2],
            "ending_balance" => vec![10_000.0, 4_000.0],
        }
        .unwrap(),
        &ferc_dir.join(FERC_UTILITY_PLANT),
    )
    .unwrap();
    write_parquet(
        &mut df! { "utility_id_ferc1" => Utility::ferc_ids() }.unwrap(),
        &ferc_dir.join(FERC_UTILITY_ASSOCIATION),
    )
    .unwrap();

    let err = run_etl(&config).unwrap_err();
    match err {
        PipelineError::Data(DataError::MissingFile { path }) => {
            assert!(path.ends_with(FERC_INCOME_STATEMENTS));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(!config.paths().analysis_ready().exists());
}

#[test]
fn test_unknown_base_year_writes_no_revenue_outputs() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(&dir);
    let records = transform_and_write(&inputs(), &config).unwrap();

    let config = config.with_base_year(2030);
    let err = run_revenue_and_bill_analysis(&records, &config).unwrap_err();
    assert!(matches!(err, PipelineError::Revenue(RevenueError::InvalidSelector(_))));

    let paths = config.paths();
    assert!(paths.analysis_ready().exists());
    assert!(!paths.revenue_requirement().exists());
    assert!(!paths.bill_impact().exists());
    assert!(!paths.processed_dir.join(WACC_SENSITIVITY_FILE).exists());
    assert!(!paths.processed_dir.join(BILL_SENSITIVITY_FILE).exists());
}
