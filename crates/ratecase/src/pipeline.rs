//! Pipeline stages: ETL, revenue and bill analysis, statistics, charts.
//!
//! Each stage reads what the previous stage persisted, so the stages can be
//! run separately from the command line.

use crate::error::Result;
use ratecase_data::{
    DataPaths, UtilityYearRecord, aggregate_eia_duplicates,
    config::{DEFAULT_DATA_DIR, YEARS},
    extract_eia_data,
    ferc::missing_associations,
    filter_eia_to_targets, load_ferc_income_statements, load_ferc_operating_expenses,
    load_ferc_utility_association, load_ferc_utility_plant, operating_revenues_from_income,
    read_parquet, records_from_frame,
};
use ratecase_output::{
    AnalysisReport, BillPoint, ChartInputs, ExportFormat, Exporter, RevenueGapPoint,
    RevenueSummary, render_all, write_parquet, write_rows,
};
use ratecase_revenue::{
    BillAnalyses, ForecastParams, RevenueRequirementRow, RrMethodology, TestYearForecast,
    WaccSensitivity, apply_rr_to_dataset, forecast_test_year, rr_sensitivity_by_wacc,
    run_all_bill_analyses,
};
use ratecase_stats::run_analysis;
use ratecase_transform::{TransformInputs, build_analysis_ready};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Default directory receiving the figures.
pub const DEFAULT_FIGURES_DIR: &str = "outputs/figures";

/// Default base year of the forecast and bill impact.
pub const DEFAULT_BASE_YEAR: i64 = YEARS[YEARS.len() - 1];

/// WACC sweep table written next to the parquet outputs.
pub const WACC_SENSITIVITY_FILE: &str = "wacc_sensitivity.csv";

/// Bill scenario table written next to the parquet outputs.
pub const BILL_SENSITIVITY_FILE: &str = "bill_sensitivity.csv";

/// Input and output locations plus the analysis base year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Directory holding the EIA-861 workbooks
    pub eia_dir: PathBuf,
    /// Directory holding the FERC Form 1 parquet files
    pub ferc_dir: PathBuf,
    /// Directory receiving the processed tables
    pub processed_dir: PathBuf,
    /// Directory receiving the figures
    pub figures_dir: PathBuf,
    /// Base year of the forecast, bill impact and single-year charts
    pub base_year: i64,
}

impl PipelineConfig {
    /// Standard layout under one data root, figures in `outputs/figures/`.
    pub fn from_data_dir(root: impl Into<PathBuf>) -> Self {
        let paths = DataPaths::from_root(root);
        Self {
            eia_dir: paths.eia_dir,
            ferc_dir: paths.ferc_dir,
            processed_dir: paths.processed_dir,
            figures_dir: PathBuf::from(DEFAULT_FIGURES_DIR),
            base_year: DEFAULT_BASE_YEAR,
        }
    }

    /// Replace the processed output directory.
    pub fn with_processed_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.processed_dir = dir.into();
        self
    }

    /// Replace the figures directory.
    pub fn with_figures_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.figures_dir = dir.into();
        self
    }

    /// Replace the base year.
    pub const fn with_base_year(mut self, base_year: i64) -> Self {
        self.base_year = base_year;
        self
    }

    /// Data file locations.
    pub fn paths(&self) -> DataPaths {
        DataPaths {
            eia_dir: self.eia_dir.clone(),
            ferc_dir: self.ferc_dir.clone(),
            processed_dir: self.processed_dir.clone(),
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::from_data_dir(DEFAULT_DATA_DIR)
    }
}

fn check_associations(ferc_dir: &Path) -> Result<()> {
    let association = load_ferc_utility_association(ferc_dir)?;
    for utility in missing_associations(&association)? {
        warn!(
            utility = utility.name(),
            ferc_id = utility.ferc_id(),
            "Target utility missing from association table"
        );
    }
    Ok(())
}

/// Read every source file into the frames the transform chain consumes.
///
/// The FERC tables are read before the EIA workbooks. Any missing source
/// file is fatal.
pub fn extract(config: &PipelineConfig) -> Result<TransformInputs> {
    let operating_expenses = load_ferc_operating_expenses(&config.ferc_dir, &YEARS)?;
    let utility_plant = load_ferc_utility_plant(&config.ferc_dir, &YEARS)?;
    let income = load_ferc_income_statements(&config.ferc_dir, &YEARS)?;
    let operating_revenues = operating_revenues_from_income(&income)?;
    check_associations(&config.ferc_dir)?;

    let eia = extract_eia_data(&config.eia_dir, &YEARS)?;
    let eia = aggregate_eia_duplicates(&filter_eia_to_targets(&eia)?)?;
    info!(rows = eia.height(), "Extracted EIA-861 data");

    Ok(TransformInputs {
        eia,
        operating_expenses,
        utility_plant,
        operating_revenues: Some(operating_revenues),
    })
}

/// Transform extracted frames and persist the analysis-ready table.
///
/// Nothing is written unless the table passes validation.
pub fn transform_and_write(
    inputs: &TransformInputs,
    config: &PipelineConfig,
) -> Result<Vec<UtilityYearRecord>> {
    let mut df = build_analysis_ready(inputs)?;
    let records = records_from_frame(&df)?;
    write_parquet(&mut df, &config.paths().analysis_ready())?;
    Ok(records)
}

/// Extract, transform, validate and write `analysis_ready.parquet`.
pub fn run_etl(config: &PipelineConfig) -> Result<Vec<UtilityYearRecord>> {
    info!(
        eia_dir = %config.eia_dir.display(),
        ferc_dir = %config.ferc_dir.display(),
        "Starting ETL"
    );
    let inputs = extract(config)?;
    let records = transform_and_write(&inputs, config)?;
    info!(records = records.len(), "ETL complete");
    Ok(records)
}

/// Read the persisted analysis-ready table.
pub fn load_analysis_ready(config: &PipelineConfig) -> Result<Vec<UtilityYearRecord>> {
    let df = read_parquet(&config.paths().analysis_ready())?;
    Ok(records_from_frame(&df)?)
}

/// Everything the revenue stage computes.
#[derive(Debug, Clone)]
pub struct RevenueOutputs {
    /// Total and GRC revenue requirement of every utility-year
    pub rows: Vec<RevenueRequirementRow>,
    /// Test-year forecast from the base year
    pub forecasts: Vec<TestYearForecast>,
    /// Base-year revenue requirement across the WACC sweep
    pub wacc_sensitivity: Vec<WaccSensitivity>,
    /// Class shares, bill impacts and bill scenarios
    pub bills: BillAnalyses,
    /// Base year of the forecast and bills
    pub base_year: i64,
}

impl RevenueOutputs {
    /// Text summary of the base year.
    pub fn summary(&self) -> RevenueSummary<'_> {
        RevenueSummary {
            year: self.base_year,
            rows: &self.rows,
            forecasts: &self.forecasts,
            bill_impacts: &self.bills.bill_impacts,
        }
    }
}

fn wacc_sweep(records: &[UtilityYearRecord], base_year: i64) -> Result<Vec<WaccSensitivity>> {
    let mut out = Vec::new();
    for record in records.iter().filter(|r| r.report_year == base_year) {
        match (record.om_total, record.rate_base) {
            (Some(om), Some(rate_base)) => {
                out.extend(rr_sensitivity_by_wacc(&record.utility_name, om, rate_base, None)?);
            }
            _ => warn!(utility = %record.utility_name, "Skipping WACC sweep, missing inputs"),
        }
    }
    Ok(out)
}

/// Revenue requirement dataset, test-year forecast, WACC sweep and bill
/// analyses; writes `revenue_requirement.parquet`, `bill_impact.parquet` and
/// the two sensitivity CSV files.
///
/// Every result is computed before the first file is written, so a failing
/// stage leaves no output behind.
pub fn run_revenue_and_bill_analysis(
    records: &[UtilityYearRecord],
    config: &PipelineConfig,
) -> Result<RevenueOutputs> {
    let paths = config.paths();

    let rows = apply_rr_to_dataset(records)?;
    let params = ForecastParams {
        base_year: config.base_year,
        ..ForecastParams::default()
    };
    let forecasts = forecast_test_year(records, &params, RrMethodology::Total)?;
    let wacc_sensitivity = wacc_sweep(records, config.base_year)?;
    let bills = run_all_bill_analyses(records, config.base_year)?;

    write_rows(rows.as_slice(), &paths.revenue_requirement())?;
    wacc_sensitivity
        .as_slice()
        .export_to_file(&paths.processed_dir.join(WACC_SENSITIVITY_FILE), ExportFormat::Csv)?;
    write_rows(bills.bill_impacts.as_slice(), &paths.bill_impact())?;
    bills
        .sensitivity
        .as_slice()
        .export_to_file(&paths.processed_dir.join(BILL_SENSITIVITY_FILE), ExportFormat::Csv)?;

    info!(
        rows = rows.len(),
        forecasts = forecasts.len(),
        bill_impacts = bills.bill_impacts.len(),
        "Revenue and bill analysis complete"
    );
    Ok(RevenueOutputs {
        rows,
        forecasts,
        wacc_sensitivity,
        bills,
        base_year: config.base_year,
    })
}

/// Run the statistical analysis and write `analysis_results.json`.
pub fn run_statistics(
    records: &[UtilityYearRecord],
    config: &PipelineConfig,
) -> Result<AnalysisReport> {
    let report = AnalysisReport::new(records.len(), run_analysis(records));
    report.write(&config.paths().analysis_results())?;
    Ok(report)
}

/// Redraw the figures from the persisted tables.
pub fn render_charts(config: &PipelineConfig) -> Result<Vec<PathBuf>> {
    let paths = config.paths();
    let records = load_analysis_ready(config)?;
    let revenue_gaps = RevenueGapPoint::from_frame(&read_parquet(&paths.revenue_requirement())?)?;
    let bills = BillPoint::from_frame(&read_parquet(&paths.bill_impact())?)?;

    let written = render_all(
        &ChartInputs {
            records: &records,
            revenue_gaps: &revenue_gaps,
            bills: &bills,
            year: config.base_year,
        },
        &config.figures_dir,
    )?;
    info!(figures = written.len(), dir = %config.figures_dir.display(), "Rendered charts");
    Ok(written)
}

/// Every stage in order.
pub fn run_all(config: &PipelineConfig) -> Result<RevenueOutputs> {
    let records = run_etl(config)?;
    let revenue = run_revenue_and_bill_analysis(&records, config)?;
    run_statistics(&records, config)?;
    render_charts(config)?;
    Ok(revenue)
}
