//! Constants shared by every pipeline stage.
//!
//! Source file names, the EIA-861 column mapping, the report years and the
//! FERC account bands used to classify operating expenses.

use std::path::PathBuf;

/// Report years covered by the analysis.
pub const YEARS: [i64; 6] = [2018, 2019, 2020, 2021, 2022, 2023];

/// State filter applied to EIA-861 rows.
pub const TARGET_STATE: &str = "CA";

/// Utility type filter applied to FERC plant and income schedules.
pub const UTILITY_TYPE_ELECTRIC: &str = "electric";

/// EIA-861 workbook name; `{year}` is replaced with the report year.
pub const EIA_FILE_PATTERN: &str = "Sales_Ult_Cust_{year}.xlsx";

/// Rows above the header row in EIA-861 workbooks.
pub const EIA_HEADER_SKIP_ROWS: usize = 2;

/// EIA-861 header (after duplicate disambiguation) to standardized column name.
pub const EIA_COLUMN_MAPPING: &[(&str, &str)] = &[
    ("Data Year", "report_year"),
    ("Utility Number", "utility_id_eia"),
    ("Utility Name", "utility_name"),
    ("State", "state"),
    ("Ownership", "ownership"),
    ("Thousand Dollars", "revenue_residential_k"),
    ("Megawatthours", "sales_mwh_residential"),
    ("Count", "customers_residential"),
    ("Thousand Dollars.1", "revenue_commercial_k"),
    ("Megawatthours.1", "sales_mwh_commercial"),
    ("Count.1", "customers_commercial"),
    ("Thousand Dollars.2", "revenue_industrial_k"),
    ("Megawatthours.2", "sales_mwh_industrial"),
    ("Count.2", "customers_industrial"),
    ("Thousand Dollars.4", "revenue_total_k"),
    ("Megawatthours.4", "sales_mwh_total"),
    ("Count.4", "customers_total"),
];

/// Integer-typed EIA columns.
pub const EIA_ID_COLUMNS: &[&str] = &["report_year", "utility_id_eia"];

/// Text EIA columns.
pub const EIA_STRING_COLUMNS: &[&str] = &["utility_name", "state", "ownership"];

/// Columns that must survive the combination of all EIA years.
pub const EIA_REQUIRED_COLUMNS: &[&str] = &["report_year", "utility_id_eia", "state"];

/// FERC Form 1 operating expenses (schedule 320).
pub const FERC_OPERATING_EXPENSES: &str = "core_ferc1__yearly_operating_expenses_sched320.parquet";

/// FERC Form 1 utility plant summary (schedule 200).
pub const FERC_UTILITY_PLANT: &str = "core_ferc1__yearly_utility_plant_summary_sched200.parquet";

/// FERC Form 1 income statements (schedule 114).
pub const FERC_INCOME_STATEMENTS: &str = "core_ferc1__yearly_income_statements_sched114.parquet";

/// FERC respondent to PUDL utility association table.
pub const FERC_UTILITY_ASSOCIATION: &str = "core_pudl__assn_ferc1_pudl_utilities.parquet";

/// Plant asset type carrying utility plant in service.
pub const ASSET_PLANT_IN_SERVICE: &str = "utility_plant_in_service_classified_and_unclassified";

/// Plant asset type carrying accumulated depreciation.
pub const ASSET_ACCUMULATED_DEPRECIATION: &str =
    "accumulated_provision_for_depreciation_amortization_and_depletion_of_plant_utility";

/// Income statement account holding electric operating revenues.
pub const OPERATING_REVENUE_ACCOUNT: &str = "400";

/// Share of administrative & general expense allocated to electric operations.
pub const AG_ELECTRIC_ALLOCATION: f64 = 0.70;

/// Inclusive FERC account bands per functional expense category.
pub const FERC_ACCOUNT_BANDS: &[(&str, (i64, i64))] = &[
    ("production", (500, 557)),
    ("transmission", (560, 574)),
    ("distribution", (580, 598)),
    ("customer_service", (901, 910)),
    ("admin_general", (920, 935)),
];

/// Default root for raw source data.
pub const DEFAULT_DATA_DIR: &str = "data";

/// Analysis-ready output table.
pub const ANALYSIS_READY_FILE: &str = "analysis_ready.parquet";

/// Revenue requirement output table.
pub const REVENUE_REQUIREMENT_FILE: &str = "revenue_requirement.parquet";

/// Bill impact output table.
pub const BILL_IMPACT_FILE: &str = "bill_impact.parquet";

/// Statistical analysis results.
pub const ANALYSIS_RESULTS_FILE: &str = "analysis_results.json";

/// Path of the EIA workbook for one report year.
pub fn eia_file_name(year: i64) -> String {
    EIA_FILE_PATTERN.replace("{year}", &year.to_string())
}

/// Directory layout of raw inputs and processed outputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataPaths {
    /// Directory holding the EIA-861 workbooks
    pub eia_dir: PathBuf,
    /// Directory holding the FERC Form 1 parquet files
    pub ferc_dir: PathBuf,
    /// Directory receiving the processed tables
    pub processed_dir: PathBuf,
}

impl DataPaths {
    /// Standard layout under one data root: `EIA/`, `FERC/` and `processed/`.
    pub fn from_root(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            eia_dir: root.join("EIA"),
            ferc_dir: root.join("FERC"),
            processed_dir: root.join("processed"),
        }
    }

    /// Location of the analysis-ready table.
    pub fn analysis_ready(&self) -> PathBuf {
        self.processed_dir.join(ANALYSIS_READY_FILE)
    }

    /// Location of the revenue requirement table.
    pub fn revenue_requirement(&self) -> PathBuf {
        self.processed_dir.join(REVENUE_REQUIREMENT_FILE)
    }

    /// Location of the bill impact table.
    pub fn bill_impact(&self) -> PathBuf {
        self.processed_dir.join(BILL_IMPACT_FILE)
    }

    /// Location of the JSON analysis results.
    pub fn analysis_results(&self) -> PathBuf {
        self.processed_dir.join(ANALYSIS_RESULTS_FILE)
    }
}

impl Default for DataPaths {
    fn default() -> Self {
        Self::from_root(DEFAULT_DATA_DIR)
    }
}
