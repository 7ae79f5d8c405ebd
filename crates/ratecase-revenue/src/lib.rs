#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod bill;
pub mod error;
pub mod forecast;
pub mod grc;
pub mod requirement;

pub use bill::{
    BillAnalyses, BillImpact, BillImpactParams, BillScenario, ClassShares, ResidentialBill,
    ScenarioResult, bill_impact_analysis, calculate_class_shares, calculate_residential_bill,
    run_all_bill_analyses, sensitivity_analysis,
};
pub use error::{Result, RevenueError};
pub use forecast::{
    ForecastParams, RrMethodology, TestYearForecast, WaccSensitivity, forecast_test_year,
    rr_sensitivity_by_wacc,
};
pub use grc::{GrcOmInputs, GrcParams, GrcRevenueRequirement, calculate_grc_revenue_requirement};
pub use requirement::{
    RevenueRequirement, RevenueRequirementParams, RevenueRequirementRow, apply_rr_to_dataset,
    apply_rr_to_dataset_with, calculate_revenue_requirement,
};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
