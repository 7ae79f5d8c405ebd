//! Residential bill impact.
//!
//! Bills use a uniform average rate: the residential share of a revenue
//! requirement spread over residential kWh sales, times an average monthly
//! usage. Tiers and fixed charges are not modeled.

use crate::{
    error::{Result, RevenueError},
    forecast::base_year_records,
    requirement::{RevenueRequirementParams, calculate_revenue_requirement},
};
use ratecase_data::UtilityYearRecord;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Average monthly residential usage in kWh.
pub const DEFAULT_AVG_MONTHLY_KWH: f64 = 500.0;

/// Revenue shares of one utility-year by customer class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassShares {
    /// FERC respondent id
    pub utility_id_ferc1: i64,
    /// Utility name
    pub utility_name: String,
    /// Report year
    pub report_year: i64,
    /// Residential revenue (thousand dollars)
    pub revenue_residential_k: Option<f64>,
    /// Commercial revenue (thousand dollars)
    pub revenue_commercial_k: Option<f64>,
    /// Industrial revenue (thousand dollars)
    pub revenue_industrial_k: Option<f64>,
    /// Total revenue (thousand dollars)
    pub revenue_total_k: Option<f64>,
    /// Residential fraction of total revenue
    pub residential_share: Option<f64>,
    /// Commercial fraction of total revenue
    pub commercial_share: Option<f64>,
    /// Industrial fraction of total revenue
    pub industrial_share: Option<f64>,
}

fn share(part: Option<f64>, total: Option<f64>) -> Option<f64> {
    match (part, total) {
        (Some(p), Some(t)) if t != 0.0 => Some(p / t),
        _ => None,
    }
}

/// Revenue share of each customer class for every record.
pub fn calculate_class_shares(records: &[UtilityYearRecord]) -> Vec<ClassShares> {
    records
        .iter()
        .map(|r| ClassShares {
            utility_id_ferc1: r.utility_id_ferc1,
            utility_name: r.utility_name.clone(),
            report_year: r.report_year,
            revenue_residential_k: r.revenue_residential_k,
            revenue_commercial_k: r.revenue_commercial_k,
            revenue_industrial_k: r.revenue_industrial_k,
            revenue_total_k: r.revenue_total_k,
            residential_share: share(r.revenue_residential_k, r.revenue_total_k),
            commercial_share: share(r.revenue_commercial_k, r.revenue_total_k),
            industrial_share: share(r.revenue_industrial_k, r.revenue_total_k),
        })
        .collect()
}

/// Average residential rate and monthly bill.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResidentialBill {
    /// Revenue requirement allocated to residential
    pub residential_rr: f64,
    /// Residential sales in kWh
    pub residential_sales_kwh: f64,
    /// Average rate in $/kWh
    pub avg_rate_per_kwh: f64,
    /// Monthly bill at the average usage
    pub monthly_bill: f64,
    /// Average monthly usage in kWh
    pub avg_monthly_kwh: f64,
}

/// Average monthly residential bill implied by a revenue requirement.
///
/// Fails when residential sales are not positive or the share lies outside
/// `[0, 1]`.
pub fn calculate_residential_bill(
    revenue_requirement: f64,
    residential_share: f64,
    residential_sales_mwh: f64,
    avg_monthly_kwh: f64,
) -> Result<ResidentialBill> {
    if residential_sales_mwh <= 0.0 {
        return Err(RevenueError::InvalidParameter(format!(
            "residential sales must be positive, got {residential_sales_mwh}"
        )));
    }
    if !(0.0..=1.0).contains(&residential_share) {
        return Err(RevenueError::InvalidParameter(format!(
            "residential share must lie in [0, 1], got {residential_share}"
        )));
    }

    let residential_rr = revenue_requirement * residential_share;
    let residential_sales_kwh = residential_sales_mwh * 1000.0;
    let avg_rate_per_kwh = residential_rr / residential_sales_kwh;

    Ok(ResidentialBill {
        residential_rr,
        residential_sales_kwh,
        avg_rate_per_kwh,
        monthly_bill: avg_rate_per_kwh * avg_monthly_kwh,
        avg_monthly_kwh,
    })
}

/// Parameters of the bill impact analysis
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BillImpactParams {
    /// Year the current bill is taken from (default: 2023)
    pub base_year: i64,
    /// O&M escalation to the test year (default: 0.03)
    pub om_escalation: f64,
    /// Rate base growth to the test year (default: 0.04)
    pub rate_base_growth: f64,
    /// Average monthly usage in kWh (default: 500)
    pub avg_monthly_kwh: f64,
    /// Revenue requirement parameters
    pub revenue_requirement: RevenueRequirementParams,
}

impl Default for BillImpactParams {
    fn default() -> Self {
        Self {
            base_year: 2023,
            om_escalation: 0.03,
            rate_base_growth: 0.04,
            avg_monthly_kwh: DEFAULT_AVG_MONTHLY_KWH,
            revenue_requirement: RevenueRequirementParams::default(),
        }
    }
}

impl BillImpactParams {
    /// Default parameters for a given base year.
    pub fn for_base_year(base_year: i64) -> Self {
        Self {
            base_year,
            ..Default::default()
        }
    }
}

/// Current versus proposed residential bill of one utility.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BillImpact {
    /// FERC respondent id
    pub utility_id_ferc1: i64,
    /// Utility name
    pub utility_name: String,
    /// Base year
    pub base_year: i64,
    /// Residential fraction of total revenue
    pub residential_share: f64,
    /// Residential share in percent
    pub residential_share_pct: f64,
    /// Base-year revenue requirement
    pub current_rr: f64,
    /// Test-year revenue requirement
    pub proposed_rr: f64,
    /// Current average residential rate ($/kWh)
    pub current_rate_per_kwh: f64,
    /// Proposed average residential rate ($/kWh)
    pub proposed_rate_per_kwh: f64,
    /// Current monthly bill
    pub current_monthly_bill: f64,
    /// Proposed monthly bill
    pub proposed_monthly_bill: f64,
    /// Monthly change in dollars
    pub monthly_change_dollars: f64,
    /// Monthly change in percent
    pub monthly_change_pct: f64,
    /// Annual change in dollars
    pub annual_change_dollars: f64,
    /// Average monthly usage in kWh
    pub avg_monthly_kwh: f64,
    /// O&M escalation applied
    pub om_escalation: f64,
    /// Rate base growth applied
    pub rate_base_growth: f64,
}

/// Bill impact of one base-year record.
///
/// The current bill is the actual residential revenue per kWh times the
/// average usage; the proposed bill scales it by the ratio of test-year to
/// base-year revenue requirement.
pub fn bill_impact_for(record: &UtilityYearRecord, params: &BillImpactParams) -> Result<BillImpact> {
    let om_total = record.om_total.ok_or(RevenueError::MissingField("om_total"))?;
    let rate_base = record.rate_base.ok_or(RevenueError::MissingField("rate_base"))?;
    let sales_mwh = record
        .sales_mwh_residential
        .ok_or(RevenueError::MissingField("sales_mwh_residential"))?;
    let revenue_residential_k = record
        .revenue_residential_k
        .ok_or(RevenueError::MissingField("revenue_residential_k"))?;
    if sales_mwh <= 0.0 {
        return Err(RevenueError::InvalidParameter(format!(
            "residential sales must be positive, got {sales_mwh}"
        )));
    }

    let residential_share = match record.revenue_total_k {
        Some(total) if total != 0.0 => revenue_residential_k / total,
        _ => 0.0,
    };

    let om_other = record.om_other.unwrap_or(0.0);
    let rr_params = &params.revenue_requirement;
    let current_rr =
        calculate_revenue_requirement(om_total, om_other, rate_base, rr_params)?.revenue_requirement;
    let proposed_rr = calculate_revenue_requirement(
        om_total * (1.0 + params.om_escalation),
        om_other,
        rate_base * (1.0 + params.rate_base_growth),
        rr_params,
    )?
    .revenue_requirement;
    if current_rr == 0.0 {
        return Err(RevenueError::ZeroRevenueRequirement);
    }

    let current_rate_per_kwh = (revenue_residential_k * 1000.0) / (sales_mwh * 1000.0);
    let current_monthly_bill = current_rate_per_kwh * params.avg_monthly_kwh;
    let change_factor = proposed_rr / current_rr;
    let proposed_monthly_bill = current_monthly_bill * change_factor;
    let monthly_change_dollars = proposed_monthly_bill - current_monthly_bill;

    Ok(BillImpact {
        utility_id_ferc1: record.utility_id_ferc1,
        utility_name: record.utility_name.clone(),
        base_year: params.base_year,
        residential_share,
        residential_share_pct: residential_share * 100.0,
        current_rr,
        proposed_rr,
        current_rate_per_kwh,
        proposed_rate_per_kwh: current_rate_per_kwh * change_factor,
        current_monthly_bill,
        proposed_monthly_bill,
        monthly_change_dollars,
        monthly_change_pct: if current_monthly_bill != 0.0 {
            monthly_change_dollars / current_monthly_bill * 100.0
        } else {
            0.0
        },
        annual_change_dollars: monthly_change_dollars * 12.0,
        avg_monthly_kwh: params.avg_monthly_kwh,
        om_escalation: params.om_escalation,
        rate_base_growth: params.rate_base_growth,
    })
}

/// Current versus proposed residential bills for every utility in the base
/// year.
///
/// Revenue requirement parameters are checked before any record is read.
/// Utilities with incomplete inputs or a zero current revenue requirement
/// are skipped with a warning.
pub fn bill_impact_analysis(
    records: &[UtilityYearRecord],
    params: &BillImpactParams,
) -> Result<Vec<BillImpact>> {
    params.revenue_requirement.validate()?;
    let impacts: Vec<BillImpact> = base_year_records(records, params.base_year)?
        .into_iter()
        .filter_map(|record| match bill_impact_for(record, params) {
            Ok(impact) => Some(impact),
            Err(e) => {
                warn!(utility = %record.utility_name, error = %e, "Skipping bill impact");
                None
            }
        })
        .collect();

    info!(
        utilities = impacts.len(),
        base_year = params.base_year,
        "Computed residential bill impacts"
    );
    Ok(impacts)
}

/// One set of forecast assumptions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BillScenario {
    /// Scenario name
    pub name: String,
    /// O&M escalation
    pub om_escalation: f64,
    /// Rate base growth
    pub rate_base_growth: f64,
    /// WACC
    pub wacc: f64,
}

impl BillScenario {
    /// Create a scenario.
    pub fn new(name: impl Into<String>, om_escalation: f64, rate_base_growth: f64, wacc: f64) -> Self {
        Self {
            name: name.into(),
            om_escalation,
            rate_base_growth,
            wacc,
        }
    }

    /// The base case followed by six one-at-a-time variations.
    pub fn standard() -> Vec<Self> {
        vec![
            Self::new("Base Case", 0.03, 0.04, 0.075),
            Self::new("High O&M Escalation", 0.05, 0.04, 0.075),
            Self::new("Low O&M Escalation", 0.01, 0.04, 0.075),
            Self::new("High Rate Base Growth", 0.03, 0.06, 0.075),
            Self::new("Low Rate Base Growth", 0.03, 0.02, 0.075),
            Self::new("High WACC", 0.03, 0.04, 0.085),
            Self::new("Low WACC", 0.03, 0.04, 0.065),
        ]
    }
}

/// Monthly bill under one scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioResult {
    /// Utility name
    pub utility_name: String,
    /// Scenario name
    pub scenario: String,
    /// O&M escalation
    pub om_escalation: f64,
    /// Rate base growth
    pub rate_base_growth: f64,
    /// WACC
    pub wacc: f64,
    /// Test-year revenue requirement
    pub revenue_requirement: f64,
    /// Monthly bill, when the bill inputs are valid
    pub monthly_bill: Option<f64>,
    /// Difference from the first scenario's bill
    pub change_from_base: Option<f64>,
    /// Difference in percent of the first scenario's bill
    pub change_pct: Option<f64>,
}

/// Monthly bill under each scenario, compared with the first.
///
/// Pass-through O&M is not separated, so `base_om` is escalated in full.
pub fn sensitivity_analysis(
    utility_name: &str,
    base_om: f64,
    base_rate_base: f64,
    residential_share: f64,
    residential_sales_mwh: f64,
    avg_monthly_kwh: f64,
    scenarios: &[BillScenario],
) -> Result<Vec<ScenarioResult>> {
    let mut base_bill: Option<Option<f64>> = None;
    let mut results = Vec::with_capacity(scenarios.len());

    for scenario in scenarios {
        let revenue_requirement = calculate_revenue_requirement(
            base_om * (1.0 + scenario.om_escalation),
            0.0,
            base_rate_base * (1.0 + scenario.rate_base_growth),
            &RevenueRequirementParams::default().with_wacc(scenario.wacc),
        )?
        .revenue_requirement;

        let monthly_bill = calculate_residential_bill(
            revenue_requirement,
            residential_share,
            residential_sales_mwh,
            avg_monthly_kwh,
        )
        .ok()
        .map(|bill| bill.monthly_bill);

        let base = *base_bill.get_or_insert(monthly_bill);
        let change_from_base = monthly_bill.zip(base).map(|(bill, base)| bill - base);
        let change_pct = change_from_base.zip(base).map(|(change, base)| {
            if base != 0.0 {
                change / base * 100.0
            } else {
                0.0
            }
        });

        results.push(ScenarioResult {
            utility_name: utility_name.to_string(),
            scenario: scenario.name.clone(),
            om_escalation: scenario.om_escalation,
            rate_base_growth: scenario.rate_base_growth,
            wacc: scenario.wacc,
            revenue_requirement,
            monthly_bill,
            change_from_base,
            change_pct,
        });
    }

    Ok(results)
}

/// Class shares, bill impacts and scenario tables for one base year.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BillAnalyses {
    /// Revenue shares for every utility-year
    pub class_shares: Vec<ClassShares>,
    /// Base-year bill impacts
    pub bill_impacts: Vec<BillImpact>,
    /// Scenario results for every utility with complete inputs
    pub sensitivity: Vec<ScenarioResult>,
}

/// Run class shares, bill impact and scenario sensitivity together.
pub fn run_all_bill_analyses(records: &[UtilityYearRecord], base_year: i64) -> Result<BillAnalyses> {
    let params = BillImpactParams::for_base_year(base_year);
    let bill_impacts = bill_impact_analysis(records, &params)?;
    let scenarios = BillScenario::standard();

    let mut sensitivity = Vec::new();
    for record in base_year_records(records, base_year)? {
        let (Some(om), Some(rate_base), Some(sales), Some(residential_k)) = (
            record.om_total,
            record.rate_base,
            record.sales_mwh_residential,
            record.revenue_residential_k,
        ) else {
            continue;
        };
        if sales <= 0.0 {
            continue;
        }
        let residential_share = match record.revenue_total_k {
            Some(total) if total != 0.0 => residential_k / total,
            _ => 0.0,
        };
        sensitivity.extend(sensitivity_analysis(
            &record.utility_name,
            om,
            rate_base,
            residential_share,
            sales,
            params.avg_monthly_kwh,
            &scenarios,
        )?);
    }

    Ok(BillAnalyses {
        class_shares: calculate_class_shares(records),
        bill_impacts,
        sensitivity,
    })
}
