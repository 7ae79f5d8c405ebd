//! General Rate Case (GRC) scoped revenue requirement.
//!
//! The GRC covers only CPUC-jurisdictional costs: distribution, customer
//! service, and the electric share of administrative & general expense.
//! Production (fuel and purchased power), transmission (FERC jurisdiction)
//! and the gas share of A&G are reported as excluded. Taxes are a flat rate
//! on the pre-tax total rather than a gross-up.

use crate::{
    error::{Result, RevenueError},
    requirement::{DEPRECIATION_RATE, WACC, capital_charges},
};
use ratecase_data::{UtilityYearRecord, config::AG_ELECTRIC_ALLOCATION};
use serde::{Deserialize, Serialize};

/// Default flat GRC tax rate.
pub const GRC_TAX_RATE: f64 = 0.15;

/// Parameters of the GRC revenue requirement
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GrcParams {
    /// Annual depreciation as a fraction of rate base (default: 0.035)
    pub depreciation_rate: f64,
    /// Allowed return on rate base (default: 0.075)
    pub wacc: f64,
    /// Flat tax on the pre-tax total (default: 0.15)
    pub tax_rate: f64,
    /// Share of A&G allocated to electric (default: 0.70)
    pub ag_allocation: f64,
}

impl Default for GrcParams {
    fn default() -> Self {
        Self {
            depreciation_rate: DEPRECIATION_RATE,
            wacc: WACC,
            tax_rate: GRC_TAX_RATE,
            ag_allocation: AG_ELECTRIC_ALLOCATION,
        }
    }
}

/// O&M inputs of the GRC calculation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct GrcOmInputs {
    /// Distribution O&M
    pub distribution: f64,
    /// Customer service O&M
    pub customer_service: f64,
    /// Total A&G
    pub admin_general: f64,
    /// Production O&M (excluded)
    pub production: f64,
    /// Transmission O&M (excluded)
    pub transmission: f64,
    /// Other O&M (excluded)
    pub other: f64,
}

impl GrcOmInputs {
    /// Read GRC inputs from a record.
    ///
    /// The three in-scope components are required; excluded components
    /// default to zero.
    pub fn from_record(record: &UtilityYearRecord) -> Result<Self> {
        Ok(Self {
            distribution: record
                .om_distribution
                .ok_or(RevenueError::MissingField("om_distribution"))?,
            customer_service: record
                .om_customer_service
                .ok_or(RevenueError::MissingField("om_customer_service"))?,
            admin_general: record
                .om_admin_general
                .ok_or(RevenueError::MissingField("om_admin_general"))?,
            production: record.om_production.unwrap_or(0.0),
            transmission: record.om_transmission.unwrap_or(0.0),
            other: record.om_other.unwrap_or(0.0),
        })
    }

    /// Scale the in-scope components by `factor`.
    pub fn escalated(self, factor: f64) -> Self {
        Self {
            distribution: self.distribution * factor,
            customer_service: self.customer_service * factor,
            admin_general: self.admin_general * factor,
            ..self
        }
    }
}

/// Split of O&M into GRC scope and exclusions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GrcOm {
    /// Distribution O&M
    pub om_distribution: f64,
    /// Customer service O&M
    pub om_customer_service: f64,
    /// Total A&G
    pub om_ag_total: f64,
    /// Electric share of A&G
    pub om_ag_electric: f64,
    /// Gas share of A&G
    pub om_ag_gas: f64,
    /// Distribution + customer service + electric A&G
    pub om_grc: f64,
    /// Production + transmission + other + gas A&G
    pub om_excluded: f64,
}

/// Split O&M into its GRC-scoped and excluded parts.
pub fn calculate_grc_om(inputs: &GrcOmInputs, ag_allocation: f64) -> GrcOm {
    let om_ag_electric = inputs.admin_general * ag_allocation;
    let om_ag_gas = inputs.admin_general * (1.0 - ag_allocation);
    GrcOm {
        om_distribution: inputs.distribution,
        om_customer_service: inputs.customer_service,
        om_ag_total: inputs.admin_general,
        om_ag_electric,
        om_ag_gas,
        om_grc: inputs.distribution + inputs.customer_service + om_ag_electric,
        om_excluded: inputs.production + inputs.transmission + inputs.other + om_ag_gas,
    }
}

/// Components of one GRC revenue requirement.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GrcRevenueRequirement {
    /// GRC-scope O&M
    pub om_grc: f64,
    /// Electric share of A&G
    pub om_ag_electric: f64,
    /// O&M outside GRC scope
    pub om_excluded: f64,
    /// Depreciation expense
    pub depreciation: f64,
    /// Return on rate base
    pub return_on_rate_base: f64,
    /// GRC O&M + depreciation + return
    pub pre_tax_total: f64,
    /// Flat tax on the pre-tax total
    pub taxes: f64,
    /// GRC revenue requirement
    pub revenue_requirement: f64,
}

/// GRC revenue requirement from O&M inputs and a rate base.
pub fn calculate_grc_revenue_requirement(
    inputs: &GrcOmInputs,
    rate_base: f64,
    params: &GrcParams,
) -> GrcRevenueRequirement {
    let om = calculate_grc_om(inputs, params.ag_allocation);
    let (depreciation, return_on_rate_base) =
        capital_charges(rate_base, params.depreciation_rate, params.wacc);
    let pre_tax_total = om.om_grc + depreciation + return_on_rate_base;
    let taxes = pre_tax_total * params.tax_rate;

    GrcRevenueRequirement {
        om_grc: om.om_grc,
        om_ag_electric: om.om_ag_electric,
        om_excluded: om.om_excluded,
        depreciation,
        return_on_rate_base,
        pre_tax_total,
        taxes,
        revenue_requirement: pre_tax_total + taxes,
    }
}

/// GRC revenue requirement of one utility-year.
pub fn grc_revenue_requirement_for(
    record: &UtilityYearRecord,
    params: &GrcParams,
) -> Result<GrcRevenueRequirement> {
    let inputs = GrcOmInputs::from_record(record)?;
    let rate_base = record.rate_base.ok_or(RevenueError::MissingField("rate_base"))?;
    Ok(calculate_grc_revenue_requirement(&inputs, rate_base, params))
}
