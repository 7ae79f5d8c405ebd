//! Total revenue requirement.
//!
//! The revenue requirement is the annual revenue a utility needs to recover
//! its costs:
//!
//! ```text
//! RR = O&M + depreciation + return on rate base + taxes
//! ```
//!
//! Pass-through costs (`om_other`, mostly purchased power) are excluded from
//! O&M by default. Depreciation and return apply to a positive rate base
//! only, and taxes gross the pre-tax total up so that `RR - taxes` is the
//! pre-tax total: `taxes = pre_tax * t / (1 - t)`.

use crate::{
    error::{Result, RevenueError},
    grc::{GrcParams, grc_revenue_requirement_for},
};
use ratecase_data::UtilityYearRecord;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Default depreciation as a fraction of rate base.
pub const DEPRECIATION_RATE: f64 = 0.035;

/// Default weighted average cost of capital.
pub const WACC: f64 = 0.075;

/// Default combined federal and state income tax rate.
pub const TAX_RATE: f64 = 0.27;

/// Parameters of the total revenue requirement
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RevenueRequirementParams {
    /// Annual depreciation as a fraction of rate base (default: 0.035)
    pub depreciation_rate: f64,
    /// Allowed return on rate base (default: 0.075)
    pub wacc: f64,
    /// Income tax rate used for the gross-up (default: 0.27)
    pub tax_rate: f64,
    /// Leave `om_other` out of O&M (default: true)
    pub exclude_passthrough: bool,
}

impl Default for RevenueRequirementParams {
    fn default() -> Self {
        Self {
            depreciation_rate: DEPRECIATION_RATE,
            wacc: WACC,
            tax_rate: TAX_RATE,
            exclude_passthrough: true,
        }
    }
}

impl RevenueRequirementParams {
    /// Same parameters with a different WACC.
    pub const fn with_wacc(mut self, wacc: f64) -> Self {
        self.wacc = wacc;
        self
    }

    /// Fails with [`RevenueError::InvalidParameter`] when the tax rate is 1
    /// or more.
    pub fn validate(&self) -> Result<()> {
        if self.tax_rate >= 1.0 {
            return Err(RevenueError::InvalidParameter(format!(
                "tax rate must be below 1, got {}",
                self.tax_rate
            )));
        }
        Ok(())
    }
}

/// Components of one revenue requirement calculation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RevenueRequirement {
    /// O&M recovered through base rates
    pub om_expense: f64,
    /// O&M excluded as pass-through
    pub om_passthrough: f64,
    /// Depreciation expense
    pub depreciation: f64,
    /// Return on rate base
    pub return_on_rate_base: f64,
    /// O&M + depreciation + return
    pub pre_tax_total: f64,
    /// Income tax gross-up
    pub taxes: f64,
    /// Total revenue requirement
    pub revenue_requirement: f64,
}

/// Depreciation and return on a rate base; both are zero unless the rate
/// base is positive.
pub fn capital_charges(rate_base: f64, depreciation_rate: f64, wacc: f64) -> (f64, f64) {
    if rate_base <= 0.0 {
        (0.0, 0.0)
    } else {
        (rate_base * depreciation_rate, rate_base * wacc)
    }
}

/// Total revenue requirement from raw inputs.
///
/// Fails with [`RevenueError::InvalidParameter`] when the tax rate is 1 or
/// more.
pub fn calculate_revenue_requirement(
    om_total: f64,
    om_other: f64,
    rate_base: f64,
    params: &RevenueRequirementParams,
) -> Result<RevenueRequirement> {
    params.validate()?;

    let (om_expense, om_passthrough) = if params.exclude_passthrough {
        (om_total - om_other, om_other)
    } else {
        (om_total, 0.0)
    };
    let (depreciation, return_on_rate_base) =
        capital_charges(rate_base, params.depreciation_rate, params.wacc);

    let pre_tax_total = om_expense + depreciation + return_on_rate_base;
    let taxes = pre_tax_total * params.tax_rate / (1.0 - params.tax_rate);

    Ok(RevenueRequirement {
        om_expense,
        om_passthrough,
        depreciation,
        return_on_rate_base,
        pre_tax_total,
        taxes,
        revenue_requirement: pre_tax_total + taxes,
    })
}

/// Total revenue requirement of one utility-year.
///
/// A missing `om_other` counts as zero; a missing `om_total` or `rate_base`
/// is a [`RevenueError::MissingField`].
pub fn revenue_requirement_for(
    record: &UtilityYearRecord,
    params: &RevenueRequirementParams,
) -> Result<RevenueRequirement> {
    let om_total = record.om_total.ok_or(RevenueError::MissingField("om_total"))?;
    let rate_base = record.rate_base.ok_or(RevenueError::MissingField("rate_base"))?;
    calculate_revenue_requirement(
        om_total,
        record.om_other.unwrap_or(0.0),
        rate_base,
        params,
    )
}

/// An analysis-ready row extended with total and GRC revenue requirement
/// columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevenueRequirementRow {
    /// Source utility-year
    #[serde(flatten)]
    pub record: UtilityYearRecord,
    /// Depreciation expense
    pub depreciation: Option<f64>,
    /// Return on rate base
    pub return_on_rate_base: Option<f64>,
    /// Income tax gross-up (total methodology)
    pub taxes: Option<f64>,
    /// Total revenue requirement
    pub revenue_requirement: Option<f64>,
    /// FERC operating revenue, or EIA total revenue when FERC is missing
    pub actual_revenue: Option<f64>,
    /// `revenue_requirement - actual_revenue`
    pub revenue_gap: Option<f64>,
    /// Gap as a percentage of actual revenue
    pub revenue_gap_pct: Option<f64>,
    /// GRC-scope O&M
    pub om_grc: Option<f64>,
    /// Electric share of A&G
    pub om_ag_electric: Option<f64>,
    /// O&M outside GRC scope
    pub om_excluded: Option<f64>,
    /// Flat GRC tax
    pub taxes_grc: Option<f64>,
    /// GRC revenue requirement
    pub revenue_requirement_grc: Option<f64>,
    /// GRC O&M per customer
    pub om_per_customer_grc: Option<f64>,
    /// GRC O&M per MWh
    pub om_per_mwh_grc: Option<f64>,
}

fn ratio(numerator: Option<f64>, denominator: Option<f64>) -> Option<f64> {
    match (numerator, denominator) {
        (Some(n), Some(d)) if d != 0.0 => Some(n / d),
        _ => None,
    }
}

/// Actual revenue of a utility-year: FERC account 400 revenue, falling back
/// to EIA total revenue converted from thousands of dollars.
pub fn actual_revenue(record: &UtilityYearRecord) -> Option<f64> {
    record
        .operating_revenues_ferc
        .or_else(|| record.revenue_total_k.map(|k| k * 1000.0))
}

/// Apply the default total and GRC parameters to every record.
pub fn apply_rr_to_dataset(records: &[UtilityYearRecord]) -> Result<Vec<RevenueRequirementRow>> {
    apply_rr_to_dataset_with(
        records,
        &RevenueRequirementParams::default(),
        &GrcParams::default(),
    )
}

/// Null out a result whose inputs are missing from the record; every other
/// error is returned.
fn unless_missing<T>(result: Result<T>, record: &UtilityYearRecord, what: &str) -> Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(RevenueError::MissingField(field)) => {
            warn!(
                utility = %record.utility_name,
                year = record.report_year,
                field,
                "{what} unavailable"
            );
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

/// Compute both revenue requirements for every record.
///
/// Parameters are checked once up front. A record whose inputs are missing
/// gets null result columns and a warning; the remaining records are
/// unaffected.
pub fn apply_rr_to_dataset_with(
    records: &[UtilityYearRecord],
    params: &RevenueRequirementParams,
    grc_params: &GrcParams,
) -> Result<Vec<RevenueRequirementRow>> {
    params.validate()?;

    records
        .iter()
        .map(|record| {
            let total = unless_missing(
                revenue_requirement_for(record, params),
                record,
                "Revenue requirement",
            )?;
            let grc = unless_missing(
                grc_revenue_requirement_for(record, grc_params),
                record,
                "GRC revenue requirement",
            )?;

            let revenue_requirement = total.map(|rr| rr.revenue_requirement);
            let actual = actual_revenue(record);
            let revenue_gap = revenue_requirement.zip(actual).map(|(rr, a)| rr - a);
            let om_grc = grc.map(|g| g.om_grc);

            Ok(RevenueRequirementRow {
                record: record.clone(),
                depreciation: total.map(|rr| rr.depreciation),
                return_on_rate_base: total.map(|rr| rr.return_on_rate_base),
                taxes: total.map(|rr| rr.taxes),
                revenue_requirement,
                actual_revenue: actual,
                revenue_gap,
                revenue_gap_pct: ratio(revenue_gap, actual).map(|r| r * 100.0),
                om_grc,
                om_ag_electric: grc.map(|g| g.om_ag_electric),
                om_excluded: grc.map(|g| g.om_excluded),
                taxes_grc: grc.map(|g| g.taxes),
                revenue_requirement_grc: grc.map(|g| g.revenue_requirement),
                om_per_customer_grc: ratio(om_grc, record.customers_total),
                om_per_mwh_grc: ratio(om_grc, record.sales_mwh_total),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ratecase_data::Utility;

    fn record(om_total: Option<f64>, om_other: Option<f64>, rate_base: Option<f64>) -> UtilityYearRecord {
        let mut r = UtilityYearRecord::new(Utility::PacificGasElectric, 2023);
        r.om_total = om_total;
        r.om_other = om_other;
        r.rate_base = rate_base;
        r
    }

    #[test]
    fn test_components() {
        let rr = calculate_revenue_requirement(
            1_000.0,
            200.0,
            10_000.0,
            &RevenueRequirementParams::default(),
        )
        .unwrap();
        assert_relative_eq!(rr.om_expense, 800.0);
        assert_relative_eq!(rr.om_passthrough, 200.0);
        assert_relative_eq!(rr.depreciation, 350.0);
        assert_relative_eq!(rr.return_on_rate_base, 750.0);
        assert_relative_eq!(rr.pre_tax_total, 1_900.0);
        assert_relative_eq!(rr.taxes, 1_900.0 * 0.27 / 0.73);
        assert_relative_eq!(rr.revenue_requirement, 1_900.0 / 0.73, epsilon = 1e-9);
    }

    #[test]
    fn test_gross_up_round_trip() {
        let rr = calculate_revenue_requirement(
            5_432.1,
            0.0,
            98_765.4,
            &RevenueRequirementParams::default(),
        )
        .unwrap();
        assert_relative_eq!(rr.revenue_requirement - rr.taxes, rr.pre_tax_total, epsilon = 1e-6);
        assert_relative_eq!(rr.taxes, rr.revenue_requirement * TAX_RATE, epsilon = 1e-6);
    }

    #[test]
    fn test_passthrough_inclusion() {
        let params = RevenueRequirementParams {
            exclude_passthrough: false,
            ..Default::default()
        };
        let rr = calculate_revenue_requirement(1_000.0, 200.0, 0.0, &params).unwrap();
        assert_relative_eq!(rr.om_expense, 1_000.0);
        assert_relative_eq!(rr.om_passthrough, 0.0);
    }

    #[test]
    fn test_non_positive_rate_base_has_no_capital_charges() {
        for rate_base in [0.0, -5_000.0] {
            let rr = calculate_revenue_requirement(
                100.0,
                0.0,
                rate_base,
                &RevenueRequirementParams::default(),
            )
            .unwrap();
            assert_eq!(rr.depreciation, 0.0);
            assert_eq!(rr.return_on_rate_base, 0.0);
            assert_relative_eq!(rr.pre_tax_total, 100.0);
        }
    }

    #[test]
    fn test_tax_rate_of_one_is_rejected() {
        let params = RevenueRequirementParams {
            tax_rate: 1.0,
            ..Default::default()
        };
        let err = calculate_revenue_requirement(1.0, 0.0, 1.0, &params).unwrap_err();
        assert!(matches!(err, RevenueError::InvalidParameter(_)));
    }

    #[test]
    fn test_missing_fields() {
        let params = RevenueRequirementParams::default();
        let err = revenue_requirement_for(&record(None, None, Some(1.0)), &params).unwrap_err();
        assert!(matches!(err, RevenueError::MissingField("om_total")));
        let err = revenue_requirement_for(&record(Some(1.0), None, None), &params).unwrap_err();
        assert!(matches!(err, RevenueError::MissingField("rate_base")));
        let rr = revenue_requirement_for(&record(Some(10.0), None, Some(0.0)), &params).unwrap();
        assert_relative_eq!(rr.om_expense, 10.0);
    }

    #[test]
    fn test_dataset_isolates_failures() {
        let mut good = record(Some(1_000.0), Some(0.0), Some(10_000.0));
        good.operating_revenues_ferc = Some(2_000.0);
        good.om_distribution = Some(300.0);
        good.om_customer_service = Some(100.0);
        good.om_admin_general = Some(100.0);
        good.customers_total = Some(10.0);
        good.sales_mwh_total = Some(0.0);

        let mut bad = record(None, None, Some(10_000.0));
        bad.revenue_total_k = Some(3.0);

        let rows = apply_rr_to_dataset(&[good, bad]).unwrap();
        assert_eq!(rows.len(), 2);

        let rr = rows[0].revenue_requirement.unwrap();
        assert_relative_eq!(rr, 2_100.0 / 0.73, epsilon = 1e-9);
        assert_relative_eq!(rows[0].revenue_gap.unwrap(), rr - 2_000.0);
        assert_relative_eq!(
            rows[0].revenue_gap_pct.unwrap(),
            (rr - 2_000.0) / 2_000.0 * 100.0
        );
        assert_relative_eq!(rows[0].om_grc.unwrap(), 470.0);
        assert_relative_eq!(rows[0].om_per_customer_grc.unwrap(), 47.0);
        assert_eq!(rows[0].om_per_mwh_grc, None);

        assert_eq!(rows[1].revenue_requirement, None);
        assert_eq!(rows[1].taxes, None);
        assert_eq!(rows[1].actual_revenue, Some(3_000.0));
        assert_eq!(rows[1].revenue_gap, None);
        assert_eq!(rows[1].revenue_requirement_grc, None);
    }

    #[test]
    fn test_gap_pct_null_on_zero_revenue() {
        let mut r = record(Some(1.0), None, Some(1.0));
        r.operating_revenues_ferc = Some(0.0);
        let rows = apply_rr_to_dataset(&[r]).unwrap();
        assert!(rows[0].revenue_gap.is_some());
        assert_eq!(rows[0].revenue_gap_pct, None);
    }

    #[test]
    fn test_dataset_rejects_invalid_tax_rate() {
        let params = RevenueRequirementParams {
            tax_rate: 1.0,
            ..Default::default()
        };
        let err = apply_rr_to_dataset_with(
            &[record(Some(1_000.0), None, Some(10_000.0))],
            &params,
            &GrcParams::default(),
        )
        .unwrap_err();
        assert!(matches!(err, RevenueError::InvalidParameter(_)));

        // An empty dataset still gets its parameters checked.
        assert!(apply_rr_to_dataset_with(&[], &params, &GrcParams::default()).is_err());
    }
}
