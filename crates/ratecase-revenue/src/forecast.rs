//! Test-year forecasts and WACC sensitivity.

use crate::{
    error::{Result, RevenueError},
    grc::{GrcOmInputs, GrcParams, calculate_grc_revenue_requirement},
    requirement::{RevenueRequirementParams, WACC, calculate_revenue_requirement},
};
use ratecase_data::UtilityYearRecord;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// WACC values swept by [`rr_sensitivity_by_wacc`] when none are given.
pub const DEFAULT_WACC_SWEEP: [f64; 5] = [0.055, 0.065, 0.075, 0.085, 0.095];

/// Revenue requirement methodology.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RrMethodology {
    /// Total O&M less pass-through, grossed-up taxes
    #[default]
    Total,
    /// GRC-scoped O&M, flat tax
    Grc,
}

/// Parameters of a test-year forecast
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastParams {
    /// Year the forecast starts from (default: 2023)
    pub base_year: i64,
    /// Annual O&M escalation (default: 0.03)
    pub om_escalation: f64,
    /// Annual rate base growth (default: 0.04)
    pub rate_base_growth: f64,
    /// Years between base and test year (default: 1)
    pub horizon_years: u32,
    /// WACC applied to both base and test year (default: 0.075)
    pub wacc: f64,
}

impl Default for ForecastParams {
    fn default() -> Self {
        Self {
            base_year: 2023,
            om_escalation: 0.03,
            rate_base_growth: 0.04,
            horizon_years: 1,
            wacc: WACC,
        }
    }
}

impl ForecastParams {
    /// Compound O&M escalation over the horizon.
    pub fn om_factor(&self) -> f64 {
        (1.0 + self.om_escalation).powf(f64::from(self.horizon_years))
    }

    /// Compound rate base growth over the horizon.
    pub fn rate_base_factor(&self) -> f64 {
        (1.0 + self.rate_base_growth).powf(f64::from(self.horizon_years))
    }
}

/// Base-year and test-year revenue requirement of one utility.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestYearForecast {
    /// FERC respondent id
    pub utility_id_ferc1: i64,
    /// Utility name
    pub utility_name: String,
    /// Methodology used
    pub methodology: RrMethodology,
    /// Base year
    pub base_year: i64,
    /// Test year
    pub forecast_year: i64,
    /// Base-year O&M in the methodology's scope
    pub base_om: f64,
    /// Escalated O&M
    pub forecast_om: f64,
    /// Base-year rate base
    pub base_rate_base: f64,
    /// Grown rate base
    pub forecast_rate_base: f64,
    /// Base-year revenue requirement
    pub base_year_rr: f64,
    /// Test-year revenue requirement
    pub forecast_year_rr: f64,
    /// `forecast_year_rr - base_year_rr`
    pub rr_change: f64,
    /// Change as a percentage of the base-year requirement
    pub rr_change_pct: Option<f64>,
    /// O&M escalation applied
    pub om_escalation_rate: f64,
    /// Rate base growth applied
    pub rate_base_growth_rate: f64,
    /// WACC applied
    pub wacc: f64,
}

/// Records of `base_year`, failing with [`RevenueError::InvalidSelector`]
/// when there are none.
pub fn base_year_records(
    records: &[UtilityYearRecord],
    base_year: i64,
) -> Result<Vec<&UtilityYearRecord>> {
    let base: Vec<_> = records
        .iter()
        .filter(|r| r.report_year == base_year)
        .collect();
    if base.is_empty() {
        return Err(RevenueError::InvalidSelector(format!(
            "no data for base year {base_year}"
        )));
    }
    Ok(base)
}

fn total_forecast(
    record: &UtilityYearRecord,
    params: &ForecastParams,
) -> Result<Option<(f64, f64, f64, f64)>> {
    let (Some(om_total), Some(rate_base)) = (record.om_total, record.rate_base) else {
        return Ok(None);
    };
    let rr_params = RevenueRequirementParams::default().with_wacc(params.wacc);
    let om_other = record.om_other.unwrap_or(0.0);
    let forecast_om = om_total * params.om_factor();
    let base = calculate_revenue_requirement(om_total, om_other, rate_base, &rr_params)?;
    let forecast = calculate_revenue_requirement(
        forecast_om,
        om_other,
        rate_base * params.rate_base_factor(),
        &rr_params,
    )?;
    Ok(Some((
        om_total,
        forecast_om,
        base.revenue_requirement,
        forecast.revenue_requirement,
    )))
}

fn grc_forecast(
    record: &UtilityYearRecord,
    params: &ForecastParams,
) -> Result<Option<(f64, f64, f64, f64)>> {
    let (Ok(inputs), Some(rate_base)) = (GrcOmInputs::from_record(record), record.rate_base)
    else {
        return Ok(None);
    };
    let grc_params = GrcParams {
        wacc: params.wacc,
        ..Default::default()
    };
    let base = calculate_grc_revenue_requirement(&inputs, rate_base, &grc_params);
    let forecast = calculate_grc_revenue_requirement(
        &inputs.escalated(params.om_factor()),
        rate_base * params.rate_base_factor(),
        &grc_params,
    );
    Ok(Some((
        base.om_grc,
        forecast.om_grc,
        base.revenue_requirement,
        forecast.revenue_requirement,
    )))
}

/// Project each utility's revenue requirement from the base year to the test
/// year.
///
/// O&M is escalated by `(1 + om_escalation)^horizon` and rate base by
/// `(1 + rate_base_growth)^horizon`. Utilities missing O&M or rate base in the
/// base year are skipped.
pub fn forecast_test_year(
    records: &[UtilityYearRecord],
    params: &ForecastParams,
    methodology: RrMethodology,
) -> Result<Vec<TestYearForecast>> {
    let mut forecasts = Vec::new();
    for record in base_year_records(records, params.base_year)? {
        let values = match methodology {
            RrMethodology::Total => total_forecast(record, params)?,
            RrMethodology::Grc => grc_forecast(record, params)?,
        };
        let Some((base_om, forecast_om, base_year_rr, forecast_year_rr)) = values else {
            debug!(utility = %record.utility_name, "Skipping forecast, missing O&M or rate base");
            continue;
        };
        let base_rate_base = record.rate_base.unwrap_or_default();
        let rr_change = forecast_year_rr - base_year_rr;

        forecasts.push(TestYearForecast {
            utility_id_ferc1: record.utility_id_ferc1,
            utility_name: record.utility_name.clone(),
            methodology,
            base_year: params.base_year,
            forecast_year: params.base_year + i64::from(params.horizon_years),
            base_om,
            forecast_om,
            base_rate_base,
            forecast_rate_base: base_rate_base * params.rate_base_factor(),
            base_year_rr,
            forecast_year_rr,
            rr_change,
            rr_change_pct: (base_year_rr != 0.0).then(|| rr_change / base_year_rr * 100.0),
            om_escalation_rate: params.om_escalation,
            rate_base_growth_rate: params.rate_base_growth,
            wacc: params.wacc,
        });
    }

    info!(
        utilities = forecasts.len(),
        ?methodology,
        base_year = params.base_year,
        "Forecast test-year revenue requirement"
    );
    Ok(forecasts)
}

/// Revenue requirement at one WACC.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaccSensitivity {
    /// Utility name
    pub utility_name: String,
    /// WACC
    pub wacc: f64,
    /// WACC in percent
    pub wacc_pct: f64,
    /// Revenue requirement at this WACC
    pub revenue_requirement: f64,
    /// Difference from the first swept WACC
    pub change_from_base: f64,
    /// Difference in percent of the first swept requirement
    pub change_pct: f64,
}

/// Revenue requirement across a range of WACC values.
///
/// The first value is the baseline, whatever its rank. Pass-through O&M is
/// not separated here, so `om_total` is used in full.
pub fn rr_sensitivity_by_wacc(
    utility_name: &str,
    om_total: f64,
    rate_base: f64,
    waccs: Option<&[f64]>,
) -> Result<Vec<WaccSensitivity>> {
    let waccs = waccs.unwrap_or(&DEFAULT_WACC_SWEEP);
    let mut baseline = None;
    waccs
        .iter()
        .map(|&wacc| {
            let rr = calculate_revenue_requirement(
                om_total,
                0.0,
                rate_base,
                &RevenueRequirementParams::default().with_wacc(wacc),
            )?
            .revenue_requirement;
            let base = *baseline.get_or_insert(rr);
            let change_from_base = rr - base;
            Ok(WaccSensitivity {
                utility_name: utility_name.to_string(),
                wacc,
                wacc_pct: wacc * 100.0,
                revenue_requirement: rr,
                change_from_base,
                change_pct: if base != 0.0 {
                    change_from_base / base * 100.0
                } else {
                    0.0
                },
            })
        })
        .collect()
}
