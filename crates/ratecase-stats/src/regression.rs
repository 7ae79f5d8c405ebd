//! Cost-driver regression and multicollinearity diagnostics.
//!
//! Total O&M is regressed on customers, sales and rate base with an
//! intercept. Rows missing any of the four columns are dropped.

use crate::{
    error::{Result, StatsError},
    linalg::{add_constant, least_squares, r_squared},
};
use ndarray::{Array1, Array2, Axis};
use ratecase_data::UtilityYearRecord;
use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, FisherSnedecor, StudentsT};
use std::fmt;

/// Regressors of the cost-driver model.
pub const COST_DRIVERS: [&str; 3] = ["customers_total", "sales_mwh_total", "rate_base"];

/// Minimum complete rows for the cost-driver regression.
pub const MIN_REGRESSION_ROWS: usize = 4;

/// One estimated coefficient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coefficient {
    /// Regressor name (`const` for the intercept)
    pub name: String,
    /// Point estimate
    pub estimate: f64,
    /// Standard error
    pub std_error: Option<f64>,
    /// t statistic
    pub t_value: Option<f64>,
    /// Two-sided p-value
    pub p_value: Option<f64>,
}

/// Fitted ordinary least squares model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OlsResult {
    /// Response name
    pub dependent: String,
    /// Coefficients, intercept first
    pub coefficients: Vec<Coefficient>,
    /// Observations used
    pub n_obs: usize,
    /// Regressors excluding the intercept
    pub df_model: usize,
    /// Residual degrees of freedom
    pub df_resid: usize,
    /// Coefficient of determination
    pub r_squared: f64,
    /// R² adjusted for degrees of freedom
    pub adj_r_squared: Option<f64>,
    /// Overall F statistic
    pub f_statistic: Option<f64>,
    /// p-value of the F statistic
    pub f_pvalue: Option<f64>,
}

impl OlsResult {
    /// Coefficient by regressor name.
    pub fn coefficient(&self, name: &str) -> Option<&Coefficient> {
        self.coefficients.iter().find(|c| c.name == name)
    }

    /// Regressors, other than the intercept, with `p < alpha`.
    pub fn significant(&self, alpha: f64) -> Vec<String> {
        self.coefficients
            .iter()
            .filter(|c| c.name != "const" && c.p_value.is_some_and(|p| p < alpha))
            .map(|c| c.name.clone())
            .collect()
    }

    /// Plain-text regression table.
    pub fn summary(&self) -> String {
        self.to_string()
    }
}

fn fmt_opt(v: Option<f64>, precision: usize) -> String {
    v.map_or_else(|| "nan".to_string(), |x| format!("{x:.precision$}"))
}

impl fmt::Display for OlsResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = "=".repeat(78);
        writeln!(f, "{rule}")?;
        writeln!(f, "OLS Regression Results")?;
        writeln!(f, "{rule}")?;
        writeln!(f, "Dep. Variable: {:<24} R-squared:      {:>10.4}", self.dependent, self.r_squared)?;
        writeln!(
            f,
            "No. Observations: {:<21} Adj. R-squared: {:>10}",
            self.n_obs,
            fmt_opt(self.adj_r_squared, 4)
        )?;
        writeln!(
            f,
            "Df Residuals: {:<25} F-statistic:    {:>10}",
            self.df_resid,
            fmt_opt(self.f_statistic, 4)
        )?;
        writeln!(
            f,
            "Df Model: {:<29} Prob (F-stat):  {:>10}",
            self.df_model,
            fmt_opt(self.f_pvalue, 4)
        )?;
        writeln!(f, "{}", "-".repeat(78))?;
        writeln!(
            f,
            "{:<18} {:>14} {:>14} {:>12} {:>12}",
            "", "coef", "std err", "t", "P>|t|"
        )?;
        for c in &self.coefficients {
            writeln!(
                f,
                "{:<18} {:>14.4e} {:>14} {:>12} {:>12}",
                c.name,
                c.estimate,
                c.std_error.map_or_else(|| "nan".to_string(), |v| format!("{v:.4e}")),
                fmt_opt(c.t_value, 3),
                fmt_opt(c.p_value, 3)
            )?;
        }
        write!(f, "{rule}")
    }
}

/// Fit `y` on an intercept plus the columns of `x`.
///
/// Inference fields are `None` when there are no residual degrees of
/// freedom.
pub fn fit_ols(dependent: &str, names: &[&str], x: &Array2<f64>, y: &Array1<f64>) -> Result<OlsResult> {
    let n = x.nrows();
    let k = x.ncols() + 1;
    if n < k {
        return Err(StatsError::InsufficientData {
            required: k,
            actual: n,
        });
    }

    let design = add_constant(x.view());
    let (beta, xtx_inv) = least_squares(design.view(), y.view())?;
    let fitted = design.dot(&beta);
    let r2 = r_squared(y.view(), fitted.view());
    let ssr: f64 = y.iter().zip(&fitted).map(|(a, b)| (a - b).powi(2)).sum();

    let df_model = k - 1;
    let df_resid = n - k;

    let (t_dist, f_dist) = if df_resid > 0 {
        let t = StudentsT::new(0.0, 1.0, df_resid as f64)
            .map_err(|e| StatsError::Distribution(e.to_string()))?;
        let f = FisherSnedecor::new(df_model as f64, df_resid as f64)
            .map_err(|e| StatsError::Distribution(e.to_string()))?;
        (Some(t), Some(f))
    } else {
        (None, None)
    };
    let sigma2 = (df_resid > 0).then(|| ssr / df_resid as f64);

    let coefficients = std::iter::once("const")
        .chain(names.iter().copied())
        .enumerate()
        .map(|(i, name)| {
            let std_error = sigma2.map(|s2| (s2 * xtx_inv[[i, i]]).sqrt());
            let t_value = std_error.map(|se| beta[i] / se);
            let p_value = t_value.zip(t_dist.as_ref()).map(|(t, d)| 2.0 * d.sf(t.abs()));
            Coefficient {
                name: name.to_string(),
                estimate: beta[i],
                std_error,
                t_value,
                p_value,
            }
        })
        .collect();

    let adj_r_squared =
        (df_resid > 0).then(|| 1.0 - (n - 1) as f64 / df_resid as f64 * (1.0 - r2));
    let f_statistic = (df_resid > 0 && r2 < 1.0)
        .then(|| (r2 / df_model as f64) / ((1.0 - r2) / df_resid as f64));
    let f_pvalue = f_statistic.zip(f_dist.as_ref()).map(|(fs, d)| d.sf(fs));

    Ok(OlsResult {
        dependent: dependent.to_string(),
        coefficients,
        n_obs: n,
        df_model,
        df_resid,
        r_squared: r2,
        adj_r_squared,
        f_statistic,
        f_pvalue,
    })
}

fn complete_rows(records: &[UtilityYearRecord], columns: &[&str]) -> Array2<f64> {
    let rows: Vec<Vec<f64>> = records
        .iter()
        .filter_map(|r| {
            columns
                .iter()
                .map(|c| r.metric(c).flatten().filter(|v| v.is_finite()))
                .collect::<Option<Vec<f64>>>()
        })
        .collect();
    let mut out = Array2::<f64>::zeros((rows.len(), columns.len()));
    for (i, row) in rows.iter().enumerate() {
        for (j, v) in row.iter().enumerate() {
            out[[i, j]] = *v;
        }
    }
    out
}

/// Regress `om_total` on customers, sales and rate base.
pub fn cost_driver_regression(records: &[UtilityYearRecord]) -> Result<OlsResult> {
    let mut columns = vec!["om_total"];
    columns.extend(COST_DRIVERS);
    let data = complete_rows(records, &columns);
    if data.nrows() < MIN_REGRESSION_ROWS {
        return Err(StatsError::InsufficientData {
            required: MIN_REGRESSION_ROWS,
            actual: data.nrows(),
        });
    }

    let y = data.column(0).to_owned();
    let x = data.slice(ndarray::s![.., 1..]).to_owned();
    fit_ols("om_total", &COST_DRIVERS, &x, &y)
}

/// Variance inflation factor of one regressor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VifResult {
    /// Regressor name
    pub variable: String,
    /// `1 / (1 - R²)` of the regressor on the others
    pub vif: f64,
}

/// Variance inflation factor for each cost driver.
///
/// Each regressor is fitted on the others plus an intercept over rows where
/// all three are present. A perfectly explained regressor has an infinite
/// VIF.
pub fn check_multicollinearity(records: &[UtilityYearRecord]) -> Result<Vec<VifResult>> {
    let x = complete_rows(records, &COST_DRIVERS);
    if x.nrows() < MIN_REGRESSION_ROWS {
        return Err(StatsError::InsufficientData {
            required: MIN_REGRESSION_ROWS,
            actual: x.nrows(),
        });
    }

    COST_DRIVERS
        .iter()
        .enumerate()
        .map(|(i, name)| {
            let y = x.column(i).to_owned();
            let others = x.select(
                Axis(1),
                &(0..COST_DRIVERS.len()).filter(|&j| j != i).collect::<Vec<_>>(),
            );
            let design = add_constant(others.view());
            let r2 = match least_squares(design.view(), y.view()) {
                Ok((beta, _)) => r_squared(y.view(), design.dot(&beta).view()),
                Err(StatsError::SingularMatrix) => 1.0,
                Err(e) => return Err(e),
            };
            let vif = if r2 >= 1.0 { f64::INFINITY } else { 1.0 / (1.0 - r2) };
            Ok(VifResult {
                variable: (*name).to_string(),
                vif,
            })
        })
        .collect()
}
