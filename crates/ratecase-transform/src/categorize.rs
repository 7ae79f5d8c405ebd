//! FERC account classification.
//!
//! Operating expense accounts fall into functional categories by inclusive
//! numeric band. Sub-accounts such as `920.1` belong to the band of their
//! integer prefix; anything outside every band, or not a number at all, is
//! `other`.

use crate::{error::Result, step::TransformStep};
use polars::prelude::*;
use ratecase_data::config::FERC_ACCOUNT_BANDS;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Functional O&M category of a FERC account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpenseCategory {
    /// Accounts 500-557
    Production,
    /// Accounts 560-574
    Transmission,
    /// Accounts 580-598
    Distribution,
    /// Accounts 901-910
    CustomerService,
    /// Accounts 920-935
    AdminGeneral,
    /// Everything else
    Other,
}

impl ExpenseCategory {
    /// Every category, in wide-table column order.
    pub const ALL: [Self; 6] = [
        Self::Production,
        Self::Transmission,
        Self::Distribution,
        Self::CustomerService,
        Self::AdminGeneral,
        Self::Other,
    ];

    /// Category label stored in the `category` column.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Production => "production",
            Self::Transmission => "transmission",
            Self::Distribution => "distribution",
            Self::CustomerService => "customer_service",
            Self::AdminGeneral => "admin_general",
            Self::Other => "other",
        }
    }

    /// Wide-table column holding this category's O&M.
    pub const fn column(&self) -> &'static str {
        match self {
            Self::Production => "om_production",
            Self::Transmission => "om_transmission",
            Self::Distribution => "om_distribution",
            Self::CustomerService => "om_customer_service",
            Self::AdminGeneral => "om_admin_general",
            Self::Other => "om_other",
        }
    }

    /// Parse a category label.
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == label)
    }

    /// Category of an integer account number.
    pub fn from_account(account: i64) -> Self {
        FERC_ACCOUNT_BANDS
            .iter()
            .find(|(_, (lo, hi))| (*lo..=*hi).contains(&account))
            .and_then(|(label, _)| Self::from_label(label))
            .unwrap_or(Self::Other)
    }
}

impl fmt::Display for ExpenseCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Categorize a FERC account code such as `"500"` or `"920.1"`.
pub fn categorize_ferc_account(code: &str) -> ExpenseCategory {
    match code.trim().parse::<f64>() {
        Ok(value) if value.is_finite() => ExpenseCategory::from_account(value.trunc() as i64),
        _ => ExpenseCategory::Other,
    }
}

/// Expression mapping `ferc_account` to its category label.
pub fn category_expr() -> Expr {
    let account = col("ferc_account")
        .cast(DataType::String)
        .cast(DataType::Float64)
        .cast(DataType::Int64);

    FERC_ACCOUNT_BANDS
        .iter()
        .rev()
        .fold(lit(ExpenseCategory::Other.as_str()), |otherwise, (label, (lo, hi))| {
            when(
                account
                    .clone()
                    .gt_eq(lit(*lo))
                    .and(account.clone().lt_eq(lit(*hi))),
            )
            .then(lit(*label))
            .otherwise(otherwise)
        })
        .alias("category")
}

/// Adds a `category` column derived from `ferc_account`.
#[derive(Debug, Default, Clone, Copy)]
pub struct CategorizeExpenses;

impl TransformStep for CategorizeExpenses {
    fn name(&self) -> &str {
        "categorize_expenses"
    }

    fn required_columns(&self) -> &[&str] {
        &["ferc_account"]
    }

    fn apply(&self, data: LazyFrame) -> Result<LazyFrame> {
        Ok(data.with_column(category_expr()))
    }
}

/// Add a `category` column to an operating expenses frame.
pub fn categorize_operating_expenses(df: &DataFrame) -> Result<DataFrame> {
    CategorizeExpenses.run(df)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("500", ExpenseCategory::Production)]
    #[case("557", ExpenseCategory::Production)]
    #[case("558", ExpenseCategory::Other)]
    #[case("560", ExpenseCategory::Transmission)]
    #[case("574.5", ExpenseCategory::Transmission)]
    #[case("580", ExpenseCategory::Distribution)]
    #[case("598", ExpenseCategory::Distribution)]
    #[case("901", ExpenseCategory::CustomerService)]
    #[case("910", ExpenseCategory::CustomerService)]
    #[case("920.1", ExpenseCategory::AdminGeneral)]
    #[case("935", ExpenseCategory::AdminGeneral)]
    #[case("936", ExpenseCategory::Other)]
    #[case("abc", ExpenseCategory::Other)]
    #[case("", ExpenseCategory::Other)]
    fn test_categorize_ferc_account(#[case] code: &str, #[case] expected: ExpenseCategory) {
        assert_eq!(categorize_ferc_account(code), expected);
    }

    #[test]
    fn test_category_expr_matches_scalar_rule() {
        let codes = ["500", "557", "558", "920.1", "935", "999", "abc", "901"];
        let df = df! { "ferc_account" => codes }.unwrap();
        let out = categorize_operating_expenses(&df).unwrap();
        let labels = out.column("category").unwrap().str().unwrap();
        for (i, code) in codes.iter().enumerate() {
            assert_eq!(labels.get(i), Some(categorize_ferc_account(code).as_str()));
        }
    }

    #[test]
    fn test_missing_account_column() {
        let df = df! { "dollar_value" => [1.0] }.unwrap();
        assert!(categorize_operating_expenses(&df).is_err());
    }
}
