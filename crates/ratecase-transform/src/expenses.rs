//! Long-to-wide reshaping of categorized operating expenses.

use crate::{categorize::ExpenseCategory, error::Result, step::TransformStep};
use polars::prelude::*;

/// Sums `dollar_value` per utility, year and category into one `om_*` column
/// per category plus `om_total`.
#[derive(Debug, Default, Clone, Copy)]
pub struct PivotExpenses;

impl TransformStep for PivotExpenses {
    fn name(&self) -> &str {
        "pivot_expenses"
    }

    fn required_columns(&self) -> &[&str] {
        &["utility_id_ferc1", "report_year", "category", "dollar_value"]
    }

    fn apply(&self, data: LazyFrame) -> Result<LazyFrame> {
        let per_category: Vec<Expr> = ExpenseCategory::ALL
            .iter()
            .map(|category| {
                col("dollar_value")
                    .filter(col("category").eq(lit(category.as_str())))
                    .sum()
                    .fill_null(lit(0.0))
                    .alias(category.column())
            })
            .collect();

        let total = ExpenseCategory::ALL
            .iter()
            .map(|category| col(category.column()))
            .reduce(|acc, e| acc + e)
            .unwrap_or_else(|| lit(0.0));

        Ok(data
            .with_column(col("dollar_value").cast(DataType::Float64))
            .group_by([col("utility_id_ferc1"), col("report_year")])
            .agg(per_category)
            .with_column(total.alias("om_total"))
            .sort(
                ["utility_id_ferc1", "report_year"],
                SortMultipleOptions::default(),
            ))
    }
}

/// Spread categorized expenses to one row per utility-year.
///
/// Categories a utility-year never reports are zero, and `om_total` is the sum
/// of all six category columns.
pub fn pivot_expenses_to_wide(df: &DataFrame) -> Result<DataFrame> {
    PivotExpenses.run(df)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::categorize::categorize_operating_expenses;
    use approx::assert_relative_eq;

    #[test]
    fn test_pivot_sums_and_fills() {
        let df = df! {
            "utility_id_ferc1" => [183i64, 183, 183, 183, 155],
            "report_year" => [2020i64, 2020, 2020, 2020, 2020],
            "ferc_account" => ["500", "501", "920.1", "9999", "580"],
            "dollar_value" => [100.0, 50.0, 30.0, 5.0, 40.0],
        }
        .unwrap();

        let wide = pivot_expenses_to_wide(&categorize_operating_expenses(&df).unwrap()).unwrap();
        assert_eq!(wide.height(), 2);

        // Sorted: SCE (155) first.
        let get = |name: &str, row: usize| {
            wide.column(name).unwrap().f64().unwrap().get(row).unwrap()
        };
        assert_relative_eq!(get("om_distribution", 0), 40.0);
        assert_relative_eq!(get("om_production", 0), 0.0);
        assert_relative_eq!(get("om_total", 0), 40.0);

        assert_relative_eq!(get("om_production", 1), 150.0);
        assert_relative_eq!(get("om_admin_general", 1), 30.0);
        assert_relative_eq!(get("om_other", 1), 5.0);
        assert_relative_eq!(get("om_transmission", 1), 0.0);
        assert_relative_eq!(get("om_total", 1), 185.0);
    }

    #[test]
    fn test_total_equals_component_sum() {
        let df = df! {
            "utility_id_ferc1" => [218i64, 218, 218, 218, 218, 218],
            "report_year" => [2019i64, 2019, 2019, 2019, 2019, 2019],
            "category" => [
                "production",
                "transmission",
                "distribution",
                "customer_service",
                "admin_general",
                "other",
            ],
            "dollar_value" => [1.5, 2.25, 3.0, 4.125, 5.0, 6.5],
        }
        .unwrap();

        let wide = pivot_expenses_to_wide(&df).unwrap();
        let components: f64 = ExpenseCategory::ALL
            .iter()
            .map(|c| wide.column(c.column()).unwrap().f64().unwrap().get(0).unwrap())
            .sum();
        let total = wide.column("om_total").unwrap().f64().unwrap().get(0).unwrap();
        assert_relative_eq!(total, components);
        assert_relative_eq!(total, 22.375);
    }
}
