//! Final column selection and quality checks for the analysis-ready table.

use crate::error::{Result, TransformError};
use polars::prelude::*;
use ratecase_data::{
    Utility,
    config::YEARS,
    error::{column_names, missing_from},
    record::{KEY_COLUMNS, VALUE_COLUMNS},
};
use serde::{Deserialize, Serialize};

/// Columns the validated table must contain.
pub const REQUIRED_OUTPUT_COLUMNS: [&str; 5] = [
    "utility_id_ferc1",
    "utility_id_eia",
    "utility_name",
    "report_year",
    "om_total",
];

/// Columns that may not hold nulls.
pub const CRITICAL_COLUMNS: [&str; 3] = ["utility_id_ferc1", "utility_id_eia", "report_year"];

/// Thresholds applied by [`validate_output`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationConfig {
    /// Rows a complete table would hold (default: 3 utilities x 6 years)
    pub expected_rows: usize,
    /// Minimum fraction of `expected_rows` that must be present (default: 0.5)
    pub min_coverage: f64,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            expected_rows: Utility::ALL.len() * YEARS.len(),
            min_coverage: 0.5,
        }
    }
}

/// Keep the analysis-ready columns that are present, in their fixed order.
pub fn select_final_columns(df: &DataFrame) -> Result<DataFrame> {
    let available = column_names(df);
    let ordered: Vec<&str> = KEY_COLUMNS
        .iter()
        .chain(VALUE_COLUMNS.iter())
        .copied()
        .filter(|name| available.iter().any(|a| a == name))
        .collect();
    Ok(df.select(ordered)?)
}

/// Validate with the default thresholds.
pub fn validate_output(df: &DataFrame) -> Result<()> {
    validate_output_with(df, &ValidationConfig::default())
}

/// Check that the table is non-empty, carries the required columns, has
/// enough rows, and has no null identifiers.
pub fn validate_output_with(df: &DataFrame, config: &ValidationConfig) -> Result<()> {
    if df.height() == 0 {
        return Err(TransformError::Validation("output frame is empty".into()));
    }

    let missing = missing_from(&REQUIRED_OUTPUT_COLUMNS, &column_names(df));
    if !missing.is_empty() {
        return Err(TransformError::MissingColumn {
            columns: missing.into_iter().map(String::from).collect(),
        });
    }

    let minimum = config.expected_rows as f64 * config.min_coverage;
    if (df.height() as f64) < minimum {
        return Err(TransformError::Validation(format!(
            "unexpectedly low row count: {} (expected at least {minimum})",
            df.height()
        )));
    }

    for name in CRITICAL_COLUMNS {
        let nulls = df.column(name)?.null_count();
        if nulls > 0 {
            return Err(TransformError::Validation(format!(
                "found {nulls} null values in critical column: {name}"
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(rows: usize) -> DataFrame {
        let years: Vec<i64> = (0..rows as i64).map(|i| 2018 + i % 6).collect();
        df! {
            "utility_id_ferc1" => vec![183i64; rows],
            "utility_id_eia" => vec![14328i64; rows],
            "utility_name" => vec!["PG&E"; rows],
            "report_year" => years,
            "om_total" => vec![1.0; rows],
        }
        .unwrap()
    }

    #[test]
    fn test_select_keeps_order_and_skips_absent() {
        let df = df! {
            "om_total" => [1.0],
            "extra" => [2.0],
            "report_year" => [2020i64],
            "utility_id_ferc1" => [183i64],
        }
        .unwrap();
        let out = select_final_columns(&df).unwrap();
        assert_eq!(
            column_names(&out),
            vec!["utility_id_ferc1", "report_year", "om_total"]
        );
    }

    #[test]
    fn test_valid_frame_passes() {
        assert!(validate_output(&frame(9)).is_ok());
        assert!(validate_output(&frame(18)).is_ok());
    }

    #[test]
    fn test_too_few_rows() {
        let err = validate_output(&frame(8)).unwrap_err();
        assert!(err.to_string().contains("low row count"));
    }

    #[test]
    fn test_empty_frame() {
        let df = frame(0);
        assert!(matches!(
            validate_output(&df),
            Err(TransformError::Validation(msg)) if msg.contains("empty")
        ));
    }

    #[test]
    fn test_missing_required_columns_named() {
        let df = frame(18).drop("om_total").unwrap().drop("utility_name").unwrap();
        match validate_output(&df).unwrap_err() {
            TransformError::MissingColumn { columns } => {
                assert_eq!(columns, vec!["utility_name", "om_total"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_null_identifier() {
        let mut df = frame(18);
        let eia: Vec<Option<i64>> = (0..18).map(|i| (i != 3).then_some(14328)).collect();
        df.replace("utility_id_eia", Series::new("utility_id_eia".into(), eia))
            .unwrap();
        let err = validate_output(&df).unwrap_err();
        assert!(err.to_string().contains("utility_id_eia"));
    }
}
