//! The common shape of a single-frame reshaping step.

use crate::error::{Result, TransformError};
use polars::prelude::*;
use ratecase_data::error::{column_names, missing_from};

/// A lazy transformation of one frame.
pub trait TransformStep {
    /// Step name, used in log output.
    fn name(&self) -> &str;

    /// Columns the input frame must carry.
    fn required_columns(&self) -> &[&str];

    /// Build the lazy query for this step.
    fn apply(&self, data: LazyFrame) -> Result<LazyFrame>;

    /// Check the required columns, then run the step to completion.
    fn run(&self, df: &DataFrame) -> Result<DataFrame> {
        let missing = missing_from(self.required_columns(), &column_names(df));
        if !missing.is_empty() {
            return Err(TransformError::MissingColumn {
                columns: missing.into_iter().map(String::from).collect(),
            });
        }
        let out = self.apply(df.clone().lazy())?.collect()?;
        tracing::debug!(step = self.name(), rows = out.height(), "Applied transform step");
        Ok(out)
    }
}

/// Replace zero with null so a ratio over it is null rather than infinite.
pub fn nonzero(expr: Expr) -> Expr {
    when(expr.clone().eq(lit(0.0)))
        .then(lit(NULL))
        .otherwise(expr)
}
