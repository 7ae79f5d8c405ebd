#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod analysis_ready;
pub mod categorize;
pub mod error;
pub mod expenses;
pub mod join;
pub mod metrics;
pub mod rate_base;
pub mod step;
pub mod validate;

pub use analysis_ready::{TransformInputs, build_analysis_ready};
pub use categorize::{
    CategorizeExpenses, ExpenseCategory, categorize_ferc_account, categorize_operating_expenses,
    category_expr,
};
pub use error::{Result, TransformError};
pub use expenses::{PivotExpenses, pivot_expenses_to_wide};
pub use join::join_ferc_eia_data;
pub use metrics::{DeriveMetrics, DeriveMetricsConfig, derive_metrics};
pub use rate_base::{RateBase, calculate_rate_base};
pub use step::TransformStep;
pub use validate::{ValidationConfig, select_final_columns, validate_output, validate_output_with};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
