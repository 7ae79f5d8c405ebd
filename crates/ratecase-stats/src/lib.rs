#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod analysis;
pub mod benchmark;
pub mod descriptive;
pub mod error;
pub mod linalg;
pub mod outliers;
pub mod regression;
pub mod summary;
pub mod trend;
pub mod yoy;

pub use analysis::{AnalysisResults, KeyFindings, NamedValue, TrendOutcome, run_analysis};
pub use benchmark::{BenchmarkRow, peer_benchmark};
pub use descriptive::cagr;
pub use error::{Result, StatsError};
pub use outliers::{OutlierRow, detect_outliers};
pub use regression::{
    Coefficient, OlsResult, VifResult, check_multicollinearity, cost_driver_regression,
};
pub use summary::{UtilitySummary, summary_by_utility};
pub use trend::{LinearFit, TrendResult, linregress, trend_analysis};
pub use yoy::{YoyRow, calculate_yoy_change};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
