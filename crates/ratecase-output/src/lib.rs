#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod charts;
pub mod export;
pub mod frame;
pub mod report;
pub mod summary;

pub use charts::{
    BillPoint, ChartError, ChartInputs, RevenueGapPoint, plot_bill_impact, plot_om_trend,
    plot_peer_comparison, plot_revenue_gap, render_all,
};
pub use export::{ExportError, ExportFormat, Exporter, Result};
pub use frame::{ToFrame, write_parquet, write_rows};
pub use report::{AnalysisReport, ReportError};
pub use summary::RevenueSummary;

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
