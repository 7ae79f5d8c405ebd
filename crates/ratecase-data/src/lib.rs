#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod config;
pub mod eia;
pub mod error;
pub mod ferc;
pub mod record;
pub mod universe;

pub use config::DataPaths;
pub use eia::{aggregate_eia_duplicates, extract_eia_data, filter_eia_to_targets, load_eia_file};
pub use error::{DataError, Result};
pub use ferc::{
    load_ferc_income_statements, load_ferc_operating_expenses, load_ferc_utility_association,
    load_ferc_utility_plant, operating_revenues_from_income, read_parquet,
};
pub use record::{UtilityYearRecord, records_from_frame, records_to_frame};
pub use universe::Utility;

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
