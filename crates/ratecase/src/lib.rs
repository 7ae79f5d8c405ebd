#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod error;
pub mod pipeline;

// Re-export the stage crates
pub use ratecase_data as data;
pub use ratecase_output as output;
pub use ratecase_revenue as revenue;
pub use ratecase_stats as stats;
pub use ratecase_transform as transform;

pub use data::{Utility, UtilityYearRecord};
pub use error::{PipelineError, Result};
pub use pipeline::{PipelineConfig, RevenueOutputs};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
