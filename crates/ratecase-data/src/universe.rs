//! The fixed set of California investor-owned electric utilities.

use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Target utilities with their FERC Form 1 and EIA identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Utility {
    /// Pacific Gas & Electric
    #[serde(rename = "PG&E")]
    PacificGasElectric,

    /// Southern California Edison
    #[serde(rename = "SCE")]
    SouthernCaliforniaEdison,

    /// San Diego Gas & Electric
    #[serde(rename = "SDG&E")]
    SanDiegoGasElectric,
}

impl Utility {
    /// Every target utility, in crosswalk order.
    pub const ALL: [Self; 3] = [
        Self::PacificGasElectric,
        Self::SouthernCaliforniaEdison,
        Self::SanDiegoGasElectric,
    ];

    /// Returns all target utilities.
    pub fn all() -> Vec<Self> {
        Self::ALL.to_vec()
    }

    /// Short name used in every output table.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::PacificGasElectric => "PG&E",
            Self::SouthernCaliforniaEdison => "SCE",
            Self::SanDiegoGasElectric => "SDG&E",
        }
    }

    /// FERC Form 1 respondent id.
    pub const fn ferc_id(&self) -> i64 {
        match self {
            Self::PacificGasElectric => 183,
            Self::SouthernCaliforniaEdison => 155,
            Self::SanDiegoGasElectric => 218,
        }
    }

    /// EIA utility number.
    pub const fn eia_id(&self) -> i64 {
        match self {
            Self::PacificGasElectric => 14328,
            Self::SouthernCaliforniaEdison => 17609,
            Self::SanDiegoGasElectric => 16609,
        }
    }

    /// Look up a utility by FERC respondent id.
    pub const fn from_ferc_id(id: i64) -> Option<Self> {
        match id {
            183 => Some(Self::PacificGasElectric),
            155 => Some(Self::SouthernCaliforniaEdison),
            218 => Some(Self::SanDiegoGasElectric),
            _ => None,
        }
    }

    /// Look up a utility by EIA utility number.
    pub const fn from_eia_id(id: i64) -> Option<Self> {
        match id {
            14328 => Some(Self::PacificGasElectric),
            17609 => Some(Self::SouthernCaliforniaEdison),
            16609 => Some(Self::SanDiegoGasElectric),
            _ => None,
        }
    }

    /// Look up a utility by its short name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|u| u.name() == name)
    }

    /// FERC ids of every target utility.
    pub fn ferc_ids() -> Vec<i64> {
        Self::ALL.iter().map(Self::ferc_id).collect()
    }

    /// EIA ids of every target utility.
    pub fn eia_ids() -> Vec<i64> {
        Self::ALL.iter().map(Self::eia_id).collect()
    }

    /// Crosswalk frame with `utility_id_ferc1`, `utility_id_eia` and `utility_name`.
    pub fn crosswalk() -> PolarsResult<DataFrame> {
        df! {
            "utility_id_ferc1" => Self::ferc_ids(),
            "utility_id_eia" => Self::eia_ids(),
            "utility_name" => Self::ALL.iter().map(Self::name).collect::<Vec<_>>(),
        }
    }
}

impl fmt::Display for Utility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Expression matching rows whose `column` holds one of `ids`.
pub fn id_filter(column: &str, ids: &[i64]) -> Expr {
    ids.iter()
        .map(|&id| col(column).eq(lit(id)))
        .reduce(|acc, e| acc.or(e))
        .unwrap_or_else(|| lit(false))
}

/// Expression matching rows whose `report_year` is one of `years`.
pub fn year_filter(years: &[i64]) -> Expr {
    id_filter("report_year", years)
}
