//! Reading-order parameters.
//!
//! Contains OrderParams for controlling how pages are ordered.

use serde::{Deserialize, Serialize};

use crate::error::{OrderError, Result};

/// Default upper bound on regions sent to the ranking signal.
pub const DEFAULT_MAX_REGIONS: usize = 200;

/// Default horizontal gap between x-centers that starts a new column.
pub const DEFAULT_COLUMN_GAP: f64 = 100.0;

/// Framing rows a ranking model wraps around the real regions.
///
/// Sequence models typically emit one extra row for a leading boundary token
/// and one for a trailing one. The adapter drops them before resolving.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Framing {
    pub leading: usize,
    pub trailing: usize,
}

impl Framing {
    pub const NONE: Framing = Framing {
        leading: 0,
        trailing: 0,
    };

    /// One boundary row before and after the regions.
    pub const BOUNDARY_TOKENS: Framing = Framing {
        leading: 1,
        trailing: 1,
    };
}

/// Parameters for reading-order reconstruction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrderParams {
    /// Pages with more regions than this never reach the ranking signal.
    pub max_regions: usize,

    /// If consecutive x-centers are further apart than this (in page pixels),
    /// the right one starts a new column.
    pub column_gap: f64,

    /// If the spatial fallback should split the page into columns first.
    pub column_detection: bool,

    /// If tables touching page edges should be flagged as continuing across
    /// the page break.
    pub cross_page: bool,

    /// Fraction of page height treated as the top/bottom edge for
    /// cross-page continuation. Range: (0.0, 0.5].
    pub edge_band: f64,

    /// Framing rows stripped from raw signal output.
    pub framing: Framing,

    /// Worker threads for document-level ordering. None uses the global
    /// rayon pool.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threads: Option<usize>,
}

impl Default for OrderParams {
    fn default() -> Self {
        Self {
            max_regions: DEFAULT_MAX_REGIONS,
            column_gap: DEFAULT_COLUMN_GAP,
            column_detection: true,
            cross_page: false,
            edge_band: 0.2,
            framing: Framing::NONE,
            threads: None,
        }
    }
}

impl OrderParams {
    /// Checks value ranges.
    pub fn validate(&self) -> Result<()> {
        if self.max_regions == 0 {
            return Err(OrderError::InvalidParams(
                "max_regions must be at least 1".into(),
            ));
        }
        if !self.column_gap.is_finite() || self.column_gap < 0.0 {
            return Err(OrderError::InvalidParams(format!(
                "column_gap must be a non-negative number, got {}",
                self.column_gap
            )));
        }
        if !(self.edge_band > 0.0 && self.edge_band <= 0.5) {
            return Err(OrderError::InvalidParams(format!(
                "edge_band should be in (0, 0.5], got {}",
                self.edge_band
            )));
        }
        if self.threads == Some(0) {
            return Err(OrderError::InvalidParams(
                "threads must be at least 1".into(),
            ));
        }
        Ok(())
    }
}
