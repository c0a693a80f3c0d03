//! lectio - reading-order reconstruction for detected page regions.
//!
//! Pages arrive as sets of detected regions (titles, text, tables, formulas,
//! figures). The engine assigns each region a position in the reading
//! sequence, using a pluggable ranking signal when one is available and a
//! column-aware spatial sort otherwise, and the converters render the
//! ordered document.

pub mod api;
pub mod converter;
pub mod error;
pub mod model;
pub mod order;

// Re-export high_level for convenience
pub use api::high_level;

pub use error::{OrderError, Result, SignalError};
pub use model::{BBox, Document, Page, Region, RegionKind, RegionLabel};
pub use order::{OrderParams, RankingSignal, ReadingOrderEngine};
