//! Reading-order reconstruction.
//!
//! This module turns the detected regions of a page into a linear reading
//! sequence:
//! - `normalize` - page pixels to the 0..1000 grid
//! - `signal` - ranking signal contract and adapters
//! - `resolve` - score matrix to conflict-free permutation
//! - `spatial` - geometry-only fallback ordering
//! - `columns` - column detection feeding the fallback
//! - `orchestrator` - per-page and per-document driver
//! - `cross_page` - continuation hints across page breaks

pub mod columns;
pub mod cross_page;
pub mod normalize;
pub mod orchestrator;
pub mod params;
pub mod resolve;
pub mod signal;
pub mod spatial;

pub use columns::detect_columns;
pub use cross_page::mark_continuations;
pub use normalize::{GRID_SIZE, GeometryError, NormalizedBox, normalize_boxes};
pub use orchestrator::{
    DocumentReport, FallbackReason, OrderPath, OrderState, PageReport, ReadingOrderEngine,
    apply_ranks,
};
pub use params::{DEFAULT_COLUMN_GAP, DEFAULT_MAX_REGIONS, Framing, OrderParams};
pub use resolve::{Resolution, resolve};
pub use signal::{
    FlowSignal, FnSignal, Memoized, RankingBackend, RankingSignal, RawScores, ReplaySignal,
    ScoreMatrix, ScoreRecord, Serialized, SignalAdapter,
};
pub use spatial::{spatial_order, spatial_order_of, type_priority};
