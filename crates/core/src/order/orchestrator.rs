//! Per-page reading-order driver.
//!
//! For each page the engine tries the ranking signal first (normalize, score,
//! resolve) and drops to the spatial fallback whenever that path cannot run.
//! The fallback always succeeds, so every page with usable geometry ends up
//! with a dense 1-based reading order.

use std::fmt;
use std::sync::Arc;

use rayon::ThreadPoolBuilder;
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::error::{OrderError, Result, SignalError};
use crate::model::{Document, Page, Region, RegionLabel};

use super::columns::detect_columns;
use super::cross_page::mark_continuations;
use super::normalize::normalize_boxes;
use super::params::OrderParams;
use super::resolve::resolve;
use super::signal::{RankingSignal, SignalAdapter};
use super::spatial::{spatial_order, spatial_order_of};

/// States a page passes through while being ordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrderState {
    Init,
    Normalizing,
    Scoring,
    Resolving,
    Fallback,
    Applied,
    Failed,
}

/// Which ordering produced the final result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderPath {
    Signal,
    Fallback,
}

/// Why a page was ordered by the spatial fallback.
#[derive(Debug, Clone, PartialEq)]
pub enum FallbackReason {
    /// Zero or one region; nothing to rank.
    TooFewRegions,
    /// The engine has no ranking signal attached.
    NoSignal,
    InvalidGeometry(String),
    CapacityExceeded { count: usize, max: usize },
    SignalUnavailable(String),
    InferenceError(String),
}

impl FallbackReason {
    /// Short machine-friendly name used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::TooFewRegions => "too_few_regions",
            Self::NoSignal => "no_signal",
            Self::InvalidGeometry(_) => "invalid_geometry",
            Self::CapacityExceeded { .. } => "capacity_exceeded",
            Self::SignalUnavailable(_) => "signal_unavailable",
            Self::InferenceError(_) => "inference_error",
        }
    }

    /// True for failures worth surfacing; the rest are expected routing.
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            Self::InvalidGeometry(_) | Self::SignalUnavailable(_) | Self::InferenceError(_)
        )
    }
}

impl fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooFewRegions => f.write_str("fewer than two regions"),
            Self::NoSignal => f.write_str("no ranking signal attached"),
            Self::InvalidGeometry(msg) => write!(f, "invalid geometry: {}", msg),
            Self::CapacityExceeded { count, max } => {
                write!(f, "{} regions exceed the signal capacity of {}", count, max)
            }
            Self::SignalUnavailable(msg) => write!(f, "signal unavailable: {}", msg),
            Self::InferenceError(msg) => write!(f, "inference error: {}", msg),
        }
    }
}

impl From<SignalError> for FallbackReason {
    fn from(err: SignalError) -> Self {
        match err {
            SignalError::Unavailable(msg) => Self::SignalUnavailable(msg),
            SignalError::Inference(msg) => Self::InferenceError(msg),
            SignalError::CapacityExceeded { count, max } => Self::CapacityExceeded { count, max },
        }
    }
}

/// What happened to one page.
#[derive(Debug, Clone, PartialEq)]
pub struct PageReport {
    pub page: usize,
    pub regions: usize,
    pub trace: Vec<OrderState>,
    pub path: OrderPath,
    pub fallback: Option<FallbackReason>,
    /// The resolver hit its pass cap; ties were broken by detection order.
    pub unresolved_conflicts: bool,
}

/// Per-page outcomes of a document run, in page order.
#[derive(Debug)]
pub struct DocumentReport {
    pub pages: Vec<Result<PageReport>>,
}

impl DocumentReport {
    pub fn ordered_pages(&self) -> usize {
        self.pages.iter().filter(|p| p.is_ok()).count()
    }

    pub fn failed_pages(&self) -> impl Iterator<Item = &OrderError> {
        self.pages.iter().filter_map(|p| p.as_ref().err())
    }

    pub fn fallback_pages(&self) -> usize {
        self.pages
            .iter()
            .filter(|p| matches!(p, Ok(r) if r.path == OrderPath::Fallback))
            .count()
    }
}

/// Reading-order engine.
///
/// The ranking signal is owned by the caller and shared through an `Arc`;
/// the engine itself holds no per-page state and may order pages from many
/// threads at once.
pub struct ReadingOrderEngine {
    signal: Option<Arc<dyn RankingSignal>>,
    params: OrderParams,
}

impl ReadingOrderEngine {
    /// Engine that always uses the spatial fallback.
    pub fn new(params: OrderParams) -> Self {
        Self {
            signal: None,
            params,
        }
    }

    pub fn with_signal(signal: Arc<dyn RankingSignal>, params: OrderParams) -> Self {
        Self {
            signal: Some(signal),
            params,
        }
    }

    pub fn params(&self) -> &OrderParams {
        &self.params
    }

    pub fn has_signal(&self) -> bool {
        self.signal.is_some()
    }

    /// Assigns a reading order to every region of `page`.
    ///
    /// # Errors
    /// `InvalidGeometry` when a region has non-finite coordinates, or when
    /// neither page dimension is positive while the page has regions. The page
    /// is left untouched in that case.
    pub fn order_page(&self, page: &mut Page) -> Result<PageReport> {
        let page_index = page.index();
        let n = page.len();
        let mut trace = vec![OrderState::Init];

        if let Some(msg) = malformed_geometry(page) {
            trace.push(OrderState::Failed);
            warn!(page = page_index, kind = "invalid_geometry", %msg, "page cannot be ordered");
            return Err(OrderError::InvalidGeometry {
                page: page_index,
                msg,
            });
        }

        let (ranks, fallback, unresolved) = match self.signal_path(page, &mut trace) {
            Ok((ranks, unresolved)) => (ranks, None, unresolved),
            Err(reason) => {
                if reason.is_failure() {
                    warn!(page = page_index, kind = reason.kind(), %reason, "falling back to spatial order");
                } else {
                    debug!(page = page_index, kind = reason.kind(), "using spatial order");
                }
                trace.push(OrderState::Fallback);
                let sequence = self.fallback_sequence(page.regions());
                (ranks_from_sequence(n, &sequence), Some(reason), false)
            }
        };

        apply_ranks(page.regions_mut(), &ranks);
        trace.push(OrderState::Applied);
        debug!(page = page_index, regions = n, ?trace, "reading order applied");

        Ok(PageReport {
            page: page_index,
            regions: n,
            trace,
            path: if fallback.is_some() {
                OrderPath::Fallback
            } else {
                OrderPath::Signal
            },
            fallback,
            unresolved_conflicts: unresolved,
        })
    }

    /// Normalize, score and resolve. Returns the rank per region, or the
    /// reason the fallback must run.
    fn signal_path(
        &self,
        page: &Page,
        trace: &mut Vec<OrderState>,
    ) -> std::result::Result<(Vec<usize>, bool), FallbackReason> {
        let n = page.len();
        if n <= 1 {
            return Err(FallbackReason::TooFewRegions);
        }
        let signal = self.signal.as_deref().ok_or(FallbackReason::NoSignal)?;

        trace.push(OrderState::Normalizing);
        let boxes = normalize_boxes(page.regions().iter().map(|r| &r.bbox), page.width, page.height)
            .map_err(|e| FallbackReason::InvalidGeometry(e.to_string()))?;
        if n > self.params.max_regions {
            info!(
                page = page.index(),
                regions = n,
                max = self.params.max_regions,
                "page exceeds signal capacity"
            );
            return Err(FallbackReason::CapacityExceeded {
                count: n,
                max: self.params.max_regions,
            });
        }

        trace.push(OrderState::Scoring);
        let adapter = SignalAdapter::new(signal, self.params.max_regions, self.params.framing);
        let matrix = adapter.score(&boxes)?;

        trace.push(OrderState::Resolving);
        let resolution = resolve(&matrix);
        if resolution.unresolved {
            warn!(
                page = page.index(),
                passes = resolution.passes,
                "unresolved rank conflicts; breaking ties by detection order"
            );
        }
        Ok((resolution.order, resolution.unresolved))
    }

    /// Column-aware spatial order, as indices into `regions`.
    ///
    /// Headers come before every column and footers after the last one.
    fn fallback_sequence(&self, regions: &[Region]) -> Vec<usize> {
        if !self.params.column_detection {
            return spatial_order(regions);
        }

        let of_label = |label: RegionLabel| -> Vec<usize> {
            let indices: Vec<usize> = (0..regions.len())
                .filter(|&i| regions[i].label() == label)
                .collect();
            spatial_order_of(regions, &indices)
        };

        let mut sequence = of_label(RegionLabel::Header);
        for group in detect_columns(regions, self.params.column_gap) {
            sequence.extend(spatial_order_of(regions, &group));
        }
        sequence.extend(of_label(RegionLabel::Footer));
        sequence
    }

    /// Orders every page of `document`, in parallel across pages.
    ///
    /// Pages are independent; one page failing does not stop the others.
    /// Cross-page continuation marking runs afterwards when enabled.
    pub fn order_document(&self, document: &mut Document) -> DocumentReport {
        let run = |pages: &mut [Page]| -> Vec<Result<PageReport>> {
            pages.par_iter_mut().map(|p| self.order_page(p)).collect()
        };

        let pages = match self.params.threads {
            Some(threads) => match ThreadPoolBuilder::new().num_threads(threads).build() {
                Ok(pool) => pool.install(|| run(document.pages.as_mut_slice())),
                Err(err) => {
                    warn!(%err, "failed to build thread pool; using the global pool");
                    run(document.pages.as_mut_slice())
                }
            },
            None => run(document.pages.as_mut_slice()),
        };

        if self.params.cross_page {
            mark_continuations(document, self.params.edge_band);
        }

        DocumentReport { pages }
    }
}

/// Describes geometry the engine cannot order at all, if any.
fn malformed_geometry(page: &Page) -> Option<String> {
    if let Some(i) = page.regions().iter().position(|r| !r.bbox.is_finite()) {
        return Some(format!("region {} has non-finite coordinates", i));
    }
    let positive = |v: f64| v > 0.0;
    if !page.is_empty() && !positive(page.width) && !positive(page.height) {
        return Some(format!(
            "page size {} x {} with {} regions",
            page.width,
            page.height,
            page.len()
        ));
    }
    None
}

/// Inverts a reading sequence (region indices, first to last) into a rank
/// per region.
fn ranks_from_sequence(n: usize, sequence: &[usize]) -> Vec<usize> {
    let mut ranks = vec![usize::MAX; n];
    for (pos, &idx) in sequence.iter().enumerate() {
        if let Some(slot) = ranks.get_mut(idx) {
            *slot = pos;
        }
    }
    ranks
}

/// Writes dense 1-based reading orders from per-region ranks.
///
/// Shared ranks are broken by detection order. Regions without a rank (a
/// short `ranks` slice) follow all ranked regions in detection order.
pub fn apply_ranks(regions: &mut [Region], ranks: &[usize]) {
    let mut sequence: Vec<usize> = (0..regions.len()).collect();
    sequence.sort_by_key(|&i| (ranks.get(i).copied().unwrap_or(usize::MAX), i));
    for (pos, &idx) in sequence.iter().enumerate() {
        regions[idx].reading_order = Some(u32::try_from(pos + 1).unwrap_or(u32::MAX));
    }
}
