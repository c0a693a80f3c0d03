//! Ranking signal contract and adapters.
//!
//! A ranking signal is an external model that, given the normalized boxes of
//! a page, returns for every region a preference score over every reading
//! position. The engine only sees the [`RankingSignal`] trait; concrete
//! backends (remote service, local inference, test stubs) plug in behind it.
//!
//! [`SignalAdapter`] is the engine-facing side of the contract: it enforces
//! the region capacity, strips model framing rows and checks the response
//! shape, so the resolver always receives a square matrix.

use std::sync::Mutex;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::SignalError;

use super::normalize::NormalizedBox;
use super::params::Framing;

/// Raw signal output: one row per input position (framing rows included),
/// one column per candidate rank.
pub type RawScores = Vec<Vec<f64>>;

/// Square `N × N` score matrix; entry `(i, j)` is how strongly region `i`
/// prefers reading position `j`.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreMatrix {
    n: usize,
    data: Vec<f64>,
}

impl ScoreMatrix {
    /// Builds a matrix from rows.
    ///
    /// # Errors
    /// `SignalError::Inference` if the rows do not form a square matrix.
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<Self, SignalError> {
        let n = rows.len();
        let mut data = Vec::with_capacity(n * n);
        for (i, row) in rows.into_iter().enumerate() {
            if row.len() != n {
                return Err(SignalError::Inference(format!(
                    "score row {} has {} columns, expected {}",
                    i,
                    row.len(),
                    n
                )));
            }
            data.extend(row);
        }
        Ok(Self { n, data })
    }

    /// Number of regions (rows and columns).
    #[inline]
    pub fn size(&self) -> usize {
        self.n
    }

    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    #[inline]
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.data[i * self.n + j]
    }

    #[inline]
    pub fn row(&self, i: usize) -> &[f64] {
        &self.data[i * self.n..(i + 1) * self.n]
    }
}

/// An external ranking model.
///
/// Implementations must be safe to call from several page workers at once.
/// Backends that are not wrap themselves in [`Serialized`].
pub trait RankingSignal: Send + Sync {
    /// Scores the boxes of one page. The result may carry framing rows and
    /// extra columns; [`SignalAdapter`] trims them.
    fn score(&self, boxes: &[NormalizedBox]) -> Result<RawScores, SignalError>;

    /// Short name used in logs.
    fn name(&self) -> &str {
        "signal"
    }
}

impl<S: RankingSignal + ?Sized> RankingSignal for std::sync::Arc<S> {
    fn score(&self, boxes: &[NormalizedBox]) -> Result<RawScores, SignalError> {
        (**self).score(boxes)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Engine-facing wrapper enforcing the signal contract.
pub struct SignalAdapter<'a> {
    signal: &'a dyn RankingSignal,
    max_regions: usize,
    framing: Framing,
}

impl<'a> SignalAdapter<'a> {
    pub fn new(signal: &'a dyn RankingSignal, max_regions: usize, framing: Framing) -> Self {
        Self {
            signal,
            max_regions,
            framing,
        }
    }

    pub fn max_regions(&self) -> usize {
        self.max_regions
    }

    /// Queries the signal and returns an `N × N` matrix for `N` boxes.
    ///
    /// # Errors
    /// `CapacityExceeded` before the backend is called when `N` is above the
    /// bound; `Unavailable`/`Inference` from the backend; `Inference` when the
    /// response is too small to hold `N` framed rows of `N` columns.
    pub fn score(&self, boxes: &[NormalizedBox]) -> Result<ScoreMatrix, SignalError> {
        let n = boxes.len();
        if n > self.max_regions {
            return Err(SignalError::CapacityExceeded {
                count: n,
                max: self.max_regions,
            });
        }

        let raw = self.signal.score(boxes)?;
        let expected_rows = self.framing.leading + n + self.framing.trailing;
        if raw.len() != expected_rows {
            return Err(SignalError::Inference(format!(
                "{} returned {} rows, expected {} ({} regions + framing)",
                self.signal.name(),
                raw.len(),
                expected_rows,
                n
            )));
        }

        let rows: Vec<Vec<f64>> = raw
            .into_iter()
            .skip(self.framing.leading)
            .take(n)
            .enumerate()
            .map(|(i, mut row)| {
                if row.len() < n {
                    return Err(SignalError::Inference(format!(
                        "{} returned {} columns for region {}, expected at least {}",
                        self.signal.name(),
                        row.len(),
                        i,
                        n
                    )));
                }
                row.truncate(n);
                Ok(row)
            })
            .collect::<Result<_, _>>()?;

        debug!(signal = self.signal.name(), regions = n, "scored page");
        ScoreMatrix::from_rows(rows)
    }
}

/// A ranking backend that needs exclusive access while scoring.
pub trait RankingBackend: Send {
    fn score_mut(&mut self, boxes: &[NormalizedBox]) -> Result<RawScores, SignalError>;

    fn name(&self) -> &str {
        "backend"
    }
}

/// Serializes calls to a non-thread-safe backend through a single mutex.
pub struct Serialized<B> {
    backend: Mutex<B>,
    name: String,
}

impl<B: RankingBackend> Serialized<B> {
    pub fn new(backend: B) -> Self {
        let name = backend.name().to_string();
        Self {
            backend: Mutex::new(backend),
            name,
        }
    }

    pub fn into_inner(self) -> Option<B> {
        self.backend.into_inner().ok()
    }
}

impl<B: RankingBackend> RankingSignal for Serialized<B> {
    fn score(&self, boxes: &[NormalizedBox]) -> Result<RawScores, SignalError> {
        let mut guard = self
            .backend
            .lock()
            .map_err(|_| SignalError::Unavailable(format!("{} backend poisoned", self.name)))?;
        guard.score_mut(boxes)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Caches signal responses for the lifetime of the wrapper, keyed by the
/// exact box list. Errors are not cached.
pub struct Memoized<S> {
    inner: S,
    cache: Mutex<FxHashMap<Vec<NormalizedBox>, RawScores>>,
}

impl<S: RankingSignal> Memoized<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            cache: Mutex::new(FxHashMap::default()),
        }
    }

    pub fn cached_len(&self) -> usize {
        self.cache.lock().map(|c| c.len()).unwrap_or(0)
    }
}

impl<S: RankingSignal> RankingSignal for Memoized<S> {
    fn score(&self, boxes: &[NormalizedBox]) -> Result<RawScores, SignalError> {
        if let Ok(cache) = self.cache.lock()
            && let Some(hit) = cache.get(boxes)
        {
            return Ok(hit.clone());
        }

        let scores = self.inner.score(boxes)?;
        if let Ok(mut cache) = self.cache.lock() {
            cache.insert(boxes.to_vec(), scores.clone());
        }
        Ok(scores)
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}

/// Signal backed by a closure. Handy for tests and for adapting foreign
/// inference calls.
pub struct FnSignal<F> {
    f: F,
    name: String,
}

impl<F> FnSignal<F>
where
    F: Fn(&[NormalizedBox]) -> Result<RawScores, SignalError> + Send + Sync,
{
    pub fn new(name: impl Into<String>, f: F) -> Self {
        Self {
            f,
            name: name.into(),
        }
    }
}

impl<F> RankingSignal for FnSignal<F>
where
    F: Fn(&[NormalizedBox]) -> Result<RawScores, SignalError> + Send + Sync,
{
    fn score(&self, boxes: &[NormalizedBox]) -> Result<RawScores, SignalError> {
        (self.f)(boxes)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Local geometric signal.
///
/// Each box gets a flow key `(1 - flow) * left + (1 + flow) * (top + bottom)`;
/// flow near +1 makes vertical position dominate, near -1 horizontal. A box's
/// expected position is the number of boxes with a smaller key plus half the
/// number of other boxes sharing its key, and its score for rank `j` is the
/// negative distance to that position. Boxes with equal keys therefore
/// compete for the same rank and are separated by the resolver.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlowSignal {
    flow: f64,
}

impl FlowSignal {
    /// # Panics
    /// Panics if flow is not in range [-1.0, 1.0].
    pub fn new(flow: f64) -> Self {
        assert!(
            (-1.0..=1.0).contains(&flow),
            "flow should be a number between -1 and +1"
        );
        Self { flow }
    }

    fn key(&self, b: &NormalizedBox) -> f64 {
        (1.0 - self.flow) * f64::from(b.left) + (1.0 + self.flow) * f64::from(b.top + b.bottom)
    }
}

impl Default for FlowSignal {
    fn default() -> Self {
        Self { flow: 0.5 }
    }
}

impl RankingSignal for FlowSignal {
    fn score(&self, boxes: &[NormalizedBox]) -> Result<RawScores, SignalError> {
        let keys: Vec<f64> = boxes.iter().map(|b| self.key(b)).collect();
        let n = boxes.len();
        let rows = keys
            .iter()
            .enumerate()
            .map(|(i, &k)| {
                let less = keys.iter().filter(|&&other| other < k).count();
                let equal = keys
                    .iter()
                    .enumerate()
                    .filter(|&(j, &other)| j != i && other == k)
                    .count();
                let expected = less as f64 + equal as f64 / 2.0;
                (0..n).map(|j| -(j as f64 - expected).abs()).collect()
            })
            .collect();
        Ok(rows)
    }

    fn name(&self) -> &str {
        "flow"
    }
}

/// One recorded signal response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreRecord {
    pub boxes: Vec<NormalizedBox>,
    pub scores: RawScores,
}

/// Replays responses computed elsewhere, such as an offline model run, keyed
/// by the exact normalized box list.
#[derive(Debug, Clone, Default)]
pub struct ReplaySignal {
    entries: FxHashMap<Vec<NormalizedBox>, RawScores>,
}

impl ReplaySignal {
    pub fn new(records: impl IntoIterator<Item = ScoreRecord>) -> Self {
        Self {
            entries: records.into_iter().map(|r| (r.boxes, r.scores)).collect(),
        }
    }

    pub fn from_json(data: &[u8]) -> Result<Self, serde_json::Error> {
        let records: Vec<ScoreRecord> = serde_json::from_slice(data)?;
        Ok(Self::new(records))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl RankingSignal for ReplaySignal {
    fn score(&self, boxes: &[NormalizedBox]) -> Result<RawScores, SignalError> {
        self.entries.get(boxes).cloned().ok_or_else(|| {
            SignalError::Unavailable(format!("no recorded scores for {} boxes", boxes.len()))
        })
    }

    fn name(&self) -> &str {
        "replay"
    }
}
