use std::env;
use std::time::Duration;

use criterion::measurement::Measurement;
use criterion::{BenchmarkGroup, Criterion, Throughput};

/// `LECTIO_BENCH_TIER=full` widens the size sweeps and sampling.
pub fn full_tier() -> bool {
    matches!(env::var("LECTIO_BENCH_TIER").as_deref(), Ok("full"))
}

pub fn bench_seed() -> u64 {
    env::var("LECTIO_BENCH_SEED")
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(0xC0FFEE)
}

/// Sampling for a group: whole-document runs take longer per iteration
/// than single pages.
pub fn configure_group<M: Measurement>(group: &mut BenchmarkGroup<'_, M>, per_document: bool) {
    let (samples, secs) = match (full_tier(), per_document) {
        (false, false) => (20, 3),
        (false, true) => (12, 5),
        (true, false) => (30, 5),
        (true, true) => (20, 10),
    };
    group.sample_size(samples);
    group.measurement_time(Duration::from_secs(secs));
}

pub fn bench_criterion() -> Criterion {
    Criterion::default().configure_from_args()
}

pub fn regions_throughput(regions: usize) -> Throughput {
    Throughput::Elements(regions as u64)
}

/// SplitMix64 generator for synthetic layouts.
pub struct LayoutRng(u64);

impl LayoutRng {
    pub fn new(seed: u64) -> Self {
        Self(seed)
    }

    fn next_u64(&mut self) -> u64 {
        self.0 = self.0.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.0;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }

    /// Uniform in `[min, max)`.
    pub fn range(&mut self, min: f64, max: f64) -> f64 {
        let unit = (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64;
        min + (max - min) * unit
    }
}
