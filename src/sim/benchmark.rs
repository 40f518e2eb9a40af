//! Benchmark bookkeeping: per-phase results and the adaptive tally.

use std::collections::hash_map::DefaultHasher;
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::time::Duration;

use crate::allocators::{AllocatorStrategy, StrategyKind};
use crate::api::block::AllocationRequest;
use crate::api::stats::{fragmentation_percent, success_rate_percent, AllocatorMetrics};
use crate::workload::WorkloadPattern;

/// Weights of the composite ranking score.
const WEIGHT_SUCCESS: f64 = 0.5;
const WEIGHT_EFFICIENCY: f64 = 0.3;
const WEIGHT_FRAGMENTATION: f64 = 0.2;

/// A row of the results table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BenchmarkEntry {
    Strategy(StrategyKind),
    /// Requests routed by the selector.
    Adaptive,
}

impl fmt::Display for BenchmarkEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Strategy(kind) => write!(f, "{}", kind),
            Self::Adaptive => write!(f, "adaptive"),
        }
    }
}

/// Outcome of a benchmark run.
#[derive(Debug, Clone, PartialEq)]
pub struct BenchmarkResults {
    pub pattern: WorkloadPattern,
    pub operation_count: usize,
    /// Final metrics per phase.
    pub metrics: BTreeMap<BenchmarkEntry, AllocatorMetrics>,
    /// Digest of the `(id, size, lifetime)` sequence each phase replayed.
    pub sequence_digests: BTreeMap<BenchmarkEntry, u64>,
    /// How often the selector picked each strategy in the adaptive phase.
    pub adaptive_picks: BTreeMap<StrategyKind, u64>,
}

impl BenchmarkResults {
    pub(crate) fn new(pattern: WorkloadPattern, operation_count: usize) -> Self {
        Self {
            pattern,
            operation_count,
            metrics: BTreeMap::new(),
            sequence_digests: BTreeMap::new(),
            adaptive_picks: BTreeMap::new(),
        }
    }

    /// Metrics of one phase.
    pub fn get(&self, entry: BenchmarkEntry) -> Option<&AllocatorMetrics> {
        self.metrics.get(&entry)
    }

    /// Metrics of the adaptive phase.
    pub fn adaptive(&self) -> Option<&AllocatorMetrics> {
        self.get(BenchmarkEntry::Adaptive)
    }

    /// Whether every phase, adaptive included, has reported.
    pub fn is_complete(&self) -> bool {
        self.metrics.len() == StrategyKind::ALL.len() + 1
    }

    /// Every entry by descending composite score; ties keep table order.
    pub fn ranking(&self) -> Vec<(BenchmarkEntry, f64)> {
        let mut rows: Vec<(BenchmarkEntry, f64)> = self
            .metrics
            .iter()
            .map(|(&entry, m)| (entry, composite_score(m)))
            .collect();
        rows.sort_by(|a, b| b.1.total_cmp(&a.1));
        rows
    }

    /// Best single strategy (the adaptive entry is not a candidate).
    pub fn best_strategy(&self) -> Option<StrategyKind> {
        self.ranking().into_iter().find_map(|(entry, _)| match entry {
            BenchmarkEntry::Strategy(kind) => Some(kind),
            BenchmarkEntry::Adaptive => None,
        })
    }

    /// Adaptive composite score relative to the mean single-strategy score, in percent.
    pub fn adaptive_improvement(&self) -> Option<f64> {
        let adaptive = composite_score(self.adaptive()?);
        let singles: Vec<f64> = self
            .metrics
            .iter()
            .filter(|(entry, _)| matches!(entry, BenchmarkEntry::Strategy(_)))
            .map(|(_, m)| composite_score(m))
            .collect();
        if singles.is_empty() {
            return None;
        }
        let mean = singles.iter().sum::<f64>() / singles.len() as f64;
        if mean == 0.0 {
            return None;
        }
        Some((adaptive - mean) / mean * 100.0)
    }
}

/// Weighted blend of success rate, memory efficiency and (inverse) fragmentation, in `[0, 1]`.
pub fn composite_score(m: &AllocatorMetrics) -> f64 {
    WEIGHT_SUCCESS * m.success_rate / 100.0
        + WEIGHT_EFFICIENCY * m.memory_efficiency()
        + WEIGHT_FRAGMENTATION * (1.0 - m.fragmentation / 100.0)
}

/// Running digest of the requests a phase submitted.
#[derive(Debug, Default)]
pub(crate) struct SequenceDigest {
    hasher: DefaultHasher,
}

impl SequenceDigest {
    pub fn push(&mut self, request: &AllocationRequest) {
        request.id.hash(&mut self.hasher);
        request.size.hash(&mut self.hasher);
        request.lifetime.hash(&mut self.hasher);
    }

    pub fn finish(&self) -> u64 {
        self.hasher.finish()
    }
}

/// Counters for the adaptive phase, measured operation by operation.
#[derive(Debug, Default)]
pub(crate) struct AdaptiveTally {
    allocations: u64,
    deallocations: u64,
    failed_allocations: u64,
    failed_deallocations: u64,
    peak_usage: usize,
    avg_alloc_us: f64,
    avg_dealloc_us: f64,
    pub picks: BTreeMap<StrategyKind, u64>,
}

impl AdaptiveTally {
    pub fn record_pick(&mut self, kind: StrategyKind) {
        *self.picks.entry(kind).or_insert(0) += 1;
    }

    pub fn record_allocation(&mut self, ok: bool, elapsed: Duration) {
        if ok {
            self.allocations += 1;
            self.avg_alloc_us = rolling(self.avg_alloc_us, self.allocations, elapsed);
        } else {
            self.failed_allocations += 1;
        }
    }

    pub fn record_deallocation(&mut self, ok: bool, elapsed: Duration) {
        if ok {
            self.deallocations += 1;
            self.avg_dealloc_us = rolling(self.avg_dealloc_us, self.deallocations, elapsed);
        } else {
            self.failed_deallocations += 1;
        }
    }

    pub fn observe_usage(&mut self, usage: usize) {
        self.peak_usage = self.peak_usage.max(usage);
    }

    /// Fold the tally and the picked strategies' arenas into one metrics row.
    ///
    /// Capacity, usage, waste and free space are summed over the strategies
    /// the selector used; fragmentation is computed over that combined free space.
    pub fn metrics(&self, strategies: &[Box<dyn AllocatorStrategy>]) -> AllocatorMetrics {
        let mut out = AllocatorMetrics {
            total_allocations: self.allocations,
            total_deallocations: self.deallocations,
            failed_allocations: self.failed_allocations,
            failed_deallocations: self.failed_deallocations,
            peak_usage: self.peak_usage,
            success_rate: success_rate_percent(self.allocations, self.failed_allocations),
            avg_alloc_time_us: self.avg_alloc_us,
            avg_dealloc_time_us: self.avg_dealloc_us,
            ..Default::default()
        };

        for strategy in strategies.iter().filter(|s| self.picks.contains_key(&s.kind())) {
            let m = strategy.metrics();
            out.capacity += m.capacity;
            out.current_usage += m.current_usage;
            out.wasted_space += m.wasted_space;
            out.free_space += m.free_space;
            out.largest_free_block = out.largest_free_block.max(m.largest_free_block);
            out.live_blocks += m.live_blocks;
            out.free_blocks += m.free_blocks;
        }
        out.fragmentation = fragmentation_percent(out.free_space, out.largest_free_block);
        out
    }
}

fn rolling(avg: f64, n: u64, elapsed: Duration) -> f64 {
    (avg * (n - 1) as f64 + elapsed.as_secs_f64() * 1_000_000.0) / n as f64
}
