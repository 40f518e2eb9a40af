//! Adaptive strategy selection.
//!
//! Scores every strategy for a workload pattern: a static base affinity,
//! nudged by the strategy's live metrics. Pure and deterministic for fixed
//! inputs. Latency is wall-clock measured, so a selector that must route a
//! seeded workload the same way every run is built with
//! [`SmartSelector::ignoring_latency`].

mod affinity;

pub use affinity::base_affinity;

use std::collections::BTreeMap;
use std::fmt;

use crate::allocators::StrategyKind;
use crate::api::stats::AllocatorMetrics;
use crate::workload::WorkloadPattern;

/// Bounds on any single metric adjustment.
const MIN_FACTOR: f64 = 0.5;
const MAX_FACTOR: f64 = 1.2;

/// Fragmentation thresholds in percent.
const FRAG_HIGH: f64 = 50.0;
const FRAG_MODERATE: f64 = 25.0;
const FRAG_LOW: f64 = 10.0;

/// Success rate thresholds in percent.
const SUCCESS_POOR: f64 = 80.0;
const SUCCESS_FAIR: f64 = 95.0;
const SUCCESS_EXCELLENT: f64 = 99.0;

/// Memory efficiency thresholds (`usage / (usage + waste)`).
const EFFICIENCY_POOR: f64 = 0.70;
const EFFICIENCY_FAIR: f64 = 0.85;
const EFFICIENCY_HIGH: f64 = 0.95;

/// Average allocation latency thresholds in microseconds.
const LATENCY_SLOW_US: f64 = 20.0;
const LATENCY_FAST_US: f64 = 2.0;

/// A strategy's score for a workload, with the reasoning behind it.
#[derive(Debug, Clone, PartialEq)]
pub struct AllocatorScore {
    pub strategy: StrategyKind,
    /// Always within `[0, 1]`.
    pub score: f64,
    /// Adjustments in the order they were applied.
    pub reasoning: Vec<String>,
}

impl fmt::Display for AllocatorScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:<10} {:.3}", self.strategy.name(), self.score)?;
        if let Some(last) = self.reasoning.last() {
            write!(f, "  ({})", last)?;
        }
        Ok(())
    }
}

/// The heuristic meta-allocator.
#[derive(Debug, Clone, Copy)]
pub struct SmartSelector {
    /// Apply the allocation-latency adjustment.
    latency: bool,
}

impl Default for SmartSelector {
    fn default() -> Self {
        Self::new()
    }
}

impl SmartSelector {
    pub fn new() -> Self {
        Self { latency: true }
    }

    /// Same selector without the latency adjustment, so scores depend only
    /// on counters and block sets.
    pub fn ignoring_latency(self) -> Self {
        Self { latency: false }
    }

    /// Highest scoring strategy; ties go to the earlier strategy in table order.
    pub fn select_optimal_allocator(
        &self,
        pattern: WorkloadPattern,
        metrics: &BTreeMap<StrategyKind, AllocatorMetrics>,
    ) -> AllocatorScore {
        let mut scores = self.allocator_scores(pattern, metrics);
        // `ALL` is never empty, so neither is `scores`.
        scores.swap_remove(0)
    }

    /// Every strategy scored, sorted by descending score.
    pub fn allocator_scores(
        &self,
        pattern: WorkloadPattern,
        metrics: &BTreeMap<StrategyKind, AllocatorMetrics>,
    ) -> Vec<AllocatorScore> {
        let mut scores: Vec<AllocatorScore> = StrategyKind::ALL
            .into_iter()
            .map(|kind| self.score(pattern, kind, metrics.get(&kind)))
            .collect();
        // Stable: equal scores keep table order.
        scores.sort_by(|a, b| b.score.total_cmp(&a.score));
        scores
    }

    /// Score a single strategy.
    pub fn score(
        &self,
        pattern: WorkloadPattern,
        strategy: StrategyKind,
        metrics: Option<&AllocatorMetrics>,
    ) -> AllocatorScore {
        let base = base_affinity(pattern, strategy);
        let mut trail = Trail {
            score: base,
            reasoning: vec![format!("Base affinity for {}: {:.2}", pattern, base)],
        };

        match metrics.filter(|m| m.attempts() > 0) {
            Some(m) => {
                adjust_fragmentation(&mut trail, m);
                adjust_success_rate(&mut trail, m);
                adjust_efficiency(&mut trail, m);
                if self.latency {
                    adjust_latency(&mut trail, m);
                }
            }
            None => trail.reasoning.push("No live metrics yet".to_string()),
        }

        AllocatorScore {
            strategy,
            score: trail.score.clamp(0.0, 1.0),
            reasoning: trail.reasoning,
        }
    }
}

struct Trail {
    score: f64,
    reasoning: Vec<String>,
}

impl Trail {
    fn apply(&mut self, factor: f64, why: String) {
        let factor = factor.clamp(MIN_FACTOR, MAX_FACTOR);
        self.score *= factor;
        self.reasoning.push(format!("{}: x{:.2}", why, factor));
    }
}

fn adjust_fragmentation(trail: &mut Trail, m: &AllocatorMetrics) {
    let frag = m.fragmentation;
    if frag > FRAG_HIGH {
        trail.apply(0.70, format!("High fragmentation ({:.1}%)", frag));
    } else if frag > FRAG_MODERATE {
        trail.apply(0.85, format!("Moderate fragmentation ({:.1}%)", frag));
    } else if frag < FRAG_LOW {
        trail.apply(1.10, format!("Low fragmentation ({:.1}%)", frag));
    }
}

fn adjust_success_rate(trail: &mut Trail, m: &AllocatorMetrics) {
    let rate = m.success_rate;
    if rate < SUCCESS_POOR {
        trail.apply(0.60, format!("Poor success rate ({:.1}%)", rate));
    } else if rate < SUCCESS_FAIR {
        trail.apply(0.85, format!("Fair success rate ({:.1}%)", rate));
    } else if rate >= SUCCESS_EXCELLENT {
        trail.apply(1.05, format!("Excellent success rate ({:.1}%)", rate));
    }
}

fn adjust_efficiency(trail: &mut Trail, m: &AllocatorMetrics) {
    if m.current_usage + m.wasted_space == 0 {
        return;
    }
    let efficiency = m.memory_efficiency();
    if efficiency < EFFICIENCY_POOR {
        trail.apply(0.80, format!("Poor memory efficiency ({:.0}%)", efficiency * 100.0));
    } else if efficiency < EFFICIENCY_FAIR {
        trail.apply(0.90, format!("Fair memory efficiency ({:.0}%)", efficiency * 100.0));
    } else if efficiency > EFFICIENCY_HIGH {
        trail.apply(1.05, format!("High memory efficiency ({:.0}%)", efficiency * 100.0));
    }
}

fn adjust_latency(trail: &mut Trail, m: &AllocatorMetrics) {
    let latency = m.avg_alloc_time_us;
    if latency > LATENCY_SLOW_US {
        trail.apply(0.90, format!("Slow allocations ({:.2} us)", latency));
    } else if latency < LATENCY_FAST_US {
        trail.apply(1.02, format!("Fast allocations ({:.2} us)", latency));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metrics(fragmentation: f64, success_rate: f64, usage: usize, waste: usize) -> AllocatorMetrics {
        AllocatorMetrics {
            total_allocations: 10,
            fragmentation,
            success_rate,
            current_usage: usage,
            wasted_space: waste,
            avg_alloc_time_us: 5.0,
            ..Default::default()
        }
    }

    #[test]
    fn test_no_metrics_uses_base_affinity() {
        let selector = SmartSelector::new();
        let best = selector.select_optimal_allocator(WorkloadPattern::Lifo, &BTreeMap::new());
        assert_eq!(best.strategy, StrategyKind::Stack);
        assert_eq!(best.score, 0.95);
        assert_eq!(best.reasoning.len(), 2);
    }

    #[test]
    fn test_penalties_can_flip_the_pick() {
        let selector = SmartSelector::new();
        let mut live = BTreeMap::new();
        // Pool keeps failing on a small workload.
        live.insert(StrategyKind::Pool, metrics(60.0, 40.0, 640, 400));
        live.insert(StrategyKind::GeneralPurpose, metrics(5.0, 100.0, 1000, 10));

        let best = selector.select_optimal_allocator(WorkloadPattern::UniformSmall, &live);
        assert_eq!(best.strategy, StrategyKind::GeneralPurpose);
        assert!(best.reasoning.iter().any(|r| r.starts_with("Low fragmentation")));
    }

    #[test]
    fn test_scores_bounded_and_sorted() {
        let selector = SmartSelector::new();
        let mut live = BTreeMap::new();
        for kind in StrategyKind::ALL {
            live.insert(kind, metrics(0.0, 100.0, 100, 0));
        }
        for pattern in WorkloadPattern::ALL {
            let scores = selector.allocator_scores(pattern, &live);
            assert_eq!(scores.len(), StrategyKind::ALL.len());
            assert!(scores.iter().all(|s| (0.0..=1.0).contains(&s.score)));
            assert!(scores.windows(2).all(|w| w[0].score >= w[1].score));
        }
    }

    #[test]
    fn test_ties_keep_table_order() {
        let selector = SmartSelector::new();
        // free-list and rb-tree share a base affinity for small workloads.
        assert_eq!(
            base_affinity(WorkloadPattern::UniformSmall, StrategyKind::FreeList),
            base_affinity(WorkloadPattern::UniformSmall, StrategyKind::BestFit)
        );

        let scores = selector.allocator_scores(WorkloadPattern::UniformSmall, &BTreeMap::new());
        let position = |kind| scores.iter().position(|s| s.strategy == kind);
        assert!(position(StrategyKind::FreeList) < position(StrategyKind::BestFit));
    }

    #[test]
    fn test_boosts_clamp_to_one() {
        let selector = SmartSelector::new();
        let great = AllocatorMetrics {
            total_allocations: 1,
            success_rate: 100.0,
            avg_alloc_time_us: 0.0,
            ..Default::default()
        };
        let score = selector.score(WorkloadPattern::Lifo, StrategyKind::Stack, Some(&great));
        assert_eq!(score.score, 1.0);
        assert_eq!(score.reasoning.len(), 4);
    }

    #[test]
    fn test_ignoring_latency_drops_only_that_adjustment() {
        let mut slow = metrics(0.0, 100.0, 100, 0);
        slow.avg_alloc_time_us = 500.0;
        let mut fast = slow.clone();
        fast.avg_alloc_time_us = 0.1;

        let selector = SmartSelector::new();
        let with_slow = selector.score(WorkloadPattern::Mixed, StrategyKind::Buddy, Some(&slow));
        let with_fast = selector.score(WorkloadPattern::Mixed, StrategyKind::Buddy, Some(&fast));
        assert!(with_slow.score < with_fast.score);

        let steady = SmartSelector::new().ignoring_latency();
        let a = steady.score(WorkloadPattern::Mixed, StrategyKind::Buddy, Some(&slow));
        let b = steady.score(WorkloadPattern::Mixed, StrategyKind::Buddy, Some(&fast));
        assert_eq!(a, b);
        assert_eq!(a.reasoning.len(), with_slow.reasoning.len() - 1);
    }
}
