//! Simulator configuration.

use crate::util::size::kb;

/// Construction-time configuration shared by every strategy and the engine.
#[derive(Debug, Clone)]
pub struct SimConfig {
    /// Size of each strategy's arena in bytes (default: 16 KB)
    pub arena_capacity: usize,

    /// Slot size of the pool strategy
    pub pool_block_size: usize,

    /// Smallest block the buddy strategy hands out
    pub buddy_min_block: usize,

    /// Per-allocation header added by the general-purpose strategy
    pub header_overhead: usize,

    /// Size classes (header-inclusive) of the general-purpose strategy
    pub size_classes: Vec<usize>,

    /// Alignment applied by the linear and stack strategies
    pub bump_alignment: usize,

    /// Simulated milliseconds that pass per tick
    pub sim_step_ms: u64,

    /// Lower bound on the wall-clock tick period in milliseconds
    pub tick_floor_ms: u64,

    /// Chance that a live-mode tick draws a new request
    pub request_probability: f64,

    /// Live-mode ticks between metrics snapshot records (0 = never)
    pub snapshot_interval: u64,

    /// Seed for the workload generator (None = seeded from the clock)
    pub seed: Option<u64>,

    /// Capacity of the bounded log queue used by `QueueSink`
    pub log_queue_capacity: usize,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            arena_capacity: kb(16),
            pool_block_size: 64,
            buddy_min_block: 16,
            header_overhead: 8,
            size_classes: vec![16, 32, 64, 128, 256, 512],
            bump_alignment: 8,
            sim_step_ms: 100,
            tick_floor_ms: 16,
            request_probability: 0.7,
            snapshot_interval: 50,
            seed: None,
            log_queue_capacity: 1024,
        }
    }
}

impl SimConfig {
    /// Create a 1 KB config for tests and tiny heaps.
    pub fn minimal() -> Self {
        Self {
            arena_capacity: kb(1),
            size_classes: vec![16, 32, 64, 128],
            log_queue_capacity: 128,
            ..Self::default()
        }
    }

    /// Builder pattern: set arena capacity.
    pub fn with_arena_capacity(mut self, capacity: usize) -> Self {
        self.arena_capacity = capacity;
        self
    }

    /// Builder pattern: set pool slot size.
    pub fn with_pool_block_size(mut self, size: usize) -> Self {
        self.pool_block_size = size;
        self
    }

    /// Builder pattern: set the buddy minimum block size.
    pub fn with_buddy_min_block(mut self, size: usize) -> Self {
        self.buddy_min_block = size;
        self
    }

    /// Builder pattern: set the general-purpose header overhead.
    pub fn with_header_overhead(mut self, overhead: usize) -> Self {
        self.header_overhead = overhead;
        self
    }

    /// Builder pattern: set the general-purpose size classes.
    pub fn with_size_classes(mut self, mut classes: Vec<usize>) -> Self {
        classes.sort_unstable();
        classes.dedup();
        self.size_classes = classes;
        self
    }

    /// Builder pattern: set bump alignment (rounded up to a power of two).
    pub fn with_bump_alignment(mut self, align: usize) -> Self {
        self.bump_alignment = align.max(1).next_power_of_two();
        self
    }

    /// Builder pattern: set the per-tick request probability.
    pub fn with_request_probability(mut self, probability: f64) -> Self {
        self.request_probability = probability.clamp(0.0, 1.0);
        self
    }

    /// Builder pattern: set the simulated step per tick.
    pub fn with_sim_step_ms(mut self, step: u64) -> Self {
        self.sim_step_ms = step.max(1);
        self
    }

    /// Builder pattern: set the snapshot interval.
    pub fn with_snapshot_interval(mut self, ticks: u64) -> Self {
        self.snapshot_interval = ticks;
        self
    }

    /// Builder pattern: fix the workload seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}
