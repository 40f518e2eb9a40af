//! Workload generator.
//!
//! Produces requests live, or materializes a fixed sequence once and
//! replays it from a cursor so every strategy sees the same workload.

use std::time::{SystemTime, UNIX_EPOCH};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::api::block::{AllocationRequest, SimTime};

use super::pattern::{WorkloadPattern, LIFO_START_MS, LIFO_STEP_MS, POWER_OF_TWO_SIZES};

/// Share of [`WorkloadPattern::Mixed`] requests drawn from the large tail.
const MIXED_LARGE_SHARE: f64 = 0.3;

/// Simulated time between replayed requests unless told otherwise.
const DEFAULT_REPLAY_STEP_MS: SimTime = 100;

/// Source of allocation requests.
#[derive(Debug)]
pub struct WorkloadGenerator {
    rng: StdRng,
    seed: u64,

    /// Next request id
    next_id: u64,

    /// Expiries of LIFO requests still pending, latest at the bottom
    lifo_deadlines: Vec<SimTime>,

    /// Simulated time between replayed requests
    replay_step: SimTime,

    /// Pre-generated sequence and replay cursor
    sequence: Vec<AllocationRequest>,
    cursor: usize,
}

impl WorkloadGenerator {
    /// Create a generator. `None` seeds from the system clock.
    pub fn new(seed: Option<u64>) -> Self {
        let seed = seed.unwrap_or_else(|| {
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_nanos() as u64)
                .unwrap_or_default()
        });

        Self {
            rng: StdRng::seed_from_u64(seed),
            seed,
            next_id: 0,
            lifo_deadlines: Vec::new(),
            replay_step: DEFAULT_REPLAY_STEP_MS,
            sequence: Vec::new(),
            cursor: 0,
        }
    }

    /// Builder pattern: simulated time between replayed requests.
    ///
    /// Pre-generated LIFO lifetimes are laid out for this cadence.
    pub fn with_replay_step(mut self, step: SimTime) -> Self {
        self.replay_step = step.max(1);
        self
    }

    /// Seed this generator was built with.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Draw one request for `pattern`, stamped at `now`.
    pub fn generate_request(&mut self, pattern: WorkloadPattern, now: SimTime) -> AllocationRequest {
        let id = format!("req-{}", self.next_id);
        self.next_id += 1;

        let (size, lifetime) = match pattern {
            WorkloadPattern::Mixed if self.rng.random_bool(MIXED_LARGE_SHARE) => {
                (self.rng.random_range(512..=2048), Some(self.rng.random_range(2_000..=8_000)))
            }
            WorkloadPattern::PowerOfTwo => {
                let size = POWER_OF_TWO_SIZES[self.rng.random_range(0..POWER_OF_TWO_SIZES.len())];
                (size, self.draw_lifetime(pattern))
            }
            WorkloadPattern::Lifo => {
                let lifetime = self.lifo_lifetime(now);
                (self.rng.random_range(pattern.size_range()), Some(lifetime))
            }
            _ => (self.rng.random_range(pattern.size_range()), self.draw_lifetime(pattern)),
        };

        AllocationRequest::new(id, size, now, lifetime)
    }

    /// Bernoulli draw from the generator's stream.
    pub fn roll(&mut self, probability: f64) -> bool {
        self.rng.random_bool(probability.clamp(0.0, 1.0))
    }

    /// Materialize `count` requests for replay and rewind the cursor.
    ///
    /// Request `i` is stamped at `i * replay_step`, the offset it will be
    /// replayed at; [`next_operation`](Self::next_operation) reissues it at
    /// the actual replay time. Live LIFO state is left untouched.
    pub fn pre_generate_workload(&mut self, pattern: WorkloadPattern, count: usize) {
        let step = self.replay_step;
        let live = std::mem::take(&mut self.lifo_deadlines);
        let sequence = (0..count as u64).map(|i| self.generate_request(pattern, i * step)).collect();
        self.lifo_deadlines = live;
        self.sequence = sequence;
        self.cursor = 0;
    }

    /// Next pre-generated request, reissued at `now`.
    pub fn next_operation(&mut self, now: SimTime) -> Option<AllocationRequest> {
        let request = self.sequence.get(self.cursor)?.reissued_at(now);
        self.cursor += 1;
        Some(request)
    }

    /// Whether the replay cursor has requests left.
    pub fn has_more_operations(&self) -> bool {
        self.cursor < self.sequence.len()
    }

    /// Rewind the replay cursor without regenerating.
    pub fn reset_workload(&mut self) {
        self.cursor = 0;
    }

    /// Cursor position over sequence length, in `[0, 1]`.
    pub fn progress(&self) -> f64 {
        if self.sequence.is_empty() {
            0.0
        } else {
            self.cursor as f64 / self.sequence.len() as f64
        }
    }

    /// The pre-generated sequence.
    pub fn workload(&self) -> &[AllocationRequest] {
        &self.sequence
    }

    /// Drop the pre-generated sequence and any pending LIFO expiries.
    pub fn clear_workload(&mut self) {
        self.sequence.clear();
        self.cursor = 0;
        self.lifo_deadlines.clear();
    }

    /// Lifetime that nests the new request inside every pending one.
    ///
    /// Pending expiries never increase from bottom to top, so the ones that
    /// have passed sit on top. The new request expires `LIFO_STEP_MS` before
    /// the newest pending one, or together with it when that gap is gone.
    fn lifo_lifetime(&mut self, now: SimTime) -> SimTime {
        while self.lifo_deadlines.last().is_some_and(|&expiry| expiry <= now) {
            self.lifo_deadlines.pop();
        }
        let expires_at = match self.lifo_deadlines.last() {
            None => now + LIFO_START_MS,
            Some(&top) if top.saturating_sub(LIFO_STEP_MS) > now => top - LIFO_STEP_MS,
            Some(&top) => top,
        };
        self.lifo_deadlines.push(expires_at);
        expires_at - now
    }

    fn draw_lifetime(&mut self, pattern: WorkloadPattern) -> Option<SimTime> {
        pattern.lifetime_range().map(|range| self.rng.random_range(range))
    }
}
