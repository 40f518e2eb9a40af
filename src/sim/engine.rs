//! The simulation engine.
//!
//! Owns one instance of every strategy, the workload generator and the
//! selector. Time only moves through [`SimulationEngine::tick`], which a
//! host calls directly or through [`SimulationEngine::poll`].

use std::cmp::Reverse;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::allocators::{AllocatorStrategy, StrategyKind};
use crate::api::block::{AllocationBlock, AllocationRequest, SimTime};
use crate::api::config::SimConfig;
use crate::api::error::{AllocError, SimError};
use crate::api::stats::AllocatorMetrics;
use crate::diagnostics::{Diagnostic, LogRecord, LogSink, NullSink, EA001, EA002, EA003, EA101};
use crate::selector::{AllocatorScore, SmartSelector};
use crate::workload::{WorkloadGenerator, WorkloadPattern};

use super::benchmark::{AdaptiveTally, BenchmarkEntry, BenchmarkResults, SequenceDigest};
use super::state::{BenchmarkPhase, RunState, SimulationState};

/// Speed multiplier bounds.
pub const MIN_SPEED: f64 = 0.1;
pub const MAX_SPEED: f64 = 10.0;

/// Most ticks a single `poll` will run to catch up with a late host.
const MAX_CATCH_UP: u32 = 64;

/// A request waiting for its lifetime to run out.
#[derive(Debug)]
struct ActiveRequest {
    id: String,
    expires_at: SimTime,
    /// Tracking order; later requests sit higher on a stack.
    order: u64,
    /// Strategies that hold a block for this request.
    holders: Vec<StrategyKind>,
    /// Expired, but every holder refused because later blocks sit above it.
    blocked: bool,
}

/// Periodic tick schedule.
#[derive(Debug, Clone, Copy)]
struct Timer {
    period_ms: u64,
    /// Armed on the first poll after start.
    next_due: Option<u64>,
}

impl Timer {
    fn new(period_ms: u64) -> Self {
        Self {
            period_ms,
            next_due: None,
        }
    }
}

/// A benchmark in progress or finished.
#[derive(Debug)]
struct BenchmarkRun {
    phase: BenchmarkPhase,
    /// Strategy under test while in the per-strategy phase.
    strategy_index: usize,
    results: BenchmarkResults,
    digest: SequenceDigest,
    tally: AdaptiveTally,
}

impl BenchmarkRun {
    fn new(pattern: WorkloadPattern, operation_count: usize) -> Self {
        Self {
            phase: BenchmarkPhase::PerStrategy,
            strategy_index: 0,
            results: BenchmarkResults::new(pattern, operation_count),
            digest: SequenceDigest::default(),
            tally: AdaptiveTally::default(),
        }
    }

    fn in_progress(&self) -> bool {
        matches!(self.phase, BenchmarkPhase::PerStrategy | BenchmarkPhase::Adaptive)
    }
}

/// Time-stepped driver of every strategy.
///
/// Two mutually exclusive modes share the tick loop:
///
/// - **Live**: each tick may draw a random request and submits it to every
///   strategy side by side. With adaptive mode on, the selector re-picks
///   the best strategy after each request.
/// - **Benchmark**: a pre-generated workload is replayed against one
///   strategy at a time, then once more through the selector. Results are
///   kept until the next benchmark or [`reset`](Self::reset).
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use edgealloc::{NullSink, SimConfig, SimulationEngine, WorkloadPattern};
///
/// let mut engine = SimulationEngine::new(SimConfig::minimal().with_seed(7), Arc::new(NullSink));
/// engine.start_benchmark(WorkloadPattern::Lifo, 20).unwrap();
/// while engine.tick() {}
///
/// let results = engine.benchmark_results().unwrap();
/// assert!(results.is_complete());
/// ```
pub struct SimulationEngine {
    config: SimConfig,
    strategies: Vec<Box<dyn AllocatorStrategy>>,
    generator: WorkloadGenerator,
    selector: SmartSelector,
    sink: Arc<dyn LogSink>,

    run_state: RunState,
    timer: Option<Timer>,
    simulated_time: SimTime,
    tick_count: u64,

    pattern: WorkloadPattern,
    selected: StrategyKind,
    adaptive_mode: bool,
    speed: f64,

    active: Vec<ActiveRequest>,
    tracked: u64,
    benchmark: Option<BenchmarkRun>,
}

impl SimulationEngine {
    /// Build every strategy over `config` and announce each to `sink`.
    pub fn new(config: SimConfig, sink: Arc<dyn LogSink>) -> Self {
        let strategies: Vec<Box<dyn AllocatorStrategy>> =
            StrategyKind::ALL.iter().map(|kind| kind.build(&config)).collect();
        let selector = SmartSelector::new();
        let pattern = WorkloadPattern::UniformSmall;
        let selected = selector.select_optimal_allocator(pattern, &BTreeMap::new()).strategy;

        let engine = Self {
            generator: WorkloadGenerator::new(config.seed).with_replay_step(config.sim_step_ms),
            config,
            strategies,
            selector,
            sink,
            run_state: RunState::Idle,
            timer: None,
            simulated_time: 0,
            tick_count: 0,
            pattern,
            selected,
            adaptive_mode: true,
            speed: 1.0,
            active: Vec::new(),
            tracked: 0,
            benchmark: None,
        };

        for strategy in &engine.strategies {
            engine.emit(LogRecord::Boot {
                at: 0,
                strategy: strategy.kind(),
                capacity: strategy.capacity(),
            });
        }
        engine
    }

    /// Engine that discards its log records.
    pub fn headless(config: SimConfig) -> Self {
        Self::new(config, Arc::new(NullSink))
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    // =========================================================================
    // Control
    // =========================================================================

    /// Arm the tick timer. No-op while already running.
    pub fn start(&mut self) {
        if self.run_state == RunState::Running {
            return;
        }
        self.run_state = RunState::Running;
        self.timer = Some(Timer::new(self.tick_period_ms()));
        self.emit(LogRecord::event(self.simulated_time, "simulation started"));
    }

    /// Cancel the pending tick and keep all state. Idempotent.
    pub fn stop(&mut self) {
        if self.run_state != RunState::Running {
            return;
        }
        self.run_state = RunState::Paused;
        self.timer = None;
        self.emit(LogRecord::event(self.simulated_time, "simulation paused"));
    }

    /// Stop, clear every arena, request and benchmark, and rewind time.
    ///
    /// Pattern, speed, selected strategy and adaptive mode are kept.
    pub fn reset(&mut self) {
        self.run_state = RunState::Idle;
        self.timer = None;
        self.reset_arenas();
        self.generator.clear_workload();
        self.benchmark = None;
        self.simulated_time = 0;
        self.tick_count = 0;
        self.emit(LogRecord::event(0, "simulation reset"));
    }

    pub fn is_running(&self) -> bool {
        self.run_state == RunState::Running
    }

    pub fn run_state(&self) -> RunState {
        self.run_state
    }

    /// Pattern used by live mode.
    pub fn set_workload_pattern(&mut self, pattern: WorkloadPattern) {
        if pattern != self.pattern {
            self.pattern = pattern;
            self.emit(LogRecord::event(self.simulated_time, format!("workload pattern set to {}", pattern)));
        }
    }

    /// Pin the selected strategy. Turns adaptive mode off.
    pub fn set_manual_strategy(&mut self, strategy: StrategyKind) {
        self.adaptive_mode = false;
        self.selected = strategy;
        self.emit(LogRecord::event(
            self.simulated_time,
            format!("manual strategy: {}", strategy.label()),
        ));
    }

    pub fn set_adaptive_mode(&mut self, on: bool) {
        if on != self.adaptive_mode {
            self.adaptive_mode = on;
            let message = if on { "adaptive mode on" } else { "adaptive mode off" };
            self.emit(LogRecord::event(self.simulated_time, message));
        }
    }

    /// Set the speed multiplier, clamped to `[0.1, 10]`.
    ///
    /// While running the timer is re-armed at the new period in one step;
    /// no state is lost. NaN is ignored.
    pub fn set_speed(&mut self, multiplier: f64) {
        if multiplier.is_nan() {
            return;
        }
        self.speed = multiplier.clamp(MIN_SPEED, MAX_SPEED);
        if self.timer.is_some() {
            self.timer = Some(Timer::new(self.tick_period_ms()));
        }
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    /// Wall-clock time between ticks: `max(floor, 1000 / speed)` ms.
    pub fn tick_period(&self) -> Duration {
        Duration::from_millis(self.tick_period_ms())
    }

    fn tick_period_ms(&self) -> u64 {
        ((1000.0 / self.speed).round() as u64).max(self.config.tick_floor_ms)
    }

    // =========================================================================
    // Scheduling
    // =========================================================================

    /// Run every tick due at host time `now_ms`. Returns the number run.
    ///
    /// The first poll after [`start`](Self::start) only arms the timer.
    /// A host that falls far behind loses the backlog beyond a bounded
    /// catch-up instead of running it all at once.
    pub fn poll(&mut self, now_ms: u64) -> u32 {
        let mut ran = 0;
        loop {
            let Some(timer) = self.timer.as_mut() else {
                break;
            };
            let due = *timer.next_due.get_or_insert(now_ms + timer.period_ms);
            if now_ms < due {
                break;
            }
            if ran == MAX_CATCH_UP {
                timer.next_due = Some(now_ms + timer.period_ms);
                break;
            }
            timer.next_due = Some(due + timer.period_ms);
            self.tick();
            ran += 1;
        }
        ran
    }

    /// Advance one step. Returns `false` without doing anything unless running.
    pub fn tick(&mut self) -> bool {
        if self.run_state != RunState::Running {
            return false;
        }
        self.simulated_time += self.config.sim_step_ms;
        self.tick_count += 1;
        self.expire_requests();

        let step = self
            .benchmark
            .as_ref()
            .filter(|run| run.in_progress())
            .map(|run| (run.phase, run.strategy_index));
        match step {
            Some((BenchmarkPhase::PerStrategy, index)) => self.step_strategy_phase(index),
            Some(_) => self.step_adaptive_phase(),
            None => self.step_live(),
        }
        true
    }

    // =========================================================================
    // Benchmark
    // =========================================================================

    /// Replay `operation_count` requests of `pattern` against each strategy,
    /// then through the selector. Cancels live mode and starts running.
    pub fn start_benchmark(&mut self, pattern: WorkloadPattern, operation_count: usize) -> Result<(), SimError> {
        if self.benchmark_running() {
            return Err(self.refuse(SimError::BenchmarkInProgress));
        }
        if operation_count == 0 {
            return Err(self.refuse(SimError::EmptyWorkload));
        }

        self.reset_arenas();
        self.generator.pre_generate_workload(pattern, operation_count);
        self.benchmark = Some(BenchmarkRun::new(pattern, operation_count));
        self.emit(LogRecord::event(
            self.simulated_time,
            format!("benchmark: {} x {} requests", operation_count, pattern),
        ));
        self.announce_phase(StrategyKind::ALL[0]);
        self.start();
        Ok(())
    }

    pub fn benchmark_running(&self) -> bool {
        self.benchmark.as_ref().is_some_and(BenchmarkRun::in_progress)
    }

    /// Results of the current or last benchmark; partial while it runs.
    pub fn benchmark_results(&self) -> Option<&BenchmarkResults> {
        self.benchmark.as_ref().map(|run| &run.results)
    }

    fn refuse(&self, err: SimError) -> SimError {
        self.emit(LogRecord::Diagnostic {
            at: self.simulated_time,
            strategy: None,
            diagnostic: EA101,
            context: err.to_string(),
        });
        err
    }

    fn announce_phase(&self, kind: StrategyKind) {
        self.emit(LogRecord::event(
            self.simulated_time,
            format!("benchmark phase: {}", kind.label()),
        ));
    }

    fn step_strategy_phase(&mut self, index: usize) {
        let kind = StrategyKind::ALL[index];
        if let Some(request) = self.generator.next_operation(self.simulated_time) {
            if let Some(run) = self.benchmark.as_mut() {
                run.digest.push(&request);
            }
            if self.submit(kind, &request) {
                self.track(request, vec![kind]);
            }
        }
        if !self.generator.has_more_operations() {
            self.finish_strategy_phase(index);
        }
    }

    fn finish_strategy_phase(&mut self, index: usize) {
        let kind = StrategyKind::ALL[index];
        let metrics = self.strategies[index].metrics();
        self.emit(LogRecord::MetricsSnapshot {
            at: self.simulated_time,
            strategy: Some(kind),
            metrics: metrics.clone(),
        });

        self.active.clear();
        self.generator.reset_workload();
        let next = StrategyKind::ALL.get(index + 1).copied();

        if let Some(run) = self.benchmark.as_mut() {
            let entry = BenchmarkEntry::Strategy(kind);
            run.results.metrics.insert(entry, metrics);
            run.results.sequence_digests.insert(entry, run.digest.finish());
            run.digest = SequenceDigest::default();
            match next {
                Some(_) => run.strategy_index = index + 1,
                None => run.phase = BenchmarkPhase::Adaptive,
            }
        }

        match next {
            Some(next) => {
                self.strategies[next.index()].reset();
                self.announce_phase(next);
            }
            None => {
                self.reset_arenas();
                self.emit(LogRecord::event(self.simulated_time, "benchmark phase: adaptive selection"));
            }
        }
    }

    fn step_adaptive_phase(&mut self) {
        if let Some(request) = self.generator.next_operation(self.simulated_time) {
            let Some(run) = self.benchmark.as_mut() else {
                return;
            };
            run.digest.push(&request);
            let pattern = run.results.pattern;

            // Wall-clock latency would make routing differ between runs of one seed.
            let pick = self
                .selector
                .ignoring_latency()
                .select_optimal_allocator(pattern, &self.metrics());
            self.switch_to(pick);
            let kind = self.selected;

            let (outcome, elapsed) = self.place(kind, &request);
            let ok = outcome.is_ok();
            self.log_outcome(kind, &request, outcome);

            if let Some(run) = self.benchmark.as_mut() {
                run.tally.record_pick(kind);
                run.tally.record_allocation(ok, elapsed);
                let usage = run
                    .tally
                    .picks
                    .keys()
                    .map(|k| self.strategies[k.index()].metrics().current_usage)
                    .sum();
                run.tally.observe_usage(usage);
            }

            if ok {
                self.track(request, vec![kind]);
            }
        }
        if !self.generator.has_more_operations() {
            self.finish_adaptive_phase();
        }
    }

    fn finish_adaptive_phase(&mut self) {
        let Some(run) = self.benchmark.as_mut() else {
            return;
        };
        let metrics = run.tally.metrics(&self.strategies);
        run.results.metrics.insert(BenchmarkEntry::Adaptive, metrics.clone());
        run.results.sequence_digests.insert(BenchmarkEntry::Adaptive, run.digest.finish());
        run.results.adaptive_picks = run.tally.picks.clone();
        run.phase = BenchmarkPhase::Done;
        let best = run.results.best_strategy();

        self.active.clear();
        self.emit(LogRecord::MetricsSnapshot {
            at: self.simulated_time,
            strategy: None,
            metrics,
        });
        let summary = match best {
            Some(best) => format!("benchmark complete; best single strategy: {}", best.label()),
            None => "benchmark complete".to_string(),
        };
        self.emit(LogRecord::event(self.simulated_time, summary));
        self.stop();
    }

    // =========================================================================
    // Live mode
    // =========================================================================

    fn step_live(&mut self) {
        if self.generator.roll(self.config.request_probability) {
            let request = self.generator.generate_request(self.pattern, self.simulated_time);
            let holders: Vec<StrategyKind> = StrategyKind::ALL
                .into_iter()
                .filter(|&kind| self.submit(kind, &request))
                .collect();
            self.track(request, holders);

            if self.adaptive_mode {
                let pick = self.selector.select_optimal_allocator(self.pattern, &self.metrics());
                self.switch_to(pick);
            }
        }

        let interval = self.config.snapshot_interval;
        if interval > 0 && self.tick_count % interval == 0 {
            self.emit(LogRecord::MetricsSnapshot {
                at: self.simulated_time,
                strategy: Some(self.selected),
                metrics: self.strategies[self.selected.index()].metrics(),
            });
        }
    }

    fn switch_to(&mut self, pick: AllocatorScore) {
        if pick.strategy == self.selected {
            return;
        }
        let from = self.selected;
        self.selected = pick.strategy;
        self.emit(LogRecord::Recommendation {
            at: self.simulated_time,
            from,
            to: pick.strategy,
            score: pick.score,
            reasoning: pick.reasoning,
        });
    }

    // =========================================================================
    // Request lifecycle
    // =========================================================================

    /// Allocate on one strategy and log the outcome.
    fn submit(&mut self, kind: StrategyKind, request: &AllocationRequest) -> bool {
        let (outcome, _) = self.place(kind, request);
        self.log_outcome(kind, request, outcome)
    }

    fn place(&mut self, kind: StrategyKind, request: &AllocationRequest) -> (Result<AllocationBlock, AllocError>, Duration) {
        let started = Instant::now();
        let outcome = self.strategies[kind.index()].allocate(request);
        (outcome, started.elapsed())
    }

    fn log_outcome(
        &self,
        kind: StrategyKind,
        request: &AllocationRequest,
        outcome: Result<AllocationBlock, AllocError>,
    ) -> bool {
        match outcome {
            Ok(block) => {
                self.emit(LogRecord::Allocation {
                    at: self.simulated_time,
                    strategy: kind,
                    id: request.id.clone(),
                    size: request.size,
                    address: block.address,
                    block_size: block.size,
                });
                true
            }
            Err(err) => {
                self.report(kind, &err, format!("{} ({} B): {}", request.id, request.size, err));
                false
            }
        }
    }

    fn report(&self, kind: StrategyKind, err: &AllocError, context: String) {
        self.emit(LogRecord::Diagnostic {
            at: self.simulated_time,
            strategy: Some(kind),
            diagnostic: diagnostic_for(err),
            context,
        });
    }

    fn track(&mut self, request: AllocationRequest, holders: Vec<StrategyKind>) {
        if holders.is_empty() {
            return;
        }
        if let Some(expires_at) = request.expires_at() {
            self.tracked += 1;
            self.active.push(ActiveRequest {
                id: request.id,
                expires_at,
                order: self.tracked,
                holders,
                blocked: false,
            });
        }
    }

    /// Free every tracked request whose lifetime has run out.
    ///
    /// Earliest expiry goes first and equal expiries go newest first. A
    /// holder that refuses because later blocks sit above the request keeps
    /// it tracked; blocked requests are retried newest first after the
    /// fresh ones, once they reach the top, without logging a second refusal.
    fn expire_requests(&mut self) {
        let now = self.simulated_time;
        if !self.active.iter().any(|r| r.expires_at <= now) {
            return;
        }

        let (mut due, pending): (Vec<_>, Vec<_>) = std::mem::take(&mut self.active)
            .into_iter()
            .partition(|r| r.expires_at <= now);
        self.active = pending;
        due.sort_by_key(|r| (r.blocked, if r.blocked { 0 } else { r.expires_at }, Reverse(r.order)));

        for mut request in due {
            let blocked = request.blocked;
            request.holders.retain(|&kind| {
                if blocked && self.strategies[kind.index()].release_blocked(&request.id) {
                    return true;
                }
                self.expire(kind, &request.id).is_err() && self.strategies[kind.index()].release_blocked(&request.id)
            });
            if !request.holders.is_empty() {
                request.blocked = true;
                self.active.push(request);
            }
        }
    }

    fn expire(&mut self, kind: StrategyKind, id: &str) -> Result<(), AllocError> {
        let started = Instant::now();
        let outcome = self.strategies[kind.index()].release(id);
        let elapsed = started.elapsed();

        if let Some(run) = self.benchmark.as_mut().filter(|r| r.phase == BenchmarkPhase::Adaptive) {
            run.tally.record_deallocation(outcome.is_ok(), elapsed);
        }

        match &outcome {
            Ok(()) => self.emit(LogRecord::Deallocation {
                at: self.simulated_time,
                strategy: kind,
                id: id.to_string(),
            }),
            Err(err) => self.report(kind, err, format!("{}: {}", id, err)),
        }
        outcome
    }

    fn reset_arenas(&mut self) {
        for strategy in &mut self.strategies {
            strategy.reset();
        }
        self.active.clear();
    }

    fn emit(&self, record: LogRecord) {
        self.sink.record(&record);
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Current metrics of every strategy.
    pub fn metrics(&self) -> BTreeMap<StrategyKind, AllocatorMetrics> {
        self.strategies.iter().map(|s| (s.kind(), s.metrics())).collect()
    }

    /// Every strategy scored for the live pattern, best first.
    pub fn scores(&self) -> Vec<AllocatorScore> {
        self.selector.allocator_scores(self.pattern, &self.metrics())
    }

    pub fn strategy(&self, kind: StrategyKind) -> &dyn AllocatorStrategy {
        self.strategies[kind.index()].as_ref()
    }

    /// The pre-generated benchmark workload, empty outside benchmarks.
    pub fn workload(&self) -> &[AllocationRequest] {
        self.generator.workload()
    }

    pub fn seed(&self) -> u64 {
        self.generator.seed()
    }

    /// Immutable snapshot for display collaborators.
    pub fn state(&self) -> SimulationState {
        let run = self.benchmark.as_ref();
        let phase = run.map_or(BenchmarkPhase::Idle, |r| r.phase);
        let phases = (StrategyKind::ALL.len() + 1) as f64;
        let progress = match run {
            Some(r) if r.phase == BenchmarkPhase::PerStrategy => {
                (r.strategy_index as f64 + self.generator.progress()) / phases * 100.0
            }
            Some(r) if r.phase == BenchmarkPhase::Adaptive => {
                (phases - 1.0 + self.generator.progress()) / phases * 100.0
            }
            Some(r) if r.phase == BenchmarkPhase::Done => 100.0,
            _ => 0.0,
        };

        SimulationState {
            run_state: self.run_state,
            running: self.is_running(),
            simulated_time: self.simulated_time,
            tick_count: self.tick_count,
            workload_pattern: self.pattern,
            selected_strategy: self.selected,
            adaptive_mode: self.adaptive_mode,
            speed_multiplier: self.speed,
            benchmark_running: self.benchmark_running(),
            benchmark_phase: phase,
            benchmark_strategy: run
                .filter(|r| r.phase == BenchmarkPhase::PerStrategy)
                .map(|r| StrategyKind::ALL[r.strategy_index]),
            benchmark_progress: progress,
            active_requests: self.active.len(),
        }
    }
}

impl fmt::Debug for SimulationEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimulationEngine")
            .field("run_state", &self.run_state)
            .field("simulated_time", &self.simulated_time)
            .field("pattern", &self.pattern)
            .field("selected", &self.selected)
            .field("adaptive_mode", &self.adaptive_mode)
            .field("speed", &self.speed)
            .field("active", &self.active.len())
            .finish_non_exhaustive()
    }
}

fn diagnostic_for(err: &AllocError) -> Diagnostic {
    match err {
        AllocError::OutOfSpace { .. } => EA001,
        AllocError::Unsatisfiable { .. } => EA002,
        AllocError::UnknownBlock { .. } => EA003,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::CollectingSink;

    fn engine() -> SimulationEngine {
        SimulationEngine::headless(SimConfig::minimal().with_seed(42))
    }

    #[test]
    fn test_tick_requires_running() {
        let mut engine = engine();
        assert!(!engine.tick());
        assert_eq!(engine.state().simulated_time, 0);

        engine.start();
        assert!(engine.tick());
        assert_eq!(engine.state().simulated_time, 100);
        assert_eq!(engine.state().tick_count, 1);
    }

    #[test]
    fn test_stop_is_idempotent() {
        let mut engine = engine();
        engine.start();
        engine.tick();
        engine.stop();
        engine.stop();
        assert_eq!(engine.run_state(), RunState::Paused);
        assert!(!engine.tick());
        assert_eq!(engine.poll(10_000), 0);

        engine.start();
        assert_eq!(engine.run_state(), RunState::Running);
        assert_eq!(engine.state().simulated_time, 100);
    }

    #[test]
    fn test_reset_returns_to_idle() {
        let mut engine = engine();
        engine.start();
        for _ in 0..20 {
            engine.tick();
        }
        engine.reset();

        let state = engine.state();
        assert_eq!(state.run_state, RunState::Idle);
        assert_eq!(state.simulated_time, 0);
        assert_eq!(state.active_requests, 0);
        for metrics in engine.metrics().values() {
            assert_eq!(metrics.current_usage, 0);
            assert_eq!(metrics.total_allocations, 0);
        }
    }

    #[test]
    fn test_speed_is_clamped() {
        let mut engine = engine();
        engine.set_speed(50.0);
        assert_eq!(engine.speed(), MAX_SPEED);
        assert_eq!(engine.tick_period(), Duration::from_millis(100));

        engine.set_speed(0.0);
        assert_eq!(engine.speed(), MIN_SPEED);
        assert_eq!(engine.tick_period(), Duration::from_millis(10_000));

        engine.set_speed(f64::NAN);
        assert_eq!(engine.speed(), MIN_SPEED);
    }

    #[test]
    fn test_tick_floor() {
        let config = SimConfig {
            tick_floor_ms: 250,
            ..SimConfig::minimal()
        };
        let mut engine = SimulationEngine::headless(config);
        engine.set_speed(10.0);
        assert_eq!(engine.tick_period(), Duration::from_millis(250));
    }

    #[test]
    fn test_poll_runs_due_ticks() {
        let mut engine = engine();
        engine.start();

        // First poll arms the timer at 1000 ms.
        assert_eq!(engine.poll(0), 0);
        assert_eq!(engine.poll(999), 0);
        assert_eq!(engine.poll(1000), 1);
        assert_eq!(engine.poll(3500), 2);
        assert_eq!(engine.state().tick_count, 3);
    }

    #[test]
    fn test_poll_bounds_catch_up() {
        let mut engine = engine();
        engine.start();
        engine.poll(0);
        assert_eq!(engine.poll(1_000_000), MAX_CATCH_UP);
        // Backlog dropped; next tick one period later.
        assert_eq!(engine.poll(1_000_500), 0);
        assert_eq!(engine.poll(1_001_000), 1);
    }

    #[test]
    fn test_speed_change_rearms_timer() {
        let mut engine = engine();
        engine.start();
        engine.poll(0);
        engine.tick();
        engine.set_speed(2.0);

        assert!(engine.is_running());
        assert_eq!(engine.state().tick_count, 1);
        assert_eq!(engine.poll(1000), 0);
        assert_eq!(engine.poll(1500), 1);
    }

    #[test]
    fn test_manual_strategy_disables_adaptive() {
        let mut engine = engine();
        assert!(engine.state().adaptive_mode);
        engine.set_manual_strategy(StrategyKind::Buddy);

        let state = engine.state();
        assert!(!state.adaptive_mode);
        assert_eq!(state.selected_strategy, StrategyKind::Buddy);
    }

    #[test]
    fn test_boot_records() {
        let sink = Arc::new(CollectingSink::new());
        let _engine = SimulationEngine::new(SimConfig::minimal(), sink.clone());
        let boots = sink
            .records()
            .into_iter()
            .filter(|r| matches!(r, LogRecord::Boot { .. }))
            .count();
        assert_eq!(boots, StrategyKind::ALL.len());
    }

    #[test]
    fn test_benchmark_refusals() {
        let sink = Arc::new(CollectingSink::new());
        let mut engine = SimulationEngine::new(SimConfig::minimal().with_seed(1), sink.clone());

        assert_eq!(engine.start_benchmark(WorkloadPattern::Lifo, 0), Err(SimError::EmptyWorkload));
        engine.start_benchmark(WorkloadPattern::Lifo, 10).unwrap();
        assert_eq!(
            engine.start_benchmark(WorkloadPattern::Lifo, 10),
            Err(SimError::BenchmarkInProgress)
        );
        assert_eq!(sink.with_code("EA101").len(), 2);
    }

    #[test]
    fn test_benchmark_walks_every_phase() {
        let mut engine = engine();
        engine.start_benchmark(WorkloadPattern::UniformSmall, 5).unwrap();

        let mut seen = Vec::new();
        loop {
            let state = engine.state();
            if let Some(kind) = state.benchmark_strategy {
                if seen.last() != Some(&kind) {
                    seen.push(kind);
                }
            }
            if !engine.tick() {
                break;
            }
        }

        assert_eq!(seen, StrategyKind::ALL.to_vec());
        let state = engine.state();
        assert_eq!(state.benchmark_phase, BenchmarkPhase::Done);
        assert_eq!(state.benchmark_progress, 100.0);
        assert!(!state.benchmark_running);
        assert!(!state.running);
        // Five operations per strategy, five for the adaptive pass.
        assert_eq!(state.tick_count, 5 * (StrategyKind::ALL.len() as u64 + 1));
    }
}
