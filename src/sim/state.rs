//! Read-only view of the engine's state.

use crate::allocators::StrategyKind;
use crate::api::block::SimTime;
use crate::workload::WorkloadPattern;

/// Run state of the tick loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// Fresh or reset; no timer armed.
    Idle,
    /// Timer armed; ticks advance the simulation.
    Running,
    /// Stopped after running; state is kept.
    Paused,
}

/// Phase of the benchmark sub-state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BenchmarkPhase {
    Idle,
    /// Replaying the workload against one strategy at a time.
    PerStrategy,
    /// Replaying the workload through the selector.
    Adaptive,
    Done,
}

/// Snapshot handed to display collaborators.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationState {
    pub run_state: RunState,
    pub running: bool,
    pub simulated_time: SimTime,
    pub tick_count: u64,
    pub workload_pattern: WorkloadPattern,
    pub selected_strategy: StrategyKind,
    pub adaptive_mode: bool,
    pub speed_multiplier: f64,
    pub benchmark_running: bool,
    pub benchmark_phase: BenchmarkPhase,
    pub benchmark_strategy: Option<StrategyKind>,
    /// 0-100.
    pub benchmark_progress: f64,
    /// Requests waiting for their lifetime to run out.
    pub active_requests: usize,
}
