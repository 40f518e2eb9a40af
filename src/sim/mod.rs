//! Simulation orchestration.
//!
//! - [`SimulationEngine`] - owns the strategies and runs the tick loop
//! - [`Clock`], [`Driver`] - turn a time source into ticks
//! - [`SharedEngine`] - lock-serialized handle for multi-threaded hosts
//! - [`BenchmarkResults`] - per-strategy and adaptive outcomes of a benchmark

mod benchmark;
mod clock;
mod engine;
mod shared;
mod state;

pub use benchmark::{composite_score, BenchmarkEntry, BenchmarkResults};
pub use clock::{Clock, Driver, ManualClock, SystemClock};
pub use engine::{SimulationEngine, MAX_SPEED, MIN_SPEED};
pub use shared::SharedEngine;
pub use state::{BenchmarkPhase, RunState, SimulationState};
