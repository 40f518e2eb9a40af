//! # edgealloc
//!
//! Allocation-strategy simulator for small, constrained heaps.
//!
//! ## Features
//!
//! - Seven strategies over a simulated arena (bump, stack, pool, first-fit,
//!   buddy, size-classed, best-fit)
//! - Metrics recomputed from live block sets (usage, waste, fragmentation)
//! - Seeded, replayable workloads
//! - Adaptive selector scoring strategies by workload and live metrics
//! - Time-stepped engine with live and benchmark modes
//! - Structured log records with predefined diagnostic codes
//!
//! No real memory is managed: addresses are offsets into `[0, capacity)`.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use edgealloc::{CollectingSink, SimConfig, SimulationEngine, WorkloadPattern};
//!
//! let sink = Arc::new(CollectingSink::new());
//! let mut engine = SimulationEngine::new(SimConfig::default().with_seed(1), sink.clone());
//!
//! engine.set_workload_pattern(WorkloadPattern::PowerOfTwo);
//! engine.start();
//! for _ in 0..100 {
//!     engine.tick();
//! }
//!
//! for score in engine.scores() {
//!     println!("{}", score);
//! }
//! ```
//!
//! ## Driving one strategy directly
//!
//! ```rust
//! use edgealloc::{AllocationRequest, AllocatorStrategy, BuddyAllocator};
//!
//! let mut buddy = BuddyAllocator::new(1024, 16);
//! let block = buddy.allocate(&AllocationRequest::new("a", 100, 0, None)).unwrap();
//! assert_eq!((block.address, block.size), (0, 128));
//! assert!(buddy.deallocate("a"));
//! ```

pub mod allocators;
pub mod api;
pub mod diagnostics;
pub mod selector;
pub mod sim;
pub mod workload;

mod sync;
mod util;

// Re-export public API at crate root for convenience
pub use api::block::{AllocationBlock, AllocationRequest, SimTime};
pub use api::config::SimConfig;
pub use api::error::{AllocError, SimError};
pub use api::stats::AllocatorMetrics;

// Strategies
pub use allocators::{AllocatorStrategy, StrategyKind};
pub use allocators::{
    BestFitAllocator, BuddyAllocator, FreeListAllocator, GeneralPurposeAllocator, LinearAllocator, PoolAllocator,
    StackAllocator,
};

// Workloads and selection
pub use selector::{AllocatorScore, SmartSelector};
pub use workload::{WorkloadGenerator, WorkloadPattern};

// Simulation
pub use sim::{BenchmarkEntry, BenchmarkPhase, BenchmarkResults, RunState, SimulationEngine, SimulationState};
pub use sim::{Clock, Driver, ManualClock, SharedEngine, SystemClock};

// Diagnostics
pub use diagnostics::{CollectingSink, FanoutSink, LogLevel, LogRecord, LogSink, NullSink, QueueSink};
pub use diagnostics::{Diagnostic, DiagnosticKind, EA001, EA002, EA003, EA101};

#[cfg(feature = "log")]
pub use diagnostics::LogCrateSink;

// Size helpers
pub use util::size::{format_bytes, kb};
