//! Synthetic workloads.

mod generator;
mod pattern;

pub use generator::WorkloadGenerator;
pub use pattern::{WorkloadPattern, POWER_OF_TWO_SIZES};
