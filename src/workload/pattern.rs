//! Named workload patterns and their size/lifetime distributions.

use std::fmt;
use std::ops::RangeInclusive;

use crate::api::block::SimTime;

/// Shape of a synthetic workload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum WorkloadPattern {
    /// Small (16-64 B), short-lived requests.
    UniformSmall,
    /// Large (1-4 KB), long-lived requests.
    UniformLarge,
    /// Mostly small with a tail of medium and large requests.
    Mixed,
    /// Each request expires no later than every pending request issued
    /// before it, so frees arrive in reverse order.
    Lifo,
    /// Sizes drawn from a fixed set of powers of two.
    PowerOfTwo,
    /// Requests that never expire.
    LongLived,
}

/// Sizes used by [`WorkloadPattern::PowerOfTwo`].
pub const POWER_OF_TWO_SIZES: [usize; 7] = [16, 32, 64, 128, 256, 512, 1024];

/// Lifetime of a LIFO request issued while nothing earlier is pending.
pub(crate) const LIFO_START_MS: SimTime = 8_000;

/// Gap between the expiry of a LIFO request and the one issued before it.
pub(crate) const LIFO_STEP_MS: SimTime = 200;

impl WorkloadPattern {
    /// All patterns in table order.
    pub const ALL: [WorkloadPattern; 6] = [
        WorkloadPattern::UniformSmall,
        WorkloadPattern::UniformLarge,
        WorkloadPattern::Mixed,
        WorkloadPattern::Lifo,
        WorkloadPattern::PowerOfTwo,
        WorkloadPattern::LongLived,
    ];

    /// Short machine name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::UniformSmall => "uniform-small",
            Self::UniformLarge => "uniform-large",
            Self::Mixed => "mixed",
            Self::Lifo => "lifo",
            Self::PowerOfTwo => "power-of-two",
            Self::LongLived => "long-lived",
        }
    }

    /// Look a pattern up by its short name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.name() == name)
    }

    /// Position in [`ALL`](Self::ALL).
    pub fn index(&self) -> usize {
        *self as usize
    }

    /// Size range for the uniform patterns.
    pub(crate) fn size_range(&self) -> RangeInclusive<usize> {
        match self {
            Self::UniformSmall => 16..=64,
            Self::UniformLarge => 1024..=4096,
            Self::Mixed => 16..=256,
            Self::Lifo => 32..=512,
            Self::PowerOfTwo => 16..=1024,
            Self::LongLived => 32..=256,
        }
    }

    /// Lifetime range in simulated milliseconds, `None` if requests never expire.
    pub(crate) fn lifetime_range(&self) -> Option<RangeInclusive<SimTime>> {
        match self {
            Self::UniformSmall => Some(500..=2_000),
            Self::UniformLarge => Some(5_000..=15_000),
            Self::Mixed => Some(1_000..=6_000),
            Self::Lifo => Some(1..=LIFO_START_MS),
            Self::PowerOfTwo => Some(1_000..=6_000),
            Self::LongLived => None,
        }
    }
}

impl fmt::Display for WorkloadPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
