//! Error taxonomy for allocation and simulation operations.

use thiserror::Error;

/// Why a strategy refused an allocation or deallocation.
///
/// None of these are fatal: the simulation records the failure in the
/// strategy's metrics and keeps ticking.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AllocError {
    /// The arena cannot hold the request.
    #[error("out of space: requested {requested} B, {remaining} B remaining")]
    OutOfSpace { requested: usize, remaining: usize },

    /// The request breaks a structural rule of the strategy.
    #[error("unsatisfiable: {reason}")]
    Unsatisfiable { reason: String },

    /// The id was never allocated or was already freed.
    #[error("unknown block `{id}`")]
    UnknownBlock { id: String },
}

impl AllocError {
    pub(crate) fn unsatisfiable(reason: impl Into<String>) -> Self {
        Self::Unsatisfiable {
            reason: reason.into(),
        }
    }

    pub(crate) fn unknown(id: &str) -> Self {
        Self::UnknownBlock { id: id.to_string() }
    }
}

/// Misuse of the simulation engine's control surface.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SimError {
    /// A benchmark is already in progress.
    #[error("a benchmark is already running")]
    BenchmarkInProgress,

    /// A benchmark was requested with zero operations.
    #[error("benchmark needs at least one operation")]
    EmptyWorkload,
}
