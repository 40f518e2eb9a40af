//! Structured log records emitted by the engine.

use std::fmt;

use crate::allocators::StrategyKind;
use crate::api::block::SimTime;
use crate::api::stats::AllocatorMetrics;

use super::kind::{Diagnostic, DiagnosticKind};

/// Severity of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Debug => write!(f, "debug"),
            Self::Info => write!(f, "info"),
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// One structured record. Every variant renders as a single line.
#[derive(Debug, Clone)]
pub enum LogRecord {
    /// A strategy came up.
    Boot {
        at: SimTime,
        strategy: StrategyKind,
        capacity: usize,
    },

    /// A strategy served a request.
    Allocation {
        at: SimTime,
        strategy: StrategyKind,
        id: String,
        size: usize,
        address: usize,
        block_size: usize,
    },

    /// A strategy freed a block.
    Deallocation {
        at: SimTime,
        strategy: StrategyKind,
        id: String,
    },

    /// The adaptive selector switched strategy.
    Recommendation {
        at: SimTime,
        from: StrategyKind,
        to: StrategyKind,
        score: f64,
        reasoning: Vec<String>,
    },

    /// Metrics of one strategy, or of the adaptive run when `strategy` is `None`.
    MetricsSnapshot {
        at: SimTime,
        strategy: Option<StrategyKind>,
        metrics: AllocatorMetrics,
    },

    /// Anything else worth a line (phase changes, control actions).
    Event { at: SimTime, message: String },

    /// A predefined diagnostic with runtime context.
    Diagnostic {
        at: SimTime,
        strategy: Option<StrategyKind>,
        diagnostic: Diagnostic,
        context: String,
    },
}

impl LogRecord {
    /// Severity used by sinks that filter or forward by level.
    pub fn level(&self) -> LogLevel {
        match self {
            Self::Allocation { .. } | Self::Deallocation { .. } => LogLevel::Debug,
            Self::Boot { .. } | Self::Recommendation { .. } | Self::MetricsSnapshot { .. } | Self::Event { .. } => {
                LogLevel::Info
            }
            Self::Diagnostic { diagnostic, .. } => match diagnostic.kind {
                DiagnosticKind::Warning => LogLevel::Warning,
                DiagnosticKind::Error => LogLevel::Error,
            },
        }
    }

    /// Simulated time of the record.
    pub fn at(&self) -> SimTime {
        match self {
            Self::Boot { at, .. }
            | Self::Allocation { at, .. }
            | Self::Deallocation { at, .. }
            | Self::Recommendation { at, .. }
            | Self::MetricsSnapshot { at, .. }
            | Self::Event { at, .. }
            | Self::Diagnostic { at, .. } => *at,
        }
    }

    /// Diagnostic code, if this record carries one.
    pub fn code(&self) -> Option<&'static str> {
        match self {
            Self::Diagnostic { diagnostic, .. } => Some(diagnostic.code),
            _ => None,
        }
    }

    pub(crate) fn event(at: SimTime, message: impl Into<String>) -> Self {
        Self::Event {
            at,
            message: message.into(),
        }
    }
}

impl fmt::Display for LogRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:>8} ms] ", self.at())?;
        match self {
            Self::Boot { strategy, capacity, .. } => {
                write!(f, "boot {} ({}) over {} B", strategy, strategy.label(), capacity)
            }
            Self::Allocation {
                strategy,
                id,
                size,
                address,
                block_size,
                ..
            } => write!(
                f,
                "{} alloc {} {} B -> {:#06x} ({} B block)",
                strategy, id, size, address, block_size
            ),
            Self::Deallocation { strategy, id, .. } => write!(f, "{} free {}", strategy, id),
            Self::Recommendation { from, to, score, reasoning, .. } => {
                write!(f, "switch {} -> {} (score {:.3})", from, to, score)?;
                if let Some(last) = reasoning.last() {
                    write!(f, ": {}", last)?;
                }
                Ok(())
            }
            Self::MetricsSnapshot { strategy, metrics, .. } => {
                let name = strategy.map_or("adaptive", |s| s.name());
                write!(
                    f,
                    "{} metrics: {} B used, peak {} B, frag {:.1}%, success {:.1}%",
                    name, metrics.current_usage, metrics.peak_usage, metrics.fragmentation, metrics.success_rate
                )
            }
            Self::Event { message, .. } => f.write_str(message),
            Self::Diagnostic {
                strategy,
                diagnostic,
                context,
                ..
            } => {
                write!(f, "{}", diagnostic)?;
                if let Some(strategy) = strategy {
                    write!(f, " [{}]", strategy)?;
                }
                if !context.is_empty() {
                    write!(f, ": {}", context)?;
                }
                Ok(())
            }
        }
    }
}
