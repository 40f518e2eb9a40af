//! Structured logging for the simulation.
//!
//! The engine reports what it does as [`LogRecord`]s and hands them to an
//! injected [`LogSink`]. Failures (out of space, refused frees, benchmark
//! misuse) carry a predefined [`Diagnostic`] code:
//!
//! | Code  | Meaning                                |
//! |-------|----------------------------------------|
//! | EA001 | Arena out of space                     |
//! | EA002 | Request violates a strategy constraint |
//! | EA003 | Deallocation refused                   |
//! | EA101 | Benchmark could not start              |

pub mod kind;
pub mod record;
pub mod sink;

pub use kind::{Diagnostic, DiagnosticKind, EA001, EA002, EA003, EA101};
pub use record::{LogLevel, LogRecord};
pub use sink::{CollectingSink, FanoutSink, LogSink, NullSink, QueueSink};

#[cfg(feature = "log")]
pub use sink::LogCrateSink;
