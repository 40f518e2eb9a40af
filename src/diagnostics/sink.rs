//! Log sinks: where the engine's records go.
//!
//! Recording is fire-and-forget. A sink has no way to report failure back
//! to the engine, so a slow, full or broken sink can only lose records.

use std::sync::atomic::{AtomicU64, Ordering};

use crossbeam_queue::ArrayQueue;

use crate::sync::mutex::Mutex;

use super::record::LogRecord;

/// Receiver of structured records.
pub trait LogSink: Send + Sync {
    /// Handle a record.
    fn record(&self, record: &LogRecord);
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl LogSink for NullSink {
    fn record(&self, _record: &LogRecord) {}
}

/// A simple sink that collects records.
#[derive(Debug, Default)]
pub struct CollectingSink {
    records: Mutex<Vec<LogRecord>>,
}

impl CollectingSink {
    /// Create a new collecting sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get all collected records.
    pub fn records(&self) -> Vec<LogRecord> {
        self.records.lock().clone()
    }

    /// Number of collected records.
    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    /// Whether nothing has been collected.
    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }

    /// Records carrying the given diagnostic code.
    pub fn with_code(&self, code: &str) -> Vec<LogRecord> {
        self.records
            .lock()
            .iter()
            .filter(|r| r.code() == Some(code))
            .cloned()
            .collect()
    }

    /// Clear collected records.
    pub fn clear(&self) {
        self.records.lock().clear();
    }
}

impl LogSink for CollectingSink {
    fn record(&self, record: &LogRecord) {
        self.records.lock().push(record.clone());
    }
}

/// Bounded lock-free queue between the engine and a slower consumer.
///
/// When the queue is full the record is dropped and counted.
#[derive(Debug)]
pub struct QueueSink {
    queue: ArrayQueue<LogRecord>,
    dropped: AtomicU64,
}

impl QueueSink {
    /// Create a queue holding up to `capacity` records (at least one).
    pub fn new(capacity: usize) -> Self {
        Self {
            queue: ArrayQueue::new(capacity.max(1)),
            dropped: AtomicU64::new(0),
        }
    }

    /// Pop the oldest pending record.
    pub fn pop(&self) -> Option<LogRecord> {
        self.queue.pop()
    }

    /// Pop every pending record.
    pub fn drain(&self) -> Vec<LogRecord> {
        std::iter::from_fn(|| self.queue.pop()).collect()
    }

    /// Approximate number of pending records.
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Whether nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Records lost to a full queue.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl LogSink for QueueSink {
    fn record(&self, record: &LogRecord) {
        if self.queue.push(record.clone()).is_err() {
            self.dropped.fetch_add(1, Ordering::Relaxed);
        }
    }
}

/// Forwards records to the `log` facade at the matching level.
#[cfg(feature = "log")]
#[derive(Debug, Default, Clone, Copy)]
pub struct LogCrateSink;

#[cfg(feature = "log")]
impl LogSink for LogCrateSink {
    fn record(&self, record: &LogRecord) {
        use super::record::LogLevel;

        match record.level() {
            LogLevel::Debug => log::debug!(target: "edgealloc", "{}", record),
            LogLevel::Info => log::info!(target: "edgealloc", "{}", record),
            LogLevel::Warning => log::warn!(target: "edgealloc", "{}", record),
            LogLevel::Error => log::error!(target: "edgealloc", "{}", record),
        }

        if let LogRecord::Diagnostic { diagnostic, .. } = record {
            if let Some(note) = diagnostic.note {
                log::info!(target: "edgealloc", "  note: {}", note);
            }
            if let Some(help) = diagnostic.help {
                log::info!(target: "edgealloc", "  help: {}", help);
            }
        }
    }
}

/// Sends every record to each inner sink in turn.
#[derive(Default)]
pub struct FanoutSink {
    sinks: Vec<std::sync::Arc<dyn LogSink>>,
}

impl FanoutSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder pattern: add a sink.
    pub fn with(mut self, sink: std::sync::Arc<dyn LogSink>) -> Self {
        self.sinks.push(sink);
        self
    }
}

impl LogSink for FanoutSink {
    fn record(&self, record: &LogRecord) {
        for sink in &self.sinks {
            sink.record(record);
        }
    }
}
