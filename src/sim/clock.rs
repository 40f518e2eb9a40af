//! Time sources and the driver that turns them into ticks.
//!
//! The engine never reads a clock itself: a host passes the current time
//! to [`SimulationEngine::poll`], which runs whatever ticks are due. Tests
//! use [`ManualClock`] to step time by hand.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use super::engine::SimulationEngine;

/// Monotonic millisecond time source.
pub trait Clock: Send + Sync {
    /// Milliseconds since an arbitrary fixed origin.
    fn now_ms(&self) -> u64;
}

/// Wall clock measured from construction.
#[derive(Debug, Clone)]
pub struct SystemClock {
    start: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self { start: Instant::now() }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }
}

/// Clock that only moves when told to.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicU64,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move time forward.
    pub fn advance(&self, duration: Duration) {
        self.now.fetch_add(duration.as_millis() as u64, Ordering::SeqCst);
    }

    /// Jump to an absolute time.
    pub fn set(&self, now_ms: u64) {
        self.now.store(now_ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }
}

/// Pumps an engine from a clock.
#[derive(Debug)]
pub struct Driver<C: Clock> {
    clock: C,
}

impl<C: Clock> Driver<C> {
    pub fn new(clock: C) -> Self {
        Self { clock }
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Run every tick that is due now. Returns the number run.
    pub fn pump(&self, engine: &mut SimulationEngine) -> u32 {
        engine.poll(self.clock.now_ms())
    }

    /// Pump for `duration` of clock time, sleeping one tick period between pumps.
    ///
    /// Returns early once the engine stops running (e.g. a benchmark completes).
    /// Meant for clocks that move on their own; a [`ManualClock`] never
    /// reaches the deadline.
    pub fn run_for(&self, engine: &mut SimulationEngine, duration: Duration) -> u64 {
        let deadline = self.clock.now_ms() + duration.as_millis() as u64;
        let mut ticks = 0u64;

        while self.clock.now_ms() < deadline && engine.is_running() {
            ticks += u64::from(self.pump(engine));
            let remaining = deadline.saturating_sub(self.clock.now_ms());
            std::thread::sleep(engine.tick_period().min(Duration::from_millis(remaining)));
        }
        ticks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock() {
        let clock = ManualClock::new();
        assert_eq!(clock.now_ms(), 0);
        clock.advance(Duration::from_millis(250));
        assert_eq!(clock.now_ms(), 250);
        clock.set(10);
        assert_eq!(clock.now_ms(), 10);
    }
}
