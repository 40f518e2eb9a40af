//! Thread-safe handle to one engine.

use std::sync::Arc;

use crate::sync::mutex::{Mutex, MutexGuard};

use super::engine::SimulationEngine;
use super::state::SimulationState;

/// Cloneable handle that serializes every access to the engine.
///
/// A timer thread can pump ticks while a UI thread reads state; each call
/// holds the lock for exactly one operation.
#[derive(Debug, Clone)]
pub struct SharedEngine {
    inner: Arc<Mutex<SimulationEngine>>,
}

impl SharedEngine {
    pub fn new(engine: SimulationEngine) -> Self {
        Self {
            inner: Arc::new(Mutex::new(engine)),
        }
    }

    /// Lock the engine for a sequence of operations.
    pub fn lock(&self) -> MutexGuard<'_, SimulationEngine> {
        self.inner.lock()
    }

    /// Access the engine with a closure.
    pub fn with<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut SimulationEngine) -> R,
    {
        let mut engine = self.inner.lock();
        f(&mut engine)
    }

    /// Run every tick due at `now_ms`.
    pub fn poll(&self, now_ms: u64) -> u32 {
        self.inner.lock().poll(now_ms)
    }

    pub fn state(&self) -> SimulationState {
        self.inner.lock().state()
    }
}

impl From<SimulationEngine> for SharedEngine {
    fn from(engine: SimulationEngine) -> Self {
        Self::new(engine)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::config::SimConfig;
    use std::thread;

    #[test]
    fn test_ticks_from_another_thread() {
        let shared = SharedEngine::new(SimulationEngine::headless(SimConfig::minimal().with_seed(3)));
        shared.with(|engine| engine.start());

        let pump = shared.clone();
        let handle = thread::spawn(move || {
            pump.poll(0);
            (1..=10).map(|i| pump.poll(i * 1000)).sum::<u32>()
        });

        assert_eq!(handle.join().unwrap(), 10);
        let state = shared.state();
        assert_eq!(state.tick_count, 10);
        assert_eq!(state.simulated_time, 1000);
    }
}
