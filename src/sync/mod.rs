//! Synchronization primitives.
//!
//! Provides a thin wrapper over std or parking_lot mutexes.

pub(crate) mod mutex;
