//! Fixed-size pool strategy.
//!
//! The arena is carved into equal slots up front. Any request that fits a
//! slot takes a whole slot; the difference is internal waste.

use crate::api::block::{AllocationBlock, AllocationRequest};
use crate::api::error::AllocError;
use crate::api::stats::AllocatorMetrics;

use super::ledger::{Ledger, Placement};
use super::{AllocatorStrategy, StrategyKind};

/// A slot allocator over a simulated arena.
#[derive(Debug)]
pub struct PoolAllocator {
    ledger: Ledger,

    /// Size of every slot
    block_size: usize,

    /// Number of slots carved from the arena
    slot_count: usize,

    /// Free slot indices; the last pushed is handed out first
    free_slots: Vec<usize>,
}

impl PoolAllocator {
    /// Carve `capacity` into slots of `block_size` bytes.
    ///
    /// Any tail shorter than a slot is never used.
    pub fn new(capacity: usize, block_size: usize) -> Self {
        let block_size = block_size.max(1);
        let slot_count = capacity / block_size;
        Self {
            ledger: Ledger::new(capacity),
            block_size,
            slot_count,
            free_slots: Self::all_slots(slot_count),
        }
    }

    /// Slot size in bytes.
    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Number of free slots.
    pub fn free_slot_count(&self) -> usize {
        self.free_slots.len()
    }

    /// Total number of slots.
    pub fn slot_count(&self) -> usize {
        self.slot_count
    }

    // Reversed so slot 0 is popped first.
    fn all_slots(slot_count: usize) -> Vec<usize> {
        (0..slot_count).rev().collect()
    }
}

impl AllocatorStrategy for PoolAllocator {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Pool
    }

    fn capacity(&self) -> usize {
        self.ledger.capacity()
    }

    fn allocate(&mut self, request: &AllocationRequest) -> Result<AllocationBlock, AllocError> {
        let free_slots = &mut self.free_slots;
        let block_size = self.block_size;

        self.ledger.allocate(request, |size| {
            if size > block_size {
                return Err(AllocError::unsatisfiable(format!(
                    "{} B exceeds the {} B pool slot",
                    size, block_size
                )));
            }
            let slot = free_slots.pop().ok_or(AllocError::OutOfSpace {
                requested: size,
                remaining: 0,
            })?;
            Ok(Placement {
                address: slot * block_size,
                size: block_size,
                waste: block_size - size,
            })
        })
    }

    fn release(&mut self, id: &str) -> Result<(), AllocError> {
        let free_slots = &mut self.free_slots;
        let block_size = self.block_size;

        self.ledger.deallocate(id, |block| {
            free_slots.push(block.address / block_size);
            Ok(())
        })
    }

    fn is_live(&self, id: &str) -> bool {
        self.ledger.contains(id)
    }

    fn metrics(&self) -> AllocatorMetrics {
        self.ledger.metrics(self.free_slots.iter().map(|_| self.block_size))
    }

    fn blocks(&self) -> Vec<AllocationBlock> {
        self.ledger
            .blocks(self.free_slots.iter().map(|&slot| (slot * self.block_size, self.block_size)))
    }

    fn reset(&mut self) {
        self.ledger.reset();
        self.free_slots = Self::all_slots(self.slot_count);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn req(id: &str, size: usize) -> AllocationRequest {
        AllocationRequest::new(id, size, 0, None)
    }

    #[test]
    fn test_oversized_request_is_unsatisfiable() {
        let mut pool = PoolAllocator::new(1024, 64);

        assert!(matches!(pool.allocate(&req("big", 100)), Err(AllocError::Unsatisfiable { .. })));
        assert_eq!(pool.free_slot_count(), 16);

        let block = pool.allocate(&req("ok", 50)).unwrap();
        assert_eq!((block.address, block.size), (0, 64));
        assert_eq!(pool.metrics().wasted_space, 14);
    }

    #[test]
    fn test_freed_slot_is_reused_first() {
        let mut pool = PoolAllocator::new(256, 64);
        pool.allocate(&req("a", 8)).unwrap();
        let b = pool.allocate(&req("b", 8)).unwrap();

        assert!(pool.deallocate("b"));
        let c = pool.allocate(&req("c", 8)).unwrap();
        assert_eq!(c.address, b.address);
    }

    #[test]
    fn test_runs_out_of_slots() {
        let mut pool = PoolAllocator::new(200, 64);
        assert_eq!(pool.slot_count(), 3);
        for id in ["a", "b", "c"] {
            pool.allocate(&req(id, 1)).unwrap();
        }
        assert!(matches!(pool.allocate(&req("d", 1)), Err(AllocError::OutOfSpace { .. })));
    }
}
