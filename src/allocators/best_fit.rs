//! Best-fit strategy (historically labelled "RB-tree").
//!
//! The search is a linear scan over the free regions for the smallest one
//! that fits. A balanced tree keyed by size would give the same answers.

use crate::api::block::{AllocationBlock, AllocationRequest};
use crate::api::error::AllocError;
use crate::api::stats::AllocatorMetrics;

use super::ledger::{Ledger, Placement};
use super::regions::FreeRegions;
use super::{AllocatorStrategy, StrategyKind};

/// Takes the smallest free block that fits; frees coalesce like the free list.
#[derive(Debug)]
pub struct BestFitAllocator {
    ledger: Ledger,
    free: FreeRegions,
}

impl BestFitAllocator {
    /// Create a best-fit arena over `capacity` bytes.
    pub fn new(capacity: usize) -> Self {
        Self {
            ledger: Ledger::new(capacity),
            free: FreeRegions::spanning(capacity),
        }
    }

    /// Free regions as `(address, size)`, in address order.
    pub fn free_regions(&self) -> Vec<(usize, usize)> {
        self.free.iter().map(|r| (r.address, r.size)).collect()
    }
}

impl AllocatorStrategy for BestFitAllocator {
    fn kind(&self) -> StrategyKind {
        StrategyKind::BestFit
    }

    fn capacity(&self) -> usize {
        self.ledger.capacity()
    }

    fn allocate(&mut self, request: &AllocationRequest) -> Result<AllocationBlock, AllocError> {
        let free = &mut self.free;
        self.ledger.allocate(request, |size| {
            let index = free.best_fit(size).ok_or(AllocError::OutOfSpace {
                requested: size,
                remaining: free.total(),
            })?;
            Ok(Placement {
                address: free.carve(index, size),
                size,
                waste: 0,
            })
        })
    }

    fn release(&mut self, id: &str) -> Result<(), AllocError> {
        let free = &mut self.free;
        self.ledger.deallocate(id, |block| {
            free.release(block.address, block.size);
            Ok(())
        })
    }

    fn is_live(&self, id: &str) -> bool {
        self.ledger.contains(id)
    }

    fn metrics(&self) -> AllocatorMetrics {
        self.ledger.metrics(self.free.iter().map(|r| r.size))
    }

    fn blocks(&self) -> Vec<AllocationBlock> {
        self.ledger.blocks(self.free.iter().map(|r| (r.address, r.size)))
    }

    fn reset(&mut self) {
        self.ledger.reset();
        self.free = FreeRegions::spanning(self.ledger.capacity());
    }
}
