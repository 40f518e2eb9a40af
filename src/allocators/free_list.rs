//! First-fit free list strategy.

use crate::api::block::{AllocationBlock, AllocationRequest};
use crate::api::error::AllocError;
use crate::api::stats::AllocatorMetrics;

use super::ledger::{Ledger, Placement};
use super::regions::FreeRegions;
use super::{AllocatorStrategy, StrategyKind};

/// Takes the lowest-addressed free block that fits and splits off the rest.
/// Frees are inserted in address order and merged with adjacent free blocks.
#[derive(Debug)]
pub struct FreeListAllocator {
    ledger: Ledger,
    free: FreeRegions,
}

impl FreeListAllocator {
    /// Create a free list over `capacity` bytes.
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

impl AllocatorStrategy for FreeListAllocator {
    fn kind(&self) -> StrategyKind {
        StrategyKind::FreeList
    }

    fn capacity(&self) -> usize {
        self.ledger.capacity()
    }

    fn allocate(&mut self, request: &AllocationRequest) -> Result<AllocationBlock, AllocError> {
        let free = &mut self.free;
        self.ledger.allocate(request, |size| {
            let index = free.first_fit(size).ok_or(AllocError::OutOfSpace {
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

#[cfg(test)]
mod tests {
    use super::*;

    fn req(id: &str, size: usize) -> AllocationRequest {
        AllocationRequest::new(id, size, 0, None)
    }

    #[test]
    fn test_first_fit_takes_lowest_hole() {
        let mut list = FreeListAllocator::new(1000);
        list.allocate(&req("a", 300)).unwrap();
        list.allocate(&req("b", 100)).unwrap();
        list.allocate(&req("c", 50)).unwrap();
        list.allocate(&req("d", 100)).unwrap();
        assert!(list.deallocate("a"));
        assert!(list.deallocate("c"));

        // Holes: 300 @0, 50 @400, tail 450 @550. First fit picks @0.
        let e = list.allocate(&req("e", 40)).unwrap();
        assert_eq!(e.address, 0);
        assert_eq!(list.free_regions(), vec![(40, 260), (400, 50), (550, 450)]);
    }

    #[test]
    fn test_external_fragmentation_blocks_large_request() {
        let mut list = FreeListAllocator::new(300);
        list.allocate(&req("a", 100)).unwrap();
        list.allocate(&req("b", 100)).unwrap();
        list.allocate(&req("c", 100)).unwrap();
        list.deallocate("a");
        list.deallocate("c");

        // 200 B free but no 150 B hole.
        assert!(matches!(list.allocate(&req("d", 150)), Err(AllocError::OutOfSpace { .. })));
        let metrics = list.metrics();
        assert_eq!(metrics.free_space, 200);
        assert_eq!(metrics.fragmentation, 50.0);
    }
}
