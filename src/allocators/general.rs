//! General-purpose ("C-style") strategy.
//!
//! Every allocation carries a fixed header. Sizes that fit a size class are
//! rounded up to it and recycled through that class's free list; the rest
//! go through a first-fit, coalescing free list.

use std::collections::BTreeMap;

use crate::api::block::{AllocationBlock, AllocationRequest};
use crate::api::error::AllocError;
use crate::api::stats::AllocatorMetrics;

use super::ledger::{Ledger, Placement};
use super::regions::FreeRegions;
use super::{AllocatorStrategy, StrategyKind};

/// Size-classed allocator with a general free list behind it.
#[derive(Debug)]
pub struct GeneralPurposeAllocator {
    ledger: Ledger,

    /// Bytes added to every request
    header: usize,

    /// Recycled blocks per class size; the latest freed is reused first
    classes: BTreeMap<usize, Vec<usize>>,

    /// Everything not parked in a class list
    general: FreeRegions,
}

impl GeneralPurposeAllocator {
    /// Create the allocator. Classes larger than the arena are ignored.
    pub fn new(capacity: usize, header: usize, size_classes: &[usize]) -> Self {
        let classes = size_classes
            .iter()
            .copied()
            .filter(|&c| c > 0 && c <= capacity)
            .map(|c| (c, Vec::new()))
            .collect();

        Self {
            ledger: Ledger::new(capacity),
            header,
            classes,
            general: FreeRegions::spanning(capacity),
        }
    }

    /// Header bytes added to each allocation.
    pub fn header(&self) -> usize {
        self.header
    }

    /// Blocks parked in the list of class `size`.
    pub fn class_free_count(&self, size: usize) -> usize {
        self.classes.get(&size).map_or(0, Vec::len)
    }

    /// Regions of the general free list as `(address, size)`.
    pub fn general_regions(&self) -> Vec<(usize, usize)> {
        self.general.iter().map(|r| (r.address, r.size)).collect()
    }

    /// Header-inclusive size rounded to its class, if it has one.
    ///
    /// Saturates for absurd sizes, which the capacity pre-check then refuses.
    fn footprint(&self, size: usize) -> (usize, bool) {
        let needed = size.saturating_add(self.header);
        match self.classes.range(needed..).next() {
            Some((&class, _)) => (class, true),
            None => (needed, false),
        }
    }

    fn free_iter(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        let parked = self
            .classes
            .iter()
            .flat_map(|(&size, addrs)| addrs.iter().map(move |&addr| (addr, size)));
        self.general.iter().map(|r| (r.address, r.size)).chain(parked)
    }
}

impl AllocatorStrategy for GeneralPurposeAllocator {
    fn kind(&self) -> StrategyKind {
        StrategyKind::GeneralPurpose
    }

    fn capacity(&self) -> usize {
        self.ledger.capacity()
    }

    fn allocate(&mut self, request: &AllocationRequest) -> Result<AllocationBlock, AllocError> {
        let (total, classed) = self.footprint(request.size);
        let classes = &mut self.classes;
        let general = &mut self.general;

        self.ledger.allocate(request, |size| {
            let recycled = if classed {
                classes.get_mut(&total).and_then(Vec::pop)
            } else {
                None
            };

            let address = match recycled {
                Some(address) => address,
                None => {
                    let index = general.first_fit(total).ok_or(AllocError::OutOfSpace {
                        requested: size,
                        remaining: general.total(),
                    })?;
                    general.carve(index, total)
                }
            };

            Ok(Placement {
                address,
                size: total,
                waste: total - size,
            })
        })
    }

    fn release(&mut self, id: &str) -> Result<(), AllocError> {
        let classes = &mut self.classes;
        let general = &mut self.general;

        self.ledger.deallocate(id, |block| {
            match classes.get_mut(&block.size) {
                Some(list) => list.push(block.address),
                None => general.release(block.address, block.size),
            }
            Ok(())
        })
    }

    fn is_live(&self, id: &str) -> bool {
        self.ledger.contains(id)
    }

    fn metrics(&self) -> AllocatorMetrics {
        self.ledger.metrics(self.free_iter().map(|(_, size)| size))
    }

    fn blocks(&self) -> Vec<AllocationBlock> {
        self.ledger.blocks(self.free_iter())
    }

    fn reset(&mut self) {
        self.ledger.reset();
        for list in self.classes.values_mut() {
            list.clear();
        }
        self.general = FreeRegions::spanning(self.ledger.capacity());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn req(id: &str, size: usize) -> AllocationRequest {
        AllocationRequest::new(id, size, 0, None)
    }

    fn allocator() -> GeneralPurposeAllocator {
        GeneralPurposeAllocator::new(1024, 8, &[16, 32, 64, 128])
    }

    #[test]
    fn test_header_and_class_rounding() {
        let mut gp = allocator();
        // 20 + 8 = 28 -> class 32
        let block = gp.allocate(&req("a", 20)).unwrap();
        assert_eq!((block.address, block.size), (0, 32));
        assert_eq!(gp.metrics().wasted_space, 12);
    }

    #[test]
    fn test_class_blocks_are_recycled() {
        let mut gp = allocator();
        gp.allocate(&req("a", 20)).unwrap();
        gp.allocate(&req("b", 20)).unwrap();
        assert!(gp.deallocate("a"));
        assert_eq!(gp.class_free_count(32), 1);

        // Same class: reuses the parked block instead of carving.
        let c = gp.allocate(&req("c", 24)).unwrap();
        assert_eq!(c.address, 0);
        assert_eq!(gp.class_free_count(32), 0);
        assert_eq!(gp.general_regions(), vec![(64, 960)]);
    }

    #[test]
    fn test_unclassed_sizes_coalesce() {
        let mut gp = allocator();
        // 300 + 8 has no class
        let block = gp.allocate(&req("big", 300)).unwrap();
        assert_eq!(block.size, 308);
        assert!(gp.deallocate("big"));
        assert_eq!(gp.general_regions(), vec![(0, 1024)]);
    }
}
