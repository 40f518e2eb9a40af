//! Linear (bump) strategy.
//!
//! Allocation just bumps an offset. Individual frees are refused; only
//! `reset()` reclaims the arena.

use crate::api::block::{AllocationBlock, AllocationRequest};
use crate::api::error::AllocError;
use crate::api::stats::AllocatorMetrics;
use crate::util::size::align_up;

use super::ledger::{Ledger, Placement};
use super::{AllocatorStrategy, StrategyKind};

/// A bump allocator over a simulated arena.
#[derive(Debug)]
pub struct LinearAllocator {
    ledger: Ledger,

    /// Current allocation head (offset from base)
    head: usize,

    /// Alignment of every block start
    align: usize,
}

impl LinearAllocator {
    /// Create a linear arena of `capacity` bytes.
    pub fn new(capacity: usize, align: usize) -> Self {
        Self {
            ledger: Ledger::new(capacity),
            head: 0,
            align: align.max(1).next_power_of_two(),
        }
    }

    /// Current head position.
    pub fn head(&self) -> usize {
        self.head
    }

    /// Bytes left past the head.
    pub fn remaining(&self) -> usize {
        self.ledger.capacity() - self.head
    }

    fn tail(&self) -> Option<(usize, usize)> {
        (self.remaining() > 0).then(|| (self.head, self.remaining()))
    }
}

impl AllocatorStrategy for LinearAllocator {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Linear
    }

    fn capacity(&self) -> usize {
        self.ledger.capacity()
    }

    fn allocate(&mut self, request: &AllocationRequest) -> Result<AllocationBlock, AllocError> {
        let head = &mut self.head;
        let align = self.align;
        let capacity = self.ledger.capacity();

        self.ledger.allocate(request, |size| {
            let aligned = align_up(*head, align);
            if aligned + size > capacity {
                return Err(AllocError::OutOfSpace {
                    requested: size,
                    remaining: capacity.saturating_sub(*head),
                });
            }
            // Alignment padding is folded into the block.
            let placement = Placement {
                address: *head,
                size: aligned + size - *head,
                waste: aligned - *head,
            };
            *head = aligned + size;
            Ok(placement)
        })
    }

    fn release(&mut self, id: &str) -> Result<(), AllocError> {
        if !self.ledger.contains(id) {
            self.ledger.record_failed_deallocation();
            return Err(AllocError::unknown(id));
        }
        self.ledger.deallocate(id, |_| {
            Err(AllocError::unsatisfiable("linear arena frees only on reset"))
        })
    }

    fn is_live(&self, id: &str) -> bool {
        self.ledger.contains(id)
    }

    fn metrics(&self) -> AllocatorMetrics {
        self.ledger.metrics(self.tail().map(|(_, size)| size))
    }

    fn blocks(&self) -> Vec<AllocationBlock> {
        self.ledger.blocks(self.tail())
    }

    fn reset(&mut self) {
        self.ledger.reset();
        self.head = 0;
    }
}
