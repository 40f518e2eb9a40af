//! Binary buddy strategy.
//!
//! Requests round up to a power of two. Larger blocks split into two equal
//! buddies until the target order is reached; on free, a block merges with
//! its buddy (`address ^ size`) for as long as the buddy is free.

use std::collections::BTreeSet;

use crate::api::block::{AllocationBlock, AllocationRequest};
use crate::api::error::AllocError;
use crate::api::stats::AllocatorMetrics;
use crate::util::size::{prev_power_of_two, round_to_power_of_two};

use super::ledger::{Ledger, Placement};
use super::{AllocatorStrategy, StrategyKind};

/// A buddy allocator over a power-of-two arena.
#[derive(Debug)]
pub struct BuddyAllocator {
    ledger: Ledger,

    /// Size of an order-0 block
    min_block: usize,

    /// Free block addresses per order; order `k` holds blocks of `min_block << k`
    free_lists: Vec<BTreeSet<usize>>,
}

impl BuddyAllocator {
    /// Create a buddy arena.
    ///
    /// `capacity` is truncated to a power of two; `min_block` is rounded up
    /// to one and capped at the arena size.
    pub fn new(capacity: usize, min_block: usize) -> Self {
        let managed = prev_power_of_two(capacity);
        let min_block = min_block.max(1).next_power_of_two().min(managed.max(1));
        let orders = if managed == 0 {
            0
        } else {
            (managed / min_block).trailing_zeros() as usize + 1
        };

        let mut buddy = Self {
            ledger: Ledger::new(managed),
            min_block,
            free_lists: vec![BTreeSet::new(); orders],
        };
        buddy.seed();
        buddy
    }

    /// Highest order (the whole arena).
    pub fn max_order(&self) -> usize {
        self.free_lists.len().saturating_sub(1)
    }

    /// Block size at `order`.
    pub fn block_size(&self, order: usize) -> usize {
        self.min_block << order
    }

    /// Free `(address, size)` pairs, in address order.
    pub fn free_blocks(&self) -> Vec<(usize, usize)> {
        let mut blocks: Vec<(usize, usize)> = self.free_iter().collect();
        blocks.sort_unstable();
        blocks
    }

    fn seed(&mut self) {
        if let Some(top) = self.free_lists.last_mut() {
            top.insert(0);
        }
    }

    fn free_iter(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.free_lists
            .iter()
            .enumerate()
            .flat_map(move |(order, set)| set.iter().map(move |&addr| (addr, self.block_size(order))))
    }
}

impl AllocatorStrategy for BuddyAllocator {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Buddy
    }

    fn capacity(&self) -> usize {
        self.ledger.capacity()
    }

    fn allocate(&mut self, request: &AllocationRequest) -> Result<AllocationBlock, AllocError> {
        let min_block = self.min_block;
        let free_lists = &mut self.free_lists;

        // The capacity pre-check rejects anything larger than the arena,
        // so `target` cannot overflow and always has an order.
        self.ledger.allocate(request, |size| {
            let target = round_to_power_of_two(size, min_block);
            let target_order = (target / min_block).trailing_zeros() as usize;
            let mut order = (target_order..free_lists.len())
                .find(|&o| !free_lists[o].is_empty())
                .ok_or(AllocError::OutOfSpace {
                    requested: size,
                    remaining: 0,
                })?;
            let address = free_lists[order].pop_first().ok_or(AllocError::OutOfSpace {
                requested: size,
                remaining: 0,
            })?;

            // Split down, keeping the upper buddy free at each level.
            while order > target_order {
                order -= 1;
                free_lists[order].insert(address + (min_block << order));
            }

            Ok(Placement {
                address,
                size: target,
                waste: target - size,
            })
        })
    }

    fn release(&mut self, id: &str) -> Result<(), AllocError> {
        let min_block = self.min_block;
        let free_lists = &mut self.free_lists;
        let max_order = free_lists.len().saturating_sub(1);

        self.ledger.deallocate(id, |block| {
            let mut address = block.address;
            let mut order = (block.size / min_block).trailing_zeros() as usize;

            while order < max_order {
                let buddy = address ^ (min_block << order);
                if !free_lists[order].remove(&buddy) {
                    break;
                }
                address = address.min(buddy);
                order += 1;
            }
            free_lists[order].insert(address);
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
        for set in &mut self.free_lists {
            set.clear();
        }
        self.seed();
    }
}
