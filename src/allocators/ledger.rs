//! Shared bookkeeping for every strategy.
//!
//! Strategies own their free-space structures; the ledger owns the live
//! block table and the counters, and turns both into metrics on demand.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::api::block::{AllocationBlock, AllocationRequest, SimTime};
use crate::api::error::AllocError;
use crate::api::stats::{fragmentation_percent, success_rate_percent, AllocatorMetrics};

/// Where a strategy put a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Placement {
    pub address: usize,
    /// Bytes consumed, including padding.
    pub size: usize,
    /// Padding inside `size` that the request did not ask for.
    pub waste: usize,
}

/// A live allocation as tracked by the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct LiveBlock {
    pub address: usize,
    pub size: usize,
    pub waste: usize,
    pub created_at: SimTime,
}

/// Live block table plus rolling counters.
#[derive(Debug)]
pub(crate) struct Ledger {
    capacity: usize,
    live: HashMap<String, LiveBlock>,
    allocations: u64,
    deallocations: u64,
    failed_allocations: u64,
    failed_deallocations: u64,
    peak_usage: usize,
    avg_alloc_us: f64,
    avg_dealloc_us: f64,
}

impl Ledger {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            live: HashMap::new(),
            allocations: 0,
            deallocations: 0,
            failed_allocations: 0,
            failed_deallocations: 0,
            peak_usage: 0,
            avg_alloc_us: 0.0,
            avg_dealloc_us: 0.0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Sum of live block sizes.
    pub fn usage(&self) -> usize {
        self.live.values().map(|b| b.size).sum()
    }

    /// Sum of live block padding.
    pub fn waste(&self) -> usize {
        self.live.values().map(|b| b.waste).sum()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.live.contains_key(id)
    }

    /// Run `place` under the shared allocation contract.
    ///
    /// The capacity pre-check happens before `place` sees the request, and
    /// `place` must leave the strategy untouched when it returns an error.
    pub fn allocate<F>(&mut self, request: &AllocationRequest, place: F) -> Result<AllocationBlock, AllocError>
    where
        F: FnOnce(usize) -> Result<Placement, AllocError>,
    {
        let start = Instant::now();

        let result = self.precheck(request).and_then(|()| place(request.size));
        let placement = match result {
            Ok(placement) => placement,
            Err(err) => {
                self.failed_allocations += 1;
                return Err(err);
            }
        };

        debug_assert!(placement.address + placement.size <= self.capacity);
        self.live.insert(
            request.id.clone(),
            LiveBlock {
                address: placement.address,
                size: placement.size,
                waste: placement.waste,
                created_at: request.created_at,
            },
        );

        self.allocations += 1;
        self.peak_usage = self.peak_usage.max(self.usage());
        self.avg_alloc_us = rolling_average(self.avg_alloc_us, self.allocations, start.elapsed());

        Ok(AllocationBlock {
            id: request.id.clone(),
            address: placement.address,
            size: placement.size,
            allocated: true,
            created_at: request.created_at,
        })
    }

    /// Run `release` for the live block `id`, then drop it from the table.
    pub fn deallocate<F>(&mut self, id: &str, release: F) -> Result<(), AllocError>
    where
        F: FnOnce(&LiveBlock) -> Result<(), AllocError>,
    {
        let start = Instant::now();

        let result = match self.live.get(id) {
            Some(block) => release(block),
            None => Err(AllocError::unknown(id)),
        };
        if let Err(err) = result {
            self.failed_deallocations += 1;
            return Err(err);
        }

        self.live.remove(id);
        self.deallocations += 1;
        self.avg_dealloc_us = rolling_average(self.avg_dealloc_us, self.deallocations, start.elapsed());
        Ok(())
    }

    /// Record a deallocation refused before any lookup.
    pub fn record_failed_deallocation(&mut self) {
        self.failed_deallocations += 1;
    }

    /// Drop every block and counter.
    pub fn reset(&mut self) {
        *self = Self::new(self.capacity);
    }

    /// Live blocks merged with the given free regions, in address order.
    pub fn blocks<I>(&self, free: I) -> Vec<AllocationBlock>
    where
        I: IntoIterator<Item = (usize, usize)>,
    {
        let mut blocks: Vec<AllocationBlock> = self
            .live
            .iter()
            .map(|(id, b)| AllocationBlock {
                id: id.clone(),
                address: b.address,
                size: b.size,
                allocated: true,
                created_at: b.created_at,
            })
            .chain(free.into_iter().map(|(address, size)| AllocationBlock::free(address, size)))
            .collect();
        blocks.sort_by_key(|b| (b.address, !b.allocated));
        blocks
    }

    /// Build metrics from the live table and the strategy's free regions.
    pub fn metrics<I>(&self, free: I) -> AllocatorMetrics
    where
        I: IntoIterator<Item = usize>,
    {
        let (free_space, largest_free_block, free_blocks) = free
            .into_iter()
            .fold((0, 0, 0), |(total, largest, count), size| {
                (total + size, largest.max(size), count + 1)
            });

        AllocatorMetrics {
            capacity: self.capacity,
            total_allocations: self.allocations,
            total_deallocations: self.deallocations,
            failed_allocations: self.failed_allocations,
            failed_deallocations: self.failed_deallocations,
            current_usage: self.usage(),
            peak_usage: self.peak_usage,
            free_space,
            largest_free_block,
            fragmentation: fragmentation_percent(free_space, largest_free_block),
            wasted_space: self.waste(),
            success_rate: success_rate_percent(self.allocations, self.failed_allocations),
            avg_alloc_time_us: self.avg_alloc_us,
            avg_dealloc_time_us: self.avg_dealloc_us,
            live_blocks: self.live.len(),
            free_blocks,
        }
    }

    fn precheck(&self, request: &AllocationRequest) -> Result<(), AllocError> {
        if self.live.contains_key(&request.id) {
            return Err(AllocError::unsatisfiable(format!("id `{}` is already live", request.id)));
        }
        let usage = self.usage();
        if request.size > self.capacity.saturating_sub(usage) {
            return Err(AllocError::OutOfSpace {
                requested: request.size,
                remaining: self.capacity.saturating_sub(usage),
            });
        }
        Ok(())
    }
}

/// `avg' = (avg * (n - 1) + elapsed) / n`
fn rolling_average(avg: f64, n: u64, elapsed: Duration) -> f64 {
    let sample = elapsed.as_secs_f64() * 1_000_000.0;
    (avg * (n - 1) as f64 + sample) / n as f64
}
