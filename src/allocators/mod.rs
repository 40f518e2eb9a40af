//! Allocation strategies.
//!
//! Every strategy manages one bounded, simulated arena. No real memory is
//! touched: addresses are offsets into `[0, capacity)`.
//!
//! | Strategy        | Free rule                      | Fragmentation          |
//! |-----------------|--------------------------------|------------------------|
//! | Linear          | reset only                     | none until exhaustion  |
//! | Stack           | top of stack only              | none                   |
//! | Pool            | any slot                       | internal (slot - size) |
//! | FreeList        | any, coalescing                | external (first-fit)   |
//! | Buddy           | any, buddy merging             | internal (pow2)        |
//! | GeneralPurpose  | size class or coalescing       | hybrid                 |
//! | BestFit         | any, coalescing                | external (best-fit)    |

pub(crate) mod ledger;
pub(crate) mod regions;

mod best_fit;
mod buddy;
mod free_list;
mod general;
mod linear;
mod pool;
mod stack;

pub use best_fit::BestFitAllocator;
pub use buddy::BuddyAllocator;
pub use free_list::FreeListAllocator;
pub use general::GeneralPurposeAllocator;
pub use linear::LinearAllocator;
pub use pool::PoolAllocator;
pub use stack::StackAllocator;

use std::fmt;

use crate::api::block::{AllocationBlock, AllocationRequest};
use crate::api::config::SimConfig;
use crate::api::error::AllocError;
use crate::api::stats::AllocatorMetrics;

/// The capability set shared by every strategy.
pub trait AllocatorStrategy: Send {
    /// Which strategy this is.
    fn kind(&self) -> StrategyKind;

    /// Arena size in bytes.
    fn capacity(&self) -> usize;

    /// Place a request in the arena.
    ///
    /// On error the arena is left exactly as it was.
    fn allocate(&mut self, request: &AllocationRequest) -> Result<AllocationBlock, AllocError>;

    /// Free the block allocated for request `id`.
    fn release(&mut self, id: &str) -> Result<(), AllocError>;

    /// Boolean form of [`release`](Self::release).
    fn deallocate(&mut self, id: &str) -> bool {
        self.release(id).is_ok()
    }

    /// Whether `id` is currently live in this arena.
    fn is_live(&self, id: &str) -> bool;

    /// Whether `id` is live but blocked behind later allocations, so a
    /// refused free can succeed once those are gone.
    fn release_blocked(&self, _id: &str) -> bool {
        false
    }

    /// Metrics recomputed from the current block sets.
    fn metrics(&self) -> AllocatorMetrics;

    /// Every allocated and free block, in address order.
    fn blocks(&self) -> Vec<AllocationBlock>;

    /// Drop all blocks and counters and return to the initial arena.
    fn reset(&mut self);
}

/// Tag for each strategy, in table order.
///
/// The declaration order is significant: it is the tie-break order of the
/// selector and the order in which benchmarks visit strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StrategyKind {
    Linear,
    Stack,
    Pool,
    FreeList,
    Buddy,
    GeneralPurpose,
    BestFit,
}

impl StrategyKind {
    /// All strategies in table order.
    pub const ALL: [StrategyKind; 7] = [
        StrategyKind::Linear,
        StrategyKind::Stack,
        StrategyKind::Pool,
        StrategyKind::FreeList,
        StrategyKind::Buddy,
        StrategyKind::GeneralPurpose,
        StrategyKind::BestFit,
    ];

    /// Short machine name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Linear => "linear",
            Self::Stack => "stack",
            Self::Pool => "pool",
            Self::FreeList => "free-list",
            Self::Buddy => "buddy",
            Self::GeneralPurpose => "c-style",
            Self::BestFit => "rb-tree",
        }
    }

    /// Human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Linear => "Linear (bump)",
            Self::Stack => "Stack (LIFO)",
            Self::Pool => "Fixed-size pool",
            Self::FreeList => "Free list (first-fit)",
            Self::Buddy => "Buddy system",
            Self::GeneralPurpose => "C-style (size classes)",
            Self::BestFit => "RB-tree (best-fit)",
        }
    }

    /// Position in [`ALL`](Self::ALL).
    pub fn index(&self) -> usize {
        *self as usize
    }

    /// Look a strategy up by its short name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.name() == name)
    }

    /// Construct this strategy for the given configuration.
    pub fn build(&self, config: &SimConfig) -> Box<dyn AllocatorStrategy> {
        let capacity = config.arena_capacity;
        match self {
            Self::Linear => Box::new(LinearAllocator::new(capacity, config.bump_alignment)),
            Self::Stack => Box::new(StackAllocator::new(capacity, config.bump_alignment)),
            Self::Pool => Box::new(PoolAllocator::new(capacity, config.pool_block_size)),
            Self::FreeList => Box::new(FreeListAllocator::new(capacity)),
            Self::Buddy => Box::new(BuddyAllocator::new(capacity, config.buddy_min_block)),
            Self::GeneralPurpose => Box::new(GeneralPurposeAllocator::new(
                capacity,
                config.header_overhead,
                &config.size_classes,
            )),
            Self::BestFit => Box::new(BestFitAllocator::new(capacity)),
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
