//! Stack (LIFO) strategy.
//!
//! Bumps like the linear arena, but the most recent allocation may be
//! popped, which rewinds the head to where it was before that allocation.

use crate::api::block::{AllocationBlock, AllocationRequest};
use crate::api::error::AllocError;
use crate::api::stats::AllocatorMetrics;
use crate::util::size::align_up;

use super::ledger::{Ledger, Placement};
use super::{AllocatorStrategy, StrategyKind};

/// A LIFO allocator over a simulated arena.
#[derive(Debug)]
pub struct StackAllocator {
    ledger: Ledger,
    head: usize,
    align: usize,

    /// Live ids, oldest first, with the head to restore when each pops.
    frames: Vec<(String, usize)>,
}

impl StackAllocator {
    /// Create a stack arena of `capacity` bytes.
    pub fn new(capacity: usize, align: usize) -> Self {
        Self {
            ledger: Ledger::new(capacity),
            head: 0,
            align: align.max(1).next_power_of_two(),
            frames: Vec::new(),
        }
    }

    /// Id of the block that may be freed next.
    pub fn top(&self) -> Option<&str> {
        self.frames.last().map(|(id, _)| id.as_str())
    }

    /// Current head position.
    pub fn head(&self) -> usize {
        self.head
    }

    fn tail(&self) -> Option<(usize, usize)> {
        let remaining = self.ledger.capacity() - self.head;
        (remaining > 0).then(|| (self.head, remaining))
    }
}

impl AllocatorStrategy for StackAllocator {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Stack
    }

    fn capacity(&self) -> usize {
        self.ledger.capacity()
    }

    fn allocate(&mut self, request: &AllocationRequest) -> Result<AllocationBlock, AllocError> {
        let head = &mut self.head;
        let frames = &mut self.frames;
        let align = self.align;
        let capacity = self.ledger.capacity();
        let id = request.id.clone();

        self.ledger.allocate(request, |size| {
            let aligned = align_up(*head, align);
            if aligned + size > capacity {
                return Err(AllocError::OutOfSpace {
                    requested: size,
                    remaining: capacity.saturating_sub(*head),
                });
            }
            let placement = Placement {
                address: *head,
                size: aligned + size - *head,
                waste: aligned - *head,
            };
            frames.push((id, *head));
            *head = aligned + size;
            Ok(placement)
        })
    }

    fn release(&mut self, id: &str) -> Result<(), AllocError> {
        let head = &mut self.head;
        let frames = &mut self.frames;

        self.ledger.deallocate(id, |_| match frames.last() {
            Some((top, restore)) if top == id => {
                *head = *restore;
                frames.pop();
                Ok(())
            }
            _ => Err(AllocError::unsatisfiable(format!("`{}` is not the top of the stack", id))),
        })
    }

    fn is_live(&self, id: &str) -> bool {
        self.ledger.contains(id)
    }

    fn release_blocked(&self, id: &str) -> bool {
        self.ledger.contains(id) && self.top() != Some(id)
    }

    fn metrics(&self) -> AllocatorMetrics {
        self.ledger.metrics(self.tail().map(|(_, size)| size))
    }

    fn blocks(&self) -> Vec<AllocationBlock> {
        self.ledger.blocks(self.tail())
    }

    fn reset(&mut self) {
        self.ledger.reset();
        self.frames.clear();
        self.head = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn req(id: &str, size: usize) -> AllocationRequest {
        AllocationRequest::new(id, size, 0, None)
    }

    #[test]
    fn test_lifo_discipline() {
        let mut stack = StackAllocator::new(1024, 1);
        stack.allocate(&req("a", 10)).unwrap();
        stack.allocate(&req("b", 20)).unwrap();

        let before = stack.blocks();
        assert!(!stack.deallocate("a"));
        assert_eq!(stack.blocks(), before);
        assert_eq!(stack.top(), Some("b"));

        assert!(stack.release_blocked("a"));
        assert!(!stack.release_blocked("b"));

        assert!(stack.deallocate("b"));
        assert!(!stack.release_blocked("a"));
        assert!(stack.deallocate("a"));
        assert_eq!(stack.head(), 0);
    }

    #[test]
    fn test_pop_rewinds_padding() {
        let mut stack = StackAllocator::new(64, 8);
        stack.allocate(&req("a", 3)).unwrap();
        stack.allocate(&req("b", 8)).unwrap();
        assert_eq!(stack.head(), 16);

        assert!(stack.deallocate("b"));
        assert_eq!(stack.head(), 3);
        assert_eq!(stack.metrics().wasted_space, 0);
    }
}
