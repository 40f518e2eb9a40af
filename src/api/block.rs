//! Requests and blocks: the values strategies consume and produce.

use std::fmt;

/// Simulated time in milliseconds.
pub type SimTime = u64;

/// A single allocation request produced by the workload generator.
///
/// Requests are immutable once created; the engine consumes each one
/// exactly once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllocationRequest {
    /// Unique request id, reused as the id of the resulting block.
    pub id: String,
    /// Requested size in bytes (always > 0).
    pub size: usize,
    /// Simulated time at which the request was issued.
    pub created_at: SimTime,
    /// How long the allocation lives before the engine frees it.
    /// `None` means it lives until the strategy is reset.
    pub lifetime: Option<SimTime>,
}

impl AllocationRequest {
    /// Create a request. A zero size is bumped to one byte.
    pub fn new(id: impl Into<String>, size: usize, created_at: SimTime, lifetime: Option<SimTime>) -> Self {
        Self {
            id: id.into(),
            size: size.max(1),
            created_at,
            lifetime,
        }
    }

    /// Simulated time at which this request expires, if it ever does.
    pub fn expires_at(&self) -> Option<SimTime> {
        self.lifetime.map(|l| self.created_at.saturating_add(l))
    }

    /// Copy of this request issued at `now`, same id, size and lifetime.
    pub(crate) fn reissued_at(&self, now: SimTime) -> Self {
        Self {
            created_at: now,
            ..self.clone()
        }
    }
}

/// A region of a strategy's arena: either a live allocation or free space.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllocationBlock {
    /// Request id for live blocks, `free@<address>` for free regions.
    pub id: String,
    /// Offset into the arena.
    pub address: usize,
    /// Bytes covered, including any strategy padding.
    pub size: usize,
    /// Whether the block is a live allocation.
    pub allocated: bool,
    /// Creation time (the request's time for live blocks).
    pub created_at: SimTime,
}

impl AllocationBlock {
    /// Describe a free region.
    pub fn free(address: usize, size: usize) -> Self {
        Self {
            id: format!("free@{}", address),
            address,
            size,
            allocated: false,
            created_at: 0,
        }
    }

    /// One past the last byte of this block.
    pub fn end(&self) -> usize {
        self.address + self.size
    }

    /// Whether the two blocks share at least one byte.
    pub fn overlaps(&self, other: &AllocationBlock) -> bool {
        self.address < other.end() && other.address < self.end()
    }
}

impl fmt::Display for AllocationBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = if self.allocated { "used" } else { "free" };
        write!(
            f,
            "[{:#06x}..{:#06x}) {} {} B ({})",
            self.address,
            self.end(),
            state,
            self.size,
            self.id
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expiry() {
        let req = AllocationRequest::new("req-1", 32, 1_000, Some(500));
        assert_eq!(req.expires_at(), Some(1_500));

        let persistent = AllocationRequest::new("req-2", 32, 1_000, None);
        assert_eq!(persistent.expires_at(), None);

        let again = req.reissued_at(4_000);
        assert_eq!(again.id, "req-1");
        assert_eq!(again.expires_at(), Some(4_500));
    }

    #[test]
    fn test_overlap() {
        let a = AllocationBlock::free(0, 100);
        let b = AllocationBlock::free(100, 50);
        let c = AllocationBlock::free(99, 2);
        assert!(!a.overlaps(&b));
        assert!(a.overlaps(&c));
        assert!(b.overlaps(&c));
    }
}
