//! Per-strategy allocation metrics.

use crate::util::size::format_bytes;

/// Point-in-time metrics of one strategy.
///
/// Built fresh from the strategy's block sets every time it is read,
/// so it never lags behind a mutation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AllocatorMetrics {
    /// Arena capacity in bytes.
    pub capacity: usize,

    /// Successful allocations since the last reset.
    pub total_allocations: u64,

    /// Successful deallocations since the last reset.
    pub total_deallocations: u64,

    /// Allocation attempts that failed.
    pub failed_allocations: u64,

    /// Deallocation attempts that failed.
    pub failed_deallocations: u64,

    /// Bytes held by live blocks (including strategy padding).
    pub current_usage: usize,

    /// High water mark of `current_usage`.
    pub peak_usage: usize,

    /// Bytes in free blocks.
    pub free_space: usize,

    /// Size of the largest free block.
    pub largest_free_block: usize,

    /// External fragmentation in percent (0-100).
    pub fragmentation: f64,

    /// Internal padding held by live blocks.
    pub wasted_space: usize,

    /// Successful share of allocation attempts in percent (0-100).
    pub success_rate: f64,

    /// Rolling average allocation latency in microseconds.
    pub avg_alloc_time_us: f64,

    /// Rolling average deallocation latency in microseconds.
    pub avg_dealloc_time_us: f64,

    /// Number of live blocks.
    pub live_blocks: usize,

    /// Number of free blocks.
    pub free_blocks: usize,
}

impl AllocatorMetrics {
    /// Live allocations net of frees.
    pub fn active_allocations(&self) -> u64 {
        self.total_allocations.saturating_sub(self.total_deallocations)
    }

    /// Total allocation attempts, successful or not.
    pub fn attempts(&self) -> u64 {
        self.total_allocations + self.failed_allocations
    }

    /// Useful bytes over useful-plus-wasted bytes (1.0 when idle).
    pub fn memory_efficiency(&self) -> f64 {
        let total = self.current_usage + self.wasted_space;
        if total == 0 {
            1.0
        } else {
            self.current_usage as f64 / total as f64
        }
    }

    /// Share of the arena held by live blocks in percent.
    pub fn utilization(&self) -> f64 {
        if self.capacity == 0 {
            0.0
        } else {
            self.current_usage as f64 / self.capacity as f64 * 100.0
        }
    }
}

/// `(free - largest) / free` as a percentage, 0 when nothing is free.
pub fn fragmentation_percent(free_space: usize, largest_free_block: usize) -> f64 {
    if free_space == 0 {
        0.0
    } else {
        free_space.saturating_sub(largest_free_block) as f64 / free_space as f64 * 100.0
    }
}

/// Successful attempts over all attempts as a percentage, 100 when idle.
pub fn success_rate_percent(succeeded: u64, failed: u64) -> f64 {
    let attempts = succeeded + failed;
    if attempts == 0 {
        100.0
    } else {
        succeeded as f64 / attempts as f64 * 100.0
    }
}

impl std::fmt::Display for AllocatorMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Allocator Metrics:")?;
        writeln!(f, "  Capacity:        {}", format_bytes(self.capacity))?;
        writeln!(f, "  In use:          {}", format_bytes(self.current_usage))?;
        writeln!(f, "  Peak:            {}", format_bytes(self.peak_usage))?;
        writeln!(f, "  Allocations:     {} ({} failed)", self.total_allocations, self.failed_allocations)?;
        writeln!(f, "  Deallocations:   {} ({} failed)", self.total_deallocations, self.failed_deallocations)?;
        writeln!(f, "  Fragmentation:   {:.1}%", self.fragmentation)?;
        writeln!(f, "  Wasted:          {}", format_bytes(self.wasted_space))?;
        writeln!(f, "  Success rate:    {:.1}%", self.success_rate)?;
        writeln!(f, "  Avg alloc:       {:.2} us", self.avg_alloc_time_us)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fragmentation_formula() {
        assert_eq!(fragmentation_percent(0, 0), 0.0);
        assert_eq!(fragmentation_percent(1000, 1000), 0.0);
        assert_eq!(fragmentation_percent(1000, 250), 75.0);
    }

    #[test]
    fn test_success_rate() {
        assert_eq!(success_rate_percent(0, 0), 100.0);
        assert_eq!(success_rate_percent(3, 1), 75.0);
    }

    #[test]
    fn test_efficiency() {
        let metrics = AllocatorMetrics {
            current_usage: 300,
            wasted_space: 100,
            ..Default::default()
        };
        assert_eq!(metrics.memory_efficiency(), 0.75);
        assert_eq!(AllocatorMetrics::default().memory_efficiency(), 1.0);
    }
}
