//! Static structural fit of each strategy to each workload pattern.

use crate::allocators::StrategyKind;
use crate::workload::WorkloadPattern;

/// Rows follow `WorkloadPattern::ALL`, columns follow `StrategyKind::ALL`:
/// linear, stack, pool, free-list, buddy, c-style, rb-tree.
const AFFINITY: [[f64; 7]; 6] = [
    // uniform-small: pool slots fit small sizes exactly
    [0.40, 0.45, 0.95, 0.60, 0.65, 0.85, 0.60],
    // uniform-large: pool cannot hold them at all
    [0.35, 0.40, 0.05, 0.70, 0.55, 0.60, 0.80],
    // mixed
    [0.30, 0.35, 0.30, 0.70, 0.65, 0.85, 0.75],
    // lifo
    [0.60, 0.95, 0.40, 0.55, 0.55, 0.60, 0.55],
    // power-of-two: no rounding waste for buddy
    [0.35, 0.40, 0.45, 0.60, 0.95, 0.70, 0.65],
    // long-lived: nothing is ever freed
    [0.95, 0.70, 0.50, 0.55, 0.50, 0.60, 0.55],
];

/// Base affinity in `[0, 1]` of `strategy` for `pattern`.
pub fn base_affinity(pattern: WorkloadPattern, strategy: StrategyKind) -> f64 {
    AFFINITY[pattern.index()][strategy.index()]
}
