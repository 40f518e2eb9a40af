//! Benchmark report for edgealloc
//!
//! Replays the same workload against every strategy and then through the
//! adaptive selector, once per workload pattern.

use edgealloc::{SimConfig, SimulationEngine, WorkloadPattern};

fn main() {
    const OPERATIONS: usize = 500;

    for pattern in WorkloadPattern::ALL {
        let mut engine = SimulationEngine::headless(SimConfig::default().with_seed(42));
        if let Err(err) = engine.start_benchmark(pattern, OPERATIONS) {
            eprintln!("{}: {}", pattern, err);
            continue;
        }
        while engine.tick() {}

        let Some(results) = engine.benchmark_results() else {
            continue;
        };

        println!("\n{} ({} requests)", pattern, results.operation_count);
        println!("  {:<10} {:>7} {:>8} {:>6} {:>6}", "entry", "score", "success", "frag", "eff");
        for (entry, score) in results.ranking() {
            let Some(m) = results.get(entry) else { continue };
            println!(
                "  {:<10} {:>7.3} {:>7.1}% {:>5.1}% {:>5.0}%",
                entry.to_string(),
                score,
                m.success_rate,
                m.fragmentation,
                m.memory_efficiency() * 100.0,
            );
        }

        if let Some(best) = results.best_strategy() {
            println!("  best single strategy: {}", best.label());
        }
        if let Some(delta) = results.adaptive_improvement() {
            println!("  adaptive vs mean strategy: {:+.1}%", delta);
        }
        let picks: Vec<String> = results
            .adaptive_picks
            .iter()
            .map(|(kind, n)| format!("{}={}", kind, n))
            .collect();
        println!("  selector picks: {}", picks.join(" "));
    }
}
