//! Live dashboard for edgealloc
//!
//! Drives the engine from the wall clock for a few seconds, switching
//! workload pattern every two seconds and printing a status panel after each.

use std::sync::Arc;
use std::time::Duration;

use edgealloc::{
    format_bytes, Clock, Driver, LogLevel, QueueSink, SimConfig, SimulationEngine, SystemClock, WorkloadPattern,
};

fn main() {
    let config = SimConfig::default();
    let sink = Arc::new(QueueSink::new(config.log_queue_capacity));
    let mut engine = SimulationEngine::new(config, sink.clone());
    let driver = Driver::new(SystemClock::new());

    println!("edgealloc live dashboard (seed {})", engine.seed());

    engine.set_speed(10.0);
    engine.start();

    for phase in [WorkloadPattern::Mixed, WorkloadPattern::Lifo, WorkloadPattern::PowerOfTwo] {
        engine.set_workload_pattern(phase);
        driver.run_for(&mut engine, Duration::from_secs(2));

        let state = engine.state();
        println!(
            "\n== {} | t={} ms | ticks={} | selected={} ({}) ==",
            phase,
            state.simulated_time,
            state.tick_count,
            state.selected_strategy,
            if state.adaptive_mode { "adaptive" } else { "manual" },
        );

        for (kind, metrics) in engine.metrics() {
            println!(
                "  {:<10} used {:>9}  frag {:>5.1}%  success {:>5.1}%",
                kind.name(),
                format_bytes(metrics.current_usage),
                metrics.fragmentation,
                metrics.success_rate,
            );
        }

        println!("  scores:");
        for score in engine.scores().iter().take(3) {
            println!("    {}", score);
        }

        // Only surface what matters; allocations are debug noise here.
        for record in sink.drain().iter().filter(|r| r.level() >= LogLevel::Info).take(5) {
            println!("  {}", record);
        }
    }

    engine.stop();
    println!("\nStopped after {} ms of wall time, {} records dropped.", driver.clock().now_ms(), sink.dropped());
}
