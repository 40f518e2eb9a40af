//! Integration tests for the simulation engine.

use std::sync::Arc;
use std::time::Duration;

use edgealloc::{
    BenchmarkEntry, BenchmarkPhase, CollectingSink, Driver, LogLevel, LogRecord, ManualClock, QueueSink, RunState,
    SharedEngine, SimConfig, SimulationEngine, StrategyKind, WorkloadGenerator, WorkloadPattern,
};

fn collecting(config: SimConfig) -> (SimulationEngine, Arc<CollectingSink>) {
    let sink = Arc::new(CollectingSink::new());
    (SimulationEngine::new(config, sink.clone()), sink)
}

fn run_to_completion(engine: &mut SimulationEngine) -> u64 {
    let mut ticks = 0;
    while engine.tick() {
        ticks += 1;
    }
    ticks
}

#[test]
fn test_replay_is_identical_for_every_phase() {
    let mut engine = SimulationEngine::headless(SimConfig::default().with_seed(2024));
    engine.start_benchmark(WorkloadPattern::Mixed, 500).unwrap();
    run_to_completion(&mut engine);

    let results = engine.benchmark_results().unwrap();
    assert!(results.is_complete());
    assert_eq!(results.sequence_digests.len(), StrategyKind::ALL.len() + 1);

    let first = results.sequence_digests[&BenchmarkEntry::Strategy(StrategyKind::Linear)];
    for digest in results.sequence_digests.values() {
        assert_eq!(*digest, first);
    }
}

#[test]
fn test_cursor_replay_matches_pre_generated_sequence() {
    let mut generator = WorkloadGenerator::new(Some(5));
    generator.pre_generate_workload(WorkloadPattern::Lifo, 500);
    let recorded: Vec<_> = generator.workload().iter().map(|r| (r.size, r.lifetime)).collect();

    for pass in 0..3u64 {
        let mut replayed = Vec::new();
        while let Some(request) = generator.next_operation(pass * 10_000) {
            replayed.push((request.size, request.lifetime));
        }
        assert_eq!(replayed, recorded);
        assert_eq!(generator.progress(), 1.0);
        generator.reset_workload();
    }
}

#[test]
fn test_benchmark_results_are_measured() {
    let mut engine = SimulationEngine::headless(SimConfig::default().with_seed(11));
    engine.start_benchmark(WorkloadPattern::PowerOfTwo, 120).unwrap();

    let mut last_progress = 0.0;
    while engine.tick() {
        let progress = engine.state().benchmark_progress;
        assert!(progress >= last_progress);
        assert!(progress <= 100.0);
        last_progress = progress;
    }

    let results = engine.benchmark_results().unwrap();
    for kind in StrategyKind::ALL {
        let metrics = results.get(BenchmarkEntry::Strategy(kind)).unwrap();
        assert_eq!(metrics.attempts(), 120, "{}", kind);
    }

    let adaptive = results.adaptive().unwrap();
    assert_eq!(adaptive.attempts(), 120);
    assert_eq!(results.adaptive_picks.values().sum::<u64>(), 120);
    assert!(results.best_strategy().is_some());
    assert_eq!(results.ranking().len(), StrategyKind::ALL.len() + 1);
}

#[test]
fn test_benchmark_partial_results_and_completion() {
    let (mut engine, sink) = collecting(SimConfig::minimal().with_seed(8));
    engine.start_benchmark(WorkloadPattern::UniformSmall, 10).unwrap();

    let state = engine.state();
    assert!(state.benchmark_running);
    assert!(state.running);
    assert_eq!(state.benchmark_phase, BenchmarkPhase::PerStrategy);
    assert_eq!(state.benchmark_strategy, Some(StrategyKind::Linear));

    for _ in 0..10 {
        engine.tick();
    }
    let partial = engine.benchmark_results().unwrap();
    assert_eq!(partial.metrics.len(), 1);
    assert_eq!(engine.state().benchmark_strategy, Some(StrategyKind::Stack));

    run_to_completion(&mut engine);
    let state = engine.state();
    assert_eq!(state.benchmark_phase, BenchmarkPhase::Done);
    assert_eq!(state.run_state, RunState::Paused);

    let snapshots: Vec<_> = sink
        .records()
        .into_iter()
        .filter_map(|r| match r {
            LogRecord::MetricsSnapshot { strategy, .. } => Some(strategy),
            _ => None,
        })
        .collect();
    assert_eq!(snapshots.len(), StrategyKind::ALL.len() + 1);
    assert_eq!(snapshots.last(), Some(&None));
}

#[test]
fn test_benchmark_cancels_live_mode() {
    let mut engine = SimulationEngine::headless(SimConfig::default().with_seed(4).with_request_probability(1.0));
    engine.set_workload_pattern(WorkloadPattern::LongLived);
    engine.start();
    for _ in 0..10 {
        engine.tick();
    }
    assert!(engine.metrics().values().any(|m| m.current_usage > 0));

    engine.start_benchmark(WorkloadPattern::Lifo, 50).unwrap();
    assert_eq!(engine.state().active_requests, 0);
    for metrics in engine.metrics().values() {
        assert_eq!(metrics.current_usage, 0);
        assert_eq!(metrics.attempts(), 0);
    }
}

#[test]
fn test_reset_discards_benchmark() {
    let mut engine = SimulationEngine::headless(SimConfig::minimal().with_seed(6));
    engine.start_benchmark(WorkloadPattern::Lifo, 5).unwrap();
    engine.tick();
    engine.reset();

    let state = engine.state();
    assert_eq!(state.run_state, RunState::Idle);
    assert_eq!(state.benchmark_phase, BenchmarkPhase::Idle);
    assert!(engine.benchmark_results().is_none());
    assert!(engine.workload().is_empty());

    // A new benchmark may start straight away.
    engine.start_benchmark(WorkloadPattern::Lifo, 5).unwrap();
}

#[test]
fn test_live_mode_logs_every_strategy() {
    let config = SimConfig::default().with_seed(12).with_request_probability(1.0);
    let (mut engine, sink) = collecting(config);
    engine.set_workload_pattern(WorkloadPattern::UniformSmall);
    engine.start();
    engine.tick();

    let allocated: Vec<StrategyKind> = sink
        .records()
        .into_iter()
        .filter_map(|r| match r {
            LogRecord::Allocation { strategy, .. } => Some(strategy),
            _ => None,
        })
        .collect();
    assert_eq!(allocated, StrategyKind::ALL.to_vec());

    for metrics in engine.metrics().values() {
        assert_eq!(metrics.total_allocations, 1);
    }
}

#[test]
fn test_out_of_space_is_logged_and_survived() {
    let config = SimConfig::minimal().with_seed(21).with_request_probability(1.0);
    let (mut engine, sink) = collecting(config);
    engine.set_workload_pattern(WorkloadPattern::UniformLarge);
    engine.start();
    for _ in 0..30 {
        assert!(engine.tick());
    }

    let warnings = sink.with_code("EA001");
    assert!(!warnings.is_empty());
    for record in &warnings {
        assert_eq!(record.level(), LogLevel::Warning);
        assert!(record.to_string().contains("remaining"));
    }
    assert!(engine.is_running());
    assert!(engine.metrics().values().all(|m| m.success_rate < 100.0));
}

#[test]
fn test_adaptive_mode_switches_and_reports() {
    let config = SimConfig::default().with_seed(3).with_request_probability(1.0);
    let (mut engine, sink) = collecting(config);
    engine.set_manual_strategy(StrategyKind::Linear);
    engine.set_adaptive_mode(true);
    engine.set_workload_pattern(WorkloadPattern::Lifo);
    engine.start();
    engine.tick();

    let state = engine.state();
    assert_eq!(state.selected_strategy, StrategyKind::Stack);
    assert_eq!(engine.scores()[0].strategy, StrategyKind::Stack);

    let switches: Vec<_> = sink
        .records()
        .into_iter()
        .filter_map(|r| match r {
            LogRecord::Recommendation { from, to, reasoning, .. } => Some((from, to, reasoning.len())),
            _ => None,
        })
        .collect();
    assert_eq!(switches.len(), 1);
    assert_eq!((switches[0].0, switches[0].1), (StrategyKind::Linear, StrategyKind::Stack));
    assert!(switches[0].2 > 1);
}

#[test]
fn test_manual_mode_never_switches() {
    let config = SimConfig::default().with_seed(3).with_request_probability(1.0);
    let (mut engine, sink) = collecting(config);
    engine.set_workload_pattern(WorkloadPattern::Lifo);
    engine.set_manual_strategy(StrategyKind::Linear);
    engine.start();
    for _ in 0..50 {
        engine.tick();
    }

    assert_eq!(engine.state().selected_strategy, StrategyKind::Linear);
    assert!(sink
        .records()
        .iter()
        .all(|r| !matches!(r, LogRecord::Recommendation { .. })));
}

#[test]
fn test_lifetimes_expire() {
    let config = SimConfig::default().with_seed(17).with_request_probability(1.0);
    let mut engine = SimulationEngine::headless(config);
    engine.set_workload_pattern(WorkloadPattern::UniformSmall);
    engine.start();
    engine.tick();
    assert_eq!(engine.state().active_requests, 1);

    engine.set_workload_pattern(WorkloadPattern::LongLived);
    // Uniform-small lifetimes are well under a minute of simulated time.
    for _ in 0..600 {
        engine.tick();
    }
    let free_list = engine.metrics()[&StrategyKind::FreeList].clone();
    assert_eq!(free_list.total_deallocations, 1);

    // The stack still holds it under the long-lived blocks pushed since.
    assert_eq!(engine.state().active_requests, 1);
    let stack = engine.strategy(StrategyKind::Stack);
    assert!(stack.is_live("req-0"));
    assert_eq!(stack.metrics().failed_deallocations, 1);
}

#[test]
fn test_adaptive_phase_routes_the_same_way_every_run() {
    let run = || {
        let mut engine = SimulationEngine::headless(SimConfig::default().with_seed(77));
        engine.start_benchmark(WorkloadPattern::Mixed, 300).unwrap();
        run_to_completion(&mut engine);
        let results = engine.benchmark_results().unwrap();
        let adaptive = results.adaptive().unwrap();
        (
            results.adaptive_picks.clone(),
            adaptive.total_allocations,
            adaptive.failed_allocations,
            adaptive.current_usage,
        )
    };
    assert_eq!(run(), run());
}

#[test]
fn test_lifo_benchmark_frees_stack_in_order() {
    let mut engine = SimulationEngine::headless(SimConfig::default().with_seed(2024));
    engine.start_benchmark(WorkloadPattern::Lifo, 500).unwrap();
    run_to_completion(&mut engine);

    let results = engine.benchmark_results().unwrap();
    let stack = results.get(BenchmarkEntry::Strategy(StrategyKind::Stack)).unwrap();
    assert_eq!(stack.failed_deallocations, 0);
    assert_eq!(stack.failed_allocations, 0);
    assert_eq!(stack.success_rate, 100.0);
    assert!(stack.total_deallocations > 400);
}

#[test]
fn test_live_lifo_never_jams_the_stack() {
    let mut engine = SimulationEngine::headless(SimConfig::default().with_seed(2024));
    engine.set_workload_pattern(WorkloadPattern::Lifo);
    engine.set_manual_strategy(StrategyKind::Stack);
    engine.start();
    for _ in 0..3000 {
        engine.tick();
    }

    let stack = &engine.metrics()[&StrategyKind::Stack];
    assert_eq!(stack.failed_deallocations, 0);
    assert_eq!(stack.failed_allocations, 0);
    assert!(stack.total_deallocations > 1000);
}

#[test]
fn test_blocked_stack_frame_is_freed_once_on_top() {
    let config = SimConfig::default().with_seed(31).with_request_probability(1.0);
    let (mut engine, sink) = collecting(config);
    engine.set_workload_pattern(WorkloadPattern::UniformSmall);
    engine.start();
    engine.tick();

    // The LIFO nest pushed above req-0 outlives it, then drains by 8.2 s.
    engine.set_workload_pattern(WorkloadPattern::Lifo);
    for _ in 0..120 {
        engine.tick();
    }

    let stack = engine.strategy(StrategyKind::Stack);
    assert!(!stack.is_live("req-0"));
    assert_eq!(stack.metrics().failed_deallocations, 1);

    let refusals = sink
        .records()
        .into_iter()
        .filter(|r| match r {
            LogRecord::Diagnostic { strategy, context, .. } => {
                *strategy == Some(StrategyKind::Stack) && context.starts_with("req-0:")
            }
            _ => false,
        })
        .count();
    assert_eq!(refusals, 1);
}

#[test]
fn test_metrics_snapshots_follow_interval() {
    let config = SimConfig::minimal().with_seed(9).with_snapshot_interval(5);
    let (mut engine, sink) = collecting(config);
    engine.set_manual_strategy(StrategyKind::Buddy);
    engine.start();
    for _ in 0..20 {
        engine.tick();
    }

    let snapshots: Vec<_> = sink
        .records()
        .into_iter()
        .filter(|r| matches!(r, LogRecord::MetricsSnapshot { strategy: Some(StrategyKind::Buddy), .. }))
        .collect();
    assert_eq!(snapshots.len(), 4);
}

#[test]
fn test_scores_bounded_and_sorted() {
    let mut engine = SimulationEngine::headless(SimConfig::minimal().with_seed(30).with_request_probability(1.0));
    for pattern in WorkloadPattern::ALL {
        engine.set_workload_pattern(pattern);
        engine.start();
        for _ in 0..40 {
            engine.tick();
        }
        let scores = engine.scores();
        assert_eq!(scores.len(), StrategyKind::ALL.len());
        assert!(scores.iter().all(|s| (0.0..=1.0).contains(&s.score)));
        assert!(scores.windows(2).all(|w| w[0].score >= w[1].score));
        engine.reset();
    }
}

#[test]
fn test_same_seed_same_simulation() {
    let run = || {
        let mut engine = SimulationEngine::headless(SimConfig::default().with_seed(77));
        engine.set_workload_pattern(WorkloadPattern::Mixed);
        engine.start();
        for _ in 0..200 {
            engine.tick();
        }
        engine
            .metrics()
            .into_iter()
            .map(|(kind, m)| (kind, m.total_allocations, m.current_usage, m.peak_usage))
            .collect::<Vec<_>>()
    };
    assert_eq!(run(), run());
}

#[test]
fn test_driver_with_manual_clock() {
    let mut engine = SimulationEngine::headless(SimConfig::minimal().with_seed(1));
    let driver = Driver::new(ManualClock::new());
    engine.set_speed(4.0);
    engine.start();

    assert_eq!(driver.pump(&mut engine), 0);
    driver.clock().advance(Duration::from_millis(1000));
    assert_eq!(driver.pump(&mut engine), 4);

    engine.stop();
    driver.clock().advance(Duration::from_millis(1000));
    assert_eq!(driver.pump(&mut engine), 0);
    assert_eq!(engine.state().tick_count, 4);
}

#[test]
fn test_shared_engine_serializes_access() {
    let shared = SharedEngine::new(SimulationEngine::headless(SimConfig::minimal().with_seed(2)));
    shared.with(|engine| engine.start_benchmark(WorkloadPattern::Lifo, 10)).unwrap();

    let pumps: Vec<_> = (0..4)
        .map(|_| {
            let shared = shared.clone();
            std::thread::spawn(move || {
                while shared.with(|engine| engine.tick()) {}
            })
        })
        .collect();
    for pump in pumps {
        pump.join().unwrap();
    }

    let state = shared.state();
    assert_eq!(state.benchmark_phase, BenchmarkPhase::Done);
    assert_eq!(state.tick_count, 10 * (StrategyKind::ALL.len() as u64 + 1));
}

#[test]
fn test_queue_sink_drops_when_full() {
    let sink = Arc::new(QueueSink::new(4));
    let _engine = SimulationEngine::new(SimConfig::minimal(), sink.clone());

    assert_eq!(sink.len(), 4);
    assert_eq!(sink.dropped(), StrategyKind::ALL.len() as u64 - 4);
    assert!(matches!(sink.pop(), Some(LogRecord::Boot { strategy: StrategyKind::Linear, .. })));
}
