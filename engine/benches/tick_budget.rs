//! Validates that a single `AdaptiveEngine::ingest` tick stays well under
//! the 15ms budget a 1Hz sensor-fusion loop needs to leave headroom for
//! the rest of the session executor's per-second work.

use adaptive_run_core::config::EngineConfig;
use adaptive_run_core::types::{LiveRunMetrics, ReadinessBaseline, TrainingStyle};
use adaptive_run_engine::AdaptiveEngine;
use chrono::{Duration, Utc};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

fn warmed_engine() -> AdaptiveEngine {
    let baseline = ReadinessBaseline::for_style(TrainingStyle::Tempo, 110.0, 100.0);
    let mut engine = AdaptiveEngine::new(baseline, 75.0, EngineConfig::default());

    // Fill the rolling window to capacity so the OLS drift slope and
    // moving-average pace are doing real work, not short-circuiting on an
    // empty buffer.
    let start = Utc::now();
    for i in 0..300 {
        let t = start + Duration::seconds(i);
        engine.ingest(LiveRunMetrics {
            timestamp: t,
            heart_rate_bpm: Some(150.0 + (i % 10) as f64),
            pace_seconds_per_mile: Some(420.0 + (i % 7) as f64),
            distance_miles: i as f64 / 480.0,
            cadence_spm: Some(172.0),
            grade_percent: Some(0.0),
            kcal_per_min: Some(14.0),
            hr_zone: Some(3),
        });
    }
    engine
}

fn tick_budget(c: &mut Criterion) {
    let mut engine = warmed_engine();
    let start = Utc::now();
    let mut i = 300_i64;

    c.bench_function("adaptive_engine_ingest_steady_state", |b| {
        b.iter(|| {
            let t = start + Duration::seconds(i);
            let metrics = LiveRunMetrics {
                timestamp: t,
                heart_rate_bpm: Some(152.0),
                pace_seconds_per_mile: Some(422.0),
                distance_miles: i as f64 / 480.0,
                cadence_spm: Some(172.0),
                grade_percent: Some(0.0),
                kcal_per_min: Some(14.0),
                hr_zone: Some(3),
            };
            i += 1;
            black_box(engine.ingest(black_box(metrics)))
        })
    });
}

criterion_group!(benches, tick_budget);
criterion_main!(benches);
