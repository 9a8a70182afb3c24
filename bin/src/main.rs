//! Adaptive Run Sim -- a demo harness that drives a full run end-to-end
//! against in-process collaborator stubs (no real sensors, no real peer
//! device). Useful for exercising the Run Session Manager's tick loop and
//! for manual smoke-testing the persistence/bridge wiring.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use adaptive_run_core::error::Result as EngineResult;
use adaptive_run_core::events::{SessionEvent, SessionEventSink};
use adaptive_run_core::traits::{
    CoachingSink, DisplayPublisher, InMemoryIntentRelay, PeerTransport, TelemetrySink,
    TelemetrySource,
};
use adaptive_run_core::types::{HapticKind, LiveRunMetrics, MotionSample, TrainingStyle, WidgetState};
use adaptive_run_platform::HeuristicThermalObserver;
use adaptive_run_session::{Collaborators, RunSessionManager};
use async_trait::async_trait;
use chrono::Utc;
use clap::Parser;
use parking_lot::Mutex as SyncMutex;
use tracing::info;

#[derive(Parser)]
#[command(name = "adaptive-run-sim")]
#[command(about = "Drives a simulated run through the Run Session Manager")]
struct Args {
    /// Run duration in minutes.
    #[arg(short, long, default_value_t = 20)]
    duration_minutes: u64,

    /// Training style: recovery, base, cross, rest, long, tempo, speed.
    #[arg(short, long, default_value = "base")]
    style: String,

    /// Treadmill / indoor run.
    #[arg(short, long)]
    indoor: bool,
}

fn parse_style(s: &str) -> TrainingStyle {
    match s {
        "recovery" => TrainingStyle::Recovery,
        "cross" => TrainingStyle::Cross,
        "rest" => TrainingStyle::Rest,
        "long" => TrainingStyle::Long,
        "tempo" => TrainingStyle::Tempo,
        "speed" => TrainingStyle::Speed,
        _ => TrainingStyle::Base,
    }
}

/// Synthetic telemetry at a steady 9:30/mile pace with a slow cardiac drift,
/// enough to exercise the Adaptive Engine's drift and fueling alerts over a
/// multi-minute simulated run.
struct SimulatedTelemetry {
    handle: SyncMutex<Option<tokio::task::JoinHandle<()>>>,
}

impl SimulatedTelemetry {
    fn new() -> Self {
        Self {
            handle: SyncMutex::new(None),
        }
    }
}

#[async_trait]
impl TelemetrySource for SimulatedTelemetry {
    async fn request_authorization(&self) -> EngineResult<()> {
        Ok(())
    }

    async fn start(&self, sink: Arc<dyn TelemetrySink>) -> EngineResult<()> {
        let task = tokio::spawn(async move {
            let pace_secs_per_mile = 570.0;
            let mut distance_miles = 0.0_f64;
            let mut tick: u64 = 0;
            loop {
                tokio::time::sleep(StdDuration::from_secs(1)).await;
                tick += 1;
                distance_miles += 1.0 / pace_secs_per_mile;
                let heart_rate_bpm = 135.0 + (tick as f64 / 60.0).min(25.0);
                sink.on_metrics(LiveRunMetrics {
                    timestamp: Utc::now(),
                    heart_rate_bpm: Some(heart_rate_bpm),
                    pace_seconds_per_mile: Some(pace_secs_per_mile),
                    distance_miles,
                    cadence_spm: Some(172.0),
                    grade_percent: Some(0.0),
                    kcal_per_min: Some(11.5),
                    hr_zone: Some(if heart_rate_bpm > 155.0 { 4 } else { 3 }),
                });
                sink.on_motion(MotionSample {
                    vertical_accel: 0.6 * (tick as f64).sin(),
                    lateral_accel: 0.1 * (tick as f64).cos(),
                    timestamp: Utc::now(),
                });
            }
        });
        *self.handle.lock() = Some(task);
        Ok(())
    }

    async fn stop(&self) -> EngineResult<()> {
        if let Some(task) = self.handle.lock().take() {
            task.abort();
        }
        Ok(())
    }
}

struct LoopbackPeerTransport;

#[async_trait]
impl PeerTransport for LoopbackPeerTransport {
    async fn update_context(&self, _dict: serde_json::Value) -> EngineResult<()> {
        Ok(())
    }

    async fn send_message(&self, dict: serde_json::Value) -> EngineResult<()> {
        info!(message = %dict, "peer send (loopback)");
        Ok(())
    }

    fn is_reachable(&self) -> bool {
        true
    }
}

struct ConsoleCoachingSink;

#[async_trait]
impl CoachingSink for ConsoleCoachingSink {
    async fn speak(&self, text: &str) -> EngineResult<()> {
        info!(%text, "coach prompt");
        Ok(())
    }

    async fn haptic(&self, kind: HapticKind) -> EngineResult<()> {
        info!(?kind, "haptic");
        Ok(())
    }
}

struct ConsoleDisplayPublisher;

#[async_trait]
impl DisplayPublisher for ConsoleDisplayPublisher {
    async fn publish(&self, state: WidgetState) -> EngineResult<()> {
        info!(
            elapsed = state.elapsed_seconds,
            distance = state.distance_miles,
            hr = ?state.heart_rate_bpm,
            fuel = ?state.fuel_remaining_grams,
            "widget state"
        );
        Ok(())
    }
}

struct LoggingEventSink;

impl SessionEventSink for LoggingEventSink {
    fn notify(&self, event: SessionEvent) {
        info!(?event, "session event");
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    let args = Args::parse();

    info!("Starting Adaptive Run Sim v{}", env!("CARGO_PKG_VERSION"));

    let data_dir = adaptive_run_persistence::FileStore::default_data_dir()
        .unwrap_or_else(|| std::path::PathBuf::from("./adaptive-run-data"));
    let persistence = Arc::new(adaptive_run_persistence::FileStore::new(data_dir)?);

    let collaborators = Collaborators {
        telemetry_source: Arc::new(SimulatedTelemetry::new()),
        persistence,
        peer_transport: Arc::new(LoopbackPeerTransport),
        coaching: Arc::new(ConsoleCoachingSink),
        display: Arc::new(ConsoleDisplayPublisher),
        intent_relay: Arc::new(InMemoryIntentRelay::default()),
        event_sink: Arc::new(LoggingEventSink) as Arc<dyn SessionEventSink>,
    };

    let mut manager = RunSessionManager::new(
        70.0,
        adaptive_run_core::config::EngineConfig::default(),
        Box::new(HeuristicThermalObserver::new(20)),
        collaborators,
    );
    manager.set_training_load(95.0, 100.0);

    manager.start_run(parse_style(&args.style), args.indoor).await?;

    let ticks = args.duration_minutes * 60;
    for _ in 0..ticks {
        tokio::time::sleep(StdDuration::from_secs(1)).await;
        if let Err(e) = manager.tick().await {
            tracing::error!(error = %e, "tick failed");
        }
    }

    manager.end_run(false).await?;
    info!("Adaptive Run Sim shutdown complete");

    Ok(())
}
