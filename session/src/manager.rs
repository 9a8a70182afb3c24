//! Run Session Manager: the largest component, and the only one that owns
//! a durable session record while a run is in flight. Single-owner state
//! machine -- no `Arc<Mutex<_>>` around its own fields, consistent with the
//! single-threaded "session executor" of the concurrency model.
//! Collaborators are injected as `Arc<dyn Trait>`.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use adaptive_run_bridge::{MetricSnapshotWire, OutboundThrottle, RunMessage, RunMessageEvent};
use adaptive_run_core::config::EngineConfig;
use adaptive_run_core::error::{EngineError, Result};
use adaptive_run_core::events::{SessionEvent, SessionEventSink};
use adaptive_run_core::traits::{
    CoachingSink, DisplayPublisher, IntentRelay, PeerTransport, PersistenceStore, TelemetrySink,
    TelemetrySource,
};
use adaptive_run_core::types::*;
use adaptive_run_engine::{AdaptiveEngine, CoachPromptEngine};
use adaptive_run_platform::{ThermalGovernor, ThermalObserver};
use chrono::{DateTime, TimeZone, Utc};
use parking_lot::Mutex;
use uuid::Uuid;

use crate::intent;
use crate::lifecycle::is_valid_transition;

const DEFAULT_EFFORT: u8 = 3;

/// Collaborator bundle, injected wholesale at construction. Grouped into a
/// struct rather than seven constructor arguments.
pub struct Collaborators {
    pub telemetry_source: Arc<dyn TelemetrySource>,
    pub persistence: Arc<dyn PersistenceStore>,
    pub peer_transport: Arc<dyn PeerTransport>,
    pub coaching: Arc<dyn CoachingSink>,
    pub display: Arc<dyn DisplayPublisher>,
    pub intent_relay: Arc<dyn IntentRelay>,
    pub event_sink: Arc<dyn SessionEventSink>,
}

#[derive(Default)]
struct TelemetryInbox {
    motion_samples: Mutex<Vec<MotionSample>>,
    latest_metrics: Mutex<Option<LiveRunMetrics>>,
}

struct TelemetryInboxSink(Arc<TelemetryInbox>);

impl TelemetrySink for TelemetryInboxSink {
    fn on_metrics(&self, metrics: LiveRunMetrics) {
        *self.0.latest_metrics.lock() = Some(metrics);
    }

    fn on_motion(&self, sample: MotionSample) {
        self.0.motion_samples.lock().push(sample);
    }
}

struct PeerSessionBuffer {
    started_at: DateTime<Utc>,
    ended_at: Option<DateTime<Utc>>,
    metrics: Vec<MetricSnapshotWire>,
    events: Vec<RunEvent>,
}

impl PeerSessionBuffer {
    fn new(started_at: DateTime<Utc>) -> Self {
        Self {
            started_at,
            ended_at: None,
            metrics: Vec::new(),
            events: Vec::new(),
        }
    }
}

pub struct RunSessionManager {
    lifecycle: LifecycleState,
    session: Option<Session>,
    engine: AdaptiveEngine,
    coach: CoachPromptEngine,
    thermal: ThermalGovernor<Box<dyn ThermalObserver>>,
    config: EngineConfig,

    acute_load: f64,
    chronic_load: f64,
    active_training_plan: Option<Uuid>,

    inbox: Arc<TelemetryInbox>,
    motion_buffer: VecDeque<MotionSample>,
    telemetry_buffer: Vec<TelemetryPoint>,
    snapshot_buffer: Vec<StateSnapshot>,

    lap_index: i64,
    accumulated_elapsed_secs: u64,
    resumed_at: Option<DateTime<Utc>>,
    last_distance_miles: f64,
    last_pace_seconds_per_mile: Option<f64>,
    last_prompt_at: Option<DateTime<Utc>>,
    last_alert_shown: Option<AlertKind>,
    last_error: Option<String>,

    peer_throttle: OutboundThrottle,
    display_throttle: OutboundThrottle,

    peer_buffers: HashMap<Uuid, PeerSessionBuffer>,
    fallback_peer_run_id: Uuid,

    telemetry_source: Arc<dyn TelemetrySource>,
    persistence: Arc<dyn PersistenceStore>,
    peer_transport: Arc<dyn PeerTransport>,
    coaching: Arc<dyn CoachingSink>,
    display: Arc<dyn DisplayPublisher>,
    intent_relay: Arc<dyn IntentRelay>,
    event_sink: Arc<dyn SessionEventSink>,
}

impl RunSessionManager {
    pub fn new(
        weight_kg: f64,
        config: EngineConfig,
        thermal_observer: Box<dyn ThermalObserver>,
        collaborators: Collaborators,
    ) -> Self {
        let baseline = ReadinessBaseline::for_style(TrainingStyle::Base, 100.0, 100.0);
        Self {
            lifecycle: LifecycleState::Idle,
            session: None,
            engine: AdaptiveEngine::new(baseline, weight_kg, config.clone()),
            coach: CoachPromptEngine::new(std::time::Duration::from_secs(config.coach.cooldown_secs)),
            thermal: ThermalGovernor::new(thermal_observer),
            peer_throttle: OutboundThrottle::new(std::time::Duration::from_secs(
                config.throttle.peer_metric_snapshot_secs,
            )),
            display_throttle: OutboundThrottle::new(std::time::Duration::from_secs(
                config.throttle.display_publish_secs,
            )),
            config,
            acute_load: 100.0,
            chronic_load: 100.0,
            active_training_plan: None,
            inbox: Arc::new(TelemetryInbox::default()),
            motion_buffer: VecDeque::new(),
            telemetry_buffer: Vec::new(),
            snapshot_buffer: Vec::new(),
            lap_index: 0,
            accumulated_elapsed_secs: 0,
            resumed_at: None,
            last_distance_miles: 0.0,
            last_pace_seconds_per_mile: None,
            last_prompt_at: None,
            last_alert_shown: None,
            last_error: None,
            peer_buffers: HashMap::new(),
            fallback_peer_run_id: Uuid::new_v4(),
            telemetry_source: collaborators.telemetry_source,
            persistence: collaborators.persistence,
            peer_transport: collaborators.peer_transport,
            coaching: collaborators.coaching,
            display: collaborators.display,
            intent_relay: collaborators.intent_relay,
            event_sink: collaborators.event_sink,
        }
    }

    pub fn lifecycle(&self) -> LifecycleState {
        self.lifecycle
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn elapsed_seconds(&self) -> u64 {
        match self.resumed_at {
            Some(since) if self.lifecycle == LifecycleState::Running => {
                self.accumulated_elapsed_secs + Utc::now().signed_duration_since(since).num_seconds().max(0) as u64
            }
            _ => self.accumulated_elapsed_secs,
        }
    }

    /// Historical acute/chronic training load feeding the readiness
    /// baseline. Set before `start_run`; not itself part of the tick path.
    pub fn set_training_load(&mut self, acute_load: f64, chronic_load: f64) {
        self.acute_load = acute_load;
        self.chronic_load = chronic_load;
    }

    pub fn set_active_training_plan(&mut self, plan_id: Option<Uuid>) {
        self.active_training_plan = plan_id;
    }

    fn transition(&mut self, to: LifecycleState) -> Result<()> {
        if !is_valid_transition(self.lifecycle, to) {
            return Err(EngineError::SessionStartFailed(format!(
                "illegal transition {:?} -> {to:?}",
                self.lifecycle
            )));
        }
        let from = self.lifecycle;
        self.lifecycle = to;
        self.event_sink.notify(SessionEvent::LifecycleChanged {
            from,
            to,
            timestamp: Utc::now(),
        });
        Ok(())
    }

    pub async fn start_run(&mut self, style: TrainingStyle, indoor: bool) -> Result<()> {
        if !matches!(self.lifecycle, LifecycleState::Idle | LifecycleState::Ended) {
            return Err(EngineError::SessionStartFailed("a run is already active".into()));
        }

        if let Err(e) = self.telemetry_source.request_authorization().await {
            self.last_error = Some(e.to_string());
            return Err(EngineError::PermissionDenied(e.to_string()));
        }

        self.transition(LifecycleState::Preparing)?;

        let sink: Arc<dyn TelemetrySink> = Arc::new(TelemetryInboxSink(self.inbox.clone()));
        if let Err(e) = self.telemetry_source.start(sink).await {
            self.lifecycle = LifecycleState::Idle;
            self.last_error = Some(e.to_string());
            return Err(EngineError::SessionStartFailed(e.to_string()));
        }

        let now = Utc::now();
        let session_id = Uuid::new_v4();
        self.session = Some(Session::new(session_id, now));
        self.engine
            .update_baseline(ReadinessBaseline::for_style(style, self.acute_load, self.chronic_load));
        self.lap_index = 0;
        self.accumulated_elapsed_secs = 0;
        self.resumed_at = Some(now);
        self.last_distance_miles = 0.0;
        self.last_pace_seconds_per_mile = None;
        self.last_prompt_at = None;
        self.last_alert_shown = None;
        self.motion_buffer.clear();
        self.telemetry_buffer.clear();
        self.snapshot_buffer.clear();
        *self.inbox.motion_samples.lock() = Vec::new();
        *self.inbox.latest_metrics.lock() = None;

        self.transition(LifecycleState::Running)?;

        self.persist_event(RunEvent::new(
            now,
            RunEventKind::Started,
            serde_json::json!({ "style": style, "indoor": indoor }),
        ))
        .await;

        self.publish_peer(
            RunMessage::lifecycle(RunMessageEvent::RunStarted, session_id, LifecycleState::Running, now),
            true,
        )
        .await;
        self.publish_display(true).await;

        Ok(())
    }

    pub async fn pause_run(&mut self) -> Result<()> {
        if self.lifecycle != LifecycleState::Running {
            return Err(EngineError::SessionStartFailed("not running".into()));
        }
        if let Some(since) = self.resumed_at.take() {
            self.accumulated_elapsed_secs += Utc::now().signed_duration_since(since).num_seconds().max(0) as u64;
        }
        self.transition(LifecycleState::Paused)?;

        let now = Utc::now();
        self.persist_event(RunEvent::new(now, RunEventKind::Paused, serde_json::Value::Null))
            .await;
        if let Some(session) = &self.session {
            self.publish_peer(
                RunMessage::lifecycle(RunMessageEvent::RunPaused, session.id, LifecycleState::Paused, now),
                true,
            )
            .await;
        }
        self.publish_display(true).await;
        Ok(())
    }

    pub async fn resume_run(&mut self) -> Result<()> {
        if self.lifecycle != LifecycleState::Paused {
            return Err(EngineError::SessionStartFailed("not paused".into()));
        }
        self.resumed_at = Some(Utc::now());
        self.transition(LifecycleState::Running)?;

        let now = Utc::now();
        self.persist_event(RunEvent::new(now, RunEventKind::Resumed, serde_json::Value::Null))
            .await;
        if let Some(session) = &self.session {
            self.publish_peer(
                RunMessage::lifecycle(RunMessageEvent::RunResumed, session.id, LifecycleState::Running, now),
                true,
            )
            .await;
        }
        self.publish_display(true).await;
        Ok(())
    }

    pub async fn end_run(&mut self, discarded: bool) -> Result<()> {
        if !matches!(self.lifecycle, LifecycleState::Running | LifecycleState::Paused) {
            return Err(EngineError::SessionFinalizeFailed("no active run".into()));
        }

        if let Some(since) = self.resumed_at.take() {
            self.accumulated_elapsed_secs += Utc::now().signed_duration_since(since).num_seconds().max(0) as u64;
        }

        self.motion_buffer.clear();
        *self.inbox.motion_samples.lock() = Vec::new();

        let stop_result = self.telemetry_source.stop().await;
        let collection_failed = stop_result.is_err();
        if let Err(e) = stop_result {
            self.last_error = Some(format!("session finalize failed: {e}"));
        }

        let now = Utc::now();
        let session_id = self.session.as_ref().map(|s| s.id);

        if let Some(session) = self.session.as_mut() {
            session.end_time = Some(now);
            session.total_distance_miles = self.last_distance_miles;
            session.peer_workout_id = if discarded || collection_failed {
                None
            } else {
                Some(session.id)
            };
        }

        self.persist_event(RunEvent::new(
            now,
            RunEventKind::Ended,
            serde_json::json!({ "discarded": discarded }),
        ))
        .await;

        self.force_flush().await;

        if let Some(id) = session_id {
            self.publish_peer(RunMessage::run_ended(id, now, discarded), true).await;
        }
        self.publish_display(true).await;

        self.transition(LifecycleState::Ended)?;
        Ok(())
    }

    pub async fn log_fuel(&mut self, grams: Option<f64>) -> Result<()> {
        let Some(session) = self.session.as_ref().map(|s| s.id) else {
            return Err(EngineError::SessionStartFailed("no active run".into()));
        };
        let clamped = grams.map(|g| g.clamp(15.0, 40.0)).unwrap_or(25.0);
        self.engine.log_gel(Some(clamped));

        let now = Utc::now();
        self.persist_event(RunEvent::new(
            now,
            RunEventKind::FuelLogged,
            serde_json::json!({ "grams": clamped }),
        ))
        .await;
        self.publish_peer(RunMessage::fuel_logged(session, clamped, now), true).await;
        let _ = self.coaching.haptic(HapticKind::Click).await;
        Ok(())
    }

    pub async fn mark_lap(&mut self) -> Result<()> {
        let Some(session) = self.session.as_ref().map(|s| s.id) else {
            return Err(EngineError::SessionStartFailed("no active run".into()));
        };
        self.lap_index += 1;

        let now = Utc::now();
        self.persist_event(RunEvent::new(
            now,
            RunEventKind::LapMarked,
            serde_json::json!({ "lap": self.lap_index }),
        ))
        .await;
        self.publish_peer(RunMessage::lap_marked(session, self.lap_index, now), true).await;
        let _ = self.coaching.haptic(HapticKind::Notification).await;
        Ok(())
    }

    /// The soft real-time critical path, driven once per second by the
    /// caller.
    pub async fn tick(&mut self) -> Result<()> {
        for action in intent::drain_pending(&self.intent_relay) {
            self.apply_intent(action).await;
        }

        let now = Utc::now();

        if self.lifecycle != LifecycleState::Running {
            if self.session.is_some() {
                self.snapshot_buffer.push(StateSnapshot {
                    timestamp: now,
                    lifecycle: self.lifecycle,
                    elapsed_seconds: self.elapsed_seconds(),
                    sample: self.inbox.latest_metrics.lock().clone().unwrap_or(LiveRunMetrics {
                        timestamp: now,
                        heart_rate_bpm: None,
                        pace_seconds_per_mile: None,
                        distance_miles: self.last_distance_miles,
                        cadence_spm: None,
                        grade_percent: None,
                        kcal_per_min: None,
                        hr_zone: None,
                    }),
                });
            }
            self.attempt_flush().await;
            self.publish_display(false).await;
            return Ok(());
        }

        let motion_batch: Vec<MotionSample> = {
            let mut locked = self.inbox.motion_samples.lock();
            std::mem::take(&mut *locked)
        };
        for sample in motion_batch {
            self.motion_buffer.push_back(sample);
            while self.motion_buffer.len() > self.config.buffers.motion_ring_capacity {
                self.motion_buffer.pop_front();
            }
        }
        if !self.motion_buffer.is_empty() {
            let samples: Vec<MotionSample> = self.motion_buffer.drain(..).collect();
            let biomech = adaptive_run_engine::biomechanics::analyze(&samples);
            tracing::debug!(?biomech, "biomechanical batch analyzed");
        }

        let latest = self.inbox.latest_metrics.lock().clone();
        let distance_miles = latest.as_ref().map(|m| m.distance_miles).unwrap_or(self.last_distance_miles);
        let pace_seconds_per_mile = self.refine_pace(distance_miles, 1.0);

        let metrics = LiveRunMetrics {
            timestamp: now,
            heart_rate_bpm: latest.as_ref().and_then(|m| m.heart_rate_bpm),
            pace_seconds_per_mile,
            distance_miles,
            cadence_spm: latest.as_ref().and_then(|m| m.cadence_spm),
            grade_percent: latest.as_ref().and_then(|m| m.grade_percent),
            kcal_per_min: latest.as_ref().and_then(|m| m.kcal_per_min),
            hr_zone: latest.as_ref().and_then(|m| m.hr_zone),
        };
        self.last_distance_miles = distance_miles;

        let decision = self.engine.ingest(metrics);

        if let Some(alert) = decision.first_alert() {
            if self.last_alert_shown != Some(alert) {
                let kind = match alert {
                    AlertKind::FuelCritical => HapticKind::Failure,
                    AlertKind::FuelWarning | AlertKind::CardiacDrift | AlertKind::PaceVariance => {
                        HapticKind::Notification
                    }
                    AlertKind::HighHeartRate => HapticKind::Notification,
                    AlertKind::Split => HapticKind::Success,
                };
                let _ = self.coaching.haptic(kind).await;
                self.event_sink.notify(SessionEvent::AlertRaised { alert, timestamp: now });
            }
        }
        self.last_alert_shown = decision.first_alert();

        let degradation = self.thermal.sample();
        if let Some(message) = self.coach.prompt(&decision, now, self.last_prompt_at) {
            self.last_prompt_at = Some(now);
            if degradation.voice_enabled() {
                let _ = self.coaching.speak(&message).await;
            }
        }

        if let Some(session) = self.session.as_mut() {
            let mut point = TelemetryPoint::from(metrics);
            point.fuel_remaining_grams = Some(decision.fueling.remaining_grams);
            self.telemetry_buffer.push(point);
            self.snapshot_buffer.push(StateSnapshot {
                timestamp: now,
                lifecycle: LifecycleState::Running,
                elapsed_seconds: self.elapsed_seconds(),
                sample: metrics,
            });
            session.total_distance_miles = distance_miles;
        }

        if let Some(session) = self.session.as_ref() {
            let wire_metric = MetricSnapshotWire {
                timestamp: now.timestamp() as f64,
                distance_miles,
                heart_rate_bpm: metrics.heart_rate_bpm,
                pace_seconds_per_mile: metrics.pace_seconds_per_mile,
                cadence_spm: metrics.cadence_spm,
                grade_percent: metrics.grade_percent,
                fuel_remaining_grams: Some(decision.fueling.remaining_grams),
            };
            self.publish_peer(RunMessage::metric_snapshot(session.id, wire_metric), false)
                .await;
        }

        self.attempt_flush().await;
        self.publish_display(false).await;

        Ok(())
    }

    async fn apply_intent(&mut self, action: IntentAction) {
        let result = match action {
            IntentAction::StartRun { style, indoor } => self.start_run(style, indoor).await,
            IntentAction::LogFuel { grams } => self.log_fuel(grams).await,
            IntentAction::MarkLap => self.mark_lap().await,
            IntentAction::DismissAlert => {
                self.last_alert_shown = None;
                Ok(())
            }
            IntentAction::ToggleMetrics => Ok(()),
        };
        if let Err(e) = result {
            tracing::warn!(error = %e, "intent action failed");
            self.last_error = Some(e.to_string());
        }
    }

    fn refine_pace(&mut self, distance_miles: f64, tick_interval_secs: f64) -> Option<f64> {
        let delta = distance_miles - self.last_distance_miles;
        let pace = if delta > 1e-4 {
            Some(tick_interval_secs / delta)
        } else {
            self.last_pace_seconds_per_mile
        };
        self.last_pace_seconds_per_mile = pace;
        pace
    }

    fn widget_state(&self) -> WidgetState {
        let latest = self.inbox.latest_metrics.lock().clone();
        WidgetState {
            updated: Utc::now(),
            lifecycle: self.lifecycle,
            elapsed_seconds: self.elapsed_seconds(),
            distance_miles: self.last_distance_miles,
            heart_rate_bpm: latest.as_ref().and_then(|m| m.heart_rate_bpm),
            pace_seconds_per_mile: self.last_pace_seconds_per_mile,
            fuel_remaining_grams: Some(self.engine.fueling_status().remaining_grams),
        }
    }

    async fn publish_peer(&mut self, message: RunMessage, force: bool) {
        let value = adaptive_run_bridge::encode(&message);
        let _ = self.peer_transport.update_context(value.clone()).await;
        let now = Utc::now();
        if self.peer_transport.is_reachable() && self.peer_throttle.should_send(now, force) {
            let _ = self.peer_transport.send_message(value).await;
        }
    }

    async fn publish_display(&mut self, force: bool) {
        let now = Utc::now();
        if self.display_throttle.should_send(now, force) {
            let _ = self.display.publish(self.widget_state()).await;
        }
    }

    async fn attempt_flush(&mut self) {
        if self.telemetry_buffer.len() >= self.config.buffers.flush_threshold
            || self.snapshot_buffer.len() >= self.config.buffers.flush_threshold
        {
            self.force_flush().await;
        }
    }

    async fn force_flush(&mut self) {
        let Some(session) = self.session.clone() else {
            return;
        };
        if self.telemetry_buffer.is_empty() && self.snapshot_buffer.is_empty() {
            return;
        }

        let telemetry_result = self.persistence.append_telemetry(session.id, &self.telemetry_buffer).await;
        let snapshot_result = self.persistence.append_snapshots(session.id, &self.snapshot_buffer).await;

        if telemetry_result.is_ok() && snapshot_result.is_ok() {
            self.telemetry_buffer.clear();
            self.snapshot_buffer.clear();
        } else {
            tracing::warn!("flush failed, retaining buffered entries for retry");
        }

        if let Err(e) = self.persistence.save_session(&session).await {
            self.last_error = Some(e.to_string());
            tracing::warn!(error = %e, "session save failed");
        }
    }

    async fn persist_event(&mut self, event: RunEvent) {
        if let Some(session) = &self.session {
            if let Err(e) = self.persistence.append_events(session.id, std::slice::from_ref(&event)).await {
                tracing::warn!(error = %e, "failed to persist run event");
            }
        }
    }

    /// Inbound peer ingest: rebuild an equivalent session from a paired
    /// peer's messages, keyed by peer run id (falling back to a rolling
    /// per-device id when the peer omits it).
    pub async fn consume_peer(&mut self, message: RunMessage) -> Result<()> {
        let key = message.run_id.unwrap_or(self.fallback_peer_run_id);
        let timestamp = message.timestamp_as_datetime().unwrap_or_else(Utc::now);

        match message.event {
            RunMessageEvent::RunStarted => {
                self.peer_buffers.insert(key, PeerSessionBuffer::new(timestamp));
                self.record_peer_event(key, timestamp, RunEventKind::Started);
            }
            RunMessageEvent::MetricSnapshot => {
                let buffer = self
                    .peer_buffers
                    .entry(key)
                    .or_insert_with(|| PeerSessionBuffer::new(timestamp));
                if let Some(metric) = message.metric.clone() {
                    buffer.metrics.push(metric);
                }
                buffer.events.push(RunEvent::new(
                    timestamp,
                    RunEventKind::MetricReceived,
                    adaptive_run_bridge::encode(&message),
                ));
            }
            RunMessageEvent::RunPaused => self.record_peer_event(key, timestamp, RunEventKind::Paused),
            RunMessageEvent::RunResumed => self.record_peer_event(key, timestamp, RunEventKind::Resumed),
            RunMessageEvent::FuelLogged => self.record_peer_event(key, timestamp, RunEventKind::FuelLogged),
            RunMessageEvent::LapMarked => self.record_peer_event(key, timestamp, RunEventKind::LapMarked),
            RunMessageEvent::RunEnded => {
                if let Some(buffer) = self.peer_buffers.get_mut(&key) {
                    buffer.ended_at = Some(timestamp);
                    buffer.events.push(RunEvent::new(timestamp, RunEventKind::Ended, serde_json::Value::Null));
                }
                let discarded = message.discarded.unwrap_or(false);
                self.finalize_peer_session(key, discarded).await?;
            }
        }

        Ok(())
    }

    fn record_peer_event(&mut self, key: Uuid, timestamp: DateTime<Utc>, kind: RunEventKind) {
        if let Some(buffer) = self.peer_buffers.get_mut(&key) {
            buffer.events.push(RunEvent::new(timestamp, kind, serde_json::Value::Null));
        }
    }

    async fn finalize_peer_session(&mut self, key: Uuid, discarded: bool) -> Result<()> {
        let Some(buffer) = self.peer_buffers.remove(&key) else {
            return Ok(());
        };
        if discarded {
            return Ok(());
        }
        if self.persistence.session_exists(key).await? {
            return Ok(());
        }

        let start = buffer.started_at;
        let end = buffer.ended_at.unwrap_or(start);
        let distance_miles = buffer.metrics.last().map(|m| m.distance_miles).unwrap_or(0.0);
        let hrs: Vec<f64> = buffer.metrics.iter().filter_map(|m| m.heart_rate_bpm).collect();
        let average_hr_bpm = if hrs.is_empty() {
            None
        } else {
            Some(hrs.iter().sum::<f64>() / hrs.len() as f64)
        };

        let mut session = Session::new(key, start);
        session.end_time = Some(end);
        session.total_distance_miles = distance_miles;
        session.average_hr_bpm = average_hr_bpm;
        session.peer_workout_id = Some(key);
        session.sync_pending = false;

        self.persistence.save_session(&session).await?;

        let telemetry: Vec<TelemetryPoint> = buffer
            .metrics
            .iter()
            .map(|m| TelemetryPoint {
                timestamp: Utc
                    .timestamp_opt(m.timestamp as i64, 0)
                    .single()
                    .unwrap_or(start),
                heart_rate_bpm: m.heart_rate_bpm,
                pace_seconds_per_mile: m.pace_seconds_per_mile,
                distance_miles: m.distance_miles,
                cadence_spm: m.cadence_spm,
                grade_percent: m.grade_percent,
                kcal_per_min: None,
                hr_zone: None,
                fuel_remaining_grams: m.fuel_remaining_grams,
            })
            .collect();
        self.persistence.append_telemetry(key, &telemetry).await?;
        self.persistence.append_events(key, &buffer.events).await?;

        let snapshots: Vec<StateSnapshot> = buffer
            .events
            .iter()
            .map(|e| StateSnapshot {
                timestamp: e.timestamp,
                lifecycle: lifecycle_for_event(e.kind),
                elapsed_seconds: e.timestamp.signed_duration_since(start).num_seconds().max(0) as u64,
                sample: LiveRunMetrics {
                    timestamp: e.timestamp,
                    heart_rate_bpm: None,
                    pace_seconds_per_mile: None,
                    distance_miles,
                    cadence_spm: None,
                    grade_percent: None,
                    kcal_per_min: None,
                    hr_zone: None,
                },
            })
            .collect();
        self.persistence.append_snapshots(key, &snapshots).await?;

        self.auto_complete_training_session(distance_miles).await;

        Ok(())
    }

    async fn auto_complete_training_session(&self, distance_miles: f64) {
        let Some(plan_id) = self.active_training_plan else {
            return;
        };
        let Ok(Some(plan)) = self.persistence.load_training_plan(plan_id).await else {
            return;
        };
        let today = Utc::now().date_naive();
        for session_id in &plan.session_ids {
            if let Ok(Some(mut training_session)) = self.persistence.load_training_session(*session_id).await {
                if training_session.scheduled_date == today && !training_session.completed {
                    training_session.completed = true;
                    training_session.distance_miles = Some(distance_miles);
                    training_session.effort = Some(DEFAULT_EFFORT);
                    let _ = self.persistence.save_training_session(&training_session).await;
                    break;
                }
            }
        }
    }
}

fn lifecycle_for_event(kind: RunEventKind) -> LifecycleState {
    match kind {
        RunEventKind::Started | RunEventKind::Resumed | RunEventKind::MetricReceived => LifecycleState::Running,
        RunEventKind::Paused => LifecycleState::Paused,
        RunEventKind::Ended => LifecycleState::Ended,
        RunEventKind::FuelLogged | RunEventKind::LapMarked | RunEventKind::AlertAcknowledged | RunEventKind::PaceAdjustment => {
            LifecycleState::Running
        }
    }
}
