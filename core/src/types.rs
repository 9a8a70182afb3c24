//! Shared domain types for the adaptive run engine.
//!
//! These types are designed to be:
//! - Cheap to clone for cross-executor hand-off (engine -> session -> bridge)
//! - Serializable for persistence and the peer wire format
//! - Free of interior mutability -- ownership of mutable state lives with the
//!   component that is allowed to mutate it, not with these plain data
//!   carriers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// Lifecycle
// ============================================================================

/// Coarse run lifecycle state. Transitions are total-ordered and monotonic
/// except for `Running <-> Paused`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LifecycleState {
    Idle,
    Preparing,
    Running,
    Paused,
    Ended,
}

impl LifecycleState {
    /// Whether a durable session record must exist in this state.
    pub fn requires_session_record(&self) -> bool {
        matches!(
            self,
            LifecycleState::Preparing | LifecycleState::Running | LifecycleState::Paused
        )
    }
}

impl Default for LifecycleState {
    fn default() -> Self {
        LifecycleState::Idle
    }
}

/// Training style selected at run start; biases the acute-load term of the
/// readiness baseline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrainingStyle {
    Recovery,
    Base,
    Cross,
    Rest,
    Long,
    Tempo,
    Speed,
}

impl TrainingStyle {
    /// Acute-load bias applied when initializing a baseline for this style.
    pub fn acute_load_bias(&self) -> f64 {
        match self {
            TrainingStyle::Recovery => 0.92,
            TrainingStyle::Base | TrainingStyle::Cross | TrainingStyle::Rest => 1.0,
            TrainingStyle::Long => 1.08,
            TrainingStyle::Tempo | TrainingStyle::Speed => 1.16,
        }
    }
}

// ============================================================================
// Readiness
// ============================================================================

/// Readiness input, replaced wholesale via `update_baseline`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReadinessBaseline {
    pub acute_load: f64,
    pub chronic_load: f64,
    pub resting_hr_delta: f64,
    pub hrv_delta_percent: f64,
}

impl ReadinessBaseline {
    pub fn for_style(style: TrainingStyle, acute_load: f64, chronic_load: f64) -> Self {
        Self {
            acute_load: acute_load * style.acute_load_bias(),
            chronic_load,
            resting_hr_delta: 0.0,
            hrv_delta_percent: 0.0,
        }
    }
}

/// Output of the readiness estimator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReadinessResult {
    pub coefficient: f64,
    pub pace_adjustment_percent: i32,
}

// ============================================================================
// Telemetry
// ============================================================================

/// A single motion sample consumed by the biomechanical analyzer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MotionSample {
    pub vertical_accel: f64,
    pub lateral_accel: f64,
    pub timestamp: DateTime<Utc>,
}

/// Derived biomechanical metrics from a batch of motion samples.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BiomechanicalMetrics {
    pub vertical_oscillation_cm: f64,
    pub contact_balance_percent: f64,
    pub ground_contact_time_ms: f64,
    pub running_power_w: f64,
}

/// HR-zone classification, 1 (easiest) through 5 (hardest).
pub type HrZone = u8;

/// A live metrics sample ingested once per tick. All fields besides
/// timestamp and distance are optional; the engine degrades gracefully
/// when a field is absent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LiveRunMetrics {
    pub timestamp: DateTime<Utc>,
    pub heart_rate_bpm: Option<f64>,
    pub pace_seconds_per_mile: Option<f64>,
    pub distance_miles: f64,
    pub cadence_spm: Option<f64>,
    pub grade_percent: Option<f64>,
    pub kcal_per_min: Option<f64>,
    pub hr_zone: Option<HrZone>,
}

// ============================================================================
// Fueling
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FuelingSeverity {
    Nominal,
    Warning,
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FuelingStatus {
    pub remaining_grams: f64,
    pub severity: FuelingSeverity,
}

// ============================================================================
// Decisions & alerts
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    FuelWarning,
    FuelCritical,
    HighHeartRate,
    CardiacDrift,
    PaceVariance,
    Split,
}

/// Emitted once per tick by the adaptive engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub timestamp: DateTime<Utc>,
    pub fatigue_coefficient: f64,
    pub pace_adjustment_percent: i32,
    pub fueling: FuelingStatus,
    pub drift_slope_per_min: f64,
    pub alerts: Vec<AlertKind>,
}

impl Decision {
    pub fn first_alert(&self) -> Option<AlertKind> {
        self.alerts.first().copied()
    }
}

// ============================================================================
// Durable session record & children
// ============================================================================

/// Durable session record. Owns cascade-deleted collections of telemetry
/// points, run events, and state snapshots in the persistence store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: Uuid,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub total_energy_kcal: f64,
    pub total_distance_miles: f64,
    pub average_hr_bpm: Option<f64>,
    pub peer_workout_id: Option<Uuid>,
    pub post_run_effort: Option<u8>,
    pub post_run_reflection: Option<String>,
    pub sync_pending: bool,
}

impl Session {
    pub fn new(id: Uuid, start_time: DateTime<Utc>) -> Self {
        Self {
            id,
            start_time,
            end_time: None,
            total_energy_kcal: 0.0,
            total_distance_miles: 0.0,
            average_hr_bpm: None,
            peer_workout_id: None,
            post_run_effort: None,
            post_run_reflection: None,
            sync_pending: true,
        }
    }
}

/// Append-only telemetry point, ordered by timestamp within a session.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TelemetryPoint {
    pub timestamp: DateTime<Utc>,
    pub heart_rate_bpm: Option<f64>,
    pub pace_seconds_per_mile: Option<f64>,
    pub distance_miles: f64,
    pub cadence_spm: Option<f64>,
    pub grade_percent: Option<f64>,
    pub kcal_per_min: Option<f64>,
    pub hr_zone: Option<HrZone>,
    pub fuel_remaining_grams: Option<f64>,
}

impl From<LiveRunMetrics> for TelemetryPoint {
    fn from(m: LiveRunMetrics) -> Self {
        Self {
            timestamp: m.timestamp,
            heart_rate_bpm: m.heart_rate_bpm,
            pace_seconds_per_mile: m.pace_seconds_per_mile,
            distance_miles: m.distance_miles,
            cadence_spm: m.cadence_spm,
            grade_percent: m.grade_percent,
            kcal_per_min: m.kcal_per_min,
            hr_zone: m.hr_zone,
            fuel_remaining_grams: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunEventKind {
    Started,
    Paused,
    Resumed,
    Ended,
    FuelLogged,
    LapMarked,
    AlertAcknowledged,
    PaceAdjustment,
    /// Recorded only on the peer-ingest path: one per inbound
    /// `metric_snapshot` message, distinct from the `TelemetryPoint` it
    /// also produces, so the audit trail has exactly one event per
    /// received message.
    MetricReceived,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunEvent {
    pub timestamp: DateTime<Utc>,
    pub kind: RunEventKind,
    pub payload: serde_json::Value,
}

impl RunEvent {
    pub fn new(timestamp: DateTime<Utc>, kind: RunEventKind, payload: serde_json::Value) -> Self {
        Self {
            timestamp,
            kind,
            payload,
        }
    }
}

/// One per tick regardless of lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StateSnapshot {
    pub timestamp: DateTime<Utc>,
    pub lifecycle: LifecycleState,
    pub elapsed_seconds: u64,
    pub sample: LiveRunMetrics,
}

// ============================================================================
// Training plan (race-training auto-completion on peer ingest)
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingPlan {
    pub id: Uuid,
    pub session_ids: Vec<Uuid>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingSession {
    pub id: Uuid,
    pub plan_id: Uuid,
    pub scheduled_date: chrono::NaiveDate,
    pub completed: bool,
    pub distance_miles: Option<f64>,
    pub effort: Option<u8>,
}

// ============================================================================
// Display & coaching
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WidgetState {
    pub updated: DateTime<Utc>,
    pub lifecycle: LifecycleState,
    pub elapsed_seconds: u64,
    pub distance_miles: f64,
    pub heart_rate_bpm: Option<f64>,
    pub pace_seconds_per_mile: Option<f64>,
    pub fuel_remaining_grams: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HapticKind {
    Click,
    Notification,
    Retry,
    Failure,
    Success,
}

// ============================================================================
// Intent relay
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum IntentAction {
    StartRun { style: TrainingStyle, indoor: bool },
    LogFuel { grams: Option<f64> },
    MarkLap,
    DismissAlert,
    ToggleMetrics,
}
