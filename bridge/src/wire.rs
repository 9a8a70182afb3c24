//! Peer wire dictionary -- the bit-compatible contract shared with the
//! paired device. Modeled as a typed struct with
//! `#[serde(default)]`/`skip_serializing_if` rather
//! than a loose map: unknown keys are still ignored on ingest (serde's
//! default behavior for a struct without `deny_unknown_fields`), and every
//! key name matches the transport exactly.

use adaptive_run_core::types::{LifecycleState, TelemetryPoint};
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunMessageEvent {
    RunStarted,
    RunPaused,
    RunResumed,
    RunEnded,
    MetricSnapshot,
    FuelLogged,
    LapMarked,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricSnapshotWire {
    pub timestamp: f64,
    #[serde(rename = "distanceMiles")]
    pub distance_miles: f64,
    #[serde(rename = "heartRateBPM", skip_serializing_if = "Option::is_none")]
    pub heart_rate_bpm: Option<f64>,
    #[serde(rename = "paceSecondsPerMile", skip_serializing_if = "Option::is_none")]
    pub pace_seconds_per_mile: Option<f64>,
    #[serde(rename = "cadenceSPM", skip_serializing_if = "Option::is_none")]
    pub cadence_spm: Option<f64>,
    #[serde(rename = "gradePercent", skip_serializing_if = "Option::is_none")]
    pub grade_percent: Option<f64>,
    #[serde(rename = "fuelRemainingGrams", skip_serializing_if = "Option::is_none")]
    pub fuel_remaining_grams: Option<f64>,
}

impl From<&TelemetryPoint> for MetricSnapshotWire {
    fn from(point: &TelemetryPoint) -> Self {
        Self {
            timestamp: point.timestamp.timestamp() as f64,
            distance_miles: point.distance_miles,
            heart_rate_bpm: point.heart_rate_bpm,
            pace_seconds_per_mile: point.pace_seconds_per_mile,
            cadence_spm: point.cadence_spm,
            grade_percent: point.grade_percent,
            fuel_remaining_grams: point.fuel_remaining_grams,
        }
    }
}

/// A single message exchanged over the peer transport. Top-level keys
/// match the device's transport dictionary exactly; absent optionals are
/// omitted on encode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunMessage {
    pub event: RunMessageEvent,
    #[serde(rename = "runId", skip_serializing_if = "Option::is_none")]
    pub run_id: Option<Uuid>,
    #[serde(rename = "lifecycleState", skip_serializing_if = "Option::is_none")]
    pub lifecycle_state: Option<LifecycleState>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<f64>,
    #[serde(rename = "heartRate", skip_serializing_if = "Option::is_none")]
    pub heart_rate: Option<f64>,
    #[serde(rename = "carbsGrams", skip_serializing_if = "Option::is_none")]
    pub carbs_grams: Option<f64>,
    #[serde(rename = "lapIndex", skip_serializing_if = "Option::is_none")]
    pub lap_index: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discarded: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metric: Option<MetricSnapshotWire>,
}

impl Default for RunMessage {
    fn default() -> Self {
        Self {
            event: RunMessageEvent::MetricSnapshot,
            run_id: None,
            lifecycle_state: None,
            timestamp: None,
            heart_rate: None,
            carbs_grams: None,
            lap_index: None,
            discarded: None,
            metric: None,
        }
    }
}

impl RunMessage {
    pub fn lifecycle(event: RunMessageEvent, run_id: Uuid, state: LifecycleState, at: DateTime<Utc>) -> Self {
        Self {
            event,
            run_id: Some(run_id),
            lifecycle_state: Some(state),
            timestamp: Some(at.timestamp() as f64),
            ..Default::default()
        }
    }

    pub fn metric_snapshot(run_id: Uuid, metric: MetricSnapshotWire) -> Self {
        Self {
            event: RunMessageEvent::MetricSnapshot,
            run_id: Some(run_id),
            timestamp: Some(metric.timestamp),
            metric: Some(metric),
            ..Default::default()
        }
    }

    pub fn fuel_logged(run_id: Uuid, carbs_grams: f64, at: DateTime<Utc>) -> Self {
        Self {
            event: RunMessageEvent::FuelLogged,
            run_id: Some(run_id),
            carbs_grams: Some(carbs_grams),
            timestamp: Some(at.timestamp() as f64),
            ..Default::default()
        }
    }

    pub fn lap_marked(run_id: Uuid, lap_index: i64, at: DateTime<Utc>) -> Self {
        Self {
            event: RunMessageEvent::LapMarked,
            run_id: Some(run_id),
            lap_index: Some(lap_index),
            timestamp: Some(at.timestamp() as f64),
            ..Default::default()
        }
    }

    pub fn run_ended(run_id: Uuid, at: DateTime<Utc>, discarded: bool) -> Self {
        Self {
            event: RunMessageEvent::RunEnded,
            run_id: Some(run_id),
            lifecycle_state: Some(LifecycleState::Ended),
            timestamp: Some(at.timestamp() as f64),
            discarded: Some(discarded),
            ..Default::default()
        }
    }

    pub fn timestamp_as_datetime(&self) -> Option<DateTime<Utc>> {
        self.timestamp
            .and_then(|secs| Utc.timestamp_opt(secs as i64, 0).single())
    }
}

pub fn encode(message: &RunMessage) -> serde_json::Value {
    serde_json::to_value(message).unwrap_or(serde_json::Value::Null)
}

pub fn decode(value: serde_json::Value) -> Result<RunMessage, serde_json::Error> {
    serde_json::from_value(value)
}
