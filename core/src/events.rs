//! Outbound change-notification events for the Run Session Manager.
//!
//! The session exposes state to its host two ways: a pull API (`snapshot()`
//! returning a `WidgetState`) and this push channel. Consumers that only
//! care about "something changed" subscribe here instead of polling.
//!
//! **FROZEN CONTRACT**: this enum crosses the `session` -> host boundary and
//! must stay stable; add variants, don't repurpose existing ones.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{AlertKind, Decision, FuelingStatus, LifecycleState, WidgetState};

/// A single state-change notification emitted by the Run Session Manager.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SessionEvent {
    /// Lifecycle transitioned (e.g. `Idle` -> `Preparing`, `Running` <-> `Paused`).
    LifecycleChanged {
        from: LifecycleState,
        to: LifecycleState,
        timestamp: DateTime<Utc>,
    },

    /// A new `Decision` was produced by the adaptive engine this tick.
    DecisionReady {
        decision: Decision,
    },

    /// An alert newly entered the active set (as opposed to persisting
    /// across ticks).
    AlertRaised {
        alert: AlertKind,
        timestamp: DateTime<Utc>,
    },

    /// Fuel was logged by the wearer.
    FuelLogged {
        status: FuelingStatus,
        timestamp: DateTime<Utc>,
    },

    /// A lap boundary was marked, either by the wearer or by the mile-split
    /// logic in the adaptive engine.
    LapMarked {
        lap: u32,
        timestamp: DateTime<Utc>,
    },

    /// The widget-facing snapshot changed enough to be worth redrawing.
    WidgetUpdated {
        state: WidgetState,
    },
}

impl SessionEvent {
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            SessionEvent::LifecycleChanged { timestamp, .. } => *timestamp,
            SessionEvent::DecisionReady { decision } => decision.timestamp,
            SessionEvent::AlertRaised { timestamp, .. } => *timestamp,
            SessionEvent::FuelLogged { timestamp, .. } => *timestamp,
            SessionEvent::LapMarked { timestamp, .. } => *timestamp,
            SessionEvent::WidgetUpdated { state } => state.updated,
        }
    }
}

/// Sink for the outbound change channel. Implementations are expected to be
/// cheap and non-blocking (e.g. a `tokio::sync::broadcast` sender) -- this is
/// an in-process notification path, not a network boundary.
pub trait SessionEventSink: Send + Sync {
    fn notify(&self, event: SessionEvent);
}

/// A sink that drops everything. Useful as a default when no host is
/// listening (the demo harness and most tests).
#[derive(Debug, Default, Clone, Copy)]
pub struct NullEventSink;

impl SessionEventSink for NullEventSink {
    fn notify(&self, _event: SessionEvent) {}
}
