//! External collaborator trait boundaries.
//!
//! The engine is specified against these interfaces only; concrete
//! device/OS implementations (Bluetooth peer links, CoreMotion-equivalent
//! sensor providers, on-disk stores) live outside this crate. The binary
//! crate wires test doubles sufficient to drive a full run end-to-end.
//!
//! **FROZEN CONTRACT**: these traits are the seams every other crate in the
//! workspace is built against. Changing a signature here is a breaking
//! change for every implementor.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::Result;
use crate::types::{
    HapticKind, LiveRunMetrics, MotionSample, RunEvent, Session, StateSnapshot, TelemetryPoint,
    TrainingPlan, TrainingSession, WidgetState,
};

// ============================================================================
// Telemetry Source
// ============================================================================

/// Push-based sensor provider. Implementations deliver samples from
/// whatever thread the underlying platform API calls back on; the Run
/// Session Manager makes no assumption about interleaving or ordering
/// across the two channels.
#[async_trait]
pub trait TelemetrySource: Send + Sync {
    /// Request authorization to start collecting. Resolves once the host
    /// platform has granted or refused access.
    async fn request_authorization(&self) -> Result<()>;

    /// Begin pushing `LiveRunMetrics` and `MotionSample` values to the
    /// returned sink until `stop` is called. Implementations are expected
    /// to call `TelemetrySink::on_metrics` / `on_motion` directly rather
    /// than polling.
    async fn start(&self, sink: Arc<dyn TelemetrySink>) -> Result<()>;

    /// Stop collection. Best-effort: a failure here still allows the
    /// session to finalize with whatever was already buffered.
    async fn stop(&self) -> Result<()>;
}

/// Callback surface a `TelemetrySource` pushes samples into.
pub trait TelemetrySink: Send + Sync {
    fn on_metrics(&self, metrics: LiveRunMetrics);
    fn on_motion(&self, sample: MotionSample);
}

// ============================================================================
// Persistence Store
// ============================================================================

/// CRUD + cascade delete for the durable entity set, plus a uniqueness
/// predicate by id. Implementations own their own atomicity story; callers
/// only need the `Result` to distinguish success from a retryable failure.
#[async_trait]
pub trait PersistenceStore: Send + Sync {
    async fn save_session(&self, session: &Session) -> Result<()>;
    async fn load_session(&self, id: Uuid) -> Result<Option<Session>>;
    async fn delete_session(&self, id: Uuid) -> Result<()>;
    async fn session_exists(&self, id: Uuid) -> Result<bool>;

    async fn append_telemetry(&self, session_id: Uuid, points: &[TelemetryPoint]) -> Result<()>;
    async fn append_events(&self, session_id: Uuid, events: &[RunEvent]) -> Result<()>;
    async fn append_snapshots(&self, session_id: Uuid, snapshots: &[StateSnapshot]) -> Result<()>;

    async fn load_training_plan(&self, id: Uuid) -> Result<Option<TrainingPlan>>;
    async fn load_training_session(&self, id: Uuid) -> Result<Option<TrainingSession>>;
    async fn save_training_session(&self, session: &TrainingSession) -> Result<()>;
}

// ============================================================================
// Peer Transport (Cross-Device Bridge)
// ============================================================================

/// Outbound peer messaging plus a read-only reachability observable.
/// Inbound delivery is modeled as a plain callback rather than a trait
/// method here, since the transport, not the core, owns the listening
/// loop; see `bridge::RunMessage` for the wire shape of `dict`.
#[async_trait]
pub trait PeerTransport: Send + Sync {
    /// Update the peer's lightweight application-context mirror. Fire-and-
    /// forget; failures are logged and otherwise ignored (`EngineError::TransportError`).
    async fn update_context(&self, dict: serde_json::Value) -> Result<()>;

    /// Send a discrete or throttled message to the peer.
    async fn send_message(&self, dict: serde_json::Value) -> Result<()>;

    /// Whether a peer is currently reachable.
    fn is_reachable(&self) -> bool;
}

// ============================================================================
// Coaching Sink
// ============================================================================

/// Audio/haptic output, subject to the Thermal Governor's degradation mode.
#[async_trait]
pub trait CoachingSink: Send + Sync {
    async fn speak(&self, text: &str) -> Result<()>;
    async fn haptic(&self, kind: HapticKind) -> Result<()>;
}

// ============================================================================
// Display State Publisher
// ============================================================================

/// Publishes the widget/complication-facing snapshot.
#[async_trait]
pub trait DisplayPublisher: Send + Sync {
    async fn publish(&self, state: WidgetState) -> Result<()>;
}

// ============================================================================
// Intent Relay
// ============================================================================

/// FIFO of pending wearer-initiated actions, drained at the start of every
/// tick. Deliberately non-async: draining happens synchronously inside the
/// session executor's tick, never awaited.
pub trait IntentRelay: Send + Sync {
    fn enqueue(&self, action: crate::types::IntentAction);
    fn drain(&self) -> Vec<crate::types::IntentAction>;
}

use std::sync::Arc;

/// An `IntentRelay` backed by a plain mutex-guarded `Vec`, sufficient for
/// the demo harness and for tests; production hosts are expected to supply
/// their own (e.g. backed by a platform action-queue API).
#[derive(Default)]
pub struct InMemoryIntentRelay {
    pending: parking_lot::Mutex<Vec<crate::types::IntentAction>>,
}

impl IntentRelay for InMemoryIntentRelay {
    fn enqueue(&self, action: crate::types::IntentAction) {
        self.pending.lock().push(action);
    }

    fn drain(&self) -> Vec<crate::types::IntentAction> {
        std::mem::take(&mut *self.pending.lock())
    }
}
