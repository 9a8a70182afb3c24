//! Error taxonomy for the adaptive run engine.
//!
//! Each variant documents the recovery behavior mandated at its call site --
//! most of these are nonfatal by design, and callers are expected to match
//! on the variant rather than treat every `Err` as session-ending.

use thiserror::Error;

/// Top-level error type for the adaptive run engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Health/motion authorization refused by the host platform. The run
    /// session falls back to `LifecycleState::Idle`; the message is
    /// surfaced as a last-error string to the caller.
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// The telemetry source refused to start collection. Surfaced to the
    /// caller; lifecycle returns to `Idle`.
    #[error("session start failed: {0}")]
    SessionStartFailed(String),

    /// Ending telemetry collection failed partway through. Lifecycle still
    /// advances to `Ended` and the durable record is finalized with
    /// best-effort fields; `peer_workout_id` is left unset.
    #[error("session finalize failed: {0}")]
    SessionFinalizeFailed(String),

    /// Nonfatal persistence failure. Logged and the pending buffer is kept
    /// around for retry at the next flush boundary.
    #[error("persistence error: {0}")]
    PersistenceError(String),

    /// Nonfatal peer transport failure. The caller silently drops the
    /// outbound message; the latest state snapshot is enough to recover
    /// application context on the peer.
    #[error("transport error: {0}")]
    TransportError(String),

    /// An inbound peer message failed to decode. The message is dropped;
    /// the per-run-id ingest buffer it would have updated is unaffected.
    #[error("protocol error: {0}")]
    ProtocolError(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("config error: {0}")]
    Config(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn persistence_error_message_roundtrips() {
        let err = EngineError::PersistenceError("disk full".to_string());
        assert_eq!(err.to_string(), "persistence error: disk full");
    }

    #[test]
    fn io_error_converts_via_from() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing file");
        let engine_err: EngineError = io_err.into();
        assert!(matches!(engine_err, EngineError::Io(_)));
    }
}
