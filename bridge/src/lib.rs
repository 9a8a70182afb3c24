//! # Adaptive Run Bridge
//!
//! Peer wire protocol types and outbound throttling for the run-to-run
//! bridge. The `PeerTransport` collaborator trait itself
//! lives in `adaptive-run-core` since both this crate and `session` need
//! it; this crate owns the message shape and the throttling/encoding
//! logic that `session` drives.

pub mod outbound;
pub mod wire;

pub use outbound::OutboundThrottle;
pub use wire::{decode, encode, MetricSnapshotWire, RunMessage, RunMessageEvent};
