//! # Adaptive Run Session
//!
//! The Run Session Manager: lifecycle transitions, telemetry/event
//! buffering and flush policy, collaborator orchestration, and the
//! inbound peer-ingest rebuild path. This is the single-owner "session
//! executor" state machine the rest of the workspace is built around.

pub mod intent;
pub mod lifecycle;
pub mod manager;

pub use manager::{Collaborators, RunSessionManager};
