//! # Adaptive Run Core
//!
//! Shared domain types, the error taxonomy, outbound change-notification
//! events, collaborator trait boundaries, and configuration for the
//! adaptive run engine. Every other workspace crate depends on this one;
//! it depends on nothing in the workspace.
//!
//! ## Performance budget
//!
//! The adaptive engine's `ingest` (in `adaptive-run-engine`) targets a 1 Hz
//! decision cadence with <=15 ms of work per tick. Types in this crate are
//! plain data -- no locking, no I/O -- so they contribute negligible
//! overhead to that budget.

pub mod config;
pub mod error;
pub mod events;
pub mod traits;
pub mod types;

pub use config::EngineConfig;
pub use error::{EngineError, Result};
pub use events::{NullEventSink, SessionEvent, SessionEventSink};
pub use traits::*;
pub use types::*;
