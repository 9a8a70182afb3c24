//! # Adaptive Run Engine
//!
//! Pure, synchronous decision logic: the Readiness Estimator, Fueling
//! Engine, Biomechanical Analyzer, Drift & Pace Calculator, Coach Prompt
//! Engine, and the Adaptive Engine orchestrator that fuses them once per
//! tick. Nothing in this crate performs I/O or owns a runtime; the caller
//! (the session executor) is responsible for the async boundary.

pub mod adaptive;
pub mod biomechanics;
pub mod coach;
pub mod drift;
pub mod fueling;
pub mod readiness;

pub use adaptive::AdaptiveEngine;
pub use coach::CoachPromptEngine;
pub use fueling::FuelingEngine;
