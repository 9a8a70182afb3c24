//! # Adaptive Run Platform
//!
//! Host/device capability concerns that don't belong in the pure decision
//! logic: currently just the Thermal Governor. Kept as its own crate so a
//! real device target can swap in a true platform API behind the same
//! `ThermalObserver` trait without touching the engine or session crates.

pub mod thermal;

pub use thermal::{DegradationMode, HeuristicThermalObserver, ThermalGovernor, ThermalObserver, ThermalReading};
