//! Fueling Engine: tracks the simulated glycogen reserve. A serialized
//! struct -- its caller (the Adaptive Engine) already owns exclusive
//! access, so there is no internal locking here.

use adaptive_run_core::config::FuelingConfig;
use adaptive_run_core::types::{FuelingSeverity, FuelingStatus, HrZone};

const MIN_STARTING_RESERVE: f64 = 300.0;
const MAX_STARTING_RESERVE: f64 = 500.0;
const STARTING_RESERVE_PER_KG: f64 = 6.0;

fn carb_fraction(config: &FuelingConfig, zone: HrZone) -> f64 {
    let index = match zone {
        0 | 1 => 0,
        2 => 1,
        3 => 2,
        4 => 3,
        _ => 4,
    };
    config.carb_burn_rate_zone[index]
}

pub struct FuelingEngine {
    remaining_grams: f64,
    config: FuelingConfig,
}

impl FuelingEngine {
    /// `weight_kg` seeds the starting reserve: `clamp(weight_kg * 6.0, 300, 500)`.
    pub fn new(weight_kg: f64, config: FuelingConfig) -> Self {
        let remaining_grams = (weight_kg * STARTING_RESERVE_PER_KG)
            .clamp(MIN_STARTING_RESERVE, MAX_STARTING_RESERVE);
        Self {
            remaining_grams,
            config,
        }
    }

    /// Deplete the reserve by the zone-weighted carb burn for `kcal_per_min`,
    /// prorated by `elapsed_minutes` since the last ingest.
    pub fn ingest(&mut self, kcal_per_min: f64, zone: HrZone, elapsed_minutes: f64) {
        let grams_per_min = (kcal_per_min * carb_fraction(&self.config, zone)) / 4.0;
        let depletion = grams_per_min * elapsed_minutes.max(0.0);
        self.remaining_grams = (self.remaining_grams - depletion).max(0.0);
    }

    /// Add up to `grams` (default 25 when `None`) to the reserve, capped at
    /// the configured ceiling.
    pub fn log_gel(&mut self, grams: Option<f64>) {
        let amount = grams.unwrap_or(25.0);
        self.remaining_grams =
            (self.remaining_grams + amount).min(self.config.glycogen_ceiling_grams);
    }

    pub fn status(&self) -> FuelingStatus {
        let severity = if self.remaining_grams <= self.config.critical_threshold_grams {
            FuelingSeverity::Critical
        } else if self.remaining_grams <= self.config.warning_threshold_grams {
            FuelingSeverity::Warning
        } else {
            FuelingSeverity::Nominal
        };

        FuelingStatus {
            remaining_grams: self.remaining_grams,
            severity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starting_reserve_scales_with_weight_and_clamps() {
        let engine = FuelingEngine::new(70.0, FuelingConfig::default());
        assert_eq!(engine.status().remaining_grams, 420.0);

        let light = FuelingEngine::new(30.0, FuelingConfig::default());
        assert_eq!(light.status().remaining_grams, MIN_STARTING_RESERVE);

        let heavy = FuelingEngine::new(120.0, FuelingConfig::default());
        assert_eq!(heavy.status().remaining_grams, MAX_STARTING_RESERVE);
    }

    #[test]
    fn cold_start_one_tick_matches_worked_example() {
        let mut engine = FuelingEngine::new(70.0, FuelingConfig::default());
        engine.ingest(12.0, 3, 1.0);
        let status = engine.status();
        assert!((status.remaining_grams - 418.2).abs() < 1e-9);
        assert_eq!(status.severity, FuelingSeverity::Nominal);
    }

    #[test]
    fn log_gel_adds_default_amount_and_respects_ceiling() {
        let mut engine = FuelingEngine::new(70.0, FuelingConfig::default());
        engine.ingest(400.0, 5, 100.0);
        assert_eq!(engine.status().remaining_grams, 0.0);

        engine.log_gel(None);
        assert_eq!(engine.status().remaining_grams, 25.0);

        engine.log_gel(Some(1000.0));
        assert_eq!(engine.status().remaining_grams, 500.0);
    }

    #[test]
    fn severity_transitions_at_thresholds() {
        let mut engine = FuelingEngine::new(70.0, FuelingConfig::default());
        let starting = engine.status().remaining_grams;
        engine.log_gel(Some(35.0 - starting));
        assert_eq!(engine.status().severity, FuelingSeverity::Warning);

        engine.ingest(150.0, 1, 1.0);
        assert_eq!(engine.status().remaining_grams, 20.0);
        assert_eq!(engine.status().severity, FuelingSeverity::Critical);
    }

    #[test]
    fn never_goes_negative() {
        let mut engine = FuelingEngine::new(70.0, FuelingConfig::default());
        engine.ingest(1_000_000.0, 5, 1000.0);
        assert_eq!(engine.status().remaining_grams, 0.0);
    }
}
