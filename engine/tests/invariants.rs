//! Property-based checks for the bounds the rest of the workspace relies
//! on: the glycogen reserve never leaves `[0, 500]`, the fatigue
//! coefficient never leaves `[0.4, 2.0]`, the pace-adjustment percent is
//! always one of the four discrete values, and a mile split never fires
//! on a non-increasing distance.

use adaptive_run_core::config::{EngineConfig, FuelingConfig};
use adaptive_run_core::types::{AlertKind, LiveRunMetrics, ReadinessBaseline, TrainingStyle};
use adaptive_run_engine::adaptive::AdaptiveEngine;
use adaptive_run_engine::fueling::FuelingEngine;
use adaptive_run_engine::readiness;
use chrono::{Duration as ChronoDuration, Utc};
use proptest::prelude::*;

fn metrics_at(
    t: chrono::DateTime<chrono::Utc>,
    distance: f64,
    zone: Option<u8>,
    kcal: Option<f64>,
) -> LiveRunMetrics {
    LiveRunMetrics {
        timestamp: t,
        heart_rate_bpm: None,
        pace_seconds_per_mile: None,
        distance_miles: distance,
        cadence_spm: None,
        grade_percent: None,
        kcal_per_min: kcal,
        hr_zone: zone,
    }
}

proptest! {
    #[test]
    fn fueling_reserve_stays_in_bounds(
        weight_kg in 30.0_f64..160.0,
        ops in proptest::collection::vec(
            (any::<bool>(), 0.0_f64..600.0, 0_u8..6, 0.0_f64..30.0),
            0..50,
        ),
    ) {
        let mut engine = FuelingEngine::new(weight_kg, FuelingConfig::default());
        for (is_gel, amount, zone, minutes) in ops {
            if is_gel {
                engine.log_gel(Some(amount));
            } else {
                engine.ingest(amount, zone, minutes);
            }
            let remaining = engine.status().remaining_grams;
            prop_assert!((0.0..=500.0).contains(&remaining), "remaining out of bounds: {remaining}");
        }
    }

    #[test]
    fn log_fuel_matches_clamped_formula(
        weight_kg in 30.0_f64..160.0,
        grams in -50.0_f64..80.0,
    ) {
        // `log_gel` itself only applies the 500g ceiling; the [15, 40]
        // clamp on the logged amount is the Run Session Manager's
        // responsibility (`RunSessionManager::log_fuel`), so this checks
        // the formula at that boundary: clamp first, then add and cap.
        let mut engine = FuelingEngine::new(weight_kg, FuelingConfig::default());
        let before = engine.status().remaining_grams;
        let clamped_grams = grams.clamp(15.0, 40.0);
        engine.log_gel(Some(clamped_grams));
        let after = engine.status().remaining_grams;
        let expected = (before + clamped_grams).min(500.0);
        prop_assert!((after - expected).abs() < 1e-9);
    }

    #[test]
    fn fatigue_coefficient_stays_in_bounds(
        acute in 0.0_f64..1000.0,
        chronic in 0.0_f64..1000.0,
        rhr in -50.0_f64..50.0,
        hrv in -50.0_f64..50.0,
    ) {
        let baseline = ReadinessBaseline {
            acute_load: acute,
            chronic_load: chronic,
            resting_hr_delta: rhr,
            hrv_delta_percent: hrv,
        };
        let result = readiness::evaluate(&baseline);
        prop_assert!(result.coefficient.is_finite());
        prop_assert!((0.4..=2.0).contains(&result.coefficient));
        prop_assert!(matches!(result.pace_adjustment_percent, -5 | -2 | 0 | 1));
    }

    #[test]
    fn split_never_fires_on_non_increasing_distance(
        distances in proptest::collection::vec(0.0_f64..5.0, 1..30),
    ) {
        let baseline = ReadinessBaseline::for_style(TrainingStyle::Base, 100.0, 100.0);
        let mut engine = AdaptiveEngine::new(baseline, 70.0, EngineConfig::default());
        let now = Utc::now();
        let mut last_distance = f64::MIN;
        let mut last_split_mile = 0_i64;

        for (i, distance) in distances.iter().enumerate() {
            let t = now + ChronoDuration::seconds(i as i64);
            let decision = engine.ingest(metrics_at(t, *distance, Some(2), Some(8.0)));
            let fired = decision.alerts.contains(&AlertKind::Split);

            if *distance <= last_distance {
                prop_assert!(!fired, "split fired on non-increasing distance {distance} after {last_distance}");
            }

            let mile = distance.floor() as i64;
            if fired {
                prop_assert!(mile > last_split_mile, "split fired without crossing a new whole mile");
                last_split_mile = mile;
            }
            last_distance = *distance;
        }
    }
}
