//! Adaptive Engine: the 1 Hz orchestrator. Owns the readiness baseline,
//! the fueling engine, the rolling sample window, and last-split/last-alert
//! state, and fuses them into a `Decision` once per tick.
//!
//! Synchronous and side-effect-free: per the concurrency model, the async
//! boundary around this type is owned by its caller (the Run Session
//! Manager), not by this crate.

use std::collections::HashSet;

use adaptive_run_core::config::EngineConfig;
use adaptive_run_core::types::{
    AlertKind, Decision, FuelingSeverity, LiveRunMetrics, ReadinessBaseline,
};
use tracing::debug;

use crate::drift::{self, SampleWindow};
use crate::fueling::FuelingEngine;
use crate::readiness;

pub struct AdaptiveEngine {
    config: EngineConfig,
    baseline: ReadinessBaseline,
    fueling: FuelingEngine,
    window: SampleWindow,
    last_split_mile: i64,
    last_alert: Option<AlertKind>,
    active_alerts: HashSet<AlertKind>,
    last_tick_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl AdaptiveEngine {
    pub fn new(baseline: ReadinessBaseline, weight_kg: f64, config: EngineConfig) -> Self {
        Self {
            window: SampleWindow::new(config.drift.window_size, config.drift.pace_average_window),
            fueling: FuelingEngine::new(weight_kg, config.fueling),
            last_split_mile: 0,
            last_alert: None,
            active_alerts: HashSet::new(),
            last_tick_at: None,
            baseline,
            config,
        }
    }

    pub fn update_baseline(&mut self, baseline: ReadinessBaseline) {
        self.baseline = baseline;
    }

    pub fn last_alert(&self) -> Option<AlertKind> {
        self.last_alert
    }

    pub fn fueling_status(&self) -> adaptive_run_core::types::FuelingStatus {
        self.fueling.status()
    }

    pub fn log_gel(&mut self, grams: Option<f64>) {
        self.fueling.log_gel(grams);
    }

    /// Run the nine-step fusion algorithm for one tick's worth of metrics.
    pub fn ingest(&mut self, metrics: LiveRunMetrics) -> Decision {
        // 1. Append metrics; the window truncates itself to capacity.
        self.window.push(&metrics);

        // 2. Evaluate readiness -- the baseline may have changed since the
        // last tick via `update_baseline`.
        let readiness = readiness::evaluate(&self.baseline);

        // The cold-start tick has no previous tick to measure an interval
        // against; treat it as a single 1-minute tick rather than zero so
        // the first tick's calorie rate still depletes the reserve.
        let elapsed_minutes = self
            .last_tick_at
            .map(|last| (metrics.timestamp - last).num_milliseconds() as f64 / 60_000.0)
            .unwrap_or(1.0)
            .max(0.0);
        self.last_tick_at = Some(metrics.timestamp);

        // 3. Deplete fuel if we have a calorie rate this tick, else just
        // read back the current status.
        if let Some(kcal_per_min) = metrics.kcal_per_min {
            self.fueling
                .ingest(kcal_per_min, metrics.hr_zone.unwrap_or(1), elapsed_minutes);
        }
        let fueling_status = self.fueling.status();

        // 4. Cardiac drift slope over the rolling window.
        let drift_slope = self.window.drift_slope_per_min();

        // 5. Build the alert list in spec order, then suppress everything
        // except genuinely new transitions (split is handled separately
        // below since it re-fires on every whole-mile crossing by design).
        let pace = metrics.pace_seconds_per_mile.unwrap_or(0.0);
        let zone = metrics.hr_zone.unwrap_or(0);
        let moving_average_pace = self.window.moving_average_pace();

        let mut candidate_alerts = Vec::new();
        match fueling_status.severity {
            FuelingSeverity::Critical => candidate_alerts.push(AlertKind::FuelCritical),
            FuelingSeverity::Warning => candidate_alerts.push(AlertKind::FuelWarning),
            FuelingSeverity::Nominal => {}
        }
        if zone >= 4 && pace > 0.0 {
            candidate_alerts.push(AlertKind::HighHeartRate);
        }
        if drift_slope > self.config.drift.cardiac_drift_threshold_per_min && zone >= 3 {
            candidate_alerts.push(AlertKind::CardiacDrift);
        }
        if pace > 0.0
            && drift::pace_variance_alert(
                pace,
                moving_average_pace,
                self.config.drift.pace_variance_threshold,
            )
        {
            candidate_alerts.push(AlertKind::PaceVariance);
        }

        let mut alerts = Vec::new();
        for kind in &candidate_alerts {
            if !self.active_alerts.contains(kind) {
                alerts.push(*kind);
            }
        }
        self.active_alerts = candidate_alerts.into_iter().collect();

        let split_mile = metrics.distance_miles.floor() as i64;
        if split_mile > self.last_split_mile {
            self.last_split_mile = split_mile;
            alerts.push(AlertKind::Split);
        }

        self.last_alert = alerts.first().copied();
        if let Some(alert) = self.last_alert {
            debug!(?alert, "adaptive engine raised alert");
        }

        Decision {
            timestamp: metrics.timestamp,
            fatigue_coefficient: readiness.coefficient,
            pace_adjustment_percent: readiness.pace_adjustment_percent,
            fueling: fueling_status,
            drift_slope_per_min: drift_slope,
            alerts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use adaptive_run_core::types::TrainingStyle;
    use chrono::{Duration as ChronoDuration, Utc};

    fn baseline() -> ReadinessBaseline {
        ReadinessBaseline::for_style(TrainingStyle::Base, 100.0, 100.0)
    }

    fn metrics(
        t: chrono::DateTime<chrono::Utc>,
        distance: f64,
        hr: Option<f64>,
        pace: Option<f64>,
        kcal: Option<f64>,
        zone: Option<u8>,
    ) -> LiveRunMetrics {
        LiveRunMetrics {
            timestamp: t,
            heart_rate_bpm: hr,
            pace_seconds_per_mile: pace,
            distance_miles: distance,
            cadence_spm: None,
            grade_percent: None,
            kcal_per_min: kcal,
            hr_zone: zone,
        }
    }

    #[test]
    fn cold_start_one_tick_matches_worked_example() {
        let mut engine = AdaptiveEngine::new(baseline(), 70.0, EngineConfig::default());
        let now = Utc::now();
        let decision = engine.ingest(metrics(now, 0.001, Some(150.0), None, Some(12.0), Some(3)));

        assert_eq!(decision.fatigue_coefficient, 1.0);
        assert_eq!(decision.pace_adjustment_percent, 0);
        assert!(decision.alerts.is_empty());
        // Cold start treats the first tick as a 1-minute interval, so the
        // zone-3 carb burn at 12 kcal/min still applies: 420 - (12*0.60)/4.
        assert!((decision.fueling.remaining_grams - 418.2).abs() < 1e-9);
    }

    #[test]
    fn split_fires_once_per_whole_mile_crossing() {
        let mut engine = AdaptiveEngine::new(baseline(), 70.0, EngineConfig::default());
        let now = Utc::now();
        let distances = [0.95, 0.99, 1.01, 1.50, 2.00];
        let mut split_ticks = Vec::new();

        for (i, distance) in distances.iter().enumerate() {
            let t = now + ChronoDuration::seconds(i as i64);
            let decision = engine.ingest(metrics(t, *distance, None, None, None, None));
            if decision.alerts.contains(&AlertKind::Split) {
                split_ticks.push(*distance);
            }
        }

        assert_eq!(split_ticks, vec![1.01, 2.00]);
    }

    #[test]
    fn fuel_warning_fires_once_per_transition() {
        let mut engine = AdaptiveEngine::new(baseline(), 70.0, EngineConfig::default());
        let now = Utc::now();

        // Drain the reserve down near the warning boundary across several
        // ticks so the transition, not just the level, is what's observed.
        let mut t = now;
        let mut last_decision = None;
        for _ in 0..40 {
            t += ChronoDuration::seconds(60);
            last_decision = Some(engine.ingest(metrics(t, 0.0, Some(150.0), None, Some(120.0), Some(5))));
            if last_decision.as_ref().unwrap().fueling.remaining_grams <= 35.0 {
                break;
            }
        }
        let warning_decision = last_decision.unwrap();
        assert!(warning_decision.alerts.contains(&AlertKind::FuelWarning));

        t += ChronoDuration::seconds(60);
        let next_decision = engine.ingest(metrics(t, 0.0, Some(150.0), None, Some(120.0), Some(5)));
        assert!(!next_decision.alerts.contains(&AlertKind::FuelWarning));
    }

    #[test]
    fn high_heart_rate_requires_zone_and_positive_pace() {
        let mut engine = AdaptiveEngine::new(baseline(), 70.0, EngineConfig::default());
        let now = Utc::now();
        let decision = engine.ingest(metrics(now, 0.1, Some(180.0), Some(400.0), None, Some(4)));
        assert!(decision.alerts.contains(&AlertKind::HighHeartRate));

        let mut engine2 = AdaptiveEngine::new(baseline(), 70.0, EngineConfig::default());
        let decision2 = engine2.ingest(metrics(now, 0.1, Some(180.0), None, None, Some(4)));
        assert!(!decision2.alerts.contains(&AlertKind::HighHeartRate));
    }
}
