//! Thermal Governor: observes the host's thermal class and publishes a
//! degradation mode. No true silicon thermal API exists in safe, portable
//! Rust, so the governor is built around a trait boundary -- real hosts
//! plug in whatever heuristic or platform API they have; this crate ships
//! a CPU/battery-based heuristic and a test double.

use serde::{Deserialize, Serialize};

/// A coarse reading of host thermal pressure. Implementors decide how to
/// derive this (CPU utilization trend, battery drain rate, OS thermal
/// state API, etc.) -- the governor only consumes the result.
pub trait ThermalObserver: Send + Sync {
    fn sample(&mut self) -> ThermalReading;
}

impl ThermalObserver for Box<dyn ThermalObserver> {
    fn sample(&mut self) -> ThermalReading {
        (**self).sample()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThermalReading {
    pub cpu_utilization_percent: f64,
    pub battery_percent: Option<f64>,
    pub is_charging: bool,
}

/// Degradation mode published once per tick. Carries the concrete knobs a
/// caller should apply rather than a bare severity label, so nothing
/// downstream needs its own copy of the mode -> settings table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DegradationMode {
    Nominal,
    Fair,
    Serious,
    Critical,
}

impl DegradationMode {
    pub fn motion_sample_rate_hz(&self) -> u32 {
        match self {
            DegradationMode::Nominal => 50,
            DegradationMode::Fair => 40,
            DegradationMode::Serious => 25,
            DegradationMode::Critical => 15,
        }
    }

    pub fn voice_enabled(&self) -> bool {
        matches!(self, DegradationMode::Nominal | DegradationMode::Fair)
    }

    pub fn animations_enabled(&self) -> bool {
        !matches!(self, DegradationMode::Critical)
    }
}

const FAIR_CPU_THRESHOLD: f64 = 70.0;
const SERIOUS_CPU_THRESHOLD: f64 = 85.0;
const CRITICAL_CPU_THRESHOLD: f64 = 95.0;
const LOW_BATTERY_UNCHARGED_PERCENT: f64 = 15.0;

/// Drives a `ThermalObserver` and turns its readings into a degradation
/// mode. Changes take effect on the caller's next tick -- this type holds
/// no hysteresis of its own.
pub struct ThermalGovernor<O: ThermalObserver> {
    observer: O,
}

impl<O: ThermalObserver> ThermalGovernor<O> {
    pub fn new(observer: O) -> Self {
        Self { observer }
    }

    pub fn sample(&mut self) -> DegradationMode {
        let reading = self.observer.sample();
        classify(reading)
    }
}

fn classify(reading: ThermalReading) -> DegradationMode {
    let low_battery_unplugged = !reading.is_charging
        && reading
            .battery_percent
            .map(|pct| pct < LOW_BATTERY_UNCHARGED_PERCENT)
            .unwrap_or(false);

    if reading.cpu_utilization_percent >= CRITICAL_CPU_THRESHOLD || low_battery_unplugged {
        DegradationMode::Critical
    } else if reading.cpu_utilization_percent >= SERIOUS_CPU_THRESHOLD {
        DegradationMode::Serious
    } else if reading.cpu_utilization_percent >= FAIR_CPU_THRESHOLD {
        DegradationMode::Fair
    } else {
        DegradationMode::Nominal
    }
}

/// Heuristic observer for real hosts: a rolling average of CPU utilization
/// samples fed in by the caller (the session executor already polls process
/// stats for its own logging, so this avoids a second polling source).
pub struct HeuristicThermalObserver {
    recent_cpu_percent: Vec<f64>,
    window: usize,
    battery_percent: Option<f64>,
    is_charging: bool,
}

impl HeuristicThermalObserver {
    pub fn new(window: usize) -> Self {
        Self {
            recent_cpu_percent: Vec::with_capacity(window),
            window: window.max(1),
            battery_percent: None,
            is_charging: true,
        }
    }

    pub fn record_cpu_sample(&mut self, percent: f64) {
        self.recent_cpu_percent.push(percent);
        if self.recent_cpu_percent.len() > self.window {
            self.recent_cpu_percent.remove(0);
        }
    }

    pub fn record_battery(&mut self, percent: f64, is_charging: bool) {
        self.battery_percent = Some(percent);
        self.is_charging = is_charging;
    }
}

impl ThermalObserver for HeuristicThermalObserver {
    fn sample(&mut self) -> ThermalReading {
        let cpu_utilization_percent = if self.recent_cpu_percent.is_empty() {
            0.0
        } else {
            self.recent_cpu_percent.iter().sum::<f64>() / self.recent_cpu_percent.len() as f64
        };

        ThermalReading {
            cpu_utilization_percent,
            battery_percent: self.battery_percent,
            is_charging: self.is_charging,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedObserver(ThermalReading);
    impl ThermalObserver for FixedObserver {
        fn sample(&mut self) -> ThermalReading {
            self.0
        }
    }

    fn reading(cpu: f64, battery: Option<f64>, charging: bool) -> ThermalReading {
        ThermalReading {
            cpu_utilization_percent: cpu,
            battery_percent: battery,
            is_charging: charging,
        }
    }

    #[test]
    fn nominal_mode_enables_voice_and_animations() {
        let mut governor = ThermalGovernor::new(FixedObserver(reading(10.0, Some(80.0), true)));
        let mode = governor.sample();
        assert_eq!(mode, DegradationMode::Nominal);
        assert_eq!(mode.motion_sample_rate_hz(), 50);
        assert!(mode.voice_enabled());
        assert!(mode.animations_enabled());
    }

    #[test]
    fn critical_cpu_disables_voice_and_animations() {
        let mut governor = ThermalGovernor::new(FixedObserver(reading(97.0, Some(80.0), true)));
        let mode = governor.sample();
        assert_eq!(mode, DegradationMode::Critical);
        assert_eq!(mode.motion_sample_rate_hz(), 15);
        assert!(!mode.voice_enabled());
        assert!(!mode.animations_enabled());
    }

    #[test]
    fn low_battery_unplugged_forces_critical_regardless_of_cpu() {
        let mut governor = ThermalGovernor::new(FixedObserver(reading(5.0, Some(10.0), false)));
        assert_eq!(governor.sample(), DegradationMode::Critical);
    }

    #[test]
    fn low_battery_while_charging_does_not_force_critical() {
        let mut governor = ThermalGovernor::new(FixedObserver(reading(5.0, Some(10.0), true)));
        assert_eq!(governor.sample(), DegradationMode::Nominal);
    }

    #[test]
    fn fair_and_serious_thresholds_classify_correctly() {
        let mut fair = ThermalGovernor::new(FixedObserver(reading(75.0, None, true)));
        assert_eq!(fair.sample(), DegradationMode::Fair);

        let mut serious = ThermalGovernor::new(FixedObserver(reading(90.0, None, true)));
        assert_eq!(serious.sample(), DegradationMode::Serious);
    }

    #[test]
    fn heuristic_observer_averages_recorded_samples() {
        let mut observer = HeuristicThermalObserver::new(3);
        observer.record_cpu_sample(60.0);
        observer.record_cpu_sample(80.0);
        observer.record_cpu_sample(100.0);
        observer.record_cpu_sample(40.0); // pushes 60.0 out of the window
        let reading = observer.sample();
        assert!((reading.cpu_utilization_percent - (80.0 + 100.0 + 40.0) / 3.0).abs() < 1e-9);
    }
}
