//! Drift & Pace Calculator. Implemented as a bounded rolling window owned
//! by the Adaptive Engine (not a standalone type with its own mutex -- the
//! window is exclusively the engine's).

use std::collections::VecDeque;

use adaptive_run_core::types::LiveRunMetrics;
use chrono::{DateTime, Utc};

const MIN_DRIFT_POINTS: usize = 15;

#[derive(Debug, Clone, Copy)]
struct WindowEntry {
    timestamp: DateTime<Utc>,
    heart_rate_bpm: Option<f64>,
    pace_seconds_per_mile: Option<f64>,
}

impl From<&LiveRunMetrics> for WindowEntry {
    fn from(m: &LiveRunMetrics) -> Self {
        Self {
            timestamp: m.timestamp,
            heart_rate_bpm: m.heart_rate_bpm,
            pace_seconds_per_mile: m.pace_seconds_per_mile,
        }
    }
}

/// Rolling window of recent live-metrics samples, bounded to `capacity`
/// entries (drop-oldest on overflow).
pub struct SampleWindow {
    entries: VecDeque<WindowEntry>,
    capacity: usize,
    pace_average_window: usize,
}

impl SampleWindow {
    pub fn new(capacity: usize, pace_average_window: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
            pace_average_window,
        }
    }

    pub fn push(&mut self, metrics: &LiveRunMetrics) {
        self.entries.push_back(WindowEntry::from(metrics));
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// OLS slope of HR/pace ratio against minutes since the window's first
    /// entry. Requires both HR and pace present on a sample for it to
    /// contribute a point; returns 0 below `MIN_DRIFT_POINTS` usable points.
    pub fn drift_slope_per_min(&self) -> f64 {
        let Some(window_start) = self.entries.front().map(|e| e.timestamp) else {
            return 0.0;
        };

        let points: Vec<(f64, f64)> = self
            .entries
            .iter()
            .filter_map(|entry| {
                let hr = entry.heart_rate_bpm?;
                let pace = entry.pace_seconds_per_mile?;
                if pace <= 0.0 {
                    return None;
                }
                let minutes = entry
                    .timestamp
                    .signed_duration_since(window_start)
                    .num_milliseconds() as f64
                    / 60_000.0;
                Some((minutes, hr / pace))
            })
            .collect();

        if points.len() < MIN_DRIFT_POINTS {
            return 0.0;
        }

        ols_slope(&points)
    }

    /// Arithmetic mean of the last `pace_average_window` present pace
    /// values.
    pub fn moving_average_pace(&self) -> f64 {
        let paces: Vec<f64> = self
            .entries
            .iter()
            .rev()
            .filter_map(|e| e.pace_seconds_per_mile)
            .take(self.pace_average_window)
            .collect();

        if paces.is_empty() {
            0.0
        } else {
            paces.iter().sum::<f64>() / paces.len() as f64
        }
    }
}

/// Whether the current pace deviates from the moving average by at least
/// `threshold` (fractional, e.g. 0.05 for 5%).
pub fn pace_variance_alert(current_pace: f64, moving_average_pace: f64, threshold: f64) -> bool {
    if moving_average_pace <= 0.0 {
        return false;
    }
    ((current_pace - moving_average_pace) / moving_average_pace).abs() >= threshold
}

fn ols_slope(points: &[(f64, f64)]) -> f64 {
    let n = points.len() as f64;
    let sum_x: f64 = points.iter().map(|(x, _)| x).sum();
    let sum_y: f64 = points.iter().map(|(_, y)| y).sum();
    let sum_xy: f64 = points.iter().map(|(x, y)| x * y).sum();
    let sum_x2: f64 = points.iter().map(|(x, _)| x * x).sum();

    let denominator = n * sum_x2 - sum_x * sum_x;
    if denominator.abs() < f64::EPSILON {
        return 0.0;
    }
    (n * sum_xy - sum_x * sum_y) / denominator
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;

    fn metrics_at(offset_secs: i64, hr: Option<f64>, pace: Option<f64>) -> LiveRunMetrics {
        LiveRunMetrics {
            timestamp: Utc::now() + ChronoDuration::seconds(offset_secs),
            heart_rate_bpm: hr,
            pace_seconds_per_mile: pace,
            distance_miles: 0.0,
            cadence_spm: None,
            grade_percent: None,
            kcal_per_min: None,
            hr_zone: None,
        }
    }

    #[test]
    fn drift_slope_is_zero_below_minimum_points() {
        let mut window = SampleWindow::new(300, 30);
        for i in 0..10 {
            window.push(&metrics_at(i * 60, Some(140.0), Some(480.0)));
        }
        assert_eq!(window.drift_slope_per_min(), 0.0);
    }

    #[test]
    fn drift_slope_detects_rising_ratio() {
        let mut window = SampleWindow::new(300, 30);
        for i in 0..20 {
            let hr = 140.0 + i as f64;
            window.push(&metrics_at(i * 60, Some(hr), Some(480.0)));
        }
        assert!(window.drift_slope_per_min() > 0.0);
    }

    #[test]
    fn moving_average_uses_last_thirty_only() {
        let mut window = SampleWindow::new(300, 30);
        for _ in 0..40 {
            window.push(&metrics_at(0, Some(140.0), Some(500.0)));
        }
        window.push(&metrics_at(0, Some(140.0), Some(300.0)));
        let avg = window.moving_average_pace();
        assert!(avg < 500.0);
    }

    #[test]
    fn ring_buffer_drops_oldest_past_capacity() {
        let mut window = SampleWindow::new(5, 30);
        for i in 0..10 {
            window.push(&metrics_at(i, None, None));
        }
        assert_eq!(window.len(), 5);
    }

    #[test]
    fn pace_variance_fires_at_five_percent_threshold() {
        assert!(pace_variance_alert(504.0, 480.0, 0.05));
        assert!(!pace_variance_alert(495.0, 480.0, 0.05));
        assert!(!pace_variance_alert(480.0, 0.0, 0.05));
    }
}
