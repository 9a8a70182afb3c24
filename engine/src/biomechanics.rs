//! Biomechanical Analyzer: a pure batch function over a window of motion
//! samples, safe to run off the session executor on a `rayon` thread since
//! it is stateless.

use adaptive_run_core::types::{BiomechanicalMetrics, MotionSample};

const MIN_CONTACT_MS: f64 = 50.0;
const MAX_CONTACT_MS: f64 = 500.0;

/// Convert a batch of motion samples into vertical oscillation, contact
/// balance, ground-contact time, and running-power estimates. Degenerate
/// batches (fewer than two samples, or zero time span) return a zeroed
/// result rather than erroring.
pub fn analyze(samples: &[MotionSample]) -> BiomechanicalMetrics {
    if samples.len() < 2 {
        return BiomechanicalMetrics::default();
    }

    let span = samples
        .last()
        .unwrap()
        .timestamp
        .signed_duration_since(samples.first().unwrap().timestamp);
    if span.num_milliseconds() <= 0 {
        return BiomechanicalMetrics::default();
    }

    let n = samples.len() as f64;
    let mean_vertical: f64 = samples.iter().map(|s| s.vertical_accel).sum::<f64>() / n;
    let mean_lateral: f64 = samples.iter().map(|s| s.lateral_accel).sum::<f64>() / n;
    let mean_abs_vertical: f64 = samples.iter().map(|s| s.vertical_accel.abs()).sum::<f64>() / n;
    let rms_vertical = (samples.iter().map(|s| s.vertical_accel.powi(2)).sum::<f64>() / n).sqrt();

    let vertical_oscillation_cm = (mean_vertical * 3.0).max(0.0);
    let contact_balance_percent = (50.0 + mean_lateral * 5.0).clamp(40.0, 60.0);
    let ground_contact_time_ms = mean_ground_contact_ms(samples);
    let running_power_w =
        (70.0 * rms_vertical * (mean_abs_vertical * 9.81 * 0.1)).clamp(0.0, 600.0);

    BiomechanicalMetrics {
        vertical_oscillation_cm,
        contact_balance_percent,
        ground_contact_time_ms,
        running_power_w,
    }
}

/// Mean contact duration across zero-crossings of vertical acceleration:
/// positive -> negative starts contact, negative -> positive ends it.
/// Intervals outside `[50, 500]` ms are discarded as noise.
fn mean_ground_contact_ms(samples: &[MotionSample]) -> f64 {
    let mut contact_start: Option<chrono::DateTime<chrono::Utc>> = None;
    let mut durations_ms = Vec::new();

    for window in samples.windows(2) {
        let (prev, curr) = (&window[0], &window[1]);
        if prev.vertical_accel > 0.0 && curr.vertical_accel <= 0.0 {
            contact_start = Some(curr.timestamp);
        } else if prev.vertical_accel <= 0.0 && curr.vertical_accel > 0.0 {
            if let Some(start) = contact_start.take() {
                let duration_ms = curr
                    .timestamp
                    .signed_duration_since(start)
                    .num_milliseconds() as f64;
                if (MIN_CONTACT_MS..=MAX_CONTACT_MS).contains(&duration_ms) {
                    durations_ms.push(duration_ms);
                }
            }
        }
    }

    if durations_ms.is_empty() {
        0.0
    } else {
        durations_ms.iter().sum::<f64>() / durations_ms.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration as ChronoDuration, Utc};

    fn sample(vertical: f64, lateral: f64, offset_ms: i64) -> MotionSample {
        MotionSample {
            vertical_accel: vertical,
            lateral_accel: lateral,
            timestamp: Utc::now() + ChronoDuration::milliseconds(offset_ms),
        }
    }

    #[test]
    fn fewer_than_two_samples_returns_zeroed_result() {
        let samples = vec![sample(1.0, 0.0, 0)];
        assert_eq!(analyze(&samples), BiomechanicalMetrics::default());
    }

    #[test]
    fn zero_time_span_returns_zeroed_result() {
        let samples = vec![sample(1.0, 0.0, 0), sample(1.0, 0.0, 0)];
        assert_eq!(analyze(&samples), BiomechanicalMetrics::default());
    }

    #[test]
    fn contact_balance_clamps_to_expected_range() {
        let samples = vec![sample(0.5, 100.0, 0), sample(0.5, 100.0, 10)];
        let metrics = analyze(&samples);
        assert_eq!(metrics.contact_balance_percent, 60.0);

        let samples = vec![sample(0.5, -100.0, 0), sample(0.5, -100.0, 10)];
        let metrics = analyze(&samples);
        assert_eq!(metrics.contact_balance_percent, 40.0);
    }

    #[test]
    fn detects_one_ground_contact_interval() {
        let samples = vec![
            sample(1.0, 0.0, 0),
            sample(-1.0, 0.0, 100),
            sample(1.0, 0.0, 250),
        ];
        let metrics = analyze(&samples);
        assert_eq!(metrics.ground_contact_time_ms, 150.0);
    }

    #[test]
    fn discards_contact_intervals_outside_bounds() {
        let samples = vec![
            sample(1.0, 0.0, 0),
            sample(-1.0, 0.0, 5),
            sample(1.0, 0.0, 10),
        ];
        let metrics = analyze(&samples);
        assert_eq!(metrics.ground_contact_time_ms, 0.0);
    }

    #[test]
    fn running_power_never_exceeds_ceiling() {
        let samples = vec![sample(100.0, 0.0, 0), sample(100.0, 0.0, 10)];
        let metrics = analyze(&samples);
        assert_eq!(metrics.running_power_w, 600.0);
    }
}
