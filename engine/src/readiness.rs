//! Readiness Estimator: training-load baseline -> fatigue coefficient and
//! pace-adjustment recommendation. A pure function, no I/O, no interior
//! mutability -- deterministic given its input.

use adaptive_run_core::types::{ReadinessBaseline, ReadinessResult};

const COEFFICIENT_MIN: f64 = 0.4;
const COEFFICIENT_MAX: f64 = 2.0;

/// Evaluate a readiness baseline into a fatigue coefficient and a discrete
/// pace-adjustment percent.
pub fn evaluate(baseline: &ReadinessBaseline) -> ReadinessResult {
    let mut coefficient = baseline.acute_load / baseline.chronic_load.max(0.1);

    if baseline.resting_hr_delta > 5.0 {
        coefficient += 0.05;
    }
    if baseline.hrv_delta_percent < -10.0 {
        coefficient += 0.05;
    }

    let coefficient = coefficient.clamp(COEFFICIENT_MIN, COEFFICIENT_MAX);

    let pace_adjustment_percent = if coefficient > 1.30 {
        -5
    } else if coefficient >= 1.15 {
        -2
    } else if coefficient < 0.80 {
        1
    } else {
        0
    };

    ReadinessResult {
        coefficient,
        pace_adjustment_percent,
    }
}
