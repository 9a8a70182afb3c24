//! Engine configuration, loaded from TOML with `serde(default)` fallbacks.
//!
//! Every tunable constant (glycogen ceiling, carb fractions,
//! drift/variance thresholds, buffer and throttle sizes) lives here so it
//! is overridable without a dedicated calibration UI.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::Result;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub fueling: FuelingConfig,
    pub drift: DriftConfig,
    pub buffers: BufferConfig,
    pub throttle: ThrottleConfig,
    pub coach: CoachConfig,
}

impl EngineConfig {
    /// Load from `path`, falling back to defaults for any field the file
    /// omits or for a missing file entirely.
    pub fn load(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(contents) => Ok(toml::from_str(&contents)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e.into()),
        }
    }

    /// Default on-disk location: `<config dir>/adaptive-run/engine.toml`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("adaptive-run").join("engine.toml"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FuelingConfig {
    /// Glycogen reserve ceiling in grams, used to clamp `log_gel` intake.
    pub glycogen_ceiling_grams: f64,
    /// Carb-oxidation fraction of calorie burn applied to the depletion
    /// formula, indexed by HR zone (zone 0 and 1 share index 0, zone 4 and
    /// above share index 4).
    pub carb_burn_rate_zone: [f64; 5],
    /// Warning severity threshold, grams of reserve remaining.
    pub warning_threshold_grams: f64,
    /// Critical severity threshold, grams of reserve remaining.
    pub critical_threshold_grams: f64,
}

impl Default for FuelingConfig {
    fn default() -> Self {
        Self {
            glycogen_ceiling_grams: 500.0,
            carb_burn_rate_zone: [0.40, 0.50, 0.60, 0.75, 0.85],
            warning_threshold_grams: 35.0,
            critical_threshold_grams: 20.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriftConfig {
    /// Rolling sample window size for the OLS cardiac-drift slope.
    pub window_size: usize,
    /// Window size for the moving-average pace calculation.
    pub pace_average_window: usize,
    /// Pace-variance alert threshold, as a fraction of average pace.
    pub pace_variance_threshold: f64,
    /// Cardiac-drift alert threshold, bpm per minute.
    pub cardiac_drift_threshold_per_min: f64,
}

impl Default for DriftConfig {
    fn default() -> Self {
        Self {
            window_size: 300,
            pace_average_window: 30,
            pace_variance_threshold: 0.05,
            cardiac_drift_threshold_per_min: 0.015,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BufferConfig {
    /// Motion-sample ring buffer capacity; oldest samples drop on overflow.
    pub motion_ring_capacity: usize,
    /// Telemetry/state-snapshot buffer flush threshold.
    pub flush_threshold: usize,
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self {
            motion_ring_capacity: 800,
            flush_threshold: 60,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThrottleConfig {
    /// Minimum interval between unforced peer metric-snapshot sends, secs.
    pub peer_metric_snapshot_secs: u64,
    /// Minimum interval between unforced display publishes, secs.
    pub display_publish_secs: u64,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            peer_metric_snapshot_secs: 5,
            display_publish_secs: 15,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoachConfig {
    /// Minimum interval between coach prompts, secs.
    pub cooldown_secs: u64,
}

impl Default for CoachConfig {
    fn default() -> Self {
        Self { cooldown_secs: 90 }
    }
}
