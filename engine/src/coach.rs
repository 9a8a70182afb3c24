//! Coach Prompt Engine: a cooldown-gated rule table that turns a `Decision`
//! into an optional text cue. Holds only the cooldown -- no other state --
//! so an alternative (e.g. LLM-backed) implementation is substitutable.

use adaptive_run_core::types::{AlertKind, Decision};
use chrono::{DateTime, Utc};
use std::time::Duration;

pub struct CoachPromptEngine {
    cooldown: Duration,
}

impl CoachPromptEngine {
    pub fn new(cooldown: Duration) -> Self {
        Self { cooldown }
    }

    pub fn prompt(
        &self,
        decision: &Decision,
        now: DateTime<Utc>,
        last_prompt_at: Option<DateTime<Utc>>,
    ) -> Option<String> {
        if let Some(last) = last_prompt_at {
            let elapsed = now.signed_duration_since(last);
            if elapsed.to_std().unwrap_or(Duration::ZERO) < self.cooldown {
                return None;
            }
        }

        Some(match decision.first_alert() {
            Some(AlertKind::FuelCritical) => {
                "Fuel critical. Take a gel now.".to_string()
            }
            Some(AlertKind::FuelWarning) => {
                "Fuel running low, consider fueling soon.".to_string()
            }
            Some(AlertKind::HighHeartRate) => {
                "Heart rate is high for this effort, ease off the pace.".to_string()
            }
            Some(AlertKind::CardiacDrift) => {
                "Heart rate is drifting up at a steady pace, consider easing off.".to_string()
            }
            Some(AlertKind::PaceVariance) => {
                "Pace has drifted from your recent average.".to_string()
            }
            Some(AlertKind::Split) => {
                format!("Mile split complete, pace adjustment {}%.", decision.pace_adjustment_percent)
            }
            None => "Looking strong, keep it steady.".to_string(),
        })
    }
}
