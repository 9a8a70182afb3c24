//! Outbound throttling: `update_application_context` is always attempted
//! (cheap, coalescing); a direct send is additionally attempted only when
//! `force` is set or the 5 s metric-snapshot throttle has elapsed.

use chrono::{DateTime, Utc};
use std::time::Duration;

pub struct OutboundThrottle {
    interval: Duration,
    last_direct_send_at: Option<DateTime<Utc>>,
}

impl OutboundThrottle {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_direct_send_at: None,
        }
    }

    /// Whether a direct send should be attempted this call. Lifecycle and
    /// discrete events always bypass the throttle via `force=true`; a
    /// granted send (forced or not) resets the window.
    pub fn should_send(&mut self, now: DateTime<Utc>, force: bool) -> bool {
        if force {
            self.last_direct_send_at = Some(now);
            return true;
        }

        let elapsed_ok = match self.last_direct_send_at {
            Some(last) => now.signed_duration_since(last).to_std().unwrap_or(Duration::ZERO) >= self.interval,
            None => true,
        };

        if elapsed_ok {
            self.last_direct_send_at = Some(now);
        }
        elapsed_ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;

    #[test]
    fn unforced_sends_respect_the_interval() {
        let mut throttle = OutboundThrottle::new(Duration::from_secs(5));
        let now = Utc::now();
        assert!(throttle.should_send(now, false));
        assert!(!throttle.should_send(now + ChronoDuration::seconds(2), false));
        assert!(throttle.should_send(now + ChronoDuration::seconds(6), false));
    }

    #[test]
    fn forced_sends_always_go_through_and_reset_the_window() {
        let mut throttle = OutboundThrottle::new(Duration::from_secs(5));
        let now = Utc::now();
        assert!(throttle.should_send(now, true));
        assert!(!throttle.should_send(now + ChronoDuration::seconds(1), false));
        assert!(throttle.should_send(now + ChronoDuration::seconds(1), true));
    }

    #[test]
    fn twenty_snapshots_in_ten_seconds_yields_at_most_three_direct_sends() {
        let mut throttle = OutboundThrottle::new(Duration::from_secs(5));
        let start = Utc::now();
        let mut sends = 0;
        for i in 0..20 {
            let now = start + ChronoDuration::milliseconds(i * 500);
            if throttle.should_send(now, false) {
                sends += 1;
            }
        }
        assert!(sends <= 3, "expected at most 3 direct sends, got {sends}");
    }
}
