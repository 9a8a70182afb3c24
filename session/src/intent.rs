//! Intent Relay draining. A thin wrapper the manager calls at the start of
//! every tick -- kept separate from `manager.rs` so the draining policy
//! (drain everything, process in FIFO order, never block) is a single
//! reviewable unit.

use std::sync::Arc;

use adaptive_run_core::traits::IntentRelay;
use adaptive_run_core::types::IntentAction;

pub fn drain_pending(relay: &Arc<dyn IntentRelay>) -> Vec<IntentAction> {
    relay.drain()
}

#[cfg(test)]
mod tests {
    use super::*;
    use adaptive_run_core::traits::InMemoryIntentRelay;

    #[test]
    fn drains_everything_enqueued_in_order() {
        let relay: Arc<dyn IntentRelay> = Arc::new(InMemoryIntentRelay::default());
        relay.enqueue(IntentAction::MarkLap);
        relay.enqueue(IntentAction::ToggleMetrics);
        let drained = drain_pending(&relay);
        assert_eq!(drained, vec![IntentAction::MarkLap, IntentAction::ToggleMetrics]);
        assert!(drain_pending(&relay).is_empty());
    }
}
