//! Delayed follow-up actions, drained from the host's timer tick.
//!
//! Single-threaded: the queue lives next to the session on the UI thread and
//! is polled, so no callback ever runs against a session that has moved on.

use std::time::{Duration, Instant};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeferredAction {
    /// Return the copy button to its idle label.
    HideCopiedFeedback,
    /// Take a fresh capture once the overlay is out of the way.
    Recapture,
}

#[derive(Debug, Default)]
pub struct DeferredQueue {
    entries: Vec<(Instant, DeferredAction)>,
}

impl DeferredQueue {
    pub fn new() -> Self {
        DeferredQueue::default()
    }

    /// Schedule `action` at `now + delay`. A pending entry for the same
    /// action is replaced.
    pub fn schedule(&mut self, now: Instant, delay: Duration, action: DeferredAction) {
        self.entries.retain(|(_, a)| *a != action);
        self.entries.push((now + delay, action));
    }

    pub fn cancel(&mut self, action: DeferredAction) {
        self.entries.retain(|(_, a)| *a != action);
    }

    pub fn is_pending(&self, action: DeferredAction) -> bool {
        self.entries.iter().any(|(_, a)| *a == action)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Remove and return every action due at `now`, earliest first.
    pub fn take_due(&mut self, now: Instant) -> Vec<DeferredAction> {
        let mut due: Vec<(Instant, DeferredAction)> = Vec::new();
        self.entries.retain(|&(at, action)| {
            if at <= now {
                due.push((at, action));
                false
            } else {
                true
            }
        });
        due.sort_by_key(|(at, _)| *at);
        due.into_iter().map(|(_, action)| action).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn actions_fire_once_when_due() {
        let t0 = Instant::now();
        let mut q = DeferredQueue::new();
        q.schedule(t0, Duration::from_millis(1500), DeferredAction::HideCopiedFeedback);
        q.schedule(t0, Duration::from_millis(300), DeferredAction::Recapture);

        assert!(q.take_due(t0).is_empty());
        assert_eq!(q.take_due(t0 + Duration::from_millis(300)), vec![DeferredAction::Recapture]);
        assert_eq!(
            q.take_due(t0 + Duration::from_secs(5)),
            vec![DeferredAction::HideCopiedFeedback]
        );
        assert!(q.is_empty());
    }

    #[test]
    fn rescheduling_replaces_pending_entry() {
        let t0 = Instant::now();
        let mut q = DeferredQueue::new();
        q.schedule(t0, Duration::from_millis(100), DeferredAction::HideCopiedFeedback);
        q.schedule(t0, Duration::from_millis(1000), DeferredAction::HideCopiedFeedback);
        assert!(q.take_due(t0 + Duration::from_millis(500)).is_empty());
        assert!(q.is_pending(DeferredAction::HideCopiedFeedback));

        q.cancel(DeferredAction::HideCopiedFeedback);
        assert!(!q.is_pending(DeferredAction::HideCopiedFeedback));
    }

    #[test]
    fn due_actions_come_out_in_time_order() {
        let t0 = Instant::now();
        let mut q = DeferredQueue::new();
        q.schedule(t0, Duration::from_millis(200), DeferredAction::HideCopiedFeedback);
        q.schedule(t0, Duration::from_millis(100), DeferredAction::Recapture);
        assert_eq!(
            q.take_due(t0 + Duration::from_secs(1)),
            vec![DeferredAction::Recapture, DeferredAction::HideCopiedFeedback]
        );
    }
}
