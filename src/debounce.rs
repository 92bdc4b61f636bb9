//! Coalesces bursts of updates into a single delayed emission.

use std::time::{Duration, Instant};

#[derive(Debug)]
struct Pending<T> {
    value: T,
    due: Instant,
}

/// A cancellable, restartable one-shot timer carrying the latest value.
///
/// Scheduling replaces whatever was pending and restarts the delay, so a
/// burst produces exactly one emission holding its final value. Dropping the
/// debouncer discards the pending value, so nothing fires after the owner is
/// torn down.
#[derive(Debug)]
pub struct Debouncer<T> {
    delay: Duration,
    pending: Option<Pending<T>>,
}

impl<T> Debouncer<T> {
    #[must_use]
    pub const fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    #[must_use]
    pub const fn delay(&self) -> Duration {
        self.delay
    }

    /// Replace any pending value and restart the delay from `now`.
    pub fn schedule(&mut self, value: T, now: Instant) {
        self.pending = Some(Pending {
            value,
            due: now + self.delay,
        });
    }

    /// Drop the pending value without emitting it.
    pub fn cancel(&mut self) -> bool {
        self.pending.take().is_some()
    }

    #[must_use]
    pub const fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|pending| pending.due)
    }

    /// Emit the pending value if its delay has elapsed by `now`.
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        let due = self.pending.as_ref()?.due;
        if due > now {
            return None;
        }
        self.pending.take().map(|pending| pending.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DELAY: Duration = Duration::from_millis(300);

    #[test]
    fn burst_emits_only_the_last_value() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(DELAY);
        debouncer.schedule(1, start);
        debouncer.schedule(2, start + Duration::from_millis(100));
        debouncer.schedule(3, start + Duration::from_millis(200));

        assert_eq!(debouncer.poll(start + Duration::from_millis(400)), None);
        assert_eq!(debouncer.poll(start + Duration::from_millis(500)), Some(3));
        assert_eq!(debouncer.poll(start + Duration::from_secs(5)), None);
    }

    #[test]
    fn cancel_discards_pending_value() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(DELAY);
        debouncer.schedule("x", start);
        assert!(debouncer.cancel());
        assert!(!debouncer.is_pending());
        assert_eq!(debouncer.poll(start + DELAY), None);
        assert!(!debouncer.cancel());
    }

    #[test]
    fn deadline_tracks_latest_schedule() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(DELAY);
        assert_eq!(debouncer.deadline(), None);
        debouncer.schedule((), start);
        let later = start + Duration::from_millis(50);
        debouncer.schedule((), later);
        assert_eq!(debouncer.deadline(), Some(later + DELAY));
    }
}
