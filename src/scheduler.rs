//! Cooperative single-threaded timer scheduler
//!
//! Timers live on a virtual clock measured from session start. The UI loop sleeps until
//! [`Scheduler::next_deadline`] and then drains due timers with [`Scheduler::pop_due`];
//! tests drive the clock directly.

use std::collections::BTreeMap;
use std::time::Duration;

/// What a timer does when it fires
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    /// Close the eyes
    Blink,
    /// Reopen the eyes after a blink
    BlinkEnd,
    /// Flip the mouth between open and closed
    MouthToggle,
    /// Give up waiting for an utterance
    ListenTimeout,
    /// Periodic state log
    Heartbeat,
}

/// Handle to a scheduled timer, used for cancellation
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerHandle(u64);

/// Pending timers ordered by deadline, ties broken by scheduling order
#[derive(Debug, Default)]
pub struct Scheduler {
    now: Duration,
    next_seq: u64,
    timers: BTreeMap<(Duration, u64), TimerKind>,
}

impl Scheduler {
    /// Create an empty scheduler at time zero
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current virtual time
    #[must_use]
    pub const fn now(&self) -> Duration {
        self.now
    }

    /// Schedule `kind` to fire `after` the current time
    pub fn schedule(&mut self, after: Duration, kind: TimerKind) -> TimerHandle {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.timers.insert((self.now + after, seq), kind);
        tracing::trace!(?kind, after_ms = after.as_millis(), seq, "timer scheduled");
        TimerHandle(seq)
    }

    /// Cancel a pending timer
    ///
    /// Returns false if the timer already fired or was cancelled
    pub fn cancel(&mut self, handle: TimerHandle) -> bool {
        let key = self.timers.keys().find(|(_, seq)| *seq == handle.0).copied();
        key.is_some_and(|k| self.timers.remove(&k).is_some())
    }

    /// Check whether a timer is still pending
    #[must_use]
    pub fn is_pending(&self, handle: TimerHandle) -> bool {
        self.timers.keys().any(|(_, seq)| *seq == handle.0)
    }

    /// Deadline of the earliest pending timer
    #[must_use]
    pub fn next_deadline(&self) -> Option<Duration> {
        self.timers.keys().next().map(|(deadline, _)| *deadline)
    }

    /// Number of pending timers of a given kind
    #[must_use]
    pub fn pending(&self, kind: TimerKind) -> usize {
        self.timers.values().filter(|k| **k == kind).count()
    }

    /// Deadline of the earliest pending timer of a given kind
    #[must_use]
    pub fn deadline_of(&self, kind: TimerKind) -> Option<Duration> {
        self.timers
            .iter()
            .find(|(_, k)| **k == kind)
            .map(|((deadline, _), _)| *deadline)
    }

    /// Fire the earliest timer due at or before `now`
    ///
    /// Advances the clock to the timer's deadline so anything scheduled by its handler
    /// is measured from when it was due. Once nothing is due the clock moves to `now`.
    pub fn pop_due(&mut self, now: Duration) -> Option<(TimerHandle, TimerKind)> {
        let due = self.timers.first_key_value().map(|(key, _)| *key).filter(|(d, _)| *d <= now);

        match due {
            Some(key) => {
                let kind = self.timers.remove(&key)?;
                self.now = self.now.max(key.0);
                Some((TimerHandle(key.1), kind))
            }
            None => {
                self.now = self.now.max(now);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MS: Duration = Duration::from_millis(1);

    #[test]
    fn test_fires_in_deadline_order() {
        let mut sched = Scheduler::new();
        sched.schedule(MS * 300, TimerKind::Blink);
        sched.schedule(MS * 100, TimerKind::MouthToggle);
        sched.schedule(MS * 100, TimerKind::Heartbeat);

        assert_eq!(sched.next_deadline(), Some(MS * 100));
        assert_eq!(sched.pop_due(MS * 50), None);
        assert_eq!(sched.now(), MS * 50);

        let fired: Vec<TimerKind> =
            std::iter::from_fn(|| sched.pop_due(MS * 1000).map(|(_, k)| k)).collect();
        assert_eq!(
            fired,
            vec![TimerKind::MouthToggle, TimerKind::Heartbeat, TimerKind::Blink]
        );
        assert_eq!(sched.now(), MS * 1000);
    }

    #[test]
    fn test_cancel() {
        let mut sched = Scheduler::new();
        let handle = sched.schedule(MS * 10, TimerKind::MouthToggle);

        assert!(sched.is_pending(handle));
        assert!(sched.cancel(handle));
        assert!(!sched.cancel(handle));
        assert!(!sched.is_pending(handle));
        assert_eq!(sched.pop_due(MS * 20), None);
    }

    #[test]
    fn test_clock_follows_fired_timer() {
        let mut sched = Scheduler::new();
        sched.schedule(MS * 100, TimerKind::Blink);

        let (_, kind) = sched.pop_due(MS * 500).unwrap();
        assert_eq!(kind, TimerKind::Blink);
        assert_eq!(sched.now(), MS * 100);

        // Rescheduled from the original deadline, not from the late poll
        sched.schedule(MS * 100, TimerKind::BlinkEnd);
        assert_eq!(sched.deadline_of(TimerKind::BlinkEnd), Some(MS * 200));
    }
}
