// SPDX-License-Identifier: MPL-2.0
//! Delayed-task queue on an explicit timeline.
//!
//! Deadlines are offsets from an arbitrary origin, so the queue never reads a
//! clock itself: callers pass `now` in. The lazy loader feeds it tokio time,
//! tests feed it plain `Duration`s.

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

/// Handle of a scheduled entry, used to cancel it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId(u64);

/// Queue of payloads keyed by deadline.
///
/// Entries with equal deadlines fire in scheduling order.
#[derive(Debug)]
pub struct TimerQueue<T> {
    entries: BTreeMap<(Duration, u64), T>,
    deadlines: HashMap<u64, Duration>,
    next_seq: u64,
}

impl<T> Default for TimerQueue<T> {
    fn default() -> Self {
        Self {
            entries: BTreeMap::new(),
            deadlines: HashMap::new(),
            next_seq: 0,
        }
    }
}

impl<T> TimerQueue<T> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedules `payload` to fire `delay` after `now`.
    pub fn schedule(&mut self, now: Duration, delay: Duration, payload: T) -> TimerId {
        let seq = self.next_seq;
        self.next_seq += 1;
        let deadline = now.saturating_add(delay);
        self.entries.insert((deadline, seq), payload);
        self.deadlines.insert(seq, deadline);
        TimerId(seq)
    }

    /// Removes a pending entry. Returns `None` if it already fired or was cancelled.
    pub fn cancel(&mut self, id: TimerId) -> Option<T> {
        let deadline = self.deadlines.remove(&id.0)?;
        self.entries.remove(&(deadline, id.0))
    }

    /// Earliest pending deadline.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Duration> {
        self.entries.keys().next().map(|(deadline, _)| *deadline)
    }

    /// Removes and returns every entry whose deadline is at or before `now`.
    pub fn pop_due(&mut self, now: Duration) -> Vec<T> {
        let mut due = Vec::new();
        while let Some(entry) = self.entries.first_entry() {
            let (deadline, seq) = *entry.key();
            if deadline > now {
                break;
            }
            self.deadlines.remove(&seq);
            due.push(entry.remove());
        }
        due
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    #[test]
    fn nothing_is_due_before_deadline() {
        let mut queue = TimerQueue::new();
        queue.schedule(ms(0), ms(100), "retry");
        assert!(queue.pop_due(ms(99)).is_empty());
        assert_eq!(queue.next_deadline(), Some(ms(100)));
        assert_eq!(queue.pop_due(ms(100)), vec!["retry"]);
        assert!(queue.is_empty());
    }

    #[test]
    fn due_entries_fire_in_deadline_order() {
        let mut queue = TimerQueue::new();
        queue.schedule(ms(0), ms(300), 3);
        queue.schedule(ms(0), ms(100), 1);
        queue.schedule(ms(50), ms(150), 2);
        assert_eq!(queue.pop_due(ms(1000)), vec![1, 2, 3]);
    }

    #[test]
    fn equal_deadlines_keep_scheduling_order() {
        let mut queue = TimerQueue::new();
        queue.schedule(ms(0), ms(10), 'a');
        queue.schedule(ms(0), ms(10), 'b');
        assert_eq!(queue.pop_due(ms(10)), vec!['a', 'b']);
    }

    #[test]
    fn cancelled_entry_never_fires() {
        let mut queue = TimerQueue::new();
        let id = queue.schedule(ms(0), ms(100), "retry");
        assert_eq!(queue.cancel(id), Some("retry"));
        assert_eq!(queue.cancel(id), None);
        assert!(queue.pop_due(ms(1000)).is_empty());
        assert_eq!(queue.next_deadline(), None);
    }

    #[test]
    fn cancel_after_fire_is_noop() {
        let mut queue = TimerQueue::new();
        let id = queue.schedule(ms(0), ms(5), ());
        assert_eq!(queue.pop_due(ms(5)).len(), 1);
        assert_eq!(queue.cancel(id), None);
    }

    #[test]
    fn linear_backoff_timeline() {
        // Attempts at 0, then +100, then +200 after that.
        let mut queue = TimerQueue::new();
        let mut now = ms(0);
        let mut fired_at = Vec::new();
        for attempt in 1..=2u64 {
            queue.schedule(now, ms(100) * attempt as u32, attempt);
            now = queue.next_deadline().expect("scheduled");
            fired_at.push((queue.pop_due(now)[0], now));
        }
        assert_eq!(fired_at, vec![(1, ms(100)), (2, ms(300))]);
    }
}
