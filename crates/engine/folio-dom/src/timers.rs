//! Timers
//!
//! One-shot deferred callbacks, the host side of `setTimeout`. The queue
//! never reads the clock itself: callers pass `now`, which keeps tests
//! deterministic and lets the embedder drive time from its event loop.

use std::time::{Duration, Instant};

/// Timer handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

#[derive(Debug)]
struct Timer<T> {
    id: TimerId,
    due: Instant,
    payload: T,
}

/// Queue of pending one-shot timers carrying a payload
#[derive(Debug)]
pub struct TimerQueue<T> {
    timers: Vec<Timer<T>>,
    next_id: u64,
}

impl<T> TimerQueue<T> {
    pub fn new() -> Self {
        Self { timers: Vec::new(), next_id: 1 }
    }

    /// Schedule `payload` to become due `delay` after `now`
    pub fn schedule(&mut self, delay: Duration, now: Instant, payload: T) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.timers.push(Timer { id, due: now + delay, payload });
        id
    }

    /// Cancel a pending timer; returns its payload if it had not fired
    pub fn cancel(&mut self, id: TimerId) -> Option<T> {
        let pos = self.timers.iter().position(|t| t.id == id)?;
        Some(self.timers.remove(pos).payload)
    }

    /// Remove and return every timer due at `now`, earliest first
    pub fn take_due(&mut self, now: Instant) -> Vec<(TimerId, T)> {
        let (mut due, pending): (Vec<_>, Vec<_>) =
            self.timers.drain(..).partition(|t| t.due <= now);
        self.timers = pending;
        due.sort_by_key(|t| (t.due, t.id));
        due.into_iter().map(|t| (t.id, t.payload)).collect()
    }

    /// Time until the next timer fires
    pub fn time_until_next(&self, now: Instant) -> Option<Duration> {
        self.timers
            .iter()
            .map(|t| t.due.saturating_duration_since(now))
            .min()
    }

    pub fn has_pending(&self) -> bool {
        !self.timers.is_empty()
    }

    pub fn len(&self) -> usize {
        self.timers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }

    pub fn clear(&mut self) {
        self.timers.clear();
    }
}

impl<T> Default for TimerQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_take_due_in_order() {
        let start = Instant::now();
        let mut queue = TimerQueue::new();
        queue.schedule(Duration::from_millis(300), start, "late");
        queue.schedule(Duration::from_millis(100), start, "early");
        queue.schedule(Duration::from_secs(5), start, "pending");

        assert!(queue.take_due(start).is_empty());

        let due: Vec<_> = queue
            .take_due(start + Duration::from_millis(300))
            .into_iter()
            .map(|(_, p)| p)
            .collect();
        assert_eq!(due, vec!["early", "late"]);
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_cancel() {
        let start = Instant::now();
        let mut queue = TimerQueue::new();
        let id = queue.schedule(Duration::from_millis(10), start, 7u32);
        assert_eq!(queue.cancel(id), Some(7));
        assert_eq!(queue.cancel(id), None);
        assert!(!queue.has_pending());
    }

    #[test]
    fn test_time_until_next() {
        let start = Instant::now();
        let mut queue = TimerQueue::new();
        assert_eq!(queue.time_until_next(start), None);
        queue.schedule(Duration::from_millis(250), start, ());
        assert_eq!(
            queue.time_until_next(start + Duration::from_millis(50)),
            Some(Duration::from_millis(200))
        );
        assert_eq!(
            queue.time_until_next(start + Duration::from_secs(1)),
            Some(Duration::ZERO)
        );
    }
}
