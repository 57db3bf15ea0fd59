//! Deferred tasks.
//!
//! The only form of suspension in the simulation: work queued to run on
//! the next tick or after a fixed delay. Tasks are plain data; the owner
//! drains the due ones at each tick boundary and executes them in
//! submission order.

use crate::fixed::Ticks;

#[derive(Debug, Clone, PartialEq, Eq)]
struct Scheduled<T> {
    due: Ticks,
    seq: u64,
    task: T,
}

/// A queue of tasks keyed by the tick they become due.
#[derive(Debug, Clone)]
pub struct Scheduler<T> {
    pending: Vec<Scheduled<T>>,
    next_seq: u64,
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Scheduler<T> {
    pub fn new() -> Self {
        Self {
            pending: Vec::new(),
            next_seq: 0,
        }
    }

    /// Run on the tick after `now`.
    pub fn run_next_tick(&mut self, now: Ticks, task: T) {
        self.run_after(now, 1, task);
    }

    /// Run `delay` ticks after `now`. A zero delay still waits one tick.
    pub fn run_after(&mut self, now: Ticks, delay: Ticks, task: T) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.pending.push(Scheduled {
            due: now + delay.max(1),
            seq,
            task,
        });
    }

    /// Remove and return every task due at or before `now`, ordered by due
    /// tick then submission.
    pub fn drain_due(&mut self, now: Ticks) -> Vec<T> {
        let (mut due, rest): (Vec<_>, Vec<_>) =
            self.pending.drain(..).partition(|s| s.due <= now);
        self.pending = rest;
        due.sort_by_key(|s| (s.due, s.seq));
        due.into_iter().map(|s| s.task).collect()
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_tick_is_not_now() {
        let mut s = Scheduler::new();
        s.run_next_tick(5, "a");
        assert!(s.drain_due(5).is_empty());
        assert_eq!(s.drain_due(6), vec!["a"]);
        assert!(s.is_empty());
    }

    #[test]
    fn delayed_tasks_wait() {
        let mut s = Scheduler::new();
        s.run_after(0, 2, "rescan");
        s.run_after(0, 50, "loaded");
        assert_eq!(s.drain_due(1), Vec::<&str>::new());
        assert_eq!(s.drain_due(2), vec!["rescan"]);
        assert_eq!(s.pending_count(), 1);
        assert_eq!(s.drain_due(50), vec!["loaded"]);
    }

    #[test]
    fn order_is_due_then_submission() {
        let mut s = Scheduler::new();
        s.run_after(0, 3, 1);
        s.run_after(0, 2, 2);
        s.run_after(0, 2, 3);
        assert_eq!(s.drain_due(10), vec![2, 3, 1]);
    }

    #[test]
    fn zero_delay_waits_one_tick() {
        let mut s = Scheduler::new();
        s.run_after(7, 0, ());
        assert!(s.drain_due(7).is_empty());
        assert_eq!(s.drain_due(8).len(), 1);
    }

    #[test]
    fn clear_drops_everything() {
        let mut s = Scheduler::new();
        s.run_next_tick(0, 1);
        s.clear();
        assert_eq!(s.drain_due(100), Vec::<i32>::new());
    }
}
