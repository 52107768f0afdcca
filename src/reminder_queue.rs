//! Time-ordered queue of pending reminders.
//!
//! A sorted `Vec` keyed by `next_at`. Reminders with equal `next_at` keep no
//! particular order relative to each other.
use chrono::{DateTime, Utc};

use crate::Reminder;

#[derive(Debug, Default)]
pub struct ReminderQueue {
    /// Sorted ascending by `next_at`
    entries: Vec<Reminder>,
}

impl ReminderQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Reminder> {
        self.entries.iter()
    }

    /// When the earliest reminder fires
    pub fn next_due_at(&self) -> Option<DateTime<Utc>> {
        self.entries.first().map(|r| r.next_at)
    }

    /// Insert keeping the queue sorted. O(log n) search plus O(n) shift.
    pub fn insert(&mut self, reminder: Reminder) {
        let at = self
            .entries
            .partition_point(|r| r.next_at <= reminder.next_at);
        self.entries.insert(at, reminder);
    }

    /// Remove and return every reminder that is due at `now`, earliest first.
    ///
    /// Due reminders always form a prefix of the queue, so a queue whose
    /// front is not due is left untouched.
    pub fn take_due(&mut self, now: DateTime<Utc>) -> Vec<Reminder> {
        match self.entries.first() {
            Some(front) if front.is_due(now) => {}
            _ => return Vec::new(),
        }

        let due = self.entries.partition_point(|r| r.is_due(now));
        self.entries.drain(..due).collect()
    }

    /// Put fired reminders back after their `next_at` moved forward.
    ///
    /// Completed reminders are discarded. The queue is re-sorted only when
    /// something was actually put back.
    pub fn restore(&mut self, fired: Vec<Reminder>) {
        let before = self.entries.len();
        self.entries
            .extend(fired.into_iter().filter(|r| !r.is_complete()));

        if self.entries.len() > before {
            self.entries.sort_by_key(|r| r.next_at);
        }
    }
}
