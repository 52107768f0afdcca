use chrono::{DateTime, TimeDelta, Utc};

use crate::{ChatId, MessageId};

/// One scheduled reminder about a saved note.
///
/// `next_at` is only meaningful while `complete` is false; once complete the
/// reminder is inert and gets dropped by the scheduler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reminder {
    /// Chat the note came from
    pub chat_id: ChatId,
    /// Message the reminder replies to
    pub message_id: MessageId,
    /// When the note was saved
    pub created: DateTime<Utc>,
    /// When the reminder fires next
    pub next_at: DateTime<Utc>,
    /// No interval is left
    pub complete: bool,
}

impl Reminder {
    /// A fresh reminder for a note saved at `created`, due after the first interval
    pub fn new(
        chat_id: ChatId,
        message_id: MessageId,
        created: DateTime<Utc>,
        first_interval: TimeDelta,
    ) -> Self {
        Self {
            chat_id,
            message_id,
            created,
            next_at: created
                .checked_add_signed(first_interval)
                .unwrap_or(DateTime::<Utc>::MAX_UTC),
            complete: false,
        }
    }

    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.next_at < now
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }

    /// Move `next_at` to the first interval (counted from creation) that is
    /// still ahead of `now`, or mark the reminder complete if none is.
    pub fn advance(&mut self, intervals: &[TimeDelta], now: DateTime<Utc>) {
        let next = intervals
            .iter()
            .filter_map(|interval| self.created.checked_add_signed(*interval))
            .find(|at| *at > now);

        match next {
            Some(at) => self.next_at = at,
            None => self.complete = true,
        }
    }

    /// Time since the note was saved
    pub fn age(&self, now: DateTime<Utc>) -> TimeDelta {
        now - self.created
    }
}
