// src/reminder_scheduler.rs - Reminder scheduler module
use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use log::{debug, info, trace, warn};
use tokio::sync::mpsc;
use tokio::time::{self, Duration, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::{
    format_elapsed, ChatApi, Config, OutgoingMessage, Reminder, ReminderQueue, Result,
    SchedulerState, SchedulerStatus,
};

pub const REMINDER_TEXT: &str = "It is time to remind you about this. Time passed since creation";

/// Owns the reminder queue and fires reminders as they come due.
///
/// Nothing else touches the queue: new reminders arrive through the inbox
/// channel and every mutation happens inside the scheduler's own loop.
pub struct ReminderScheduler {
    chat: Arc<dyn ChatApi>,

    /// Reminder offsets from note creation
    intervals: Vec<TimeDelta>,

    /// How often to look for due reminders
    tick_period: Duration,

    queue: ReminderQueue,

    /// Reminders created by the update loop
    inbox: mpsc::Receiver<Reminder>,

    status: SchedulerStatus,
}

impl ReminderScheduler {
    pub fn new(config: &Config, chat: Arc<dyn ChatApi>, inbox: mpsc::Receiver<Reminder>) -> Self {
        Self {
            chat,
            intervals: config.intervals.clone(),
            tick_period: config.tick_period,
            queue: ReminderQueue::new(),
            inbox,
            status: SchedulerStatus {
                state: SchedulerState::Waiting,
                queued: 0,
                reminders_sent: 0,
                reminders_retired: 0,
                reminders_dropped: 0,
                last_sweep: None,
            },
        }
    }

    /// Get the current status of the scheduler
    pub fn status(&self) -> SchedulerStatus {
        SchedulerStatus {
            queued: self.queue.len(),
            ..self.status.clone()
        }
    }

    pub fn queue(&self) -> &ReminderQueue {
        &self.queue
    }

    /// Run until `cancel` fires. Returns the final status; whatever is still
    /// queued at that point is lost.
    pub async fn run(mut self, cancel: CancellationToken) -> SchedulerStatus {
        info!(
            "Starting reminder scheduler, sweeping every {:?}",
            self.tick_period
        );

        let mut ticker = time::interval(self.tick_period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker.tick().await; // Initial tick

        let mut inbox_open = true;

        loop {
            self.status.state = SchedulerState::Waiting;

            tokio::select! {
                biased;

                () = cancel.cancelled() => break,
                received = self.inbox.recv(), if inbox_open => match received {
                    Some(reminder) => self.enqueue(reminder),
                    None => {
                        debug!("Reminder inbox closed, no new reminders will arrive");
                        inbox_open = false;
                    }
                },
                _ = ticker.tick() => self.sweep(Utc::now()).await,
            }
        }

        self.status.state = SchedulerState::ShuttingDown;
        if !self.queue.is_empty() {
            warn!(
                "Reminder scheduler stopping with {} pending reminders, they will not be sent",
                self.queue.len()
            );
        }
        info!("Reminder scheduler stopped");

        self.status()
    }

    /// Add a freshly created reminder to the queue.
    pub fn enqueue(&mut self, reminder: Reminder) {
        self.status.state = SchedulerState::DrainingInbound;
        debug!(
            "{}-{}: Reminder scheduled for {}",
            reminder.chat_id, reminder.message_id, reminder.next_at
        );
        self.queue.insert(reminder);
    }

    /// Fire every reminder due at `now`.
    ///
    /// Delivered reminders move on to their next interval or retire; a
    /// reminder whose notification cannot be sent is dropped.
    pub async fn sweep(&mut self, now: DateTime<Utc>) {
        self.status.state = SchedulerState::Sweeping;
        self.status.last_sweep = Some(now);

        let due = self.queue.take_due(now);
        if due.is_empty() {
            trace!("No reminders due");
            return;
        }

        let due_count = due.len();
        let (mut retired, mut dropped) = (0, 0);
        let mut fired = Vec::with_capacity(due_count);

        for mut reminder in due {
            match self.fire(&reminder, now).await {
                Ok(()) => {
                    self.status.reminders_sent += 1;
                    reminder.advance(&self.intervals, now);
                    if reminder.is_complete() {
                        info!(
                            "{}-{}: Last reminder sent, retiring",
                            reminder.chat_id, reminder.message_id
                        );
                        retired += 1;
                    }
                    fired.push(reminder);
                }
                Err(e) => {
                    warn!(
                        "{}-{}: Failed to send notification, dropping reminder: {}",
                        reminder.chat_id, reminder.message_id, e
                    );
                    dropped += 1;
                }
            }
        }

        self.queue.restore(fired);
        self.status.reminders_retired += retired;
        self.status.reminders_dropped += dropped;

        debug!(
            "Sweep done: {} due, {} retired, {} dropped, {} queued",
            due_count,
            retired,
            dropped,
            self.queue.len()
        );
        if let Some(next) = self.queue.next_due_at() {
            debug!("Next reminder due at {}", next);
        }
    }

    async fn fire(&self, reminder: &Reminder, now: DateTime<Utc>) -> Result<()> {
        let text = format!("{}: {}", REMINDER_TEXT, format_elapsed(reminder.age(now)));
        let message = OutgoingMessage::new(reminder.chat_id, text).reply_to(reminder.message_id);
        self.chat.send_message(&message).await
    }
}
