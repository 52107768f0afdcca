use std::{collections::HashSet, fmt, path::PathBuf, time::Duration};

use chrono::TimeDelta;

use crate::{parse_bool, parse_chat_ids, parse_duration, parse_duration_list, ChatId, NkError, Result};

pub const DEFAULT_TICK_PERIOD: &str = "10s";
pub const DEFAULT_INTERVALS: &str = "1d,3d,10d,30d";
pub const DEFAULT_NOTES_DIR: &str = "./notes";

/// Capacity of the channel carrying new reminders to the scheduler
pub const REMINDER_CHANNEL_CAPACITY: usize = 100;

/// How long Telegram holds a getUpdates request open (seconds)
pub const LONG_POLL_TIMEOUT_SECS: u64 = 30;

/// Pause before fetching updates again after a failed fetch
pub const FETCH_RETRY_DELAY: Duration = Duration::from_secs(3);

/// Process configuration. Immutable once loaded.
#[derive(Clone)]
pub struct Config {
    /// Bot token issued by @BotFather
    pub bot_token: String,

    /// Log chat provider payloads
    pub debug: bool,

    /// Chats allowed to use the bot
    pub allowed_chats: HashSet<ChatId>,

    /// Reminder offsets from note creation, strictly increasing
    pub intervals: Vec<TimeDelta>,

    /// How often the scheduler looks for due reminders
    pub tick_period: Duration,

    /// Directory where notes are stored
    pub notes_dir: PathBuf,

    /// Capacity of the update loop -> scheduler channel
    pub channel_capacity: usize,

    /// Long-poll timeout passed to getUpdates
    pub long_poll_timeout_secs: u64,
}

impl Config {
    /// Load the configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load the configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let bot_token = lookup("TELEGRAM_APITOKEN")
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or_else(|| NkError::config("TELEGRAM_APITOKEN is not set"))?;

        let debug = match lookup("BOT_DEBUG_MODE") {
            Some(raw) if !raw.trim().is_empty() => parse_bool(&raw)
                .map_err(|e| NkError::config(format!("BOT_DEBUG_MODE: {e}")))?,
            _ => false,
        };

        let allowed_raw = lookup("ALLOWED_CHATS")
            .ok_or_else(|| NkError::config("ALLOWED_CHATS is not set"))?;
        let allowed_chats: HashSet<ChatId> = parse_chat_ids(&allowed_raw)
            .map_err(|e| NkError::config(format!("ALLOWED_CHATS: {e}")))?
            .into_iter()
            .collect();
        if allowed_chats.is_empty() {
            return Err(NkError::config("ALLOWED_CHATS does not list any chat"));
        }

        let tick_raw = lookup("TICKER_PERIOD")
            .filter(|p| !p.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_TICK_PERIOD.to_string());
        let tick_period = parse_duration(&tick_raw)
            .map_err(|e| NkError::config(format!("TICKER_PERIOD: {e}")))?;
        if tick_period.is_zero() {
            return Err(NkError::config("TICKER_PERIOD must be greater than zero"));
        }

        let intervals_raw = lookup("REMINDER_INTERVALS")
            .filter(|p| !p.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_INTERVALS.to_string());
        let intervals = parse_intervals(&intervals_raw)?;

        let notes_dir = lookup("NOTES_DIR")
            .filter(|d| !d.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_NOTES_DIR));

        Ok(Self {
            bot_token,
            debug,
            allowed_chats,
            intervals,
            tick_period,
            notes_dir,
            channel_capacity: REMINDER_CHANNEL_CAPACITY,
            long_poll_timeout_secs: LONG_POLL_TIMEOUT_SECS,
        })
    }

    /// Override the notes directory, e.g. from the command line
    pub fn with_notes_dir(mut self, notes_dir: PathBuf) -> Self {
        self.notes_dir = notes_dir;
        self
    }

    /// Offset of the first reminder from note creation
    pub fn first_interval(&self) -> TimeDelta {
        self.intervals.first().copied().unwrap_or_else(TimeDelta::zero)
    }
}

fn parse_intervals(raw: &str) -> Result<Vec<TimeDelta>> {
    let parsed = parse_duration_list(raw)
        .map_err(|e| NkError::config(format!("REMINDER_INTERVALS: {e}")))?;
    if parsed.is_empty() {
        return Err(NkError::config("REMINDER_INTERVALS does not list any interval"));
    }

    let mut intervals: Vec<TimeDelta> = Vec::with_capacity(parsed.len());
    for interval in parsed {
        let delta = TimeDelta::from_std(interval)
            .map_err(|_| NkError::config(format!("REMINDER_INTERVALS: {interval:?} is too large")))?;
        if delta <= TimeDelta::zero() {
            return Err(NkError::config("REMINDER_INTERVALS must be greater than zero"));
        }
        if intervals.last().is_some_and(|prev| *prev >= delta) {
            return Err(NkError::config("REMINDER_INTERVALS must be strictly increasing"));
        }
        intervals.push(delta);
    }
    Ok(intervals)
}

// The token never ends up in logs
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("bot_token", &"<redacted>")
            .field("debug", &self.debug)
            .field("allowed_chats", &self.allowed_chats)
            .field("intervals", &self.intervals)
            .field("tick_period", &self.tick_period)
            .field("notes_dir", &self.notes_dir)
            .field("channel_capacity", &self.channel_capacity)
            .field("long_poll_timeout_secs", &self.long_poll_timeout_secs)
            .finish()
    }
}

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut chats: Vec<_> = self.allowed_chats.iter().collect();
        chats.sort();
        let chats = chats
            .iter()
            .map(|c| c.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        let intervals = self
            .intervals
            .iter()
            .map(|i| crate::format_elapsed(*i))
            .collect::<Vec<_>>()
            .join(", ");

        writeln!(f, "bot token:      <redacted>")?;
        writeln!(f, "debug:          {}", self.debug)?;
        writeln!(f, "allowed chats:  {chats}")?;
        writeln!(f, "intervals:      {intervals}")?;
        writeln!(f, "tick period:    {:?}", self.tick_period)?;
        write!(f, "notes dir:      {}", self.notes_dir.display())
    }
}
