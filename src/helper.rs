use std::time::Duration;

use chrono::TimeDelta;

use crate::ChatId;

/// Parse a duration string like "10s", "1h30m", "1.5s", "500ms" or "3d".
///
/// A bare number is read as seconds.
pub fn parse_duration(input: &str) -> std::result::Result<Duration, String> {
    let s = input.trim();
    if s.is_empty() {
        return Err("empty duration".to_string());
    }

    if s.chars().all(|c| c.is_ascii_digit() || c == '.') {
        let secs: f64 = s
            .parse()
            .map_err(|_| format!("invalid number in duration {s:?}"))?;
        return Duration::try_from_secs_f64(secs)
            .map_err(|_| format!("duration {s:?} is out of range"));
    }

    let is_number = |c: char| c.is_ascii_digit() || c == '.';
    let mut total_nanos = 0f64;
    let mut rest = s;

    while !rest.is_empty() {
        let num_len = rest.find(|c: char| !is_number(c)).unwrap_or(rest.len());
        if num_len == 0 {
            return Err(format!("expected a number in duration {s:?}"));
        }
        let value: f64 = rest[..num_len]
            .parse()
            .map_err(|_| format!("invalid number {:?} in duration {s:?}", &rest[..num_len]))?;
        rest = &rest[num_len..];

        let unit_len = rest.find(is_number).unwrap_or(rest.len());
        let nanos_per_unit = match &rest[..unit_len] {
            "ns" => 1.0,
            "us" | "µs" => 1e3,
            "ms" => 1e6,
            "s" => 1e9,
            "m" => 60e9,
            "h" => 3_600e9,
            "d" => 86_400e9,
            "" => return Err(format!("missing unit in duration {s:?}")),
            unit => return Err(format!("unknown unit {unit:?} in duration {s:?}")),
        };
        rest = &rest[unit_len..];

        total_nanos += value * nanos_per_unit;
    }

    if total_nanos > u64::MAX as f64 {
        return Err(format!("duration {s:?} is too large"));
    }

    Ok(Duration::from_nanos(total_nanos.round() as u64))
}

/// Parse a comma-separated list of durations, e.g. "1d,3d,10d,30d"
pub fn parse_duration_list(input: &str) -> std::result::Result<Vec<Duration>, String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(parse_duration)
        .collect()
}

/// Parse a comma-separated list of chat ids. Blank entries are skipped.
pub fn parse_chat_ids(input: &str) -> std::result::Result<Vec<ChatId>, String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|id| {
            id.parse::<ChatId>()
                .map_err(|_| format!("invalid chat id {id:?}, should be an integer"))
        })
        .collect()
}

/// Parse a boolean flag the way Go's strconv.ParseBool accepts it
pub fn parse_bool(input: &str) -> std::result::Result<bool, String> {
    match input.trim().to_ascii_lowercase().as_str() {
        "1" | "t" | "true" => Ok(true),
        "0" | "f" | "false" => Ok(false),
        other => Err(format!("invalid boolean {other:?}")),
    }
}

/// Render elapsed time for humans: "3d 4h", "2h 15m", "5m 2s" or "45s"
pub fn format_elapsed(elapsed: TimeDelta) -> String {
    let total = elapsed.num_seconds().max(0);
    let (days, hours, minutes, seconds) = (
        total / 86_400,
        total % 86_400 / 3_600,
        total % 3_600 / 60,
        total % 60,
    );

    if days > 0 {
        format!("{days}d {hours}h")
    } else if hours > 0 {
        format!("{hours}h {minutes}m")
    } else if minutes > 0 {
        format!("{minutes}m {seconds}s")
    } else {
        format!("{seconds}s")
    }
}
