//! Note naming.
//!
//! A note is plain text whose first line is its heading. Stored notes are
//! named `<timestamp>_<sanitized heading>.md`; everything here is pure so
//! the same heading and instant always give the same name.
use std::sync::LazyLock;

use chrono::NaiveDateTime;
use regex::Regex;

/// Maximum number of characters of the heading kept in a file name
pub const MAX_HEADING_CHARS: usize = 60;

/// Extension of stored note files
pub const NOTE_EXTENSION: &str = "md";

/// Timestamp layout used as the file name prefix
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H-%M-%S";

/// Characters that are never allowed in a file name
const FORBIDDEN: &[char] = &[':', '*', '?', '"', '>', '<', '/', '\\', '|', ' '];

/// Anything that is not a Unicode letter, number or space
static NOT_NAME_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\p{L}\p{N} ]+").expect("name filter regex is valid"));

/// First line of a note
pub fn heading(content: &str) -> &str {
    content.lines().next().unwrap_or("")
}

/// Turn a heading into something safe to use in a file name.
///
/// Lower-cases, drops everything that is not a letter, number or space, trims
/// the edges and replaces forbidden characters with `-`.
pub fn sanitize_name(heading: &str) -> String {
    let lowered = heading.to_lowercase();
    let cleaned = NOT_NAME_CHARS.replace_all(&lowered, "");

    cleaned
        .trim_matches(|c| c == ' ' || c == '\t')
        .chars()
        .map(|c| if FORBIDDEN.contains(&c) { '-' } else { c })
        .collect()
}

/// File name for a note with the given heading created at `created`
pub fn note_file_name(heading: &str, created: NaiveDateTime) -> String {
    let sanitized: String = sanitize_name(heading)
        .chars()
        .take(MAX_HEADING_CHARS)
        .collect();

    format!(
        "{}_{}.{}",
        created.format(TIMESTAMP_FORMAT),
        sanitized,
        NOTE_EXTENSION
    )
}
