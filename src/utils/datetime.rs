use chrono::{Local, NaiveDateTime, Timelike};
use crate::error::InputError;

/// The only accepted user-facing date format: `dd.mm.yyyy HH:MM`.
pub const INPUT_FORMAT: &str = "%d.%m.%Y %H:%M";
/// How due times are stored; lexical order equals chronological order.
pub const STORAGE_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Parses `dd.mm.yyyy HH:MM` strictly: zero-padded fields, 24-hour clock,
/// no locale inference and no fallback formats.
pub fn parse_due_at(input: &str) -> Result<NaiveDateTime, InputError> {
    let input = input.trim();
    if !has_input_shape(input) {
        return Err(InputError::DateFormat);
    }

    NaiveDateTime::parse_from_str(input, INPUT_FORMAT).map_err(|_| InputError::DateFormat)
}

fn has_input_shape(input: &str) -> bool {
    let bytes = input.as_bytes();
    bytes.len() == 16
        && bytes.iter().enumerate().all(|(i, b)| match i {
            2 | 5 => *b == b'.',
            10 => *b == b' ',
            13 => *b == b':',
            _ => b.is_ascii_digit(),
        })
}

/// Drops seconds and sub-second precision.
pub fn truncate_to_minute(dt: NaiveDateTime) -> NaiveDateTime {
    dt.with_second(0)
        .and_then(|d| d.with_nanosecond(0))
        .unwrap_or(dt)
}

/// Current local wall-clock time, truncated to the minute.
pub fn current_minute() -> NaiveDateTime {
    truncate_to_minute(Local::now().naive_local())
}

pub fn format_due_at(dt: &NaiveDateTime) -> String {
    dt.format(INPUT_FORMAT).to_string()
}

pub fn to_storage(dt: &NaiveDateTime) -> String {
    truncate_to_minute(*dt).format(STORAGE_FORMAT).to_string()
}

pub fn from_storage(value: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value, STORAGE_FORMAT).ok()
}
