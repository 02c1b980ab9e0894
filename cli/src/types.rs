use std::{str::FromStr, time::UNIX_EPOCH};

use tabled::Tabled;
use tracelogs_common::{types::time::Millis, window::LogWindow};

use crate::error::TimestampParseError;

/// A point in time given on the command line, either as epoch milliseconds
/// or as an RFC 3339 timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timestamp(pub Millis);

impl FromStr for Timestamp {
    type Err = TimestampParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(TimestampParseError::Empty);
        }
        if s.bytes().all(|b| b.is_ascii_digit()) {
            return s
                .parse()
                .map(Self)
                .map_err(|_| TimestampParseError::OutOfRange(s.to_owned()));
        }
        let time = humantime::parse_rfc3339_weak(s)
            .map_err(|e| TimestampParseError::Invalid(s.to_owned(), e.to_string()))?;
        let since_epoch = time
            .duration_since(UNIX_EPOCH)
            .map_err(|_| TimestampParseError::OutOfRange(s.to_owned()))?;
        u64::try_from(since_epoch.as_millis())
            .map(Self)
            .map_err(|_| TimestampParseError::OutOfRange(s.to_owned()))
    }
}

/// Last instant RFC 3339 can express, 9999-12-31T23:59:59.999Z.
const MAX_RFC3339_MILLIS: Millis = 253_402_300_799_999;

/// Formats as RFC 3339, or as raw milliseconds past year 9999.
pub fn format_millis(millis: Millis) -> String {
    if millis > MAX_RFC3339_MILLIS {
        return format!("{millis} ms");
    }
    let time = UNIX_EPOCH + std::time::Duration::from_millis(millis);
    humantime::format_rfc3339_millis(time).to_string()
}

#[derive(Tabled)]
pub struct WindowRow {
    #[tabled(rename = "#")]
    pub index: usize,
    #[tabled(rename = "START (ms)")]
    pub start: Millis,
    #[tabled(rename = "END (ms)")]
    pub end: Millis,
    #[tabled(rename = "FROM")]
    pub from: String,
    #[tabled(rename = "TO")]
    pub to: String,
}

impl WindowRow {
    pub fn new(index: usize, window: LogWindow) -> Self {
        Self {
            index,
            start: window.start,
            end: window.end,
            from: format_millis(window.start),
            to: format_millis(window.end),
        }
    }
}
