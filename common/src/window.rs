use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::time::{Millis, WindowCapacity};

/// A sub-range of a larger time range small enough for one log-export request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LogWindow {
    pub start: Millis,
    pub end: Millis,
}

impl LogWindow {
    pub fn span_millis(&self) -> u64 {
        self.end.saturating_sub(self.start)
    }
}

impl From<LogWindow> for (Millis, Millis) {
    fn from(window: LogWindow) -> Self {
        (window.start, window.end)
    }
}

impl fmt::Display for LogWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

/// Splits `[start, end)` into consecutive windows of exactly `capacity`.
///
/// Windows are emitted while the next one would still end before `end`; one
/// more window is then emitted unconditionally. The last window is therefore
/// not clamped and may extend past `end` by up to `capacity`. A range with
/// `start >= end` yields the single window `[start, start + capacity)`.
pub fn split_into_windows(start: Millis, end: Millis, capacity: WindowCapacity) -> Vec<LogWindow> {
    let capacity = capacity.as_millis();
    let mut windows = Vec::with_capacity(expected_window_count(start, end, capacity));

    let mut cursor = start;
    let mut window_end = cursor.saturating_add(capacity);
    while window_end < end {
        windows.push(LogWindow {
            start: cursor,
            end: window_end,
        });
        cursor = window_end;
        window_end = cursor.saturating_add(capacity);
    }
    windows.push(LogWindow {
        start: cursor,
        end: window_end,
    });

    windows
}

fn expected_window_count(start: Millis, end: Millis, capacity: u64) -> usize {
    let span = end.saturating_sub(start);
    usize::try_from(span.div_ceil(capacity).max(1)).unwrap_or(usize::MAX)
}
