use std::{fmt, num::NonZeroU64, str::FromStr, time::Duration};

use serde::{Deserialize, Serialize};

use super::ValidationError;
use crate::{
    caps,
    window::{LogWindow, split_into_windows},
};

/// Milliseconds since the Unix epoch.
pub type Millis = u64;

/// A half-open interval `[start, end)` of millisecond timestamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeRange {
    start: Millis,
    end: Millis,
}

impl TimeRange {
    pub fn new(start: Millis, end: Millis) -> Result<Self, ValidationError> {
        if start >= end {
            return Err(format!("Start time ({start}) must be before end time ({end})").into());
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> Millis {
        self.start
    }

    pub fn end(&self) -> Millis {
        self.end
    }

    pub fn span(&self) -> Duration {
        Duration::from_millis(self.end - self.start)
    }

    /// Consecutive windows of `capacity` covering the range, earliest first.
    pub fn windows(&self, capacity: WindowCapacity) -> Vec<LogWindow> {
        split_into_windows(self.start, self.end, capacity)
    }
}

impl<'de> Deserialize<'de> for TimeRange {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct Raw {
            start: Millis,
            end: Millis,
        }

        let Raw { start, end } = Raw::deserialize(deserializer)?;
        Self::new(start, end).map_err(serde::de::Error::custom)
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// Upper bound on the span a single log-export request may cover.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u64", into = "u64")]
pub struct WindowCapacity(NonZeroU64);

impl WindowCapacity {
    pub fn from_millis(millis: u64) -> Result<Self, ValidationError> {
        NonZeroU64::new(millis)
            .map(Self)
            .ok_or_else(|| "Window capacity must be greater than zero".into())
    }

    pub fn as_millis(&self) -> u64 {
        self.0.get()
    }

    pub fn as_duration(&self) -> Duration {
        Duration::from_millis(self.0.get())
    }
}

impl Default for WindowCapacity {
    fn default() -> Self {
        Self(NonZeroU64::new(caps::DEFAULT_WINDOW_CAPACITY_MS).expect("non-zero default"))
    }
}

impl TryFrom<u64> for WindowCapacity {
    type Error = ValidationError;

    fn try_from(millis: u64) -> Result<Self, Self::Error> {
        Self::from_millis(millis)
    }
}

impl From<WindowCapacity> for u64 {
    fn from(value: WindowCapacity) -> Self {
        value.as_millis()
    }
}

impl TryFrom<Duration> for WindowCapacity {
    type Error = ValidationError;

    fn try_from(duration: Duration) -> Result<Self, Self::Error> {
        let millis = u64::try_from(duration.as_millis())
            .map_err(|_| ValidationError::from("Window capacity is too large"))?;
        Self::from_millis(millis)
    }
}

impl FromStr for WindowCapacity {
    type Err = ValidationError;

    /// Accepts either a plain millisecond count or a humantime-style duration
    /// with a unit suffix (e.g. `90m`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Ok(millis) = s.parse::<u64>() {
            return Self::from_millis(millis);
        }
        humantime::parse_duration(s)
            .map_err(|e| ValidationError(format!("Invalid window capacity '{s}': {e}")))
            .and_then(Self::try_from)
    }
}

impl fmt::Display for WindowCapacity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ms", self.as_millis())
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::{TimeRange, WindowCapacity};

    #[test]
    fn range_rejects_empty_and_inverted() {
        assert!(TimeRange::new(10, 10).is_err());
        assert!(TimeRange::new(20, 10).is_err());
        let range = TimeRange::new(10, 20).unwrap();
        assert_eq!((range.start(), range.end()), (10, 20));
    }

    #[test]
    fn range_deserialize_validates() {
        let ok: TimeRange = serde_json::from_str(r#"{"start": 1, "end": 2}"#).unwrap();
        assert_eq!(ok, TimeRange::new(1, 2).unwrap());
        assert!(serde_json::from_str::<TimeRange>(r#"{"start": 2, "end": 2}"#).is_err());
    }

    #[test]
    fn default_capacity_is_ninety_minutes() {
        assert_eq!(WindowCapacity::default().as_millis(), 5_400_000);
    }

    #[rstest]
    #[case("90", Some(90))]
    #[case("90m", Some(5_400_000))]
    #[case("2h", Some(7_200_000))]
    #[case("30s", Some(30_000))]
    #[case("250ms", Some(250))]
    #[case("0", None)]
    #[case("0m", None)]
    #[case("10 parsecs", None)]
    #[case("", None)]
    fn parse_capacity(#[case] input: &str, #[case] expected: Option<u64>) {
        let parsed = input.parse::<WindowCapacity>().ok().map(|c| c.as_millis());
        assert_eq!(parsed, expected);
    }
}
