//! Timestamp values with microsecond precision.

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

const MICROS_PER_SECOND: i64 = 1_000_000;
const NANOS_PER_MICRO: i64 = 1_000;
const NANOS_PER_SECOND: i32 = 1_000_000_000;

/// A point in time, stored as microseconds since the Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "WireTimestamp", try_from = "WireTimestamp")]
pub struct DateTime(i64);

impl DateTime {
    pub fn from_micros(timestamp_micros: i64) -> Self {
        Self(timestamp_micros)
    }

    pub fn from_millis(timestamp_millis: i64) -> Self {
        Self(timestamp_millis.saturating_mul(1_000))
    }

    /// The current wall-clock time. Clamps to the epoch if the clock is behind it.
    pub fn now() -> Self {
        let micros = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| i64::try_from(d.as_micros()).unwrap_or(i64::MAX))
            .unwrap_or(0);
        Self(micros)
    }

    pub fn timestamp_micros(&self) -> i64 {
        self.0
    }

    pub fn timestamp_millis(&self) -> i64 {
        self.0.div_euclid(1_000)
    }
}

impl fmt::Display for DateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let wire = WireTimestamp::from(*self);
        write!(f, "{}.{:06}s", wire.seconds, wire.nanos / 1_000)
    }
}

/// Seconds plus non-negative nanoseconds, as the remote API encodes timestamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
struct WireTimestamp {
    seconds: i64,
    nanos: i32,
}

impl From<DateTime> for WireTimestamp {
    fn from(dt: DateTime) -> Self {
        let seconds = dt.0.div_euclid(MICROS_PER_SECOND);
        let micros = dt.0.rem_euclid(MICROS_PER_SECOND);
        Self {
            seconds,
            // rem_euclid keeps this below 1e9, which fits in i32.
            nanos: (micros * NANOS_PER_MICRO) as i32,
        }
    }
}

impl TryFrom<WireTimestamp> for DateTime {
    type Error = CoreError;

    fn try_from(wire: WireTimestamp) -> CoreResult<Self> {
        if !(0..NANOS_PER_SECOND).contains(&wire.nanos) {
            return Err(CoreError::invalid_timestamp(wire.nanos));
        }
        let micros = i64::from(wire.nanos) / NANOS_PER_MICRO;
        Ok(DateTime(
            wire.seconds
                .saturating_mul(MICROS_PER_SECOND)
                .saturating_add(micros),
        ))
    }
}
