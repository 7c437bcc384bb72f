use std::fmt;
use std::sync::RwLock;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Format used wherever a timestamp is shown to people.
pub const HUMAN_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// UTC instant with microsecond precision.
///
/// Serializes as RFC 3339. Comment keys use the float unix form produced
/// by [`Timestamp::as_unix_string`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// The current wall-clock time, truncated to microseconds.
    pub fn now() -> Self {
        Self::from_datetime(Utc::now())
    }

    pub fn from_datetime(at: DateTime<Utc>) -> Self {
        // Keys only carry microseconds; round-tripping must be lossless.
        let micros = at.timestamp_micros();
        Self(DateTime::from_timestamp_micros(micros).unwrap_or(at))
    }

    /// Build from a unix time in microseconds.
    pub fn from_unix_micros(micros: i64) -> Result<Self, TypeError> {
        DateTime::from_timestamp_micros(micros)
            .map(Self)
            .ok_or_else(|| TypeError::InvalidTimestamp(format!("{micros}us out of range")))
    }

    pub fn unix_micros(&self) -> i64 {
        self.0.timestamp_micros()
    }

    /// `<seconds>.<microseconds>` since the unix epoch, e.g. `1680980576.645213`.
    pub fn as_unix_string(&self) -> String {
        let micros = self.unix_micros();
        format!("{}.{:06}", micros.div_euclid(1_000_000), micros.rem_euclid(1_000_000))
    }

    /// Parse a float unix timestamp.
    ///
    /// Accepts whole seconds or any number of fractional digits; digits
    /// beyond microseconds are truncated.
    pub fn parse_unix(s: &str) -> Result<Self, TypeError> {
        let invalid = || TypeError::InvalidTimestamp(s.to_string());
        let (secs, frac) = s.split_once('.').unwrap_or((s, ""));
        if secs.is_empty() || !secs.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        if !frac.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        let secs: i64 = secs.parse().map_err(|_| invalid())?;
        let mut micros_str: String = frac.chars().take(6).collect();
        while micros_str.len() < 6 {
            micros_str.push('0');
        }
        let micros: i64 = micros_str.parse().map_err(|_| invalid())?;
        let total = secs
            .checked_mul(1_000_000)
            .and_then(|v| v.checked_add(micros))
            .ok_or_else(invalid)?;
        Self::from_unix_micros(total)
    }

    /// `YYYY-MM-DD HH:MM:SS` in UTC.
    pub fn human(&self) -> String {
        self.0.format(HUMAN_FORMAT).to_string()
    }

    /// A copy shifted forward by `micros` microseconds.
    pub fn plus_micros(&self, micros: i64) -> Self {
        Self(self.0 + Duration::microseconds(micros))
    }
}

impl fmt::Debug for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Timestamp({})", self.as_unix_string())
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.human())
    }
}

/// Source of the current time.
pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;
}

/// Wall-clock time.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct FixedClock {
    at: RwLock<Timestamp>,
}

impl FixedClock {
    pub fn new(at: Timestamp) -> Self {
        Self { at: RwLock::new(at) }
    }

    pub fn advance_micros(&self, micros: i64) {
        let mut at = self.at.write().expect("lock poisoned");
        *at = at.plus_micros(micros);
    }
}

impl Clock for FixedClock {
    fn now(&self) -> Timestamp {
        *self.at.read().expect("lock poisoned")
    }
}
