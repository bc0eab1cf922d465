//! ISO-8601 timestamps on the wire.
//!
//! `time_point` carries milliseconds since the Unix epoch in a `u64`,
//! `time_point_sec` whole seconds in a `u32`, and `block_timestamp_type`
//! half-second slots since 2000-01-01 in a `u32`. Text input may carry a
//! fractional part and a trailing `Z`; both are optional.

use std::{fmt, str::FromStr};

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::ByteBuffer;
use crate::error::CodecError;

const INPUT_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";
const SECONDS_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";
const MILLIS_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f";

/// Start of block slot zero, 2000-01-01T00:00:00 in Unix milliseconds.
pub const BLOCK_TIMESTAMP_EPOCH_MS: i64 = 946_684_800_000;

/// Length of one block slot.
pub const BLOCK_INTERVAL_MS: i64 = 500;

/// Parse an ISO-8601 UTC timestamp into Unix milliseconds.
///
/// # Errors
/// Returns [`CodecError::InvalidFormat`] if `input` is not
/// `YYYY-MM-DDTHH:MM:SS[.fff][Z]`.
pub fn parse_millis(kind: &'static str, input: &str) -> Result<i64, CodecError> {
    let trimmed = input.strip_suffix('Z').unwrap_or(input);
    NaiveDateTime::parse_from_str(trimmed, INPUT_FORMAT)
        .map(|dt| dt.and_utc().timestamp_millis())
        .map_err(|e| CodecError::format(kind, format!("{input:?}: {e}")))
}

/// Render Unix milliseconds, appending `.mmm` only for a non-zero remainder.
///
/// # Errors
/// Returns [`CodecError::OutOfRange`] if `millis` is outside chrono's range.
pub fn format_millis(kind: &'static str, millis: i64) -> Result<String, CodecError> {
    let dt: DateTime<Utc> =
        DateTime::from_timestamp_millis(millis).ok_or_else(|| CodecError::range(kind, millis))?;
    let pattern = if dt.timestamp_subsec_millis() == 0 {
        SECONDS_FORMAT
    } else {
        MILLIS_FORMAT
    };
    Ok(dt.format(pattern).to_string())
}

/// Whole seconds since the Unix epoch, written as `time_point_sec`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimePointSec(u32);

impl TimePointSec {
    /// Wrap a raw seconds count.
    #[must_use]
    pub const fn from_secs(secs: u32) -> Self { Self(secs) }

    /// Seconds since the Unix epoch.
    #[must_use]
    pub const fn as_secs(self) -> u32 { self.0 }

    /// Move the timestamp forward, saturating at the end of the range.
    #[must_use]
    pub const fn saturating_add(self, secs: u32) -> Self { Self(self.0.saturating_add(secs)) }

    /// The current wall-clock second.
    ///
    /// # Errors
    /// Returns [`CodecError::OutOfRange`] once the clock passes 2106.
    pub fn now() -> Result<Self, CodecError> {
        let secs = Utc::now().timestamp();
        u32::try_from(secs)
            .map(Self)
            .map_err(|_| CodecError::range("time_point_sec", secs))
    }
}

impl FromStr for TimePointSec {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let secs = parse_millis("time_point_sec", s)?.div_euclid(1000);
        u32::try_from(secs)
            .map(Self)
            .map_err(|_| CodecError::range("time_point_sec", s))
    }
}

impl fmt::Display for TimePointSec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let millis = i64::from(self.0) * 1000;
        let text = format_millis("time_point_sec", millis).map_err(|_| fmt::Error)?;
        f.write_str(&text)
    }
}

impl Serialize for TimePointSec {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TimePointSec {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

impl ByteBuffer {
    /// Append a `time_point` as milliseconds since the epoch.
    ///
    /// # Errors
    /// Returns [`CodecError::InvalidFormat`] for a malformed timestamp and
    /// [`CodecError::OutOfRange`] for one before 1970.
    pub fn push_time_point(&mut self, value: &str) -> Result<(), CodecError> {
        let millis = u64::try_from(parse_millis("time_point", value)?)
            .map_err(|_| CodecError::range("time_point", value))?;
        self.push_u64(millis);
        Ok(())
    }

    /// Read a `time_point`.
    ///
    /// # Errors
    /// Returns [`CodecError::BufferOverrun`] if fewer than 8 bytes remain, or
    /// [`CodecError::OutOfRange`] if the value cannot be rendered as a date.
    pub fn get_time_point(&mut self) -> Result<String, CodecError> {
        let raw = self.get_u64()?;
        let millis = i64::try_from(raw).map_err(|_| CodecError::range("time_point", raw))?;
        format_millis("time_point", millis)
    }

    /// Append a `time_point_sec`.
    ///
    /// # Errors
    /// See [`TimePointSec::from_str`].
    pub fn push_time_point_sec(&mut self, value: &str) -> Result<(), CodecError> {
        self.push_u32(value.parse::<TimePointSec>()?.as_secs());
        Ok(())
    }

    /// Read a `time_point_sec`.
    ///
    /// # Errors
    /// Returns [`CodecError::BufferOverrun`] if fewer than 4 bytes remain.
    pub fn get_time_point_sec(&mut self) -> Result<String, CodecError> {
        format_millis("time_point_sec", i64::from(self.get_u32()?) * 1000)
    }

    /// Append a `block_timestamp_type` slot, rounding down to the slot start.
    ///
    /// # Errors
    /// Returns [`CodecError::InvalidFormat`] for a malformed timestamp and
    /// [`CodecError::OutOfRange`] for one outside the slot range.
    pub fn push_block_timestamp(&mut self, value: &str) -> Result<(), CodecError> {
        let millis = parse_millis("block_timestamp_type", value)?;
        let slot = millis
            .checked_sub(BLOCK_TIMESTAMP_EPOCH_MS)
            .map(|offset| offset.div_euclid(BLOCK_INTERVAL_MS))
            .and_then(|index| u32::try_from(index).ok())
            .ok_or_else(|| CodecError::range("block_timestamp_type", value))?;
        self.push_u32(slot);
        Ok(())
    }

    /// Read a `block_timestamp_type`.
    ///
    /// # Errors
    /// Returns [`CodecError::BufferOverrun`] if fewer than 4 bytes remain.
    pub fn get_block_timestamp(&mut self) -> Result<String, CodecError> {
        let slot = i64::from(self.get_u32()?);
        format_millis(
            "block_timestamp_type",
            slot * BLOCK_INTERVAL_MS + BLOCK_TIMESTAMP_EPOCH_MS,
        )
    }
}
