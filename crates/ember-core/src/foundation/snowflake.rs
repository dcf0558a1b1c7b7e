//! Snowflake identifiers.
//!
//! Every cached entity is keyed by a [`Snowflake`]: a 64-bit, time-ordered
//! identifier. The upper 42 bits hold milliseconds since [`EPOCH`]; the rest
//! encode worker, process and sequence numbers.
//!
//! On the wire snowflakes are decimal strings. Deserialization also accepts
//! plain integers so hand-written payloads stay readable.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, TimeZone, Utc};
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Platform epoch (2015-01-01T00:00:00Z) in Unix milliseconds.
pub const EPOCH: i64 = 1_420_070_400_000;

/// Largest millisecond offset that fits the 42 timestamp bits.
const MAX_OFFSET: i64 = (1 << 42) - 1;

/// A unique, time-orderable entity identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Snowflake(u64);

impl Snowflake {
    /// Wraps a raw identifier.
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Builds the smallest snowflake created at the given Unix timestamp.
    ///
    /// Timestamps before the epoch clamp to zero; ones past the 42-bit range
    /// clamp to the largest timestamp.
    pub fn from_timestamp(unix_ms: i64) -> Self {
        let offset = unix_ms.saturating_sub(EPOCH).clamp(0, MAX_OFFSET) as u64;
        Self(offset << 22)
    }

    /// Returns the raw integer value.
    pub const fn get(self) -> u64 {
        self.0
    }

    /// Unix timestamp in milliseconds at which this id was generated.
    pub fn timestamp(self) -> i64 {
        (self.0 >> 22) as i64 + EPOCH
    }

    /// Creation time of this id.
    pub fn created_at(self) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(self.timestamp())
            .single()
            .unwrap_or_default()
    }

    /// Internal worker id.
    pub fn worker_id(self) -> u8 {
        ((self.0 & 0x3E_0000) >> 17) as u8
    }

    /// Internal process id.
    pub fn process_id(self) -> u8 {
        ((self.0 & 0x1_F000) >> 12) as u8
    }

    /// Per-process increment.
    pub fn increment(self) -> u16 {
        (self.0 & 0xFFF) as u16
    }
}

impl From<u64> for Snowflake {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

impl From<Snowflake> for u64 {
    fn from(id: Snowflake) -> Self {
        id.0
    }
}

impl FromStr for Snowflake {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().map(Self)
    }
}

impl fmt::Display for Snowflake {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for Snowflake {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Snowflake {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct SnowflakeVisitor;

        impl Visitor<'_> for SnowflakeVisitor {
            type Value = Snowflake;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a snowflake as a decimal string or integer")
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Snowflake, E> {
                Ok(Snowflake(v))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Snowflake, E> {
                u64::try_from(v)
                    .map(Snowflake)
                    .map_err(|_| E::custom("snowflake cannot be negative"))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Snowflake, E> {
                v.parse().map_err(E::custom)
            }
        }

        deserializer.deserialize_any(SnowflakeVisitor)
    }
}
