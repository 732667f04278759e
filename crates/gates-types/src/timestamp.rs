//! Timestamp parsing and serde helpers.
//!
//! Timestamps are written as RFC 3339 with an explicit `+00:00` offset.
//! On input, ISO-8601 values without offset are accepted and treated as UTC.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserializer, Serializer};

/// Parse an ISO-8601 timestamp, assuming UTC when no offset is present.
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    match DateTime::parse_from_rfc3339(raw) {
        Ok(dt) => Ok(dt.with_timezone(&Utc)),
        Err(_) => raw.parse::<NaiveDateTime>().map(|naive| naive.and_utc()),
    }
}

/// Canonical string form used in snapshots, attempt logs and emissions.
pub fn format_timestamp(value: &DateTime<Utc>) -> String {
    value.to_rfc3339()
}

/// `#[serde(with = "timestamp::lenient")]` for a single `DateTime<Utc>`.
pub mod lenient {
    use super::*;
    use serde::de::Error as _;
    use serde::Deserialize;

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format_timestamp(value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse_timestamp(&raw).map_err(|e| D::Error::custom(format!("invalid timestamp {raw:?}: {e}")))
    }
}

/// `#[serde(with = "timestamp::lenient_map")]` for `BTreeMap<String, DateTime<Utc>>`.
pub mod lenient_map {
    use super::*;
    use serde::de::Error as _;
    use serde::ser::SerializeMap;
    use serde::Deserialize;

    pub fn serialize<S: Serializer>(
        value: &BTreeMap<String, DateTime<Utc>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(value.len()))?;
        for (key, ts) in value {
            map.serialize_entry(key, &format_timestamp(ts))?;
        }
        map.end()
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<BTreeMap<String, DateTime<Utc>>, D::Error> {
        let raw = BTreeMap::<String, String>::deserialize(deserializer)?;
        raw.into_iter()
            .map(|(key, value)| match parse_timestamp(&value) {
                Ok(ts) => Ok((key, ts)),
                Err(e) => Err(D::Error::custom(format!(
                    "invalid timestamp for {key:?}: {value:?} ({e})"
                ))),
            })
            .collect()
    }
}
