//! Wire codecs for clock times and weekday names.
//!
//! Appointment times travel as zero-padded 24-hour "HH:MM" strings and are
//! parsed into `NaiveTime` at the boundary, so every later comparison is a
//! real time comparison rather than a string one. "HH:MM:SS" is accepted on
//! input for store round-trips.

use chrono::{NaiveTime, Weekday};
use serde::{de, Deserialize, Deserializer, Serializer};

pub const HHMM: &str = "%H:%M";
pub const HHMMSS: &str = "%H:%M:%S";

pub fn parse_hhmm(value: &str) -> Result<NaiveTime, String> {
    // chrono's %H accepts a single digit, so enforce padding by length.
    let parsed = match value.len() {
        5 => NaiveTime::parse_from_str(value, HHMM),
        8 => NaiveTime::parse_from_str(value, HHMMSS),
        _ => return Err(format!("invalid time '{}', expected zero-padded HH:MM", value)),
    };
    parsed.map_err(|_| format!("invalid time '{}', expected zero-padded HH:MM", value))
}

pub fn format_hhmm(time: NaiveTime) -> String {
    time.format(HHMM).to_string()
}

/// `#[serde(with = "hhmm")]` for `NaiveTime` fields.
pub mod hhmm {
    use super::*;

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format_hhmm(*time))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let value = String::deserialize(deserializer)?;
        parse_hhmm(&value).map_err(de::Error::custom)
    }
}

/// `#[serde(with = "weekday")]` for `chrono::Weekday` fields.
/// Serializes the short English name ("Mon"); parsing is case-insensitive
/// and accepts both short and full names.
pub mod weekday {
    use super::*;

    pub fn serialize<S: Serializer>(day: &Weekday, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&day.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Weekday, D::Error> {
        let value = String::deserialize(deserializer)?;
        value
            .parse::<Weekday>()
            .map_err(|_| de::Error::custom(format!("invalid weekday '{}'", value)))
    }
}
