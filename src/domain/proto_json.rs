//! Serde helpers for the proto3 JSON mapping used by both services:
//! durations travel as `"12.5s"` strings and int64 values as decimal strings.

use serde::{Deserialize, Deserializer, Serializer};
use std::time::Duration;

#[derive(Deserialize)]
#[serde(untagged)]
enum RawNumber {
    Text(String),
    Integer(i64),
}

pub fn format_duration(duration: &Duration) -> String {
    let nanos = duration.subsec_nanos();
    if nanos == 0 {
        format!("{}s", duration.as_secs())
    } else {
        let fraction = format!("{:09}", nanos);
        format!("{}.{}s", duration.as_secs(), fraction.trim_end_matches('0'))
    }
}

pub fn parse_duration(text: &str) -> Result<Duration, String> {
    let body = text
        .trim()
        .strip_suffix('s')
        .ok_or_else(|| format!("duration '{}' must end with 's'", text))?;

    let (whole, fraction) = match body.split_once('.') {
        Some((whole, fraction)) => (whole, fraction),
        None => (body, ""),
    };

    let secs: u64 = if whole.is_empty() {
        0
    } else {
        whole
            .parse()
            .map_err(|_| format!("invalid seconds in duration '{}'", text))?
    };

    if fraction.len() > 9 || !fraction.chars().all(|c| c.is_ascii_digit()) {
        return Err(format!("invalid fractional seconds in duration '{}'", text));
    }
    let nanos: u32 = if fraction.is_empty() {
        0
    } else {
        format!("{:0<9}", fraction)
            .parse()
            .map_err(|_| format!("invalid fractional seconds in duration '{}'", text))?
    };

    Ok(Duration::new(secs, nanos))
}

/// `Option<Duration>` fields; pair with `#[serde(default, skip_serializing_if = "Option::is_none")]`.
pub mod duration_opt {
    use super::*;

    pub fn serialize<S: Serializer>(value: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(duration) => serializer.serialize_str(&format_duration(duration)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Duration>, D::Error> {
        match Option::<RawNumber>::deserialize(deserializer)? {
            None => Ok(None),
            Some(RawNumber::Text(text)) => parse_duration(&text)
                .map(Some)
                .map_err(serde::de::Error::custom),
            Some(RawNumber::Integer(secs)) => u64::try_from(secs)
                .map(|secs| Some(Duration::from_secs(secs)))
                .map_err(|_| serde::de::Error::custom("duration cannot be negative")),
        }
    }
}

pub mod int64 {
    use super::*;

    pub fn serialize<S: Serializer>(value: &i64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
        match RawNumber::deserialize(deserializer)? {
            RawNumber::Integer(value) => Ok(value),
            RawNumber::Text(text) => text.trim().parse().map_err(serde::de::Error::custom),
        }
    }
}
