use chrono::{Duration, NaiveDateTime};
use serde::{de, de::DeserializeOwned, Deserialize, Deserializer, Serializer};
use serde_json::Value;

use crate::{
    db::store::{Document, DocumentId},
    duration::duration_to_secs,
    error::{DbError, Result},
};

/// Fixed-width, zero-padded encoding. Text comparison of two encoded values
/// matches chronological order, which range filters rely on.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

const ACCEPTED_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
];

pub fn format_timestamp(value: &NaiveDateTime) -> String {
    value.format(TIMESTAMP_FORMAT).to_string()
}

pub fn parse_timestamp(value: &str, field: &str) -> Result<NaiveDateTime> {
    let trimmed = value.trim();
    ACCEPTED_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(trimmed, format).ok())
        .ok_or_else(|| DbError::InvalidData(format!("failed to parse {field} '{value}'")))
}

pub fn to_i64(value: u64, field: &str) -> Result<i64> {
    i64::try_from(value)
        .map_err(|_| DbError::InvalidData(format!("{field} value {value} exceeds INTEGER range")))
}

/// Turns a stored document into a record, mapping decode failures to
/// [`DbError::InvalidData`] with the offending document id.
pub fn decode<T>(id: DocumentId, document: Document) -> Result<T>
where
    T: DeserializeOwned,
{
    serde_json::from_value(Value::Object(document))
        .map_err(|err| DbError::InvalidData(format!("document {id}: {err}")))
}

pub fn encode<T: serde::Serialize>(record: &T) -> Result<Document> {
    match serde_json::to_value(record)? {
        Value::Object(map) => Ok(map),
        other => Err(DbError::InvalidData(format!(
            "record serialized to {other} instead of an object"
        ))),
    }
}

pub mod timestamp {
    use super::*;

    pub fn serialize<S: Serializer>(
        value: &NaiveDateTime,
        serializer: S,
    ) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&format_timestamp(value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> std::result::Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse_timestamp(&raw, "timestamp").map_err(de::Error::custom)
    }
}

/// Whole seconds, accepting either an integer or a `XXhXXmXXs` string.
pub mod duration_secs {
    use super::*;

    pub fn serialize<S: Serializer>(
        value: &u64,
        serializer: S,
    ) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_u64(*value)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> std::result::Result<u64, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::Number(number) => number
                .as_u64()
                .ok_or_else(|| {
                    de::Error::custom(format!(
                        "duration must be a non-negative integer, got {number}"
                    ))
                }),
            Value::String(text) => Ok(duration_to_secs(&text)),
            other => Err(de::Error::custom(format!("unsupported duration value {other}"))),
        }
    }
}

/// Counts that older writers stored as numeric strings.
pub mod lenient_count {
    use super::*;

    pub fn parse(value: Value) -> std::result::Result<u64, String> {
        match value {
            Value::Number(number) => number
                .as_u64()
                .ok_or_else(|| format!("count must be a non-negative integer, got {number}")),
            Value::String(text) => text
                .trim()
                .parse::<u64>()
                .map_err(|_| format!("count '{text}' is not a number")),
            other => Err(format!("unsupported count value {other}")),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> std::result::Result<u64, D::Error> {
        parse(Value::deserialize(deserializer)?).map_err(de::Error::custom)
    }

    pub mod option {
        use super::*;

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> std::result::Result<Option<u64>, D::Error> {
            match Option::<Value>::deserialize(deserializer)? {
                None | Some(Value::Null) => Ok(None),
                Some(value) => super::parse(value).map(Some).map_err(de::Error::custom),
            }
        }
    }
}

pub fn serialize_offset_secs<S: Serializer>(
    value: &Duration,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_i64(value.num_seconds())
}
