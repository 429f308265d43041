use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::{
    db::helpers::{duration_secs, lenient_count, timestamp},
    duration::duration_to_secs,
};

/// A stream snapshot. The first snapshot of a broadcast doubles as the
/// reference record for analytics; later ones act as viewer samples.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stream {
    pub streamer: String,
    #[serde(with = "timestamp", alias = "datetime")]
    pub started_at: NaiveDateTime,
    #[serde(
        alias = "numviewers",
        deserialize_with = "lenient_count::deserialize"
    )]
    pub viewers: u64,
    #[serde(rename = "duration", with = "duration_secs")]
    pub duration_secs: u64,
}

impl Stream {
    pub fn new(
        streamer: impl Into<String>,
        started_at: NaiveDateTime,
        viewers: u64,
        duration: impl Into<DurationInput>,
    ) -> Self {
        Self {
            streamer: streamer.into(),
            started_at,
            viewers,
            duration_secs: duration.into().secs(),
        }
    }
}

/// A duration as callers receive it: already in seconds, or as a platform
/// string like `"1h2m3s"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DurationInput {
    Seconds(u64),
    Text(String),
}

impl DurationInput {
    pub fn secs(&self) -> u64 {
        match self {
            DurationInput::Seconds(secs) => *secs,
            DurationInput::Text(text) => duration_to_secs(text),
        }
    }
}

impl From<u64> for DurationInput {
    fn from(secs: u64) -> Self {
        DurationInput::Seconds(secs)
    }
}

impl From<&str> for DurationInput {
    fn from(text: &str) -> Self {
        DurationInput::Text(text.to_string())
    }
}

impl From<String> for DurationInput {
    fn from(text: String) -> Self {
        DurationInput::Text(text)
    }
}
