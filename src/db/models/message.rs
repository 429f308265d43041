use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::db::helpers::timestamp;

/// A chat message posted during a stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub streamer: String,
    #[serde(alias = "username")]
    pub author: String,
    pub contents: String,
    #[serde(with = "timestamp", alias = "datetime")]
    pub timestamp: NaiveDateTime,
}

impl Message {
    pub fn new(
        streamer: impl Into<String>,
        author: impl Into<String>,
        contents: impl Into<String>,
        timestamp: NaiveDateTime,
    ) -> Self {
        Self {
            streamer: streamer.into(),
            author: author.into(),
            contents: contents.into(),
            timestamp,
        }
    }
}
