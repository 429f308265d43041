use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::{
    db::{
        helpers::{duration_secs, lenient_count, timestamp, to_i64},
        models::DurationInput,
        store::{Filter, Update},
    },
    error::Result,
};

/// A video clip cut from a stream on some platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Clip {
    pub streamer: String,
    pub platform: String,
    pub platform_video_id: String,
    #[serde(with = "timestamp", alias = "datetime")]
    pub started_at: NaiveDateTime,
    #[serde(rename = "duration", with = "duration_secs")]
    pub duration_secs: u64,
    #[serde(
        default,
        alias = "numviewers",
        deserialize_with = "lenient_count::option::deserialize",
        skip_serializing_if = "Option::is_none"
    )]
    pub viewers: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl Clip {
    pub fn new(
        streamer: impl Into<String>,
        platform: impl Into<String>,
        platform_video_id: impl Into<String>,
        started_at: NaiveDateTime,
        duration: impl Into<DurationInput>,
    ) -> Self {
        Self {
            streamer: streamer.into(),
            platform: platform.into(),
            platform_video_id: platform_video_id.into(),
            started_at,
            duration_secs: duration.into().secs(),
            viewers: None,
            title: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_viewers(mut self, viewers: u64) -> Self {
        self.viewers = Some(viewers);
        self
    }
}

/// Fields of a clip that may change after ingestion.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClipUpdate {
    pub title: Option<String>,
    pub viewers: Option<u64>,
}

impl ClipUpdate {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.viewers.is_none()
    }

    pub(crate) fn to_update(&self) -> Result<Update> {
        let mut update = Update::new();
        if let Some(title) = &self.title {
            update = update.set("title", title.as_str());
        }
        if let Some(viewers) = self.viewers {
            update = update.set("viewers", to_i64(viewers, "viewers")?);
        }
        Ok(update)
    }
}

/// Selects clips for bulk deletion. At least one field must be set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClipFilter {
    pub streamer: Option<String>,
    pub platform: Option<String>,
}

impl ClipFilter {
    pub fn streamer(streamer: impl Into<String>) -> Self {
        Self {
            streamer: Some(streamer.into()),
            platform: None,
        }
    }

    pub fn platform(mut self, platform: impl Into<String>) -> Self {
        self.platform = Some(platform.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.streamer.is_none() && self.platform.is_none()
    }

    pub(crate) fn to_filter(&self) -> Filter {
        let mut filter = Filter::new();
        if let Some(streamer) = &self.streamer {
            filter = filter.equals("streamer", streamer.as_str());
        }
        if let Some(platform) = &self.platform {
            filter = filter.equals("platform", platform.as_str());
        }
        filter
    }
}
