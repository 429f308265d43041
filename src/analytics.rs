//! Time-relative analytics over a reference window.
//!
//! A reference record (a stream, or a clip) defines the window
//! `[started_at, started_at + duration)`. The calculators query the records
//! of the same streamer that fall inside the window and express each one as
//! an offset from the window start.

use chrono::{Datelike, Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::{
    client::DbClient,
    db::{
        helpers::{duration_secs, serialize_offset_secs, timestamp},
        models::{Clip, Stored, Stream},
        repositories::{messages::messages_in_window, streams::streams_in_window},
        store::{Collection, DocumentId, DocumentStore, Filter, Sort},
    },
    error::{DbError, Result},
    log_debug,
};

const ENABLE_LOGS: bool = true;

const MINUTE_SECS: u64 = 60;

/// Last year whose timestamps keep the fixed-width text encoding.
const MAX_YEAR: i32 = 9999;

/// Which record defines the analysis window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReferenceSelector {
    /// The most recently inserted stream of the streamer.
    #[default]
    Latest,
    Stream(DocumentId),
    Clip(DocumentId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceWindow {
    pub streamer: String,
    pub start: NaiveDateTime,
    pub duration_secs: u64,
}

impl ReferenceWindow {
    pub fn new(streamer: impl Into<String>, start: NaiveDateTime, duration_secs: u64) -> Self {
        Self {
            streamer: streamer.into(),
            start,
            duration_secs,
        }
    }

    /// Exclusive end of the window.
    pub fn end(&self) -> Result<NaiveDateTime> {
        self.shifted(self.duration_secs)
    }

    /// Number of one-minute buckets covering the window, rounding up.
    pub fn minutes(&self) -> u64 {
        self.duration_secs.div_ceil(MINUTE_SECS)
    }

    /// Bounds of minute bucket `index`, `[start + 60·index, start + 60·(index + 1))`.
    pub fn minute_bounds(&self, index: u64) -> Result<(NaiveDateTime, NaiveDateTime)> {
        let from = index.saturating_mul(MINUTE_SECS);
        Ok((
            self.shifted(from)?,
            self.shifted(from.saturating_add(MINUTE_SECS))?,
        ))
    }

    pub fn offset_of(&self, at: NaiveDateTime) -> Duration {
        at - self.start
    }

    fn shifted(&self, secs: u64) -> Result<NaiveDateTime> {
        i64::try_from(secs)
            .ok()
            .and_then(Duration::try_seconds)
            .and_then(|delta| self.start.checked_add_signed(delta))
            .filter(|at| (0..=MAX_YEAR).contains(&at.year()))
            .ok_or_else(|| {
                DbError::InvalidData(format!(
                    "window of {}s starting at {} is out of range",
                    secs, self.start
                ))
            })
    }
}

/// The fields a reference record contributes to the window. Other fields,
/// such as a viewer count, are not read.
#[derive(Debug, Deserialize)]
struct ReferenceFields {
    streamer: String,
    #[serde(with = "timestamp", alias = "datetime")]
    started_at: NaiveDateTime,
    #[serde(rename = "duration", with = "duration_secs")]
    duration_secs: u64,
}

impl From<ReferenceFields> for ReferenceWindow {
    fn from(fields: ReferenceFields) -> Self {
        Self::new(fields.streamer, fields.started_at, fields.duration_secs)
    }
}

impl From<&Stream> for ReferenceWindow {
    fn from(stream: &Stream) -> Self {
        Self::new(stream.streamer.clone(), stream.started_at, stream.duration_secs)
    }
}

impl From<&Clip> for ReferenceWindow {
    fn from(clip: &Clip) -> Self {
        Self::new(clip.streamer.clone(), clip.started_at, clip.duration_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ViewerSample {
    #[serde(rename = "offset_secs", serialize_with = "serialize_offset_secs")]
    pub offset: Duration,
    pub viewers: u64,
    pub streamer: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MessageRateSample {
    #[serde(rename = "start_offset_secs", serialize_with = "serialize_offset_secs")]
    pub start_offset: Duration,
    #[serde(rename = "end_offset_secs", serialize_with = "serialize_offset_secs")]
    pub end_offset: Duration,
    pub message_count: u64,
    pub streamer: String,
}

/// Maps viewer samples onto the window, keeping the order they came in.
pub fn viewer_samples(
    window: &ReferenceWindow,
    snapshots: &[Stored<Stream>],
) -> Vec<ViewerSample> {
    snapshots
        .iter()
        .map(|snapshot| ViewerSample {
            offset: window.offset_of(snapshot.started_at),
            viewers: snapshot.viewers,
            streamer: window.streamer.clone(),
        })
        .collect()
}

impl<S: DocumentStore> DbClient<S> {
    /// Resolves the window for `streamer`. Explicit ids must belong to the
    /// streamer, otherwise the record counts as missing.
    pub async fn resolve_reference(
        &self,
        streamer: &str,
        selector: ReferenceSelector,
    ) -> Result<ReferenceWindow> {
        let by_streamer = Filter::new().equals("streamer", streamer);
        let (collection, filter, sort) = match selector {
            ReferenceSelector::Latest => (Collection::Streams, by_streamer, Sort::Descending),
            ReferenceSelector::Stream(id) => {
                (Collection::Streams, by_streamer.id(id), Sort::Ascending)
            }
            ReferenceSelector::Clip(id) => (Collection::Clips, by_streamer.id(id), Sort::Ascending),
        };

        let window = self
            .find_record::<ReferenceFields>(collection, filter, sort)
            .await?
            .map(|stored| ReferenceWindow::from(stored.into_record()))
            .ok_or_else(|| {
                let subject = match selector {
                    ReferenceSelector::Latest => streamer.to_string(),
                    ReferenceSelector::Stream(id) | ReferenceSelector::Clip(id) => {
                        format!("{streamer} (id {id})")
                    }
                };
                DbError::not_found(collection.as_str(), subject)
            })?;

        window.end()?;
        Ok(window)
    }

    /// Viewer counts of the streamer's stream snapshots taken inside the
    /// reference window, as offsets from the window start.
    pub async fn viewers_over_time(
        &self,
        streamer: &str,
        selector: ReferenceSelector,
    ) -> Result<Vec<ViewerSample>> {
        let window = self.resolve_reference(streamer, selector).await?;
        let end = window.end()?;

        let snapshots: Vec<Stored<Stream>> = self
            .find_records(
                Collection::Streams,
                streams_in_window(&window.streamer, &window.start, &end),
            )
            .await?;

        Ok(viewer_samples(&window, &snapshots))
    }

    /// Messages per minute across the reference window. Minutes without
    /// messages are left out, so the result is sparse.
    pub async fn message_rate_over_time(
        &self,
        streamer: &str,
        selector: ReferenceSelector,
    ) -> Result<Vec<MessageRateSample>> {
        let window = self.resolve_reference(streamer, selector).await?;

        let mut samples = Vec::new();
        for minute in 0..window.minutes() {
            let (from, to) = window.minute_bounds(minute)?;
            let message_count = self
                .store()
                .count(
                    Collection::Messages,
                    messages_in_window(&window.streamer, &from, &to),
                )
                .await?;
            if message_count == 0 {
                continue;
            }

            let sample = MessageRateSample {
                start_offset: window.offset_of(from),
                end_offset: window.offset_of(to),
                message_count,
                streamer: window.streamer.clone(),
            };
            log_debug!(
                "Adding data for {}s to {}s: {} messages",
                sample.start_offset.num_seconds(),
                sample.end_offset.num_seconds(),
                message_count
            );
            samples.push(sample);
        }

        let total = self.count_messages(&window.streamer).await?;
        log_debug!("Total messages for {}: {}", window.streamer, total);

        Ok(samples)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn start() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2021, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    #[test]
    fn minutes_round_up() {
        assert_eq!(ReferenceWindow::new("s", start(), 0).minutes(), 0);
        assert_eq!(ReferenceWindow::new("s", start(), 1).minutes(), 1);
        assert_eq!(ReferenceWindow::new("s", start(), 60).minutes(), 1);
        assert_eq!(ReferenceWindow::new("s", start(), 125).minutes(), 3);
    }

    #[test]
    fn minute_bounds_are_contiguous() {
        let window = ReferenceWindow::new("s", start(), 125);
        let (a_from, a_to) = window.minute_bounds(0).unwrap();
        let (b_from, b_to) = window.minute_bounds(1).unwrap();
        assert_eq!(a_from, start());
        assert_eq!(a_to, b_from);
        assert_eq!(window.offset_of(b_to), Duration::seconds(120));
    }

    #[test]
    fn end_overflow_is_invalid_data() {
        let window = ReferenceWindow::new("s", start(), u64::MAX);
        assert!(matches!(window.end(), Err(DbError::InvalidData(_))));
    }

    #[test]
    fn window_may_not_leave_four_digit_years() {
        let last_minute = NaiveDate::from_ymd_opt(9999, 12, 31)
            .unwrap()
            .and_hms_opt(23, 59, 0)
            .unwrap();
        assert!(ReferenceWindow::new("s", last_minute, 59).end().is_ok());
        assert!(matches!(
            ReferenceWindow::new("s", last_minute, 120).end(),
            Err(DbError::InvalidData(_))
        ));
    }

    #[test]
    fn reference_fields_ignore_viewer_counts() {
        let fields: ReferenceFields = serde_json::from_value(serde_json::json!({
            "streamer": "s",
            "datetime": "2021-01-01 00:00:00",
            "numviewers": "not a number",
            "duration": "2m",
        }))
        .unwrap();
        assert_eq!(
            ReferenceWindow::from(fields),
            ReferenceWindow::new("s", start(), 120)
        );
    }

    #[test]
    fn viewer_samples_keep_input_order() {
        let window = ReferenceWindow::new("s", start(), 600);
        let snapshot = |id: i64, secs: i64, viewers: u64| {
            Stored::new(
                DocumentId(id),
                Stream::new("s", start() + Duration::seconds(secs), viewers, 600u64),
            )
        };
        let samples = viewer_samples(&window, &[snapshot(2, 120, 7), snapshot(1, 30, 5)]);

        let offsets: Vec<i64> = samples.iter().map(|s| s.offset.num_seconds()).collect();
        assert_eq!(offsets, vec![120, 30]);
        assert_eq!(samples[0].viewers, 7);
        assert!(samples.iter().all(|s| s.streamer == "s"));
    }

    #[test]
    fn samples_serialize_offsets_as_seconds() {
        let sample = MessageRateSample {
            start_offset: Duration::seconds(60),
            end_offset: Duration::seconds(120),
            message_count: 4,
            streamer: "s".into(),
        };
        let value = serde_json::to_value(&sample).unwrap();
        assert_eq!(value["start_offset_secs"], 60);
        assert_eq!(value["end_offset_secs"], 120);
        assert_eq!(value["message_count"], 4);
    }
}
