use chrono::NaiveDateTime;

use crate::{
    client::DbClient,
    db::{
        helpers::{format_timestamp, to_i64},
        models::{Stored, Stream},
        store::{Collection, DocumentId, DocumentStore, FieldPath, Filter, Sort, Update},
    },
    error::Result,
};

/// Older writers stored the time under `datetime`.
pub(crate) fn streams_in_window(
    streamer: &str,
    start: &NaiveDateTime,
    end: &NaiveDateTime,
) -> Filter {
    Filter::new().equals("streamer", streamer).range(
        FieldPath::first_of(&["started_at", "datetime"]),
        format_timestamp(start),
        format_timestamp(end),
    )
}

impl<S: DocumentStore> DbClient<S> {
    pub async fn insert_stream(&self, stream: &Stream) -> Result<DocumentId> {
        self.insert_record(Collection::Streams, stream).await
    }

    pub async fn get_stream(&self, id: DocumentId) -> Result<Option<Stored<Stream>>> {
        self.find_record(Collection::Streams, Filter::by_id(id), Sort::Ascending)
            .await
    }

    /// The most recently inserted stream for `streamer`.
    pub async fn latest_stream(&self, streamer: &str) -> Result<Option<Stored<Stream>>> {
        self.find_record(
            Collection::Streams,
            Filter::new().equals("streamer", streamer),
            Sort::Descending,
        )
        .await
    }

    /// Stream snapshots whose start falls in `[start, end)`.
    pub async fn streams_in_range(
        &self,
        streamer: &str,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Vec<Stored<Stream>>> {
        self.find_records(
            Collection::Streams,
            streams_in_window(streamer, &start, &end),
        )
        .await
    }

    /// Returns `false` when no stream has the given id.
    pub async fn update_stream_viewers(&self, id: DocumentId, viewers: u64) -> Result<bool> {
        let viewers = to_i64(viewers, "viewers")?;
        let matched = self
            .store()
            .update_one(
                Collection::Streams,
                Filter::by_id(id),
                Update::new().set("viewers", viewers),
            )
            .await?;
        Ok(matched > 0)
    }

    pub async fn delete_streams_for_streamer(&self, streamer: &str) -> Result<u64> {
        self.store()
            .delete_many(Collection::Streams, Filter::new().equals("streamer", streamer))
            .await
    }
}
