use chrono::NaiveDateTime;

use crate::{
    client::DbClient,
    db::{
        helpers::format_timestamp,
        models::{Message, Stored},
        store::{Collection, DocumentId, DocumentStore, FieldPath, Filter, Sort},
    },
    error::Result,
};

/// Older writers stored the time under `datetime`.
pub(crate) fn messages_in_window(
    streamer: &str,
    start: &NaiveDateTime,
    end: &NaiveDateTime,
) -> Filter {
    Filter::new().equals("streamer", streamer).range(
        FieldPath::first_of(&["timestamp", "datetime"]),
        format_timestamp(start),
        format_timestamp(end),
    )
}

impl<S: DocumentStore> DbClient<S> {
    pub async fn insert_message(&self, message: &Message) -> Result<DocumentId> {
        self.insert_record(Collection::Messages, message).await
    }

    pub async fn get_message(&self, id: DocumentId) -> Result<Option<Stored<Message>>> {
        self.find_record(Collection::Messages, Filter::by_id(id), Sort::Ascending)
            .await
    }

    pub async fn messages_for_streamer(&self, streamer: &str) -> Result<Vec<Stored<Message>>> {
        self.find_records(Collection::Messages, Filter::new().equals("streamer", streamer))
            .await
    }

    /// Messages posted in `[start, end)`.
    pub async fn messages_in_range(
        &self,
        streamer: &str,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Vec<Stored<Message>>> {
        self.find_records(
            Collection::Messages,
            messages_in_window(streamer, &start, &end),
        )
        .await
    }

    pub async fn count_messages(&self, streamer: &str) -> Result<u64> {
        self.store()
            .count(Collection::Messages, Filter::new().equals("streamer", streamer))
            .await
    }

    pub async fn delete_messages_for_streamer(&self, streamer: &str) -> Result<u64> {
        self.store()
            .delete_many(Collection::Messages, Filter::new().equals("streamer", streamer))
            .await
    }
}
