use chrono::Local;

use crate::{
    client::DbClient,
    db::{
        models::{Message, Stream},
        store::DocumentStore,
    },
    error::Result,
    log_info,
};

const ENABLE_LOGS: bool = true;

pub const SEED_STREAMER: &str = "teststreamer";

impl<S: DocumentStore> DbClient<S> {
    /// Drops every collection and seeds one message and one stream for
    /// [`SEED_STREAMER`]. All existing data is lost.
    pub async fn recreate(&self) -> Result<()> {
        self.store().drop_all().await?;

        let now = Local::now().naive_local();
        self.insert_message(&Message::new(
            SEED_STREAMER,
            "testUser",
            "I am posting a new message",
            now,
        ))
        .await?;
        self.insert_stream(&Stream::new(SEED_STREAMER, now, 9002, 0u64))
            .await?;

        log_info!("Database recreated");
        Ok(())
    }
}
