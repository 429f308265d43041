use crate::{
    client::DbClient,
    db::{
        models::{Clip, ClipFilter, ClipUpdate, Stored},
        store::{Collection, DocumentId, DocumentStore, Filter, Sort},
    },
    error::{DbError, Result},
};

impl<S: DocumentStore> DbClient<S> {
    pub async fn insert_clip(&self, clip: &Clip) -> Result<DocumentId> {
        self.insert_record(Collection::Clips, clip).await
    }

    pub async fn get_clip(&self, id: DocumentId) -> Result<Option<Stored<Clip>>> {
        self.find_record(Collection::Clips, Filter::by_id(id), Sort::Ascending)
            .await
    }

    pub async fn clips_for_streamer(&self, streamer: &str) -> Result<Vec<Stored<Clip>>> {
        self.find_records(Collection::Clips, Filter::new().equals("streamer", streamer))
            .await
    }

    /// Looks a clip up by the id the hosting platform gave it. When the same
    /// clip was ingested twice the most recent copy wins.
    pub async fn find_clip_by_platform_id(
        &self,
        platform: &str,
        platform_video_id: &str,
    ) -> Result<Option<Stored<Clip>>> {
        self.find_record(
            Collection::Clips,
            Filter::new()
                .equals("platform", platform)
                .equals("platform_video_id", platform_video_id),
            Sort::Descending,
        )
        .await
    }

    /// Applies `changes` and reads the clip back. `None` when the clip does
    /// not exist.
    pub async fn update_clip(
        &self,
        id: DocumentId,
        changes: &ClipUpdate,
    ) -> Result<Option<Stored<Clip>>> {
        if !changes.is_empty() {
            let matched = self
                .store()
                .update_one(Collection::Clips, Filter::by_id(id), changes.to_update()?)
                .await?;
            if matched == 0 {
                return Ok(None);
            }
        }
        self.get_clip(id).await
    }

    pub async fn delete_clips(&self, filter: &ClipFilter) -> Result<u64> {
        if filter.is_empty() {
            return Err(DbError::InvalidQuery(
                "refusing to delete clips without a streamer or platform".into(),
            ));
        }
        self.store()
            .delete_many(Collection::Clips, filter.to_filter())
            .await
    }
}
