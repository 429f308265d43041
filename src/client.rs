use serde::{de::DeserializeOwned, Serialize};

use crate::{
    config::DbConfig,
    db::{
        helpers::{decode, encode},
        models::Stored,
        store::{Collection, DocumentId, DocumentStore, Filter, Sort},
        Database,
    },
    error::Result,
};

/// Typed access to messages, streams and clips on top of a [`DocumentStore`].
///
/// Each call goes straight to the store; the client itself holds no state
/// besides the store handle.
#[derive(Debug, Clone)]
pub struct DbClient<S = Database> {
    store: S,
}

impl DbClient<Database> {
    /// Opens the embedded store described by `config`.
    pub fn connect(config: &DbConfig) -> Result<Self> {
        Ok(Self::with_store(Database::open(config)?))
    }
}

impl<S: DocumentStore> DbClient<S> {
    pub fn with_store(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub(crate) async fn insert_record<T: Serialize>(
        &self,
        collection: Collection,
        record: &T,
    ) -> Result<DocumentId> {
        self.store.insert_one(collection, encode(record)?).await
    }

    pub(crate) async fn find_records<T: DeserializeOwned>(
        &self,
        collection: Collection,
        filter: Filter,
    ) -> Result<Vec<Stored<T>>> {
        self.store
            .find(collection, filter, Sort::Ascending)
            .await?
            .into_iter()
            .map(|(id, document)| decode(id, document).map(|record| Stored::new(id, record)))
            .collect()
    }

    pub(crate) async fn find_record<T: DeserializeOwned>(
        &self,
        collection: Collection,
        filter: Filter,
        sort: Sort,
    ) -> Result<Option<Stored<T>>> {
        match self.store.find_one(collection, filter, sort).await? {
            Some((id, document)) => Ok(Some(Stored::new(id, decode(id, document)?))),
            None => Ok(None),
        }
    }
}
