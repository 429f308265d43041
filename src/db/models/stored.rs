use std::ops::Deref;

use serde::Serialize;

use crate::db::store::DocumentId;

/// A record together with the id the store assigned to it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Stored<T> {
    pub id: DocumentId,
    #[serde(flatten)]
    pub record: T,
}

impl<T> Stored<T> {
    pub fn new(id: DocumentId, record: T) -> Self {
        Self { id, record }
    }

    pub fn into_record(self) -> T {
        self.record
    }
}

impl<T> Deref for Stored<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.record
    }
}
