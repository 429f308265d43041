use thiserror::Error;

pub type Result<T> = std::result::Result<T, DbError>;

#[derive(Debug, Clone, Error)]
pub enum DbError {
    /// No reference record exists for the subject. Callers should treat this
    /// as an ordinary outcome, e.g. a streamer's first stream.
    #[error("no {collection} record found for {subject}")]
    NotFound {
        collection: &'static str,
        subject: String,
    },

    #[error("invalid data: {0}")]
    InvalidData(String),

    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("store error: {0}")]
    Store(String),

    #[error("invalid query: {0}")]
    InvalidQuery(String),

    #[error("configuration error: {0}")]
    Config(String),
}

impl DbError {
    pub fn not_found(collection: &'static str, subject: impl Into<String>) -> Self {
        DbError::NotFound {
            collection,
            subject: subject.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, DbError::NotFound { .. })
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(err: rusqlite::Error) -> Self {
        DbError::Store(err.to_string())
    }
}

impl From<serde_json::Error> for DbError {
    fn from(err: serde_json::Error) -> Self {
        DbError::InvalidData(err.to_string())
    }
}

impl From<anyhow::Error> for DbError {
    fn from(err: anyhow::Error) -> Self {
        if let Some(db_err) = err.downcast_ref::<DbError>() {
            return db_err.clone();
        }
        DbError::Store(format!("{err:#}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn anyhow_wrapping_keeps_kind() {
        let inner: std::result::Result<(), DbError> =
            Err(DbError::InvalidQuery("bad field".into()));
        let wrapped = inner.context("while building filter").unwrap_err();
        let err: DbError = wrapped.into();
        assert!(matches!(err, DbError::InvalidQuery(msg) if msg == "bad field"));
    }

    #[test]
    fn plain_anyhow_becomes_store_error() {
        let err: DbError = anyhow::anyhow!("disk I/O error").into();
        assert!(matches!(err, DbError::Store(msg) if msg.contains("disk I/O")));
    }
}
