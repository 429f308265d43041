//! The document-store seam.
//!
//! Everything above this module talks to a [`DocumentStore`]; the embedded
//! SQLite [`Database`](crate::db::Database) is one implementation.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{DbError, Result};

pub type Document = Map<String, Value>;

/// Store-assigned identifier. Ids grow with every insert, so the highest id
/// in a collection is its most recently inserted document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(pub i64);

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Messages,
    Streams,
    Clips,
}

impl Collection {
    pub const ALL: [Collection; 3] = [Collection::Messages, Collection::Streams, Collection::Clips];

    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Messages => "messages",
            Collection::Streams => "streams",
            Collection::Clips => "clips",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Insertion-order sort.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Sort {
    #[default]
    Ascending,
    Descending,
}

/// Field a condition applies to. With more than one name, the first name a
/// document actually carries is compared, so renamed fields still match
/// documents written under their older name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPath(Vec<String>);

impl FieldPath {
    pub fn first_of(names: &[&str]) -> Self {
        Self(names.iter().map(|name| name.to_string()).collect())
    }

    pub fn names(&self) -> &[String] {
        &self.0
    }

    pub fn validate(&self) -> Result<()> {
        if self.0.is_empty() {
            return Err(DbError::InvalidQuery("condition without a field name".into()));
        }
        self.0.iter().try_for_each(|name| validate_field(name))
    }
}

impl From<&str> for FieldPath {
    fn from(name: &str) -> Self {
        Self(vec![name.to_string()])
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join("|"))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Eq(Value),
    Gte(Value),
    Lt(Value),
}

/// Conjunction of field conditions. Range bounds on text fields compare
/// lexicographically, which is why timestamps are stored fixed-width.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    pub id: Option<DocumentId>,
    pub conditions: Vec<(FieldPath, Condition)>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn by_id(id: DocumentId) -> Self {
        Self {
            id: Some(id),
            conditions: Vec::new(),
        }
    }

    pub fn id(mut self, id: DocumentId) -> Self {
        self.id = Some(id);
        self
    }

    pub fn equals(mut self, field: impl Into<FieldPath>, value: impl Into<Value>) -> Self {
        self.conditions
            .push((field.into(), Condition::Eq(value.into())));
        self
    }

    pub fn gte(mut self, field: impl Into<FieldPath>, value: impl Into<Value>) -> Self {
        self.conditions
            .push((field.into(), Condition::Gte(value.into())));
        self
    }

    pub fn lt(mut self, field: impl Into<FieldPath>, value: impl Into<Value>) -> Self {
        self.conditions
            .push((field.into(), Condition::Lt(value.into())));
        self
    }

    /// Half-open range `[start, end)` on `field`.
    pub fn range(
        self,
        field: impl Into<FieldPath>,
        start: impl Into<Value>,
        end: impl Into<Value>,
    ) -> Self {
        let field = field.into();
        self.gte(field.clone(), start).lt(field, end)
    }

    pub fn validate(&self) -> Result<()> {
        for (field, condition) in &self.conditions {
            field.validate()?;
            match condition {
                Condition::Eq(_) => {}
                Condition::Gte(value) | Condition::Lt(value) => {
                    if !(value.is_string() || value.is_number()) {
                        return Err(DbError::InvalidQuery(format!(
                            "range bound on '{field}' must be text or a number"
                        )));
                    }
                }
            }
        }
        Ok(())
    }
}

/// Top-level field assignments applied by [`DocumentStore::update_one`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Update {
    pub set: Document,
}

impl Update {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.set.insert(field.to_string(), value.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.set.is_empty()
    }

    pub fn validate(&self) -> Result<()> {
        self.set.keys().try_for_each(|field| validate_field(field))
    }

    pub fn apply(&self, document: &mut Document) {
        for (field, value) in &self.set {
            document.insert(field.clone(), value.clone());
        }
    }
}

/// Field names end up in JSON paths, so only plain identifiers are accepted.
pub fn validate_field(field: &str) -> Result<()> {
    let mut chars = field.chars();
    let valid = match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    };
    if valid {
        Ok(())
    } else {
        Err(DbError::InvalidQuery(format!("invalid field name '{field}'")))
    }
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn insert_one(&self, collection: Collection, document: Document) -> Result<DocumentId>;

    async fn find(
        &self,
        collection: Collection,
        filter: Filter,
        sort: Sort,
    ) -> Result<Vec<(DocumentId, Document)>>;

    async fn find_one(
        &self,
        collection: Collection,
        filter: Filter,
        sort: Sort,
    ) -> Result<Option<(DocumentId, Document)>>;

    /// Updates the first matching document in insertion order and returns
    /// the number of matched documents (0 or 1).
    async fn update_one(&self, collection: Collection, filter: Filter, update: Update)
        -> Result<u64>;

    async fn delete_many(&self, collection: Collection, filter: Filter) -> Result<u64>;

    async fn count(&self, collection: Collection, filter: Filter) -> Result<u64>;

    /// Removes every document from every collection.
    async fn drop_all(&self) -> Result<()>;
}

#[async_trait]
impl<S> DocumentStore for std::sync::Arc<S>
where
    S: DocumentStore + ?Sized,
{
    async fn insert_one(&self, collection: Collection, document: Document) -> Result<DocumentId> {
        (**self).insert_one(collection, document).await
    }

    async fn find(
        &self,
        collection: Collection,
        filter: Filter,
        sort: Sort,
    ) -> Result<Vec<(DocumentId, Document)>> {
        (**self).find(collection, filter, sort).await
    }

    async fn find_one(
        &self,
        collection: Collection,
        filter: Filter,
        sort: Sort,
    ) -> Result<Option<(DocumentId, Document)>> {
        (**self).find_one(collection, filter, sort).await
    }

    async fn update_one(
        &self,
        collection: Collection,
        filter: Filter,
        update: Update,
    ) -> Result<u64> {
        (**self).update_one(collection, filter, update).await
    }

    async fn delete_many(&self, collection: Collection, filter: Filter) -> Result<u64> {
        (**self).delete_many(collection, filter).await
    }

    async fn count(&self, collection: Collection, filter: Filter) -> Result<u64> {
        (**self).count(collection, filter).await
    }

    async fn drop_all(&self) -> Result<()> {
        (**self).drop_all().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn field_names_must_be_identifiers() {
        assert!(validate_field("started_at").is_ok());
        assert!(validate_field("_private").is_ok());
        assert!(validate_field("").is_err());
        assert!(validate_field("1st").is_err());
        assert!(validate_field("a.b").is_err());
        assert!(validate_field("x') OR 1=1 --").is_err());
    }

    #[test]
    fn range_bounds_must_be_comparable() {
        let ok = Filter::new().range("timestamp", "2021-01-01", "2021-01-02");
        assert!(ok.validate().is_ok());

        let bad = Filter::new().gte("viewers", json!(null));
        assert!(matches!(bad.validate(), Err(DbError::InvalidQuery(_))));
    }

    #[test]
    fn field_paths_validate_every_name() {
        let legacy = FieldPath::first_of(&["started_at", "datetime"]);
        assert!(legacy.validate().is_ok());
        assert_eq!(legacy.to_string(), "started_at|datetime");

        assert!(FieldPath::first_of(&[]).validate().is_err());
        assert!(FieldPath::first_of(&["started_at", "a.b"]).validate().is_err());
    }

    #[test]
    fn update_overwrites_only_named_fields() {
        let mut doc = Document::new();
        doc.insert("title".into(), json!("old"));
        doc.insert("viewers".into(), json!(3));

        Update::new().set("title", "new").apply(&mut doc);

        assert_eq!(doc["title"], json!("new"));
        assert_eq!(doc["viewers"], json!(3));
    }
}
