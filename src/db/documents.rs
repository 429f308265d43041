use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, params_from_iter, types::Value as SqlValue, Connection, OptionalExtension};
use serde_json::Value;

use crate::{
    db::{
        connection::Database,
        store::{
            Collection, Condition, Document, DocumentId, DocumentStore, FieldPath, Filter, Sort,
            Update,
        },
    },
    error::{DbError, Result},
};

fn to_sql_value(field: &str, value: &Value) -> Result<SqlValue> {
    match value {
        Value::Null => Ok(SqlValue::Null),
        Value::Bool(flag) => Ok(SqlValue::Integer(i64::from(*flag))),
        Value::Number(number) => match number.as_i64() {
            Some(int) => Ok(SqlValue::Integer(int)),
            None => number
                .as_f64()
                .map(SqlValue::Real)
                .ok_or_else(|| DbError::InvalidQuery(format!("'{field}' is out of range"))),
        },
        Value::String(text) => Ok(SqlValue::Text(text.clone())),
        Value::Array(_) | Value::Object(_) => Err(DbError::InvalidQuery(format!(
            "'{field}' can only be matched against scalar values"
        ))),
    }
}

/// `json_extract` over each name of `field`, falling back left to right.
fn field_expr(field: &FieldPath, params: &mut Vec<SqlValue>) -> String {
    let extracts: Vec<&str> = field
        .names()
        .iter()
        .map(|name| {
            params.push(SqlValue::Text(format!("$.{name}")));
            "json_extract(body, ?)"
        })
        .collect();
    match extracts.as_slice() {
        [single] => single.to_string(),
        _ => format!("COALESCE({})", extracts.join(", ")),
    }
}

/// Compiled `WHERE` clause with its positional parameters.
struct WhereClause {
    sql: String,
    params: Vec<SqlValue>,
}

impl WhereClause {
    fn build(collection: Collection, filter: &Filter) -> Result<Self> {
        filter.validate()?;

        let mut clauses = vec!["collection = ?".to_string()];
        let mut params = vec![SqlValue::Text(collection.as_str().to_string())];

        if let Some(id) = filter.id {
            clauses.push("id = ?".to_string());
            params.push(SqlValue::Integer(id.0));
        }

        for (field, condition) in &filter.conditions {
            let expr = field_expr(field, &mut params);
            let name = field.to_string();
            match condition {
                Condition::Eq(Value::Null) => {
                    clauses.push(format!("{expr} IS NULL"));
                }
                Condition::Eq(value) => {
                    clauses.push(format!("{expr} = ?"));
                    params.push(to_sql_value(&name, value)?);
                }
                Condition::Gte(value) => {
                    clauses.push(format!("{expr} >= ?"));
                    params.push(to_sql_value(&name, value)?);
                }
                Condition::Lt(value) => {
                    clauses.push(format!("{expr} < ?"));
                    params.push(to_sql_value(&name, value)?);
                }
            }
        }

        Ok(Self {
            sql: clauses.join(" AND "),
            params,
        })
    }
}

fn order_by(sort: Sort) -> &'static str {
    match sort {
        Sort::Ascending => "ORDER BY id ASC",
        Sort::Descending => "ORDER BY id DESC",
    }
}

fn parse_body(id: i64, body: &str) -> anyhow::Result<Document> {
    serde_json::from_str(body).map_err(|err| {
        anyhow::Error::new(DbError::InvalidData(format!(
            "document {id} is not a JSON object: {err}"
        )))
    })
}

fn query_documents(
    conn: &Connection,
    clause: &WhereClause,
    sort: Sort,
    limit: Option<u32>,
) -> anyhow::Result<Vec<(DocumentId, Document)>> {
    let mut sql = format!(
        "SELECT id, body FROM documents WHERE {} {}",
        clause.sql,
        order_by(sort)
    );
    if let Some(limit) = limit {
        sql.push_str(&format!(" LIMIT {limit}"));
    }

    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query(params_from_iter(clause.params.iter()))?;
    let mut documents = Vec::new();
    while let Some(row) = rows.next()? {
        let id: i64 = row.get(0)?;
        let body: String = row.get(1)?;
        documents.push((DocumentId(id), parse_body(id, &body)?));
    }
    Ok(documents)
}

#[async_trait]
impl DocumentStore for Database {
    async fn insert_one(&self, collection: Collection, document: Document) -> Result<DocumentId> {
        let body = serde_json::to_string(&document)?;
        self.execute(move |conn| {
            conn.execute(
                "INSERT INTO documents (collection, body, created_at) VALUES (?1, ?2, ?3)",
                params![collection.as_str(), body, Utc::now().to_rfc3339()],
            )?;
            Ok(DocumentId(conn.last_insert_rowid()))
        })
        .await
    }

    async fn find(
        &self,
        collection: Collection,
        filter: Filter,
        sort: Sort,
    ) -> Result<Vec<(DocumentId, Document)>> {
        let clause = WhereClause::build(collection, &filter)?;
        self.execute(move |conn| query_documents(conn, &clause, sort, None))
            .await
    }

    async fn find_one(
        &self,
        collection: Collection,
        filter: Filter,
        sort: Sort,
    ) -> Result<Option<(DocumentId, Document)>> {
        let clause = WhereClause::build(collection, &filter)?;
        self.execute(move |conn| {
            Ok(query_documents(conn, &clause, sort, Some(1))?
                .into_iter()
                .next())
        })
        .await
    }

    async fn update_one(
        &self,
        collection: Collection,
        filter: Filter,
        update: Update,
    ) -> Result<u64> {
        update.validate()?;
        let clause = WhereClause::build(collection, &filter)?;
        self.execute(move |conn| {
            let tx = conn.transaction()?;

            let target: Option<(i64, String)> = tx
                .query_row(
                    &format!(
                        "SELECT id, body FROM documents WHERE {} ORDER BY id ASC LIMIT 1",
                        clause.sql
                    ),
                    params_from_iter(clause.params.iter()),
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )
                .optional()?;

            let Some((id, body)) = target else {
                return Ok(0);
            };

            let mut document = parse_body(id, &body)?;
            update.apply(&mut document);
            tx.execute(
                "UPDATE documents SET body = ?1 WHERE id = ?2",
                params![serde_json::to_string(&document)?, id],
            )?;
            tx.commit()?;

            Ok(1)
        })
        .await
    }

    async fn delete_many(&self, collection: Collection, filter: Filter) -> Result<u64> {
        let clause = WhereClause::build(collection, &filter)?;
        self.execute(move |conn| {
            let deleted = conn.execute(
                &format!("DELETE FROM documents WHERE {}", clause.sql),
                params_from_iter(clause.params.iter()),
            )?;
            Ok(deleted as u64)
        })
        .await
    }

    async fn count(&self, collection: Collection, filter: Filter) -> Result<u64> {
        let clause = WhereClause::build(collection, &filter)?;
        self.execute(move |conn| {
            let count: i64 = conn.query_row(
                &format!("SELECT COUNT(*) FROM documents WHERE {}", clause.sql),
                params_from_iter(clause.params.iter()),
                |row| row.get(0),
            )?;
            Ok(count.max(0) as u64)
        })
        .await
    }

    async fn drop_all(&self) -> Result<()> {
        self.execute(|conn| {
            conn.execute("DELETE FROM documents", [])?;
            Ok(())
        })
        .await
    }
}
