//! PostgreSQL-backed document store: one JSONB table per collection inside a dedicated schema.
//! Filters compare each top-level key with JSONB `=` (structural, numbers by value), never containment.

use crate::error::StoreError;
use crate::store::{new_id, with_id, Document, DocumentStore, Query, ID_FIELD};
use async_trait::async_trait;
use serde_json::Value;
use sqlx::postgres::{PgArguments, PgConnectOptions, PgPoolOptions};
use sqlx::query::{Query as SqlQuery, QueryAs};
use sqlx::types::Json;
use sqlx::{ConnectOptions, PgPool, Postgres};
use std::str::FromStr;

/// Default PostgreSQL schema holding collection tables.
pub const DEFAULT_STORE_SCHEMA: &str = "autorest";

/// Quote identifier for PostgreSQL (names are validated at registration).
fn quoted(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

#[derive(Clone)]
pub struct PgDocumentStore {
    pool: PgPool,
    schema: String,
}

impl PgDocumentStore {
    pub fn new(pool: PgPool, schema: impl Into<String>) -> Self {
        PgDocumentStore {
            pool,
            schema: schema.into(),
        }
    }

    pub async fn connect(database_url: &str, schema: &str) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await?;
        Ok(PgDocumentStore::new(pool, schema))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    fn table(&self, collection: &str) -> String {
        format!("{}.{}", quoted(&self.schema), quoted(collection))
    }
}

fn into_document(value: Value) -> Result<Document, StoreError> {
    Ok(serde_json::from_value(value)?)
}

/// `WHERE` predicate for `filter`, numbering placeholders after the first `bound` parameters.
/// Each key takes two parameters: the key text and the expected JSONB value.
fn where_clause(filter: &Query, bound: usize) -> String {
    if filter.is_empty() {
        return "TRUE".to_string();
    }
    (0..filter.len())
        .map(|i| {
            let key = bound + 2 * i + 1;
            format!("doc -> ${} = ${}", key, key + 1)
        })
        .collect::<Vec<_>>()
        .join(" AND ")
}

fn bind_filter<'q>(
    mut query: SqlQuery<'q, Postgres, PgArguments>,
    filter: &'q Query,
) -> SqlQuery<'q, Postgres, PgArguments> {
    for (key, value) in filter {
        query = query.bind(key.as_str()).bind(Json(value));
    }
    query
}

fn bind_filter_as<'q, O>(
    mut query: QueryAs<'q, Postgres, O, PgArguments>,
    filter: &'q Query,
) -> QueryAs<'q, Postgres, O, PgArguments> {
    for (key, value) in filter {
        query = query.bind(key.as_str()).bind(Json(value));
    }
    query
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn ensure_collection(&self, collection: &str) -> Result<(), StoreError> {
        sqlx::query(&format!("CREATE SCHEMA IF NOT EXISTS {}", quoted(&self.schema)))
            .execute(&self.pool)
            .await?;
        let ddl = format!(
            r#"
            CREATE TABLE IF NOT EXISTS {} (
                id TEXT PRIMARY KEY,
                doc JSONB NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "#,
            self.table(collection)
        );
        sqlx::query(&ddl).execute(&self.pool).await?;
        Ok(())
    }

    async fn insert(&self, collection: &str, doc: Document) -> Result<Document, StoreError> {
        let id = new_id();
        let doc = with_id(&id, doc);
        let sql = format!("INSERT INTO {} (id, doc) VALUES ($1, $2) RETURNING doc", self.table(collection));
        tracing::debug!(sql = %sql, id = %id, "query");
        let (stored,): (Json<Value>,) = sqlx::query_as(&sql)
            .bind(&id)
            .bind(Json(&doc))
            .fetch_one(&self.pool)
            .await?;
        into_document(stored.0)
    }

    async fn find_one(&self, collection: &str, filter: &Query) -> Result<Option<Document>, StoreError> {
        let sql = format!(
            "SELECT doc FROM {} WHERE {} ORDER BY created_at, id LIMIT 1",
            self.table(collection),
            where_clause(filter, 0)
        );
        tracing::debug!(sql = %sql, filter = ?filter, "query");
        let row: Option<(Json<Value>,)> = bind_filter_as(sqlx::query_as(&sql), filter)
            .fetch_optional(&self.pool)
            .await?;
        row.map(|(doc,)| into_document(doc.0)).transpose()
    }

    async fn find_many(&self, collection: &str, filter: &Query) -> Result<Vec<Document>, StoreError> {
        let sql = format!(
            "SELECT doc FROM {} WHERE {} ORDER BY created_at, id",
            self.table(collection),
            where_clause(filter, 0)
        );
        tracing::debug!(sql = %sql, filter = ?filter, "query");
        let rows: Vec<(Json<Value>,)> = bind_filter_as(sqlx::query_as(&sql), filter)
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(|(doc,)| into_document(doc.0)).collect()
    }

    async fn update_many(&self, collection: &str, filter: &Query, changes: &Document) -> Result<u64, StoreError> {
        let sql = format!(
            "UPDATE {} SET doc = doc || $1 WHERE {}",
            self.table(collection),
            where_clause(filter, 1)
        );
        tracing::debug!(sql = %sql, filter = ?filter, "query");
        let res = bind_filter(sqlx::query(&sql).bind(Json(changes)), filter)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected())
    }

    async fn remove_many(&self, collection: &str, filter: &Query) -> Result<u64, StoreError> {
        let sql = format!("DELETE FROM {} WHERE {}", self.table(collection), where_clause(filter, 0));
        tracing::debug!(sql = %sql, filter = ?filter, "query");
        let res = bind_filter(sqlx::query(&sql), filter).execute(&self.pool).await?;
        Ok(res.rows_affected())
    }

    async fn replace(&self, collection: &str, doc: Document) -> Result<Document, StoreError> {
        let id = doc
            .get(ID_FIELD)
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or(StoreError::MissingId)?;
        let sql = format!(
            "INSERT INTO {} (id, doc) VALUES ($1, $2) ON CONFLICT (id) DO UPDATE SET doc = EXCLUDED.doc RETURNING doc",
            self.table(collection)
        );
        tracing::debug!(sql = %sql, id = %id, "query");
        let (stored,): (Json<Value>,) = sqlx::query_as(&sql)
            .bind(&id)
            .bind(Json(&doc))
            .fetch_one(&self.pool)
            .await?;
        into_document(stored.0)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// Connection options for the server's `postgres` maintenance database plus the database `database_url` names.
/// `None` when the URL names no database or names `postgres` itself.
fn maintenance_target(database_url: &str) -> Result<Option<(PgConnectOptions, String)>, StoreError> {
    let target = PgConnectOptions::from_str(database_url)?;
    let name = target.get_database().unwrap_or_default().to_string();
    if name.is_empty() || name == "postgres" {
        return Ok(None);
    }
    Ok(Some((target.database("postgres"), name)))
}

/// Create the database named in `database_url` when the server does not have it yet.
pub async fn ensure_database_exists(database_url: &str) -> Result<(), StoreError> {
    let Some((maintenance, name)) = maintenance_target(database_url)? else {
        return Ok(());
    };
    let mut conn = maintenance.connect().await?;
    let (present,): (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM pg_database WHERE datname = $1)")
        .bind(&name)
        .fetch_one(&mut conn)
        .await?;
    if present {
        return Ok(());
    }
    tracing::info!(database = %name, "creating database");
    sqlx::query(&format!("CREATE DATABASE {}", quoted(&name)))
        .execute(&mut conn)
        .await?;
    Ok(())
}
