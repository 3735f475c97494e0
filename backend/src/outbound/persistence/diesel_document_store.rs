//! PostgreSQL-backed [`DocumentStore`] adapter.
//!
//! Every collection shares the `documents` table and each document is stored
//! whole as JSONB. Unique fields are enforced by claiming one
//! `document_keys` row per value, so the database rejects a duplicate even
//! when two writers race. A document row and its claims are written in one
//! transaction; a rejected claim rolls the whole write back.

use async_trait::async_trait;
use diesel::dsl::count_star;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};
use serde_json::Value;
use tracing::debug;

use super::document_fields::{document_id, unique_values};
use super::document_query::{filter_predicates, ordered};
use super::pool::{DbPool, PoolConfig, PoolError};
use super::schema::{document_keys, documents};
use crate::domain::ports::{
    Collection, Document, DocumentStore, DocumentStoreError, Filter, FindOptions,
};

/// Diesel-backed implementation of the [`DocumentStore`] port.
#[derive(Clone)]
pub struct DieselDocumentStore {
    pool: DbPool,
}

impl DieselDocumentStore {
    /// Create a store over an existing connection pool.
    pub const fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Migrate the database at `config` and pool connections to it.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::Connection`] when the database cannot be
    /// reached or migrated.
    pub async fn connect(config: &PoolConfig) -> Result<Self, DocumentStoreError> {
        DbPool::connect(config)
            .await
            .map(Self::new)
            .map_err(map_pool_error)
    }
}

fn map_pool_error(error: PoolError) -> DocumentStoreError {
    DocumentStoreError::connection(error.into_message())
}

fn map_diesel_error(error: DieselError) -> DocumentStoreError {
    match &error {
        DieselError::DatabaseError(kind, info) => {
            debug!(?kind, message = info.message(), "diesel operation failed");
        }
        _ => debug!(
            error_type = %std::any::type_name_of_val(&error),
            "diesel operation failed"
        ),
    }

    match error {
        DieselError::DeserializationError(_) | DieselError::SerializationError(_) => {
            DocumentStoreError::serialization("document encoding error")
        }
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, _) => {
            DocumentStoreError::connection("database connection error")
        }
        _ => DocumentStoreError::query("database error"),
    }
}

/// Failure inside a write transaction.
enum WriteError {
    /// `field` is already claimed by another document.
    Duplicate(&'static str),
    Diesel(DieselError),
}

impl From<DieselError> for WriteError {
    fn from(error: DieselError) -> Self {
        Self::Diesel(error)
    }
}

impl WriteError {
    fn into_store_error(self, collection: Collection) -> DocumentStoreError {
        match self {
            Self::Duplicate(field) => DocumentStoreError::duplicate_key(collection.name(), field),
            Self::Diesel(error) => map_diesel_error(error),
        }
    }
}

/// Treat a unique violation on `field` as a duplicate key.
fn claim_error(error: DieselError, field: &'static str) -> WriteError {
    match error {
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
            WriteError::Duplicate(field)
        }
        other => WriteError::Diesel(other),
    }
}

/// Rows for the unique values `document` claims.
fn key_rows(
    collection: Collection,
    id: &str,
    document: &Document,
) -> Result<Vec<(&'static str, String)>, DocumentStoreError> {
    unique_values(collection, document)
        .map(|(field, value)| {
            serde_json::to_string(value)
                .map(|encoded| (field, encoded))
                .map_err(|err| {
                    let name = collection.name();
                    DocumentStoreError::serialization(format!("{name}.{field} of {id}: {err}"))
                })
        })
        .collect()
}

async fn claim_keys(
    conn: &mut AsyncPgConnection,
    collection: Collection,
    id: &str,
    keys: &[(&'static str, String)],
) -> Result<(), WriteError> {
    for (field, value) in keys {
        diesel::insert_into(document_keys::table)
            .values((
                document_keys::collection.eq(collection.name()),
                document_keys::field.eq(*field),
                document_keys::value.eq(value),
                document_keys::document_id.eq(id),
            ))
            .execute(conn)
            .await
            .map_err(|err| claim_error(err, field))?;
    }
    Ok(())
}

#[async_trait]
impl DocumentStore for DieselDocumentStore {
    async fn find(
        &self,
        collection: Collection,
        filter: &Filter,
        options: &FindOptions,
    ) -> Result<Vec<Document>, DocumentStoreError> {
        let mut query = documents::table
            .filter(documents::collection.eq(collection.name()))
            .select(documents::body)
            .into_boxed();
        for predicate in filter_predicates(filter) {
            query = query.filter(predicate);
        }
        query = ordered(query, options.sort.as_ref());
        if options.skip > 0 {
            query = query.offset(i64::try_from(options.skip).unwrap_or(i64::MAX));
        }
        if let Some(limit) = options.limit {
            query = query.limit(i64::try_from(limit).unwrap_or(i64::MAX));
        }

        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let bodies: Vec<Value> = query.load(&mut conn).await.map_err(map_diesel_error)?;
        bodies
            .into_iter()
            .map(|body| match body {
                Value::Object(document) => Ok(document),
                other => Err(DocumentStoreError::serialization(format!(
                    "{} holds a non-object document: {other}",
                    collection.name()
                ))),
            })
            .collect()
    }

    async fn count(&self, collection: Collection, filter: &Filter) -> Result<u64, DocumentStoreError> {
        let mut query = documents::table
            .filter(documents::collection.eq(collection.name()))
            .select(count_star())
            .into_boxed();
        for predicate in filter_predicates(filter) {
            query = query.filter(predicate);
        }
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let total: i64 = query
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(u64::try_from(total).unwrap_or_default())
    }

    async fn find_by_id(
        &self,
        collection: Collection,
        id: &str,
    ) -> Result<Option<Document>, DocumentStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let body: Option<Value> = documents::table
            .filter(documents::collection.eq(collection.name()))
            .filter(documents::id.eq(id))
            .select(documents::body)
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        Ok(body.and_then(|body| match body {
            Value::Object(document) => Some(document),
            _ => None,
        }))
    }

    async fn insert(&self, collection: Collection, document: Document) -> Result<(), DocumentStoreError> {
        let id = document_id(&document)?;
        let keys = key_rows(collection, &id, &document)?;
        let body = Value::Object(document);
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        conn.transaction::<_, WriteError, _>(|conn| {
            async move {
                diesel::insert_into(documents::table)
                    .values((
                        documents::collection.eq(collection.name()),
                        documents::id.eq(&id),
                        documents::body.eq(&body),
                    ))
                    .execute(conn)
                    .await
                    .map_err(|err| claim_error(err, "id"))?;
                claim_keys(conn, collection, &id, &keys).await
            }
            .scope_boxed()
        })
        .await
        .map_err(|err| err.into_store_error(collection))
    }

    async fn replace(
        &self,
        collection: Collection,
        id: &str,
        document: Document,
    ) -> Result<bool, DocumentStoreError> {
        let keys = key_rows(collection, id, &document)?;
        let body = Value::Object(document);
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        conn.transaction::<_, WriteError, _>(|conn| {
            async move {
                let updated = diesel::update(
                    documents::table
                        .filter(documents::collection.eq(collection.name()))
                        .filter(documents::id.eq(id)),
                )
                .set(documents::body.eq(&body))
                .execute(conn)
                .await?;
                if updated == 0 {
                    return Ok(false);
                }
                diesel::delete(
                    document_keys::table
                        .filter(document_keys::collection.eq(collection.name()))
                        .filter(document_keys::document_id.eq(id)),
                )
                .execute(conn)
                .await?;
                claim_keys(conn, collection, id, &keys).await?;
                Ok(true)
            }
            .scope_boxed()
        })
        .await
        .map_err(|err| err.into_store_error(collection))
    }

    async fn delete(&self, collection: Collection, id: &str) -> Result<bool, DocumentStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        // Claimed keys go with the document through the cascading foreign key.
        let removed = diesel::delete(
            documents::table
                .filter(documents::collection.eq(collection.name()))
                .filter(documents::id.eq(id)),
        )
        .execute(&mut conn)
        .await
        .map_err(map_diesel_error)?;
        Ok(removed > 0)
    }

    async fn delete_many(
        &self,
        collection: Collection,
        filter: &Filter,
    ) -> Result<u64, DocumentStoreError> {
        let mut query = diesel::delete(documents::table)
            .filter(documents::collection.eq(collection.name()))
            .into_boxed();
        for predicate in filter_predicates(filter) {
            query = query.filter(predicate);
        }
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let removed = query.execute(&mut conn).await.map_err(map_diesel_error)?;
        Ok(removed as u64)
    }
}
