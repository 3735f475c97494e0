//! Typed access to a [`DocumentStore`] collection.
//!
//! Entities serialise to camelCase JSON documents. [`Repository`] converts
//! between the two and maps store failures onto the domain [`Error`]
//! taxonomy: a duplicate unique field becomes a conflict, anything else is
//! logged and reported as an internal error.

use std::marker::PhantomData;
use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::error;
use uuid::Uuid;

use crate::domain::Error;
use crate::domain::ports::{
    Collection, Document, DocumentStore, DocumentStoreError, Filter, FindOptions,
};

/// A record persisted in its own collection.
pub trait Entity: Serialize + DeserializeOwned + Send + Sync {
    /// Backing collection.
    const COLLECTION: Collection;
    /// Human-readable name used in not-found messages.
    const LABEL: &'static str;

    /// Primary key.
    fn id(&self) -> Uuid;
}

/// Map a store failure onto the domain error taxonomy.
pub(crate) fn map_store_error(err: DocumentStoreError) -> Error {
    match err {
        DocumentStoreError::DuplicateKey { collection, field } => {
            Error::conflict(format!("{field} already exists"))
                .with_details(json!({"collection": collection, "field": field}))
        }
        other => {
            error!(error = %other, "document store operation failed");
            Error::internal(other.to_string())
        }
    }
}

fn to_document<T: Entity>(entity: &T) -> Result<Document, Error> {
    match serde_json::to_value(entity) {
        Ok(Value::Object(document)) => Ok(document),
        Ok(_) => Err(Error::internal(format!(
            "{} did not serialise to an object",
            T::LABEL
        ))),
        Err(err) => Err(Error::internal(format!(
            "failed to serialise {}: {err}",
            T::LABEL
        ))),
    }
}

fn from_document<T: Entity>(document: Document) -> Result<T, Error> {
    serde_json::from_value(Value::Object(document)).map_err(|err| {
        error!(collection = T::COLLECTION.name(), error = %err, "stored document is corrupt");
        Error::internal(format!("failed to decode {}: {err}", T::LABEL))
    })
}

/// Typed facade over one collection.
pub struct Repository<T> {
    store: Arc<dyn DocumentStore>,
    marker: PhantomData<fn() -> T>,
}

impl<T> Clone for Repository<T> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            marker: PhantomData,
        }
    }
}

impl<T: Entity> Repository<T> {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            marker: PhantomData,
        }
    }

    /// Entities matching `filter`, sorted and paged per `options`.
    pub async fn find(&self, filter: &Filter, options: &FindOptions) -> Result<Vec<T>, Error> {
        let documents = self
            .store
            .find(T::COLLECTION, filter, options)
            .await
            .map_err(map_store_error)?;
        documents.into_iter().map(from_document).collect()
    }

    /// Every entity matching `filter`, unordered.
    pub async fn all(&self, filter: &Filter) -> Result<Vec<T>, Error> {
        self.find(filter, &FindOptions::default()).await
    }

    pub async fn count(&self, filter: &Filter) -> Result<u64, Error> {
        self.store
            .count(T::COLLECTION, filter)
            .await
            .map_err(map_store_error)
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<T>, Error> {
        self.store
            .find_by_id(T::COLLECTION, &id.to_string())
            .await
            .map_err(map_store_error)?
            .map(from_document)
            .transpose()
    }

    /// Fetch `id`, failing with not-found when it is missing.
    pub async fn require(&self, id: Uuid) -> Result<T, Error> {
        self.get(id)
            .await?
            .ok_or_else(|| Error::not_found(format!("{} not found", T::LABEL)))
    }

    pub async fn insert(&self, entity: &T) -> Result<(), Error> {
        let document = to_document(entity)?;
        self.store
            .insert(T::COLLECTION, document)
            .await
            .map_err(map_store_error)
    }

    /// Overwrite the stored copy of `entity`.
    pub async fn replace(&self, entity: &T) -> Result<(), Error> {
        let document = to_document(entity)?;
        let replaced = self
            .store
            .replace(T::COLLECTION, &entity.id().to_string(), document)
            .await
            .map_err(map_store_error)?;
        if replaced {
            Ok(())
        } else {
            Err(Error::not_found(format!("{} not found", T::LABEL)))
        }
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), Error> {
        let deleted = self
            .store
            .delete(T::COLLECTION, &id.to_string())
            .await
            .map_err(map_store_error)?;
        if deleted {
            Ok(())
        } else {
            Err(Error::not_found(format!("{} not found", T::LABEL)))
        }
    }

    /// Remove every entity matching `filter`.
    pub async fn delete_where(&self, filter: &Filter) -> Result<u64, Error> {
        self.store
            .delete_many(T::COLLECTION, filter)
            .await
            .map_err(map_store_error)
    }
}
