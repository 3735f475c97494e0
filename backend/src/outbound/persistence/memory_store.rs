//! In-process [`DocumentStore`] used by tests.
//!
//! Each collection is a map from document id to document behind its own
//! `tokio::sync::RwLock`, so writers to different collections never contend.
//! Unique fields declared on the [`Collection`] are checked before anything
//! is written, so a rejected write leaves the collection untouched.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::document_fields::{document_id, unique_values};
use crate::domain::ports::{
    Collection, Document, DocumentStore, DocumentStoreError, Filter, FindOptions, SortOrder,
    compare_documents,
};

type Table = BTreeMap<String, Document>;

/// [`DocumentStore`] adapter holding every collection in memory.
#[derive(Default)]
pub struct MemoryDocumentStore {
    tables: RwLock<HashMap<String, Arc<RwLock<Table>>>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    async fn table(&self, collection: Collection) -> Arc<RwLock<Table>> {
        if let Some(table) = self.tables.read().await.get(collection.name()) {
            return Arc::clone(table);
        }
        let mut tables = self.tables.write().await;
        Arc::clone(tables.entry(collection.name().to_owned()).or_default())
    }
}

/// Reject `document` if another document already holds one of its unique
/// values.
fn check_unique(
    collection: Collection,
    table: &Table,
    id: &str,
    document: &Document,
) -> Result<(), DocumentStoreError> {
    for (field, value) in unique_values(collection, document) {
        let taken = table
            .iter()
            .any(|(other_id, other)| other_id != id && other.get(field) == Some(value));
        if taken {
            return Err(DocumentStoreError::duplicate_key(collection.name(), field));
        }
    }
    Ok(())
}

fn to_usize(value: u64) -> usize {
    usize::try_from(value).unwrap_or(usize::MAX)
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn find(
        &self,
        collection: Collection,
        filter: &Filter,
        options: &FindOptions,
    ) -> Result<Vec<Document>, DocumentStoreError> {
        let table = self.table(collection).await;
        let table = table.read().await;
        let mut matches: Vec<&Document> = table.values().filter(|doc| filter.matches(doc)).collect();
        if let Some((field, order)) = &options.sort {
            matches.sort_by(|left, right| {
                let ordering = compare_documents(left, right, field);
                match order {
                    SortOrder::Asc => ordering,
                    SortOrder::Desc => ordering.reverse(),
                }
            });
        }
        let limit = options.limit.map_or(usize::MAX, to_usize);
        Ok(matches
            .into_iter()
            .skip(to_usize(options.skip))
            .take(limit)
            .cloned()
            .collect())
    }

    async fn count(&self, collection: Collection, filter: &Filter) -> Result<u64, DocumentStoreError> {
        let table = self.table(collection).await;
        let count = table.read().await.values().filter(|doc| filter.matches(doc)).count();
        Ok(count as u64)
    }

    async fn find_by_id(
        &self,
        collection: Collection,
        id: &str,
    ) -> Result<Option<Document>, DocumentStoreError> {
        let table = self.table(collection).await;
        let document = table.read().await.get(id).cloned();
        Ok(document)
    }

    async fn insert(&self, collection: Collection, document: Document) -> Result<(), DocumentStoreError> {
        let id = document_id(&document)?;
        let table = self.table(collection).await;
        let mut table = table.write().await;
        if table.contains_key(&id) {
            return Err(DocumentStoreError::duplicate_key(collection.name(), "id"));
        }
        check_unique(collection, &table, &id, &document)?;
        table.insert(id, document);
        Ok(())
    }

    async fn replace(
        &self,
        collection: Collection,
        id: &str,
        document: Document,
    ) -> Result<bool, DocumentStoreError> {
        let table = self.table(collection).await;
        let mut table = table.write().await;
        if !table.contains_key(id) {
            return Ok(false);
        }
        check_unique(collection, &table, id, &document)?;
        table.insert(id.to_owned(), document);
        Ok(true)
    }

    async fn delete(&self, collection: Collection, id: &str) -> Result<bool, DocumentStoreError> {
        let table = self.table(collection).await;
        let removed = table.write().await.remove(id).is_some();
        Ok(removed)
    }

    async fn delete_many(
        &self,
        collection: Collection,
        filter: &Filter,
    ) -> Result<u64, DocumentStoreError> {
        let table = self.table(collection).await;
        let mut table = table.write().await;
        let before = table.len();
        table.retain(|_, document| !filter.matches(document));
        Ok((before - table.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    //! Behavioural coverage for the in-memory store.
    use super::*;
    use crate::domain::ports::Condition;
    use rstest::{fixture, rstest};
    use serde_json::{Value, json};

    const WIDGETS: Collection = Collection::new("widgets", &["code"]);

    fn doc(value: Value) -> Document {
        value.as_object().cloned().expect("fixture is an object")
    }

    #[fixture]
    fn store() -> MemoryDocumentStore {
        MemoryDocumentStore::new()
    }

    async fn seed(store: &MemoryDocumentStore) {
        for (id, code, rank) in [("a", "X1", 3), ("b", "X2", 1), ("c", "X3", 2)] {
            store
                .insert(WIDGETS, doc(json!({"id": id, "code": code, "rank": rank})))
                .await
                .expect("seed insert");
        }
    }

    #[rstest]
    #[tokio::test]
    async fn find_sorts_and_pages(store: MemoryDocumentStore) {
        seed(&store).await;
        let options = FindOptions::sorted("rank", SortOrder::Asc).paged(1, 1);
        let found = store
            .find(WIDGETS, &Filter::new(), &options)
            .await
            .expect("find");
        assert_eq!(found, vec![doc(json!({"id": "c", "code": "X3", "rank": 2}))]);
        assert_eq!(store.count(WIDGETS, &Filter::new()).await.expect("count"), 3);
    }

    #[rstest]
    #[tokio::test]
    async fn duplicate_unique_field_is_rejected(store: MemoryDocumentStore) {
        seed(&store).await;
        let err = store
            .insert(WIDGETS, doc(json!({"id": "d", "code": "X1"})))
            .await
            .expect_err("duplicate code");
        assert_eq!(err, DocumentStoreError::duplicate_key("widgets", "code"));
    }

    #[rstest]
    #[tokio::test]
    async fn replace_may_keep_its_own_unique_value(store: MemoryDocumentStore) {
        seed(&store).await;
        let replaced = store
            .replace(WIDGETS, "a", doc(json!({"id": "a", "code": "X1", "rank": 9})))
            .await
            .expect("replace");
        assert!(replaced);
        let clash = store
            .replace(WIDGETS, "a", doc(json!({"id": "a", "code": "X2"})))
            .await
            .expect_err("code taken by b");
        assert_eq!(clash, DocumentStoreError::duplicate_key("widgets", "code"));
        assert!(!store.replace(WIDGETS, "zz", doc(json!({"id": "zz"}))).await.expect("replace"));
    }

    #[rstest]
    #[tokio::test]
    async fn null_unique_values_never_collide(store: MemoryDocumentStore) {
        for id in ["a", "b"] {
            store
                .insert(WIDGETS, doc(json!({"id": id, "code": null})))
                .await
                .expect("insert without code");
        }
    }

    #[rstest]
    #[tokio::test]
    async fn delete_many_removes_matches(store: MemoryDocumentStore) {
        seed(&store).await;
        let removed = store
            .delete_many(WIDGETS, &Filter::new().with("rank", Condition::AtLeast(json!(2))))
            .await
            .expect("delete many");
        assert_eq!(removed, 2);
        assert!(store.delete(WIDGETS, "b").await.expect("delete"));
        assert!(!store.delete(WIDGETS, "b").await.expect("delete again"));
    }

    #[rstest]
    #[tokio::test]
    async fn rejected_write_leaves_nothing_behind(store: MemoryDocumentStore) {
        const PARTS: Collection = Collection::new("parts", &["code", "serial"]);
        store
            .insert(PARTS, doc(json!({"id": "a", "code": "X1", "serial": "S1"})))
            .await
            .expect("first insert");

        let err = store
            .insert(PARTS, doc(json!({"id": "b", "code": "X2", "serial": "S1"})))
            .await
            .expect_err("serial taken");

        assert_eq!(err, DocumentStoreError::duplicate_key("parts", "serial"));
        assert_eq!(store.find_by_id(PARTS, "b").await.expect("lookup"), None);
        store
            .insert(PARTS, doc(json!({"id": "c", "code": "X2", "serial": "S2"})))
            .await
            .expect("code X2 was never claimed");
    }
}
