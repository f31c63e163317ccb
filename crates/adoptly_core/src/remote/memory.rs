//! In-process `DocumentStore` with the same query semantics as Firestore.
//!
//! Backs unit/integration tests and offline previews. Collections are
//! independent maps; nothing is persisted.

use super::{Document, DocumentStore, Fields, Query, RemoteError, RemoteResult};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

type Collections = BTreeMap<String, BTreeMap<String, Fields>>;

#[derive(Default)]
pub struct MemoryStore {
    collections: Mutex<Collections>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents currently stored in `collection`.
    pub fn len(&self, collection: &str) -> usize {
        self.lock()
            .get(collection)
            .map_or(0, |documents| documents.len())
    }

    pub fn is_empty(&self, collection: &str) -> bool {
        self.len(collection) == 0
    }

    fn lock(&self) -> MutexGuard<'_, Collections> {
        // A poisoned map is still structurally valid; keep serving it.
        self.collections
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn matching(&self, query: &Query) -> RemoteResult<Vec<Document>> {
        query.validate()?;
        let collections = self.lock();
        let Some(documents) = collections.get(&query.collection) else {
            return Ok(Vec::new());
        };

        let mut matched: Vec<Document> = documents
            .iter()
            .map(|(id, fields)| Document::new(id.clone(), fields.clone()))
            .filter(|doc| query.filters.iter().all(|filter| filter.matches(doc)))
            .filter(|doc| {
                query
                    .order_by
                    .iter()
                    .all(|order| doc.get(&order.field).is_some())
            })
            .collect();
        drop(collections);

        matched.sort_by(|left, right| query.compare(left, right));
        if let Some(cursor) = &query.start_after {
            matched.retain(|doc| query.is_after(doc, cursor));
        }
        if let Some(limit) = query.limit {
            matched.truncate(limit as usize);
        }
        Ok(matched)
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get(&self, collection: &str, id: &str) -> RemoteResult<Option<Document>> {
        Ok(self
            .lock()
            .get(collection)
            .and_then(|documents| documents.get(id))
            .map(|fields| Document::new(id, fields.clone())))
    }

    async fn set(&self, collection: &str, id: &str, fields: Fields) -> RemoteResult<()> {
        self.lock()
            .entry(collection.to_string())
            .or_default()
            .insert(id.to_string(), fields);
        Ok(())
    }

    async fn add(&self, collection: &str, fields: Fields) -> RemoteResult<String> {
        let id = Uuid::new_v4().simple().to_string();
        self.set(collection, &id, fields).await?;
        Ok(id)
    }

    async fn update(&self, collection: &str, id: &str, fields: Fields) -> RemoteResult<()> {
        let mut collections = self.lock();
        let existing = collections
            .get_mut(collection)
            .and_then(|documents| documents.get_mut(id))
            .ok_or_else(|| RemoteError::NotFound {
                collection: collection.to_string(),
                id: id.to_string(),
            })?;
        existing.extend(fields);
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> RemoteResult<()> {
        if let Some(documents) = self.lock().get_mut(collection) {
            documents.remove(id);
        }
        Ok(())
    }

    async fn query(&self, query: &Query) -> RemoteResult<Vec<Document>> {
        self.matching(query)
    }

    async fn count(&self, query: &Query) -> RemoteResult<u64> {
        Ok(self.matching(query)?.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::MemoryStore;
    use crate::remote::{Direction, DocumentStore, FilterOp, PageCursor, Query, RemoteError};
    use serde_json::json;

    fn fields(value: serde_json::Value) -> super::Fields {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn update_merges_and_rejects_missing_documents() {
        let store = MemoryStore::new();
        store
            .set("pets", "p1", fields(json!({ "name": "Rex", "adopted": false })))
            .await
            .unwrap();
        store
            .update("pets", "p1", fields(json!({ "adopted": true })))
            .await
            .unwrap();

        let doc = store.get("pets", "p1").await.unwrap().unwrap();
        assert_eq!(doc.fields["name"], json!("Rex"));
        assert_eq!(doc.fields["adopted"], json!(true));

        let err = store
            .update("pets", "missing", fields(json!({ "adopted": true })))
            .await
            .unwrap_err();
        assert!(matches!(err, RemoteError::NotFound { .. }));
    }

    #[tokio::test]
    async fn query_orders_filters_and_continues_after_cursor() {
        let store = MemoryStore::new();
        for (id, created, owner) in [("a", 1, "v1"), ("b", 3, "v1"), ("c", 2, "v2"), ("d", 4, "v1")] {
            store
                .set("pets", id, fields(json!({ "createdAt": created, "ownerId": owner })))
                .await
                .unwrap();
        }
        store
            .set("pets", "no-created", fields(json!({ "ownerId": "v1" })))
            .await
            .unwrap();

        let base = Query::collection("pets")
            .where_eq("ownerId", "v1")
            .order_by("createdAt", Direction::Descending)
            .limit(2);
        let first = store.query(&base).await.unwrap();
        let ids: Vec<_> = first.iter().map(|doc| doc.id.as_str()).collect();
        assert_eq!(ids, ["d", "b"]);

        let cursor = PageCursor::from_document(first.last().unwrap(), &base.order_by);
        let second = store
            .query(&base.clone().start_after(Some(cursor)))
            .await
            .unwrap();
        let ids: Vec<_> = second.iter().map(|doc| doc.id.as_str()).collect();
        assert_eq!(ids, ["a"]);
    }

    #[tokio::test]
    async fn count_and_in_filter() {
        let store = MemoryStore::new();
        for id in ["x", "y", "z"] {
            store
                .set("views", id, fields(json!({ "petId": id })))
                .await
                .unwrap();
        }
        let query = Query::collection("views").filter("petId", FilterOp::In, json!(["x", "z"]));
        assert_eq!(store.count(&query).await.unwrap(), 2);
        assert_eq!(store.len("views"), 3);
        assert!(store.is_empty("pets"));
    }
}
