// medallion-core/src/infrastructure/adapters/memory.rs

// Process-local stores for tests and for embedding the pipeline without disk
// or database access.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::error::MedallionError;
use crate::infrastructure::error::InfrastructureError;
use crate::ports::document_store::{Document, DocumentFilter, DocumentStore, assign_id};
use crate::ports::object_store::ObjectStore;

#[derive(Default)]
pub struct InMemoryObjectStore {
    buckets: RwLock<HashMap<String, HashMap<String, Vec<u8>>>>,
}

impl InMemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ObjectStore for InMemoryObjectStore {
    async fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, MedallionError> {
        let buckets = self.buckets.read().await;
        let objects = buckets
            .get(bucket)
            .ok_or_else(|| InfrastructureError::BucketNotFound(bucket.to_string()))?;
        objects.get(key).cloned().ok_or_else(|| {
            InfrastructureError::ObjectNotFound {
                bucket: bucket.to_string(),
                key: key.to_string(),
            }
            .into()
        })
    }

    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        data: &[u8],
    ) -> Result<(), MedallionError> {
        let mut buckets = self.buckets.write().await;
        let objects = buckets
            .get_mut(bucket)
            .ok_or_else(|| InfrastructureError::BucketNotFound(bucket.to_string()))?;
        objects.insert(key.to_string(), data.to_vec());
        Ok(())
    }

    async fn object_exists(&self, bucket: &str, key: &str) -> Result<bool, MedallionError> {
        let buckets = self.buckets.read().await;
        Ok(buckets.get(bucket).is_some_and(|o| o.contains_key(key)))
    }

    async fn bucket_exists(&self, bucket: &str) -> Result<bool, MedallionError> {
        Ok(self.buckets.read().await.contains_key(bucket))
    }

    async fn make_bucket(&self, bucket: &str) -> Result<(), MedallionError> {
        self.buckets
            .write()
            .await
            .entry(bucket.to_string())
            .or_default();
        Ok(())
    }
}

#[derive(Default)]
struct Collections {
    docs: HashMap<String, Vec<(u64, Document)>>,
    /// Collection -> remaining refused inserts, `None` for all of them.
    failing_inserts: HashMap<String, Option<u32>>,
}

#[derive(Default)]
pub struct InMemoryDocumentStore {
    inner: RwLock<Collections>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every later `insert_many` into `collection` fail, so callers can
    /// observe how a replace behaves when the store drops out mid-way.
    pub async fn fail_inserts_into(&self, collection: &str) {
        self.inner
            .write()
            .await
            .failing_inserts
            .insert(collection.to_string(), None);
    }

    /// Refuses the next `times` inserts into `collection`, then recovers.
    pub async fn fail_next_inserts_into(&self, collection: &str, times: u32) {
        self.inner
            .write()
            .await
            .failing_inserts
            .insert(collection.to_string(), Some(times));
    }

    pub async fn collections(&self) -> Vec<String> {
        let mut names: Vec<String> = self.inner.read().await.docs.keys().cloned().collect();
        names.sort();
        names
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn delete_many(
        &self,
        collection: &str,
        filter: Option<&DocumentFilter>,
    ) -> Result<u64, MedallionError> {
        let mut inner = self.inner.write().await;
        let Some(docs) = inner.docs.get_mut(collection) else {
            return Ok(0);
        };
        let before = docs.len();
        docs.retain(|(_, doc)| !filter.is_none_or(|f| f.matches(doc)));
        Ok((before - docs.len()) as u64)
    }

    async fn insert_many(
        &self,
        collection: &str,
        docs: Vec<Document>,
    ) -> Result<u64, MedallionError> {
        let mut inner = self.inner.write().await;
        let refuse = match inner.failing_inserts.get_mut(collection) {
            Some(None) => true,
            Some(Some(remaining)) if *remaining > 0 => {
                *remaining -= 1;
                true
            }
            _ => false,
        };
        if refuse {
            return Err(InfrastructureError::Io(std::io::Error::other(format!(
                "insert into '{}' refused",
                collection
            )))
            .into());
        }

        let stored = inner.docs.entry(collection.to_string()).or_default();
        let mut seq = stored.iter().map(|(s, _)| s + 1).max().unwrap_or(0);
        let count = docs.len() as u64;
        for mut doc in docs {
            assign_id(collection, seq, &mut doc);
            stored.push((seq, doc));
            seq += 1;
        }
        Ok(count)
    }

    async fn find(
        &self,
        collection: &str,
        filter: Option<&DocumentFilter>,
    ) -> Result<Vec<Document>, MedallionError> {
        let inner = self.inner.read().await;
        Ok(inner
            .docs
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .filter(|(_, doc)| filter.is_none_or(|f| f.matches(doc)))
                    .map(|(_, doc)| doc.clone())
                    .collect()
            })
            .unwrap_or_default())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use anyhow::Result;
    use serde_json::json;

    fn doc(value: serde_json::Value) -> Document {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn test_object_store_requires_bucket() -> Result<()> {
        let store = InMemoryObjectStore::new();
        assert!(store.put_object("gold", "a.parquet", b"x").await.is_err());

        store.ensure_bucket("gold").await?;
        store.put_object("gold", "a.parquet", b"x").await?;
        store.put_object("gold", "a.parquet", b"y").await?;
        assert_eq!(store.get_object("gold", "a.parquet").await?, b"y");
        assert!(!store.object_exists("gold", "b.parquet").await?);
        Ok(())
    }

    #[tokio::test]
    async fn test_ids_follow_insertion_order() -> Result<()> {
        let store = InMemoryDocumentStore::new();
        store
            .insert_many(
                "ca_by_year",
                vec![doc(json!({"annee": "2020"})), doc(json!({"annee": "2021"}))],
            )
            .await?;

        let docs = store.find("ca_by_year", None).await?;
        let ids: Vec<&str> = docs.iter().map(|d| d["_id"].as_str().unwrap()).collect();
        assert_eq!(ids, vec!["ca_by_year:0", "ca_by_year:1"]);

        assert_eq!(store.delete_many("ca_by_year", None).await?, 2);
        store
            .insert_many("ca_by_year", vec![doc(json!({"annee": "2022"}))])
            .await?;
        let first = store.find_one("ca_by_year", None).await?.unwrap();
        assert_eq!(first["_id"], "ca_by_year:0");
        Ok(())
    }

    #[tokio::test]
    async fn test_filtered_delete_and_find() -> Result<()> {
        let store = InMemoryDocumentStore::new();
        store
            .insert_many(
                "metadata",
                vec![
                    doc(json!({"table": "a", "row_count": 1})),
                    doc(json!({"table": "b", "row_count": 2})),
                ],
            )
            .await?;

        let only_b = DocumentFilter::new("table", "b");
        assert_eq!(store.find("metadata", Some(&only_b)).await?.len(), 1);
        assert_eq!(store.delete_many("metadata", Some(&only_b)).await?, 1);

        store
            .insert_many("metadata", vec![doc(json!({"table": "b", "row_count": 3}))])
            .await?;
        let b = store.find_one("metadata", Some(&only_b)).await?.unwrap();
        assert_eq!(b["row_count"], 3);
        assert_eq!(b["_id"], "metadata:1");
        assert!(store.find("unknown", None).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_injected_insert_failure() -> Result<()> {
        let store = InMemoryDocumentStore::new();
        store.fail_inserts_into("ca_by_year").await;
        assert!(
            store
                .insert_many("ca_by_year", vec![doc(json!({}))])
                .await
                .is_err()
        );
        assert!(store.collections().await.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_transient_insert_failure_recovers() -> Result<()> {
        let store = InMemoryDocumentStore::new();
        store.fail_next_inserts_into("ca_by_day", 2).await;

        for _ in 0..2 {
            assert!(
                store
                    .insert_many("ca_by_day", vec![doc(json!({}))])
                    .await
                    .is_err()
            );
        }
        assert_eq!(
            store
                .insert_many("ca_by_day", vec![doc(json!({"jour": "2020-06-01"}))])
                .await?,
            1
        );
        store.insert_many("metadata", vec![doc(json!({}))]).await?;
        assert_eq!(store.collections().await, vec!["ca_by_day", "metadata"]);
        Ok(())
    }
}
