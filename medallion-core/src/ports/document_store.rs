// medallion-core/src/ports/document_store.rs

use crate::error::MedallionError;
use async_trait::async_trait;
use serde_json::Value;

/// A flat serving record.
pub type Document = serde_json::Map<String, Value>;

/// Equality match on one top-level field. `None` matches every document.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentFilter {
    pub field: String,
    pub value: Value,
}

impl DocumentFilter {
    pub fn new(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn matches(&self, doc: &Document) -> bool {
        doc.get(&self.field) == Some(&self.value)
    }
}

/// Field holding the store-assigned identifier.
pub const ID_FIELD: &str = "_id";

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Deletes matching documents and returns how many were removed.
    async fn delete_many(
        &self,
        collection: &str,
        filter: Option<&DocumentFilter>,
    ) -> Result<u64, MedallionError>;

    /// Appends documents in order. Documents without `_id` get one assigned
    /// as `<collection>:<n>`, where `n` is the document's sequence number:
    /// one past the highest sequence still stored, 0 for an empty collection.
    async fn insert_many(&self, collection: &str, docs: Vec<Document>)
    -> Result<u64, MedallionError>;

    /// Matching documents in insertion order. Unknown collections are empty.
    async fn find(
        &self,
        collection: &str,
        filter: Option<&DocumentFilter>,
    ) -> Result<Vec<Document>, MedallionError>;

    async fn find_one(
        &self,
        collection: &str,
        filter: Option<&DocumentFilter>,
    ) -> Result<Option<Document>, MedallionError> {
        Ok(self.find(collection, filter).await?.into_iter().next())
    }
}

/// Shared `_id` assignment for adapters.
pub fn assign_id(collection: &str, n: u64, doc: &mut Document) {
    if !doc.contains_key(ID_FIELD) {
        doc.insert(
            ID_FIELD.to_string(),
            Value::String(format!("{}:{}", collection, n)),
        );
    }
}
