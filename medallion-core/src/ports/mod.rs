// medallion-core/src/ports/mod.rs

pub mod document_store;
pub mod object_store;

pub use document_store::{Document, DocumentFilter, DocumentStore};
pub use object_store::ObjectStore;
