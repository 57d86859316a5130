// medallion-core/src/infrastructure/adapters/mod.rs

pub mod datafusion;
pub mod duckdb;
pub mod filesystem;
pub mod memory;

pub use self::datafusion::{ArtifactPreview, DataFusionInspector};
pub use self::duckdb::DuckDbDocumentStore;
pub use filesystem::FileSystemObjectStore;
pub use memory::{InMemoryDocumentStore, InMemoryObjectStore};
