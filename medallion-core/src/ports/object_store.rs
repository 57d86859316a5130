// medallion-core/src/ports/object_store.rs

// What the pipeline needs from object storage, without knowing whether the
// bytes live on disk, in memory or in a remote bucket.

use crate::error::MedallionError;
use async_trait::async_trait;

#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Reads the whole object. Missing objects are an error.
    async fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, MedallionError>;

    /// Writes the object, replacing any previous content under the same key.
    async fn put_object(&self, bucket: &str, key: &str, data: &[u8])
    -> Result<(), MedallionError>;

    async fn object_exists(&self, bucket: &str, key: &str) -> Result<bool, MedallionError>;

    async fn bucket_exists(&self, bucket: &str) -> Result<bool, MedallionError>;

    async fn make_bucket(&self, bucket: &str) -> Result<(), MedallionError>;

    /// Creates the bucket if it does not exist yet.
    async fn ensure_bucket(&self, bucket: &str) -> Result<(), MedallionError> {
        if !self.bucket_exists(bucket).await? {
            self.make_bucket(bucket).await?;
        }
        Ok(())
    }
}
