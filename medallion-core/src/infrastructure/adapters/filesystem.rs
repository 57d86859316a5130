// medallion-core/src/infrastructure/adapters/filesystem.rs

use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};
use tracing::debug;

use crate::error::MedallionError;
use crate::infrastructure::error::InfrastructureError;
use crate::infrastructure::fs::atomic_write;
use crate::ports::object_store::ObjectStore;

/// Object storage on local disk: one directory per bucket under `root`.
pub struct FileSystemObjectStore {
    root: PathBuf,
}

impl FileSystemObjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn bucket_path(&self, bucket: &str) -> Result<PathBuf, MedallionError> {
        if bucket.is_empty() || bucket.contains(['/', '\\']) || bucket == "." || bucket == ".." {
            return Err(InfrastructureError::InvalidKey(format!("bucket '{}'", bucket)).into());
        }
        Ok(self.root.join(bucket))
    }

    fn object_path(&self, bucket: &str, key: &str) -> Result<PathBuf, MedallionError> {
        let key_path = Path::new(key);
        let safe = !key.is_empty()
            && key_path
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !safe {
            return Err(MedallionError::UnsafePath(format!("{}/{}", bucket, key)));
        }
        Ok(self.bucket_path(bucket)?.join(key_path))
    }

    async fn require_bucket(&self, bucket: &str) -> Result<PathBuf, MedallionError> {
        let path = self.bucket_path(bucket)?;
        if !tokio::fs::try_exists(&path).await? {
            return Err(InfrastructureError::BucketNotFound(bucket.to_string()).into());
        }
        Ok(path)
    }
}

#[async_trait]
impl ObjectStore for FileSystemObjectStore {
    async fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, MedallionError> {
        let path = self.object_path(bucket, key)?;
        self.require_bucket(bucket).await?;
        match tokio::fs::read(&path).await {
            Ok(data) => Ok(data),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(InfrastructureError::ObjectNotFound {
                    bucket: bucket.to_string(),
                    key: key.to_string(),
                }
                .into())
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        data: &[u8],
    ) -> Result<(), MedallionError> {
        let path = self.object_path(bucket, key)?;
        self.require_bucket(bucket).await?;
        debug!(bucket, key, bytes = data.len(), "Writing object");
        atomic_write(&path, data)?;
        Ok(())
    }

    async fn object_exists(&self, bucket: &str, key: &str) -> Result<bool, MedallionError> {
        let path = self.object_path(bucket, key)?;
        Ok(tokio::fs::try_exists(&path).await? && path.is_file())
    }

    async fn bucket_exists(&self, bucket: &str) -> Result<bool, MedallionError> {
        let path = self.bucket_path(bucket)?;
        Ok(tokio::fs::try_exists(&path).await? && path.is_dir())
    }

    async fn make_bucket(&self, bucket: &str) -> Result<(), MedallionError> {
        let path = self.bucket_path(bucket)?;
        tokio::fs::create_dir_all(&path).await?;
        Ok(())
    }
}
