//! Disk-backed buckets served by the HTTP layer under `/storage`.

use std::io::ErrorKind;
use std::path::PathBuf;

use async_trait::async_trait;

use super::{ObjectStorage, StorageError};

/// Stores `bucket/key` at `<root>/<bucket>/<key>`.
#[derive(Debug, Clone)]
pub struct LocalObjectStorage {
    root: PathBuf,
    public_base_url: String,
}

impl LocalObjectStorage {
    pub fn new(root: impl Into<PathBuf>, public_base_url: &str) -> Self {
        Self {
            root: root.into(),
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        }
    }

    fn object_path(&self, bucket: &str, key: &str) -> Result<PathBuf, StorageError> {
        check_segment(bucket)?;
        check_segment(key)?;
        Ok(self.root.join(bucket).join(key))
    }
}

/// Keys and bucket names are single path segments.
fn check_segment(segment: &str) -> Result<(), StorageError> {
    if segment.is_empty()
        || segment == "."
        || segment == ".."
        || segment.contains(['/', '\\'])
    {
        return Err(StorageError::InvalidKey(segment.to_string()));
    }
    Ok(())
}

#[async_trait]
impl ObjectStorage for LocalObjectStorage {
    async fn upload(
        &self,
        bucket: &str,
        key: &str,
        bytes: &[u8],
        _content_type: &str,
    ) -> Result<(), StorageError> {
        let path = self.object_path(bucket, key)?;
        if tokio::fs::try_exists(&path).await? {
            return Err(StorageError::AlreadyExists {
                bucket: bucket.to_string(),
                key: key.to_string(),
            });
        }

        let dir = self.root.join(bucket);
        tokio::fs::create_dir_all(&dir).await?;

        // Write under a temp name, then rename into place.
        let tmp = dir.join(format!(".{}.part", uuid::Uuid::new_v4()));
        tokio::fs::write(&tmp, bytes).await?;
        if let Err(e) = tokio::fs::rename(&tmp, &path).await {
            tokio::fs::remove_file(&tmp).await.ok();
            return Err(e.into());
        }

        tracing::debug!(bucket, key, size = bytes.len(), "Stored object");
        Ok(())
    }

    fn public_url(&self, bucket: &str, key: &str) -> String {
        format!("{}/storage/{}/{}", self.public_base_url, bucket, key)
    }

    async fn remove(&self, bucket: &str, keys: &[String]) -> Result<(), StorageError> {
        for key in keys {
            let path = self.object_path(bucket, key)?;
            match tokio::fs::remove_file(&path).await {
                Ok(()) => tracing::debug!(bucket, key = %key, "Removed object"),
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }
}
