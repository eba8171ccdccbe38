//! Object storage for uploaded files.
//!
//! Files live in named buckets and are published under a public URL. The
//! workflows only see the [`ObjectStorage`] trait.

mod local;

pub use local::LocalObjectStorage;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("The resource already exists: {bucket}/{key}")]
    AlreadyExists { bucket: String, key: String },
    #[error("Invalid object key: {0}")]
    InvalidKey(String),
    #[error("{0}")]
    Io(#[from] std::io::Error),
}

/// A file received from a client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    pub fn new(
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            bytes,
        }
    }

    pub fn len(&self) -> u64 {
        self.bytes.len() as u64
    }

    /// Text after the last `.` of the original name, reduced to ASCII
    /// alphanumerics. Names without a usable extension get `bin`.
    pub fn extension(&self) -> String {
        let raw = self.file_name.rsplit('.').next().unwrap_or_default();
        let ext: String = raw
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();
        if ext.is_empty() || !self.file_name.contains('.') {
            "bin".to_string()
        } else {
            ext
        }
    }

    /// Size in megabytes with two decimals.
    pub fn size_mb(&self) -> String {
        format!("{:.2}", self.len() as f64 / (1024.0 * 1024.0))
    }
}

#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Store `bytes` under `bucket/key`. Fails if the key is taken.
    async fn upload(
        &self,
        bucket: &str,
        key: &str,
        bytes: &[u8],
        content_type: &str,
    ) -> Result<(), StorageError>;

    fn public_url(&self, bucket: &str, key: &str) -> String;

    /// Delete the given keys. Missing keys are not an error.
    async fn remove(&self, bucket: &str, keys: &[String]) -> Result<(), StorageError>;
}

/// Recover the object key from a public URL: everything after `/{bucket}/`.
pub fn key_from_public_url(url: &str, bucket: &str) -> Option<String> {
    let marker = format!("/{}/", bucket);
    url.split_once(&marker)
        .map(|(_, key)| key.to_string())
        .filter(|key| !key.is_empty())
}
