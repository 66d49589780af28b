//! Storage adapters behind the photo service.
//!
//! `BlobStore` holds raw image bytes under a key, `MetadataStore` holds
//! `PhotoRecord`s. Both are object-safe so the service can hold them as
//! `Arc<dyn …>` and tests can swap in the in-memory doubles.

use crate::models::photo::PhotoRecord;
use async_trait::async_trait;
use bytes::Bytes;
use std::io;
use thiserror::Error;

pub mod blob_store;
#[cfg(test)]
pub mod memory;
pub mod metadata_store;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid blob key `{0}`")]
    InvalidKey(String),
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Key-addressed binary storage. No read path is needed by the service.
#[async_trait]
pub trait BlobStore: Send + Sync + 'static {
    /// Write `body` under `key`, replacing whatever was there.
    async fn put(&self, key: &str, body: Bytes, content_type: &str) -> StoreResult<()>;

    /// Remove the blob under `key`. Removing a missing key succeeds.
    async fn delete(&self, key: &str) -> StoreResult<()>;

    /// Cheap round-trip used by the readiness probe.
    async fn ping(&self) -> StoreResult<()>;
}

/// Record storage keyed by `image_id`, read only through full scans.
#[async_trait]
pub trait MetadataStore: Send + Sync + 'static {
    /// Every stored record, in whatever order the backend yields them.
    async fn scan_all(&self) -> StoreResult<Vec<PhotoRecord>>;

    /// Insert or replace the record with the same `image_id`.
    async fn put(&self, record: &PhotoRecord) -> StoreResult<()>;

    /// Remove the record with this `image_id`.
    async fn delete(&self, image_id: &str) -> StoreResult<()>;

    async fn ping(&self) -> StoreResult<()>;
}

const MAX_BLOB_KEY_LEN: usize = 1024;

/// Reject keys that would escape the bucket directory or break the
/// last-segment key recovery done on delete.
pub fn ensure_key_safe(key: &str) -> StoreResult<()> {
    let invalid = || StoreError::InvalidKey(key.to_string());
    if key.is_empty() || key.len() > MAX_BLOB_KEY_LEN {
        return Err(invalid());
    }
    if key == "." || key.contains('/') || key.contains("..") {
        return Err(invalid());
    }
    if key
        .bytes()
        .any(|b| b.is_ascii_control() || b == b'\\' || b == b'\0')
    {
        return Err(invalid());
    }
    Ok(())
}
