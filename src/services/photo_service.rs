//! src/services/photo_service.rs
//!
//! PhotoService — list/upload/delete of photo records on top of a
//! `MetadataStore` (records) and a `BlobStore` (image bytes). The two stores
//! are written independently with no rollback between them, so a failure
//! between the calls leaves an orphan: a blob without a record after a failed
//! upload, or a record without a blob after a failed delete.

use crate::{
    models::photo::PhotoRecord,
    stores::{BlobStore, MetadataStore, StoreError, ensure_key_safe},
};
use bytes::Bytes;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

#[derive(Debug, Error)]
pub enum PhotoError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("photo `{0}` not found")]
    NotFound(String),
    #[error("metadata store unavailable")]
    StoreUnavailable(#[source] StoreError),
    #[error("upload failed")]
    UploadFailed(#[source] StoreError),
    #[error("delete failed")]
    DeleteFailed(#[source] StoreError),
}

pub type PhotoResult<T> = Result<T, PhotoError>;

/// The file part of an upload as received from the client.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    /// Original filename; also used verbatim as the blob key.
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

/// Result of the readiness probe for each store.
#[derive(Debug)]
pub struct Readiness {
    pub metadata: Result<(), String>,
    pub blobs: Result<(), String>,
}

impl Readiness {
    pub fn is_ready(&self) -> bool {
        self.metadata.is_ok() && self.blobs.is_ok()
    }
}

/// Orchestrates the metadata and blob stores. Cheap to clone; every call
/// reads the stores fresh and keeps no state between requests.
#[derive(Clone)]
pub struct PhotoService {
    metadata: Arc<dyn MetadataStore>,
    blobs: Arc<dyn BlobStore>,
    bucket: String,
    blob_base_url: String,
}

impl PhotoService {
    pub fn new(
        metadata: Arc<dyn MetadataStore>,
        blobs: Arc<dyn BlobStore>,
        bucket: impl Into<String>,
        blob_base_url: impl Into<String>,
    ) -> Self {
        Self {
            metadata,
            blobs,
            bucket: bucket.into(),
            blob_base_url: blob_base_url.into(),
        }
    }

    /// Locator for a blob key: `{base}/{bucket}/{key}`.
    ///
    /// Built from configuration alone so it does not depend on anything the
    /// blob store reports back.
    pub fn blob_url(&self, key: &str) -> String {
        format!(
            "{}/{}/{}",
            self.blob_base_url.trim_end_matches('/'),
            self.bucket,
            key
        )
    }

    /// All records in store scan order.
    pub async fn list(&self) -> PhotoResult<Vec<PhotoRecord>> {
        self.metadata
            .scan_all()
            .await
            .map_err(PhotoError::StoreUnavailable)
    }

    /// Store the blob under its original filename, then write the record.
    ///
    /// Two uploads sharing a filename get distinct records pointing at the
    /// same blob, and the later bytes win.
    pub async fn upload(
        &self,
        file: Option<UploadedFile>,
        description: Option<String>,
    ) -> PhotoResult<PhotoRecord> {
        let file = file.ok_or_else(|| PhotoError::InvalidRequest("No file uploaded".into()))?;
        let key = file
            .file_name
            .filter(|name| !name.is_empty())
            .ok_or_else(|| PhotoError::InvalidRequest("No file uploaded".into()))?;
        ensure_key_safe(&key).map_err(|err| PhotoError::InvalidRequest(err.to_string()))?;

        let image_id = Uuid::new_v4().to_string();
        let content_type = file
            .content_type
            .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string());

        self.blobs
            .put(&key, file.bytes, &content_type)
            .await
            .map_err(PhotoError::UploadFailed)?;

        let record = PhotoRecord {
            image_id,
            description: description.unwrap_or_default(),
            s3_url: self.blob_url(&key),
        };

        if let Err(err) = self.metadata.put(&record).await {
            warn!(
                key = %key,
                image_id = %record.image_id,
                "blob stored but metadata write failed; blob left orphaned"
            );
            return Err(PhotoError::UploadFailed(err));
        }

        info!(image_id = %record.image_id, key = %key, "photo uploaded");
        Ok(record)
    }

    /// Find the record by scanning, delete its blob, then delete the record.
    ///
    /// A failed blob delete stops before the record is touched.
    pub async fn delete(&self, image_id: &str) -> PhotoResult<PhotoRecord> {
        let record = self
            .metadata
            .scan_all()
            .await
            .map_err(PhotoError::DeleteFailed)?
            .into_iter()
            .find(|r| r.image_id == image_id)
            .ok_or_else(|| PhotoError::NotFound(image_id.to_string()))?;

        self.blobs
            .delete(record.blob_key())
            .await
            .map_err(PhotoError::DeleteFailed)?;

        if let Err(err) = self.metadata.delete(image_id).await {
            warn!(
                image_id,
                key = record.blob_key(),
                "blob removed but metadata delete failed; record left dangling"
            );
            return Err(PhotoError::DeleteFailed(err));
        }

        info!(image_id, key = record.blob_key(), "photo deleted");
        Ok(record)
    }

    pub async fn readiness(&self) -> Readiness {
        let (metadata, blobs) = tokio::join!(self.metadata.ping(), self.blobs.ping());
        Readiness {
            metadata: metadata.map_err(|e| format!("error: {}", e)),
            blobs: blobs.map_err(|e| format!("error: {}", e)),
        }
    }
}
