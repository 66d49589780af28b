//! Represents a photo record and the JSON bodies returned around it.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Metadata for one uploaded photo.
///
/// The image bytes live in the blob store; this record only carries the
/// locator pointing at them.
#[derive(Serialize, Deserialize, Clone, FromRow, Debug, PartialEq, Eq)]
pub struct PhotoRecord {
    /// Server-generated identifier, assigned once at upload.
    #[serde(rename = "imageID")]
    pub image_id: String,

    /// Free-text caption. Empty when the uploader gave none.
    #[serde(default)]
    pub description: String,

    /// Fully-qualified locator of the stored blob, derived from bucket and key.
    #[serde(rename = "s3Url")]
    pub s3_url: String,
}

impl PhotoRecord {
    /// Blob key recovered from the last path segment of `s3_url`.
    pub fn blob_key(&self) -> &str {
        self.s3_url.rsplit('/').next().unwrap_or(&self.s3_url)
    }
}

/// Body of a successful `POST /api/upload`.
#[derive(Serialize, Debug)]
pub struct UploadResponse {
    pub success: bool,
    #[serde(rename = "s3Url")]
    pub s3_url: String,
}

/// Body of a successful `DELETE /api/photos/{image_id}`.
#[derive(Serialize, Debug)]
pub struct DeleteResponse {
    pub success: bool,
}
