//! Local-disk blob store.
//!
//! Blobs live flat under `base_path/{bucket}/{key}` so the directory can be
//! served read-only at the locator prefix. Writes go through a temp file and
//! an atomic rename; concurrent writers to one key race and the last rename
//! wins.

use super::{BlobStore, StoreError, StoreResult, ensure_key_safe};
use async_trait::async_trait;
use bytes::Bytes;
use std::{
    io::{self, ErrorKind},
    path::PathBuf,
};
use tokio::{
    fs::{self, File},
    io::AsyncWriteExt,
};
use tracing::debug;
use uuid::Uuid;

#[derive(Clone, Debug)]
pub struct LocalBlobStore {
    /// Directory holding this bucket's blobs.
    root: PathBuf,
}

impl LocalBlobStore {
    /// Create the store rooted at `base_path/bucket`. The directory is created
    /// lazily on first write.
    pub fn new(base_path: impl Into<PathBuf>, bucket: &str) -> Self {
        let mut root = base_path.into();
        root.push(bucket);
        Self { root }
    }

    fn blob_path(&self, key: &str) -> StoreResult<PathBuf> {
        ensure_key_safe(key)?;
        Ok(self.root.join(key))
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn put(&self, key: &str, body: Bytes, content_type: &str) -> StoreResult<()> {
        let file_path = self.blob_path(key)?;
        fs::create_dir_all(&self.root).await?;

        let tmp_path = self.root.join(format!(".tmp-{}", Uuid::new_v4()));
        let mut file = File::create(&tmp_path).await?;

        let written = async {
            file.write_all(&body).await?;
            file.flush().await?;
            file.sync_all().await
        }
        .await;
        if let Err(err) = written {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(StoreError::Io(err));
        }

        if let Err(err) = fs::rename(&tmp_path, &file_path).await {
            if err.kind() == ErrorKind::AlreadyExists {
                fs::remove_file(&file_path).await?;
                fs::rename(&tmp_path, &file_path).await?;
            } else {
                let _ = fs::remove_file(&tmp_path).await;
                return Err(StoreError::Io(err));
            }
        }

        debug!(
            key,
            content_type,
            size_bytes = body.len(),
            "wrote blob {}",
            file_path.display()
        );
        Ok(())
    }

    async fn delete(&self, key: &str) -> StoreResult<()> {
        let file_path = self.blob_path(key)?;
        match fs::remove_file(&file_path).await {
            Ok(_) => debug!("removed blob {}", file_path.display()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                debug!("blob {} already missing", file_path.display());
            }
            Err(err) => return Err(StoreError::Io(err)),
        }
        Ok(())
    }

    /// Write, read back and remove a probe file under the bucket directory.
    async fn ping(&self) -> StoreResult<()> {
        fs::create_dir_all(&self.root).await?;
        let probe = self.root.join(format!(".readyz-{}", Uuid::new_v4()));
        fs::write(&probe, b"readyz").await?;
        let read_back = fs::read(&probe).await;
        let _ = fs::remove_file(&probe).await;
        if read_back? != b"readyz" {
            return Err(StoreError::Io(io::Error::new(
                ErrorKind::InvalidData,
                "probe file content mismatch",
            )));
        }
        Ok(())
    }
}
