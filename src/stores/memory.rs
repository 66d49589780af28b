//! In-memory store doubles with failure switches and write counters.

use super::{BlobStore, MetadataStore, StoreError, StoreResult};
use crate::models::photo::PhotoRecord;
use async_trait::async_trait;
use bytes::Bytes;
use std::{
    collections::HashMap,
    io,
    sync::{
        Mutex,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
};

fn injected(op: &str) -> StoreError {
    StoreError::Io(io::Error::other(format!("injected {op} failure")))
}

#[derive(Default)]
pub struct MemoryBlobStore {
    pub blobs: Mutex<HashMap<String, (Bytes, String)>>,
    pub puts: AtomicUsize,
    pub deletes: AtomicUsize,
    pub fail_put: AtomicBool,
    pub fail_delete: AtomicBool,
}

impl MemoryBlobStore {
    pub fn get(&self, key: &str) -> Option<(Bytes, String)> {
        self.blobs.lock().unwrap().get(key).cloned()
    }

    pub fn count(&self) -> usize {
        self.blobs.lock().unwrap().len()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put(&self, key: &str, body: Bytes, content_type: &str) -> StoreResult<()> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        if self.fail_put.load(Ordering::SeqCst) {
            return Err(injected("blob put"));
        }
        self.blobs
            .lock()
            .unwrap()
            .insert(key.to_string(), (body, content_type.to_string()));
        Ok(())
    }

    async fn delete(&self, key: &str) -> StoreResult<()> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        if self.fail_delete.load(Ordering::SeqCst) {
            return Err(injected("blob delete"));
        }
        self.blobs.lock().unwrap().remove(key);
        Ok(())
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}

/// Keeps insertion order so scans behave like a plain table read.
#[derive(Default)]
pub struct MemoryMetadataStore {
    pub records: Mutex<Vec<PhotoRecord>>,
    pub puts: AtomicUsize,
    pub fail_scan: AtomicBool,
    pub fail_put: AtomicBool,
    pub fail_delete: AtomicBool,
}

impl MemoryMetadataStore {
    pub fn snapshot(&self) -> Vec<PhotoRecord> {
        self.records.lock().unwrap().clone()
    }
}

#[async_trait]
impl MetadataStore for MemoryMetadataStore {
    async fn scan_all(&self) -> StoreResult<Vec<PhotoRecord>> {
        if self.fail_scan.load(Ordering::SeqCst) {
            return Err(injected("scan"));
        }
        Ok(self.snapshot())
    }

    async fn put(&self, record: &PhotoRecord) -> StoreResult<()> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        if self.fail_put.load(Ordering::SeqCst) {
            return Err(injected("metadata put"));
        }
        let mut records = self.records.lock().unwrap();
        records.retain(|r| r.image_id != record.image_id);
        records.push(record.clone());
        Ok(())
    }

    async fn delete(&self, image_id: &str) -> StoreResult<()> {
        if self.fail_delete.load(Ordering::SeqCst) {
            return Err(injected("metadata delete"));
        }
        self.records.lock().unwrap().retain(|r| r.image_id != image_id);
        Ok(())
    }

    async fn ping(&self) -> StoreResult<()> {
        if self.fail_scan.load(Ordering::SeqCst) {
            return Err(injected("ping"));
        }
        Ok(())
    }
}
