use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use file_engine_storage::{
    ByteReader, ByteStream, ObjectInfo, Storage, StorageBackend, StorageError, StorageResult,
};
use tokio::io::AsyncReadExt;

type ObjectMap = HashMap<(String, String), (Vec<u8>, String)>;

/// Object store backed by a map of `(container, key)` to bytes and content type
#[derive(Default)]
pub struct MockStorage {
    objects: Arc<Mutex<ObjectMap>>,
    fail_upload: AtomicBool,
    fail_delete: AtomicBool,
    fail_presign: AtomicBool,
    not_found_on_delete: AtomicBool,
    allow_overwrite: AtomicBool,
    upload_calls: AtomicUsize,
    delete_calls: AtomicUsize,
}

impl MockStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_upload(&self, fail: bool) {
        self.fail_upload.store(fail, Ordering::SeqCst);
    }

    pub fn fail_delete(&self, fail: bool) {
        self.fail_delete.store(fail, Ordering::SeqCst);
    }

    pub fn fail_presign(&self, fail: bool) {
        self.fail_presign.store(fail, Ordering::SeqCst);
    }

    /// Report a missing object on delete as `NotFound` instead of succeeding silently
    pub fn not_found_on_delete(&self, enabled: bool) {
        self.not_found_on_delete.store(enabled, Ordering::SeqCst);
    }

    /// Let uploads replace existing objects, as a store without create-only writes would
    pub fn allow_overwrite(&self, enabled: bool) {
        self.allow_overwrite.store(enabled, Ordering::SeqCst);
    }

    pub fn insert_object(&self, container: &str, key: &str, data: &[u8]) {
        self.lock().insert(
            (container.to_string(), key.to_string()),
            (data.to_vec(), String::new()),
        );
    }

    pub fn remove_object(&self, container: &str, key: &str) {
        self.lock()
            .remove(&(container.to_string(), key.to_string()));
    }

    pub fn object(&self, container: &str, key: &str) -> Option<Vec<u8>> {
        self.lock()
            .get(&(container.to_string(), key.to_string()))
            .map(|(data, _)| data.clone())
    }

    pub fn object_count(&self) -> usize {
        self.lock().len()
    }

    pub fn upload_calls(&self) -> usize {
        self.upload_calls.load(Ordering::SeqCst)
    }

    pub fn delete_calls(&self) -> usize {
        self.delete_calls.load(Ordering::SeqCst)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ObjectMap> {
        self.objects.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn entry_key(container: &str, key: &str) -> (String, String) {
        (container.to_string(), key.to_string())
    }
}

#[async_trait]
impl Storage for MockStorage {
    async fn upload(
        &self,
        container: &str,
        key: &str,
        mut reader: ByteReader,
        _size: Option<u64>,
        content_type: &str,
    ) -> StorageResult<u64> {
        self.upload_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_upload.load(Ordering::SeqCst) {
            return Err(StorageError::UploadFailed("injected upload failure".to_string()));
        }

        let mut data = Vec::new();
        reader.read_to_end(&mut data).await?;
        let written = data.len() as u64;

        let mut objects = self.lock();
        let entry = Self::entry_key(container, key);
        if objects.contains_key(&entry) && !self.allow_overwrite.load(Ordering::SeqCst) {
            return Err(StorageError::AlreadyExists(format!("{}/{}", container, key)));
        }
        objects.insert(entry, (data, content_type.to_string()));
        Ok(written)
    }

    async fn download(&self, container: &str, key: &str) -> StorageResult<ByteStream> {
        let data = self
            .object(container, key)
            .ok_or_else(|| StorageError::NotFound(format!("{}/{}", container, key)))?;

        // Two chunks, so consumers cannot assume a single-chunk body
        let mid = data.len() / 2;
        let chunks = vec![
            Ok(Bytes::copy_from_slice(&data[..mid])),
            Ok(Bytes::copy_from_slice(&data[mid..])),
        ];
        Ok(Box::pin(futures::stream::iter(chunks)))
    }

    async fn delete(&self, container: &str, key: &str) -> StorageResult<()> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_delete.load(Ordering::SeqCst) {
            return Err(StorageError::DeleteFailed("injected delete failure".to_string()));
        }

        let removed = self.lock().remove(&Self::entry_key(container, key));
        if removed.is_none() && self.not_found_on_delete.load(Ordering::SeqCst) {
            return Err(StorageError::NotFound(format!("{}/{}", container, key)));
        }
        Ok(())
    }

    async fn exists(&self, container: &str, key: &str) -> StorageResult<bool> {
        Ok(self.lock().contains_key(&Self::entry_key(container, key)))
    }

    async fn stat(&self, container: &str, key: &str) -> StorageResult<ObjectInfo> {
        let objects = self.lock();
        let (data, content_type) = objects
            .get(&Self::entry_key(container, key))
            .ok_or_else(|| StorageError::NotFound(format!("{}/{}", container, key)))?;

        Ok(ObjectInfo {
            key: key.to_string(),
            size: data.len() as u64,
            content_type: content_type.clone(),
            last_modified: Utc::now(),
            etag: None,
        })
    }

    async fn presign_upload(
        &self,
        container: &str,
        key: &str,
        ttl: Duration,
    ) -> StorageResult<String> {
        if self.fail_presign.load(Ordering::SeqCst) {
            return Err(StorageError::BackendError("injected presign failure".to_string()));
        }
        // Mirror S3 signers, which percent-encode the separator between bucket and key
        Ok(format!(
            "https://mock-storage.local/{}%2F{}?X-Amz-Expires={}&X-Amz-Signature=sig%2Fpart",
            container,
            key,
            ttl.as_secs()
        ))
    }

    async fn presign_download(
        &self,
        container: &str,
        key: &str,
        ttl: Duration,
    ) -> StorageResult<String> {
        if self.fail_presign.load(Ordering::SeqCst) {
            return Err(StorageError::BackendError("injected presign failure".to_string()));
        }
        Ok(format!(
            "https://mock-storage.local/{}/{}?X-Amz-Expires={}",
            container,
            key,
            ttl.as_secs()
        ))
    }

    async fn ensure_container(&self, _container: &str) -> StorageResult<()> {
        Ok(())
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}
