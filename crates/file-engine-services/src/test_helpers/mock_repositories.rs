use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use file_engine_core::{AppError, FileRecord, FileStatus, NewFileRecord};
use file_engine_db::FileMetadataStore;
use uuid::Uuid;

/// Metadata store backed by a map of id to record, with a unique name constraint
#[derive(Default)]
pub struct MockFileRepository {
    records: Arc<Mutex<HashMap<Uuid, FileRecord>>>,
    fail_create: AtomicBool,
    fail_delete: AtomicBool,
    fail_ping: AtomicBool,
    miss_next_name_lookup: AtomicBool,
}

impl MockFileRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// A committed record created now
    pub fn record(name: &str, container: &str) -> FileRecord {
        Self::record_at(name, container, Utc::now())
    }

    /// A committed record with a fixed creation time
    pub fn record_at(name: &str, container: &str, create_time: DateTime<Utc>) -> FileRecord {
        FileRecord {
            id: Uuid::new_v4(),
            name: name.to_string(),
            container_id: container.to_string(),
            object_key: name.to_string(),
            size: 0,
            content_type: "application/octet-stream".to_string(),
            icon: String::new(),
            status: FileStatus::Committed,
            create_time,
            update_time: create_time,
        }
    }

    pub fn insert(&self, record: FileRecord) {
        self.lock().insert(record.id, record);
    }

    pub fn get(&self, id: Uuid) -> Option<FileRecord> {
        self.lock().get(&id).cloned()
    }

    pub fn record_count(&self) -> usize {
        self.lock().len()
    }

    pub fn fail_create(&self, fail: bool) {
        self.fail_create.store(fail, Ordering::SeqCst);
    }

    pub fn fail_delete(&self, fail: bool) {
        self.fail_delete.store(fail, Ordering::SeqCst);
    }

    pub fn fail_ping(&self, fail: bool) {
        self.fail_ping.store(fail, Ordering::SeqCst);
    }

    /// Make the next `get_by_name` miss, as an uploader racing the insert would see it
    pub fn miss_next_name_lookup(&self) {
        self.miss_next_name_lookup.store(true, Ordering::SeqCst);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<Uuid, FileRecord>> {
        self.records.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl FileMetadataStore for MockFileRepository {
    async fn create(&self, record: &NewFileRecord) -> Result<FileRecord, AppError> {
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(AppError::Metadata("injected insert failure".to_string()));
        }

        let mut records = self.lock();
        if records.values().any(|r| r.name == record.name) {
            return Err(AppError::AlreadyExists(format!(
                "File {} already exists",
                record.name
            )));
        }

        let created = record.clone().into_record(Utc::now());
        records.insert(created.id, created.clone());
        Ok(created)
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<FileRecord>, AppError> {
        Ok(self.get(id))
    }

    async fn get_by_name(&self, name: &str) -> Result<Option<FileRecord>, AppError> {
        if self.miss_next_name_lookup.swap(false, Ordering::SeqCst) {
            return Ok(None);
        }
        Ok(self.lock().values().find(|r| r.name == name).cloned())
    }

    async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        if self.fail_delete.load(Ordering::SeqCst) {
            return Err(AppError::Metadata("injected delete failure".to_string()));
        }
        Ok(self.lock().remove(&id).is_some())
    }

    async fn list(
        &self,
        container: &str,
        page: i64,
        page_size: i64,
    ) -> Result<(Vec<FileRecord>, i64), AppError> {
        let mut matching: Vec<FileRecord> = self
            .lock()
            .values()
            .filter(|r| r.container_id == container)
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.create_time.cmp(&a.create_time).then(b.id.cmp(&a.id)));

        let total = matching.len() as i64;
        let offset = (page.max(1) - 1).saturating_mul(page_size.max(0));
        let offset = usize::try_from(offset).unwrap_or(usize::MAX);
        let files = matching
            .into_iter()
            .skip(offset)
            .take(page_size.max(0) as usize)
            .collect();

        Ok((files, total))
    }

    async fn list_pending(
        &self,
        older_than: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<FileRecord>, AppError> {
        let mut pending: Vec<FileRecord> = self
            .lock()
            .values()
            .filter(|r| r.status == FileStatus::Pending && r.create_time < older_than)
            .cloned()
            .collect();
        pending.sort_by_key(|r| r.create_time);
        pending.truncate(limit.max(0) as usize);
        Ok(pending)
    }

    async fn mark_committed(&self, id: Uuid) -> Result<bool, AppError> {
        let mut records = self.lock();
        match records.get_mut(&id) {
            Some(record) if record.status == FileStatus::Pending => {
                record.status = FileStatus::Committed;
                record.update_time = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn ping(&self) -> Result<(), AppError> {
        if self.fail_ping.load(Ordering::SeqCst) {
            return Err(AppError::Metadata("injected ping failure".to_string()));
        }
        Ok(())
    }
}
