use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;

/// Whether the object behind a record is known to exist.
///
/// Direct uploads are `Committed` on creation. Presigned uploads start `Pending` because
/// the client has not written any bytes when the record is inserted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    Pending,
    Committed,
}

impl FileStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileStatus::Pending => "pending",
            FileStatus::Committed => "committed",
        }
    }
}

impl FromStr for FileStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(FileStatus::Pending),
            "committed" => Ok(FileStatus::Committed),
            _ => Err(anyhow::anyhow!("Invalid file status: {}", s)),
        }
    }
}

impl Display for FileStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

/// File metadata row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct FileRecord {
    pub id: Uuid,
    /// Original filename, unique across the system
    pub name: String,
    /// Container (bucket) holding the object
    #[serde(rename = "bucket_id")]
    pub container_id: String,
    /// Key of the object inside the container
    pub object_key: String,
    pub size: i64,
    pub content_type: String,
    pub icon: String,
    pub status: FileStatus,
    pub create_time: DateTime<Utc>,
    pub update_time: DateTime<Utc>,
}

/// Values the transfer service supplies when inserting a record.
///
/// Timestamps are absent on purpose: the metadata store stamps them.
#[derive(Debug, Clone, PartialEq)]
pub struct NewFileRecord {
    pub id: Uuid,
    pub name: String,
    pub container_id: String,
    pub object_key: String,
    pub size: i64,
    pub content_type: String,
    pub icon: String,
    pub status: FileStatus,
}

impl NewFileRecord {
    /// Stamp the record as the store would on insert.
    pub fn into_record(self, now: DateTime<Utc>) -> FileRecord {
        FileRecord {
            id: self.id,
            name: self.name,
            container_id: self.container_id,
            object_key: self.object_key,
            size: self.size,
            content_type: self.content_type,
            icon: self.icon,
            status: self.status,
            create_time: now,
            update_time: now,
        }
    }
}

/// One page of file records plus the pagination that was actually applied.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct FileListPage {
    pub files: Vec<FileRecord>,
    pub total: i64,
    pub page: i64,
    pub page_size: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trips_through_str() {
        for status in [FileStatus::Pending, FileStatus::Committed] {
            assert_eq!(status.as_str().parse::<FileStatus>().unwrap(), status);
        }
        assert!("deleted".parse::<FileStatus>().is_err());
    }

    #[test]
    fn test_record_serializes_container_as_bucket_id() {
        let record = NewFileRecord {
            id: Uuid::new_v4(),
            name: "a.txt".to_string(),
            container_id: "files".to_string(),
            object_key: "a.txt".to_string(),
            size: 3,
            content_type: "text/plain".to_string(),
            icon: String::new(),
            status: FileStatus::Committed,
        }
        .into_record(Utc::now());

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["bucket_id"], "files");
        assert_eq!(json["status"], "committed");
        assert!(json.get("container_id").is_none());
    }
}
