use chrono::{DateTime, Utc};
use file_engine_core::{AppError, FileRecord, FileStatus, NewFileRecord};
use sqlx::{PgPool, Postgres, Row};
use uuid::Uuid;

const FILE_COLUMNS: &str = "id, name, container_id, object_key, size, content_type, icon, status, \
                            create_time, update_time";

/// Port for the file metadata store
///
/// Implemented by [`FileRepository`] for PostgreSQL; the transfer service only sees this trait.
#[async_trait::async_trait]
pub trait FileMetadataStore: Send + Sync {
    /// Insert a record. A duplicate name yields `AppError::AlreadyExists`.
    async fn create(&self, record: &NewFileRecord) -> Result<FileRecord, AppError>;

    async fn get_by_id(&self, id: Uuid) -> Result<Option<FileRecord>, AppError>;

    async fn get_by_name(&self, name: &str) -> Result<Option<FileRecord>, AppError>;

    /// Remove a record. Returns whether a row was deleted.
    async fn delete(&self, id: Uuid) -> Result<bool, AppError>;

    /// One page of records in `container`, newest first, plus the total count.
    async fn list(
        &self,
        container: &str,
        page: i64,
        page_size: i64,
    ) -> Result<(Vec<FileRecord>, i64), AppError>;

    /// Pending records created before `older_than`, oldest first.
    async fn list_pending(
        &self,
        older_than: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<FileRecord>, AppError>;

    /// Promote a pending record. Returns false if it was not pending.
    async fn mark_committed(&self, id: Uuid) -> Result<bool, AppError>;

    async fn ping(&self) -> Result<(), AppError>;
}

/// Repository for the `files` table
#[derive(Clone)]
pub struct FileRepository {
    pool: PgPool,
}

impl FileRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

struct FileRow(FileRecord);

impl<'r> sqlx::FromRow<'r, sqlx::postgres::PgRow> for FileRow {
    fn from_row(row: &'r sqlx::postgres::PgRow) -> Result<Self, sqlx::Error> {
        let status: String = row.try_get("status")?;
        let status = status
            .parse::<FileStatus>()
            .map_err(|e| sqlx::Error::Decode(e.into()))?;

        Ok(FileRow(FileRecord {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            container_id: row.try_get("container_id")?,
            object_key: row.try_get("object_key")?,
            size: row.try_get("size")?,
            content_type: row.try_get("content_type")?,
            icon: row.try_get("icon")?,
            status,
            create_time: row.try_get("create_time")?,
            update_time: row.try_get("update_time")?,
        }))
    }
}

/// Row offset of a 1-based page, saturating instead of overflowing
fn page_offset(page: i64, page_size: i64) -> i64 {
    (page.max(1) - 1).saturating_mul(page_size.max(0))
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.is_unique_violation(),
        _ => false,
    }
}

#[async_trait::async_trait]
impl FileMetadataStore for FileRepository {
    #[tracing::instrument(skip(self, record), fields(db.table = "files", db.operation = "insert", db.record_id = %record.id))]
    async fn create(&self, record: &NewFileRecord) -> Result<FileRecord, AppError> {
        let sql = format!(
            r#"
            INSERT INTO files (id, name, container_id, object_key, size, content_type, icon, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {}
            "#,
            FILE_COLUMNS
        );

        let row = sqlx::query_as::<Postgres, FileRow>(&sql)
            .bind(record.id)
            .bind(&record.name)
            .bind(&record.container_id)
            .bind(&record.object_key)
            .bind(record.size)
            .bind(&record.content_type)
            .bind(&record.icon)
            .bind(record.status.as_str())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    AppError::AlreadyExists(format!("File {} already exists", record.name))
                } else {
                    tracing::error!(error = ?e, name = %record.name, "Failed to insert file record");
                    AppError::from(e)
                }
            })?;

        Ok(row.0)
    }

    #[tracing::instrument(skip(self), fields(db.table = "files", db.operation = "select", db.record_id = %id))]
    async fn get_by_id(&self, id: Uuid) -> Result<Option<FileRecord>, AppError> {
        let sql = format!("SELECT {} FROM files WHERE id = $1", FILE_COLUMNS);
        let row = sqlx::query_as::<Postgres, FileRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|r| r.0))
    }

    #[tracing::instrument(skip(self), fields(db.table = "files", db.operation = "select"))]
    async fn get_by_name(&self, name: &str) -> Result<Option<FileRecord>, AppError> {
        let sql = format!("SELECT {} FROM files WHERE name = $1", FILE_COLUMNS);
        let row = sqlx::query_as::<Postgres, FileRow>(&sql)
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|r| r.0))
    }

    #[tracing::instrument(skip(self), fields(db.table = "files", db.operation = "delete", db.record_id = %id))]
    async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM files WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    #[tracing::instrument(skip(self), fields(db.table = "files", db.operation = "select", db.limit = %page_size))]
    async fn list(
        &self,
        container: &str,
        page: i64,
        page_size: i64,
    ) -> Result<(Vec<FileRecord>, i64), AppError> {
        let offset = page_offset(page, page_size);

        let total = sqlx::query_scalar::<Postgres, i64>(
            "SELECT COUNT(*) FROM files WHERE container_id = $1",
        )
        .bind(container)
        .fetch_one(&self.pool)
        .await?;

        let sql = format!(
            r#"
            SELECT {}
            FROM files
            WHERE container_id = $1
            ORDER BY create_time DESC, id DESC
            LIMIT $2 OFFSET $3
            "#,
            FILE_COLUMNS
        );
        let rows = sqlx::query_as::<Postgres, FileRow>(&sql)
            .bind(container)
            .bind(page_size)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        Ok((rows.into_iter().map(|r| r.0).collect(), total))
    }

    #[tracing::instrument(skip(self), fields(db.table = "files", db.operation = "select", db.limit = %limit))]
    async fn list_pending(
        &self,
        older_than: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<FileRecord>, AppError> {
        let sql = format!(
            r#"
            SELECT {}
            FROM files
            WHERE status = 'pending' AND create_time < $1
            ORDER BY create_time ASC
            LIMIT $2
            "#,
            FILE_COLUMNS
        );
        let rows = sqlx::query_as::<Postgres, FileRow>(&sql)
            .bind(older_than)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(|r| r.0).collect())
    }

    #[tracing::instrument(skip(self), fields(db.table = "files", db.operation = "update", db.record_id = %id))]
    async fn mark_committed(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE files
            SET status = 'committed', update_time = NOW()
            WHERE id = $1 AND status = 'pending'
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn ping(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_database_errors_are_not_unique_violations() {
        assert!(!is_unique_violation(&sqlx::Error::RowNotFound));
        assert!(!is_unique_violation(&sqlx::Error::PoolTimedOut));
    }

    #[test]
    fn test_page_offset_saturates() {
        assert_eq!(page_offset(0, 20), 0);
        assert_eq!(page_offset(3, 20), 40);
        assert_eq!(page_offset(i64::MAX, 20), i64::MAX);
    }

    #[test]
    fn test_column_list_matches_row_decoder() {
        for column in [
            "id",
            "name",
            "container_id",
            "object_key",
            "size",
            "content_type",
            "icon",
            "status",
            "create_time",
            "update_time",
        ] {
            assert!(FILE_COLUMNS.split(',').any(|c| c.trim() == column), "{column}");
        }
    }
}
