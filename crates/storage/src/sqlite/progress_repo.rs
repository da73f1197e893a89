use async_trait::async_trait;
use course_core::model::{CourseId, ModuleId, ProgressRecord, UserId};
use sqlx::Row;

use super::SqliteRepository;
use super::mapping::{conn, from_payload, ser, to_payload};
use crate::repository::{ProgressRepository, StorageError, keys};

#[async_trait]
impl ProgressRepository for SqliteRepository {
    async fn get_progress(
        &self,
        user: &UserId,
        course: &CourseId,
        module: &ModuleId,
    ) -> Result<Option<ProgressRecord>, StorageError> {
        let key = keys::progress(user, course, module);
        let row = sqlx::query("SELECT payload FROM module_progress WHERE key = ?1")
            .bind(&key)
            .fetch_optional(&self.pool)
            .await
            .map_err(conn)?;

        match row {
            Some(row) => {
                let raw: String = row.try_get("payload").map_err(ser)?;
                from_payload(&key, &raw).map(Some)
            }
            None => Ok(None),
        }
    }

    async fn save_progress(
        &self,
        user: &UserId,
        course: &CourseId,
        module: &ModuleId,
        record: &ProgressRecord,
    ) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO module_progress (key, payload, updated_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(key) DO UPDATE SET
                payload = excluded.payload,
                updated_at = excluded.updated_at
            ",
        )
        .bind(keys::progress(user, course, module))
        .bind(to_payload(record)?)
        .bind(record.updated_at)
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        Ok(())
    }
}
