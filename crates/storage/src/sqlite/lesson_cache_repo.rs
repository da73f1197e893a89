use async_trait::async_trait;
use course_core::model::{CachedLessonContent, CourseId, StepId};
use sqlx::Row;

use super::SqliteRepository;
use super::mapping::{conn, from_payload, ser, to_payload};
use crate::repository::{LessonCacheRepository, StorageError, keys};

#[async_trait]
impl LessonCacheRepository for SqliteRepository {
    async fn get_lesson(
        &self,
        course: &CourseId,
        step: &StepId,
    ) -> Result<Option<CachedLessonContent>, StorageError> {
        let key = keys::lesson(course, step);
        let row = sqlx::query("SELECT payload FROM lesson_cache WHERE key = ?1")
            .bind(&key)
            .fetch_optional(&self.pool)
            .await
            .map_err(conn)?;

        let Some(row) = row else {
            return Ok(None);
        };
        let raw: String = row.try_get("payload").map_err(ser)?;
        from_payload(&key, &raw).map(Some)
    }

    async fn put_lesson(
        &self,
        course: &CourseId,
        step: &StepId,
        content: &CachedLessonContent,
    ) -> Result<(), StorageError> {
        let key = keys::lesson(course, step);
        sqlx::query(
            r"
            INSERT INTO lesson_cache (key, payload, updated_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(key) DO NOTHING
            ",
        )
        .bind(&key)
        .bind(to_payload(content)?)
        .bind(content.fetched_at)
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        Ok(())
    }
}
