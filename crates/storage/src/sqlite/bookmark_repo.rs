use async_trait::async_trait;
use chrono::Utc;
use course_core::model::{CourseId, UserId};
use sqlx::Row;

use super::SqliteRepository;
use super::mapping::{conn, from_payload, ser, to_payload};
use crate::repository::{BookmarkRepository, StorageError, keys};

#[async_trait]
impl BookmarkRepository for SqliteRepository {
    async fn get_bookmarks(&self, user: &UserId) -> Result<Vec<CourseId>, StorageError> {
        let key = keys::bookmarks(user);
        let row = sqlx::query("SELECT payload FROM course_bookmarks WHERE key = ?1")
            .bind(&key)
            .fetch_optional(&self.pool)
            .await
            .map_err(conn)?;

        let Some(row) = row else {
            return Ok(Vec::new());
        };
        let raw: String = row.try_get("payload").map_err(ser)?;
        from_payload(&key, &raw)
    }

    async fn save_bookmarks(&self, user: &UserId, courses: &[CourseId]) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO course_bookmarks (key, payload, updated_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(key) DO UPDATE SET
                payload = excluded.payload,
                updated_at = excluded.updated_at
            ",
        )
        .bind(keys::bookmarks(user))
        .bind(to_payload(courses)?)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        Ok(())
    }
}
