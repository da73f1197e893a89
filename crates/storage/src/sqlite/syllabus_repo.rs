use async_trait::async_trait;
use chrono::Utc;
use course_core::model::{CourseId, Module};
use sqlx::Row;

use super::SqliteRepository;
use super::mapping::{conn, from_payload, ser, to_payload};
use crate::repository::{StorageError, SyllabusRepository, keys};

#[async_trait]
impl SyllabusRepository for SqliteRepository {
    async fn get_syllabus(&self, course: &CourseId) -> Result<Option<Vec<Module>>, StorageError> {
        let key = keys::syllabus(course);
        let row = sqlx::query("SELECT payload FROM course_syllabi WHERE key = ?1")
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

    async fn save_syllabus(&self, course: &CourseId, modules: &[Module]) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO course_syllabi (key, payload, updated_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(key) DO UPDATE SET
                payload = excluded.payload,
                updated_at = excluded.updated_at
            ",
        )
        .bind(keys::syllabus(course))
        .bind(to_payload(modules)?)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        Ok(())
    }
}
