use chrono::Utc;
use sqlx::SqlitePool;

use super::SqliteInitError;

/// Key-value tables, one per namespace. Values are JSON payloads.
const NAMESPACE_TABLES: [&str; 3] = ["lesson_cache", "module_progress", "course_syllabi"];

/// Runs versioned migrations for the current schema.
///
/// Each namespace is a plain `key -> payload` table; there are no foreign keys
/// because nothing is enforced across namespaces.
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), SqliteInitError> {
    async fn is_applied(pool: &SqlitePool, version: i64) -> Result<bool, sqlx::Error> {
        let row = sqlx::query("SELECT 1 FROM schema_migrations WHERE version = ?1")
            .bind(version)
            .fetch_optional(pool)
            .await?;
        Ok(row.is_some())
    }

    sqlx::query(
        r"
            CREATE TABLE IF NOT EXISTS schema_migrations (
                version INTEGER PRIMARY KEY,
                applied_at TEXT NOT NULL
            );
            ",
    )
    .execute(pool)
    .await?;

    // Version 1: namespace tables.
    if !is_applied(pool, 1).await? {
        let mut tx = pool.begin().await?;

        for table in NAMESPACE_TABLES {
            let ddl = format!(
                r"
                    CREATE TABLE IF NOT EXISTS {table} (
                        key TEXT PRIMARY KEY NOT NULL,
                        payload TEXT NOT NULL,
                        updated_at TEXT NOT NULL
                    );
                "
            );
            sqlx::query(&ddl).execute(&mut *tx).await?;
        }

        sqlx::query(
            r"
                INSERT INTO schema_migrations (version, applied_at)
                VALUES (?1, ?2)
                ON CONFLICT(version) DO NOTHING
            ",
        )
        .bind(1_i64)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        tracing::debug!(version = 1, "applied sqlite migration");
    }

    // Version 2: saved courses, one JSON id list per learner.
    if !is_applied(pool, 2).await? {
        let mut tx = pool.begin().await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS course_bookmarks (
                    key TEXT PRIMARY KEY NOT NULL,
                    payload TEXT NOT NULL,
                    updated_at TEXT NOT NULL
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                INSERT INTO schema_migrations (version, applied_at)
                VALUES (?1, ?2)
                ON CONFLICT(version) DO NOTHING
            ",
        )
        .bind(2_i64)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        tracing::debug!(version = 2, "applied sqlite migration");
    }

    Ok(())
}
