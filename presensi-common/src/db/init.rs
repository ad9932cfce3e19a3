//! Database initialization
//!
//! Creates the database on first run and brings the schema up idempotently
//! on every start.

use crate::Result;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::path::Path;
use tracing::info;

/// Initialize database connection and create tables if needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    // Create parent directory if it doesn't exist
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .connect(&db_url)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    // Enable foreign keys
    sqlx::query("PRAGMA foreign_keys = ON").execute(&pool).await?;

    // WAL allows concurrent readers with one writer; every operator
    // device writes through this pool while dashboards read
    sqlx::query("PRAGMA journal_mode = WAL").execute(&pool).await?;

    sqlx::query("PRAGMA busy_timeout = 5000").execute(&pool).await?;

    create_tables(&pool).await?;

    Ok(pool)
}

/// Create all tables (idempotent; also used by in-memory test pools)
pub async fn create_tables(pool: &SqlitePool) -> Result<()> {
    create_attendance_table(pool).await?;
    create_master_students_table(pool).await?;
    Ok(())
}

async fn create_attendance_table(pool: &SqlitePool) -> Result<()> {
    // PRIMARY KEY (day, record_key) is the one-record-per-student-per-day
    // invariant; upserts on the key replace, never duplicate.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS attendance (
            day TEXT NOT NULL,
            record_key TEXT NOT NULL,
            name TEXT NOT NULL,
            class TEXT NOT NULL,
            gender TEXT NOT NULL,
            recorded_at_ms INTEGER NOT NULL,
            recorded_time TEXT NOT NULL,
            status TEXT NOT NULL,
            origin TEXT NOT NULL,
            recorded_by TEXT NOT NULL,
            recorded_by_class TEXT NOT NULL,
            PRIMARY KEY (day, record_key)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_attendance_recorded_by ON attendance (recorded_by)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_master_students_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS master_students (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            class TEXT NOT NULL,
            gender TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_init_creates_database_file() {
        let dir = TempDir::new().unwrap();
        let db_path = dir.path().join("data").join("presensi.db");
        assert!(!db_path.exists());

        let pool = init_database(&db_path).await.unwrap();
        assert!(db_path.exists());

        // Schema init is idempotent
        create_tables(&pool).await.unwrap();

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM attendance")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn test_reopen_existing_database() {
        let dir = TempDir::new().unwrap();
        let db_path = dir.path().join("presensi.db");

        {
            let pool = init_database(&db_path).await.unwrap();
            sqlx::query("INSERT INTO master_students (id, name, class, gender) VALUES (?, ?, ?, ?)")
                .bind("s1")
                .bind("Ahmad")
                .bind("X.1")
                .bind("M")
                .execute(&pool)
                .await
                .unwrap();
            pool.close().await;
        }

        let pool = init_database(&db_path).await.unwrap();
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM master_students")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 1);
    }
}
