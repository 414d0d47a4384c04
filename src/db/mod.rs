//! Database module for SQLite persistence.
//!
//! SQLite is the record store for groups and the profiles behind actor ids.

mod repository;

pub use repository::*;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;

/// Initialize the database connection pool and run migrations.
pub async fn init_database(db_path: &Path) -> Result<SqlitePool, sqlx::Error> {
    // Ensure the parent directory exists
    if let Some(parent) = db_path.parent() {
        tokio::fs::create_dir_all(parent).await.ok();
    }

    let db_url = format!("sqlite:{}?mode=rwc", db_path.display());

    let options = SqliteConnectOptions::from_str(&db_url)?
        .create_if_missing(true)
        .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
        .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
        .busy_timeout(std::time::Duration::from_secs(30));

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    run_migrations(&pool).await?;

    Ok(pool)
}

/// Run database migrations.
async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS profiles (
            id TEXT PRIMARY KEY,
            display_name TEXT NOT NULL,
            interests TEXT NOT NULL DEFAULT '[]',
            core_values TEXT NOT NULL DEFAULT '[]',
            lifestyle TEXT NOT NULL DEFAULT '[]',
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );
        "#,
    )
    .execute(pool)
    .await?;

    // posts: JSON array of encoded post strings
    // comments: JSON object mapping post position to a comment array
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS group_records (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            description TEXT,
            admin TEXT NOT NULL,
            members TEXT NOT NULL DEFAULT '[]',
            posts TEXT NOT NULL DEFAULT '[]',
            comments TEXT NOT NULL DEFAULT '{}',
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_profiles_display_name ON profiles(display_name);
        CREATE INDEX IF NOT EXISTS idx_group_records_admin ON group_records(admin);
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
