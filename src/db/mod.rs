//! Database module for SQLite persistence.
//!
//! SQLite is the source of truth for the catalog.

mod repository;

pub use repository::*;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;

use crate::errors::AppError;
use crate::models::CatalogItem;

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
        CREATE TABLE IF NOT EXISTS meta (
            id INTEGER PRIMARY KEY CHECK (id = 1),
            schema_version INTEGER NOT NULL DEFAULT 1,
            revision_id INTEGER NOT NULL DEFAULT 0,
            generated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        INSERT OR IGNORE INTO meta (id, schema_version, revision_id, generated_at)
        VALUES (1, 1, 0, datetime('now'));
        "#,
    )
    .execute(pool)
    .await?;

    // `seq` keeps insertion order; list views and featured strips depend on it.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS items (
            seq INTEGER PRIMARY KEY AUTOINCREMENT,
            id TEXT NOT NULL UNIQUE,
            kind TEXT NOT NULL,
            name TEXT NOT NULL,
            short_description TEXT NOT NULL DEFAULT '',
            description TEXT NOT NULL DEFAULT '',
            category TEXT NOT NULL,
            tags TEXT NOT NULL DEFAULT '[]',
            image TEXT,
            popularity INTEGER NOT NULL DEFAULT 0 CHECK (popularity >= 0),
            rating REAL NOT NULL DEFAULT 0 CHECK (rating >= 0 AND rating <= 5),
            review_count INTEGER NOT NULL DEFAULT 0 CHECK (review_count >= 0),
            created_at TEXT,
            updated_at TEXT,
            details TEXT NOT NULL
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_items_kind ON items(kind);
        CREATE INDEX IF NOT EXISTS idx_items_category ON items(category);
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Import a JSON array of items into an empty catalog.
///
/// Returns the number of imported items; a non-empty catalog is left alone.
pub async fn import_seed(repo: &Repository, seed_path: &Path) -> Result<usize, AppError> {
    if repo.count_items().await? > 0 {
        tracing::info!("Catalog not empty, skipping seed {:?}", seed_path);
        return Ok(0);
    }

    let raw = tokio::fs::read_to_string(seed_path).await.map_err(|e| {
        AppError::Internal(format!("Failed to read seed file {:?}: {}", seed_path, e))
    })?;
    let mut items: Vec<CatalogItem> = serde_json::from_str(&raw)?;

    for item in &mut items {
        item.normalize_rating();
        item.validate()?;
    }

    repo.insert_items(&items).await?;
    tracing::info!("Imported {} seed items from {:?}", items.len(), seed_path);
    Ok(items.len())
}
