//! Database repository for catalog CRUD operations.
//!
//! Uses prepared statements and transactions for data integrity.

use chrono::{DateTime, Utc};
use sqlx::{Row, SqliteConnection, SqlitePool};

use crate::errors::AppError;
use crate::models::{CatalogItem, ItemDetails};

const ITEM_COLUMNS: &str = "id, name, short_description, description, category, tags, image, \
     popularity, rating, review_count, created_at, updated_at, details";

/// Database repository for all data operations.
#[derive(Clone)]
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Get the current revision ID.
    pub async fn get_revision_id(&self) -> Result<i64, AppError> {
        let row = sqlx::query("SELECT revision_id FROM meta WHERE id = 1")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get("revision_id"))
    }

    /// List all items in insertion order.
    pub async fn list_items(&self) -> Result<Vec<CatalogItem>, AppError> {
        let rows = sqlx::query(&format!("SELECT {} FROM items ORDER BY seq", ITEM_COLUMNS))
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(item_from_row).collect()
    }

    /// Get an item by ID.
    #[cfg(test)]
    pub async fn get_item(&self, id: &str) -> Result<Option<CatalogItem>, AppError> {
        let row = sqlx::query(&format!("SELECT {} FROM items WHERE id = ?", ITEM_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(item_from_row).transpose()
    }

    pub async fn count_items(&self) -> Result<i64, AppError> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM items")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get("n"))
    }

    /// Persist a new item and bump the revision.
    pub async fn insert_item(&self, item: &CatalogItem) -> Result<i64, AppError> {
        self.insert_items(std::slice::from_ref(item)).await
    }

    /// Persist several items in one transaction and bump the revision once.
    pub async fn insert_items(&self, items: &[CatalogItem]) -> Result<i64, AppError> {
        let mut tx = self.pool.begin().await?;

        for item in items {
            insert_row(&mut tx, item).await?;
        }

        let revision = bump_revision(&mut tx).await?;
        tx.commit().await?;

        Ok(revision)
    }

    /// Delete an item and bump the revision.
    pub async fn delete_item(&self, id: &str) -> Result<i64, AppError> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query("DELETE FROM items WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Item {} not found", id)));
        }

        let revision = bump_revision(&mut tx).await?;
        tx.commit().await?;

        Ok(revision)
    }
}

async fn bump_revision(conn: &mut SqliteConnection) -> Result<i64, AppError> {
    let now = Utc::now().to_rfc3339();
    sqlx::query("UPDATE meta SET revision_id = revision_id + 1, generated_at = ? WHERE id = 1")
        .bind(&now)
        .execute(&mut *conn)
        .await?;

    let row = sqlx::query("SELECT revision_id FROM meta WHERE id = 1")
        .fetch_one(&mut *conn)
        .await?;
    Ok(row.get("revision_id"))
}

async fn insert_row(conn: &mut SqliteConnection, item: &CatalogItem) -> Result<(), AppError> {
    let tags_json = serde_json::to_string(&item.tags)?;
    let details_json = serde_json::to_string(&item.details)?;

    let result = sqlx::query(
        "INSERT INTO items (id, kind, name, short_description, description, category, tags, image, popularity, rating, review_count, created_at, updated_at, details) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
    )
    .bind(&item.id)
    .bind(item.kind().as_str())
    .bind(&item.name)
    .bind(&item.short_description)
    .bind(&item.description)
    .bind(&item.category)
    .bind(&tags_json)
    .bind(&item.image)
    .bind(to_sql_count(item.popularity, "popularity")?)
    .bind(item.rating)
    .bind(to_sql_count(item.review_count, "reviewCount")?)
    .bind(item.created_at)
    .bind(item.updated_at)
    .bind(&details_json)
    .execute(&mut *conn)
    .await;

    match result {
        Ok(_) => Ok(()),
        Err(sqlx::Error::Database(db)) if db.is_unique_violation() => Err(AppError::Conflict(
            format!("Item {} already exists", item.id),
        )),
        Err(e) => Err(e.into()),
    }
}

fn to_sql_count(value: u64, field: &str) -> Result<i64, AppError> {
    i64::try_from(value)
        .map_err(|_| AppError::Validation(format!("{} {} is out of range", field, value)))
}

// Helper functions for row conversion

fn item_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<CatalogItem, AppError> {
    let tags_str: String = row.try_get("tags")?;
    let details_str: String = row.try_get("details")?;
    let details: ItemDetails = serde_json::from_str(&details_str).map_err(|e| {
        AppError::Internal(format!("Corrupt details for item {:?}: {}", row.get::<String, _>("id"), e))
    })?;
    let popularity: i64 = row.try_get("popularity")?;
    let review_count: i64 = row.try_get("review_count")?;
    let created_at: Option<DateTime<Utc>> = row.try_get("created_at")?;
    let updated_at: Option<DateTime<Utc>> = row.try_get("updated_at")?;

    Ok(CatalogItem {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        short_description: row.try_get("short_description")?,
        description: row.try_get("description")?,
        category: row.try_get("category")?,
        tags: parse_json_array(&tags_str),
        image: row.try_get("image")?,
        popularity: u64::try_from(popularity).unwrap_or(0),
        rating: row.try_get("rating")?,
        review_count: u64::try_from(review_count).unwrap_or(0),
        created_at,
        updated_at,
        details,
    })
}

fn parse_json_array(s: &str) -> Vec<String> {
    serde_json::from_str(s).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_database;
    use crate::models::CreateItemRequest;
    use serde_json::json;
    use tempfile::TempDir;

    async fn repo() -> (Repository, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let pool = init_database(&temp_dir.path().join("test.sqlite"))
            .await
            .unwrap();
        (Repository::new(pool), temp_dir)
    }

    fn upload(id: &str, name: &str) -> CatalogItem {
        let request: CreateItemRequest = serde_json::from_value(json!({
            "kind": "bot",
            "name": name,
            "category": "Music",
            "tags": ["audio", "dj"],
            "guildCount": 12,
        }))
        .unwrap();
        request.into_item(id.to_string(), Utc::now()).unwrap()
    }

    #[tokio::test]
    async fn test_insert_and_read_back() {
        let (repo, _dir) = repo().await;
        let item = upload("b-1", "Groove");

        let revision = repo.insert_item(&item).await.unwrap();
        assert_eq!(revision, 1);

        let stored = repo.get_item("b-1").await.unwrap().unwrap();
        assert_eq!(stored.name, "Groove");
        assert_eq!(stored.tags, vec!["audio", "dj"]);
        assert_eq!(stored.details.guild_count(), 12);
        assert_eq!(
            stored.created_at.map(|t| t.timestamp()),
            item.created_at.map(|t| t.timestamp())
        );
    }

    #[tokio::test]
    async fn test_list_keeps_insertion_order() {
        let (repo, _dir) = repo().await;
        repo.insert_item(&upload("z", "Zed")).await.unwrap();
        repo.insert_item(&upload("a", "Aye")).await.unwrap();

        let ids: Vec<_> = repo
            .list_items()
            .await
            .unwrap()
            .into_iter()
            .map(|i| i.id)
            .collect();
        assert_eq!(ids, vec!["z", "a"]);
    }

    #[tokio::test]
    async fn test_duplicate_id_is_conflict() {
        let (repo, _dir) = repo().await;
        repo.insert_item(&upload("dup", "One")).await.unwrap();

        let err = repo.insert_item(&upload("dup", "Two")).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
        assert_eq!(repo.get_revision_id().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_delete_item() {
        let (repo, _dir) = repo().await;
        repo.insert_item(&upload("gone", "Soon")).await.unwrap();

        assert_eq!(repo.delete_item("gone").await.unwrap(), 2);
        assert!(repo.get_item("gone").await.unwrap().is_none());
        assert!(matches!(
            repo.delete_item("gone").await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_batch_insert_bumps_revision_once() {
        let (repo, _dir) = repo().await;
        let revision = repo
            .insert_items(&[upload("1", "One"), upload("2", "Two")])
            .await
            .unwrap();

        assert_eq!(revision, 1);
        assert_eq!(repo.count_items().await.unwrap(), 2);
    }
}
