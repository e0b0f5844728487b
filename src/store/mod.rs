//! In-memory item store.
//!
//! Holds the catalog in insertion order for the query engine. SQLite remains the
//! source of truth; the store is rebuilt from it at startup and kept in step on
//! every write.

use std::collections::HashSet;

use tokio::sync::RwLock;

use crate::errors::AppError;
use crate::models::CatalogItem;
use crate::query::{self, CatalogQuery};

#[derive(Debug, Default)]
pub struct ItemStore {
    items: RwLock<Vec<CatalogItem>>,
}

impl ItemStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every item in insertion order.
    pub async fn list(&self) -> Vec<CatalogItem> {
        self.items.read().await.clone()
    }

    pub async fn get(&self, id: &str) -> Option<CatalogItem> {
        self.items.read().await.iter().find(|i| i.id == id).cloned()
    }

    /// Append an item. Fails if the id is already present.
    pub async fn add(&self, item: CatalogItem) -> Result<(), AppError> {
        let mut items = self.items.write().await;
        if items.iter().any(|i| i.id == item.id) {
            return Err(AppError::Conflict(format!("Item {} already exists", item.id)));
        }
        items.push(item);
        Ok(())
    }

    /// Remove and return the item with `id`.
    pub async fn remove_by_id(&self, id: &str) -> Result<CatalogItem, AppError> {
        let mut items = self.items.write().await;
        let position = items
            .iter()
            .position(|i| i.id == id)
            .ok_or_else(|| AppError::NotFound(format!("Item {} not found", id)))?;
        Ok(items.remove(position))
    }

    /// Replace the whole collection. Duplicate ids leave the store untouched.
    pub async fn replace_all(&self, replacement: Vec<CatalogItem>) -> Result<(), AppError> {
        let mut seen = HashSet::with_capacity(replacement.len());
        for item in &replacement {
            if !seen.insert(item.id.as_str()) {
                return Err(AppError::Conflict(format!(
                    "Duplicate item id {} in replacement",
                    item.id
                )));
            }
        }

        *self.items.write().await = replacement;
        Ok(())
    }

    /// Evaluate `query` against the current contents.
    pub async fn query(&self, query: &CatalogQuery) -> Vec<CatalogItem> {
        let items = self.items.read().await;
        query::run(&items, query)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ItemDetails;

    fn item(id: &str, name: &str) -> CatalogItem {
        CatalogItem {
            id: id.to_string(),
            name: name.to_string(),
            short_description: String::new(),
            description: String::new(),
            category: "Utility".to_string(),
            tags: vec![],
            image: None,
            popularity: 0,
            rating: 0.0,
            review_count: 0,
            created_at: None,
            updated_at: None,
            details: ItemDetails::Bot {
                prefix: "!".to_string(),
                invite_url: None,
                support_server: None,
                guild_count: 0,
                featured: false,
            },
        }
    }

    #[tokio::test]
    async fn test_add_preserves_insertion_order() {
        let store = ItemStore::new();
        store.add(item("b", "Second")).await.unwrap();
        store.add(item("a", "First")).await.unwrap();

        let ids: Vec<_> = store.list().await.into_iter().map(|i| i.id).collect();
        assert_eq!(ids, vec!["b", "a"]);
    }

    #[tokio::test]
    async fn test_add_rejects_duplicate_id() {
        let store = ItemStore::new();
        store.add(item("a", "One")).await.unwrap();
        let err = store.add(item("a", "Two")).await.unwrap_err();

        assert!(matches!(err, AppError::Conflict(_)));
        assert_eq!(store.list().await.len(), 1);
    }

    #[tokio::test]
    async fn test_remove_by_id() {
        let store = ItemStore::new();
        store.add(item("a", "One")).await.unwrap();
        store.add(item("b", "Two")).await.unwrap();

        let removed = store.remove_by_id("a").await.unwrap();
        assert_eq!(removed.name, "One");
        assert!(store.get("a").await.is_none());
        assert!(matches!(
            store.remove_by_id("a").await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_replace_all_rejects_duplicates_without_mutating() {
        let store = ItemStore::new();
        store.add(item("keep", "Kept")).await.unwrap();

        let err = store
            .replace_all(vec![item("x", "X"), item("x", "Y")])
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
        assert_eq!(store.list().await[0].id, "keep");

        store
            .replace_all(vec![item("x", "X"), item("y", "Y")])
            .await
            .unwrap();
        assert_eq!(store.list().await.len(), 2);
        assert!(store.get("keep").await.is_none());
    }

    #[tokio::test]
    async fn test_query_reads_current_contents() {
        let store = ItemStore::new();
        store.add(item("1", "Zebra")).await.unwrap();
        store.add(item("2", "Apple")).await.unwrap();

        let q = CatalogQuery::new("", "", "name", "asc").unwrap();
        let names: Vec<_> = store.query(&q).await.into_iter().map(|i| i.name).collect();
        assert_eq!(names, vec!["Apple", "Zebra"]);
    }
}
