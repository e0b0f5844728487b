//! Item API endpoints.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::{error, parse_kind, success, ApiResult};
use crate::errors::AppError;
use crate::models::{CatalogItem, CreateItemRequest};
use crate::query::{CatalogQuery, SortDirection, SortKey};
use crate::AppState;

/// List query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct ListItemsParams {
    /// Free-text search term.
    #[serde(default)]
    pub q: String,
    /// Category label; empty or `all` disables the filter.
    #[serde(default)]
    pub category: String,
    /// Sort key (default: rating).
    pub sort: Option<String>,
    /// Sort direction (default: desc).
    pub dir: Option<String>,
    /// Restrict to `file` or `bot`.
    pub kind: Option<String>,
}

impl ListItemsParams {
    /// Validate into a query. Absent sort parameters take the listing defaults;
    /// present but unrecognized ones are rejected.
    pub fn into_query(self) -> Result<CatalogQuery, AppError> {
        let defaults = CatalogQuery::default();
        let sort_key = match self.sort.as_deref() {
            Some(raw) => SortKey::parse(raw)?,
            None => defaults.sort_key,
        };
        let direction = match self.dir.as_deref() {
            Some(raw) => SortDirection::parse(raw)?,
            None => defaults.direction,
        };

        let kind = parse_kind(self.kind.as_deref())?;

        Ok(CatalogQuery {
            search_term: self.q,
            category: self.category,
            sort_key,
            direction,
            ..defaults
        }
        .with_kind(kind))
    }
}

/// Filtered and ordered listing.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemListResponse {
    pub items: Vec<CatalogItem>,
    pub total: usize,
}

/// GET /api/items - Search, filter, and sort the catalog.
pub async fn list_items(
    State(state): State<AppState>,
    Query(params): Query<ListItemsParams>,
) -> ApiResult<ItemListResponse> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    let query = match params.into_query() {
        Ok(q) => q,
        Err(e) => return error(e, revision_id),
    };

    let items = state.store.query(&query).await;
    let total = items.len();

    success(ItemListResponse { items, total }, revision_id)
}

/// GET /api/items/:id - Get a single item.
pub async fn get_item(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<CatalogItem> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.store.get(&id).await {
        Some(item) => success(item, revision_id),
        None => error(
            AppError::NotFound(format!("Item {} not found", id)),
            revision_id,
        ),
    }
}

/// POST /api/items - Upload a new item.
pub async fn create_item(
    State(state): State<AppState>,
    Json(request): Json<CreateItemRequest>,
) -> ApiResult<CatalogItem> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    let item = match request.into_item(uuid::Uuid::new_v4().to_string(), Utc::now()) {
        Ok(item) => item,
        Err(e) => return error(e, revision_id),
    };

    if !state.config.submit_delay.is_zero() {
        tokio::time::sleep(state.config.submit_delay).await;
    }

    let _write_guard = state.write_order.lock().await;

    match state.repo.insert_item(&item).await {
        Ok(new_revision) => {
            if let Err(e) = state.store.add(item.clone()).await {
                tracing::warn!("Failed to add item {} to store: {}", item.id, e);
            }
            tracing::info!(
                item_id = %item.id,
                kind = item.kind().as_str(),
                "Item uploaded"
            );
            success(item, new_revision)
        }
        Err(e) => error(e, revision_id),
    }
}

/// DELETE /api/items/:id - Delete an item.
pub async fn delete_item(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<()> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);
    let _write_guard = state.write_order.lock().await;

    match state.repo.delete_item(&id).await {
        Ok(new_revision) => {
            if let Err(e) = state.store.remove_by_id(&id).await {
                tracing::warn!("Failed to remove item {} from store: {}", id, e);
            }
            tracing::info!(item_id = %id, "Item deleted");
            success((), new_revision)
        }
        Err(e) => error(e, revision_id),
    }
}
