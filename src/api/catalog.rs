//! Catalog-wide API endpoints: categories, home page overview, dashboard stats.

use axum::extract::{Query, State};
use serde::{Deserialize, Serialize};

use super::{error, parse_kind, success, ApiResult};
use crate::errors::AppError;
use crate::models::{category, CatalogItem, CatalogOverview, CatalogStats, ItemKind};
use crate::AppState;

/// Optional `kind` selector shared by the catalog endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct KindParams {
    pub kind: Option<String>,
}

/// Category labels for one kind, sentinel first.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryList {
    pub kind: ItemKind,
    pub all: &'static str,
    pub categories: Vec<&'static str>,
}

/// GET /api/categories?kind= - Category labels for a kind.
pub async fn list_categories(
    State(state): State<AppState>,
    Query(params): Query<KindParams>,
) -> ApiResult<CategoryList> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    let kind = match parse_kind(params.kind.as_deref()) {
        Ok(Some(kind)) => kind,
        Ok(None) => {
            return error(
                AppError::InvalidArgument("kind is required".to_string()),
                revision_id,
            )
        }
        Err(e) => return error(e, revision_id),
    };

    let mut categories = vec![category::ALL_CATEGORY];
    categories.extend_from_slice(category::categories_for(kind));

    success(
        CategoryList {
            kind,
            all: category::ALL_CATEGORY,
            categories,
        },
        revision_id,
    )
}

/// GET /api/overview?kind= - Featured and popular strips for the home page.
pub async fn get_overview(
    State(state): State<AppState>,
    Query(params): Query<KindParams>,
) -> ApiResult<CatalogOverview> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match items_of_kind(&state, params).await {
        Ok(items) => success(CatalogOverview::from_items(&items), revision_id),
        Err(e) => error(e, revision_id),
    }
}

/// GET /api/stats?kind= - Dashboard counters.
pub async fn get_stats(
    State(state): State<AppState>,
    Query(params): Query<KindParams>,
) -> ApiResult<CatalogStats> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match items_of_kind(&state, params).await {
        Ok(items) => success(CatalogStats::from_items(&items), revision_id),
        Err(e) => error(e, revision_id),
    }
}

async fn items_of_kind(state: &AppState, params: KindParams) -> Result<Vec<CatalogItem>, AppError> {
    let kind = parse_kind(params.kind.as_deref())?;
    let mut items = state.store.list().await;
    if let Some(kind) = kind {
        items.retain(|i| i.kind() == kind);
    }
    Ok(items)
}
