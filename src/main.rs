//! File Library Backend
//!
//! REST backend for a catalog of downloadable files and chat bots, with SQLite
//! persistence and an in-memory query engine for search, filtering, and sorting.

mod api;
mod auth;
mod config;
mod db;
mod errors;
mod models;
mod query;
mod store;

use std::sync::Arc;

use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};
use tokio::sync::Mutex;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use config::Config;
use db::Repository;
use errors::AppError;
use store::ItemStore;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<Repository>,
    pub store: Arc<ItemStore>,
    pub config: Arc<Config>,
    /// Held across a database write and the matching store update so the
    /// store keeps the same order as the `items` table.
    pub write_order: Arc<Mutex<()>>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize logging
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting File Library Backend");
    tracing::info!("Database path: {:?}", config.db_path);
    tracing::info!("Bind address: {}", config.bind_addr);

    if config.admin_key.is_none() {
        tracing::warn!("No admin key configured (FILELIB_ADMIN_KEY). Uploads and deletes are open!");
    }

    let state = bootstrap(config.clone()).await?;
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Open the database, import the seed if configured, and load the item store.
pub async fn bootstrap(config: Config) -> Result<AppState, AppError> {
    let pool = db::init_database(&config.db_path).await?;
    let repo = Arc::new(Repository::new(pool));

    if let Some(seed_path) = &config.seed_path {
        db::import_seed(&repo, seed_path).await?;
    }

    tracing::info!("Loading item store...");
    let store = Arc::new(ItemStore::new());
    let items = repo.list_items().await?;
    let count = items.len();
    store.replace_all(items).await?;
    tracing::info!("Item store loaded with {} items", count);

    Ok(AppState {
        repo,
        store,
        config: Arc::new(config),
        write_order: Arc::new(Mutex::new(())),
    })
}

/// Create the application router with all routes.
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Clone the key for the admin layer
    let admin_key = state.config.admin_key.clone();

    // Read-only catalog routes
    let public_routes = Router::new()
        .route("/items", get(api::list_items))
        .route("/items/{id}", get(api::get_item))
        .route("/categories", get(api::list_categories))
        .route("/overview", get(api::get_overview))
        .route("/stats", get(api::get_stats));

    // Mutations require the admin key
    let admin_routes = Router::new()
        .route("/items", post(api::create_item))
        .route("/items/{id}", delete(api::delete_item))
        .layer(middleware::from_fn(move |req, next| {
            auth::admin_key_layer(admin_key.clone(), req, next)
        }));

    // Health check (no auth required)
    let health_routes = Router::new().route("/health", get(health_check));

    Router::new()
        .nest("/api", public_routes.merge(admin_routes))
        .merge(health_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}
