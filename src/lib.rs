pub mod config;
pub mod db;
pub mod error;
pub mod routes;
pub mod sync;

use std::sync::Arc;

use axum::Router;
use sqlx::PgPool;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::config::AppConfig;
use crate::sync::store::{PgStore, SyncStore};
use crate::sync::{CategorySyncService, Providers};

/// Shared application state
#[derive(Clone)]
pub struct Ctx {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn SyncStore>,
    pub providers: Arc<Providers>,
    pub sync: Arc<CategorySyncService>,
}

impl Ctx {
    #[must_use]
    pub fn new(config: AppConfig, pool: PgPool) -> Self {
        let config = Arc::new(config);
        let store: Arc<dyn SyncStore> = Arc::new(PgStore::new(pool));
        let providers = Arc::new(Providers::new(
            &config.providers.tmdb_bearer_token,
            config.sync.retry.clone(),
        ));
        let sync = Arc::new(CategorySyncService::new(
            providers.clone(),
            store.clone(),
            config.sync.clone(),
        ));

        Self {
            config,
            store,
            providers,
            sync,
        }
    }
}

/// Build the application router
pub fn router(ctx: Ctx) -> Router {
    routes::mount()
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(ctx)
}
