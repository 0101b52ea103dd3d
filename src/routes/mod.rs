pub mod jobs;
pub mod search;

use axum::routing::get;
use axum::{Json, Router};
use serde_json::{Value, json};

use crate::Ctx;

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Mount all API routes
pub fn mount() -> Router<Ctx> {
    Router::new()
        .route("/api/health", get(health))
        .merge(jobs::mount())
        .merge(search::mount())
}
