use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::Ctx;
use crate::error::{AppError, AppResult};
use crate::sync::JobLogger;
use crate::sync::store::JobType;

fn verify_api_key(ctx: &Ctx, headers: &HeaderMap) -> bool {
    let expected = ctx.config.auth.job_api_key.as_str();
    if expected.is_empty() {
        return false;
    }
    headers
        .get("x-api-key")
        .and_then(|value| value.to_str().ok())
        .is_some_and(|key| key == expected)
}

/// Shared trigger body: auth, run the sync kind, report the outcome
async fn run_trigger(ctx: Ctx, headers: HeaderMap, job_type: JobType) -> Response {
    if !verify_api_key(&ctx, &headers) {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": "Unauthorized" })),
        )
            .into_response();
    }

    let label = match job_type {
        JobType::TrendingSync => "Trending categories sync",
        JobType::PopularSync => "Popular categories sync",
        JobType::TopRatedSync => "Top rated categories sync",
        JobType::DramasSync => "Dramas categories sync",
        JobType::UpcomingSync => "Upcoming categories sync",
    };

    let result = match job_type {
        JobType::TrendingSync => ctx.sync.sync_trending().await,
        JobType::PopularSync => ctx.sync.sync_popular().await,
        JobType::TopRatedSync => ctx.sync.sync_top_rated().await,
        JobType::DramasSync => ctx.sync.sync_dramas().await,
        JobType::UpcomingSync => ctx.sync.sync_upcoming().await,
    };

    match result {
        Ok(outcome) if outcome.success => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "message": format!("{label} completed successfully"),
                "jobId": outcome.job_id,
            })),
        )
            .into_response(),
        Ok(outcome) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "success": false,
                "message": format!("{label} failed"),
                "error": outcome.error,
                "jobId": outcome.job_id,
            })),
        )
            .into_response(),
        // The orchestrator could not even produce a result
        Err(err) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "error": format!("{label} failed"),
                "details": err.to_string(),
            })),
        )
            .into_response(),
    }
}

async fn trigger_trending(State(ctx): State<Ctx>, headers: HeaderMap) -> Response {
    run_trigger(ctx, headers, JobType::TrendingSync).await
}

async fn trigger_popular(State(ctx): State<Ctx>, headers: HeaderMap) -> Response {
    run_trigger(ctx, headers, JobType::PopularSync).await
}

async fn trigger_top_rated(State(ctx): State<Ctx>, headers: HeaderMap) -> Response {
    run_trigger(ctx, headers, JobType::TopRatedSync).await
}

async fn trigger_dramas(State(ctx): State<Ctx>, headers: HeaderMap) -> Response {
    run_trigger(ctx, headers, JobType::DramasSync).await
}

async fn trigger_upcoming(State(ctx): State<Ctx>, headers: HeaderMap) -> Response {
    run_trigger(ctx, headers, JobType::UpcomingSync).await
}

#[derive(Debug, Deserialize)]
struct RecentQuery {
    limit: Option<i64>,
}

/// GET /api/jobs/recent?limit=50
async fn recent_jobs(
    State(ctx): State<Ctx>,
    Query(query): Query<RecentQuery>,
) -> AppResult<impl IntoResponse> {
    let limit = query.limit.unwrap_or(50).clamp(1, 200);
    let jobs = JobLogger::recent_jobs(ctx.store.as_ref(), limit).await?;
    Ok(Json(jobs))
}

/// GET /api/jobs/running
async fn running_jobs(State(ctx): State<Ctx>) -> AppResult<impl IntoResponse> {
    let jobs = JobLogger::running_jobs(ctx.store.as_ref()).await?;
    Ok(Json(jobs))
}

/// GET /api/jobs/{id} — job with its last 10 log lines
async fn job_status(
    State(ctx): State<Ctx>,
    Path(id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    let status = JobLogger::job_status(ctx.store.as_ref(), id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Job not found: {id}")))?;
    Ok(Json(status))
}

/// Mount job trigger and status routes
pub fn mount() -> Router<Ctx> {
    Router::new()
        .route("/api/jobs/trending", post(trigger_trending))
        .route("/api/jobs/popular", post(trigger_popular))
        .route("/api/jobs/top-rated", post(trigger_top_rated))
        .route("/api/jobs/dramas", post(trigger_dramas))
        .route("/api/jobs/upcoming", post(trigger_upcoming))
        .route("/api/jobs/recent", get(recent_jobs))
        .route("/api/jobs/running", get(running_jobs))
        .route("/api/jobs/{id}", get(job_status))
}
