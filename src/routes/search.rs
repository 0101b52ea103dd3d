use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use crate::Ctx;
use crate::error::{AppError, AppResult};
use crate::sync::NormalizedMedia;
use crate::sync::provider::jikan::api_types::AnimeSearchParams;
use crate::sync::provider::mangadex::api_types::MangaSearchParams;
use crate::sync::provider::tmdb::api_types::{MovieSearchParams, TvSearchParams};

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    /// Search query string
    pub q: String,
    /// movie | tv | anime | manga (default: movie)
    #[serde(rename = "type")]
    pub media_type: Option<String>,
    pub page: Option<i32>,
    pub year: Option<i32>,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub items: Vec<NormalizedMedia>,
    pub total: usize,
}

/// GET /api/search?q=...&type=...&page=...
///
/// Thin passthrough over the provider clients; nothing is persisted.
async fn search(
    State(ctx): State<Ctx>,
    Query(query): Query<SearchQuery>,
) -> AppResult<impl IntoResponse> {
    if query.q.trim().is_empty() {
        return Err(AppError::InvalidInput("query must not be empty".to_string()));
    }

    let media_type = query.media_type.as_deref().unwrap_or("movie");
    let page = query.page.unwrap_or(1).max(1);

    let items = match media_type {
        "movie" => {
            let params = MovieSearchParams {
                query: Some(query.q.clone()),
                page: Some(page),
                primary_release_year: query.year,
                ..MovieSearchParams::default()
            };
            ctx.providers.tmdb.search_movies(&params).await?.items
        }
        "tv" => {
            let params = TvSearchParams {
                query: Some(query.q.clone()),
                page: Some(page),
                first_air_date_year: query.year,
                ..TvSearchParams::default()
            };
            ctx.providers.tmdb.search_tv(&params).await?.items
        }
        "anime" => {
            let params = AnimeSearchParams {
                q: Some(query.q.clone()),
                page: Some(page),
                limit: Some(25),
                sfw: Some(true),
                ..AnimeSearchParams::default()
            };
            ctx.providers.jikan.search_anime(&params).await?.items
        }
        "manga" => {
            let params = MangaSearchParams {
                title: Some(query.q.clone()),
                limit: Some(20),
                offset: Some((page - 1).max(0) * 20),
                year: query.year,
                content_rating: vec!["safe".to_string(), "suggestive".to_string()],
                includes: vec!["cover_art".to_string(), "tag".to_string()],
                has_available_chapters: Some(true),
                ..MangaSearchParams::default()
            };
            ctx.providers.mangadex.search_manga(&params).await?.items
        }
        other => {
            return Err(AppError::InvalidInput(format!(
                "unsupported media type: {other}"
            )));
        }
    };

    let total = items.len();
    Ok(Json(SearchResponse { items, total }))
}

/// Mount search routes
pub fn mount() -> Router<Ctx> {
    Router::new().route("/api/search", get(search))
}
