//! Sync pipeline tests

#[cfg(test)]
mod support {
    use axum::Router;

    /// Serve a router on an ephemeral loopback port, returning its base URL
    pub async fn spawn(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }
}

#[cfg(test)]
mod types_tests {
    use crate::sync::types::{MediaKind, Provider, normalize_string, unique_strings};

    #[test]
    fn test_unique_strings_dedup_and_trim() {
        let values = vec!["  Action ", "Action", "", "Drama", "  ", "Drama"];
        let unique = unique_strings(values);

        assert_eq!(unique, vec!["Action".to_string(), "Drama".to_string()]);
    }

    #[test]
    fn test_unique_strings_preserves_order() {
        let unique = unique_strings(["Zebra", "Apple", "Zebra", "Mango"]);
        assert_eq!(unique, vec!["Zebra", "Apple", "Mango"]);
    }

    #[test]
    fn test_normalize_string() {
        assert_eq!(normalize_string(Some("  x  ")), Some("x".to_string()));
        assert_eq!(normalize_string(Some("   ")), None);
        assert_eq!(normalize_string(None), None);
    }

    #[test]
    fn test_provider_parsing() {
        assert_eq!("TMDB".parse::<Provider>().unwrap(), Provider::Tmdb);
        assert_eq!("jikan".parse::<Provider>().unwrap(), Provider::Jikan);
        assert_eq!("MANGADEX".parse::<Provider>().unwrap(), Provider::MangaDex);
        // Historical naming variant
        assert_eq!("MANGADX".parse::<Provider>().unwrap(), Provider::MangaDex);
        assert!("NETFLIX".parse::<Provider>().is_err());
    }

    #[test]
    fn test_media_kind_parsing() {
        assert_eq!("MOVIE".parse::<MediaKind>().unwrap(), MediaKind::Movie);
        assert_eq!("tv".parse::<MediaKind>().unwrap(), MediaKind::Tv);
        assert_eq!(MediaKind::Anime.as_str(), "ANIME");
        assert!("BOOK".parse::<MediaKind>().is_err());
    }
}

#[cfg(test)]
mod season_tests {
    use crate::sync::provider::jikan::{current_season, next_season};

    #[test]
    fn test_current_season_boundaries() {
        assert_eq!(current_season(2), "spring");
        assert_eq!(current_season(4), "spring");
        assert_eq!(current_season(5), "summer");
        assert_eq!(current_season(7), "summer");
        assert_eq!(current_season(8), "fall");
        assert_eq!(current_season(10), "fall");
        assert_eq!(current_season(11), "winter");
        assert_eq!(current_season(12), "winter");
        assert_eq!(current_season(1), "winter");
    }

    #[test]
    fn test_next_season_rolls_one_quarter() {
        assert_eq!(next_season(2024, 3), (2024, "summer"));
        assert_eq!(next_season(2024, 6), (2024, "fall"));
        assert_eq!(next_season(2024, 9), (2024, "winter"));
    }

    #[test]
    fn test_next_season_wraps_year_in_winter() {
        assert_eq!(next_season(2024, 12), (2025, "spring"));
        assert_eq!(next_season(2024, 11), (2025, "spring"));
    }
}

#[cfg(test)]
mod http_tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Instant;

    use axum::http::StatusCode;
    use axum::response::IntoResponse;
    use axum::routing::get;
    use axum::{Json, Router};
    use serde_json::{Value, json};

    use super::support::spawn;
    use crate::sync::SyncError;
    use crate::sync::config::RetryOptions;
    use crate::sync::http::HttpClient;

    fn fast_retry() -> RetryOptions {
        RetryOptions {
            attempts: 2,
            backoff_ms: 10,
            ..RetryOptions::default()
        }
    }

    /// Returns `status` for the first `failures` hits, then 200 JSON
    fn flaky_app(failures: u32, status: StatusCode, hits: Arc<AtomicU32>) -> Router {
        Router::new().route(
            "/data",
            get(move || {
                let hits = hits.clone();
                async move {
                    let n = hits.fetch_add(1, Ordering::SeqCst);
                    if n < failures {
                        (status, "unavailable").into_response()
                    } else {
                        Json(json!({ "ok": true })).into_response()
                    }
                }
            }),
        )
    }

    #[tokio::test]
    async fn test_retry_recovers_after_transient_statuses() {
        let hits = Arc::new(AtomicU32::new(0));
        let base = spawn(flaky_app(2, StatusCode::SERVICE_UNAVAILABLE, hits.clone())).await;
        let client = HttpClient::with_options(base, Default::default(), fast_retry());

        let started = Instant::now();
        let body: Value = client.get("/data").await.unwrap();

        assert_eq!(body["ok"], json!(true));
        assert_eq!(hits.load(Ordering::SeqCst), 3);
        // Two backoffs: 10ms * 2^0 then 10ms * 2^1
        assert!(started.elapsed().as_millis() >= 30);
    }

    #[tokio::test]
    async fn test_retry_budget_exhausted_surfaces_status() {
        let hits = Arc::new(AtomicU32::new(0));
        let base = spawn(flaky_app(10, StatusCode::INTERNAL_SERVER_ERROR, hits.clone())).await;
        let client = HttpClient::with_options(base, Default::default(), fast_retry());

        let result = client.get::<Value>("/data").await;

        assert!(matches!(result, Err(SyncError::Api { status: 500, .. })));
        // One initial attempt plus two retries
        assert_eq!(hits.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_non_retryable_status_fails_fast() {
        let hits = Arc::new(AtomicU32::new(0));
        let base = spawn(flaky_app(10, StatusCode::NOT_FOUND, hits.clone())).await;
        let client = HttpClient::with_options(base, Default::default(), fast_retry());

        let result = client.get::<Value>("/data").await;

        assert!(matches!(result, Err(SyncError::Api { status: 404, .. })));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_connection_failure_is_retried_then_surfaced() {
        // Nothing listens here; connect errors are transient
        let client = HttpClient::with_options(
            "http://127.0.0.1:9".to_string(),
            Default::default(),
            RetryOptions {
                attempts: 1,
                backoff_ms: 1,
                ..RetryOptions::default()
            },
        );

        let result = client.get::<Value>("/data").await;
        assert!(matches!(result, Err(SyncError::Network(_))));
    }
}

#[cfg(test)]
mod rate_limit_tests {
    use std::time::Duration;

    use tokio::time::Instant;

    use crate::sync::config::RateLimits;
    use crate::sync::rate_limit::RateLimiter;
    use crate::sync::types::Provider;

    #[tokio::test(start_paused = true)]
    async fn test_over_budget_call_waits_out_the_window() {
        // Jikan budget: 2 requests per second
        let limiter = RateLimiter::new(RateLimits::default());
        let started = Instant::now();

        limiter.check(Provider::Jikan).await;
        limiter.check(Provider::Jikan).await;
        assert_eq!(started.elapsed(), Duration::ZERO);

        // Third call sleeps out the remainder of the window
        limiter.check(Provider::Jikan).await;
        assert!(started.elapsed() >= Duration::from_millis(1000));

        // The window reset once; the next call goes straight through
        let after_reset = Instant::now();
        limiter.check(Provider::Jikan).await;
        assert_eq!(after_reset.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_budgets_are_independent_per_provider() {
        let limiter = RateLimiter::new(RateLimits::default());

        limiter.check(Provider::Jikan).await;
        limiter.check(Provider::Jikan).await;

        // Jikan is exhausted but TMDB is not throttled by it
        let started = Instant::now();
        limiter.check(Provider::Tmdb).await;
        assert_eq!(started.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_window_resets_instead_of_sleeping() {
        let limiter = RateLimiter::new(RateLimits::default());

        limiter.check(Provider::MangaDex).await;
        limiter.check(Provider::MangaDex).await;

        // Let the window lapse; the next call must not sleep
        tokio::time::sleep(Duration::from_millis(1500)).await;
        let started = Instant::now();
        limiter.check(Provider::MangaDex).await;
        assert_eq!(started.elapsed(), Duration::ZERO);
    }
}

#[cfg(test)]
mod tmdb_tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    use axum::routing::get;
    use axum::{Json, Router};
    use serde_json::json;

    use super::support::spawn;
    use crate::sync::config::RetryOptions;
    use crate::sync::provider::TmdbClient;
    use crate::sync::provider::tmdb::release_year;
    use crate::sync::types::{MediaKind, Provider};

    #[test]
    fn test_release_year() {
        assert_eq!(release_year(Some("1999-03-31")), Some(1999));
        assert_eq!(release_year(Some("2024")), Some(2024));
        assert_eq!(release_year(Some("")), None);
        assert_eq!(release_year(None), None);
    }

    fn tmdb_app(genre_hits: Arc<AtomicU32>) -> Router {
        let movie_hits = genre_hits.clone();
        let tv_hits = genre_hits;

        Router::new()
            .route(
                "/genre/movie/list",
                get(move || {
                    let hits = movie_hits.clone();
                    async move {
                        hits.fetch_add(1, Ordering::SeqCst);
                        Json(json!({ "genres": [{ "id": 28, "name": "Action" }] }))
                    }
                }),
            )
            .route(
                "/genre/tv/list",
                get(move || {
                    let hits = tv_hits.clone();
                    async move {
                        hits.fetch_add(1, Ordering::SeqCst);
                        Json(json!({ "genres": [{ "id": 18, "name": "Drama" }] }))
                    }
                }),
            )
            .route(
                "/trending/movie/week",
                get(|| async {
                    Json(json!({
                        "page": 1,
                        "total_pages": 1,
                        "total_results": 2,
                        "results": [
                            {
                                "id": 603,
                                "title": "The Matrix",
                                "original_title": "The Matrix",
                                "overview": "A hacker learns the truth.",
                                "adult": false,
                                "poster_path": "/matrix.jpg",
                                "backdrop_path": null,
                                "genre_ids": [28],
                                "release_date": "1999-03-31",
                                "popularity": 91.5,
                                "vote_average": 8.7,
                                "vote_count": 25000
                            },
                            {
                                "id": 604,
                                "title": "Obscure Film",
                                "original_title": "映画",
                                "overview": "",
                                "adult": false,
                                "poster_path": null,
                                "backdrop_path": null,
                                "genre_ids": [99],
                                "release_date": "",
                                "popularity": 1.0,
                                "vote_average": 5.0,
                                "vote_count": 3
                            }
                        ]
                    }))
                }),
            )
    }

    #[tokio::test]
    async fn test_trending_movies_are_normalized() {
        let genre_hits = Arc::new(AtomicU32::new(0));
        let base = spawn(tmdb_app(genre_hits)).await;
        let client = TmdbClient::with_base_url(base, "test-token", RetryOptions::default());

        let movies = client.trending_movies(1).await.unwrap();

        assert_eq!(movies.len(), 2);
        let matrix = &movies[0];
        assert_eq!(matrix.provider_id, "603");
        assert_eq!(matrix.provider, Provider::Tmdb);
        assert_eq!(matrix.kind, MediaKind::Movie);
        assert_eq!(matrix.title, "The Matrix");
        // Identical original title adds no alternate
        assert!(matrix.alt_titles.is_empty());
        assert_eq!(matrix.genres, vec!["Action".to_string()]);
        assert_eq!(matrix.year, Some(1999));
        let cover = matrix.cover_image.as_deref().unwrap();
        assert!(cover.ends_with("/matrix.jpg"));
        // Missing backdrop falls back to the cover
        assert_eq!(matrix.backdrop_image.as_deref(), Some(cover));

        let obscure = &movies[1];
        assert_eq!(obscure.alt_titles, vec!["映画".to_string()]);
        assert_eq!(obscure.genres, vec!["Unknown Genre 99".to_string()]);
        assert_eq!(obscure.year, None);
        assert_eq!(obscure.synopsis, None);
    }

    #[tokio::test]
    async fn test_genre_map_is_fetched_once() {
        let genre_hits = Arc::new(AtomicU32::new(0));
        let base = spawn(tmdb_app(genre_hits.clone())).await;
        let client = TmdbClient::with_base_url(base, "test-token", RetryOptions::default());

        client.trending_movies(1).await.unwrap();
        client.trending_movies(1).await.unwrap();

        // Movie and TV genre lists fetched together, exactly once
        assert_eq!(genre_hits.load(Ordering::SeqCst), 2);
    }
}

#[cfg(test)]
mod jikan_tests {
    use serde_json::json;

    use crate::sync::provider::jikan::api_types::JikanAnime;
    use crate::sync::provider::jikan::normalize_anime;
    use crate::sync::types::{MediaKind, Provider};

    fn anime_fixture(rating: &str) -> JikanAnime {
        serde_json::from_value(json!({
            "mal_id": 52991,
            "title": "Sousou no Frieren",
            "title_english": "Frieren: Beyond Journey's End",
            "title_japanese": "葬送のフリーレン",
            "title_synonyms": ["Frieren at the Funeral"],
            "titles": [
                { "type": "Default", "title": "Sousou no Frieren" },
                { "type": "English", "title": "Frieren: Beyond Journey's End" }
            ],
            "synopsis": "An elf mage outlives her party.",
            "images": {
                "jpg": { "image_url": "https://cdn.example/s.jpg", "large_image_url": "https://cdn.example/l.jpg" },
                "webp": { "image_url": null, "large_image_url": null }
            },
            "type": "TV",
            "episodes": 28,
            "genres": [{ "mal_id": 2, "name": "Adventure" }, { "mal_id": 10, "name": "Fantasy" }],
            "themes": [{ "mal_id": 50, "name": "Adult Cast" }],
            "demographics": [{ "mal_id": 27, "name": "Shounen" }],
            "studios": [{ "mal_id": 11, "name": "Madhouse" }],
            "score": 9.3,
            "year": 2023,
            "status": "Finished Airing",
            "rating": rating,
            "duration": "24 min per ep",
            "season": "fall",
            "airing": false,
            "aired": { "from": "2023-09-29T00:00:00+00:00", "to": "2024-03-22T00:00:00+00:00" },
            "popularity": 130.0,
            "members": 900000
        }))
        .unwrap()
    }

    #[test]
    fn test_english_title_is_preferred() {
        let item = normalize_anime(anime_fixture("PG-13 - Teens 13 or older"));

        assert_eq!(item.title, "Frieren: Beyond Journey's End");
        assert_eq!(item.provider, Provider::Jikan);
        assert_eq!(item.kind, MediaKind::Anime);
        assert_eq!(item.provider_id, "52991");
        // Japanese title, synonyms and the default title survive as
        // alternates; the chosen English title does not repeat
        assert!(item.alt_titles.contains(&"葬送のフリーレン".to_string()));
        assert!(item.alt_titles.contains(&"Frieren at the Funeral".to_string()));
        assert!(item.alt_titles.contains(&"Sousou no Frieren".to_string()));
        assert!(!item.alt_titles.contains(&item.title));
    }

    #[test]
    fn test_themes_and_demographics_become_tags() {
        let item = normalize_anime(anime_fixture("PG-13 - Teens 13 or older"));

        assert_eq!(item.genres, vec!["Adventure".to_string(), "Fantasy".to_string()]);
        assert_eq!(item.tags, vec!["Adult Cast".to_string(), "Shounen".to_string()]);
    }

    #[test]
    fn test_adult_flag_from_rating() {
        assert!(!normalize_anime(anime_fixture("PG-13 - Teens 13 or older")).adult);
        assert!(normalize_anime(anime_fixture("R+ - Mild Nudity")).adult);
        assert!(normalize_anime(anime_fixture("Rx - Hentai")).adult);
    }

    #[test]
    fn test_anime_details_are_carried() {
        let item = normalize_anime(anime_fixture("PG-13 - Teens 13 or older"));
        let details = item.anime.expect("anime details");

        assert_eq!(details.subtype.as_deref(), Some("TV"));
        assert_eq!(details.episodes, Some(28));
        assert_eq!(details.season.as_deref(), Some("fall"));
        assert_eq!(details.studios, vec!["Madhouse".to_string()]);
        assert!(!details.airing);
        assert!(details.airing_from.is_some());

        // No backdrop on Jikan; the cover doubles as one
        assert_eq!(item.backdrop_image, item.cover_image);
        assert_eq!(item.cover_image.as_deref(), Some("https://cdn.example/l.jpg"));
    }
}

#[cfg(test)]
mod mangadex_tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    use axum::extract::{Path, RawQuery};
    use axum::routing::get;
    use axum::{Json, Router};
    use serde_json::{Value, json};

    use super::support::spawn;
    use crate::sync::config::RetryOptions;
    use crate::sync::provider::MangaDexClient;
    use crate::sync::provider::mangadex::api_types::{MangaDexManga, MangaSearchParams};
    use crate::sync::provider::mangadex::{normalize_manga, normalize_score};
    use crate::sync::types::{MediaKind, Provider};

    #[test]
    fn test_score_rounds_to_two_decimals() {
        assert_eq!(normalize_score(7.6666), Some(7.67));
        assert_eq!(normalize_score(8.0), Some(8.0));
        assert_eq!(normalize_score(f64::NAN), None);
    }

    fn manga_fixture() -> Value {
        json!({
            "id": "a96676e5-8ae2-425e-b549-7f15dd34a6d8",
            "attributes": {
                "title": { "en": "Solo Ascent", "ja": "ソロ登攀" },
                "altTitles": [{ "ko": "솔로 등반" }, { "en": "Solo Ascent" }],
                "description": { "en": "A hunter climbs alone." },
                "lastVolume": "14",
                "lastChapter": "110",
                "publicationDemographic": "shounen",
                "status": "completed",
                "year": 2018,
                "contentRating": "safe",
                "tags": [
                    { "id": "t1", "attributes": { "name": { "en": "Action" }, "group": "genre" } },
                    { "id": "t2", "attributes": { "name": { "en": "Monsters" }, "group": "theme" } }
                ]
            },
            "relationships": [
                { "id": "c1", "type": "cover_art", "attributes": { "fileName": "cover.jpg" } },
                { "id": "p1", "type": "author" }
            ]
        })
    }

    #[test]
    fn test_manga_is_normalized() {
        let manga: MangaDexManga = serde_json::from_value(manga_fixture()).unwrap();
        let item = normalize_manga(manga, Some(7.67));

        assert_eq!(item.provider, Provider::MangaDex);
        assert_eq!(item.kind, MediaKind::Manga);
        assert_eq!(item.title, "Solo Ascent");
        // Localized variants become alternates; the main title never repeats
        assert_eq!(item.alt_titles, vec!["ソロ登攀".to_string(), "솔로 등반".to_string()]);
        assert_eq!(item.genres, vec!["Action".to_string()]);
        assert_eq!(item.tags, vec!["Monsters".to_string()]);
        assert_eq!(item.score, Some(7.67));
        assert_eq!(item.year, Some(2018));
        assert!(!item.adult);
        assert_eq!(
            item.cover_image.as_deref(),
            Some("https://uploads.mangadex.org/covers/a96676e5-8ae2-425e-b549-7f15dd34a6d8/cover.jpg.512.jpg")
        );

        let details = item.manga.expect("manga details");
        assert_eq!(details.last_chapter.as_deref(), Some("110"));
        assert_eq!(details.last_volume.as_deref(), Some("14"));
        assert_eq!(details.publication_demographic.as_deref(), Some("shounen"));
    }

    #[test]
    fn test_erotica_content_rating_marks_adult() {
        let mut fixture = manga_fixture();
        fixture["attributes"]["contentRating"] = json!("erotica");
        let manga: MangaDexManga = serde_json::from_value(fixture).unwrap();

        assert!(normalize_manga(manga, None).adult);
    }

    fn mangadex_app(list: Value, stats: Value, stats_hits: Arc<AtomicU32>) -> Router {
        let single_hits = stats_hits.clone();
        let batch_hits = stats_hits;
        let single_stats = stats.clone();

        Router::new()
            .route("/manga", get(move || {
                let list = list.clone();
                async move { Json(list) }
            }))
            .route(
                "/statistics/manga/{id}",
                get(move |Path(_id): Path<String>| {
                    let hits = single_hits.clone();
                    let stats = single_stats.clone();
                    async move {
                        hits.fetch_add(1, Ordering::SeqCst);
                        Json(stats)
                    }
                }),
            )
            .route(
                "/statistics/manga",
                get(move |RawQuery(_query): RawQuery| {
                    let hits = batch_hits.clone();
                    let stats = stats.clone();
                    async move {
                        hits.fetch_add(1, Ordering::SeqCst);
                        Json(stats)
                    }
                }),
            )
    }

    fn list_of(fixtures: Vec<Value>) -> Value {
        let total = fixtures.len();
        json!({ "data": fixtures, "limit": 20, "offset": 0, "total": total })
    }

    #[tokio::test]
    async fn test_statistics_are_cached_per_id() {
        let stats_hits = Arc::new(AtomicU32::new(0));
        let stats = json!({
            "statistics": {
                "a96676e5-8ae2-425e-b549-7f15dd34a6d8": { "rating": { "bayesian": 7.6666 } }
            }
        });
        let base = spawn(mangadex_app(
            list_of(vec![manga_fixture()]),
            stats,
            stats_hits.clone(),
        ))
        .await;
        let client = MangaDexClient::with_base_url(base, RetryOptions::default());

        let first = client.popular_manga(20, 0).await.unwrap();
        assert_eq!(first[0].score, Some(7.67));
        assert_eq!(stats_hits.load(Ordering::SeqCst), 1);

        // Second page hit resolves the score from the cache
        let second = client.popular_manga(20, 0).await.unwrap();
        assert_eq!(second[0].score, Some(7.67));
        assert_eq!(stats_hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_missing_rating_is_cached_as_unknown() {
        let stats_hits = Arc::new(AtomicU32::new(0));
        let base = spawn(mangadex_app(
            list_of(vec![manga_fixture()]),
            json!({ "statistics": {} }),
            stats_hits.clone(),
        ))
        .await;
        let client = MangaDexClient::with_base_url(base, RetryOptions::default());

        let first = client.popular_manga(20, 0).await.unwrap();
        assert_eq!(first[0].score, None);

        let second = client.popular_manga(20, 0).await.unwrap();
        assert_eq!(second[0].score, None);
        // The unknown result was cached, not refetched
        assert_eq!(stats_hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_statistics_lookup_batches_multiple_ids() {
        let stats_hits = Arc::new(AtomicU32::new(0));
        let mut second = manga_fixture();
        second["id"] = json!("b1111111-2222-3333-4444-555555555555");

        let stats = json!({
            "statistics": {
                "a96676e5-8ae2-425e-b549-7f15dd34a6d8": { "rating": { "bayesian": 7.5 } },
                "b1111111-2222-3333-4444-555555555555": { "rating": { "average": 6.333 } }
            }
        });
        let base = spawn(mangadex_app(
            list_of(vec![manga_fixture(), second]),
            stats,
            stats_hits.clone(),
        ))
        .await;
        let client = MangaDexClient::with_base_url(base, RetryOptions::default());

        let params = MangaSearchParams {
            limit: Some(20),
            offset: Some(0),
            ..MangaSearchParams::default()
        };
        let page = client.search_manga(&params).await.unwrap();

        // One batched statistics call covered both ids
        assert_eq!(stats_hits.load(Ordering::SeqCst), 1);
        assert_eq!(page.items[0].score, Some(7.5));
        // Average is the fallback when no bayesian rating exists
        assert_eq!(page.items[1].score, Some(6.33));
        assert!(!page.has_more);
    }
}
