use chrono::{Datelike, Utc};

use super::api_types::{
    AnimeSearchParams, JikanAnime, JikanGenre, JikanGenreListResponse, JikanItemResponse,
    JikanListResponse,
};
use crate::sync::Result;
use crate::sync::config::RetryOptions;
use crate::sync::http::HttpClient;
use crate::sync::provider::{Paginated, push_param};
use crate::sync::types::{
    AnimeDetails, MediaKind, NormalizedMedia, Provider, normalize_string, unique_strings,
};

const JIKAN_BASE_URL: &str = "https://api.jikan.moe/v4";

/// Jikan (MyAnimeList) client; unauthenticated public REST
pub struct JikanClient {
    client: HttpClient,
}

impl JikanClient {
    #[must_use]
    pub fn new(retry: RetryOptions) -> Self {
        Self::with_base_url(JIKAN_BASE_URL, retry)
    }

    /// Base URL override used by tests against a local stand-in server
    #[must_use]
    pub fn with_base_url(base_url: impl Into<String>, retry: RetryOptions) -> Self {
        Self {
            client: HttpClient::with_options(
                base_url,
                reqwest::header::HeaderMap::new(),
                retry,
            ),
        }
    }

    /// Top anime, optionally restricted to one subtype
    pub async fn top_anime(
        &self,
        page: i32,
        subtype: Option<&str>,
        filter: Option<&str>,
    ) -> Result<Vec<NormalizedMedia>> {
        let mut query = Vec::new();
        push_param(&mut query, "page", Some(page.max(1)));
        push_param(&mut query, "type", subtype);
        push_param(&mut query, "filter", filter);

        let response: JikanListResponse = self.client.get_with_params("/top/anime", &query).await?;
        Ok(response.data.into_iter().map(normalize_anime).collect())
    }

    pub async fn top_anime_by_type(
        &self,
        subtype: &str,
        page: i32,
    ) -> Result<Vec<NormalizedMedia>> {
        self.top_anime(page, Some(subtype), None).await
    }

    /// Popular anime: popularity order ascending (lower rank = more popular)
    pub async fn popular_anime(&self, page: i32) -> Result<Vec<NormalizedMedia>> {
        let params = AnimeSearchParams {
            limit: Some(25),
            page: Some(page.max(1)),
            order_by: Some("popularity".to_string()),
            sort: Some("asc".to_string()),
            sfw: Some(true),
            ..AnimeSearchParams::default()
        };
        Ok(self.search_anime(&params).await?.items)
    }

    /// Trending anime: currently airing, most members first
    pub async fn trending_anime(&self, page: i32) -> Result<Vec<NormalizedMedia>> {
        let params = AnimeSearchParams {
            limit: Some(25),
            page: Some(page.max(1)),
            status: Some("airing".to_string()),
            order_by: Some("members".to_string()),
            sort: Some("desc".to_string()),
            sfw: Some(true),
            ..AnimeSearchParams::default()
        };
        Ok(self.search_anime(&params).await?.items)
    }

    pub async fn popular_anime_movies(&self, page: i32) -> Result<Vec<NormalizedMedia>> {
        let params = AnimeSearchParams {
            limit: Some(25),
            page: Some(page.max(1)),
            subtype: Some("movie".to_string()),
            order_by: Some("popularity".to_string()),
            sort: Some("asc".to_string()),
            sfw: Some(true),
            ..AnimeSearchParams::default()
        };
        Ok(self.search_anime(&params).await?.items)
    }

    pub async fn upcoming_anime(&self, page: i32) -> Result<Vec<NormalizedMedia>> {
        let params = AnimeSearchParams {
            limit: Some(25),
            page: Some(page.max(1)),
            status: Some("upcoming".to_string()),
            order_by: Some("members".to_string()),
            sort: Some("desc".to_string()),
            sfw: Some(true),
            ..AnimeSearchParams::default()
        };
        Ok(self.search_anime(&params).await?.items)
    }

    /// Seasonal anime; defaults to the current calendar season
    pub async fn seasonal_anime(
        &self,
        year: Option<i32>,
        season: Option<&str>,
        page: i32,
    ) -> Result<Vec<NormalizedMedia>> {
        let now = Utc::now();
        let year = year.unwrap_or_else(|| now.year());
        let season = season
            .map(str::to_string)
            .unwrap_or_else(|| current_season(now.month()).to_string());

        let mut query = Vec::new();
        push_param(&mut query, "page", Some(page.max(1)));

        let response: JikanListResponse = self
            .client
            .get_with_params(&format!("/seasons/{year}/{season}"), &query)
            .await?;
        Ok(response.data.into_iter().map(normalize_anime).collect())
    }

    /// Next season's anime, rolling one quarter forward
    pub async fn next_season_anime(&self, page: i32) -> Result<Vec<NormalizedMedia>> {
        let now = Utc::now();
        let (year, season) = next_season(now.year(), now.month());
        self.seasonal_anime(Some(year), Some(season), page).await
    }

    pub async fn anime_by_genre(&self, genre_id: i64, page: i32) -> Result<Vec<NormalizedMedia>> {
        let params = AnimeSearchParams {
            limit: Some(25),
            page: Some(page.max(1)),
            genres: Some(genre_id.to_string()),
            order_by: Some("score".to_string()),
            sort: Some("desc".to_string()),
            sfw: Some(true),
            ..AnimeSearchParams::default()
        };
        Ok(self.search_anime(&params).await?.items)
    }

    pub async fn random_anime(&self) -> Result<NormalizedMedia> {
        let response: JikanItemResponse = self.client.get("/random/anime").await?;
        Ok(normalize_anime(response.data))
    }

    pub async fn anime_by_id(&self, id: i64) -> Result<NormalizedMedia> {
        let response: JikanItemResponse = self.client.get(&format!("/anime/{id}")).await?;
        Ok(normalize_anime(response.data))
    }

    /// Advanced search with pagination
    pub async fn search_anime(
        &self,
        params: &AnimeSearchParams,
    ) -> Result<Paginated<NormalizedMedia>> {
        let query = build_query(params);
        let response: JikanListResponse = self.client.get_with_params("/anime", &query).await?;

        let (page, total_pages, total_results) = response.pagination.map_or((1, 1, 0), |p| {
            let total_pages = if p.items.per_page > 0 {
                ((p.items.total as f64) / f64::from(p.items.per_page)).ceil() as i32
            } else {
                1
            };
            (p.current_page, total_pages, p.items.total)
        });

        Ok(Paginated {
            items: response.data.into_iter().map(normalize_anime).collect(),
            page,
            total_pages,
            total_results,
        })
    }

    pub async fn genres(&self) -> Result<Vec<JikanGenre>> {
        let response: JikanGenreListResponse = self.client.get("/genres/anime").await?;
        Ok(response.data)
    }
}

fn build_query(params: &AnimeSearchParams) -> Vec<(String, String)> {
    let mut query = Vec::new();
    push_param(&mut query, "limit", params.limit);
    push_param(&mut query, "page", params.page);
    push_param(&mut query, "q", params.q.as_deref());
    push_param(&mut query, "type", params.subtype.as_deref());
    push_param(&mut query, "min_score", params.min_score);
    push_param(&mut query, "max_score", params.max_score);
    push_param(&mut query, "status", params.status.as_deref());
    push_param(&mut query, "rating", params.rating.as_deref());
    push_param(&mut query, "sfw", params.sfw);
    push_param(&mut query, "genres", params.genres.as_deref());
    push_param(&mut query, "genres_exclude", params.genres_exclude.as_deref());
    push_param(&mut query, "order_by", params.order_by.as_deref());
    push_param(&mut query, "sort", params.sort.as_deref());
    push_param(&mut query, "letter", params.letter.as_deref());
    push_param(&mut query, "producers", params.producers.as_deref());
    push_param(&mut query, "start_date", params.start_date.as_deref());
    push_param(&mut query, "end_date", params.end_date.as_deref());
    query
}

/// Anime season for a 1-based calendar month: Feb-Apr spring, May-Jul
/// summer, Aug-Oct fall, Nov-Jan winter
pub(crate) fn current_season(month: u32) -> &'static str {
    match month {
        2..=4 => "spring",
        5..=7 => "summer",
        8..=10 => "fall",
        _ => "winter",
    }
}

/// Roll one quarter forward, wrapping the year at the winter boundary
pub(crate) fn next_season(year: i32, month: u32) -> (i32, &'static str) {
    match month {
        2..=4 => (year, "summer"),
        5..=7 => (year, "fall"),
        8..=10 => (year, "winter"),
        _ => (year + 1, "spring"),
    }
}

pub(crate) fn normalize_anime(anime: JikanAnime) -> NormalizedMedia {
    // Always prefer the English title, falling back to the default one
    let title = anime
        .title_english
        .as_deref()
        .filter(|t| !t.trim().is_empty())
        .unwrap_or(&anime.title)
        .to_string();

    let mut alt_titles = Vec::new();
    if let Some(japanese) = anime.title_japanese.as_deref()
        && japanese != title
    {
        alt_titles.push(japanese.to_string());
    }
    alt_titles.extend(anime.title_synonyms.iter().cloned());
    for entry in &anime.titles {
        if entry.title != title {
            alt_titles.push(entry.title.clone());
        }
    }

    // Themes and demographics combine into tags
    let tags: Vec<String> = anime
        .themes
        .iter()
        .chain(&anime.demographics)
        .map(|t| t.name.clone())
        .collect();

    // R+ / Rx ratings mark adult content
    let adult = anime
        .rating
        .as_deref()
        .is_some_and(|r| r.contains("R+") || r.contains("Rx"));

    let cover_image = anime
        .images
        .jpg
        .large_image_url
        .clone()
        .or_else(|| {
            anime
                .images
                .webp
                .as_ref()
                .and_then(|w| w.large_image_url.clone())
        })
        .filter(|url| !url.is_empty());

    let mut item = NormalizedMedia::new(
        anime.mal_id.to_string(),
        Provider::Jikan,
        MediaKind::Anime,
        title,
    );
    item.alt_titles = unique_strings(alt_titles);
    item.synopsis = normalize_string(anime.synopsis.as_deref());
    // Jikan has no backdrop; reuse the cover
    item.backdrop_image = cover_image.clone();
    item.cover_image = cover_image;
    item.genres = unique_strings(anime.genres.iter().map(|g| g.name.as_str()));
    item.tags = unique_strings(tags);
    item.score = anime.score;
    item.popularity = anime.popularity;
    item.year = anime.year.filter(|y| *y > 0);
    item.status = normalize_string(anime.status.as_deref());
    item.adult = adult;
    item.anime = Some(AnimeDetails {
        subtype: normalize_string(anime.subtype.as_deref()),
        episodes: anime.episodes,
        duration: normalize_string(anime.duration.as_deref()),
        season: normalize_string(anime.season.as_deref()),
        airing: anime.airing,
        airing_from: anime.aired.as_ref().and_then(|a| a.from.clone()),
        airing_to: anime.aired.as_ref().and_then(|a| a.to.clone()),
        studios: unique_strings(anime.studios.iter().map(|s| s.name.as_str())),
        rating: normalize_string(anime.rating.as_deref()),
    });
    item
}
