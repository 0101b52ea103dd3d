use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use tracing::warn;

use super::api_types::{
    GenreListResponse, MovieSearchParams, TmdbGenre, TmdbMovie, TmdbResponse, TmdbTvShow,
    TvSearchParams,
};
use crate::sync::config::RetryOptions;
use crate::sync::http::HttpClient;
use crate::sync::provider::{Paginated, push_param};
use crate::sync::Result;
use crate::sync::types::{MediaKind, NormalizedMedia, Provider, normalize_string, unique_strings};

const TMDB_BASE_URL: &str = "https://api.themoviedb.org/3";
const TMDB_IMAGE_BASE: &str = "https://image.tmdb.org/t/p/w500";

/// Genre map lives for a day; list endpoints only carry genre ids
const GENRE_CACHE_TTL: Duration = Duration::from_secs(24 * 60 * 60);
const GENRE_CACHE_KEY: u8 = 0;

/// TMDB client for movies and TV, bearer-token authenticated
pub struct TmdbClient {
    client: HttpClient,
    genre_cache: Cache<u8, Arc<HashMap<i64, String>>>,
}

impl TmdbClient {
    #[must_use]
    pub fn new(bearer_token: &str, retry: RetryOptions) -> Self {
        Self::with_base_url(TMDB_BASE_URL, bearer_token, retry)
    }

    /// Base URL override used by tests against a local stand-in server
    #[must_use]
    pub fn with_base_url(base_url: impl Into<String>, bearer_token: &str, retry: RetryOptions) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {bearer_token}"))
                .expect("Invalid TMDB bearer token"),
        );

        Self {
            client: HttpClient::with_options(base_url, headers, retry),
            genre_cache: Cache::builder()
                .max_capacity(1)
                .time_to_live(GENRE_CACHE_TTL)
                .build(),
        }
    }

    /// Drop the cached genre map so the next lookup refetches it
    pub fn invalidate_genres(&self) {
        self.genre_cache.invalidate_all();
    }

    // MOVIE LISTS

    /// Trending movies (by week)
    pub async fn trending_movies(&self, page: i32) -> Result<Vec<NormalizedMedia>> {
        self.movie_list("/trending/movie/week", page).await
    }

    pub async fn popular_movies(&self, page: i32) -> Result<Vec<NormalizedMedia>> {
        self.movie_list("/movie/popular", page).await
    }

    pub async fn top_rated_movies(&self, page: i32) -> Result<Vec<NormalizedMedia>> {
        self.movie_list("/movie/top_rated", page).await
    }

    pub async fn upcoming_movies(&self, page: i32) -> Result<Vec<NormalizedMedia>> {
        self.movie_list("/movie/upcoming", page).await
    }

    pub async fn now_playing_movies(&self, page: i32) -> Result<Vec<NormalizedMedia>> {
        self.movie_list("/movie/now_playing", page).await
    }

    /// Discover movies by origin country and original language, most
    /// popular first. Regional helpers are parameterized calls to this.
    pub async fn movies_by_origin(
        &self,
        origin_country: &str,
        language: Option<&str>,
        page: i32,
    ) -> Result<Vec<NormalizedMedia>> {
        let params = MovieSearchParams {
            page: Some(page),
            with_origin_country: Some(origin_country.to_string()),
            with_original_language: language.map(str::to_string),
            sort_by: Some("popularity.desc".to_string()),
            ..MovieSearchParams::default()
        };
        Ok(self.search_movies(&params).await?.items)
    }

    /// Bollywood movies (India, Hindi)
    pub async fn bollywood_movies(&self, page: i32) -> Result<Vec<NormalizedMedia>> {
        self.movies_by_origin("IN", Some("hi"), page).await
    }

    /// Hollywood movies (US, English)
    pub async fn hollywood_movies(&self, page: i32) -> Result<Vec<NormalizedMedia>> {
        self.movies_by_origin("US", Some("en"), page).await
    }

    // TV LISTS

    pub async fn trending_tv(&self, page: i32) -> Result<Vec<NormalizedMedia>> {
        self.tv_list("/trending/tv/week", page).await
    }

    pub async fn popular_tv(&self, page: i32) -> Result<Vec<NormalizedMedia>> {
        self.tv_list("/tv/popular", page).await
    }

    pub async fn top_rated_tv(&self, page: i32) -> Result<Vec<NormalizedMedia>> {
        self.tv_list("/tv/top_rated", page).await
    }

    /// Discover TV by origin country and original language
    pub async fn tv_by_origin(
        &self,
        origin_country: &str,
        language: Option<&str>,
        page: i32,
    ) -> Result<Vec<NormalizedMedia>> {
        let params = TvSearchParams {
            page: Some(page),
            with_origin_country: Some(origin_country.to_string()),
            with_original_language: language.map(str::to_string),
            sort_by: Some("popularity.desc".to_string()),
            ..TvSearchParams::default()
        };
        Ok(self.search_tv(&params).await?.items)
    }

    pub async fn kdramas(&self, page: i32) -> Result<Vec<NormalizedMedia>> {
        self.tv_by_origin("KR", Some("ko"), page).await
    }

    pub async fn cdramas(&self, page: i32) -> Result<Vec<NormalizedMedia>> {
        self.tv_by_origin("CN", Some("zh"), page).await
    }

    pub async fn jdramas(&self, page: i32) -> Result<Vec<NormalizedMedia>> {
        self.tv_by_origin("JP", Some("ja"), page).await
    }

    pub async fn thai_dramas(&self, page: i32) -> Result<Vec<NormalizedMedia>> {
        self.tv_by_origin("TH", Some("th"), page).await
    }

    pub async fn indian_tv(&self, page: i32) -> Result<Vec<NormalizedMedia>> {
        self.tv_by_origin("IN", Some("hi"), page).await
    }

    // SEARCH

    /// Movie search; a `query` hits /search/movie, otherwise /discover/movie
    pub async fn search_movies(
        &self,
        params: &MovieSearchParams,
    ) -> Result<Paginated<NormalizedMedia>> {
        let endpoint = if params.query.is_some() {
            "/search/movie"
        } else {
            "/discover/movie"
        };

        let mut query = Vec::new();
        push_param(&mut query, "query", params.query.as_deref());
        push_param(&mut query, "page", params.page);
        push_param(&mut query, "year", params.year);
        push_param(&mut query, "primary_release_year", params.primary_release_year);
        push_param(&mut query, "with_genres", params.with_genres.as_deref());
        push_param(&mut query, "without_genres", params.without_genres.as_deref());
        push_param(
            &mut query,
            "with_origin_country",
            params.with_origin_country.as_deref(),
        );
        push_param(
            &mut query,
            "with_original_language",
            params.with_original_language.as_deref(),
        );
        push_param(&mut query, "sort_by", params.sort_by.as_deref());
        push_param(&mut query, "include_adult", params.include_adult);
        push_param(&mut query, "language", Some("en-US"));

        let response: TmdbResponse<TmdbMovie> =
            self.client.get_with_params(endpoint, &query).await?;

        let mut items = Vec::with_capacity(response.results.len());
        for movie in response.results {
            items.push(self.normalize_movie(movie).await);
        }

        Ok(Paginated {
            items,
            page: response.page,
            total_pages: response.total_pages,
            total_results: response.total_results,
        })
    }

    /// TV search; a `query` hits /search/tv, otherwise /discover/tv
    pub async fn search_tv(&self, params: &TvSearchParams) -> Result<Paginated<NormalizedMedia>> {
        let endpoint = if params.query.is_some() {
            "/search/tv"
        } else {
            "/discover/tv"
        };

        let mut query = Vec::new();
        push_param(&mut query, "query", params.query.as_deref());
        push_param(&mut query, "page", params.page);
        push_param(
            &mut query,
            "first_air_date_year",
            params.first_air_date_year,
        );
        push_param(&mut query, "with_genres", params.with_genres.as_deref());
        push_param(&mut query, "without_genres", params.without_genres.as_deref());
        push_param(
            &mut query,
            "with_origin_country",
            params.with_origin_country.as_deref(),
        );
        push_param(
            &mut query,
            "with_original_language",
            params.with_original_language.as_deref(),
        );
        push_param(&mut query, "sort_by", params.sort_by.as_deref());
        push_param(&mut query, "include_adult", params.include_adult);
        push_param(&mut query, "language", Some("en-US"));

        let response: TmdbResponse<TmdbTvShow> =
            self.client.get_with_params(endpoint, &query).await?;

        let mut items = Vec::with_capacity(response.results.len());
        for show in response.results {
            items.push(self.normalize_tv(show).await);
        }

        Ok(Paginated {
            items,
            page: response.page,
            total_pages: response.total_pages,
            total_results: response.total_results,
        })
    }

    // LOOKUPS

    pub async fn movie_by_id(&self, id: i64) -> Result<NormalizedMedia> {
        let movie: TmdbMovie = self
            .client
            .get(&format!("/movie/{id}?language=en-US"))
            .await?;
        Ok(self.normalize_movie(movie).await)
    }

    pub async fn tv_by_id(&self, id: i64) -> Result<NormalizedMedia> {
        let show: TmdbTvShow = self.client.get(&format!("/tv/{id}?language=en-US")).await?;
        Ok(self.normalize_tv(show).await)
    }

    pub async fn movie_genres(&self) -> Result<Vec<TmdbGenre>> {
        let response: GenreListResponse = self
            .client
            .get("/genre/movie/list?language=en-US")
            .await?;
        Ok(response.genres)
    }

    pub async fn tv_genres(&self) -> Result<Vec<TmdbGenre>> {
        let response: GenreListResponse = self.client.get("/genre/tv/list?language=en-US").await?;
        Ok(response.genres)
    }

    // INTERNALS

    async fn movie_list(&self, endpoint: &str, page: i32) -> Result<Vec<NormalizedMedia>> {
        let query = vec![
            ("page".to_string(), page.max(1).to_string()),
            ("language".to_string(), "en-US".to_string()),
        ];
        let response: TmdbResponse<TmdbMovie> =
            self.client.get_with_params(endpoint, &query).await?;

        let mut items = Vec::with_capacity(response.results.len());
        for movie in response.results {
            items.push(self.normalize_movie(movie).await);
        }
        Ok(items)
    }

    async fn tv_list(&self, endpoint: &str, page: i32) -> Result<Vec<NormalizedMedia>> {
        let query = vec![
            ("page".to_string(), page.max(1).to_string()),
            ("language".to_string(), "en-US".to_string()),
        ];
        let response: TmdbResponse<TmdbTvShow> =
            self.client.get_with_params(endpoint, &query).await?;

        let mut items = Vec::with_capacity(response.results.len());
        for show in response.results {
            items.push(self.normalize_tv(show).await);
        }
        Ok(items)
    }

    /// Fetch movie and TV genre sets together and cache the combined map
    async fn genre_map(&self) -> Arc<HashMap<i64, String>> {
        if let Some(map) = self.genre_cache.get(&GENRE_CACHE_KEY).await {
            return map;
        }

        let (movies, tv) = tokio::join!(
            self.client
                .get::<GenreListResponse>("/genre/movie/list?language=en-US"),
            self.client
                .get::<GenreListResponse>("/genre/tv/list?language=en-US"),
        );

        match (movies, tv) {
            (Ok(movies), Ok(tv)) => {
                let map: HashMap<i64, String> = movies
                    .genres
                    .into_iter()
                    .chain(tv.genres)
                    .map(|g| (g.id, g.name))
                    .collect();
                let map = Arc::new(map);
                self.genre_cache.insert(GENRE_CACHE_KEY, map.clone()).await;
                map
            }
            (movies, tv) => {
                // Missing genres degrade to placeholder names; the map is not
                // cached so the next lookup retries.
                if let Err(err) = movies.and(tv) {
                    warn!("Failed to initialize TMDB genres: {err}");
                }
                Arc::new(HashMap::new())
            }
        }
    }

    async fn resolve_genres(
        &self,
        genre_ids: &[i64],
        genres: Option<&[TmdbGenre]>,
    ) -> Vec<String> {
        // Detailed responses carry full genre objects; use them directly
        if let Some(genres) = genres
            && !genres.is_empty()
        {
            return genres.iter().map(|g| g.name.clone()).collect();
        }

        if genre_ids.is_empty() {
            return Vec::new();
        }

        let map = self.genre_map().await;
        genre_ids
            .iter()
            .map(|id| {
                map.get(id)
                    .cloned()
                    .unwrap_or_else(|| format!("Unknown Genre {id}"))
            })
            .collect()
    }

    async fn normalize_movie(&self, movie: TmdbMovie) -> NormalizedMedia {
        let genres = self
            .resolve_genres(&movie.genre_ids, movie.genres.as_deref())
            .await;

        let mut alt_titles = Vec::new();
        if let Some(original) = movie.original_title.as_deref()
            && original != movie.title
        {
            alt_titles.push(original.to_string());
        }

        let cover_image = image_url(movie.poster_path.as_deref());
        // TMDB always has some artwork; fall back to the cover when a
        // backdrop is missing
        let backdrop_image = image_url(movie.backdrop_path.as_deref()).or_else(|| cover_image.clone());

        let mut item = NormalizedMedia::new(
            movie.id.to_string(),
            Provider::Tmdb,
            MediaKind::Movie,
            movie.title,
        );
        item.alt_titles = unique_strings(alt_titles);
        item.synopsis = normalize_string(movie.overview.as_deref());
        item.cover_image = cover_image;
        item.backdrop_image = backdrop_image;
        item.genres = unique_strings(genres);
        item.countries = unique_strings(
            movie
                .production_countries
                .unwrap_or_default()
                .into_iter()
                .map(|c| c.name),
        );
        item.languages = unique_strings(
            movie
                .spoken_languages
                .unwrap_or_default()
                .into_iter()
                .map(|l| l.english_name),
        );
        item.score = movie.vote_average;
        item.popularity = movie.popularity;
        item.year = release_year(movie.release_date.as_deref());
        item.status = normalize_string(movie.status.as_deref());
        item.adult = movie.adult;
        item
    }

    async fn normalize_tv(&self, show: TmdbTvShow) -> NormalizedMedia {
        let genres = self
            .resolve_genres(&show.genre_ids, show.genres.as_deref())
            .await;

        let mut alt_titles = Vec::new();
        if let Some(original) = show.original_name.as_deref()
            && original != show.name
        {
            alt_titles.push(original.to_string());
        }

        let cover_image = image_url(show.poster_path.as_deref());
        let backdrop_image = image_url(show.backdrop_path.as_deref()).or_else(|| cover_image.clone());

        let mut item = NormalizedMedia::new(
            show.id.to_string(),
            Provider::Tmdb,
            MediaKind::Tv,
            show.name,
        );
        item.alt_titles = unique_strings(alt_titles);
        item.synopsis = normalize_string(show.overview.as_deref());
        item.cover_image = cover_image;
        item.backdrop_image = backdrop_image;
        item.genres = unique_strings(genres);
        item.countries = unique_strings(
            show.production_countries
                .unwrap_or_default()
                .into_iter()
                .map(|c| c.name),
        );
        item.languages = unique_strings(
            show.spoken_languages
                .unwrap_or_default()
                .into_iter()
                .map(|l| l.english_name),
        );
        item.score = show.vote_average;
        item.popularity = show.popularity;
        item.year = release_year(show.first_air_date.as_deref());
        item.status = normalize_string(show.status.as_deref());
        item.adult = show.adult;
        item
    }
}

fn image_url(path: Option<&str>) -> Option<String> {
    path.filter(|p| !p.is_empty())
        .map(|p| format!("{TMDB_IMAGE_BASE}{p}"))
}

/// First-release year from a `YYYY-MM-DD` date
pub(crate) fn release_year(date: Option<&str>) -> Option<i32> {
    date?
        .split('-')
        .next()
        .and_then(|y| y.parse::<i32>().ok())
        .filter(|y| *y > 0)
}
