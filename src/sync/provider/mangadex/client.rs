use std::collections::HashMap;
use std::time::Duration;

use moka::future::Cache;

use super::api_types::{
    Localized, MangaDexManga, MangaListResponse, MangaSearchParams, MangaStatisticsResponse,
    MangaTag, TagListResponse,
};
use crate::sync::Result;
use crate::sync::config::RetryOptions;
use crate::sync::http::HttpClient;
use crate::sync::provider::{OffsetPage, push_param};
use crate::sync::types::{
    MangaDetails, MediaKind, NormalizedMedia, Provider, normalize_string, unique_strings,
};

const MANGADEX_BASE_URL: &str = "https://api.mangadex.org";
const COVER_BASE_URL: &str = "https://uploads.mangadex.org/covers";

/// Scores change slowly; half a day of staleness is acceptable
const STATISTICS_CACHE_TTL: Duration = Duration::from_secs(12 * 60 * 60);
const STATISTICS_CACHE_CAPACITY: u64 = 10_000;

/// MangaDex client; unauthenticated public REST
pub struct MangaDexClient {
    client: HttpClient,
    /// Resolved score per manga id, including an explicit `None` for manga
    /// with no bayesian rating so they are not refetched
    statistics_cache: Cache<String, Option<f64>>,
}

impl MangaDexClient {
    #[must_use]
    pub fn new(retry: RetryOptions) -> Self {
        Self::with_base_url(MANGADEX_BASE_URL, retry)
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
            statistics_cache: Cache::builder()
                .max_capacity(STATISTICS_CACHE_CAPACITY)
                .time_to_live(STATISTICS_CACHE_TTL)
                .build(),
        }
    }

    /// Drop all cached scores
    pub fn invalidate_statistics(&self) {
        self.statistics_cache.invalidate_all();
    }

    /// Popular manga (Japanese only)
    pub async fn popular_manga(&self, limit: i32, offset: i32) -> Result<Vec<NormalizedMedia>> {
        self.followed_count_list(&["ja"], limit, offset, &[]).await
    }

    /// Popular manhwa (Korean only)
    pub async fn popular_manhwa(&self, limit: i32, offset: i32) -> Result<Vec<NormalizedMedia>> {
        self.followed_count_list(&["ko"], limit, offset, &[]).await
    }

    /// Popular manhua (Chinese variants)
    pub async fn popular_manhua(&self, limit: i32, offset: i32) -> Result<Vec<NormalizedMedia>> {
        self.followed_count_list(&["zh", "zh-hk"], limit, offset, &[])
            .await
    }

    /// Trending: most recently updated, all languages
    pub async fn trending_manga(&self, limit: i32, offset: i32) -> Result<Vec<NormalizedMedia>> {
        let params = MangaSearchParams {
            limit: Some(limit),
            offset: Some(offset),
            order: vec![("latestUploadedChapter".to_string(), "desc".to_string())],
            content_rating: safe_ratings(),
            includes: default_includes(),
            has_available_chapters: Some(true),
            ..MangaSearchParams::default()
        };
        Ok(self.search_manga(&params).await?.items)
    }

    /// Highly followed manga; followedCount stands in for a rating order,
    /// filtered to the main publication demographics
    pub async fn top_rated_manga(&self, limit: i32, offset: i32) -> Result<Vec<NormalizedMedia>> {
        self.followed_count_list(
            &["ja"],
            limit,
            offset,
            &["shounen", "seinen", "shoujo", "josei"],
        )
        .await
    }

    pub async fn top_rated_manhwa(&self, limit: i32, offset: i32) -> Result<Vec<NormalizedMedia>> {
        self.followed_count_list(&["ko"], limit, offset, &[]).await
    }

    pub async fn top_rated_manhua(&self, limit: i32, offset: i32) -> Result<Vec<NormalizedMedia>> {
        self.followed_count_list(&["zh", "zh-hk"], limit, offset, &[])
            .await
    }

    /// Recently created popular manga for one language family
    pub async fn recent_popular_by_language(
        &self,
        language: &str,
        limit: i32,
        offset: i32,
    ) -> Result<Vec<NormalizedMedia>> {
        let languages: Vec<String> = if language == "zh" {
            vec!["zh".to_string(), "zh-hk".to_string()]
        } else {
            vec![language.to_string()]
        };

        let thirty_days_ago = chrono::Utc::now() - chrono::Duration::days(30);
        let params = MangaSearchParams {
            limit: Some(limit),
            offset: Some(offset),
            order: vec![("followedCount".to_string(), "desc".to_string())],
            content_rating: safe_ratings(),
            original_language: languages,
            includes: default_includes(),
            has_available_chapters: Some(true),
            created_at_since: Some(thirty_days_ago.format("%Y-%m-%dT%H:%M:%S").to_string()),
            ..MangaSearchParams::default()
        };
        Ok(self.search_manga(&params).await?.items)
    }

    /// Advanced search with offset pagination
    pub async fn search_manga(
        &self,
        params: &MangaSearchParams,
    ) -> Result<OffsetPage<NormalizedMedia>> {
        let query = build_query(params);
        let response: MangaListResponse = self.client.get_with_params("/manga", &query).await?;

        let scores = self.scores_for(&response.data).await;
        let offset = i64::from(params.offset.unwrap_or(0));
        let limit = i64::from(params.limit.unwrap_or(20));

        let items = response
            .data
            .into_iter()
            .map(|manga| {
                let score = scores.get(&manga.id).copied().flatten();
                normalize_manga(manga, score)
            })
            .collect();

        Ok(OffsetPage {
            items,
            total: response.total,
            has_more: offset + limit < response.total,
        })
    }

    /// Tag list used for filtering
    pub async fn tags(&self) -> Result<Vec<MangaTag>> {
        let response: TagListResponse = self.client.get("/manga/tag").await?;
        Ok(response.data)
    }

    /// Resolve scores for a result page, batching the statistics lookups
    /// for every id not already cached into a single request.
    async fn scores_for(&self, manga_list: &[MangaDexManga]) -> HashMap<String, Option<f64>> {
        let mut results = HashMap::new();
        let mut pending = Vec::new();

        for manga in manga_list {
            if let Some(score) = self.statistics_cache.get(&manga.id).await {
                results.insert(manga.id.clone(), score);
            } else if !pending.contains(&manga.id) {
                pending.push(manga.id.clone());
            }
        }

        if pending.is_empty() {
            return results;
        }

        let fetched = self.fetch_statistics(&pending).await;
        match fetched {
            Ok(response) => {
                for id in pending {
                    let score = response
                        .statistics
                        .get(&id)
                        .and_then(|s| s.rating.as_ref())
                        .and_then(|r| r.bayesian.or(r.average))
                        .and_then(normalize_score);
                    self.statistics_cache.insert(id.clone(), score).await;
                    results.insert(id, score);
                }
            }
            // A failed statistics call never fails the listing; cache the
            // misses so they are not hammered on every page
            Err(_) => {
                for id in pending {
                    self.statistics_cache.insert(id.clone(), None).await;
                    results.insert(id, None);
                }
            }
        }

        results
    }

    async fn fetch_statistics(&self, ids: &[String]) -> Result<MangaStatisticsResponse> {
        if ids.len() == 1 {
            self.client
                .get(&format!("/statistics/manga/{}", ids[0]))
                .await
        } else {
            let query: Vec<(String, String)> = ids
                .iter()
                .map(|id| ("manga[]".to_string(), id.clone()))
                .collect();
            self.client.get_with_params("/statistics/manga", &query).await
        }
    }

    async fn followed_count_list(
        &self,
        languages: &[&str],
        limit: i32,
        offset: i32,
        demographics: &[&str],
    ) -> Result<Vec<NormalizedMedia>> {
        let params = MangaSearchParams {
            limit: Some(limit),
            offset: Some(offset),
            order: vec![("followedCount".to_string(), "desc".to_string())],
            content_rating: safe_ratings(),
            original_language: languages.iter().map(|s| (*s).to_string()).collect(),
            publication_demographic: demographics.iter().map(|s| (*s).to_string()).collect(),
            includes: default_includes(),
            has_available_chapters: Some(true),
            ..MangaSearchParams::default()
        };
        Ok(self.search_manga(&params).await?.items)
    }
}

fn safe_ratings() -> Vec<String> {
    vec!["safe".to_string(), "suggestive".to_string()]
}

fn default_includes() -> Vec<String> {
    vec!["cover_art".to_string(), "tag".to_string()]
}

fn build_query(params: &MangaSearchParams) -> Vec<(String, String)> {
    let mut query = Vec::new();
    push_param(&mut query, "limit", params.limit);
    push_param(&mut query, "offset", params.offset);
    push_param(&mut query, "title", params.title.as_deref());
    push_param(&mut query, "year", params.year);

    for id in &params.ids {
        query.push(("ids[]".to_string(), id.clone()));
    }
    for author in &params.authors {
        query.push(("authors[]".to_string(), author.clone()));
    }
    for artist in &params.artists {
        query.push(("artists[]".to_string(), artist.clone()));
    }
    for tag in &params.included_tags {
        query.push(("includedTags[]".to_string(), tag.clone()));
    }
    for tag in &params.excluded_tags {
        query.push(("excludedTags[]".to_string(), tag.clone()));
    }
    for status in &params.status {
        query.push(("status[]".to_string(), status.clone()));
    }
    for language in &params.original_language {
        query.push(("originalLanguage[]".to_string(), language.clone()));
    }
    for language in &params.excluded_original_language {
        query.push(("excludedOriginalLanguage[]".to_string(), language.clone()));
    }
    for language in &params.available_translated_language {
        query.push((
            "availableTranslatedLanguage[]".to_string(),
            language.clone(),
        ));
    }
    for demographic in &params.publication_demographic {
        query.push(("publicationDemographic[]".to_string(), demographic.clone()));
    }
    for rating in &params.content_rating {
        query.push(("contentRating[]".to_string(), rating.clone()));
    }
    for include in &params.includes {
        query.push(("includes[]".to_string(), include.clone()));
    }
    for (field, direction) in &params.order {
        query.push((format!("order[{field}]"), direction.clone()));
    }

    push_param(&mut query, "createdAtSince", params.created_at_since.as_deref());
    push_param(&mut query, "updatedAtSince", params.updated_at_since.as_deref());
    push_param(
        &mut query,
        "hasAvailableChapters",
        params.has_available_chapters,
    );
    push_param(&mut query, "group", params.group.as_deref());
    query
}

/// Round a provider score to 2 decimals, dropping NaN
pub(crate) fn normalize_score(value: f64) -> Option<f64> {
    if value.is_nan() {
        return None;
    }
    Some((value * 100.0).round() / 100.0)
}

/// English first, then the first available localization
fn localized_first(map: &Localized) -> Option<&str> {
    map.get("en")
        .or_else(|| map.values().next())
        .map(String::as_str)
        .filter(|s| !s.trim().is_empty())
}

pub(crate) fn normalize_manga(manga: MangaDexManga, score: Option<f64>) -> NormalizedMedia {
    let attributes = &manga.attributes;

    let title = localized_first(&attributes.title)
        .unwrap_or("Unknown Title")
        .to_string();

    let mut alt_titles = Vec::new();
    for value in attributes.title.values() {
        if value != &title {
            alt_titles.push(value.clone());
        }
    }
    for localized in &attributes.alt_titles {
        for value in localized.values() {
            if value != &title {
                alt_titles.push(value.clone());
            }
        }
    }

    // Tag group "genre" maps to genres; every other group is a tag
    let mut genres = Vec::new();
    let mut tags = Vec::new();
    for tag in &attributes.tags {
        let name = localized_first(&tag.attributes.name)
            .unwrap_or("Unknown Tag")
            .to_string();
        if tag.attributes.group.as_deref() == Some("genre") {
            genres.push(name);
        } else {
            tags.push(name);
        }
    }

    let adult = matches!(
        attributes.content_rating.as_deref(),
        Some("erotica" | "pornographic")
    );

    let cover_image = manga
        .relationships
        .iter()
        .find(|rel| rel.kind == "cover_art")
        .and_then(|rel| rel.attributes.as_ref())
        .and_then(|attrs| attrs.file_name.as_deref())
        .map(|file| format!("{COVER_BASE_URL}/{}/{file}.512.jpg", manga.id));

    let mut item = NormalizedMedia::new(
        manga.id.clone(),
        Provider::MangaDex,
        MediaKind::Manga,
        title,
    );
    item.alt_titles = unique_strings(alt_titles);
    item.synopsis = localized_first(&attributes.description).map(str::to_string);
    item.backdrop_image = cover_image.clone();
    item.cover_image = cover_image;
    item.genres = unique_strings(genres);
    item.tags = unique_strings(tags);
    item.score = score;
    item.year = attributes.year.filter(|y| *y > 0);
    item.status = normalize_string(attributes.status.as_deref());
    item.adult = adult;
    item.manga = Some(MangaDetails {
        last_chapter: normalize_string(attributes.last_chapter.as_deref()),
        last_volume: normalize_string(attributes.last_volume.as_deref()),
        content_rating: normalize_string(attributes.content_rating.as_deref()),
        publication_demographic: normalize_string(attributes.publication_demographic.as_deref()),
    });
    item
}
