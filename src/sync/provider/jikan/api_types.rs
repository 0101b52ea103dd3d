use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct JikanListResponse {
    pub data: Vec<JikanAnime>,
    pub pagination: Option<JikanPagination>,
}

#[derive(Debug, Deserialize)]
pub struct JikanItemResponse {
    pub data: JikanAnime,
}

#[derive(Debug, Deserialize)]
pub struct JikanPagination {
    pub current_page: i32,
    pub has_next_page: bool,
    pub items: JikanPaginationItems,
}

#[derive(Debug, Deserialize)]
pub struct JikanPaginationItems {
    pub count: i32,
    pub total: i64,
    pub per_page: i32,
}

#[derive(Debug, Deserialize)]
pub struct JikanAnime {
    pub mal_id: i64,
    pub title: String,
    pub title_english: Option<String>,
    pub title_japanese: Option<String>,
    #[serde(default)]
    pub title_synonyms: Vec<String>,
    #[serde(default)]
    pub titles: Vec<JikanTitle>,
    pub synopsis: Option<String>,
    pub images: JikanImages,
    #[serde(rename = "type")]
    pub subtype: Option<String>,
    pub episodes: Option<i32>,
    #[serde(default)]
    pub genres: Vec<JikanNamed>,
    #[serde(default)]
    pub themes: Vec<JikanNamed>,
    #[serde(default)]
    pub demographics: Vec<JikanNamed>,
    #[serde(default)]
    pub studios: Vec<JikanNamed>,
    pub score: Option<f64>,
    pub year: Option<i32>,
    pub status: Option<String>,
    /// Audience rating, e.g. "R+ - Mild Nudity"
    pub rating: Option<String>,
    pub duration: Option<String>,
    pub season: Option<String>,
    #[serde(default)]
    pub airing: bool,
    pub aired: Option<JikanAired>,
    pub popularity: Option<f64>,
    pub members: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct JikanTitle {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub title: String,
}

#[derive(Debug, Deserialize)]
pub struct JikanNamed {
    pub mal_id: Option<i64>,
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct JikanImages {
    pub jpg: JikanImageSet,
    pub webp: Option<JikanImageSet>,
}

#[derive(Debug, Default, Deserialize)]
pub struct JikanImageSet {
    pub image_url: Option<String>,
    pub large_image_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct JikanAired {
    pub from: Option<String>,
    pub to: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct JikanGenreListResponse {
    pub data: Vec<JikanGenre>,
}

#[derive(Debug, Deserialize)]
pub struct JikanGenre {
    pub mal_id: i64,
    pub name: String,
    pub count: Option<i64>,
}

/// Anime search parameters for the /anime endpoint
#[derive(Debug, Clone, Default)]
pub struct AnimeSearchParams {
    pub q: Option<String>,
    pub page: Option<i32>,
    pub limit: Option<i32>,
    /// tv / movie / ova / special / ona
    pub subtype: Option<String>,
    pub status: Option<String>,
    pub rating: Option<String>,
    pub sfw: Option<bool>,
    /// Comma-joined genre ids
    pub genres: Option<String>,
    pub genres_exclude: Option<String>,
    pub order_by: Option<String>,
    pub sort: Option<String>,
    pub min_score: Option<f64>,
    pub max_score: Option<f64>,
    pub letter: Option<String>,
    pub producers: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}
