use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct TmdbResponse<T> {
    pub page: i32,
    pub results: Vec<T>,
    #[serde(default)]
    pub total_pages: i32,
    #[serde(default)]
    pub total_results: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TmdbGenre {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct GenreListResponse {
    pub genres: Vec<TmdbGenre>,
}

#[derive(Debug, Deserialize)]
pub struct TmdbCountry {
    pub iso_3166_1: String,
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct TmdbLanguage {
    pub english_name: String,
    pub iso_639_1: String,
}

/// Movie record; list endpoints carry `genre_ids` only, detailed responses
/// carry full `genres` objects plus countries and languages
#[derive(Debug, Deserialize)]
pub struct TmdbMovie {
    pub id: i64,
    pub title: String,
    pub original_title: Option<String>,
    pub overview: Option<String>,
    #[serde(default)]
    pub adult: bool,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    #[serde(default)]
    pub genre_ids: Vec<i64>,
    pub genres: Option<Vec<TmdbGenre>>,
    pub release_date: Option<String>,
    pub runtime: Option<i32>,
    pub status: Option<String>,
    pub popularity: Option<f64>,
    pub vote_average: Option<f64>,
    pub vote_count: Option<i64>,
    pub production_countries: Option<Vec<TmdbCountry>>,
    pub spoken_languages: Option<Vec<TmdbLanguage>>,
}

#[derive(Debug, Deserialize)]
pub struct TmdbTvShow {
    pub id: i64,
    pub name: String,
    pub original_name: Option<String>,
    pub overview: Option<String>,
    #[serde(default)]
    pub adult: bool,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    #[serde(default)]
    pub genre_ids: Vec<i64>,
    pub genres: Option<Vec<TmdbGenre>>,
    pub first_air_date: Option<String>,
    pub last_air_date: Option<String>,
    pub number_of_episodes: Option<i32>,
    pub number_of_seasons: Option<i32>,
    pub status: Option<String>,
    #[serde(rename = "type")]
    pub show_type: Option<String>,
    pub popularity: Option<f64>,
    pub vote_average: Option<f64>,
    pub vote_count: Option<i64>,
    pub production_countries: Option<Vec<TmdbCountry>>,
    pub spoken_languages: Option<Vec<TmdbLanguage>>,
}

/// Movie search/discover parameters; `query` routes to /search, everything
/// else to /discover
#[derive(Debug, Clone, Default)]
pub struct MovieSearchParams {
    pub query: Option<String>,
    pub page: Option<i32>,
    pub year: Option<i32>,
    pub primary_release_year: Option<i32>,
    pub with_genres: Option<String>,
    pub without_genres: Option<String>,
    pub with_origin_country: Option<String>,
    pub with_original_language: Option<String>,
    pub sort_by: Option<String>,
    pub include_adult: Option<bool>,
}

#[derive(Debug, Clone, Default)]
pub struct TvSearchParams {
    pub query: Option<String>,
    pub page: Option<i32>,
    pub first_air_date_year: Option<i32>,
    pub with_genres: Option<String>,
    pub without_genres: Option<String>,
    pub with_origin_country: Option<String>,
    pub with_original_language: Option<String>,
    pub sort_by: Option<String>,
    pub include_adult: Option<bool>,
}
