use std::collections::{BTreeMap, HashMap};

use serde::Deserialize;

/// Localized string map, e.g. `{"en": "...", "ja": "..."}`
pub type Localized = BTreeMap<String, String>;

#[derive(Debug, Deserialize)]
pub struct MangaListResponse {
    pub data: Vec<MangaDexManga>,
    #[serde(default)]
    pub limit: i32,
    #[serde(default)]
    pub offset: i32,
    #[serde(default)]
    pub total: i64,
}

#[derive(Debug, Deserialize)]
pub struct MangaDexManga {
    pub id: String,
    pub attributes: MangaAttributes,
    #[serde(default)]
    pub relationships: Vec<Relationship>,
}

#[derive(Debug, Deserialize)]
pub struct MangaAttributes {
    #[serde(default)]
    pub title: Localized,
    #[serde(default, rename = "altTitles")]
    pub alt_titles: Vec<Localized>,
    #[serde(default)]
    pub description: Localized,
    #[serde(rename = "lastVolume")]
    pub last_volume: Option<String>,
    #[serde(rename = "lastChapter")]
    pub last_chapter: Option<String>,
    #[serde(rename = "publicationDemographic")]
    pub publication_demographic: Option<String>,
    pub status: Option<String>,
    pub year: Option<i32>,
    /// safe / suggestive / erotica / pornographic
    #[serde(rename = "contentRating")]
    pub content_rating: Option<String>,
    #[serde(default)]
    pub tags: Vec<MangaTag>,
}

#[derive(Debug, Deserialize)]
pub struct MangaTag {
    pub id: String,
    pub attributes: TagAttributes,
}

#[derive(Debug, Deserialize)]
pub struct TagAttributes {
    #[serde(default)]
    pub name: Localized,
    /// genre / theme / format / content
    pub group: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Relationship {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub attributes: Option<RelationshipAttributes>,
}

/// Only the cover-art relationship carries a file name; other relationship
/// kinds deserialize with it absent
#[derive(Debug, Deserialize)]
pub struct RelationshipAttributes {
    #[serde(rename = "fileName")]
    pub file_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct MangaStatisticsResponse {
    #[serde(default)]
    pub statistics: HashMap<String, MangaStatistics>,
}

#[derive(Debug, Deserialize)]
pub struct MangaStatistics {
    pub rating: Option<StatisticsRating>,
    pub follows: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct StatisticsRating {
    pub average: Option<f64>,
    pub bayesian: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct TagListResponse {
    pub data: Vec<MangaTag>,
}

/// Manga search parameters; array values serialize as repeated `key[]`
/// entries and order entries as `order[key]=direction`
#[derive(Debug, Clone, Default)]
pub struct MangaSearchParams {
    pub limit: Option<i32>,
    pub offset: Option<i32>,
    pub title: Option<String>,
    pub year: Option<i32>,
    pub ids: Vec<String>,
    pub authors: Vec<String>,
    pub artists: Vec<String>,
    pub included_tags: Vec<String>,
    pub excluded_tags: Vec<String>,
    pub status: Vec<String>,
    pub original_language: Vec<String>,
    pub excluded_original_language: Vec<String>,
    pub available_translated_language: Vec<String>,
    pub publication_demographic: Vec<String>,
    pub content_rating: Vec<String>,
    pub includes: Vec<String>,
    /// `(field, direction)` pairs, e.g. `("followedCount", "desc")`
    pub order: Vec<(String, String)>,
    pub created_at_since: Option<String>,
    pub updated_at_since: Option<String>,
    pub has_available_chapters: Option<bool>,
    pub group: Option<String>,
}
