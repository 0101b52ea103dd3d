use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// External content provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Provider {
    Tmdb,
    Jikan,
    MangaDex,
}

impl Provider {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Tmdb => "TMDB",
            Self::Jikan => "JIKAN",
            Self::MangaDex => "MANGADEX",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "TMDB" => Ok(Self::Tmdb),
            "JIKAN" => Ok(Self::Jikan),
            // "MANGADX" is a historical naming variant kept for old rows
            "MANGADEX" | "MANGADX" => Ok(Self::MangaDex),
            other => Err(format!("unknown provider type: {other}")),
        }
    }
}

/// Media classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MediaKind {
    Movie,
    Tv,
    Anime,
    Manga,
}

impl MediaKind {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Movie => "MOVIE",
            Self::Tv => "TV",
            Self::Anime => "ANIME",
            Self::Manga => "MANGA",
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MediaKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "MOVIE" => Ok(Self::Movie),
            "TV" => Ok(Self::Tv),
            "ANIME" => Ok(Self::Anime),
            "MANGA" => Ok(Self::Manga),
            other => Err(format!("unknown media type: {other}")),
        }
    }
}

/// Anime-specific fields carried alongside the canonical item
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnimeDetails {
    /// TV / Movie / OVA / ONA / Special
    pub subtype: Option<String>,
    pub episodes: Option<i32>,
    pub duration: Option<String>,
    pub season: Option<String>,
    pub airing: bool,
    pub airing_from: Option<String>,
    pub airing_to: Option<String>,
    pub studios: Vec<String>,
    pub rating: Option<String>,
}

/// Manga-specific fields carried alongside the canonical item
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MangaDetails {
    pub last_chapter: Option<String>,
    pub last_volume: Option<String>,
    pub content_rating: Option<String>,
    pub publication_demographic: Option<String>,
}

/// Unified item shape every provider normalizer produces
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizedMedia {
    /// Provider-native identifier; `(provider_id, provider)` is the upsert key
    pub provider_id: String,
    pub provider: Provider,
    pub kind: MediaKind,
    /// Preferred display title, English-first fallback chain
    pub title: String,
    /// Deduplicated alternate titles across translations and synonyms
    pub alt_titles: Vec<String>,
    pub synopsis: Option<String>,
    pub cover_image: Option<String>,
    pub backdrop_image: Option<String>,
    pub genres: Vec<String>,
    /// Provider-specific secondary classification (themes, demographics,
    /// non-genre tag groups)
    pub tags: Vec<String>,
    pub countries: Vec<String>,
    pub languages: Vec<String>,
    pub score: Option<f64>,
    pub popularity: Option<f64>,
    /// First-release year
    pub year: Option<i32>,
    pub status: Option<String>,
    pub adult: bool,
    pub anime: Option<AnimeDetails>,
    pub manga: Option<MangaDetails>,
}

impl NormalizedMedia {
    pub fn new(
        provider_id: impl Into<String>,
        provider: Provider,
        kind: MediaKind,
        title: impl Into<String>,
    ) -> Self {
        Self {
            provider_id: provider_id.into(),
            provider,
            kind,
            title: title.into(),
            alt_titles: Vec::new(),
            synopsis: None,
            cover_image: None,
            backdrop_image: None,
            genres: Vec::new(),
            tags: Vec::new(),
            countries: Vec::new(),
            languages: Vec::new(),
            score: None,
            popularity: None,
            year: None,
            status: None,
            adult: false,
            anime: None,
            manga: None,
        }
    }
}

/// Trim a string and drop it when empty
#[must_use]
pub fn normalize_string(value: Option<&str>) -> Option<String> {
    let trimmed = value?.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Deduplicate and trim a string list, preserving first-seen order
#[must_use]
pub fn unique_strings<I, S>(values: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for value in values {
        let normalized = value.as_ref().trim();
        if normalized.is_empty() {
            continue;
        }
        if seen.insert(normalized.to_string()) {
            out.push(normalized.to_string());
        }
    }
    out
}
