pub mod jikan;
pub mod mangadex;
pub mod tmdb;

pub use jikan::JikanClient;
pub use mangadex::MangaDexClient;
pub use tmdb::TmdbClient;

use serde::Serialize;

use crate::sync::config::RetryOptions;

/// Page-numbered result set (TMDB, Jikan)
#[derive(Debug, Clone, Serialize)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub page: i32,
    pub total_pages: i32,
    pub total_results: i64,
}

/// Offset-based result set (MangaDex)
#[derive(Debug, Clone, Serialize)]
pub struct OffsetPage<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub has_more: bool,
}

/// The three provider clients bundled for the orchestrator and the search
/// passthrough
pub struct Providers {
    pub tmdb: TmdbClient,
    pub jikan: JikanClient,
    pub mangadex: MangaDexClient,
}

impl Providers {
    #[must_use]
    pub fn new(tmdb_bearer_token: &str, retry: RetryOptions) -> Self {
        Self {
            tmdb: TmdbClient::new(tmdb_bearer_token, retry.clone()),
            jikan: JikanClient::new(retry.clone()),
            mangadex: MangaDexClient::new(retry),
        }
    }
}

/// Push `key=value` when a value is present and non-empty
pub(crate) fn push_param<T: ToString>(
    params: &mut Vec<(String, String)>,
    key: &str,
    value: Option<T>,
) {
    if let Some(value) = value {
        let rendered = value.to_string();
        if !rendered.is_empty() {
            params.push((key.to_string(), rendered));
        }
    }
}
