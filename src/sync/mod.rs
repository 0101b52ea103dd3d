mod category_sync;
mod config;
mod http;
mod job_logger;
mod media_upsert;
pub mod provider;
mod rate_limit;
pub mod store;
mod types;

#[cfg(test)]
mod tests;

pub use category_sync::{CategorySyncService, SyncOutcome};
pub use config::{ProviderLimit, RateLimits, RetentionConfig, RetryOptions, SyncConfig};
pub use http::HttpClient;
pub use job_logger::{JobLogger, JobStatusView};
pub use media_upsert::insert_media;
pub use provider::{
    JikanClient, MangaDexClient, OffsetPage, Paginated, Providers, TmdbClient,
};
pub use rate_limit::RateLimiter;
pub use types::{AnimeDetails, MangaDetails, MediaKind, NormalizedMedia, Provider};

/// Sync pipeline result type
pub type Result<T> = std::result::Result<T, SyncError>;

/// Sync pipeline error types
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Invalid media item: {0}")]
    InvalidItem(String),

    #[error("Configuration error: {0}")]
    Config(String),
}
