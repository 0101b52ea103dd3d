use std::collections::HashSet;

use serde::Deserialize;

use crate::sync::types::Provider;

/// Fixed-window request budget for one provider
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ProviderLimit {
    /// Requests allowed per window
    pub requests: u32,
    /// Window length in milliseconds
    pub window_ms: u64,
}

/// Per-provider request budgets
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct RateLimits {
    pub tmdb: ProviderLimit,
    pub jikan: ProviderLimit,
    pub mangadex: ProviderLimit,
}

impl RateLimits {
    #[must_use]
    pub const fn for_provider(&self, provider: Provider) -> ProviderLimit {
        match provider {
            Provider::Tmdb => self.tmdb,
            Provider::Jikan => self.jikan,
            Provider::MangaDex => self.mangadex,
        }
    }
}

impl Default for RateLimits {
    fn default() -> Self {
        // Conservative budgets for the public APIs
        Self {
            tmdb: ProviderLimit {
                requests: 5,
                window_ms: 1000,
            },
            jikan: ProviderLimit {
                requests: 2,
                window_ms: 1000,
            },
            mangadex: ProviderLimit {
                requests: 2,
                window_ms: 1000,
            },
        }
    }
}

/// Retry policy applied by the HTTP client
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetryOptions {
    /// Additional attempts after the first request
    pub attempts: u32,
    /// Base backoff in milliseconds; doubled on every retry
    pub backoff_ms: u64,
    /// Response statuses worth retrying
    pub retry_on_status: HashSet<u16>,
}

impl Default for RetryOptions {
    fn default() -> Self {
        Self {
            attempts: 2,
            backoff_ms: 250,
            retry_on_status: [408, 425, 429, 500, 502, 503, 504].into_iter().collect(),
        }
    }
}

/// Retention windows consumed by the external cleanup job
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct RetentionConfig {
    pub category_days: u32,
    pub log_days: u32,
    pub job_days: u32,
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            category_days: 7,
            log_days: 30,
            job_days: 90,
        }
    }
}

/// Category sync configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Maximum items persisted per category listing
    pub items_per_category: usize,
    pub rate_limits: RateLimits,
    pub retry: RetryOptions,
    pub retention: RetentionConfig,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            items_per_category: 25,
            rate_limits: RateLimits::default(),
            retry: RetryOptions::default(),
            retention: RetentionConfig::default(),
        }
    }
}
