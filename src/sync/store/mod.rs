mod postgres;

pub use postgres::PgStore;

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use crate::sync::Result;
use crate::sync::types::{MediaKind, NormalizedMedia, Provider};

/// Sync job kinds, one per orchestrator entry point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum JobType {
    TrendingSync,
    PopularSync,
    TopRatedSync,
    DramasSync,
    UpcomingSync,
}

impl JobType {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::TrendingSync => "TRENDING_SYNC",
            Self::PopularSync => "POPULAR_SYNC",
            Self::TopRatedSync => "TOP_RATED_SYNC",
            Self::DramasSync => "DRAMAS_SYNC",
            Self::UpcomingSync => "UPCOMING_SYNC",
        }
    }
}

impl fmt::Display for JobType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "TRENDING_SYNC" => Ok(Self::TrendingSync),
            "POPULAR_SYNC" => Ok(Self::PopularSync),
            "TOP_RATED_SYNC" => Ok(Self::TopRatedSync),
            "DRAMAS_SYNC" => Ok(Self::DramasSync),
            "UPCOMING_SYNC" => Ok(Self::UpcomingSync),
            other => Err(format!("unknown job type: {other}")),
        }
    }
}

/// Job lifecycle: RUNNING is the only non-terminal state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum JobStatus {
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl JobStatus {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Running => "RUNNING",
            Self::Completed => "COMPLETED",
            Self::Failed => "FAILED",
            Self::Cancelled => "CANCELLED",
        }
    }

    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        !matches!(self, Self::Running)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "RUNNING" => Ok(Self::Running),
            "COMPLETED" => Ok(Self::Completed),
            "FAILED" => Ok(Self::Failed),
            "CANCELLED" => Ok(Self::Cancelled),
            other => Err(format!("unknown job status: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Warn => "WARN",
            Self::Error => "ERROR",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "DEBUG" => Ok(Self::Debug),
            "INFO" => Ok(Self::Info),
            "WARN" => Ok(Self::Warn),
            "ERROR" => Ok(Self::Error),
            other => Err(format!("unknown log level: {other}")),
        }
    }
}

/// Canonical media row, one per `(provider_id, provider)`
#[derive(Debug, Clone, Serialize)]
pub struct MediaRecord {
    pub id: Uuid,
    pub provider_id: String,
    pub provider: Provider,
    pub kind: MediaKind,
    pub title: String,
    pub alt_titles: Vec<String>,
    pub synopsis: Option<String>,
    pub cover_image: Option<String>,
    pub backdrop_image: Option<String>,
    pub genres: Vec<String>,
    pub tags: Vec<String>,
    pub countries: Vec<String>,
    pub languages: Vec<String>,
    pub score: Option<f64>,
    pub year: Option<i32>,
    pub status: Option<String>,
    pub adult: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Membership row to write for one category slot
#[derive(Debug, Clone)]
pub struct CategoryEntry {
    pub media_id: Uuid,
    pub position: i32,
}

/// Persisted category membership row
#[derive(Debug, Clone, Serialize)]
pub struct MediaCategoryRecord {
    pub media_id: Uuid,
    pub category_title: String,
    pub position: i32,
}

#[derive(Debug, Clone, Serialize)]
pub struct SyncJobRecord {
    pub id: Uuid,
    pub job_type: JobType,
    pub status: JobStatus,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub error_msg: Option<String>,
    pub items_total: Option<i32>,
    pub items_synced: Option<i32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SyncLogRecord {
    pub job_id: Uuid,
    pub level: LogLevel,
    pub message: String,
    pub details: Value,
    pub created_at: DateTime<Utc>,
}

/// Write store consumed by the sync pipeline: natural-key media upsert,
/// transactional category replacement, and job/log rows.
#[async_trait]
pub trait SyncStore: Send + Sync {
    /// Upsert the canonical row by `(provider_id, provider)` together with
    /// its anime/manga extension row in one transaction. Array-valued
    /// fields are fully replaced on update.
    async fn upsert_media(&self, item: &NormalizedMedia) -> Result<MediaRecord>;

    /// Replace the whole membership set of a category in one transaction
    async fn replace_category(
        &self,
        category_title: &str,
        entries: &[CategoryEntry],
    ) -> Result<()>;

    /// Current membership of a category ordered by position
    async fn category_members(&self, category_title: &str) -> Result<Vec<MediaCategoryRecord>>;

    async fn create_job(&self, job_type: JobType) -> Result<SyncJobRecord>;

    /// Append one log row; rows are never mutated afterwards
    async fn append_log(
        &self,
        job_id: Uuid,
        level: LogLevel,
        message: &str,
        details: &Value,
    ) -> Result<()>;

    async fn update_job_progress(&self, job_id: Uuid, total: i32, synced: i32) -> Result<()>;

    /// Move a RUNNING job into a terminal state; a job already terminal is
    /// left untouched
    async fn finish_job(
        &self,
        job_id: Uuid,
        status: JobStatus,
        error_msg: Option<&str>,
    ) -> Result<()>;

    async fn job(&self, job_id: Uuid) -> Result<Option<SyncJobRecord>>;

    /// Most recent log rows for a job, newest first
    async fn job_logs(&self, job_id: Uuid, limit: i64) -> Result<Vec<SyncLogRecord>>;

    async fn running_jobs(&self) -> Result<Vec<SyncJobRecord>>;

    async fn recent_jobs(&self, limit: i64) -> Result<Vec<SyncJobRecord>>;
}
