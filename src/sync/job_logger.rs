use std::sync::Arc;

use serde::Serialize;
use serde_json::{Value, json};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::sync::Result;
use crate::sync::store::{JobStatus, JobType, LogLevel, SyncJobRecord, SyncLogRecord, SyncStore};

/// Handle for one sync job: appends leveled log rows tied to the job and
/// drives its RUNNING -> COMPLETED | FAILED | CANCELLED lifecycle.
///
/// Every log row is also mirrored to `tracing` at the matching severity;
/// that mirror is a convenience, the persisted rows are the record.
pub struct JobLogger {
    store: Arc<dyn SyncStore>,
    job_id: Uuid,
}

/// Job row plus its most recent log lines
#[derive(Debug, Clone, Serialize)]
pub struct JobStatusView {
    pub job: SyncJobRecord,
    pub logs: Vec<SyncLogRecord>,
}

impl JobLogger {
    /// Create a job row in RUNNING state and return its logger
    pub async fn create(store: Arc<dyn SyncStore>, job_type: JobType) -> Result<Self> {
        let job = store.create_job(job_type).await?;
        Ok(Self {
            store,
            job_id: job.id,
        })
    }

    #[must_use]
    pub const fn job_id(&self) -> Uuid {
        self.job_id
    }

    pub async fn log(
        &self,
        level: LogLevel,
        message: &str,
        details: Value,
    ) -> Result<()> {
        self.store
            .append_log(self.job_id, level, message, &details)
            .await?;

        match level {
            LogLevel::Debug => {
                debug!(job_id = %self.job_id, details = %details, "{message}");
            }
            LogLevel::Info => {
                info!(job_id = %self.job_id, details = %details, "{message}");
            }
            LogLevel::Warn => {
                warn!(job_id = %self.job_id, details = %details, "{message}");
            }
            LogLevel::Error => {
                error!(job_id = %self.job_id, details = %details, "{message}");
            }
        }

        Ok(())
    }

    pub async fn debug(&self, message: &str) -> Result<()> {
        self.log(LogLevel::Debug, message, json!({}))
            .await
    }

    pub async fn info(&self, message: &str) -> Result<()> {
        self.log(LogLevel::Info, message, json!({}))
            .await
    }

    pub async fn warn(&self, message: &str) -> Result<()> {
        self.log(LogLevel::Warn, message, json!({}))
            .await
    }

    pub async fn error(&self, message: &str) -> Result<()> {
        self.log(LogLevel::Error, message, json!({}))
            .await
    }

    pub async fn update_progress(&self, items_total: i32, items_synced: i32) -> Result<()> {
        self.store
            .update_job_progress(self.job_id, items_total, items_synced)
            .await
    }

    /// Mark the job COMPLETED or FAILED and write the closing log line
    pub async fn complete(&self, success: bool, error_msg: Option<&str>) -> Result<()> {
        let status = if success {
            JobStatus::Completed
        } else {
            JobStatus::Failed
        };
        self.store
            .finish_job(self.job_id, status, error_msg)
            .await?;

        if success {
            self.info("Job completed successfully").await
        } else {
            self.log(
                LogLevel::Error,
                "Job failed",
                json!({ "error": error_msg }),
            )
            .await
        }
    }

    /// Mark the job CANCELLED, recording the reason as its error message
    pub async fn cancel(&self, reason: Option<&str>) -> Result<()> {
        self.store
            .finish_job(
                self.job_id,
                JobStatus::Cancelled,
                Some(reason.unwrap_or("Job was cancelled")),
            )
            .await?;

        self.log(
            LogLevel::Warn,
            "Job cancelled",
            json!({ "reason": reason }),
        )
        .await
    }

    // Status queries

    /// One job with its last 10 log lines
    pub async fn job_status(
        store: &dyn SyncStore,
        job_id: Uuid,
    ) -> Result<Option<JobStatusView>> {
        let Some(job) = store.job(job_id).await? else {
            return Ok(None);
        };
        let logs = store.job_logs(job_id, 10).await?;
        Ok(Some(JobStatusView { job, logs }))
    }

    pub async fn running_jobs(store: &dyn SyncStore) -> Result<Vec<SyncJobRecord>> {
        store.running_jobs().await
    }

    pub async fn recent_jobs(store: &dyn SyncStore, limit: i64) -> Result<Vec<SyncJobRecord>> {
        store.recent_jobs(limit).await
    }
}
