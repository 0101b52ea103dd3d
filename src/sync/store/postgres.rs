use async_trait::async_trait;
use serde_json::Value;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use super::{
    CategoryEntry, JobStatus, JobType, LogLevel, MediaCategoryRecord, MediaRecord, SyncJobRecord,
    SyncLogRecord, SyncStore,
};
use crate::sync::types::{MediaKind, NormalizedMedia, Provider};
use crate::sync::{Result, SyncError};

/// PostgreSQL-backed sync store
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const MEDIA_COLUMNS: &str = "id, provider_id, provider_type, media_type, title, alt_titles, \
     synopsis, cover_image, backdrop_image, genres, tags, countries, languages, score, year, \
     status, adult, created_at, updated_at";

fn media_from_row(row: &PgRow) -> Result<MediaRecord> {
    let provider: String = row.try_get("provider_type")?;
    let kind: String = row.try_get("media_type")?;

    Ok(MediaRecord {
        id: row.try_get("id")?,
        provider_id: row.try_get("provider_id")?,
        provider: provider.parse::<Provider>().map_err(SyncError::Parse)?,
        kind: kind.parse::<MediaKind>().map_err(SyncError::Parse)?,
        title: row.try_get("title")?,
        alt_titles: row.try_get("alt_titles")?,
        synopsis: row.try_get("synopsis")?,
        cover_image: row.try_get("cover_image")?,
        backdrop_image: row.try_get("backdrop_image")?,
        genres: row.try_get("genres")?,
        tags: row.try_get("tags")?,
        countries: row.try_get("countries")?,
        languages: row.try_get("languages")?,
        score: row.try_get("score")?,
        year: row.try_get("year")?,
        status: row.try_get("status")?,
        adult: row.try_get("adult")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn job_from_row(row: &PgRow) -> Result<SyncJobRecord> {
    let job_type: String = row.try_get("job_type")?;
    let status: String = row.try_get("status")?;

    Ok(SyncJobRecord {
        id: row.try_get("id")?,
        job_type: job_type.parse::<JobType>().map_err(SyncError::Parse)?,
        status: status.parse::<JobStatus>().map_err(SyncError::Parse)?,
        started_at: row.try_get("started_at")?,
        completed_at: row.try_get("completed_at")?,
        error_msg: row.try_get("error_msg")?,
        items_total: row.try_get("items_total")?,
        items_synced: row.try_get("items_synced")?,
    })
}

fn log_from_row(row: &PgRow) -> Result<SyncLogRecord> {
    let level: String = row.try_get("level")?;

    Ok(SyncLogRecord {
        job_id: row.try_get("job_id")?,
        level: level.parse::<LogLevel>().map_err(SyncError::Parse)?,
        message: row.try_get("message")?,
        details: row.try_get("details")?,
        created_at: row.try_get("created_at")?,
    })
}

#[async_trait]
impl SyncStore for PgStore {
    async fn upsert_media(&self, item: &NormalizedMedia) -> Result<MediaRecord> {
        let mut tx = self.pool.begin().await?;

        // Full replacement for title, array fields and the adult flag;
        // scalar optionals keep the previous value when the provider sent
        // nothing this time. The media_type and provider linkage columns are
        // fixed at creation.
        let row = sqlx::query(&format!(
            "INSERT INTO media (provider_id, provider_type, media_type, title, alt_titles, \
                 synopsis, cover_image, backdrop_image, genres, tags, countries, languages, \
                 score, year, status, adult) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16) \
             ON CONFLICT (provider_id, provider_type) DO UPDATE SET \
                 title = EXCLUDED.title, \
                 alt_titles = EXCLUDED.alt_titles, \
                 synopsis = COALESCE(EXCLUDED.synopsis, media.synopsis), \
                 cover_image = COALESCE(EXCLUDED.cover_image, media.cover_image), \
                 backdrop_image = COALESCE(EXCLUDED.backdrop_image, media.backdrop_image), \
                 genres = EXCLUDED.genres, \
                 tags = EXCLUDED.tags, \
                 countries = EXCLUDED.countries, \
                 languages = EXCLUDED.languages, \
                 score = COALESCE(EXCLUDED.score, media.score), \
                 year = COALESCE(EXCLUDED.year, media.year), \
                 status = COALESCE(EXCLUDED.status, media.status), \
                 adult = EXCLUDED.adult, \
                 updated_at = now() \
             RETURNING {MEDIA_COLUMNS}"
        ))
        .bind(&item.provider_id)
        .bind(item.provider.as_str())
        .bind(item.kind.as_str())
        .bind(&item.title)
        .bind(&item.alt_titles)
        .bind(&item.synopsis)
        .bind(&item.cover_image)
        .bind(&item.backdrop_image)
        .bind(&item.genres)
        .bind(&item.tags)
        .bind(&item.countries)
        .bind(&item.languages)
        .bind(item.score)
        .bind(item.year)
        .bind(&item.status)
        .bind(item.adult)
        .fetch_one(&mut *tx)
        .await?;

        let media = media_from_row(&row)?;

        match item.kind {
            MediaKind::Anime => {
                let anime = item.anime.clone().unwrap_or_default();
                sqlx::query(
                    "INSERT INTO anime_data (media_id, subtype, episodes, duration, season, \
                         airing, airing_from, airing_to, studios, rating) \
                     VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
                     ON CONFLICT (media_id) DO UPDATE SET \
                         subtype = COALESCE(EXCLUDED.subtype, anime_data.subtype), \
                         episodes = COALESCE(EXCLUDED.episodes, anime_data.episodes), \
                         duration = COALESCE(EXCLUDED.duration, anime_data.duration), \
                         season = COALESCE(EXCLUDED.season, anime_data.season), \
                         airing = EXCLUDED.airing, \
                         airing_from = COALESCE(EXCLUDED.airing_from, anime_data.airing_from), \
                         airing_to = COALESCE(EXCLUDED.airing_to, anime_data.airing_to), \
                         studios = EXCLUDED.studios, \
                         rating = COALESCE(EXCLUDED.rating, anime_data.rating)",
                )
                .bind(media.id)
                .bind(&anime.subtype)
                .bind(anime.episodes)
                .bind(&anime.duration)
                .bind(&anime.season)
                .bind(anime.airing)
                .bind(&anime.airing_from)
                .bind(&anime.airing_to)
                .bind(&anime.studios)
                .bind(&anime.rating)
                .execute(&mut *tx)
                .await?;
            }
            MediaKind::Manga => {
                let manga = item.manga.clone().unwrap_or_default();
                sqlx::query(
                    "INSERT INTO manga_data (media_id, last_chapter, last_volume, \
                         content_rating, publication_demographic) \
                     VALUES ($1, $2, $3, $4, $5) \
                     ON CONFLICT (media_id) DO UPDATE SET \
                         last_chapter = COALESCE(EXCLUDED.last_chapter, manga_data.last_chapter), \
                         last_volume = COALESCE(EXCLUDED.last_volume, manga_data.last_volume), \
                         content_rating = COALESCE(EXCLUDED.content_rating, manga_data.content_rating), \
                         publication_demographic = COALESCE(EXCLUDED.publication_demographic, \
                             manga_data.publication_demographic)",
                )
                .bind(media.id)
                .bind(&manga.last_chapter)
                .bind(&manga.last_volume)
                .bind(&manga.content_rating)
                .bind(&manga.publication_demographic)
                .execute(&mut *tx)
                .await?;
            }
            MediaKind::Movie | MediaKind::Tv => {}
        }

        tx.commit().await?;
        Ok(media)
    }

    async fn replace_category(
        &self,
        category_title: &str,
        entries: &[CategoryEntry],
    ) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM media_categories WHERE category_title = $1")
            .bind(category_title)
            .execute(&mut *tx)
            .await?;

        if !entries.is_empty() {
            let media_ids: Vec<Uuid> = entries.iter().map(|e| e.media_id).collect();
            let positions: Vec<i32> = entries.iter().map(|e| e.position).collect();

            sqlx::query(
                "INSERT INTO media_categories (media_id, category_title, position) \
                 SELECT media_id, $2, position \
                 FROM UNNEST($1::uuid[], $3::int[]) AS t(media_id, position)",
            )
            .bind(&media_ids)
            .bind(category_title)
            .bind(&positions)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn category_members(&self, category_title: &str) -> Result<Vec<MediaCategoryRecord>> {
        let rows = sqlx::query(
            "SELECT media_id, category_title, position FROM media_categories \
             WHERE category_title = $1 ORDER BY position ASC",
        )
        .bind(category_title)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                Ok(MediaCategoryRecord {
                    media_id: row.try_get("media_id")?,
                    category_title: row.try_get("category_title")?,
                    position: row.try_get("position")?,
                })
            })
            .collect()
    }

    async fn create_job(&self, job_type: JobType) -> Result<SyncJobRecord> {
        let row = sqlx::query(
            "INSERT INTO sync_jobs (job_type, status) VALUES ($1, $2) \
             RETURNING id, job_type, status, started_at, completed_at, error_msg, \
                 items_total, items_synced",
        )
        .bind(job_type.as_str())
        .bind(JobStatus::Running.as_str())
        .fetch_one(&self.pool)
        .await?;

        job_from_row(&row)
    }

    async fn append_log(
        &self,
        job_id: Uuid,
        level: LogLevel,
        message: &str,
        details: &Value,
    ) -> Result<()> {
        sqlx::query(
            "INSERT INTO sync_logs (job_id, level, message, details) VALUES ($1, $2, $3, $4)",
        )
        .bind(job_id)
        .bind(level.as_str())
        .bind(message)
        .bind(details)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn update_job_progress(&self, job_id: Uuid, total: i32, synced: i32) -> Result<()> {
        sqlx::query("UPDATE sync_jobs SET items_total = $2, items_synced = $3 WHERE id = $1")
            .bind(job_id)
            .bind(total)
            .bind(synced)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn finish_job(
        &self,
        job_id: Uuid,
        status: JobStatus,
        error_msg: Option<&str>,
    ) -> Result<()> {
        // Terminal states are final; only a RUNNING job transitions
        sqlx::query(
            "UPDATE sync_jobs SET status = $2, completed_at = now(), error_msg = $3 \
             WHERE id = $1 AND status = $4",
        )
        .bind(job_id)
        .bind(status.as_str())
        .bind(error_msg)
        .bind(JobStatus::Running.as_str())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn job(&self, job_id: Uuid) -> Result<Option<SyncJobRecord>> {
        let row = sqlx::query(
            "SELECT id, job_type, status, started_at, completed_at, error_msg, items_total, \
                 items_synced \
             FROM sync_jobs WHERE id = $1",
        )
        .bind(job_id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(job_from_row).transpose()
    }

    async fn job_logs(&self, job_id: Uuid, limit: i64) -> Result<Vec<SyncLogRecord>> {
        let rows = sqlx::query(
            "SELECT job_id, level, message, details, created_at FROM sync_logs \
             WHERE job_id = $1 ORDER BY created_at DESC LIMIT $2",
        )
        .bind(job_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(log_from_row).collect()
    }

    async fn running_jobs(&self) -> Result<Vec<SyncJobRecord>> {
        let rows = sqlx::query(
            "SELECT id, job_type, status, started_at, completed_at, error_msg, items_total, \
                 items_synced \
             FROM sync_jobs WHERE status = $1 ORDER BY started_at DESC",
        )
        .bind(JobStatus::Running.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(job_from_row).collect()
    }

    async fn recent_jobs(&self, limit: i64) -> Result<Vec<SyncJobRecord>> {
        let rows = sqlx::query(
            "SELECT id, job_type, status, started_at, completed_at, error_msg, items_total, \
                 items_synced \
             FROM sync_jobs ORDER BY started_at DESC LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(job_from_row).collect()
    }
}
