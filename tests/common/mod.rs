//! In-memory `SyncStore` used by the integration tests

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use uuid::Uuid;

use cinedex::sync::Result;
use cinedex::sync::store::{
    CategoryEntry, JobStatus, JobType, LogLevel, MediaCategoryRecord, MediaRecord, SyncJobRecord,
    SyncLogRecord, SyncStore,
};
use cinedex::sync::{AnimeDetails, MangaDetails, MediaKind, NormalizedMedia};

#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    media: Vec<MediaRecord>,
    anime: HashMap<Uuid, AnimeDetails>,
    manga: HashMap<Uuid, MangaDetails>,
    categories: Vec<MediaCategoryRecord>,
    jobs: Vec<SyncJobRecord>,
    logs: Vec<SyncLogRecord>,
}

#[allow(dead_code)]
impl MemoryStore {
    pub fn media_len(&self) -> usize {
        self.inner.lock().unwrap().media.len()
    }

    pub fn media_by_id(&self, id: Uuid) -> Option<MediaRecord> {
        self.inner
            .lock()
            .unwrap()
            .media
            .iter()
            .find(|m| m.id == id)
            .cloned()
    }

    pub fn anime_details(&self, media_id: Uuid) -> Option<AnimeDetails> {
        self.inner.lock().unwrap().anime.get(&media_id).cloned()
    }

    pub fn manga_details(&self, media_id: Uuid) -> Option<MangaDetails> {
        self.inner.lock().unwrap().manga.get(&media_id).cloned()
    }
}

#[async_trait]
impl SyncStore for MemoryStore {
    async fn upsert_media(&self, item: &NormalizedMedia) -> Result<MediaRecord> {
        let mut inner = self.inner.lock().unwrap();
        let now = Utc::now();

        let existing = inner
            .media
            .iter()
            .position(|m| m.provider_id == item.provider_id && m.provider == item.provider);

        let record = if let Some(index) = existing {
            let media = &mut inner.media[index];
            media.title = item.title.clone();
            media.alt_titles = item.alt_titles.clone();
            media.genres = item.genres.clone();
            media.tags = item.tags.clone();
            media.countries = item.countries.clone();
            media.languages = item.languages.clone();
            media.adult = item.adult;
            if item.synopsis.is_some() {
                media.synopsis = item.synopsis.clone();
            }
            if item.cover_image.is_some() {
                media.cover_image = item.cover_image.clone();
            }
            if item.backdrop_image.is_some() {
                media.backdrop_image = item.backdrop_image.clone();
            }
            if item.score.is_some() {
                media.score = item.score;
            }
            if item.year.is_some() {
                media.year = item.year;
            }
            if item.status.is_some() {
                media.status = item.status.clone();
            }
            media.updated_at = now;
            media.clone()
        } else {
            let record = MediaRecord {
                id: Uuid::new_v4(),
                provider_id: item.provider_id.clone(),
                provider: item.provider,
                kind: item.kind,
                title: item.title.clone(),
                alt_titles: item.alt_titles.clone(),
                synopsis: item.synopsis.clone(),
                cover_image: item.cover_image.clone(),
                backdrop_image: item.backdrop_image.clone(),
                genres: item.genres.clone(),
                tags: item.tags.clone(),
                countries: item.countries.clone(),
                languages: item.languages.clone(),
                score: item.score,
                year: item.year,
                status: item.status.clone(),
                adult: item.adult,
                created_at: now,
                updated_at: now,
            };
            inner.media.push(record.clone());
            record
        };

        match item.kind {
            MediaKind::Anime => {
                inner
                    .anime
                    .insert(record.id, item.anime.clone().unwrap_or_default());
            }
            MediaKind::Manga => {
                inner
                    .manga
                    .insert(record.id, item.manga.clone().unwrap_or_default());
            }
            MediaKind::Movie | MediaKind::Tv => {}
        }

        Ok(record)
    }

    async fn replace_category(
        &self,
        category_title: &str,
        entries: &[CategoryEntry],
    ) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.categories.retain(|c| c.category_title != category_title);
        inner.categories.extend(entries.iter().map(|e| MediaCategoryRecord {
            media_id: e.media_id,
            category_title: category_title.to_string(),
            position: e.position,
        }));
        Ok(())
    }

    async fn category_members(&self, category_title: &str) -> Result<Vec<MediaCategoryRecord>> {
        let inner = self.inner.lock().unwrap();
        let mut members: Vec<MediaCategoryRecord> = inner
            .categories
            .iter()
            .filter(|c| c.category_title == category_title)
            .cloned()
            .collect();
        members.sort_by_key(|c| c.position);
        Ok(members)
    }

    async fn create_job(&self, job_type: JobType) -> Result<SyncJobRecord> {
        let mut inner = self.inner.lock().unwrap();
        let job = SyncJobRecord {
            id: Uuid::new_v4(),
            job_type,
            status: JobStatus::Running,
            started_at: Utc::now(),
            completed_at: None,
            error_msg: None,
            items_total: None,
            items_synced: None,
        };
        inner.jobs.push(job.clone());
        Ok(job)
    }

    async fn append_log(
        &self,
        job_id: Uuid,
        level: LogLevel,
        message: &str,
        details: &Value,
    ) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.logs.push(SyncLogRecord {
            job_id,
            level,
            message: message.to_string(),
            details: details.clone(),
            created_at: Utc::now(),
        });
        Ok(())
    }

    async fn update_job_progress(&self, job_id: Uuid, total: i32, synced: i32) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(job) = inner.jobs.iter_mut().find(|j| j.id == job_id) {
            job.items_total = Some(total);
            job.items_synced = Some(synced);
        }
        Ok(())
    }

    async fn finish_job(
        &self,
        job_id: Uuid,
        status: JobStatus,
        error_msg: Option<&str>,
    ) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(job) = inner
            .jobs
            .iter_mut()
            .find(|j| j.id == job_id && j.status == JobStatus::Running)
        {
            job.status = status;
            job.completed_at = Some(Utc::now());
            job.error_msg = error_msg.map(str::to_string);
        }
        Ok(())
    }

    async fn job(&self, job_id: Uuid) -> Result<Option<SyncJobRecord>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.jobs.iter().find(|j| j.id == job_id).cloned())
    }

    async fn job_logs(&self, job_id: Uuid, limit: i64) -> Result<Vec<SyncLogRecord>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .logs
            .iter()
            .filter(|l| l.job_id == job_id)
            .rev()
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn running_jobs(&self) -> Result<Vec<SyncJobRecord>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .jobs
            .iter()
            .filter(|j| j.status == JobStatus::Running)
            .cloned()
            .collect())
    }

    async fn recent_jobs(&self, limit: i64) -> Result<Vec<SyncJobRecord>> {
        let inner = self.inner.lock().unwrap();
        let mut jobs: Vec<SyncJobRecord> = inner.jobs.clone();
        jobs.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        jobs.truncate(limit as usize);
        Ok(jobs)
    }
}
