use std::sync::Arc;

use serde::Serialize;
use serde_json::json;
use uuid::Uuid;

use crate::sync::Result;
use crate::sync::config::SyncConfig;
use crate::sync::job_logger::JobLogger;
use crate::sync::media_upsert::insert_media;
use crate::sync::provider::Providers;
use crate::sync::rate_limit::RateLimiter;
use crate::sync::store::{CategoryEntry, JobType, LogLevel, SyncStore};
use crate::sync::types::{NormalizedMedia, Provider};

/// Result reported to the trigger endpoints; sync methods convert every
/// run-level failure into this instead of erroring
#[derive(Debug, Clone, Serialize)]
pub struct SyncOutcome {
    pub success: bool,
    pub job_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SyncOutcome {
    const fn ok(job_id: Uuid) -> Self {
        Self {
            success: true,
            job_id,
            error: None,
        }
    }

    const fn failed(job_id: Uuid, error: String) -> Self {
        Self {
            success: false,
            job_id,
            error: Some(error),
        }
    }
}

/// Populates ranked category listings from the three providers.
///
/// Provider calls run strictly one at a time behind the shared rate
/// limiter; running them concurrently would race a single window counter
/// past its budget.
pub struct CategorySyncService {
    providers: Arc<Providers>,
    store: Arc<dyn SyncStore>,
    limiter: RateLimiter,
    config: SyncConfig,
}

impl CategorySyncService {
    #[must_use]
    pub fn new(providers: Arc<Providers>, store: Arc<dyn SyncStore>, config: SyncConfig) -> Self {
        let limiter = RateLimiter::new(config.rate_limits);
        Self {
            providers,
            store,
            limiter,
            config,
        }
    }

    pub async fn sync_trending(&self) -> Result<SyncOutcome> {
        self.run(JobType::TrendingSync).await
    }

    pub async fn sync_popular(&self) -> Result<SyncOutcome> {
        self.run(JobType::PopularSync).await
    }

    pub async fn sync_top_rated(&self) -> Result<SyncOutcome> {
        self.run(JobType::TopRatedSync).await
    }

    pub async fn sync_dramas(&self) -> Result<SyncOutcome> {
        self.run(JobType::DramasSync).await
    }

    pub async fn sync_upcoming(&self) -> Result<SyncOutcome> {
        self.run(JobType::UpcomingSync).await
    }

    /// Shared job wrapper: create the job, run the kind, convert any
    /// uncaught error into a FAILED job and a structured outcome.
    async fn run(&self, job_type: JobType) -> Result<SyncOutcome> {
        let logger = JobLogger::create(self.store.clone(), job_type).await?;
        let job_id = logger.job_id();

        let result = match job_type {
            JobType::TrendingSync => self.run_trending(&logger).await,
            JobType::PopularSync => self.run_popular(&logger).await,
            JobType::TopRatedSync => self.run_top_rated(&logger).await,
            JobType::DramasSync => self.run_dramas(&logger).await,
            JobType::UpcomingSync => self.run_upcoming(&logger).await,
        };

        match result {
            Ok(()) => {
                logger.complete(true, None).await?;
                Ok(SyncOutcome::ok(job_id))
            }
            Err(err) => {
                let message = err.to_string();
                logger.complete(false, Some(&message)).await?;
                Ok(SyncOutcome::failed(job_id, message))
            }
        }
    }

    async fn run_trending(&self, logger: &JobLogger) -> Result<()> {
        logger.info("Starting trending sync").await?;

        self.limiter.check(Provider::Tmdb).await;
        let mut movies = self.providers.tmdb.trending_movies(1).await?;

        self.limiter.check(Provider::Tmdb).await;
        let mut tv = self.providers.tmdb.trending_tv(1).await?;

        self.limiter.check(Provider::Jikan).await;
        let mut anime = self.providers.jikan.trending_anime(1).await?;

        self.limiter.check(Provider::Jikan).await;
        let mut anime_movies = self.providers.jikan.popular_anime_movies(1).await?;

        self.limiter.check(Provider::MangaDex).await;
        let mut manga = self.providers.mangadex.trending_manga(25, 0).await?;

        self.limiter.check(Provider::MangaDex).await;
        let mut manhwa = self.providers.mangadex.popular_manhwa(25, 0).await?;

        self.limiter.check(Provider::MangaDex).await;
        let mut manhua = self.providers.mangadex.popular_manhua(25, 0).await?;

        let limit = self.config.items_per_category;
        movies.truncate(limit);
        tv.truncate(limit);
        anime.truncate(limit);
        anime_movies.truncate(limit);
        manga.truncate(limit);
        manhwa.truncate(limit);
        manhua.truncate(limit);

        self.update_category("trending_movies", &movies, logger).await?;
        self.update_category("trending_tv", &tv, logger).await?;
        self.update_category("trending_anime", &anime, logger).await?;
        self.update_category("trending_anime_movies", &anime_movies, logger)
            .await?;
        self.update_category("trending_manga", &manga, logger).await?;
        self.update_category("trending_manhwa", &manhwa, logger).await?;
        self.update_category("trending_manhua", &manhua, logger).await?;

        Ok(())
    }

    async fn run_popular(&self, logger: &JobLogger) -> Result<()> {
        logger.info("Starting popular sync").await?;

        self.limiter.check(Provider::Tmdb).await;
        let mut movies = self.providers.tmdb.popular_movies(1).await?;

        self.limiter.check(Provider::Tmdb).await;
        let mut tv = self.providers.tmdb.popular_tv(1).await?;

        self.limiter.check(Provider::Jikan).await;
        let mut anime = self.providers.jikan.popular_anime(1).await?;

        self.limiter.check(Provider::Jikan).await;
        let mut anime_movies = self.providers.jikan.popular_anime_movies(1).await?;

        self.limiter.check(Provider::MangaDex).await;
        let mut manga = self.providers.mangadex.popular_manga(25, 0).await?;

        self.limiter.check(Provider::MangaDex).await;
        let mut manhwa = self.providers.mangadex.popular_manhwa(25, 0).await?;

        self.limiter.check(Provider::MangaDex).await;
        let mut manhua = self.providers.mangadex.popular_manhua(25, 0).await?;

        let limit = self.config.items_per_category;
        movies.truncate(limit);
        tv.truncate(limit);
        anime.truncate(limit);
        anime_movies.truncate(limit);
        manga.truncate(limit);
        manhwa.truncate(limit);
        manhua.truncate(limit);

        self.update_category("popular_movies", &movies, logger).await?;
        self.update_category("popular_tv", &tv, logger).await?;
        self.update_category("popular_anime", &anime, logger).await?;
        self.update_category("popular_anime_movies", &anime_movies, logger)
            .await?;
        self.update_category("popular_manga", &manga, logger).await?;
        self.update_category("popular_manhwa", &manhwa, logger).await?;
        self.update_category("popular_manhua", &manhua, logger).await?;

        Ok(())
    }

    async fn run_top_rated(&self, logger: &JobLogger) -> Result<()> {
        logger.info("Starting top rated sync").await?;

        self.limiter.check(Provider::Tmdb).await;
        let mut movies = self.providers.tmdb.top_rated_movies(1).await?;

        self.limiter.check(Provider::Tmdb).await;
        let mut tv = self.providers.tmdb.top_rated_tv(1).await?;

        self.limiter.check(Provider::Jikan).await;
        let mut anime = self.providers.jikan.top_anime(1, None, None).await?;

        self.limiter.check(Provider::Jikan).await;
        let mut anime_movies = self.providers.jikan.top_anime_by_type("movie", 1).await?;

        self.limiter.check(Provider::Jikan).await;
        let mut current_season = self.providers.jikan.seasonal_anime(None, None, 1).await?;

        self.limiter.check(Provider::MangaDex).await;
        let mut manga = self.providers.mangadex.top_rated_manga(25, 0).await?;

        self.limiter.check(Provider::MangaDex).await;
        let mut manhwa = self.providers.mangadex.top_rated_manhwa(25, 0).await?;

        self.limiter.check(Provider::MangaDex).await;
        let mut manhua = self.providers.mangadex.top_rated_manhua(25, 0).await?;

        let limit = self.config.items_per_category;
        movies.truncate(limit);
        tv.truncate(limit);
        anime.truncate(limit);
        anime_movies.truncate(limit);
        current_season.truncate(limit);
        manga.truncate(limit);
        manhwa.truncate(limit);
        manhua.truncate(limit);

        self.update_category("top_rated_movies", &movies, logger).await?;
        self.update_category("top_rated_tv", &tv, logger).await?;
        self.update_category("top_rated_anime", &anime, logger).await?;
        self.update_category("top_rated_anime_movies", &anime_movies, logger)
            .await?;
        self.update_category("current_season_anime", &current_season, logger)
            .await?;
        self.update_category("top_rated_manga", &manga, logger).await?;
        self.update_category("top_rated_manhwa", &manhwa, logger).await?;
        self.update_category("top_rated_manhua", &manhua, logger).await?;

        Ok(())
    }

    async fn run_dramas(&self, logger: &JobLogger) -> Result<()> {
        logger.info("Starting dramas sync").await?;

        self.limiter.check(Provider::Tmdb).await;
        let mut kdramas = self.providers.tmdb.kdramas(1).await?;

        self.limiter.check(Provider::Tmdb).await;
        let mut cdramas = self.providers.tmdb.cdramas(1).await?;

        self.limiter.check(Provider::Tmdb).await;
        let mut jdramas = self.providers.tmdb.jdramas(1).await?;

        self.limiter.check(Provider::Tmdb).await;
        let mut thai_dramas = self.providers.tmdb.thai_dramas(1).await?;

        self.limiter.check(Provider::Tmdb).await;
        let mut indian_tv = self.providers.tmdb.indian_tv(1).await?;

        let limit = self.config.items_per_category;
        kdramas.truncate(limit);
        cdramas.truncate(limit);
        jdramas.truncate(limit);
        thai_dramas.truncate(limit);
        indian_tv.truncate(limit);

        self.update_category("popular_kdrama", &kdramas, logger).await?;
        self.update_category("popular_cdrama", &cdramas, logger).await?;
        self.update_category("popular_jdrama", &jdramas, logger).await?;
        self.update_category("popular_thai_drama", &thai_dramas, logger)
            .await?;
        self.update_category("popular_indian_tv", &indian_tv, logger)
            .await?;

        Ok(())
    }

    async fn run_upcoming(&self, logger: &JobLogger) -> Result<()> {
        logger.info("Starting upcoming sync").await?;

        self.limiter.check(Provider::Tmdb).await;
        let mut upcoming_movies = self.providers.tmdb.upcoming_movies(1).await?;

        self.limiter.check(Provider::Tmdb).await;
        let mut in_theaters = self.providers.tmdb.now_playing_movies(1).await?;

        self.limiter.check(Provider::Jikan).await;
        let mut upcoming_anime = self.providers.jikan.upcoming_anime(1).await?;

        self.limiter.check(Provider::Jikan).await;
        let mut next_season = self.providers.jikan.next_season_anime(1).await?;

        let limit = self.config.items_per_category;
        upcoming_movies.truncate(limit);
        in_theaters.truncate(limit);
        upcoming_anime.truncate(limit);
        next_season.truncate(limit);

        self.update_category("upcoming_movies", &upcoming_movies, logger)
            .await?;
        self.update_category("in_theaters_movies", &in_theaters, logger)
            .await?;
        self.update_category("upcoming_anime", &upcoming_anime, logger)
            .await?;
        self.update_category("next_season_anime", &next_season, logger)
            .await?;

        Ok(())
    }

    /// Replace one category's membership with the given items.
    ///
    /// Items are upserted in input order; a failing item is logged and
    /// skipped without aborting the category, and the surviving rows get
    /// dense 1-based positions. The membership swap itself happens in one
    /// transaction inside the store.
    async fn update_category(
        &self,
        category_title: &str,
        items: &[NormalizedMedia],
        logger: &JobLogger,
    ) -> Result<()> {
        logger
            .info(&format!(
                "Updating category: {category_title} with {} items",
                items.len()
            ))
            .await?;

        let mut entries: Vec<CategoryEntry> = Vec::with_capacity(items.len());
        for (index, item) in items.iter().enumerate() {
            match insert_media(self.store.as_ref(), item).await {
                Ok(media) => entries.push(CategoryEntry {
                    media_id: media.id,
                    position: entries.len() as i32 + 1,
                }),
                Err(err) => {
                    let details = json!({
                        "error": err.to_string(),
                        "providerId": item.provider_id,
                        "title": item.title,
                    });
                    logger
                        .log(
                            LogLevel::Warn,
                            &format!(
                                "Failed inserting media for {category_title} at position {}",
                                index + 1
                            ),
                            details,
                        )
                        .await?;
                }
            }
        }

        self.store
            .replace_category(category_title, &entries)
            .await?;

        logger
            .info(&format!(
                "Updated {category_title} with {} items",
                entries.len()
            ))
            .await?;

        Ok(())
    }
}
