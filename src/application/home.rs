//! Cached home-feed sections.

use std::sync::Arc;

use serde::Serialize;
use time::{Duration, OffsetDateTime};
use tracing::instrument;

use crate::{
    application::repos::{HomeFeedRepo, RepoError},
    cache::{CacheConfig, QueryCache, keys},
    domain::entities::{PlatformStats, PostSummary, TrendingTag},
};

pub const FEATURED_LIMIT: u32 = 3;
pub const TRENDING_LIMIT: u32 = 6;
pub const RECENT_LIMIT: u32 = 9;
pub const TRENDING_WINDOW_DAYS: i64 = 7;
pub const TRENDING_TAGS_LIMIT: u32 = 7;
pub const TRENDING_TAGS_WINDOW_DAYS: i64 = 30;

/// Every home-feed section in one payload.
#[derive(Debug, Clone, Serialize)]
pub struct HomeSections {
    pub featured_posts: Arc<Vec<PostSummary>>,
    pub trending_posts: Arc<Vec<PostSummary>>,
    pub recent_posts: Arc<Vec<PostSummary>>,
    pub trending_tags: Arc<Vec<TrendingTag>>,
    pub stats: Arc<PlatformStats>,
}

/// Serves the home-feed sections through the query cache.
#[derive(Clone)]
pub struct HomeFeedService {
    repo: Arc<dyn HomeFeedRepo>,
    cache: Arc<QueryCache>,
    config: CacheConfig,
}

impl HomeFeedService {
    pub fn new(repo: Arc<dyn HomeFeedRepo>, cache: Arc<QueryCache>, config: CacheConfig) -> Self {
        Self {
            repo,
            cache,
            config,
        }
    }

    #[instrument(level = "debug", skip(self))]
    pub async fn featured_posts(&self) -> Result<Arc<Vec<PostSummary>>, RepoError> {
        let repo = Arc::clone(&self.repo);
        self.cache
            .get_or_compute(keys::FEATURED_POSTS, self.config.featured_ttl(), || async move {
                repo.list_featured(FEATURED_LIMIT).await
            })
            .await
    }

    #[instrument(level = "debug", skip(self))]
    pub async fn trending_posts(&self) -> Result<Arc<Vec<PostSummary>>, RepoError> {
        let repo = Arc::clone(&self.repo);
        let since = OffsetDateTime::now_utc() - Duration::days(TRENDING_WINDOW_DAYS);
        self.cache
            .get_or_compute(keys::TRENDING_POSTS, self.config.trending_ttl(), || async move {
                repo.list_trending(since, TRENDING_LIMIT).await
            })
            .await
    }

    #[instrument(level = "debug", skip(self))]
    pub async fn recent_posts(&self) -> Result<Arc<Vec<PostSummary>>, RepoError> {
        let repo = Arc::clone(&self.repo);
        self.cache
            .get_or_compute(keys::RECENT_POSTS, self.config.recent_ttl(), || async move {
                repo.list_recent(RECENT_LIMIT).await
            })
            .await
    }

    #[instrument(level = "debug", skip(self))]
    pub async fn trending_tags(&self) -> Result<Arc<Vec<TrendingTag>>, RepoError> {
        let repo = Arc::clone(&self.repo);
        let since = OffsetDateTime::now_utc() - Duration::days(TRENDING_TAGS_WINDOW_DAYS);
        self.cache
            .get_or_compute(
                keys::TRENDING_TAGS,
                self.config.trending_tags_ttl(),
                || async move { repo.list_trending_tags(since, TRENDING_TAGS_LIMIT).await },
            )
            .await
    }

    #[instrument(level = "debug", skip(self))]
    pub async fn platform_stats(&self) -> Result<Arc<PlatformStats>, RepoError> {
        let repo = Arc::clone(&self.repo);
        self.cache
            .get_or_compute(keys::PLATFORM_STATS, self.config.stats_ttl(), || async move {
                repo.platform_stats().await
            })
            .await
    }

    /// Load all sections concurrently; the first failing section fails the call.
    pub async fn sections(&self) -> Result<HomeSections, RepoError> {
        let (featured_posts, trending_posts, recent_posts, trending_tags, stats) =
            futures::try_join!(
                self.featured_posts(),
                self.trending_posts(),
                self.recent_posts(),
                self.trending_tags(),
                self.platform_stats(),
            )?;

        Ok(HomeSections {
            featured_posts,
            trending_posts,
            recent_posts,
            trending_tags,
            stats,
        })
    }
}
