//! Repository traits describing persistence adapters.

use async_trait::async_trait;
use thiserror::Error;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::domain::entities::{PlatformStats, PostMetrics, PostSummary, TrendingTag};

#[derive(Debug, Clone, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("resource not found")]
    NotFound,
    #[error("database timeout")]
    Timeout,
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }
}

/// Store access needed by the auto-feature job.
///
/// Listings return one snapshot per call, each row carrying its current
/// engagement counters and featured flag.
#[async_trait]
pub trait FeaturedPostsRepo: Send + Sync {
    /// Published, not yet featured posts with `published_at >= published_after`.
    async fn list_candidate_posts(
        &self,
        published_after: OffsetDateTime,
    ) -> Result<Vec<PostMetrics>, RepoError>;

    /// Featured published posts with `published_at < published_before`.
    async fn list_featured_posts(
        &self,
        published_before: OffsetDateTime,
    ) -> Result<Vec<PostMetrics>, RepoError>;

    /// Persist the featured flag of one post. Missing posts yield [`RepoError::NotFound`].
    async fn set_featured(&self, post_id: Uuid, featured: bool) -> Result<(), RepoError>;
}

/// Read queries backing the cached home-feed sections.
#[async_trait]
pub trait HomeFeedRepo: Send + Sync {
    /// Featured published posts, most recently published first.
    async fn list_featured(&self, limit: u32) -> Result<Vec<PostSummary>, RepoError>;

    /// Published posts, most recently published first.
    async fn list_recent(&self, limit: u32) -> Result<Vec<PostSummary>, RepoError>;

    /// Published posts since `since`, by views then likes, descending.
    async fn list_trending(
        &self,
        since: OffsetDateTime,
        limit: u32,
    ) -> Result<Vec<PostSummary>, RepoError>;

    /// Tags with a post published since `since`, most used first.
    async fn list_trending_tags(
        &self,
        since: OffsetDateTime,
        limit: u32,
    ) -> Result<Vec<TrendingTag>, RepoError>;

    async fn platform_stats(&self) -> Result<PlatformStats, RepoError>;
}

#[async_trait]
pub trait StoreHealth: Send + Sync {
    async fn ping(&self) -> Result<(), RepoError>;
}
