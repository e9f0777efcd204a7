//! Domain entities mirrored from persistent storage.

use serde::Serialize;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::domain::{engagement::EngagementMetrics, featured::FeaturedState};

/// Engagement projection of a published post, read once per auto-feature phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostMetrics {
    pub id: Uuid,
    pub views: u64,
    pub like_count: u64,
    pub comment_count: u64,
    pub bookmark_count: u64,
    pub featured: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub published_at: OffsetDateTime,
}

impl PostMetrics {
    pub fn metrics(&self) -> EngagementMetrics {
        EngagementMetrics::new(
            self.views,
            self.like_count,
            self.comment_count,
            self.bookmark_count,
        )
    }

    pub fn score(&self) -> u64 {
        self.metrics().score()
    }

    pub fn state(&self) -> FeaturedState {
        FeaturedState::from_flag(self.featured)
    }
}

/// Listing shape used by the cached home-feed sections.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostSummary {
    pub id: Uuid,
    pub slug: String,
    pub title: String,
    pub excerpt: Option<String>,
    pub featured: bool,
    pub views: u64,
    pub like_count: u64,
    pub comment_count: u64,
    pub bookmark_count: u64,
    #[serde(with = "time::serde::rfc3339")]
    pub published_at: OffsetDateTime,
}

/// Tag with recent published activity, plus the post chosen to represent it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrendingTag {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    /// Posts carrying the tag, regardless of age.
    pub post_count: u64,
    pub showcase_post: Option<TagShowcase>,
}

/// Newest published post with a cover image under a tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagShowcase {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub cover_image: String,
    pub excerpt: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PlatformStats {
    pub total_posts: u64,
    pub total_writers: u64,
    pub total_readers: u64,
}
