//! Engagement scoring.
//!
//! A post's engagement score is a fixed linear weighting of its raw counters.
//! Comments weigh the most, views the least.

use serde::{Deserialize, Serialize};

pub const VIEW_WEIGHT: u64 = 1;
pub const LIKE_WEIGHT: u64 = 5;
pub const COMMENT_WEIGHT: u64 = 10;
pub const BOOKMARK_WEIGHT: u64 = 3;

const DEFAULT_GATE_MIN_VIEWS: u64 = 100;
const DEFAULT_GATE_MIN_LIKES: u64 = 50;
const DEFAULT_GATE_MIN_COMMENTS: u64 = 20;

/// Compute the engagement score `views + 5*likes + 10*comments + 3*bookmarks`.
///
/// Saturates at `u64::MAX` instead of overflowing, so the function is total
/// over its whole input domain.
pub fn engagement_score(views: u64, likes: u64, comments: u64, bookmarks: u64) -> u64 {
    views
        .saturating_mul(VIEW_WEIGHT)
        .saturating_add(likes.saturating_mul(LIKE_WEIGHT))
        .saturating_add(comments.saturating_mul(COMMENT_WEIGHT))
        .saturating_add(bookmarks.saturating_mul(BOOKMARK_WEIGHT))
}

/// Raw engagement counters of a single post at evaluation time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngagementMetrics {
    pub views: u64,
    pub likes: u64,
    pub comments: u64,
    pub bookmarks: u64,
}

impl EngagementMetrics {
    pub fn new(views: u64, likes: u64, comments: u64, bookmarks: u64) -> Self {
        Self {
            views,
            likes,
            comments,
            bookmarks,
        }
    }

    pub fn score(&self) -> u64 {
        engagement_score(self.views, self.likes, self.comments, self.bookmarks)
    }
}

/// Minimum-activity gate: a post must clear at least one of these floors
/// before its score is considered for promotion.
///
/// Bookmarks never open the gate on their own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActivityGate {
    pub min_views: u64,
    pub min_likes: u64,
    pub min_comments: u64,
}

impl Default for ActivityGate {
    fn default() -> Self {
        Self {
            min_views: DEFAULT_GATE_MIN_VIEWS,
            min_likes: DEFAULT_GATE_MIN_LIKES,
            min_comments: DEFAULT_GATE_MIN_COMMENTS,
        }
    }
}

impl ActivityGate {
    pub fn admits(&self, metrics: &EngagementMetrics) -> bool {
        metrics.views >= self.min_views
            || metrics.likes >= self.min_likes
            || metrics.comments >= self.min_comments
    }
}
