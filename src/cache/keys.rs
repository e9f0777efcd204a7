//! Cache key names shared by readers and writers.
//!
//! Writers invalidate by substring, so related keys share a common fragment
//! (`featured`, `posts`).

pub const FEATURED_POSTS: &str = "featured-posts";
pub const TRENDING_POSTS: &str = "trending-posts";
pub const RECENT_POSTS: &str = "recent-posts";
pub const TRENDING_TAGS: &str = "trending-tags";
pub const PLATFORM_STATS: &str = "platform-stats";

/// Patterns dropped after any featured flag changes, applied in order.
pub const FEATURED_INVALIDATION_PATTERNS: [&str; 2] = [FEATURED_POSTS, "featured"];
