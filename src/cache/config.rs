//! Cache configuration.
//!
//! Controls capacity, the background sweep cadence and the TTLs of the cached
//! home-feed sections via the `[cache]` table.

use std::num::NonZeroUsize;
use std::time::Duration;

use serde::Deserialize;

const DEFAULT_MAX_ENTRIES: usize = 1000;
const DEFAULT_CLEANUP_INTERVAL_SECS: u64 = 300;
const DEFAULT_FEATURED_TTL_SECS: u64 = 300;
const DEFAULT_TRENDING_TTL_SECS: u64 = 300;
const DEFAULT_RECENT_TTL_SECS: u64 = 300;
const DEFAULT_TRENDING_TAGS_TTL_SECS: u64 = 600;
const DEFAULT_STATS_TTL_SECS: u64 = 3600;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Maximum number of live entries before FIFO eviction kicks in.
    pub max_entries: usize,
    /// Period of the background sweep that drops expired entries.
    pub cleanup_interval_secs: u64,
    /// TTL of the featured-posts section.
    pub featured_ttl_secs: u64,
    /// TTL of the trending-posts section.
    pub trending_ttl_secs: u64,
    /// TTL of the recent-posts section.
    pub recent_ttl_secs: u64,
    /// TTL of the trending-tags section.
    pub trending_tags_ttl_secs: u64,
    /// TTL of the platform statistics.
    pub stats_ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: DEFAULT_MAX_ENTRIES,
            cleanup_interval_secs: DEFAULT_CLEANUP_INTERVAL_SECS,
            featured_ttl_secs: DEFAULT_FEATURED_TTL_SECS,
            trending_ttl_secs: DEFAULT_TRENDING_TTL_SECS,
            recent_ttl_secs: DEFAULT_RECENT_TTL_SECS,
            trending_tags_ttl_secs: DEFAULT_TRENDING_TAGS_TTL_SECS,
            stats_ttl_secs: DEFAULT_STATS_TTL_SECS,
        }
    }
}

impl From<&crate::config::CacheSettings> for CacheConfig {
    fn from(settings: &crate::config::CacheSettings) -> Self {
        Self {
            max_entries: settings.max_entries.get(),
            cleanup_interval_secs: settings.cleanup_interval.as_secs(),
            featured_ttl_secs: settings.featured_ttl.as_secs(),
            trending_ttl_secs: settings.trending_ttl.as_secs(),
            recent_ttl_secs: settings.recent_ttl.as_secs(),
            trending_tags_ttl_secs: settings.trending_tags_ttl.as_secs(),
            stats_ttl_secs: settings.stats_ttl.as_secs(),
        }
    }
}

impl CacheConfig {
    /// Returns the capacity as NonZeroUsize, clamping to 1 if zero.
    pub fn max_entries_non_zero(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.max_entries).unwrap_or(NonZeroUsize::MIN)
    }

    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.cleanup_interval_secs.max(1))
    }

    pub fn featured_ttl(&self) -> Duration {
        Duration::from_secs(self.featured_ttl_secs)
    }

    pub fn trending_ttl(&self) -> Duration {
        Duration::from_secs(self.trending_ttl_secs)
    }

    pub fn recent_ttl(&self) -> Duration {
        Duration::from_secs(self.recent_ttl_secs)
    }

    pub fn trending_tags_ttl(&self) -> Duration {
        Duration::from_secs(self.trending_tags_ttl_secs)
    }

    pub fn stats_ttl(&self) -> Duration {
        Duration::from_secs(self.stats_ttl_secs)
    }
}
