//! In-process query cache.
//!
//! Memoizes expensive read queries (home-feed sections, platform stats) with
//! per-entry TTLs and a bounded capacity. Writers invalidate by key substring.
//!
//! ```toml
//! [cache]
//! max_entries = 1000
//! cleanup_interval_seconds = 300
//! featured_ttl_seconds = 300
//! ```

mod cleanup;
mod config;
pub mod keys;
mod lock;
mod store;

pub use cleanup::CleanupTask;
pub use config::CacheConfig;
pub use store::{MAX_TTL, QueryCache};
