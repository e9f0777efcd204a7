//! Spotlight: engagement-driven featured-post promotion for a blogging platform.
//!
//! The crate is layered the usual way:
//!
//! - [`domain`]: engagement scoring and the featured-state machine (pure).
//! - [`application`]: the promotion/demotion policy, the auto-feature run
//!   orchestration, cached home-feed reads and the scheduled job.
//! - [`cache`]: the process-local TTL query cache.
//! - [`infra`]: Postgres repositories, HTTP surface and telemetry.
//! - [`config`]: layered settings (file → environment → CLI).

pub mod application;
pub mod cache;
pub mod config;
pub mod domain;
pub mod infra;
