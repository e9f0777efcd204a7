//! Engagement-driven promotion and demotion of featured posts.

mod policy;
mod service;
mod types;

pub use policy::{
    DEFAULT_DEMOTE_BELOW_SCORE, DEFAULT_MAX_PROMOTIONS, DEFAULT_PROMOTE_MIN_SCORE,
    DEFAULT_WINDOW_DAYS, FeaturePolicy,
};
pub use service::AutoFeatureService;
pub use types::{AutoFeatureError, AutoFeatureReport, FailedUpdate, RankedPost};
