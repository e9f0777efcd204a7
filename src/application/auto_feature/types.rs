use serde::Serialize;
use thiserror::Error;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
    application::repos::RepoError,
    domain::{entities::PostMetrics, featured::FeatureTransition},
};

/// A post selected for a featured-flag change, with the score that put it there.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RankedPost {
    pub id: Uuid,
    pub score: u64,
    #[serde(with = "time::serde::rfc3339")]
    pub published_at: OffsetDateTime,
}

impl From<&PostMetrics> for RankedPost {
    fn from(post: &PostMetrics) -> Self {
        Self {
            id: post.id,
            score: post.score(),
            published_at: post.published_at,
        }
    }
}

/// Counts of flags changed by a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AutoFeatureReport {
    pub promoted: usize,
    pub demoted: usize,
}

impl AutoFeatureReport {
    pub fn summary(&self) -> String {
        format!(
            "Auto-featured {} posts and unfeatured {} old posts",
            self.promoted, self.demoted
        )
    }
}

/// A featured-flag write that did not go through.
#[derive(Debug, Clone)]
pub struct FailedUpdate {
    pub post_id: Uuid,
    pub transition: FeatureTransition,
    pub error: RepoError,
}

#[derive(Debug, Error)]
pub enum AutoFeatureError {
    #[error("an auto-feature run is already in progress")]
    AlreadyRunning,
    #[error("failed to read {phase} snapshot")]
    Store {
        phase: &'static str,
        #[source]
        source: RepoError,
    },
    #[error("{count} featured flag update(s) failed", count = .failures.len())]
    PartialWrite {
        applied: AutoFeatureReport,
        failures: Vec<FailedUpdate>,
    },
}

impl AutoFeatureError {
    /// Post ids whose writes failed, empty for non-write errors.
    pub fn failed_post_ids(&self) -> Vec<Uuid> {
        match self {
            Self::PartialWrite { failures, .. } => {
                failures.iter().map(|failure| failure.post_id).collect()
            }
            _ => Vec::new(),
        }
    }
}
