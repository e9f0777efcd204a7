use std::sync::Arc;
use std::time::Instant;

use futures::future::join_all;
use metrics::{counter, histogram};
use time::OffsetDateTime;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    application::repos::{FeaturedPostsRepo, RepoError},
    cache::{QueryCache, keys::FEATURED_INVALIDATION_PATTERNS},
    domain::featured::FeatureTransition,
};

use super::{
    policy::FeaturePolicy,
    types::{AutoFeatureError, AutoFeatureReport, FailedUpdate, RankedPost},
};

const TARGET: &str = "application::auto_feature";

const METRIC_PROMOTED: &str = "spotlight_auto_feature_promoted_total";
const METRIC_DEMOTED: &str = "spotlight_auto_feature_demoted_total";
const METRIC_FAILED_WRITES: &str = "spotlight_auto_feature_failed_writes_total";
const METRIC_RUN_MS: &str = "spotlight_auto_feature_run_ms";

struct FeatureUpdate {
    post_id: Uuid,
    outcome: Result<(), RepoError>,
}

#[derive(Default)]
struct PhaseOutcome {
    applied: usize,
    attempted: bool,
    failures: Vec<FailedUpdate>,
}

/// Runs promotion then demotion against the store and invalidates cached
/// featured listings afterwards.
///
/// At most one run is in flight per service; overlapping calls fail fast with
/// [`AutoFeatureError::AlreadyRunning`].
pub struct AutoFeatureService {
    repo: Arc<dyn FeaturedPostsRepo>,
    cache: Option<Arc<QueryCache>>,
    policy: FeaturePolicy,
    run_guard: Mutex<()>,
}

impl AutoFeatureService {
    pub fn new(repo: Arc<dyn FeaturedPostsRepo>, policy: FeaturePolicy) -> Self {
        Self {
            repo,
            cache: None,
            policy,
            run_guard: Mutex::new(()),
        }
    }

    pub fn with_cache(mut self, cache: Arc<QueryCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub async fn run(&self) -> Result<AutoFeatureReport, AutoFeatureError> {
        self.run_at(OffsetDateTime::now_utc()).await
    }

    /// Run with an explicit clock reading; the window cutoff is `now - window`.
    pub async fn run_at(
        &self,
        now: OffsetDateTime,
    ) -> Result<AutoFeatureReport, AutoFeatureError> {
        let Ok(_guard) = self.run_guard.try_lock() else {
            warn!(target: TARGET, "Auto-feature run rejected: another run is in progress");
            return Err(AutoFeatureError::AlreadyRunning);
        };

        let started = Instant::now();
        let result = self.run_locked(now).await;
        histogram!(METRIC_RUN_MS).record(started.elapsed().as_secs_f64() * 1000.0);
        result
    }

    async fn run_locked(
        &self,
        now: OffsetDateTime,
    ) -> Result<AutoFeatureReport, AutoFeatureError> {
        let cutoff = now - self.policy.window();
        info!(target: TARGET, %cutoff, "Auto-feature run started");

        let promotion = self.promote(cutoff).await?;

        let demotion = match self.demote(cutoff).await {
            Ok(outcome) => outcome,
            Err(err) => {
                if promotion.attempted {
                    self.invalidate_featured();
                }
                return Err(err);
            }
        };

        if promotion.attempted || demotion.attempted {
            self.invalidate_featured();
        }

        let report = AutoFeatureReport {
            promoted: promotion.applied,
            demoted: demotion.applied,
        };
        counter!(METRIC_PROMOTED).increment(report.promoted as u64);
        counter!(METRIC_DEMOTED).increment(report.demoted as u64);

        let mut failures = promotion.failures;
        failures.extend(demotion.failures);
        if !failures.is_empty() {
            counter!(METRIC_FAILED_WRITES).increment(failures.len() as u64);
            warn!(
                target: TARGET,
                promoted = report.promoted,
                demoted = report.demoted,
                failed = failures.len(),
                "Auto-feature run finished with failed writes"
            );
            return Err(AutoFeatureError::PartialWrite {
                applied: report,
                failures,
            });
        }

        info!(
            target: TARGET,
            promoted = report.promoted,
            demoted = report.demoted,
            "Auto-feature run finished"
        );
        Ok(report)
    }

    async fn promote(&self, cutoff: OffsetDateTime) -> Result<PhaseOutcome, AutoFeatureError> {
        let candidates = self
            .repo
            .list_candidate_posts(cutoff)
            .await
            .map_err(|source| snapshot_failed("promotion", source))?;

        let selected = self.policy.select_promotions(&candidates);
        debug!(
            target: TARGET,
            candidates = candidates.len(),
            selected = selected.len(),
            "Promotion candidates ranked"
        );

        Ok(self.apply(&selected, FeatureTransition::Promote).await)
    }

    async fn demote(&self, cutoff: OffsetDateTime) -> Result<PhaseOutcome, AutoFeatureError> {
        let featured = self
            .repo
            .list_featured_posts(cutoff)
            .await
            .map_err(|source| snapshot_failed("demotion", source))?;

        let selected = self.policy.select_demotions(&featured);
        debug!(
            target: TARGET,
            featured = featured.len(),
            selected = selected.len(),
            "Demotion candidates selected"
        );

        Ok(self.apply(&selected, FeatureTransition::Demote).await)
    }

    async fn apply(&self, selected: &[RankedPost], transition: FeatureTransition) -> PhaseOutcome {
        if selected.is_empty() {
            return PhaseOutcome::default();
        }

        let flag = transition.target_flag();
        let updates = join_all(selected.iter().map(|post| async move {
            FeatureUpdate {
                post_id: post.id,
                outcome: self.repo.set_featured(post.id, flag).await,
            }
        }))
        .await;

        let mut outcome = PhaseOutcome {
            attempted: true,
            ..PhaseOutcome::default()
        };
        for update in updates {
            match update.outcome {
                Ok(()) => {
                    outcome.applied += 1;
                    debug!(
                        target: TARGET,
                        post_id = %update.post_id,
                        transition = transition.as_str(),
                        "Featured flag updated"
                    );
                }
                Err(error) => {
                    warn!(
                        target: TARGET,
                        post_id = %update.post_id,
                        transition = transition.as_str(),
                        error = %error,
                        "Featured flag update failed"
                    );
                    outcome.failures.push(FailedUpdate {
                        post_id: update.post_id,
                        transition,
                        error,
                    });
                }
            }
        }
        outcome
    }

    fn invalidate_featured(&self) {
        let Some(cache) = &self.cache else {
            return;
        };
        let removed: usize = FEATURED_INVALIDATION_PATTERNS
            .iter()
            .map(|pattern| cache.invalidate_by_pattern(pattern))
            .sum();
        debug!(target: TARGET, removed, "Invalidated featured cache entries");
    }
}

fn snapshot_failed(phase: &'static str, source: RepoError) -> AutoFeatureError {
    warn!(target: TARGET, phase, error = %source, "Auto-feature snapshot read failed");
    AutoFeatureError::Store { phase, source }
}
