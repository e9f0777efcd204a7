//! Promotion and demotion selection.
//!
//! Pure functions over a snapshot; the service decides what to write.

use std::cmp::Ordering;

use crate::domain::{engagement::ActivityGate, entities::PostMetrics, error::DomainError};

use super::types::RankedPost;

pub const DEFAULT_WINDOW_DAYS: u32 = 30;
pub const DEFAULT_PROMOTE_MIN_SCORE: u64 = 500;
pub const DEFAULT_DEMOTE_BELOW_SCORE: u64 = 300;
pub const DEFAULT_MAX_PROMOTIONS: usize = 3;

/// Thresholds applied by one auto-feature run.
///
/// Promotion requires a higher score than staying featured does, so posts
/// hovering near the promotion bar do not flap between runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeaturePolicy {
    /// Age boundary separating promotion candidates from demotion candidates.
    pub window_days: u32,
    pub promote_min_score: u64,
    pub demote_below_score: u64,
    pub max_promotions: usize,
    pub gate: ActivityGate,
}

impl Default for FeaturePolicy {
    fn default() -> Self {
        Self {
            window_days: DEFAULT_WINDOW_DAYS,
            promote_min_score: DEFAULT_PROMOTE_MIN_SCORE,
            demote_below_score: DEFAULT_DEMOTE_BELOW_SCORE,
            max_promotions: DEFAULT_MAX_PROMOTIONS,
            gate: ActivityGate::default(),
        }
    }
}

impl FeaturePolicy {
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.window_days == 0 {
            return Err(DomainError::validation("window_days must be at least 1"));
        }
        if self.max_promotions == 0 {
            return Err(DomainError::validation("max_promotions must be at least 1"));
        }
        if self.demote_below_score > self.promote_min_score {
            return Err(DomainError::validation(format!(
                "demote_below_score ({}) must not exceed promote_min_score ({})",
                self.demote_below_score, self.promote_min_score
            )));
        }
        Ok(())
    }

    pub fn window(&self) -> time::Duration {
        time::Duration::days(i64::from(self.window_days))
    }

    /// Whether a not-yet-featured post clears both the activity gate and the
    /// promotion threshold.
    pub fn qualifies_for_promotion(&self, post: &PostMetrics) -> bool {
        let metrics = post.metrics();
        self.gate.admits(&metrics) && metrics.score() >= self.promote_min_score
    }

    /// Whether a featured post has fallen below the bar to stay featured.
    pub fn qualifies_for_demotion(&self, post: &PostMetrics) -> bool {
        post.score() < self.demote_below_score
    }

    /// Pick at most `max_promotions` qualifying posts, best score first.
    ///
    /// Equal scores rank the earlier `published_at` first, then the smaller id.
    /// Already featured posts are skipped.
    pub fn select_promotions(&self, candidates: &[PostMetrics]) -> Vec<RankedPost> {
        let mut ranked: Vec<RankedPost> = candidates
            .iter()
            .filter(|post| !post.state().is_featured() && self.qualifies_for_promotion(post))
            .map(RankedPost::from)
            .collect();

        ranked.sort_by(compare_ranked);
        ranked.truncate(self.max_promotions);
        ranked
    }

    /// Featured posts whose score dropped below `demote_below_score`, in
    /// snapshot order. Non-featured posts are skipped.
    pub fn select_demotions(&self, featured: &[PostMetrics]) -> Vec<RankedPost> {
        featured
            .iter()
            .filter(|post| post.state().is_featured() && self.qualifies_for_demotion(post))
            .map(RankedPost::from)
            .collect()
    }
}

fn compare_ranked(left: &RankedPost, right: &RankedPost) -> Ordering {
    right
        .score
        .cmp(&left.score)
        .then_with(|| left.published_at.cmp(&right.published_at))
        .then_with(|| left.id.cmp(&right.id))
}

#[cfg(test)]
mod tests {
    use time::{Duration, OffsetDateTime, macros::datetime};
    use uuid::Uuid;

    use super::*;

    const BASE: OffsetDateTime = datetime!(2026-01-01 00:00 UTC);

    fn post(id: u128, views: u64, likes: u64, comments: u64, bookmarks: u64) -> PostMetrics {
        PostMetrics {
            id: Uuid::from_u128(id),
            views,
            like_count: likes,
            comment_count: comments,
            bookmark_count: bookmarks,
            featured: false,
            published_at: BASE,
        }
    }

    fn featured(mut post: PostMetrics) -> PostMetrics {
        post.featured = true;
        post
    }

    fn ids(ranked: &[RankedPost]) -> Vec<u128> {
        ranked.iter().map(|post| post.id.as_u128()).collect()
    }

    #[test]
    fn default_policy_is_valid() {
        let policy = FeaturePolicy::default();
        assert!(policy.validate().is_ok());
        assert_eq!(policy.window(), Duration::days(30));
    }

    #[test]
    fn rejects_inverted_thresholds() {
        let policy = FeaturePolicy {
            promote_min_score: 300,
            demote_below_score: 500,
            ..FeaturePolicy::default()
        };
        let err = policy.validate().expect_err("inverted thresholds");
        assert!(err.to_string().contains("demote_below_score"));
    }

    #[test]
    fn rejects_zero_window_and_zero_slots() {
        let zero_window = FeaturePolicy {
            window_days: 0,
            ..FeaturePolicy::default()
        };
        assert!(zero_window.validate().is_err());

        let zero_slots = FeaturePolicy {
            max_promotions: 0,
            ..FeaturePolicy::default()
        };
        assert!(zero_slots.validate().is_err());
    }

    #[test]
    fn gate_failures_are_never_promoted_despite_score() {
        // 99 views, 49 likes, 19 comments, 200 bookmarks: score 1134, gate closed.
        let policy = FeaturePolicy::default();
        let candidate = post(1, 99, 49, 19, 200);
        assert!(candidate.score() >= 500);
        assert!(policy.select_promotions(&[candidate]).is_empty());
    }

    #[test]
    fn promotion_threshold_is_inclusive() {
        let policy = FeaturePolicy::default();
        let at_499 = post(1, 499, 0, 0, 0);
        let at_500 = post(2, 500, 0, 0, 0);

        assert_eq!(ids(&policy.select_promotions(&[at_499, at_500])), vec![2]);
    }

    #[test]
    fn caps_promotions_at_three_highest_scores() {
        let policy = FeaturePolicy::default();
        let candidates = [
            post(1, 600, 0, 0, 0),
            post(2, 900, 0, 0, 0),
            post(3, 700, 0, 0, 0),
            post(4, 1000, 0, 0, 0),
            post(5, 800, 0, 0, 0),
        ];

        assert_eq!(ids(&policy.select_promotions(&candidates)), vec![4, 2, 5]);
    }

    #[test]
    fn equal_scores_prefer_earlier_publication_then_smaller_id() {
        let policy = FeaturePolicy {
            max_promotions: 2,
            ..FeaturePolicy::default()
        };
        let mut late = post(1, 600, 0, 0, 0);
        late.published_at = BASE + Duration::days(2);
        let early_high_id = post(9, 600, 0, 0, 0);
        let early_low_id = post(3, 600, 0, 0, 0);

        assert_eq!(
            ids(&policy.select_promotions(&[late, early_high_id, early_low_id])),
            vec![3, 9]
        );
    }

    #[test]
    fn already_featured_candidates_are_skipped() {
        let policy = FeaturePolicy::default();
        let candidates = [featured(post(1, 5000, 0, 0, 0)), post(2, 600, 0, 0, 0)];
        assert_eq!(ids(&policy.select_promotions(&candidates)), vec![2]);
    }

    #[test]
    fn demotion_keeps_posts_between_thresholds() {
        let policy = FeaturePolicy::default();
        let snapshot = [
            featured(post(1, 400, 0, 0, 0)),
            featured(post(2, 299, 0, 0, 0)),
            featured(post(3, 300, 0, 0, 0)),
            post(4, 0, 0, 0, 0),
        ];

        assert_eq!(ids(&policy.select_demotions(&snapshot)), vec![2]);
    }

    #[test]
    fn demotion_ignores_the_activity_gate() {
        let policy = FeaturePolicy::default();
        // Gate closed but score 351 keeps the post featured.
        let snapshot = [featured(post(1, 0, 0, 0, 117))];
        assert!(policy.select_demotions(&snapshot).is_empty());
    }
}
