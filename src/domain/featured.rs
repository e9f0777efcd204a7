//! Featured-status state machine for a single post.
//!
//! Transitions only happen when an auto-feature run is invoked; nothing here is
//! time-driven.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeaturedState {
    #[default]
    NotFeatured,
    Featured,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureTransition {
    Promote,
    Demote,
}

impl FeaturedState {
    pub fn from_flag(featured: bool) -> Self {
        if featured {
            Self::Featured
        } else {
            Self::NotFeatured
        }
    }

    pub fn is_featured(self) -> bool {
        matches!(self, Self::Featured)
    }

    /// Apply a transition. Promoting a featured post and demoting a
    /// non-featured one are no-ops.
    pub fn apply(self, transition: FeatureTransition) -> Self {
        match transition {
            FeatureTransition::Promote => Self::Featured,
            FeatureTransition::Demote => Self::NotFeatured,
        }
    }
}

impl FeatureTransition {
    /// Value of the persisted `featured` flag after this transition.
    pub fn target_flag(self) -> bool {
        self.target_state().is_featured()
    }

    pub fn target_state(self) -> FeaturedState {
        FeaturedState::NotFeatured.apply(self)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FeatureTransition::Promote => "promote",
            FeatureTransition::Demote => "demote",
        }
    }
}
