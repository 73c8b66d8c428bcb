use std::fmt;

use serde::{Deserialize, Serialize};

use super::super::domain::Language;
use super::weights::ScoringWeights;

/// Coarse classification derived from the total score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EligibilityTier {
    HighlyEligible,
    NeedsReview,
    NotEligible,
}

impl EligibilityTier {
    /// Thresholds are checked high to low; the first match wins.
    pub const fn from_score(score: u32) -> Self {
        Self::classify(score, &ScoringWeights::STANDARD)
    }

    pub(crate) const fn classify(score: u32, weights: &ScoringWeights) -> Self {
        if score >= weights.highly_eligible_at {
            Self::HighlyEligible
        } else if score >= weights.needs_review_at {
            Self::NeedsReview
        } else {
            Self::NotEligible
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::HighlyEligible => "Highly Eligible",
            Self::NeedsReview => "Needs Review",
            Self::NotEligible => "Not Eligible",
        }
    }

    pub const fn localized_label(self, language: Language) -> &'static str {
        match language {
            Language::English => self.label(),
            Language::Japanese => match self {
                Self::HighlyEligible => "高い適格性",
                Self::NeedsReview => "要確認",
                Self::NotEligible => "対象外",
            },
        }
    }
}

impl fmt::Display for EligibilityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
