//! Deterministic eligibility scoring.
//!
//! The rubric is a fixed-weight sum over independent rules followed by a
//! threshold classification. Nothing here performs I/O or holds state, so
//! an engine can be shared freely across request handlers.

mod rules;
mod tier;
mod weights;

pub use rules::ScoringRule;
pub use tier::EligibilityTier;
pub use weights::ScoringWeights;

use super::domain::EligibilityApplication;
use serde::{Deserialize, Serialize};

/// Score and tier for one application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreResult {
    pub score: u32,
    pub tier: EligibilityTier,
}

/// Points awarded by a single rule, kept for audit display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreComponent {
    pub rule: ScoringRule,
    pub points: u32,
    pub note: String,
}

/// Score plus the per-rule trail that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EligibilityAssessment {
    pub result: ScoreResult,
    pub components: Vec<ScoreComponent>,
}

/// Stateless evaluator applying a weight table to applications.
#[derive(Debug, Clone, Default)]
pub struct EligibilityEngine {
    weights: ScoringWeights,
}

impl EligibilityEngine {
    pub fn new(weights: ScoringWeights) -> Self {
        Self { weights }
    }

    pub fn weights(&self) -> &ScoringWeights {
        &self.weights
    }

    pub fn assess(&self, application: &EligibilityApplication) -> EligibilityAssessment {
        let (components, score) = rules::score_application(application, &self.weights);
        let tier = EligibilityTier::classify(score, &self.weights);

        EligibilityAssessment {
            result: ScoreResult { score, tier },
            components,
        }
    }
}

/// Score an application against the standard rubric.
pub fn score(application: &EligibilityApplication) -> ScoreResult {
    EligibilityEngine::default().assess(application).result
}
