use serde::{Deserialize, Serialize};

/// Point table for the eligibility rubric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoringWeights {
    pub maturity: u32,
    pub strategic_industry: u32,
    pub research_investment: u32,
    pub export_readiness: u32,
    pub revenue_scale: u32,
    pub workforce_band: u32,
    pub per_document: u32,
    /// Inclusive employee range that earns the workforce points.
    pub workforce_min: u16,
    pub workforce_max: u16,
    pub highly_eligible_at: u32,
    pub needs_review_at: u32,
}

impl ScoringWeights {
    pub const STANDARD: Self = Self {
        maturity: 15,
        strategic_industry: 20,
        research_investment: 20,
        export_readiness: 15,
        revenue_scale: 10,
        workforce_band: 10,
        per_document: 2,
        workforce_min: 5,
        workforce_max: 100,
        highly_eligible_at: 85,
        needs_review_at: 65,
    };
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self::STANDARD
    }
}
