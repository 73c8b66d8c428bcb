use serde::{Deserialize, Serialize};

use super::super::domain::EligibilityApplication;
use super::weights::ScoringWeights;
use super::ScoreComponent;

/// One row of the additive rubric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoringRule {
    Maturity,
    StrategicIndustry,
    ResearchInvestment,
    ExportReadiness,
    RevenueScale,
    WorkforceBand,
    Documentation,
}

impl ScoringRule {
    pub const fn ordered() -> [Self; 7] {
        [
            Self::Maturity,
            Self::StrategicIndustry,
            Self::ResearchInvestment,
            Self::ExportReadiness,
            Self::RevenueScale,
            Self::WorkforceBand,
            Self::Documentation,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Maturity => "Maturity",
            Self::StrategicIndustry => "Strategic industry",
            Self::ResearchInvestment => "R&D investment",
            Self::ExportReadiness => "Export readiness",
            Self::RevenueScale => "Revenue scale",
            Self::WorkforceBand => "Workforce band",
            Self::Documentation => "Documentation completeness",
        }
    }
}

/// Evaluate every rule independently; no rule short-circuits another.
pub(crate) fn score_application(
    application: &EligibilityApplication,
    weights: &ScoringWeights,
) -> (Vec<ScoreComponent>, u32) {
    let components: Vec<ScoreComponent> = ScoringRule::ordered()
        .into_iter()
        .filter_map(|rule| evaluate_rule(rule, application, weights))
        .collect();

    let total = components.iter().map(|component| component.points).sum();
    (components, total)
}

fn evaluate_rule(
    rule: ScoringRule,
    application: &EligibilityApplication,
    weights: &ScoringWeights,
) -> Option<ScoreComponent> {
    let (points, note) = match rule {
        ScoringRule::Maturity => {
            if !application.company_age_at_least_three_years {
                return None;
            }
            (weights.maturity, "company operating ≥ 3 years".to_string())
        }
        ScoringRule::StrategicIndustry => {
            let strategic: Vec<&str> = application
                .industries
                .iter()
                .filter(|industry| industry.is_strategic())
                .map(|industry| industry.label())
                .collect();
            if strategic.is_empty() {
                return None;
            }
            (
                weights.strategic_industry,
                format!("strategic sector: {}", strategic.join(", ")),
            )
        }
        ScoringRule::ResearchInvestment => {
            if !application.research_budget_at_least_threshold {
                return None;
            }
            (
                weights.research_investment,
                "R&D budget ≥ $200K per year".to_string(),
            )
        }
        ScoringRule::ExportReadiness => {
            if !application.export_active {
                return None;
            }
            (
                weights.export_readiness,
                "exporting or planning to export".to_string(),
            )
        }
        ScoringRule::RevenueScale => {
            if !application.annual_revenue_at_least_threshold {
                return None;
            }
            (weights.revenue_scale, "annual revenue ≥ $500K".to_string())
        }
        ScoringRule::WorkforceBand => {
            let count = application.employee_count;
            if count < weights.workforce_min || count > weights.workforce_max {
                return None;
            }
            (
                weights.workforce_band,
                format!(
                    "{count} employees within {}-{}",
                    weights.workforce_min, weights.workforce_max
                ),
            )
        }
        ScoringRule::Documentation => {
            let count = application.documents_provided.len();
            if count == 0 {
                return None;
            }
            let count = u32::try_from(count).unwrap_or(u32::MAX);
            (
                weights.per_document.saturating_mul(count),
                format!("{count} supporting document(s)"),
            )
        }
    };

    Some(ScoreComponent { rule, points, note })
}
