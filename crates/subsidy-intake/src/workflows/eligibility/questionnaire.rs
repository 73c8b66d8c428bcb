use serde::{Deserialize, Serialize};

use super::domain::{
    EligibilityApplication, Industry, SupportingDocument, MAX_EMPLOYEES, MIN_EMPLOYEES,
};

/// Two-bucket company age selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompanyAgeBracket {
    #[default]
    UnderThreeYears,
    ThreeYearsOrMore,
}

impl CompanyAgeBracket {
    pub const fn label(self) -> &'static str {
        match self {
            Self::UnderThreeYears => "< 3 years",
            Self::ThreeYearsOrMore => "≥ 3 years",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResearchBudgetBracket {
    #[default]
    #[serde(rename = "under_200k")]
    Under200K,
    #[serde(rename = "at_least_200k")]
    AtLeast200K,
}

impl ResearchBudgetBracket {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Under200K => "< $200K",
            Self::AtLeast200K => "≥ $200K",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RevenueBracket {
    #[default]
    #[serde(rename = "under_500k")]
    Under500K,
    #[serde(rename = "at_least_500k")]
    AtLeast500K,
}

impl RevenueBracket {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Under500K => "< $500K",
            Self::AtLeast500K => "≥ $500K",
        }
    }
}

/// Raw self-check form answers, as the applicant selected them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionnaireAnswers {
    #[serde(default)]
    pub company_age: CompanyAgeBracket,
    #[serde(default)]
    pub industries: Vec<Industry>,
    #[serde(default)]
    pub research_budget: ResearchBudgetBracket,
    #[serde(default)]
    pub export_ready: bool,
    #[serde(default)]
    pub annual_revenue: RevenueBracket,
    pub employee_count: u16,
    #[serde(default)]
    pub documents: Vec<SupportingDocument>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QuestionnaireError {
    #[error("employee count {found} outside supported range {min}-{max}")]
    EmployeeCountOutOfRange { found: u16, min: u16, max: u16 },
}

/// Workforce sizes the self-check accepts. The scoring engine itself is total.
pub fn validate_employee_count(found: u16) -> Result<(), QuestionnaireError> {
    if (MIN_EMPLOYEES..=MAX_EMPLOYEES).contains(&found) {
        Ok(())
    } else {
        Err(QuestionnaireError::EmployeeCountOutOfRange {
            found,
            min: MIN_EMPLOYEES,
            max: MAX_EMPLOYEES,
        })
    }
}

impl QuestionnaireAnswers {
    /// Validate the answers and collapse them into the scoring input.
    pub fn into_application(self) -> Result<EligibilityApplication, QuestionnaireError> {
        validate_employee_count(self.employee_count)?;

        Ok(EligibilityApplication {
            company_age_at_least_three_years: self.company_age
                == CompanyAgeBracket::ThreeYearsOrMore,
            industries: self.industries.into_iter().collect(),
            research_budget_at_least_threshold: self.research_budget
                == ResearchBudgetBracket::AtLeast200K,
            export_active: self.export_ready,
            annual_revenue_at_least_threshold: self.annual_revenue == RevenueBracket::AtLeast500K,
            employee_count: self.employee_count,
            documents_provided: self.documents.into_iter().collect(),
        })
    }
}

impl From<&EligibilityApplication> for QuestionnaireAnswers {
    fn from(application: &EligibilityApplication) -> Self {
        Self {
            company_age: if application.company_age_at_least_three_years {
                CompanyAgeBracket::ThreeYearsOrMore
            } else {
                CompanyAgeBracket::UnderThreeYears
            },
            industries: application.industries.iter().copied().collect(),
            research_budget: if application.research_budget_at_least_threshold {
                ResearchBudgetBracket::AtLeast200K
            } else {
                ResearchBudgetBracket::Under200K
            },
            export_ready: application.export_active,
            annual_revenue: if application.annual_revenue_at_least_threshold {
                RevenueBracket::AtLeast500K
            } else {
                RevenueBracket::Under500K
            },
            employee_count: application.employee_count,
            documents: application.documents_provided.iter().cloned().collect(),
        }
    }
}
