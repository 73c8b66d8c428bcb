use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Industry sectors offered by the questionnaire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Industry {
    Ai,
    Iot,
    Biotech,
    GreenEnergy,
    Other,
}

impl Industry {
    pub const fn ordered() -> [Self; 5] {
        [
            Self::Ai,
            Self::Iot,
            Self::Biotech,
            Self::GreenEnergy,
            Self::Other,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Ai => "AI",
            Self::Iot => "IoT",
            Self::Biotech => "Biotech",
            Self::GreenEnergy => "Green Energy",
            Self::Other => "Other",
        }
    }

    /// Sectors that earn strategic-industry credit. `Other` never does.
    pub const fn is_strategic(self) -> bool {
        !matches!(self, Self::Other)
    }
}

impl FromStr for Industry {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let key: String = raw
            .trim()
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();
        match key.as_str() {
            "ai" => Ok(Self::Ai),
            "iot" => Ok(Self::Iot),
            "biotech" => Ok(Self::Biotech),
            "greenenergy" => Ok(Self::GreenEnergy),
            "other" => Ok(Self::Other),
            _ => Err(format!("unknown industry '{raw}'")),
        }
    }
}

/// Supporting material the applicant says they can provide.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SupportingDocument {
    BusinessPlan,
    OrgChart,
    Budget,
    ExportPlan,
    PitchDeck,
    Other(String),
}

impl SupportingDocument {
    pub fn standard() -> [Self; 5] {
        [
            Self::BusinessPlan,
            Self::OrgChart,
            Self::Budget,
            Self::ExportPlan,
            Self::PitchDeck,
        ]
    }

    pub fn label(&self) -> &str {
        match self {
            Self::BusinessPlan => "Business Plan",
            Self::OrgChart => "Org Chart",
            Self::Budget => "Budget",
            Self::ExportPlan => "Export Plan",
            Self::PitchDeck => "Pitch Deck",
            Self::Other(name) => name.as_str(),
        }
    }
}

impl FromStr for SupportingDocument {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err("document name must not be empty".to_string());
        }
        let key: String = trimmed
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();
        Ok(match key.as_str() {
            "businessplan" => Self::BusinessPlan,
            "orgchart" => Self::OrgChart,
            "budget" => Self::Budget,
            "exportplan" => Self::ExportPlan,
            "pitchdeck" => Self::PitchDeck,
            _ => Self::Other(trimmed.to_string()),
        })
    }
}

/// Structured questionnaire response consumed by the scoring engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EligibilityApplication {
    pub company_age_at_least_three_years: bool,
    pub industries: BTreeSet<Industry>,
    /// R&D spend of at least $200,000 per year.
    pub research_budget_at_least_threshold: bool,
    pub export_active: bool,
    /// Annual revenue of at least $500,000.
    pub annual_revenue_at_least_threshold: bool,
    pub employee_count: u16,
    pub documents_provided: BTreeSet<SupportingDocument>,
}

impl Default for EligibilityApplication {
    fn default() -> Self {
        Self {
            company_age_at_least_three_years: false,
            industries: BTreeSet::new(),
            research_budget_at_least_threshold: false,
            export_active: false,
            annual_revenue_at_least_threshold: false,
            employee_count: MIN_EMPLOYEES,
            documents_provided: BTreeSet::new(),
        }
    }
}

pub const MIN_EMPLOYEES: u16 = 1;
pub const MAX_EMPLOYEES: u16 = 200;

/// Applicant identity captured at registration. Self-reported, unauthenticated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicantIdentity {
    pub name: String,
    pub company: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistrationError {
    #[error("name is required")]
    MissingName,
    #[error("company name is required")]
    MissingCompany,
    #[error("'{0}' is not a valid e-mail address")]
    InvalidEmail(String),
    #[error("{field} must not contain control characters or line breaks")]
    ControlCharacter { field: &'static str },
}

impl ApplicantIdentity {
    /// Trims every field and rejects blank names, malformed e-mail addresses,
    /// and control characters. These values end up in mail headers.
    pub fn validated(self) -> Result<Self, RegistrationError> {
        let fields = [
            ("name", Some(self.name.as_str())),
            ("company", Some(self.company.as_str())),
            ("email", Some(self.email.as_str())),
            ("address", self.address.as_deref()),
        ];
        for (field, value) in fields {
            if value.is_some_and(|value| value.chars().any(char::is_control)) {
                return Err(RegistrationError::ControlCharacter { field });
            }
        }

        let name = self.name.trim().to_string();
        let company = self.company.trim().to_string();
        let email = self.email.trim().to_string();
        let address = self
            .address
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty());

        if name.is_empty() {
            return Err(RegistrationError::MissingName);
        }
        if company.is_empty() {
            return Err(RegistrationError::MissingCompany);
        }
        if !is_plausible_email(&email) {
            return Err(RegistrationError::InvalidEmail(email));
        }

        Ok(Self {
            name,
            company,
            email,
            address,
        })
    }
}

pub(crate) fn is_plausible_email(raw: &str) -> bool {
    let mut parts = raw.split('@');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(local), Some(domain), None) => {
            !local.is_empty() && !domain.is_empty() && !raw.chars().any(char::is_whitespace)
        }
        _ => false,
    }
}

/// UI language preference carried on the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Language {
    #[default]
    #[serde(rename = "en", alias = "english")]
    English,
    #[serde(rename = "ja", alias = "japanese")]
    Japanese,
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Language::English => write!(f, "en"),
            Language::Japanese => write!(f, "ja"),
        }
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "en" | "english" => Ok(Self::English),
            "ja" | "jp" | "japanese" => Ok(Self::Japanese),
            other => Err(format!("unsupported language '{other}'")),
        }
    }
}
