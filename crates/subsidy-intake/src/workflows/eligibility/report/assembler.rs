use std::fmt::Write as _;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::super::domain::{ApplicantIdentity, EligibilityApplication};
use super::super::questionnaire::QuestionnaireAnswers;
use super::super::scoring::ScoreResult;

pub const REPORT_TITLE: &str = "SubsidySmart™ Eligibility Report";

/// A single labeled line of the flat report. Lines without a label are headings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportLine {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub value: String,
}

impl ReportLine {
    fn heading(value: impl Into<String>) -> Self {
        Self {
            label: None,
            value: value.into(),
        }
    }

    fn field(label: &str, value: impl Into<String>) -> Self {
        Self {
            label: Some(label.to_string()),
            value: value.into(),
        }
    }

    pub fn text(&self) -> String {
        match &self.label {
            Some(label) => format!("{label}: {}", self.value),
            None => self.value.clone(),
        }
    }
}

/// Ordered report text handed verbatim to renderers and e-mail bodies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EligibilityReport {
    pub lines: Vec<ReportLine>,
    pub generated_at: DateTime<Utc>,
}

impl EligibilityReport {
    pub fn to_text(&self) -> String {
        let mut text = String::new();
        for line in &self.lines {
            writeln!(text, "{}", line.text()).expect("write to string");
        }
        text
    }
}

/// Identity block, then score block, then answers in questionnaire order.
pub fn assemble_report(
    identity: &ApplicantIdentity,
    application: &EligibilityApplication,
    result: &ScoreResult,
    generated_at: DateTime<Utc>,
) -> EligibilityReport {
    let mut lines = vec![ReportLine::heading(REPORT_TITLE)];

    lines.push(ReportLine::field("Name", identity.name.as_str()));
    lines.push(ReportLine::field("Company", identity.company.as_str()));
    lines.push(ReportLine::field("Email", identity.email.as_str()));
    if let Some(address) = &identity.address {
        lines.push(ReportLine::field("Address", address.as_str()));
    }
    lines.push(ReportLine::field(
        "Date",
        generated_at.format("%Y-%m-%d %H:%M UTC").to_string(),
    ));

    lines.push(ReportLine::field(
        "Eligibility Score",
        format!("{}%", result.score),
    ));
    lines.push(ReportLine::field("Status", result.tier.label()));

    let answers = QuestionnaireAnswers::from(application);
    lines.push(ReportLine::heading("Answers"));
    lines.push(ReportLine::field("Company Age", answers.company_age.label()));
    lines.push(ReportLine::field(
        "Industry",
        join_or_none(answers.industries.iter().map(|industry| industry.label())),
    ));
    lines.push(ReportLine::field(
        "R&D Budget",
        answers.research_budget.label(),
    ));
    lines.push(ReportLine::field(
        "Export Ready",
        if answers.export_ready { "Yes" } else { "No" },
    ));
    lines.push(ReportLine::field("Revenue", answers.annual_revenue.label()));
    lines.push(ReportLine::field(
        "Employees",
        answers.employee_count.to_string(),
    ));
    lines.push(ReportLine::field(
        "Documents",
        join_or_none(answers.documents.iter().map(|document| document.label())),
    ));

    EligibilityReport {
        lines,
        generated_at,
    }
}

fn join_or_none<'a>(values: impl Iterator<Item = &'a str>) -> String {
    let joined = values.collect::<Vec<_>>().join(", ");
    if joined.is_empty() {
        "None".to_string()
    } else {
        joined
    }
}
