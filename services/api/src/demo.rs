use crate::infra::{InMemoryIntakeLog, InMemoryOutbox, InMemorySessionStore, ScriptedAdvisor};
use chrono::Utc;
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;
use subsidy_intake::error::AppError;
use subsidy_intake::workflows::eligibility::{
    assemble_report, normalize_symbols, ApplicantIdentity, AssessmentRequest, CompanyAgeBracket,
    DeliveryRouting, DocumentRenderer, EligibilityAssessment, EligibilityEngine, Industry,
    IntakeCollaborators, IntakeService, Language, PdfReportRenderer, QuestionnaireAnswers,
    ResearchBudgetBracket, RevenueBracket, SupportingDocument,
};

#[derive(Args, Debug)]
pub(crate) struct ScoreArgs {
    /// Company has operated for three years or more
    #[arg(long)]
    pub(crate) established: bool,
    /// Industry the company operates in (repeatable): ai, iot, biotech, green-energy, other
    #[arg(long = "industry")]
    pub(crate) industries: Vec<Industry>,
    /// Annual R&D budget is at least $200K
    #[arg(long)]
    pub(crate) research_200k: bool,
    /// Company exports or plans to export
    #[arg(long)]
    pub(crate) export_ready: bool,
    /// Annual revenue is at least $500K
    #[arg(long)]
    pub(crate) revenue_500k: bool,
    /// Number of employees (1-200)
    #[arg(long)]
    pub(crate) employees: u16,
    /// Supporting document the applicant can provide (repeatable)
    #[arg(long = "document")]
    pub(crate) documents: Vec<SupportingDocument>,
    /// Write the PDF report to this path
    #[arg(long, requires_all = ["name", "company", "email"])]
    pub(crate) output: Option<PathBuf>,
    /// Applicant name printed on the report
    #[arg(long)]
    pub(crate) name: Option<String>,
    /// Company name printed on the report
    #[arg(long)]
    pub(crate) company: Option<String>,
    /// Applicant e-mail printed on the report
    #[arg(long)]
    pub(crate) email: Option<String>,
    /// Optional postal address printed on the report
    #[arg(long)]
    pub(crate) address: Option<String>,
    /// Print the assessment as JSON instead of text
    #[arg(long)]
    pub(crate) json: bool,
}

impl ScoreArgs {
    fn answers(&self) -> QuestionnaireAnswers {
        QuestionnaireAnswers {
            company_age: if self.established {
                CompanyAgeBracket::ThreeYearsOrMore
            } else {
                CompanyAgeBracket::UnderThreeYears
            },
            industries: self.industries.clone(),
            research_budget: if self.research_200k {
                ResearchBudgetBracket::AtLeast200K
            } else {
                ResearchBudgetBracket::Under200K
            },
            export_ready: self.export_ready,
            annual_revenue: if self.revenue_500k {
                RevenueBracket::AtLeast500K
            } else {
                RevenueBracket::Under500K
            },
            employee_count: self.employees,
            documents: self.documents.clone(),
        }
    }

    fn identity(&self) -> Option<ApplicantIdentity> {
        Some(ApplicantIdentity {
            name: self.name.clone()?,
            company: self.company.clone()?,
            email: self.email.clone()?,
            address: self.address.clone(),
        })
    }
}

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Session language (en or ja)
    #[arg(long, default_value = "en")]
    pub(crate) language: Language,
    /// Simulate an unreachable advisor to show the user-facing notice
    #[arg(long)]
    pub(crate) offline_advisor: bool,
    /// Oversight address copied on the demo delivery
    #[arg(long)]
    pub(crate) oversight: Option<String>,
}

pub(crate) fn run_score(args: ScoreArgs) -> Result<(), AppError> {
    let application = args.answers().into_application()?;
    let assessment = EligibilityEngine::default().assess(&application);

    if args.json {
        match serde_json::to_string_pretty(&assessment) {
            Ok(json) => println!("{json}"),
            Err(err) => println!("Assessment payload unavailable: {err}"),
        }
    } else {
        print_assessment(&assessment);
    }

    let (Some(path), Some(identity)) = (args.output.as_ref(), args.identity()) else {
        return Ok(());
    };
    let identity = identity.validated()?;
    let report = assemble_report(&identity, &application, &assessment.result, Utc::now());
    let document = PdfReportRenderer.render(&report)?;
    std::fs::write(path, &document.bytes)?;
    println!("Report written to {}", path.display());
    Ok(())
}

fn print_assessment(assessment: &EligibilityAssessment) {
    println!(
        "Eligibility score: {}% -> {}",
        assessment.result.score,
        assessment.result.tier.label()
    );
    if assessment.components.is_empty() {
        println!("  No rule awarded points");
    }
    for component in &assessment.components {
        println!(
            "  - {}: +{} ({})",
            component.rule.label(),
            component.points,
            normalize_symbols(&component.note)
        );
    }
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        language,
        offline_advisor,
        oversight,
    } = args;

    println!("SubsidySmart intake demo (language: {language})");
    let outbox = InMemoryOutbox::default();
    let intake_log = InMemoryIntakeLog::default();
    let collaborators = IntakeCollaborators {
        advisor: Arc::new(ScriptedAdvisor {
            offline: offline_advisor,
        }),
        renderer: Arc::new(PdfReportRenderer),
        delivery: Arc::new(outbox.clone()),
        intake_log: Arc::new(intake_log.clone()),
    };
    let service = IntakeService::new(
        Arc::new(InMemorySessionStore::default()),
        collaborators,
        DeliveryRouting::new(oversight),
    );

    let session = service.start_session(language)?;
    println!("- Started session {}", session.id.0);

    service.register(
        &session.id,
        ApplicantIdentity {
            name: "Mika Tanaka".to_string(),
            company: "Kumo Robotics".to_string(),
            email: "mika@kumo.example".to_string(),
            address: None,
        },
    )?;
    println!("- Registered applicant for Kumo Robotics");

    let asked = service.ask(&session.id, "Which programs fit a 10-person AI startup?")?;
    match asked.answer {
        Some(answer) => println!("- Advisor: {answer}"),
        None => {
            for notice in &asked.notices {
                println!("- Notice: {}", notice.message);
            }
        }
    }

    let outcome = service.assess(
        &session.id,
        AssessmentRequest {
            answers: QuestionnaireAnswers {
                company_age: CompanyAgeBracket::ThreeYearsOrMore,
                industries: vec![Industry::Ai],
                research_budget: ResearchBudgetBracket::AtLeast200K,
                export_ready: false,
                annual_revenue: RevenueBracket::Under500K,
                employee_count: 10,
                documents: vec![SupportingDocument::BusinessPlan, SupportingDocument::Budget],
            },
            email_report: true,
            append_log: true,
        },
    )?;

    println!(
        "\nAssessment: {}% -> {}",
        outcome.result.score, outcome.tier_label
    );
    for component in &outcome.components {
        println!(
            "  - {}: +{} ({})",
            component.rule.label(),
            component.points,
            normalize_symbols(&component.note)
        );
    }

    println!("\nReport lines:");
    for line in &outcome.report.lines {
        println!("  {}", normalize_symbols(&line.text()));
    }

    for notice in &outcome.notices {
        println!("Notice: {}", notice.message);
    }

    for envelope in outbox.sent() {
        println!(
            "\nDelivered '{}' to {} ({} bytes attached as {})",
            envelope.subject,
            envelope.recipients().collect::<Vec<_>>().join(", "),
            envelope.attachment.bytes.len(),
            envelope.attachment.file_name
        );
    }
    for row in intake_log.rows() {
        println!(
            "Logged {} / {} -> {} ({})",
            row.name,
            row.company,
            row.score,
            row.tier.label()
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn score_args() -> ScoreArgs {
        ScoreArgs {
            established: true,
            industries: vec![Industry::Ai],
            research_200k: true,
            export_ready: false,
            revenue_500k: false,
            employees: 10,
            documents: vec![SupportingDocument::BusinessPlan, SupportingDocument::Budget],
            output: None,
            name: None,
            company: None,
            email: None,
            address: None,
            json: false,
        }
    }

    #[test]
    fn score_command_writes_pdf_when_identity_given() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("report.pdf");

        let args = ScoreArgs {
            output: Some(path.clone()),
            name: Some("Mika Tanaka".to_string()),
            company: Some("Kumo Robotics".to_string()),
            email: Some("mika@kumo.example".to_string()),
            ..score_args()
        };
        run_score(args).expect("score runs");

        let bytes = std::fs::read(&path).expect("pdf written");
        assert!(bytes.starts_with(b"%PDF-"));
    }

    #[test]
    fn score_command_rejects_out_of_range_workforce() {
        let args = ScoreArgs {
            employees: 0,
            ..score_args()
        };
        assert!(matches!(run_score(args), Err(AppError::Questionnaire(_))));
    }

    #[test]
    fn demo_runs_with_offline_advisor() {
        run_demo(DemoArgs {
            language: Language::Japanese,
            offline_advisor: true,
            oversight: Some("review@example.org".to_string()),
        })
        .expect("demo completes");
    }
}
