//! Subsidy eligibility intake: questionnaire scoring, report assembly, and the
//! collaborators that render, deliver, and log the result.
//!
//! `scoring` is the pure core and can be called without any of the other
//! modules. Everything else orchestrates I/O around it.

pub mod advisor;
pub mod delivery;
pub mod domain;
pub mod intake_log;
pub mod notice;
pub mod questionnaire;
pub mod render;
pub mod report;
pub mod router;
pub mod scoring;
pub mod service;
pub mod session;

#[cfg(test)]
mod tests;

pub use advisor::{AdvisorError, ChatCompletionsAdvisor, SubsidyAdvisor};
pub use delivery::{
    DeliveryEnvelope, DeliveryError, DeliveryReceipt, DeliveryRouting, DeliverySink,
    OutboxDelivery,
};
pub use domain::{
    ApplicantIdentity, EligibilityApplication, Industry, Language, RegistrationError,
    SupportingDocument,
};
pub use intake_log::{CsvIntakeLog, IntakeLog, IntakeLogError, IntakeLogRow};
pub use notice::{Notice, NoticeKind};
pub use questionnaire::{
    validate_employee_count, CompanyAgeBracket, QuestionnaireAnswers, QuestionnaireError,
    ResearchBudgetBracket, RevenueBracket,
};
pub use render::{DocumentRenderer, PdfReportRenderer, RenderError, RenderedDocument};
pub use report::{assemble_report, normalize_symbols, EligibilityReport, ReportLine};
pub use router::intake_router;
pub use scoring::{
    score, EligibilityAssessment, EligibilityEngine, EligibilityTier, ScoreComponent,
    ScoreResult, ScoringRule, ScoringWeights,
};
pub use service::{
    AskOutcome, AssessmentOutcome, AssessmentRequest, IntakeCollaborators, IntakeError,
    IntakeService,
};
pub use session::{
    AdvisorExchange, IntakeSession, SessionId, SessionStore, SessionStoreError, SessionView,
    StoredAssessment,
};
