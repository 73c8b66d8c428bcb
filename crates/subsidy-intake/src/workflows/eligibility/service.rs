use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::advisor::SubsidyAdvisor;
use super::delivery::{DeliveryReceipt, DeliveryRouting, DeliverySink};
use super::domain::{ApplicantIdentity, Language, RegistrationError};
use super::intake_log::{IntakeLog, IntakeLogRow};
use super::notice::{Notice, NoticeKind};
use super::questionnaire::{QuestionnaireAnswers, QuestionnaireError};
use super::render::{DocumentRenderer, RenderedDocument};
use super::report::{assemble_report, EligibilityReport};
use super::scoring::{EligibilityEngine, ScoreComponent, ScoreResult};
use super::session::{
    AdvisorExchange, IntakeSession, SessionId, SessionStore, SessionStoreError, StoredAssessment,
};

/// External collaborators the intake flow hands its output to.
#[derive(Clone)]
pub struct IntakeCollaborators {
    pub advisor: Arc<dyn SubsidyAdvisor>,
    pub renderer: Arc<dyn DocumentRenderer>,
    pub delivery: Arc<dyn DeliverySink>,
    pub intake_log: Arc<dyn IntakeLog>,
}

/// Service composing the session store, scoring engine, and collaborators.
pub struct IntakeService<S> {
    sessions: Arc<S>,
    collaborators: IntakeCollaborators,
    routing: DeliveryRouting,
    engine: EligibilityEngine,
}

static SESSION_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_session_id() -> SessionId {
    let id = SESSION_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    SessionId(format!("sess-{id:06}"))
}

/// Self-check submission plus what to do with the resulting report.
#[derive(Debug, Clone, Deserialize)]
pub struct AssessmentRequest {
    #[serde(flatten)]
    pub answers: QuestionnaireAnswers,
    #[serde(default)]
    pub email_report: bool,
    #[serde(default)]
    pub append_log: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct AskOutcome {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
    pub notices: Vec<Notice>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AssessmentOutcome {
    pub session_id: SessionId,
    #[serde(flatten)]
    pub result: ScoreResult,
    pub tier_label: &'static str,
    pub components: Vec<ScoreComponent>,
    pub report: EligibilityReport,
    pub report_available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivery: Option<DeliveryReceipt>,
    pub logged: bool,
    pub notices: Vec<Notice>,
}

impl<S> IntakeService<S>
where
    S: SessionStore + 'static,
{
    pub fn new(
        sessions: Arc<S>,
        collaborators: IntakeCollaborators,
        routing: DeliveryRouting,
    ) -> Self {
        Self::with_engine(sessions, collaborators, routing, EligibilityEngine::default())
    }

    pub fn with_engine(
        sessions: Arc<S>,
        collaborators: IntakeCollaborators,
        routing: DeliveryRouting,
        engine: EligibilityEngine,
    ) -> Self {
        Self {
            sessions,
            collaborators,
            routing,
            engine,
        }
    }

    pub fn engine(&self) -> &EligibilityEngine {
        &self.engine
    }

    pub fn start_session(&self, language: Language) -> Result<IntakeSession, IntakeError> {
        let session = IntakeSession::new(next_session_id(), language, Utc::now());
        let stored = self.sessions.insert(session)?;
        info!(session = %stored.id.0, %language, "intake session started");
        Ok(stored)
    }

    pub fn session(&self, id: &SessionId) -> Result<IntakeSession, IntakeError> {
        self.sessions
            .fetch(id)?
            .ok_or_else(|| IntakeError::SessionNotFound(id.0.clone()))
    }

    fn modify_session<F>(&self, id: &SessionId, change: F) -> Result<IntakeSession, IntakeError>
    where
        F: FnOnce(&mut IntakeSession),
    {
        self.sessions.modify(id, change).map_err(|err| match err {
            SessionStoreError::NotFound => IntakeError::SessionNotFound(id.0.clone()),
            other => IntakeError::Store(other),
        })
    }

    /// Record the applicant's self-reported identity on the session.
    pub fn register(
        &self,
        id: &SessionId,
        registration: ApplicantIdentity,
    ) -> Result<IntakeSession, IntakeError> {
        let registration = registration.validated()?;
        let session = self.modify_session(id, |session| {
            session.registration = Some(registration);
        })?;
        info!(session = %id.0, "applicant registered");
        Ok(session)
    }

    /// Forward a question to the advisor. The transcript only grows on success.
    pub fn ask(&self, id: &SessionId, question: &str) -> Result<AskOutcome, IntakeError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(IntakeError::EmptyQuestion);
        }

        let language = self.session(id)?.language;
        match self.collaborators.advisor.answer(question) {
            Ok(answer) => {
                let exchange = AdvisorExchange {
                    question: question.to_string(),
                    answer: answer.clone(),
                    asked_at: Utc::now(),
                };
                self.modify_session(id, |session| session.transcript.push(exchange))?;
                Ok(AskOutcome {
                    answer: Some(answer),
                    notices: Vec::new(),
                })
            }
            Err(err) => {
                warn!(session = %id.0, error = %err, "advisor request failed");
                Ok(AskOutcome {
                    answer: None,
                    notices: vec![Notice::new(NoticeKind::AdvisorUnavailable, language)],
                })
            }
        }
    }

    /// Score the questionnaire, then hand the report to the renderer, delivery
    /// sink, and log. Collaborator failures become notices; the score stands.
    pub fn assess(
        &self,
        id: &SessionId,
        request: AssessmentRequest,
    ) -> Result<AssessmentOutcome, IntakeError> {
        let session = self.session(id)?;
        let identity = session.registration.ok_or(IntakeError::NotRegistered)?;
        let language = session.language;

        let application = request.answers.into_application()?;
        let assessment = self.engine.assess(&application);
        let result = assessment.result;

        let completed_at = Utc::now();
        let report = assemble_report(&identity, &application, &result, completed_at);
        let mut notices = Vec::new();

        let document = match self.collaborators.renderer.render(&report) {
            Ok(document) => Some(document),
            Err(err) => {
                warn!(session = %id.0, error = %err, "report rendering failed");
                notices.push(Notice::new(NoticeKind::RenderFailed, language));
                None
            }
        };

        let stored = StoredAssessment {
            application,
            assessment: assessment.clone(),
            report: report.clone(),
            document: document.clone(),
            completed_at,
        };
        self.modify_session(id, |session| session.last_assessment = Some(stored))?;

        let delivery = if request.email_report {
            match self.deliver_report(id, &identity, &report, document.as_ref(), language) {
                Ok(receipt) => Some(receipt),
                Err(notice) => {
                    notices.push(notice);
                    None
                }
            }
        } else {
            None
        };

        let logged = if request.append_log {
            let recipient = match &delivery {
                Some(receipt) => receipt.recipients.join("; "),
                None => identity.email.clone(),
            };
            let row = IntakeLogRow {
                timestamp: completed_at,
                name: identity.name.clone(),
                company: identity.company.clone(),
                email: identity.email.clone(),
                score: result.score,
                tier: result.tier,
                recipient,
            };
            match self.collaborators.intake_log.append(&row) {
                Ok(()) => true,
                Err(err) => {
                    warn!(session = %id.0, error = %err, "intake log append failed");
                    notices.push(Notice::new(NoticeKind::LogFailed, language));
                    false
                }
            }
        } else {
            false
        };

        info!(
            session = %id.0,
            score = result.score,
            tier = %result.tier,
            notices = notices.len(),
            "eligibility assessment completed"
        );

        Ok(AssessmentOutcome {
            session_id: id.clone(),
            result,
            tier_label: result.tier.localized_label(language),
            components: assessment.components,
            report,
            report_available: document.is_some(),
            delivery,
            logged,
            notices,
        })
    }

    fn deliver_report(
        &self,
        id: &SessionId,
        identity: &ApplicantIdentity,
        report: &EligibilityReport,
        document: Option<&RenderedDocument>,
        language: Language,
    ) -> Result<DeliveryReceipt, Notice> {
        let Some(document) = document else {
            warn!(session = %id.0, "report delivery skipped: no rendered document");
            return Err(Notice::new(NoticeKind::DeliveryFailed, language));
        };

        let envelope = self.routing.envelope(
            &identity.email,
            &identity.company,
            report.to_text(),
            document.clone(),
        );

        self.collaborators
            .delivery
            .deliver(&envelope)
            .map(|receipt| {
                info!(session = %id.0, message_id = %receipt.message_id, "report delivered");
                receipt
            })
            .map_err(|err| {
                warn!(session = %id.0, error = %err, "report delivery failed");
                Notice::new(NoticeKind::DeliveryFailed, language)
            })
    }

    /// The rendered document from the session's latest assessment.
    pub fn report_document(&self, id: &SessionId) -> Result<RenderedDocument, IntakeError> {
        self.session(id)?
            .last_assessment
            .and_then(|stored| stored.document)
            .ok_or(IntakeError::NoReport)
    }
}

/// Error raised by the intake service.
#[derive(Debug, thiserror::Error)]
pub enum IntakeError {
    #[error("session '{0}' not found")]
    SessionNotFound(String),
    #[error("registration is required before the self-check")]
    NotRegistered,
    #[error("please type a question first")]
    EmptyQuestion,
    #[error("no report has been generated for this session")]
    NoReport,
    #[error(transparent)]
    Registration(#[from] RegistrationError),
    #[error(transparent)]
    Questionnaire(#[from] QuestionnaireError),
    #[error(transparent)]
    Store(#[from] SessionStoreError),
}
