use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex};

use axum::response::Response;
use serde_json::Value;

use crate::workflows::eligibility::advisor::{AdvisorError, SubsidyAdvisor};
use crate::workflows::eligibility::delivery::{
    DeliveryEnvelope, DeliveryError, DeliveryReceipt, DeliveryRouting, DeliverySink,
};
use crate::workflows::eligibility::domain::{
    ApplicantIdentity, EligibilityApplication, Industry, SupportingDocument,
};
use crate::workflows::eligibility::intake_log::{IntakeLog, IntakeLogError, IntakeLogRow};
use crate::workflows::eligibility::questionnaire::{
    CompanyAgeBracket, QuestionnaireAnswers, ResearchBudgetBracket, RevenueBracket,
};
use crate::workflows::eligibility::render::{DocumentRenderer, PdfReportRenderer};
use crate::workflows::eligibility::session::{
    IntakeSession, SessionId, SessionStore, SessionStoreError,
};
use crate::workflows::eligibility::{
    intake_router, IntakeCollaborators, IntakeService, RenderError, RenderedDocument,
};

pub(super) const OVERSIGHT: &str = "review@example.org";

/// The worked example from the self-check form: 15 + 20 + 20 + 10 + 4 = 69.
pub(super) fn needs_review_application() -> EligibilityApplication {
    EligibilityApplication {
        company_age_at_least_three_years: true,
        industries: BTreeSet::from([Industry::Ai]),
        research_budget_at_least_threshold: true,
        export_active: false,
        annual_revenue_at_least_threshold: false,
        employee_count: 10,
        documents_provided: BTreeSet::from([
            SupportingDocument::BusinessPlan,
            SupportingDocument::Budget,
        ]),
    }
}

pub(super) fn all_rules_application() -> EligibilityApplication {
    EligibilityApplication {
        company_age_at_least_three_years: true,
        industries: BTreeSet::from([Industry::Ai, Industry::Iot]),
        research_budget_at_least_threshold: true,
        export_active: true,
        annual_revenue_at_least_threshold: true,
        employee_count: 50,
        documents_provided: SupportingDocument::standard().into_iter().collect(),
    }
}

pub(super) fn needs_review_answers() -> QuestionnaireAnswers {
    QuestionnaireAnswers {
        company_age: CompanyAgeBracket::ThreeYearsOrMore,
        industries: vec![Industry::Ai],
        research_budget: ResearchBudgetBracket::AtLeast200K,
        export_ready: false,
        annual_revenue: RevenueBracket::Under500K,
        employee_count: 10,
        documents: vec![SupportingDocument::BusinessPlan, SupportingDocument::Budget],
    }
}

pub(super) fn identity() -> ApplicantIdentity {
    ApplicantIdentity {
        name: "Mika Tanaka".to_string(),
        company: "Kumo Robotics".to_string(),
        email: "mika@kumo.example".to_string(),
        address: Some("1-2-3 Shibuya, Tokyo".to_string()),
    }
}

#[derive(Default, Clone)]
pub(super) struct MemorySessionStore {
    pub(super) sessions: Arc<Mutex<HashMap<SessionId, IntakeSession>>>,
}

impl SessionStore for MemorySessionStore {
    fn insert(&self, session: IntakeSession) -> Result<IntakeSession, SessionStoreError> {
        let mut guard = self.sessions.lock().expect("session mutex poisoned");
        if guard.contains_key(&session.id) {
            return Err(SessionStoreError::Conflict);
        }
        guard.insert(session.id.clone(), session.clone());
        Ok(session)
    }

    fn modify<F>(&self, id: &SessionId, change: F) -> Result<IntakeSession, SessionStoreError>
    where
        F: FnOnce(&mut IntakeSession),
    {
        let mut guard = self.sessions.lock().expect("session mutex poisoned");
        let session = guard.get_mut(id).ok_or(SessionStoreError::NotFound)?;
        change(session);
        Ok(session.clone())
    }

    fn fetch(&self, id: &SessionId) -> Result<Option<IntakeSession>, SessionStoreError> {
        let guard = self.sessions.lock().expect("session mutex poisoned");
        Ok(guard.get(id).cloned())
    }
}

#[derive(Debug)]
pub(super) struct ScriptedAdvisor {
    pub(super) reply: Option<String>,
    pub(super) questions: Mutex<Vec<String>>,
}

impl ScriptedAdvisor {
    pub(super) fn answering(reply: &str) -> Self {
        Self {
            reply: Some(reply.to_string()),
            questions: Mutex::new(Vec::new()),
        }
    }

    pub(super) fn offline() -> Self {
        Self {
            reply: None,
            questions: Mutex::new(Vec::new()),
        }
    }

    pub(super) fn questions(&self) -> Vec<String> {
        self.questions.lock().expect("advisor mutex").clone()
    }
}

impl SubsidyAdvisor for ScriptedAdvisor {
    fn answer(&self, question: &str) -> Result<String, AdvisorError> {
        self.questions
            .lock()
            .expect("advisor mutex")
            .push(question.to_string());
        self.reply
            .clone()
            .ok_or_else(|| AdvisorError::Transport("connection refused".to_string()))
    }
}

#[derive(Debug)]
pub(super) struct BrokenRenderer;

impl DocumentRenderer for BrokenRenderer {
    fn render(
        &self,
        _report: &crate::workflows::eligibility::EligibilityReport,
    ) -> Result<RenderedDocument, RenderError> {
        Err(RenderError::Backend("font cache missing".to_string()))
    }
}

#[derive(Debug, Default)]
pub(super) struct MemoryOutbox {
    pub(super) fail: bool,
    pub(super) sent: Mutex<Vec<DeliveryEnvelope>>,
}

impl MemoryOutbox {
    pub(super) fn failing() -> Self {
        Self {
            fail: true,
            sent: Mutex::new(Vec::new()),
        }
    }

    pub(super) fn sent(&self) -> Vec<DeliveryEnvelope> {
        self.sent.lock().expect("outbox mutex").clone()
    }
}

impl DeliverySink for MemoryOutbox {
    fn deliver(&self, envelope: &DeliveryEnvelope) -> Result<DeliveryReceipt, DeliveryError> {
        if self.fail {
            return Err(DeliveryError::Transport("smtp relay offline".to_string()));
        }
        self.sent
            .lock()
            .expect("outbox mutex")
            .push(envelope.clone());
        Ok(DeliveryReceipt {
            message_id: "msg-1".to_string(),
            recipients: envelope.recipients().map(str::to_string).collect(),
        })
    }
}

#[derive(Debug, Default)]
pub(super) struct MemoryLog {
    pub(super) fail: bool,
    pub(super) rows: Mutex<Vec<IntakeLogRow>>,
}

impl MemoryLog {
    pub(super) fn failing() -> Self {
        Self {
            fail: true,
            rows: Mutex::new(Vec::new()),
        }
    }

    pub(super) fn rows(&self) -> Vec<IntakeLogRow> {
        self.rows.lock().expect("log mutex").clone()
    }
}

impl IntakeLog for MemoryLog {
    fn append(&self, row: &IntakeLogRow) -> Result<(), IntakeLogError> {
        if self.fail {
            return Err(IntakeLogError::Io(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "sheet is read only",
            )));
        }
        self.rows.lock().expect("log mutex").push(row.clone());
        Ok(())
    }
}

pub(super) struct Harness {
    pub(super) service: IntakeService<MemorySessionStore>,
    pub(super) advisor: Arc<ScriptedAdvisor>,
    pub(super) outbox: Arc<MemoryOutbox>,
    pub(super) log: Arc<MemoryLog>,
}

pub(super) fn harness_with(
    advisor: ScriptedAdvisor,
    renderer: Arc<dyn DocumentRenderer>,
    outbox: MemoryOutbox,
    log: MemoryLog,
) -> Harness {
    let advisor = Arc::new(advisor);
    let outbox = Arc::new(outbox);
    let log = Arc::new(log);
    let collaborators = IntakeCollaborators {
        advisor: advisor.clone(),
        renderer,
        delivery: outbox.clone(),
        intake_log: log.clone(),
    };
    let service = IntakeService::new(
        Arc::new(MemorySessionStore::default()),
        collaborators,
        DeliveryRouting::new(Some(OVERSIGHT.to_string())),
    );
    Harness {
        service,
        advisor,
        outbox,
        log,
    }
}

pub(super) fn service_with_advisor(
    advisor: Arc<dyn SubsidyAdvisor>,
) -> IntakeService<MemorySessionStore> {
    let collaborators = IntakeCollaborators {
        advisor,
        renderer: Arc::new(PdfReportRenderer),
        delivery: Arc::new(MemoryOutbox::default()),
        intake_log: Arc::new(MemoryLog::default()),
    };
    IntakeService::new(
        Arc::new(MemorySessionStore::default()),
        collaborators,
        DeliveryRouting::new(Some(OVERSIGHT.to_string())),
    )
}

pub(super) fn harness() -> Harness {
    harness_with(
        ScriptedAdvisor::answering("SME Expansion fits a 10-person team."),
        Arc::new(PdfReportRenderer),
        MemoryOutbox::default(),
        MemoryLog::default(),
    )
}

pub(super) fn router_for(harness: Harness) -> axum::Router {
    intake_router(Arc::new(harness.service))
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
