use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{ApplicantIdentity, EligibilityApplication, Language};
use super::render::RenderedDocument;
use super::report::EligibilityReport;
use super::scoring::EligibilityAssessment;

/// Identifier wrapper for intake sessions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SessionId(pub String);

/// One answered advisor question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdvisorExchange {
    pub question: String,
    pub answer: String,
    pub asked_at: DateTime<Utc>,
}

/// Latest completed self-check kept for download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredAssessment {
    pub application: EligibilityApplication,
    pub assessment: EligibilityAssessment,
    pub report: EligibilityReport,
    pub document: Option<RenderedDocument>,
    pub completed_at: DateTime<Utc>,
}

/// Per-user intake context: registration, chat transcript, language, and the
/// last assessment. Passed explicitly; nothing is process-wide.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntakeSession {
    pub id: SessionId,
    pub language: Language,
    pub registration: Option<ApplicantIdentity>,
    pub transcript: Vec<AdvisorExchange>,
    pub last_assessment: Option<StoredAssessment>,
    pub started_at: DateTime<Utc>,
}

impl IntakeSession {
    pub fn new(id: SessionId, language: Language, started_at: DateTime<Utc>) -> Self {
        Self {
            id,
            language,
            registration: None,
            transcript: Vec::new(),
            last_assessment: None,
            started_at,
        }
    }

    pub fn is_registered(&self) -> bool {
        self.registration.is_some()
    }

    pub fn view(&self) -> SessionView {
        SessionView {
            session_id: self.id.clone(),
            language: self.language,
            registered: self.is_registered(),
            registration: self.registration.clone(),
            transcript: self.transcript.iter().rev().cloned().collect(),
            last_score: self
                .last_assessment
                .as_ref()
                .map(|stored| stored.assessment.result.score),
            report_available: self
                .last_assessment
                .as_ref()
                .is_some_and(|stored| stored.document.is_some()),
        }
    }
}

/// Public representation of a session. The transcript is newest first.
#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub session_id: SessionId,
    pub language: Language,
    pub registered: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registration: Option<ApplicantIdentity>,
    pub transcript: Vec<AdvisorExchange>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_score: Option<u32>,
    pub report_available: bool,
}

/// Storage abstraction so the service can be exercised in isolation.
///
/// `modify` applies a change to the stored session atomically: concurrent
/// requests on one session each see the other's committed fields.
pub trait SessionStore: Send + Sync {
    fn insert(&self, session: IntakeSession) -> Result<IntakeSession, SessionStoreError>;
    fn modify<F>(&self, id: &SessionId, change: F) -> Result<IntakeSession, SessionStoreError>
    where
        F: FnOnce(&mut IntakeSession);
    fn fetch(&self, id: &SessionId) -> Result<Option<IntakeSession>, SessionStoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum SessionStoreError {
    #[error("session already exists")]
    Conflict,
    #[error("session not found")]
    NotFound,
    #[error("session store unavailable: {0}")]
    Unavailable(String),
}
