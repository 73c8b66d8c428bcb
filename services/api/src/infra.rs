use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex, MutexGuard};
use subsidy_intake::workflows::eligibility::{
    AdvisorError, DeliveryEnvelope, DeliveryError, DeliveryReceipt, DeliverySink, IntakeLog,
    IntakeLogError, IntakeLogRow, IntakeSession, SessionId, SessionStore, SessionStoreError,
    SubsidyAdvisor,
};
use tracing::debug;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

const MAX_SESSIONS: usize = 10_000;

/// Process-local session storage; sessions do not survive a restart.
///
/// Holds at most `limit` sessions. Starting one more evicts the session that
/// started earliest.
#[derive(Clone)]
pub(crate) struct InMemorySessionStore {
    sessions: Arc<Mutex<HashMap<SessionId, IntakeSession>>>,
    limit: usize,
}

impl Default for InMemorySessionStore {
    fn default() -> Self {
        Self::with_limit(MAX_SESSIONS)
    }
}

impl InMemorySessionStore {
    pub(crate) fn with_limit(limit: usize) -> Self {
        Self {
            sessions: Arc::default(),
            limit: limit.max(1),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<SessionId, IntakeSession>>, SessionStoreError> {
        self.sessions
            .lock()
            .map_err(|_| SessionStoreError::Unavailable("session mutex poisoned".to_string()))
    }
}

impl SessionStore for InMemorySessionStore {
    fn insert(&self, session: IntakeSession) -> Result<IntakeSession, SessionStoreError> {
        let mut guard = self.lock()?;
        if guard.contains_key(&session.id) {
            return Err(SessionStoreError::Conflict);
        }
        while guard.len() >= self.limit {
            let oldest = guard
                .values()
                .min_by_key(|stored| stored.started_at)
                .map(|stored| stored.id.clone());
            match oldest {
                Some(id) => {
                    guard.remove(&id);
                    debug!(session = %id.0, "evicted oldest session");
                }
                None => break,
            }
        }
        guard.insert(session.id.clone(), session.clone());
        Ok(session)
    }

    fn modify<F>(&self, id: &SessionId, change: F) -> Result<IntakeSession, SessionStoreError>
    where
        F: FnOnce(&mut IntakeSession),
    {
        let mut guard = self.lock()?;
        let session = guard.get_mut(id).ok_or(SessionStoreError::NotFound)?;
        change(session);
        Ok(session.clone())
    }

    fn fetch(&self, id: &SessionId) -> Result<Option<IntakeSession>, SessionStoreError> {
        Ok(self.lock()?.get(id).cloned())
    }
}

/// Offline advisor for demos: answers from a fixed program summary.
#[derive(Debug, Default)]
pub(crate) struct ScriptedAdvisor {
    pub(crate) offline: bool,
}

impl SubsidyAdvisor for ScriptedAdvisor {
    fn answer(&self, question: &str) -> Result<String, AdvisorError> {
        if self.offline {
            return Err(AdvisorError::Transport("demo advisor offline".to_string()));
        }
        let question = question.to_lowercase();
        let answer = if question.contains("export") {
            "Export Assistance targets companies with $500K+ in domestic sales that plan to sell abroad."
        } else if question.contains("r&d") || question.contains("research") {
            "R&D Innovation covers AI and Biotech firms operating 3+ years with at least $200K in annual R&D spend."
        } else {
            "SME Expansion supports companies with 5-100 employees and under $50M in revenue."
        };
        Ok(answer.to_string())
    }
}

#[derive(Debug, Default, Clone)]
pub(crate) struct InMemoryOutbox {
    sent: Arc<Mutex<Vec<DeliveryEnvelope>>>,
}

impl DeliverySink for InMemoryOutbox {
    fn deliver(&self, envelope: &DeliveryEnvelope) -> Result<DeliveryReceipt, DeliveryError> {
        let mut guard = self
            .sent
            .lock()
            .map_err(|_| DeliveryError::Transport("outbox mutex poisoned".to_string()))?;
        guard.push(envelope.clone());
        Ok(DeliveryReceipt {
            message_id: format!("demo-{:04}", guard.len()),
            recipients: envelope.recipients().map(str::to_string).collect(),
        })
    }
}

impl InMemoryOutbox {
    pub(crate) fn sent(&self) -> Vec<DeliveryEnvelope> {
        self.sent.lock().expect("outbox mutex poisoned").clone()
    }
}

#[derive(Debug, Default, Clone)]
pub(crate) struct InMemoryIntakeLog {
    rows: Arc<Mutex<Vec<IntakeLogRow>>>,
}

impl IntakeLog for InMemoryIntakeLog {
    fn append(&self, row: &IntakeLogRow) -> Result<(), IntakeLogError> {
        self.rows
            .lock()
            .map_err(|_| IntakeLogError::Poisoned)?
            .push(row.clone());
        Ok(())
    }
}

impl InMemoryIntakeLog {
    pub(crate) fn rows(&self) -> Vec<IntakeLogRow> {
        self.rows.lock().expect("log mutex poisoned").clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use subsidy_intake::workflows::eligibility::Language;

    fn session(id: &str, started_at: chrono::DateTime<Utc>) -> IntakeSession {
        IntakeSession::new(SessionId(id.to_string()), Language::English, started_at)
    }

    #[test]
    fn modify_requires_existing_session() {
        let store = InMemorySessionStore::default();
        let id = SessionId("sess-1".to_string());

        assert!(matches!(
            store.modify(&id, |stored| stored.language = Language::Japanese),
            Err(SessionStoreError::NotFound)
        ));
        store.insert(session("sess-1", Utc::now())).expect("inserted");
        assert!(matches!(
            store.insert(session("sess-1", Utc::now())),
            Err(SessionStoreError::Conflict)
        ));
        let modified = store
            .modify(&id, |stored| stored.language = Language::Japanese)
            .expect("modified");
        assert_eq!(modified.language, Language::Japanese);
        assert_eq!(
            store.fetch(&id).expect("fetch").map(|stored| stored.language),
            Some(Language::Japanese)
        );
    }

    #[test]
    fn full_store_evicts_the_earliest_session() {
        let store = InMemorySessionStore::with_limit(2);
        let now = Utc::now();
        store
            .insert(session("sess-2", now - Duration::minutes(5)))
            .expect("inserted");
        store
            .insert(session("sess-1", now - Duration::minutes(10)))
            .expect("inserted");
        store.insert(session("sess-3", now)).expect("inserted");

        let held = |id: &str| {
            store
                .fetch(&SessionId(id.to_string()))
                .expect("fetch")
                .is_some()
        };
        assert!(!held("sess-1"));
        assert!(held("sess-2"));
        assert!(held("sess-3"));
    }

    #[test]
    fn scripted_advisor_routes_by_topic() {
        let advisor = ScriptedAdvisor::default();
        assert!(advisor
            .answer("Can we get export help?")
            .expect("answer")
            .contains("Export Assistance"));
        assert!(ScriptedAdvisor { offline: true }.answer("hi").is_err());
    }
}
