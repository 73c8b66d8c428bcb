use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::error;

use crate::error::AppError;

use super::domain::{ApplicantIdentity, EligibilityApplication, Language};
use super::questionnaire::validate_employee_count;
use super::scoring::{ScoreComponent, ScoreResult};
use super::service::{AssessmentRequest, IntakeError, IntakeService};
use super::session::{SessionId, SessionStore, SessionStoreError};

#[derive(Debug, Default, Deserialize)]
pub(crate) struct StartSessionRequest {
    #[serde(default)]
    pub(crate) language: Language,
}

#[derive(Debug, Deserialize)]
pub(crate) struct QuestionRequest {
    pub(crate) question: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct ScoreView {
    #[serde(flatten)]
    pub(crate) result: ScoreResult,
    pub(crate) tier_label: &'static str,
    pub(crate) components: Vec<ScoreComponent>,
}

/// Router builder exposing the scoring and intake endpoints.
pub fn intake_router<S>(service: Arc<IntakeService<S>>) -> Router
where
    S: SessionStore + 'static,
{
    Router::new()
        .route("/api/v1/eligibility/score", post(score_handler::<S>))
        .route("/api/v1/intake/sessions", post(start_session_handler::<S>))
        .route(
            "/api/v1/intake/sessions/:session_id",
            get(session_handler::<S>),
        )
        .route(
            "/api/v1/intake/sessions/:session_id/registration",
            post(register_handler::<S>),
        )
        .route(
            "/api/v1/intake/sessions/:session_id/questions",
            post(question_handler::<S>),
        )
        .route(
            "/api/v1/intake/sessions/:session_id/assessment",
            post(assessment_handler::<S>),
        )
        .route(
            "/api/v1/intake/sessions/:session_id/report",
            get(report_handler::<S>),
        )
        .with_state(service)
}

pub(crate) async fn score_handler<S>(
    State(service): State<Arc<IntakeService<S>>>,
    axum::Json(application): axum::Json<EligibilityApplication>,
) -> Response
where
    S: SessionStore + 'static,
{
    if let Err(err) = validate_employee_count(application.employee_count) {
        return AppError::from(err).into_response();
    }

    let assessment = service.engine().assess(&application);
    let view = ScoreView {
        result: assessment.result,
        tier_label: assessment.result.tier.label(),
        components: assessment.components,
    };
    (StatusCode::OK, axum::Json(view)).into_response()
}

pub(crate) async fn start_session_handler<S>(
    State(service): State<Arc<IntakeService<S>>>,
    axum::Json(request): axum::Json<StartSessionRequest>,
) -> Response
where
    S: SessionStore + 'static,
{
    match service.start_session(request.language) {
        Ok(session) => (StatusCode::CREATED, axum::Json(session.view())).into_response(),
        Err(err) => AppError::from(err).into_response(),
    }
}

pub(crate) async fn session_handler<S>(
    State(service): State<Arc<IntakeService<S>>>,
    Path(session_id): Path<String>,
) -> Response
where
    S: SessionStore + 'static,
{
    match service.session(&SessionId(session_id)) {
        Ok(session) => (StatusCode::OK, axum::Json(session.view())).into_response(),
        Err(err) => AppError::from(err).into_response(),
    }
}

pub(crate) async fn register_handler<S>(
    State(service): State<Arc<IntakeService<S>>>,
    Path(session_id): Path<String>,
    axum::Json(registration): axum::Json<ApplicantIdentity>,
) -> Response
where
    S: SessionStore + 'static,
{
    match service.register(&SessionId(session_id), registration) {
        Ok(session) => (StatusCode::OK, axum::Json(session.view())).into_response(),
        Err(err) => AppError::from(err).into_response(),
    }
}

pub(crate) async fn question_handler<S>(
    State(service): State<Arc<IntakeService<S>>>,
    Path(session_id): Path<String>,
    axum::Json(request): axum::Json<QuestionRequest>,
) -> Response
where
    S: SessionStore + 'static,
{
    let id = SessionId(session_id);
    // The advisor blocks on a remote HTTP call.
    let outcome =
        tokio::task::spawn_blocking(move || service.ask(&id, &request.question)).await;

    match outcome {
        Ok(Ok(outcome)) => (StatusCode::OK, axum::Json(outcome)).into_response(),
        Ok(Err(err)) => AppError::from(err).into_response(),
        Err(join_error) => {
            error!(error = %join_error, "advisor task panicked");
            let payload = json!({ "error": "advisor task failed" });
            (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response()
        }
    }
}

pub(crate) async fn assessment_handler<S>(
    State(service): State<Arc<IntakeService<S>>>,
    Path(session_id): Path<String>,
    axum::Json(request): axum::Json<AssessmentRequest>,
) -> Response
where
    S: SessionStore + 'static,
{
    let id = SessionId(session_id);
    let outcome = tokio::task::spawn_blocking(move || service.assess(&id, request)).await;

    match outcome {
        Ok(Ok(outcome)) => (StatusCode::OK, axum::Json(outcome)).into_response(),
        Ok(Err(err)) => AppError::from(err).into_response(),
        Err(join_error) => {
            error!(error = %join_error, "assessment task panicked");
            let payload = json!({ "error": "assessment task failed" });
            (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response()
        }
    }
}

pub(crate) async fn report_handler<S>(
    State(service): State<Arc<IntakeService<S>>>,
    Path(session_id): Path<String>,
) -> Response
where
    S: SessionStore + 'static,
{
    match service.report_document(&SessionId(session_id)) {
        Ok(document) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, document.content_type.to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{}\"", document.file_name),
                ),
            ],
            document.bytes,
        )
            .into_response(),
        Err(err) => AppError::from(err).into_response(),
    }
}

/// HTTP status for each intake failure; `AppError` responses use this table.
pub(crate) fn intake_status(err: &IntakeError) -> StatusCode {
    match err {
        IntakeError::SessionNotFound(_)
        | IntakeError::NoReport
        | IntakeError::Store(SessionStoreError::NotFound) => StatusCode::NOT_FOUND,
        IntakeError::Registration(_) | IntakeError::Questionnaire(_) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        IntakeError::EmptyQuestion => StatusCode::BAD_REQUEST,
        IntakeError::NotRegistered => StatusCode::CONFLICT,
        IntakeError::Store(SessionStoreError::Conflict) => StatusCode::CONFLICT,
        IntakeError::Store(SessionStoreError::Unavailable(_)) => {
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
