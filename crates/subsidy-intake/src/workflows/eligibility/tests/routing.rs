use super::common::*;
use axum::body::Body;
use axum::extract::State;
use axum::http::{header, Request, StatusCode};
use axum::response::Response;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use crate::workflows::eligibility::session::{
    IntakeSession, SessionId, SessionStore, SessionStoreError,
};
use crate::workflows::eligibility::{
    DeliveryRouting, IntakeCollaborators, IntakeService, Language, PdfReportRenderer,
};

#[derive(Default)]
struct UnavailableStore;

impl SessionStore for UnavailableStore {
    fn insert(&self, _session: IntakeSession) -> Result<IntakeSession, SessionStoreError> {
        Err(SessionStoreError::Unavailable("store offline".to_string()))
    }

    fn modify<F>(&self, _id: &SessionId, _change: F) -> Result<IntakeSession, SessionStoreError>
    where
        F: FnOnce(&mut IntakeSession),
    {
        Err(SessionStoreError::Unavailable("store offline".to_string()))
    }

    fn fetch(&self, _id: &SessionId) -> Result<Option<IntakeSession>, SessionStoreError> {
        Err(SessionStoreError::Unavailable("store offline".to_string()))
    }
}

fn json_request(method: &str, uri: &str, payload: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(payload.to_string()))
        .unwrap()
}

async fn send(router: &axum::Router, request: Request<Body>) -> Response {
    router.clone().oneshot(request).await.unwrap()
}

fn assessment_payload(email_report: bool) -> Value {
    json!({
        "company_age": "three_years_or_more",
        "industries": ["ai"],
        "research_budget": "at_least_200k",
        "export_ready": false,
        "annual_revenue": "under_500k",
        "employee_count": 10,
        "documents": ["business_plan", "budget"],
        "email_report": email_report,
        "append_log": true
    })
}

async fn registered_session(router: &axum::Router) -> String {
    let response = send(
        router,
        json_request("POST", "/api/v1/intake/sessions", json!({ "language": "en" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let session_id = read_json_body(response).await["session_id"]
        .as_str()
        .unwrap()
        .to_string();

    let response = send(
        router,
        json_request(
            "POST",
            &format!("/api/v1/intake/sessions/{session_id}/registration"),
            json!({
                "name": "Mika Tanaka",
                "company": "Kumo Robotics",
                "email": "mika@kumo.example"
            }),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    session_id
}

#[tokio::test]
async fn score_handler_returns_components() {
    let service = Arc::new(harness().service);
    let response = crate::workflows::eligibility::router::score_handler::<MemorySessionStore>(
        State(service),
        axum::Json(needs_review_application()),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    assert_eq!(body["score"], 69);
    assert_eq!(body["tier"], "needs_review");
    assert_eq!(body["tier_label"], "Needs Review");
    assert_eq!(body["components"].as_array().unwrap().len(), 5);
}

#[tokio::test]
async fn score_route_accepts_partial_applications() {
    let router = router_for(harness());
    let response = send(
        &router,
        json_request(
            "POST",
            "/api/v1/eligibility/score",
            json!({ "employee_count": 150 }),
        ),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    assert_eq!(body["score"], 0);
    assert_eq!(body["tier"], "not_eligible");
}

#[tokio::test]
async fn score_route_rejects_out_of_range_workforce() {
    let router = router_for(harness());
    for employee_count in [0, 201, 65535] {
        let response = send(
            &router,
            json_request(
                "POST",
                "/api/v1/eligibility/score",
                json!({ "employee_count": employee_count }),
            ),
        )
        .await;

        assert_eq!(
            response.status(),
            StatusCode::UNPROCESSABLE_ENTITY,
            "employee_count {employee_count}"
        );
        let body = read_json_body(response).await;
        assert!(body["error"].as_str().unwrap().contains("outside supported range"));
    }
}

#[tokio::test]
async fn header_breaking_company_is_rejected_at_registration() {
    let router = router_for(harness());
    let response = send(
        &router,
        json_request("POST", "/api/v1/intake/sessions", json!({})),
    )
    .await;
    let session_id = read_json_body(response).await["session_id"]
        .as_str()
        .unwrap()
        .to_string();

    let response = send(
        &router,
        json_request(
            "POST",
            &format!("/api/v1/intake/sessions/{session_id}/registration"),
            json!({
                "name": "Mika Tanaka",
                "company": "Acme\nBcc: attacker@evil.example",
                "email": "mika@kumo.example"
            }),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn unknown_session_returns_not_found() {
    let router = router_for(harness());
    let response = send(
        &router,
        Request::get("/api/v1/intake/sessions/sess-unknown")
            .body(Body::empty())
            .unwrap(),
    )
    .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = read_json_body(response).await;
    assert!(body["error"].as_str().unwrap().contains("sess-unknown"));
}

#[tokio::test]
async fn invalid_registration_is_unprocessable() {
    let router = router_for(harness());
    let response = send(
        &router,
        json_request("POST", "/api/v1/intake/sessions", json!({ "language": "ja" })),
    )
    .await;
    let body = read_json_body(response).await;
    assert_eq!(body["language"], "ja");
    let session_id = body["session_id"].as_str().unwrap().to_string();

    let response = send(
        &router,
        json_request(
            "POST",
            &format!("/api/v1/intake/sessions/{session_id}/registration"),
            json!({ "name": " ", "company": "Kumo", "email": "mika@kumo.example" }),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn assessment_before_registration_conflicts() {
    let router = router_for(harness());
    let response = send(
        &router,
        json_request("POST", "/api/v1/intake/sessions", json!({})),
    )
    .await;
    let session_id = read_json_body(response).await["session_id"]
        .as_str()
        .unwrap()
        .to_string();

    let response = send(
        &router,
        json_request(
            "POST",
            &format!("/api/v1/intake/sessions/{session_id}/assessment"),
            assessment_payload(false),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn blank_question_is_bad_request() {
    let router = router_for(harness());
    let session_id = registered_session(&router).await;

    let response = send(
        &router,
        json_request(
            "POST",
            &format!("/api/v1/intake/sessions/{session_id}/questions"),
            json!({ "question": "  " }),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn assessment_then_report_download() {
    let router = router_for(harness());
    let session_id = registered_session(&router).await;

    let response = send(
        &router,
        Request::get(format!("/api/v1/intake/sessions/{session_id}/report"))
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = send(
        &router,
        json_request(
            "POST",
            &format!("/api/v1/intake/sessions/{session_id}/assessment"),
            assessment_payload(true),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    assert_eq!(body["score"], 69);
    assert_eq!(body["tier_label"], "Needs Review");
    assert_eq!(body["report_available"], true);
    assert_eq!(body["logged"], true);
    assert_eq!(
        body["delivery"]["recipients"],
        json!(["mika@kumo.example", OVERSIGHT])
    );

    let response = send(
        &router,
        Request::get(format!("/api/v1/intake/sessions/{session_id}/report"))
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "application/pdf"
    );
    let disposition = response.headers()[header::CONTENT_DISPOSITION]
        .to_str()
        .unwrap()
        .to_string();
    assert!(disposition.starts_with("attachment; filename=\"report_"));
    let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .unwrap();
    assert!(bytes.starts_with(b"%PDF-1.4"));
}

#[tokio::test]
async fn store_outage_is_service_unavailable() {
    let collaborators = IntakeCollaborators {
        advisor: Arc::new(ScriptedAdvisor::offline()),
        renderer: Arc::new(PdfReportRenderer),
        delivery: Arc::new(MemoryOutbox::default()),
        intake_log: Arc::new(MemoryLog::default()),
    };
    let service = Arc::new(IntakeService::new(
        Arc::new(UnavailableStore),
        collaborators,
        DeliveryRouting::default(),
    ));
    let router = crate::workflows::eligibility::intake_router(service);

    let response = send(
        &router,
        json_request(
            "POST",
            "/api/v1/intake/sessions",
            json!({ "language": Language::English }),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}
