use super::common::*;
use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{header, Request, StatusCode};
use serde_json::json;
use std::sync::Arc;
use tower::ServiceExt;

use crate::workflows::admissions::decision::DEFAULT_REJECTION_REASON;
use crate::workflows::admissions::domain::Assignments;
use crate::workflows::admissions::router::{self, RejectionRequest};
use crate::workflows::admissions::{AdmissionsService, InMemoryAdmissionsRepository};
use crate::workflows::identity::ACTOR_HEADER;

fn json_request(method: &str, uri: &str, payload: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .header(ACTOR_HEADER, "reviewer-1")
        .body(Body::from(payload.to_string()))
        .expect("request builds")
}

#[tokio::test]
async fn submit_route_accepts_payloads() {
    let (service, _, _) = build_service();
    let router = router_with_service(service);

    let response = router
        .oneshot(
            Request::post("/api/v1/admissions/applications")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    serde_json::to_vec(&teacher_submission("t@example.com")).expect("encode"),
                ))
                .expect("request builds"),
        )
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let payload = read_json_body(response).await;
    assert_eq!(payload["status"], "pending");
    assert_eq!(
        payload["message"],
        "Your application has been submitted and is awaiting review."
    );
    assert!(payload.get("application_id").is_some());
}

#[tokio::test]
async fn submit_handler_returns_conflict_on_duplicate_email() {
    let (service, _, _) = build_service();
    let service = Arc::new(service);
    service
        .submit(student_submission("s@example.com"))
        .expect("first submission");

    let response = router::submit_handler::<InMemoryAdmissionsRepository, MemoryNotifier>(
        State(service),
        axum::Json(student_submission("S@example.com")),
    )
    .await;

    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn submit_handler_returns_unprocessable_for_invalid_email() {
    let (service, _, _) = build_service();

    let response = router::submit_handler::<InMemoryAdmissionsRepository, MemoryNotifier>(
        State(Arc::new(service)),
        axum::Json(student_submission("not-an-email")),
    )
    .await;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let payload = read_json_body(response).await;
    assert!(payload["error"]
        .as_str()
        .expect("error message")
        .contains("not-an-email"));
}

#[tokio::test]
async fn submit_handler_hides_store_failures() {
    let service = Arc::new(AdmissionsService::new(
        Arc::new(UnavailableRepository),
        Arc::new(MemoryNotifier::default()),
    ));

    let response = router::submit_handler::<UnavailableRepository, MemoryNotifier>(
        State(service),
        axum::Json(student_submission("s@example.com")),
    )
    .await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let payload = read_json_body(response).await;
    assert_eq!(
        payload["error"],
        "the request could not be saved, please try again"
    );
}

#[tokio::test]
async fn approve_route_requires_actor() {
    let (service, _, _) = build_service();
    let application = service
        .submit(student_submission("s@example.com"))
        .expect("submit");
    let router = router_with_service(service);

    let response = router
        .oneshot(
            Request::post(format!(
                "/api/v1/admissions/applications/{}/approve",
                application.id
            ))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{}"))
            .expect("request builds"),
        )
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn approve_route_records_assignments() {
    let (service, _, _) = build_service();
    let application = service
        .submit(teacher_submission("t@example.com"))
        .expect("submit");
    let router = router_with_service(service);

    let response = router
        .clone()
        .oneshot(json_request(
            "POST",
            &format!("/api/v1/admissions/applications/{}/approve", application.id),
            json!({ "classes": ["Grade 10"], "subjects": ["Physics"] }),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["assigned_classes"], json!(["Grade 10"]));
    assert_eq!(payload["approved_by"], "reviewer-1");

    let response = router
        .oneshot(
            Request::get("/api/v1/admissions/approved")
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("route executes");
    let payload = read_json_body(response).await;
    assert_eq!(payload.as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn approve_route_refuses_teacher_without_classes() {
    let (service, _, _) = build_service();
    let application = service
        .submit(teacher_submission("t@example.com"))
        .expect("submit");
    let router = router_with_service(service);

    let response = router
        .oneshot(json_request(
            "POST",
            &format!("/api/v1/admissions/applications/{}/approve", application.id),
            json!({ "subjects": ["Physics"] }),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn reject_route_without_body_uses_default_reason() {
    let (service, _, _) = build_service();
    let application = service
        .submit(student_submission("s@example.com"))
        .expect("submit");
    let router = router_with_service(service);

    let response = router
        .clone()
        .oneshot(
            Request::post(format!(
                "/api/v1/admissions/applications/{}/reject",
                application.id
            ))
            .header(ACTOR_HEADER, "reviewer-1")
            .body(Body::empty())
            .expect("request builds"),
        )
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["reason"], DEFAULT_REJECTION_REASON);

    let response = router
        .oneshot(
            Request::get(format!("/api/v1/admissions/applications/{}", application.id))
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("route executes");
    let payload = read_json_body(response).await;
    assert_eq!(payload["status"], "rejected");
    assert_eq!(payload["reason"], DEFAULT_REJECTION_REASON);
}

#[tokio::test]
async fn approval_check_route_reports_teacher_gate() {
    let (service, _, _) = build_service();
    let application = service
        .submit(teacher_submission("t@example.com"))
        .expect("submit");
    let router = router_with_service(service);
    let uri = format!(
        "/api/v1/admissions/applications/{}/approval-check",
        application.id
    );

    let response = router
        .clone()
        .oneshot(json_request("POST", &uri, json!({ "subjects": ["Physics"] })))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(read_json_body(response).await["can_approve"], false);

    let response = router
        .oneshot(json_request("POST", &uri, json!({ "classes": ["Grade 10"] })))
        .await
        .expect("route executes");
    assert_eq!(read_json_body(response).await["can_approve"], true);
}

#[tokio::test]
async fn reject_route_refuses_malformed_body_without_deciding() {
    let (service, _, _) = build_service();
    let application = service
        .submit(student_submission("s@example.com"))
        .expect("submit");
    let router = router_with_service(service);

    let response = router
        .clone()
        .oneshot(
            Request::post(format!(
                "/api/v1/admissions/applications/{}/reject",
                application.id
            ))
            .header(header::CONTENT_TYPE, "application/json")
            .header(ACTOR_HEADER, "reviewer-1")
            .body(Body::from(r#"{"reason": "Missing transcripts""#))
            .expect("request builds"),
        )
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let response = router
        .oneshot(
            Request::get(format!("/api/v1/admissions/applications/{}", application.id))
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("route executes");
    let payload = read_json_body(response).await;
    assert_eq!(payload["status"], "pending");
}

#[test]
fn rejection_request_parses_empty_and_explicit_bodies() {
    assert_eq!(RejectionRequest::from_body(b"").expect("empty").reason, None);
    assert_eq!(RejectionRequest::from_body(b"  \n").expect("blank").reason, None);
    assert_eq!(
        RejectionRequest::from_body(br#"{"reason":"Missing transcripts"}"#)
            .expect("reason")
            .reason
            .as_deref(),
        Some("Missing transcripts")
    );
    assert!(RejectionRequest::from_body(br#"{"reason": 4}"#).is_err());
}

#[tokio::test]
async fn reject_handler_conflicts_after_approval() {
    let (service, _, _) = build_service();
    let service = Arc::new(service);
    let application = service
        .submit(student_submission("s@example.com"))
        .expect("submit");
    service
        .approve(&application.id, Assignments::default(), &reviewer())
        .expect("approve");

    let mut headers = axum::http::HeaderMap::new();
    headers.insert(ACTOR_HEADER, "reviewer-2".parse().expect("header value"));
    let response = router::reject_handler::<InMemoryAdmissionsRepository, MemoryNotifier>(
        State(service),
        Path(application.id.0.clone()),
        headers,
        axum::body::Bytes::from(json!({ "reason": "changed my mind" }).to_string()),
    )
    .await;

    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn status_route_returns_not_found_for_unknown_id() {
    let (service, _, _) = build_service();
    let router = router_with_service(service);

    let response = router
        .oneshot(
            Request::get("/api/v1/admissions/applications/app-999999")
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn pending_by_role_route_lists_every_role() {
    let (service, _, _) = build_service();
    service
        .submit(parent_submission("p@example.com", None))
        .expect("submit");
    let router = router_with_service(service);

    let response = router
        .oneshot(
            Request::get("/api/v1/admissions/pending/by-role")
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["student"], json!([]));
    assert_eq!(payload["teacher"], json!([]));
    assert_eq!(payload["parent"].as_array().map(Vec::len), Some(1));
}
