use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::error;

use super::domain::{ApplicationId, ApplicationSubmission, Assignments};
use super::intake::SUBMISSION_CONFIRMATION;
use super::repository::{AdmissionsRepository, DecisionNotifier};
use super::service::{AdmissionsError, AdmissionsService};
use crate::workflows::identity::{ActorId, ACTOR_HEADER};

/// Router builder exposing intake, the review queues and decisions.
pub fn admissions_router<R, N>(service: Arc<AdmissionsService<R, N>>) -> Router
where
    R: AdmissionsRepository + 'static,
    N: DecisionNotifier + 'static,
{
    Router::new()
        .route(
            "/api/v1/admissions/applications",
            post(submit_handler::<R, N>),
        )
        .route(
            "/api/v1/admissions/applications/:application_id",
            get(status_handler::<R, N>),
        )
        .route(
            "/api/v1/admissions/applications/:application_id/approve",
            post(approve_handler::<R, N>),
        )
        .route(
            "/api/v1/admissions/applications/:application_id/approval-check",
            post(approval_check_handler::<R, N>),
        )
        .route(
            "/api/v1/admissions/applications/:application_id/reject",
            post(reject_handler::<R, N>),
        )
        .route("/api/v1/admissions/pending", get(pending_handler::<R, N>))
        .route(
            "/api/v1/admissions/pending/by-role",
            get(pending_by_role_handler::<R, N>),
        )
        .route("/api/v1/admissions/approved", get(approved_handler::<R, N>))
        .with_state(service)
}

/// Acknowledgement returned once an application is queued.
#[derive(Debug, Serialize)]
pub struct SubmissionReceipt {
    pub application_id: ApplicationId,
    pub status: &'static str,
    pub message: &'static str,
}

#[derive(Debug, Default, Deserialize)]
pub struct RejectionRequest {
    #[serde(default)]
    pub reason: Option<String>,
}

impl RejectionRequest {
    /// An empty body means no reason; anything else must be a well-formed request.
    pub fn from_body(body: &[u8]) -> Result<Self, serde_json::Error> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }
        serde_json::from_slice(body)
    }
}

pub(crate) async fn submit_handler<R, N>(
    State(service): State<Arc<AdmissionsService<R, N>>>,
    axum::Json(submission): axum::Json<ApplicationSubmission>,
) -> Response
where
    R: AdmissionsRepository + 'static,
    N: DecisionNotifier + 'static,
{
    match service.submit(submission) {
        Ok(application) => {
            let receipt = SubmissionReceipt {
                application_id: application.id,
                status: "pending",
                message: SUBMISSION_CONFIRMATION,
            };
            (StatusCode::ACCEPTED, axum::Json(receipt)).into_response()
        }
        Err(err) => error_response(err),
    }
}

pub(crate) async fn status_handler<R, N>(
    State(service): State<Arc<AdmissionsService<R, N>>>,
    Path(application_id): Path<String>,
) -> Response
where
    R: AdmissionsRepository + 'static,
    N: DecisionNotifier + 'static,
{
    match service.status(&ApplicationId(application_id)) {
        Ok(view) => (StatusCode::OK, axum::Json(view)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn approve_handler<R, N>(
    State(service): State<Arc<AdmissionsService<R, N>>>,
    Path(application_id): Path<String>,
    headers: HeaderMap,
    axum::Json(assignments): axum::Json<Assignments>,
) -> Response
where
    R: AdmissionsRepository + 'static,
    N: DecisionNotifier + 'static,
{
    let Some(actor) = ActorId::from_headers(&headers) else {
        return missing_actor();
    };
    match service.approve(&ApplicationId(application_id), assignments, &actor) {
        Ok(approved) => (StatusCode::OK, axum::Json(approved)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn approval_check_handler<R, N>(
    State(service): State<Arc<AdmissionsService<R, N>>>,
    Path(application_id): Path<String>,
    axum::Json(assignments): axum::Json<Assignments>,
) -> Response
where
    R: AdmissionsRepository + 'static,
    N: DecisionNotifier + 'static,
{
    match service.can_approve(&ApplicationId(application_id), &assignments) {
        Ok(can_approve) => {
            (StatusCode::OK, axum::Json(json!({ "can_approve": can_approve }))).into_response()
        }
        Err(err) => error_response(err),
    }
}

pub(crate) async fn reject_handler<R, N>(
    State(service): State<Arc<AdmissionsService<R, N>>>,
    Path(application_id): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Response
where
    R: AdmissionsRepository + 'static,
    N: DecisionNotifier + 'static,
{
    let Some(actor) = ActorId::from_headers(&headers) else {
        return missing_actor();
    };
    let reason = match RejectionRequest::from_body(&body) {
        Ok(request) => request.reason,
        Err(err) => {
            let payload = json!({
                "error": format!("invalid rejection request: {err}"),
            });
            return (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(payload)).into_response();
        }
    };
    match service.reject(&ApplicationId(application_id), reason, &actor) {
        Ok(rejected) => (StatusCode::OK, axum::Json(rejected)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn pending_handler<R, N>(
    State(service): State<Arc<AdmissionsService<R, N>>>,
) -> Response
where
    R: AdmissionsRepository + 'static,
    N: DecisionNotifier + 'static,
{
    match service.list_pending() {
        Ok(pending) => (StatusCode::OK, axum::Json(pending)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn pending_by_role_handler<R, N>(
    State(service): State<Arc<AdmissionsService<R, N>>>,
) -> Response
where
    R: AdmissionsRepository + 'static,
    N: DecisionNotifier + 'static,
{
    match service.pending_by_role() {
        Ok(grouped) => (StatusCode::OK, axum::Json(grouped)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn approved_handler<R, N>(
    State(service): State<Arc<AdmissionsService<R, N>>>,
) -> Response
where
    R: AdmissionsRepository + 'static,
    N: DecisionNotifier + 'static,
{
    match service.list_approved() {
        Ok(approved) => (StatusCode::OK, axum::Json(approved)).into_response(),
        Err(err) => error_response(err),
    }
}

fn missing_actor() -> Response {
    let payload = json!({
        "error": format!("missing {ACTOR_HEADER} header"),
    });
    (StatusCode::UNAUTHORIZED, axum::Json(payload)).into_response()
}

pub(crate) fn error_response(err: AdmissionsError) -> Response {
    let status = match &err {
        AdmissionsError::Validation(_) | AdmissionsError::Precondition(_) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        AdmissionsError::DuplicateEmail { .. }
        | AdmissionsError::AlreadyDecided { .. }
        | AdmissionsError::DecisionInFlight(_) => StatusCode::CONFLICT,
        AdmissionsError::NotFound(_) => StatusCode::NOT_FOUND,
        AdmissionsError::Persistence(source) => {
            error!(error = %source, "admissions store call failed");
            let payload = json!({
                "error": "the request could not be saved, please try again",
            });
            return (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response();
        }
    };

    let payload = json!({
        "error": err.to_string(),
    });
    (status, axum::Json(payload)).into_response()
}
