use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::json;
use tracing::error;

use super::repository::TenantRepository;
use super::service::{OnboardingError, OnboardingService, SessionId, SessionView};
use super::wizard::{FieldEdit, WizardError};
use crate::workflows::identity::{ActorId, ACTOR_HEADER};

/// Router builder for wizard sessions and tenant lookup.
pub fn onboarding_router<T>(service: Arc<OnboardingService<T>>) -> Router
where
    T: TenantRepository + 'static,
{
    Router::new()
        .route("/api/v1/onboarding/sessions", post(start_handler::<T>))
        .route(
            "/api/v1/onboarding/sessions/:session_id",
            get(session_handler::<T>),
        )
        .route(
            "/api/v1/onboarding/sessions/:session_id/edits",
            post(edit_handler::<T>),
        )
        .route(
            "/api/v1/onboarding/sessions/:session_id/next",
            post(next_handler::<T>),
        )
        .route(
            "/api/v1/onboarding/sessions/:session_id/back",
            post(back_handler::<T>),
        )
        .route(
            "/api/v1/onboarding/sessions/:session_id/complete",
            post(complete_handler::<T>),
        )
        .route(
            "/api/v1/onboarding/tenants/:slug",
            get(tenant_handler::<T>),
        )
        .with_state(service)
}

#[derive(Debug, Deserialize)]
pub struct EditRequest {
    pub edits: Vec<FieldEdit>,
}

pub(crate) async fn start_handler<T>(
    State(service): State<Arc<OnboardingService<T>>>,
    headers: HeaderMap,
) -> Response
where
    T: TenantRepository + 'static,
{
    let Some(actor) = ActorId::from_headers(&headers) else {
        return missing_actor();
    };
    let view = service.start(&actor);
    (StatusCode::CREATED, axum::Json(view)).into_response()
}

pub(crate) async fn session_handler<T>(
    State(service): State<Arc<OnboardingService<T>>>,
    Path(session_id): Path<String>,
    headers: HeaderMap,
) -> Response
where
    T: TenantRepository + 'static,
{
    let Some(actor) = ActorId::from_headers(&headers) else {
        return missing_actor();
    };
    view_response(service.session(&SessionId(session_id), &actor))
}

pub(crate) async fn edit_handler<T>(
    State(service): State<Arc<OnboardingService<T>>>,
    Path(session_id): Path<String>,
    headers: HeaderMap,
    axum::Json(request): axum::Json<EditRequest>,
) -> Response
where
    T: TenantRepository + 'static,
{
    let Some(actor) = ActorId::from_headers(&headers) else {
        return missing_actor();
    };
    view_response(service.edit(&SessionId(session_id), &actor, request.edits))
}

pub(crate) async fn next_handler<T>(
    State(service): State<Arc<OnboardingService<T>>>,
    Path(session_id): Path<String>,
    headers: HeaderMap,
) -> Response
where
    T: TenantRepository + 'static,
{
    let Some(actor) = ActorId::from_headers(&headers) else {
        return missing_actor();
    };
    view_response(service.next(&SessionId(session_id), &actor))
}

pub(crate) async fn back_handler<T>(
    State(service): State<Arc<OnboardingService<T>>>,
    Path(session_id): Path<String>,
    headers: HeaderMap,
) -> Response
where
    T: TenantRepository + 'static,
{
    let Some(actor) = ActorId::from_headers(&headers) else {
        return missing_actor();
    };
    view_response(service.back(&SessionId(session_id), &actor))
}

pub(crate) async fn complete_handler<T>(
    State(service): State<Arc<OnboardingService<T>>>,
    Path(session_id): Path<String>,
    headers: HeaderMap,
) -> Response
where
    T: TenantRepository + 'static,
{
    let Some(actor) = ActorId::from_headers(&headers) else {
        return missing_actor();
    };
    match service.complete(&SessionId(session_id), &actor) {
        Ok(provisioned) => (StatusCode::CREATED, axum::Json(provisioned)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn tenant_handler<T>(
    State(service): State<Arc<OnboardingService<T>>>,
    Path(slug): Path<String>,
) -> Response
where
    T: TenantRepository + 'static,
{
    match service.tenant_by_slug(&slug) {
        Ok(provisioned) => (StatusCode::OK, axum::Json(provisioned)).into_response(),
        Err(err) => error_response(err),
    }
}

fn view_response(result: Result<SessionView, OnboardingError>) -> Response {
    match result {
        Ok(view) => (StatusCode::OK, axum::Json(view)).into_response(),
        Err(err) => error_response(err),
    }
}

fn missing_actor() -> Response {
    let payload = json!({
        "error": format!("missing {ACTOR_HEADER} header"),
    });
    (StatusCode::UNAUTHORIZED, axum::Json(payload)).into_response()
}

pub(crate) fn error_response(err: OnboardingError) -> Response {
    let status = match &err {
        OnboardingError::Wizard(WizardError::Incomplete { step, message }) => {
            let payload = json!({
                "error": message,
                "step": step,
                "step_number": step.number(),
            });
            return (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(payload)).into_response();
        }
        OnboardingError::Wizard(_) => StatusCode::UNPROCESSABLE_ENTITY,
        OnboardingError::SessionNotFound(_) | OnboardingError::TenantNotFound(_) => {
            StatusCode::NOT_FOUND
        }
        OnboardingError::InFlight(_) => StatusCode::CONFLICT,
        OnboardingError::SetupFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
        OnboardingError::Persistence(source) => {
            error!(error = %source, "tenant store call failed");
            let payload = json!({
                "error": "the request could not be completed, please try again",
            });
            return (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response();
        }
    };

    let payload = json!({
        "error": err.to_string(),
    });
    (status, axum::Json(payload)).into_response()
}
