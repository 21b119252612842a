use crate::infra::{Admissions, AppState, Services};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use schoolhouse::error::AppError;
use schoolhouse::workflows::admissions::{admissions_router, ImportSummary};
use schoolhouse::workflows::integrations::integrations_router;
use schoolhouse::workflows::onboarding::onboarding_router;
use serde_json::json;
use std::io::Cursor;
use std::sync::Arc;

pub(crate) fn with_platform_routes(services: &Services) -> Router {
    let admissions = services.admissions.clone();

    admissions_router(services.admissions.clone())
        .merge(onboarding_router(services.onboarding.clone()))
        .merge(integrations_router(services.registry.clone()))
        .route(
            "/api/v1/admissions/roster",
            post(move |body: String| roster_import_endpoint(admissions.clone(), body)),
        )
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

/// Bulk intake from a CSV roster posted as the request body.
pub(crate) async fn roster_import_endpoint(
    admissions: Arc<Admissions>,
    body: String,
) -> Result<Json<ImportSummary>, AppError> {
    let summary = admissions.import_roster(Cursor::new(body.into_bytes()))?;
    Ok(Json(summary))
}
