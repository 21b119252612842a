use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde_json::json;

use super::domain::{Channel, Credentials};
use super::provider::ProviderClient;
use super::registry::{IntegrationError, IntegrationRegistry};
use crate::workflows::identity::{ActorId, ACTOR_HEADER};

/// Router builder for the integration channel lifecycle.
pub fn integrations_router<P>(registry: Arc<IntegrationRegistry<P>>) -> Router
where
    P: ProviderClient + 'static,
{
    Router::new()
        .route("/api/v1/integrations", get(statuses_handler::<P>))
        .route(
            "/api/v1/integrations/:channel/connect",
            post(connect_handler::<P>),
        )
        .route("/api/v1/integrations/:channel/test", post(test_handler::<P>))
        .route(
            "/api/v1/integrations/:channel/refresh",
            post(refresh_handler::<P>),
        )
        .route(
            "/api/v1/integrations/:channel/disconnect",
            post(disconnect_handler::<P>),
        )
        .with_state(registry)
}

pub(crate) async fn statuses_handler<P>(
    State(registry): State<Arc<IntegrationRegistry<P>>>,
) -> Response
where
    P: ProviderClient + 'static,
{
    (StatusCode::OK, axum::Json(registry.statuses())).into_response()
}

pub(crate) async fn connect_handler<P>(
    State(registry): State<Arc<IntegrationRegistry<P>>>,
    Path(channel): Path<String>,
    headers: HeaderMap,
    axum::Json(credentials): axum::Json<Credentials>,
) -> Response
where
    P: ProviderClient + 'static,
{
    if ActorId::from_headers(&headers).is_none() {
        return missing_actor();
    }
    let result = parse_channel(&channel).and_then(|channel| registry.connect(channel, credentials));
    status_response(result)
}

pub(crate) async fn test_handler<P>(
    State(registry): State<Arc<IntegrationRegistry<P>>>,
    Path(channel): Path<String>,
    headers: HeaderMap,
) -> Response
where
    P: ProviderClient + 'static,
{
    if ActorId::from_headers(&headers).is_none() {
        return missing_actor();
    }
    status_response(parse_channel(&channel).and_then(|channel| registry.test(channel)))
}

pub(crate) async fn refresh_handler<P>(
    State(registry): State<Arc<IntegrationRegistry<P>>>,
    Path(channel): Path<String>,
    headers: HeaderMap,
) -> Response
where
    P: ProviderClient + 'static,
{
    if ActorId::from_headers(&headers).is_none() {
        return missing_actor();
    }
    status_response(parse_channel(&channel).and_then(|channel| registry.refresh(channel)))
}

pub(crate) async fn disconnect_handler<P>(
    State(registry): State<Arc<IntegrationRegistry<P>>>,
    Path(channel): Path<String>,
    headers: HeaderMap,
) -> Response
where
    P: ProviderClient + 'static,
{
    if ActorId::from_headers(&headers).is_none() {
        return missing_actor();
    }
    status_response(parse_channel(&channel).map(|channel| registry.disconnect(channel)))
}

fn parse_channel(value: &str) -> Result<Channel, IntegrationError> {
    Channel::parse(value).ok_or_else(|| IntegrationError::UnknownChannel(value.to_string()))
}

fn status_response<T: serde::Serialize>(result: Result<T, IntegrationError>) -> Response {
    match result {
        Ok(status) => (StatusCode::OK, axum::Json(status)).into_response(),
        Err(err) => error_response(err),
    }
}

fn missing_actor() -> Response {
    let payload = json!({
        "error": format!("missing {ACTOR_HEADER} header"),
    });
    (StatusCode::UNAUTHORIZED, axum::Json(payload)).into_response()
}

pub(crate) fn error_response(err: IntegrationError) -> Response {
    let status = match &err {
        IntegrationError::InvalidCredentials { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        IntegrationError::NotConnected(_) => StatusCode::CONFLICT,
        IntegrationError::Provider { .. } => StatusCode::BAD_GATEWAY,
        IntegrationError::UnknownChannel(_) => StatusCode::NOT_FOUND,
    };
    let payload = json!({
        "error": err.to_string(),
    });
    (status, axum::Json(payload)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::integrations::provider::CredentialShapeClient;
    use axum::body::Body;
    use axum::http::{header, Request};
    use tower::ServiceExt;

    fn router() -> Router {
        integrations_router(Arc::new(IntegrationRegistry::new(Arc::new(
            CredentialShapeClient,
        ))))
    }

    async fn read_json_body(response: Response) -> serde_json::Value {
        let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
            .await
            .expect("read body");
        serde_json::from_slice(&body).expect("json payload")
    }

    #[tokio::test]
    async fn connect_route_reports_status() {
        let response = router()
            .oneshot(
                Request::post("/api/v1/integrations/email/connect")
                    .header(header::CONTENT_TYPE, "application/json")
                    .header(ACTOR_HEADER, "admin-1")
                    .body(Body::from(r#"{"api_key":"mail-key"}"#))
                    .expect("request builds"),
            )
            .await
            .expect("route executes");

        assert_eq!(response.status(), StatusCode::OK);
        let payload = read_json_body(response).await;
        assert_eq!(payload["channel"], "email");
        assert_eq!(payload["connected"], true);
        assert_eq!(payload["credential_kind"], "api_key");
    }

    #[tokio::test]
    async fn test_route_conflicts_when_disconnected() {
        let response = router()
            .oneshot(
                Request::post("/api/v1/integrations/chat/test")
                    .header(ACTOR_HEADER, "admin-1")
                    .body(Body::empty())
                    .expect("request builds"),
            )
            .await
            .expect("route executes");

        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn unknown_channel_is_not_found() {
        let response = router()
            .oneshot(
                Request::post("/api/v1/integrations/fax/disconnect")
                    .header(ACTOR_HEADER, "admin-1")
                    .body(Body::empty())
                    .expect("request builds"),
            )
            .await
            .expect("route executes");

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn statuses_route_lists_all_channels() {
        let response = router()
            .oneshot(
                Request::get("/api/v1/integrations")
                    .body(Body::empty())
                    .expect("request builds"),
            )
            .await
            .expect("route executes");

        let payload = read_json_body(response).await;
        assert_eq!(payload.as_array().map(Vec::len), Some(6));
    }
}
