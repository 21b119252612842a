use crate::cli::ServeArgs;
use crate::infra::{AppState, Registry, Services};
use crate::routes::with_platform_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use schoolhouse::config::AppConfig;
use schoolhouse::error::AppError;
use schoolhouse::telemetry;
use schoolhouse::workflows::integrations::CredentialShapeClient;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let registry = Registry::from_config(Arc::new(CredentialShapeClient), &config.integrations);
    let services = Services::in_memory(registry);
    let connected = services
        .registry
        .statuses()
        .iter()
        .filter(|status| status.connected)
        .count();

    let app = with_platform_routes(&services)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, connected, "school platform ready");

    axum::serve(listener, app).await?;
    Ok(())
}
