use crate::cli::ServeArgs;
use crate::infra::{build_quest_service, AppState};
use crate::routes::with_quest_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use quest_verifier::config::AppConfig;
use quest_verifier::error::AppError;
use quest_verifier::telemetry;
use std::sync::atomic::Ordering;
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
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let quest_service = build_quest_service(&config.moderation);

    let app = with_quest_routes(quest_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        moderation_timeout_ms = config.moderation.timeout.as_millis() as u64,
        blocked_terms = config.moderation.blocked_terms.len(),
        "quest verifier ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
