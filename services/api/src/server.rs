use crate::cli::ServeArgs;
use crate::infra::{build_intake_service, AppState};
use crate::routes::with_intake_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use candidate_intake::config::AppConfig;
use candidate_intake::error::AppError;
use candidate_intake::telemetry;
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
    if let Some(upload_dir) = args.upload_dir.take() {
        config.uploads.directory = upload_dir;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let (intake_service, _) = build_intake_service(&config.uploads.directory).await?;

    let app = with_intake_routes(intake_service, config.uploads.max_request_bytes)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        upload_dir = %config.uploads.directory.display(),
        "candidate intake service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
