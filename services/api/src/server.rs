use crate::cli::ServeArgs;
use crate::infra::{open_catalog, override_catalog_path, reconciler_for, AppState};
use crate::routes::with_program_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use homebuyer_assist::config::AppConfig;
use homebuyer_assist::error::AppError;
use homebuyer_assist::programs::ProgramsApi;
use homebuyer_assist::telemetry;
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
    override_catalog_path(&mut config, args.catalog.catalog.take());

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let catalog = open_catalog(&config)?;
    let reconciler = reconciler_for(catalog.clone(), &config.reconciliation);
    let feeds = reconciler.feeds().len();
    let api = Arc::new(ProgramsApi::new(catalog, reconciler));

    let app = with_program_routes(api)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        catalog = %config.catalog.data_path.display(),
        feeds,
        "homebuyer assistance service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
