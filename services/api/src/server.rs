use crate::cli::ServeArgs;
use crate::infra::{load_rate_table, AppState};
use crate::routes::with_pricing_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use loan_pricing::config::AppConfig;
use loan_pricing::error::AppError;
use loan_pricing::pricing::{InMemoryOfferStore, PricingService};
use loan_pricing::telemetry;
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

    let rate_table = Arc::new(load_rate_table(&config.pricing)?);
    let offer_store = Arc::new(InMemoryOfferStore::new());
    let pricing_service = Arc::new(PricingService::new(
        rate_table,
        offer_store,
        config.pricing.clone(),
    ));

    let app = with_pricing_routes(pricing_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "loan pricing service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
