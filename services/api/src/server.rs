use crate::cli::ServeArgs;
use crate::infra::{AppState, InMemorySessionStore};
use crate::routes::with_intake_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use subsidy_intake::config::AppConfig;
use subsidy_intake::error::AppError;
use subsidy_intake::telemetry;
use subsidy_intake::workflows::eligibility::{
    ChatCompletionsAdvisor, CsvIntakeLog, DeliveryRouting, IntakeCollaborators, IntakeService,
    OutboxDelivery, PdfReportRenderer,
};
use tracing::{info, warn};

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

    if config.advisor.api_key.is_none() {
        warn!("OPENAI_API_KEY not set; advisor questions will return notices");
    }
    if config.delivery.oversight_address.is_none() {
        warn!("APP_OVERSIGHT_EMAIL not set; reports go to applicants only");
    }

    let collaborators = IntakeCollaborators {
        advisor: Arc::new(ChatCompletionsAdvisor::new(&config.advisor)),
        renderer: Arc::new(PdfReportRenderer),
        delivery: Arc::new(OutboxDelivery::new(config.delivery.outbox_dir.clone())),
        intake_log: Arc::new(CsvIntakeLog::new(config.intake_log.path.clone())),
    };
    let intake_service = Arc::new(IntakeService::new(
        Arc::new(InMemorySessionStore::default()),
        collaborators,
        DeliveryRouting::new(config.delivery.oversight_address.clone()),
    ));

    let app = with_intake_routes(intake_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        outbox = %config.delivery.outbox_dir.display(),
        intake_log = %config.intake_log.path.display(),
        "subsidy intake service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
