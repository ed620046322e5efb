mod config;
mod core;
mod models;
mod routes;
mod services;

use actix_cors::Cors;
use actix_web::{error, http::StatusCode, middleware, web, App, HttpResponse, HttpServer};
use config::Settings;
use core::{CountryAnalyticsAggregator, MatchReconciler, ProjectSweeper, SlaExpiryScanner};
use models::ScoringWeights;
use routes::matches::AppState;
use services::{DocumentStoreClient, Mailer, PostgresClient};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

/// JSON error response for JSON payload errors
#[derive(Debug, serde::Serialize)]
pub struct JsonError {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}

impl std::fmt::Display for JsonError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.error, self.message)
    }
}

impl std::error::Error for JsonError {}

impl error::ResponseError for JsonError {
    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::BAD_REQUEST))
            .content_type("application/json")
            .body(serde_json::to_string(self).unwrap())
    }
}

/// Handle JSON payload errors
pub fn handle_json_payload_error(err: error::JsonPayloadError, req: &actix_web::HttpRequest) -> actix_web::Error {
    tracing::info!("JSON payload error on {}: {}", req.path(), err);
    JsonError {
        error: "invalid_json".to_string(),
        message: format!("Invalid JSON: {}", err),
        status_code: 400,
    }
    .into()
}

/// Handle query payload errors
pub fn handle_query_payload_error(err: error::QueryPayloadError, _req: &actix_web::HttpRequest) -> actix_web::Error {
    JsonError {
        error: "invalid_query".to_string(),
        message: format!("Invalid query: {}", err),
        status_code: 400,
    }
    .into()
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenv::dotenv().ok();

    // Initialize logging
    let log_level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "json".to_string());

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_target(false)
        .with_level(true);

    if log_format == "pretty" {
        subscriber.pretty().init();
    } else {
        subscriber.init();
    }

    info!("Starting Expander Match service...");

    // Load configuration
    let settings = Settings::load().unwrap_or_else(|e| {
        error!("Failed to load configuration: {}", e);
        panic!("Configuration error: {}", e);
    });

    info!("Configuration loaded successfully");

    // Initialize PostgreSQL client
    let postgres = Arc::new(
        PostgresClient::from_settings(
            &settings.database.url,
            settings.database.max_connections,
            settings.database.min_connections,
        )
        .await
        .unwrap_or_else(|e| {
            error!("Failed to connect to PostgreSQL: {}", e);
            panic!("PostgreSQL connection error: {}", e);
        }),
    );

    info!("PostgreSQL client initialized");

    // Initialize document store client
    let docstore = Arc::new(DocumentStoreClient::new(
        settings.docstore.endpoint,
        settings.docstore.api_key,
        settings.docstore.database_id,
        settings.docstore.collection,
    ));

    info!("Document store client initialized");

    // Initialize mail client
    let mailer = Arc::new(Mailer::new(
        settings.mail.endpoint,
        settings.mail.domain,
        settings.mail.api_key,
        settings.mail.from_email,
        settings.mail.from_name,
    ));

    // Initialize the engine with configured weights
    let weights = ScoringWeights {
        overlap: settings.scoring.weights.overlap,
        rating: settings.scoring.weights.rating,
        sla: settings.scoring.weights.sla,
    };

    info!("Scoring weights: {:?}", weights);

    let reconciler = Arc::new(MatchReconciler::new(
        Arc::clone(&postgres),
        Arc::clone(&mailer),
        weights,
    ));

    let aggregator = Arc::new(CountryAnalyticsAggregator::new(
        Arc::clone(&postgres),
        Arc::clone(&docstore),
        settings.matching.rank_window_days,
    ));

    let sweeper = Arc::new(ProjectSweeper::new(
        Arc::clone(&postgres),
        Arc::clone(&reconciler),
    ));

    let sla_scanner = Arc::new(SlaExpiryScanner::new(Arc::clone(&postgres)));

    // Spawn the scheduled jobs on independent timers. The timers only
    // trigger the pure sweep entry points; cadence is configuration.
    if settings.scheduler.enabled {
        let sweep_interval = settings.scheduler.sweep_interval_secs;
        let sweeper_handle = Arc::clone(&sweeper);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(sweep_interval));
            loop {
                interval.tick().await;
                info!("Running scheduled job: refresh-matches");
                match sweeper_handle.sweep_once().await {
                    Ok(report) if report.skipped => {}
                    Ok(report) => {
                        info!(
                            "Match refresh sweep processed {} projects ({} failed)",
                            report.processed, report.failed
                        );
                    }
                    Err(e) => error!("Error in match refresh sweep: {}", e),
                }
            }
        });

        let sla_interval = settings.scheduler.sla_check_interval_secs;
        let scanner_handle = Arc::clone(&sla_scanner);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(sla_interval));
            loop {
                interval.tick().await;
                info!("Running scheduled job: check-sla-expiration");
                match scanner_handle.scan_once().await {
                    Ok(report) if report.expired + report.failed > 0 => {
                        info!(
                            "SLA scan expired {} vendors ({} failed)",
                            report.expired, report.failed
                        );
                    }
                    Ok(_) => {}
                    Err(e) => error!("Error in SLA expiration scan: {}", e),
                }
            }
        });

        info!(
            "Schedulers started (sweep every {}s, SLA check every {}s)",
            sweep_interval, sla_interval
        );
    } else {
        info!("Schedulers disabled by configuration");
    }

    // Build application state
    let app_state = AppState {
        postgres,
        reconciler,
        aggregator,
    };

    // Configure HTTP server
    let host = settings.server.host.clone();
    let port = settings.server.port;
    let workers = settings.server.workers.unwrap_or(4);

    info!("Starting HTTP server on {}:{}", host, port);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .app_data(web::JsonConfig::default().error_handler(handle_json_payload_error))
            .app_data(web::QueryConfig::default().error_handler(handle_query_payload_error))
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .wrap(middleware::Compress::default())
            .configure(routes::configure_routes)
    })
    .workers(workers)
    .bind((host, port))?
    .run()
    .await
}
