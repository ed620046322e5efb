use actix_web::{web, HttpResponse, Responder};

use crate::models::TopVendorsResponse;
use crate::routes::error_response;
use crate::routes::matches::AppState;

/// Configure analytics routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/analytics/top-vendors", web::get().to(top_vendors));
}

/// Cross-store analytics report
///
/// GET /api/v1/analytics/top-vendors
///
/// Top 3 vendors per country by average match score over the trailing
/// window, combined with the research document volume per country. The
/// report is rebuilt on every request; a failure on either store aborts
/// the whole request rather than returning a partial report.
async fn top_vendors(state: web::Data<AppState>) -> impl Responder {
    match state.aggregator.top_vendors_by_country().await {
        Ok(countries) => {
            tracing::debug!("Analytics report covers {} countries", countries.len());
            HttpResponse::Ok().json(TopVendorsResponse {
                countries,
                generated_at: chrono::Utc::now(),
            })
        }
        Err(e) => {
            tracing::error!("Failed to build analytics report: {}", e);
            error_response("Failed to build analytics report", &e)
        }
    }
}
