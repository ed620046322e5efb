// Route exports
pub mod analytics;
pub mod matches;

use actix_web::{web, HttpResponse};

use crate::core::MatchError;
use crate::models::ErrorResponse;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .configure(matches::configure)
            .configure(analytics::configure),
    );
}

/// Map an engine error onto the wire: NotFound -> 404, Validation -> 400,
/// anything else -> 500.
pub(crate) fn error_response(error: &str, err: &MatchError) -> HttpResponse {
    let (status_code, mut builder) = match err {
        MatchError::NotFound(_) => (404, HttpResponse::NotFound()),
        MatchError::Validation(_) => (400, HttpResponse::BadRequest()),
        _ => (500, HttpResponse::InternalServerError()),
    };

    builder.json(ErrorResponse {
        error: error.to_string(),
        message: err.to_string(),
        status_code,
    })
}
