use actix_web::{web, HttpResponse, Responder};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::core::analytics::CountryAnalyticsAggregator;
use crate::core::ports::{MatchStore, ProjectCatalog};
use crate::core::reconciler::MatchReconciler;
use crate::models::{
    ErrorResponse, HealthResponse, ListMatchesQuery, ListMatchesResponse, MatchDto,
    RebuildMatchesResponse,
};
use crate::routes::error_response;
use crate::services::{DocumentStoreClient, Mailer, PostgresClient};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub postgres: Arc<PostgresClient>,
    pub reconciler: Arc<MatchReconciler<PostgresClient, Mailer>>,
    pub aggregator: Arc<CountryAnalyticsAggregator<PostgresClient, DocumentStoreClient>>,
}

/// Configure match-related routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health_check))
        .route(
            "/projects/{project_id}/matches/rebuild",
            web::post().to(rebuild_matches),
        )
        .route(
            "/projects/{project_id}/matches",
            web::get().to(list_matches),
        );
}

/// Health check endpoint
async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let pg_healthy = state.postgres.health_check().await.unwrap_or(false);

    let status = if pg_healthy { "healthy" } else { "degraded" };

    HttpResponse::Ok().json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
    })
}

/// Rebuild the vendor match set for one project
///
/// POST /api/v1/projects/{project_id}/matches/rebuild
///
/// Resolves the project, reconciles its matches against the current vendor
/// pool and returns the persisted ranked set.
async fn rebuild_matches(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> impl Responder {
    let project_id = path.into_inner();

    tracing::info!("Rebuilding vendor matches for project {}", project_id);

    let project = match state.postgres.project_by_id(project_id).await {
        Ok(project) => project,
        Err(e) => {
            tracing::error!("Failed to load project {}: {}", project_id, e);
            return error_response("Failed to load project", &e);
        }
    };

    match state.reconciler.reconcile(&project).await {
        Ok(matches) => {
            let matches: Vec<MatchDto> = matches.into_iter().map(Into::into).collect();
            HttpResponse::Ok().json(RebuildMatchesResponse {
                project_id,
                matches_count: matches.len(),
                matches,
            })
        }
        Err(e) => {
            tracing::error!("Failed to rebuild matches for project {}: {}", project_id, e);
            error_response("Failed to rebuild matches", &e)
        }
    }
}

/// List the persisted matches for one project, best score first
///
/// GET /api/v1/projects/{project_id}/matches?limit=20
async fn list_matches(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    query: web::Query<ListMatchesQuery>,
) -> impl Responder {
    if let Err(errors) = query.validate() {
        return HttpResponse::BadRequest().json(ErrorResponse {
            error: "Validation failed".to_string(),
            message: errors.to_string(),
            status_code: 400,
        });
    }

    let project_id = path.into_inner();

    match state.postgres.matches_for_project(project_id).await {
        Ok(mut matches) => {
            if let Some(limit) = query.limit {
                matches.truncate(limit as usize);
            }
            let matches: Vec<MatchDto> = matches.into_iter().map(Into::into).collect();
            HttpResponse::Ok().json(ListMatchesResponse {
                project_id,
                matches,
            })
        }
        Err(e) => {
            tracing::error!("Failed to list matches for project {}: {}", project_id, e);
            error_response("Failed to list matches", &e)
        }
    }
}
