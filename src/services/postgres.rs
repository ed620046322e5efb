use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};
use thiserror::Error;
use uuid::Uuid;

use crate::core::error::MatchError;
use crate::core::ports::{AnalyticsStore, MatchStore, ProjectCatalog, VendorSlaStore};
use crate::models::{
    LapsedVendor, Project, ProjectStatus, RankedVendor, ScoredCandidate, VendorCandidate,
    VendorMatch,
};

/// Errors that can occur when interacting with PostgreSQL
#[derive(Debug, Error)]
pub enum PostgresError {
    #[error("Connection pool error: {0}")]
    PoolError(#[from] deadpool_postgres::PoolError),

    #[error("SQLx error: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    MigrateError(#[from] sqlx::migrate::MigrateError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl From<PostgresError> for MatchError {
    fn from(err: PostgresError) -> Self {
        match err {
            PostgresError::NotFound(what) => MatchError::NotFound(what),
            PostgresError::InvalidInput(what) => MatchError::Validation(what),
            other => MatchError::Store(other.to_string()),
        }
    }
}

/// PostgreSQL client for the relational store
///
/// Owns the connection pool and every SQL query the engine issues:
/// the country/service-filtered vendor pool scan, the idempotent match
/// upsert surface, the active-project listing, the SLA expiry scan and the
/// window-ranked analytics query.
pub struct PostgresClient {
    pool: PgPool,
}

impl PostgresClient {
    /// Create a new PostgreSQL client from a connection string
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self, PostgresError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(Duration::from_secs(5))
            .idle_timeout(Duration::from_secs(600))
            .test_before_acquire(true)
            .connect(database_url)
            .await?;

        // Run migrations on startup
        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self { pool })
    }

    /// Create a new PostgreSQL client from settings
    pub async fn from_settings(
        url: &str,
        max_connections: Option<u32>,
        min_connections: Option<u32>,
    ) -> Result<Self, PostgresError> {
        tracing::info!("Connecting to PostgreSQL");

        Self::new(
            url,
            max_connections.unwrap_or(10),
            min_connections.unwrap_or(1),
        )
        .await
    }

    /// Health check for the database connection
    pub async fn health_check(&self) -> Result<bool, PostgresError> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|_| true)
            .map_err(Into::into)
    }

    /// Candidate vendors for a project's country and required services.
    ///
    /// One grouped scan: active vendors supporting the country, joined to
    /// their offered services restricted to the required set. Vendors with
    /// zero overlap never leave the database. Ordering is a query hint
    /// only; ranking authority lies with the reconciler.
    async fn query_vendor_pool(
        &self,
        country_id: Uuid,
        service_ids: &[Uuid],
    ) -> Result<Vec<VendorCandidate>, PostgresError> {
        let query = r#"
            SELECT
                v.id AS vendor_id,
                v.name AS vendor_name,
                v.rating,
                v.response_sla_hours,
                COUNT(vs.service_id) AS services_overlap
            FROM vendors v
            INNER JOIN vendor_countries vc
                ON vc.vendor_id = v.id AND vc.country_id = $1
            INNER JOIN vendor_services vs
                ON vs.vendor_id = v.id
            WHERE vs.service_id = ANY($2)
              AND v.status = 'active'
            GROUP BY v.id, v.name, v.rating, v.response_sla_hours
            HAVING COUNT(vs.service_id) > 0
            ORDER BY COUNT(vs.service_id) DESC, v.rating DESC
        "#;

        let rows = sqlx::query(query)
            .bind(country_id)
            .bind(service_ids)
            .fetch_all(&self.pool)
            .await?;

        let candidates = rows
            .iter()
            .map(|row| VendorCandidate {
                vendor_id: row.get("vendor_id"),
                vendor_name: row.get("vendor_name"),
                rating: row.get("rating"),
                response_sla_hours: row.get("response_sla_hours"),
                services_overlap: row.get("services_overlap"),
            })
            .collect();

        Ok(candidates)
    }

    /// All matches for a project, best score first.
    async fn query_matches_for_project(
        &self,
        project_id: Uuid,
    ) -> Result<Vec<VendorMatch>, PostgresError> {
        let query = r#"
            SELECT id, project_id, vendor_id, score, services_overlap,
                   vendor_rating, sla_weight, is_accepted, created_at, updated_at
            FROM vendor_matches
            WHERE project_id = $1
            ORDER BY score DESC, vendor_id ASC
        "#;

        let rows = sqlx::query(query)
            .bind(project_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.iter().map(match_from_row).collect())
    }

    /// Update an existing match's score snapshot in place.
    ///
    /// `is_accepted` is deliberately absent from the SET list: acceptance
    /// is client state and survives every recompute.
    async fn query_update_match(
        &self,
        match_id: Uuid,
        candidate: &ScoredCandidate,
    ) -> Result<VendorMatch, PostgresError> {
        let query = r#"
            UPDATE vendor_matches
            SET score = $2,
                services_overlap = $3,
                vendor_rating = $4,
                sla_weight = $5,
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, project_id, vendor_id, score, services_overlap,
                      vendor_rating, sla_weight, is_accepted, created_at, updated_at
        "#;

        let row = sqlx::query(query)
            .bind(match_id)
            .bind(candidate.score)
            .bind(candidate.services_overlap)
            .bind(candidate.vendor_rating)
            .bind(candidate.sla_weight)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| PostgresError::NotFound(format!("vendor match {}", match_id)))?;

        Ok(match_from_row(&row))
    }

    /// Insert a new match.
    ///
    /// Uses INSERT ... ON CONFLICT on the unique (project_id, vendor_id)
    /// index so a reconcile racing another reconcile of the same project
    /// degrades to an update instead of failing.
    async fn query_insert_match(
        &self,
        project_id: Uuid,
        candidate: &ScoredCandidate,
    ) -> Result<VendorMatch, PostgresError> {
        let query = r#"
            INSERT INTO vendor_matches
                (id, project_id, vendor_id, score, services_overlap,
                 vendor_rating, sla_weight, is_accepted, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, FALSE, NOW(), NOW())
            ON CONFLICT (project_id, vendor_id)
            DO UPDATE SET
                score = EXCLUDED.score,
                services_overlap = EXCLUDED.services_overlap,
                vendor_rating = EXCLUDED.vendor_rating,
                sla_weight = EXCLUDED.sla_weight,
                updated_at = NOW()
            RETURNING id, project_id, vendor_id, score, services_overlap,
                      vendor_rating, sla_weight, is_accepted, created_at, updated_at
        "#;

        let row = sqlx::query(query)
            .bind(Uuid::new_v4())
            .bind(project_id)
            .bind(candidate.vendor_id)
            .bind(candidate.score)
            .bind(candidate.services_overlap)
            .bind(candidate.vendor_rating)
            .bind(candidate.sla_weight)
            .fetch_one(&self.pool)
            .await?;

        Ok(match_from_row(&row))
    }

    /// Remove matches whose vendor dropped out of the candidate set.
    async fn query_delete_matches_except(
        &self,
        project_id: Uuid,
        keep: &[Uuid],
    ) -> Result<u64, PostgresError> {
        let query = r#"
            DELETE FROM vendor_matches
            WHERE project_id = $1
              AND vendor_id != ALL($2)
        "#;

        let result = sqlx::query(query)
            .bind(project_id)
            .bind(keep)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    /// Timestamp touch after a reconcile; the engine writes nothing else
    /// on projects.
    async fn query_touch_project(&self, project_id: Uuid) -> Result<(), PostgresError> {
        sqlx::query("UPDATE projects SET updated_at = NOW() WHERE id = $1")
            .bind(project_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Active projects with country, client email and required service
    /// identifiers resolved. Service sets are loaded in a second batched
    /// query instead of one round-trip per project.
    async fn query_active_projects(&self) -> Result<Vec<Project>, PostgresError> {
        let query = r#"
            SELECT p.id, p.client_id, p.country_id, p.budget, p.status,
                   p.created_at, p.updated_at, c.contact_email
            FROM projects p
            LEFT JOIN clients c ON c.id = p.client_id
            WHERE p.status = 'active'
            ORDER BY p.created_at ASC
        "#;

        let rows = sqlx::query(query).fetch_all(&self.pool).await?;

        let mut projects = rows
            .iter()
            .map(project_from_row)
            .collect::<Result<Vec<_>, _>>()?;

        let project_ids: Vec<Uuid> = projects.iter().map(|p| p.id).collect();
        let mut services = self.query_project_services(&project_ids).await?;

        for project in &mut projects {
            if let Some(ids) = services.remove(&project.id) {
                project.service_ids = ids;
            }
        }

        Ok(projects)
    }

    /// One project by id with relations resolved.
    async fn query_project_by_id(&self, project_id: Uuid) -> Result<Project, PostgresError> {
        let query = r#"
            SELECT p.id, p.client_id, p.country_id, p.budget, p.status,
                   p.created_at, p.updated_at, c.contact_email
            FROM projects p
            LEFT JOIN clients c ON c.id = p.client_id
            WHERE p.id = $1
        "#;

        let row = sqlx::query(query)
            .bind(project_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| PostgresError::NotFound(format!("project {}", project_id)))?;

        let mut project = project_from_row(&row)?;

        let mut services = self.query_project_services(&[project.id]).await?;
        if let Some(ids) = services.remove(&project.id) {
            project.service_ids = ids;
        }

        Ok(project)
    }

    async fn query_project_services(
        &self,
        project_ids: &[Uuid],
    ) -> Result<HashMap<Uuid, Vec<Uuid>>, PostgresError> {
        if project_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = sqlx::query(
            "SELECT project_id, service_id FROM project_services WHERE project_id = ANY($1)",
        )
        .bind(project_ids)
        .fetch_all(&self.pool)
        .await?;

        let mut by_project: HashMap<Uuid, Vec<Uuid>> = HashMap::new();
        for row in &rows {
            by_project
                .entry(row.get("project_id"))
                .or_default()
                .push(row.get("service_id"));
        }

        Ok(by_project)
    }

    /// Active vendors whose SLA window has lapsed: last evaluation plus
    /// the committed response time lies in the past.
    async fn query_vendors_past_sla(&self) -> Result<Vec<LapsedVendor>, PostgresError> {
        let query = r#"
            SELECT id, name
            FROM vendors
            WHERE status = 'active'
              AND sla_checked_at + make_interval(hours => response_sla_hours) < NOW()
        "#;

        let rows = sqlx::query(query).fetch_all(&self.pool).await?;

        Ok(rows
            .iter()
            .map(|row| LapsedVendor {
                id: row.get("id"),
                name: row.get("name"),
            })
            .collect())
    }

    async fn query_mark_sla_expired(&self, vendor_id: Uuid) -> Result<(), PostgresError> {
        let result = sqlx::query("UPDATE vendors SET status = 'sla_expired' WHERE id = $1")
            .bind(vendor_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(PostgresError::NotFound(format!("vendor {}", vendor_id)));
        }

        Ok(())
    }

    /// Top 3 vendors per country by average match score over the trailing
    /// window, among active projects.
    ///
    /// Ranking runs server-side: partition by country, order by average
    /// score then by distinct-project coverage, keep rank <= 3. Fetching
    /// all rows and ranking in the application does not scale past small
    /// datasets.
    async fn query_top_ranked_vendors(
        &self,
        window_days: u32,
    ) -> Result<Vec<RankedVendor>, PostgresError> {
        let query = r#"
            SELECT country_code, vendor_id, vendor_name, avg_score
            FROM (
                SELECT c.code AS country_code,
                       v.id AS vendor_id,
                       v.name AS vendor_name,
                       AVG(m.score) AS avg_score,
                       ROW_NUMBER() OVER (
                           PARTITION BY c.code
                           ORDER BY AVG(m.score) DESC,
                                    COUNT(DISTINCT m.project_id) DESC
                       ) AS rn
                FROM vendor_matches m
                INNER JOIN projects p ON p.id = m.project_id AND p.status = 'active'
                INNER JOIN countries c ON c.id = p.country_id
                INNER JOIN vendors v ON v.id = m.vendor_id
                WHERE m.created_at >= NOW() - make_interval(days => $1)
                GROUP BY c.code, v.id, v.name
            ) ranked
            WHERE rn <= 3
            ORDER BY country_code ASC, avg_score DESC
        "#;

        let rows = sqlx::query(query)
            .bind(window_days as i32)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .iter()
            .map(|row| RankedVendor {
                country_code: row.get("country_code"),
                vendor_id: row.get("vendor_id"),
                vendor_name: row.get("vendor_name"),
                avg_score: row.get("avg_score"),
            })
            .collect())
    }

    /// Active project ids grouped by country code; the relational store is
    /// the source of truth for project-to-country ownership.
    async fn query_active_projects_by_country(
        &self,
    ) -> Result<HashMap<String, Vec<Uuid>>, PostgresError> {
        let query = r#"
            SELECT c.code AS country_code, p.id AS project_id
            FROM projects p
            INNER JOIN countries c ON c.id = p.country_id
            WHERE p.status = 'active'
        "#;

        let rows = sqlx::query(query).fetch_all(&self.pool).await?;

        let mut by_country: HashMap<String, Vec<Uuid>> = HashMap::new();
        for row in &rows {
            by_country
                .entry(row.get("country_code"))
                .or_default()
                .push(row.get("project_id"));
        }

        Ok(by_country)
    }
}

fn match_from_row(row: &PgRow) -> VendorMatch {
    VendorMatch {
        id: row.get("id"),
        project_id: row.get("project_id"),
        vendor_id: row.get("vendor_id"),
        score: row.get("score"),
        services_overlap: row.get("services_overlap"),
        vendor_rating: row.get("vendor_rating"),
        sla_weight: row.get("sla_weight"),
        is_accepted: row.get("is_accepted"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

fn project_from_row(row: &PgRow) -> Result<Project, PostgresError> {
    let status: String = row.get("status");
    let status = ProjectStatus::parse(&status)
        .ok_or_else(|| PostgresError::InvalidInput(format!("unknown project status {status}")))?;

    Ok(Project {
        id: row.get("id"),
        client_id: row.get("client_id"),
        country_id: row.get("country_id"),
        service_ids: Vec::new(),
        budget: row.get("budget"),
        status,
        client_email: row.get("contact_email"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

#[async_trait]
impl MatchStore for PostgresClient {
    async fn vendor_pool(
        &self,
        country_id: Uuid,
        service_ids: &[Uuid],
    ) -> Result<Vec<VendorCandidate>, MatchError> {
        self.query_vendor_pool(country_id, service_ids)
            .await
            .map_err(Into::into)
    }

    async fn matches_for_project(&self, project_id: Uuid) -> Result<Vec<VendorMatch>, MatchError> {
        self.query_matches_for_project(project_id)
            .await
            .map_err(Into::into)
    }

    async fn update_match(
        &self,
        match_id: Uuid,
        candidate: &ScoredCandidate,
    ) -> Result<VendorMatch, MatchError> {
        self.query_update_match(match_id, candidate)
            .await
            .map_err(Into::into)
    }

    async fn insert_match(
        &self,
        project_id: Uuid,
        candidate: &ScoredCandidate,
    ) -> Result<VendorMatch, MatchError> {
        self.query_insert_match(project_id, candidate)
            .await
            .map_err(Into::into)
    }

    async fn delete_matches_except(
        &self,
        project_id: Uuid,
        keep: &[Uuid],
    ) -> Result<u64, MatchError> {
        self.query_delete_matches_except(project_id, keep)
            .await
            .map_err(Into::into)
    }

    async fn touch_project(&self, project_id: Uuid) -> Result<(), MatchError> {
        self.query_touch_project(project_id)
            .await
            .map_err(Into::into)
    }
}

#[async_trait]
impl ProjectCatalog for PostgresClient {
    async fn active_projects(&self) -> Result<Vec<Project>, MatchError> {
        self.query_active_projects().await.map_err(Into::into)
    }

    async fn project_by_id(&self, project_id: Uuid) -> Result<Project, MatchError> {
        self.query_project_by_id(project_id)
            .await
            .map_err(Into::into)
    }
}

#[async_trait]
impl VendorSlaStore for PostgresClient {
    async fn vendors_past_sla(&self) -> Result<Vec<LapsedVendor>, MatchError> {
        self.query_vendors_past_sla().await.map_err(Into::into)
    }

    async fn mark_sla_expired(&self, vendor_id: Uuid) -> Result<(), MatchError> {
        self.query_mark_sla_expired(vendor_id)
            .await
            .map_err(Into::into)
    }
}

#[async_trait]
impl AnalyticsStore for PostgresClient {
    async fn top_ranked_vendors(&self, window_days: u32) -> Result<Vec<RankedVendor>, MatchError> {
        self.query_top_ranked_vendors(window_days)
            .await
            .map_err(Into::into)
    }

    async fn active_projects_by_country(
        &self,
    ) -> Result<HashMap<String, Vec<Uuid>>, MatchError> {
        self.query_active_projects_by_country()
            .await
            .map_err(Into::into)
    }
}
