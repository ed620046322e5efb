//! Store and collaborator ports.
//!
//! The engine takes these as constructor-passed handles instead of binding
//! to a concrete persistence technology; tests substitute in-memory fakes.

use std::collections::HashMap;

use async_trait::async_trait;
use uuid::Uuid;

use crate::core::error::MatchError;
use crate::models::{LapsedVendor, Project, RankedVendor, ScoredCandidate, VendorCandidate, VendorMatch};

/// Relational operations the reconciler needs around one project's matches.
#[async_trait]
pub trait MatchStore: Send + Sync {
    /// Candidate vendors for a country/service-set pair, with overlap
    /// counts precomputed and zero-overlap vendors already excluded.
    async fn vendor_pool(
        &self,
        country_id: Uuid,
        service_ids: &[Uuid],
    ) -> Result<Vec<VendorCandidate>, MatchError>;

    /// All persisted matches for a project, ordered score desc then vendor
    /// id asc.
    async fn matches_for_project(&self, project_id: Uuid) -> Result<Vec<VendorMatch>, MatchError>;

    /// Update an existing match's score fields in place. Must not touch
    /// `is_accepted`.
    async fn update_match(
        &self,
        match_id: Uuid,
        candidate: &ScoredCandidate,
    ) -> Result<VendorMatch, MatchError>;

    /// Insert a new match with `is_accepted = false`. Must tolerate a
    /// conflicting concurrent insert on (project, vendor) by degrading to
    /// an update.
    async fn insert_match(
        &self,
        project_id: Uuid,
        candidate: &ScoredCandidate,
    ) -> Result<VendorMatch, MatchError>;

    /// Delete every match of the project whose vendor is not in `keep`.
    /// Returns the number of rows removed.
    async fn delete_matches_except(
        &self,
        project_id: Uuid,
        keep: &[Uuid],
    ) -> Result<u64, MatchError>;

    /// Timestamp touch on the project after a reconcile. The engine writes
    /// nothing else on projects.
    async fn touch_project(&self, project_id: Uuid) -> Result<(), MatchError>;
}

/// Project listing and lookup, owned by the surrounding application's CRUD.
#[async_trait]
pub trait ProjectCatalog: Send + Sync {
    async fn active_projects(&self) -> Result<Vec<Project>, MatchError>;

    async fn project_by_id(&self, project_id: Uuid) -> Result<Project, MatchError>;
}

/// Vendor SLA state as seen by the expiry scanner.
#[async_trait]
pub trait VendorSlaStore: Send + Sync {
    /// Active vendors whose last evaluation plus their response SLA lies in
    /// the past.
    async fn vendors_past_sla(&self) -> Result<Vec<LapsedVendor>, MatchError>;

    async fn mark_sla_expired(&self, vendor_id: Uuid) -> Result<(), MatchError>;
}

/// Relational side of the analytics report.
#[async_trait]
pub trait AnalyticsStore: Send + Sync {
    /// Top-ranked vendors per country over a trailing window, computed
    /// server-side (partition by country, rank <= 3).
    async fn top_ranked_vendors(&self, window_days: u32) -> Result<Vec<RankedVendor>, MatchError>;

    /// Active project ids grouped by country code; the relational store is
    /// the source of truth for which projects belong to which country.
    async fn active_projects_by_country(&self)
        -> Result<HashMap<String, Vec<Uuid>>, MatchError>;
}

/// Document-store side of the analytics report.
#[async_trait]
pub trait DocumentIndex: Send + Sync {
    /// Grouped document counts keyed by project id. Projects without
    /// documents may be absent from the map.
    async fn count_by_project(
        &self,
        project_ids: &[Uuid],
    ) -> Result<HashMap<Uuid, u64>, MatchError>;
}

/// Best-effort notification collaborator. Returns whether the notification
/// went out; callers log and move on either way.
#[async_trait]
pub trait MatchNotifier: Send + Sync {
    async fn send_match_notification(
        &self,
        recipient: &str,
        project_id: Uuid,
        vendor_name: &str,
        details: &str,
    ) -> bool;
}
