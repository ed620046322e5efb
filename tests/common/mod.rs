// Shared in-memory fakes for the engine's store and collaborator ports.
#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use expander_match::core::ports::{
    AnalyticsStore, DocumentIndex, MatchNotifier, MatchStore, ProjectCatalog, VendorSlaStore,
};
use expander_match::core::MatchError;
use expander_match::models::{
    LapsedVendor, Project, ProjectStatus, RankedVendor, ScoredCandidate, VendorCandidate,
    VendorMatch, VendorStatus,
};

/// A vendor as stored by the fake relational store.
#[derive(Debug, Clone)]
pub struct FakeVendor {
    pub id: Uuid,
    pub name: String,
    pub countries: Vec<Uuid>,
    pub services: Vec<Uuid>,
    pub rating: f64,
    pub response_sla_hours: i32,
    pub status: VendorStatus,
}

pub fn project(country_id: Option<Uuid>, service_ids: Vec<Uuid>) -> Project {
    Project {
        id: Uuid::new_v4(),
        client_id: Some(Uuid::new_v4()),
        country_id,
        service_ids,
        budget: 50_000.0,
        status: ProjectStatus::Active,
        client_email: Some("client@expanders.test".to_string()),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

pub fn vendor(
    name: &str,
    countries: Vec<Uuid>,
    services: Vec<Uuid>,
    rating: f64,
    sla_hours: i32,
) -> FakeVendor {
    FakeVendor {
        id: Uuid::new_v4(),
        name: name.to_string(),
        countries,
        services,
        rating,
        response_sla_hours: sla_hours,
        status: VendorStatus::Active,
    }
}

/// In-memory relational store implementing the engine's ports over plain
/// collections. Overlap counts are computed the same way the SQL pool
/// query computes them, so pool semantics are exercised, not stubbed.
#[derive(Default)]
pub struct InMemoryStore {
    pub vendors: Mutex<Vec<FakeVendor>>,
    pub projects: Mutex<Vec<Project>>,
    pub matches: Mutex<Vec<VendorMatch>>,
    pub touched: Mutex<Vec<Uuid>>,
    /// Project ids whose store operations fail with a Store error.
    pub failing_projects: Mutex<HashSet<Uuid>>,
    /// Artificial latency for the active-project listing.
    pub list_delay: Option<Duration>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_list_delay(delay: Duration) -> Self {
        Self {
            list_delay: Some(delay),
            ..Self::default()
        }
    }

    pub fn add_vendor(&self, vendor: FakeVendor) -> Uuid {
        let id = vendor.id;
        self.vendors.lock().unwrap().push(vendor);
        id
    }

    pub fn add_project(&self, project: Project) {
        self.projects.lock().unwrap().push(project);
    }

    pub fn fail_project(&self, project_id: Uuid) {
        self.failing_projects.lock().unwrap().insert(project_id);
    }

    pub fn match_for(&self, project_id: Uuid, vendor_id: Uuid) -> Option<VendorMatch> {
        self.matches
            .lock()
            .unwrap()
            .iter()
            .find(|m| m.project_id == project_id && m.vendor_id == vendor_id)
            .cloned()
    }

    pub fn set_accepted(&self, project_id: Uuid, vendor_id: Uuid) {
        let mut matches = self.matches.lock().unwrap();
        if let Some(m) = matches
            .iter_mut()
            .find(|m| m.project_id == project_id && m.vendor_id == vendor_id)
        {
            m.is_accepted = true;
        }
    }

    fn check_failure(&self, project_id: Uuid) -> Result<(), MatchError> {
        if self.failing_projects.lock().unwrap().contains(&project_id) {
            return Err(MatchError::Store("injected store failure".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl MatchStore for InMemoryStore {
    async fn vendor_pool(
        &self,
        country_id: Uuid,
        service_ids: &[Uuid],
    ) -> Result<Vec<VendorCandidate>, MatchError> {
        let vendors = self.vendors.lock().unwrap();

        let mut pool: Vec<VendorCandidate> = vendors
            .iter()
            .filter(|v| v.status == VendorStatus::Active && v.countries.contains(&country_id))
            .filter_map(|v| {
                let overlap = v
                    .services
                    .iter()
                    .filter(|s| service_ids.contains(s))
                    .count() as i64;
                (overlap > 0).then(|| VendorCandidate {
                    vendor_id: v.id,
                    vendor_name: v.name.clone(),
                    rating: v.rating,
                    response_sla_hours: v.response_sla_hours,
                    services_overlap: overlap,
                })
            })
            .collect();

        pool.sort_by(|a, b| {
            b.services_overlap.cmp(&a.services_overlap).then(
                b.rating
                    .partial_cmp(&a.rating)
                    .unwrap_or(std::cmp::Ordering::Equal),
            )
        });

        Ok(pool)
    }

    async fn matches_for_project(&self, project_id: Uuid) -> Result<Vec<VendorMatch>, MatchError> {
        self.check_failure(project_id)?;

        let mut matches: Vec<VendorMatch> = self
            .matches
            .lock()
            .unwrap()
            .iter()
            .filter(|m| m.project_id == project_id)
            .cloned()
            .collect();

        matches.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.vendor_id.cmp(&b.vendor_id))
        });

        Ok(matches)
    }

    async fn update_match(
        &self,
        match_id: Uuid,
        candidate: &ScoredCandidate,
    ) -> Result<VendorMatch, MatchError> {
        let mut matches = self.matches.lock().unwrap();
        let existing = matches
            .iter_mut()
            .find(|m| m.id == match_id)
            .ok_or_else(|| MatchError::NotFound(format!("vendor match {}", match_id)))?;

        existing.score = candidate.score;
        existing.services_overlap = candidate.services_overlap;
        existing.vendor_rating = candidate.vendor_rating;
        existing.sla_weight = candidate.sla_weight;
        existing.updated_at = Utc::now();

        Ok(existing.clone())
    }

    async fn insert_match(
        &self,
        project_id: Uuid,
        candidate: &ScoredCandidate,
    ) -> Result<VendorMatch, MatchError> {
        self.check_failure(project_id)?;

        let mut matches = self.matches.lock().unwrap();

        // Mirror the ON CONFLICT upsert: a concurrent insert degrades to an
        // update that leaves is_accepted alone.
        if let Some(existing) = matches
            .iter_mut()
            .find(|m| m.project_id == project_id && m.vendor_id == candidate.vendor_id)
        {
            existing.score = candidate.score;
            existing.services_overlap = candidate.services_overlap;
            existing.vendor_rating = candidate.vendor_rating;
            existing.sla_weight = candidate.sla_weight;
            existing.updated_at = Utc::now();
            return Ok(existing.clone());
        }

        let now = Utc::now();
        let created = VendorMatch {
            id: Uuid::new_v4(),
            project_id,
            vendor_id: candidate.vendor_id,
            score: candidate.score,
            services_overlap: candidate.services_overlap,
            vendor_rating: candidate.vendor_rating,
            sla_weight: candidate.sla_weight,
            is_accepted: false,
            created_at: now,
            updated_at: now,
        };
        matches.push(created.clone());

        Ok(created)
    }

    async fn delete_matches_except(
        &self,
        project_id: Uuid,
        keep: &[Uuid],
    ) -> Result<u64, MatchError> {
        let mut matches = self.matches.lock().unwrap();
        let before = matches.len();
        matches.retain(|m| m.project_id != project_id || keep.contains(&m.vendor_id));
        Ok((before - matches.len()) as u64)
    }

    async fn touch_project(&self, project_id: Uuid) -> Result<(), MatchError> {
        self.touched.lock().unwrap().push(project_id);
        Ok(())
    }
}

#[async_trait]
impl ProjectCatalog for InMemoryStore {
    async fn active_projects(&self) -> Result<Vec<Project>, MatchError> {
        if let Some(delay) = self.list_delay {
            tokio::time::sleep(delay).await;
        }

        Ok(self
            .projects
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.status == ProjectStatus::Active)
            .cloned()
            .collect())
    }

    async fn project_by_id(&self, project_id: Uuid) -> Result<Project, MatchError> {
        self.projects
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.id == project_id)
            .cloned()
            .ok_or_else(|| MatchError::NotFound(format!("project {}", project_id)))
    }
}

/// Records every notification the reconciler asks for.
#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<(String, Uuid, String)>>,
    pub fail: bool,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

#[async_trait]
impl MatchNotifier for RecordingNotifier {
    async fn send_match_notification(
        &self,
        recipient: &str,
        project_id: Uuid,
        vendor_name: &str,
        _details: &str,
    ) -> bool {
        self.sent
            .lock()
            .unwrap()
            .push((recipient.to_string(), project_id, vendor_name.to_string()));
        !self.fail
    }
}

/// Fake vendor SLA store with per-vendor failure injection.
#[derive(Default)]
pub struct FakeSlaStore {
    pub lapsed: Mutex<Vec<LapsedVendor>>,
    pub failing: Mutex<HashSet<Uuid>>,
    pub expired: Mutex<Vec<Uuid>>,
}

impl FakeSlaStore {
    pub fn new(lapsed: Vec<LapsedVendor>) -> Self {
        Self {
            lapsed: Mutex::new(lapsed),
            ..Self::default()
        }
    }

    pub fn fail_vendor(&self, vendor_id: Uuid) {
        self.failing.lock().unwrap().insert(vendor_id);
    }
}

#[async_trait]
impl VendorSlaStore for FakeSlaStore {
    async fn vendors_past_sla(&self) -> Result<Vec<LapsedVendor>, MatchError> {
        Ok(self.lapsed.lock().unwrap().clone())
    }

    async fn mark_sla_expired(&self, vendor_id: Uuid) -> Result<(), MatchError> {
        if self.failing.lock().unwrap().contains(&vendor_id) {
            return Err(MatchError::Store("injected update failure".to_string()));
        }
        self.expired.lock().unwrap().push(vendor_id);
        Ok(())
    }
}

/// Fake relational analytics source.
#[derive(Default)]
pub struct FakeAnalyticsStore {
    pub ranked: Vec<RankedVendor>,
    pub projects_by_country: HashMap<String, Vec<Uuid>>,
    pub fail: bool,
}

#[async_trait]
impl AnalyticsStore for FakeAnalyticsStore {
    async fn top_ranked_vendors(&self, _window_days: u32) -> Result<Vec<RankedVendor>, MatchError> {
        if self.fail {
            return Err(MatchError::Store("ranked query failed".to_string()));
        }
        Ok(self.ranked.clone())
    }

    async fn active_projects_by_country(
        &self,
    ) -> Result<HashMap<String, Vec<Uuid>>, MatchError> {
        Ok(self.projects_by_country.clone())
    }
}

/// Fake document index with call counting.
#[derive(Default)]
pub struct FakeDocumentIndex {
    pub counts: HashMap<Uuid, u64>,
    pub fail: bool,
    pub calls: Mutex<usize>,
}

#[async_trait]
impl DocumentIndex for FakeDocumentIndex {
    async fn count_by_project(
        &self,
        project_ids: &[Uuid],
    ) -> Result<HashMap<Uuid, u64>, MatchError> {
        *self.calls.lock().unwrap() += 1;
        if self.fail {
            return Err(MatchError::Store("document aggregation failed".to_string()));
        }
        Ok(project_ids
            .iter()
            .filter_map(|id| self.counts.get(id).map(|c| (*id, *c)))
            .collect())
    }
}
