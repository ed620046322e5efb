use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle status of an expansion project
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectStatus {
    Active,
    Paused,
    Completed,
}

impl ProjectStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectStatus::Active => "active",
            ProjectStatus::Paused => "paused",
            ProjectStatus::Completed => "completed",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "active" => Some(ProjectStatus::Active),
            "paused" => Some(ProjectStatus::Paused),
            "completed" => Some(ProjectStatus::Completed),
            _ => None,
        }
    }
}

/// An expansion project as the matching engine sees it: country and
/// required services resolved to identifiers, plus the owning client's
/// notification email.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: Uuid,
    #[serde(rename = "clientId")]
    pub client_id: Option<Uuid>,
    #[serde(rename = "countryId")]
    pub country_id: Option<Uuid>,
    #[serde(rename = "serviceIds", default)]
    pub service_ids: Vec<Uuid>,
    pub budget: f64,
    pub status: ProjectStatus,
    #[serde(rename = "clientEmail", default)]
    pub client_email: Option<String>,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

/// Vendor status. Only the SLA expiry scanner flips this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VendorStatus {
    Active,
    SlaExpired,
}

impl VendorStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VendorStatus::Active => "active",
            VendorStatus::SlaExpired => "sla_expired",
        }
    }
}

/// A candidate row from the vendor pool query: an active vendor covering
/// the project's country with at least one overlapping service.
#[derive(Debug, Clone)]
pub struct VendorCandidate {
    pub vendor_id: Uuid,
    pub vendor_name: String,
    pub rating: f64,
    pub response_sla_hours: i32,
    pub services_overlap: i64,
}

/// A persisted project/vendor match with its score snapshot.
///
/// `is_accepted` is client state and is never written by the engine's
/// recompute path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VendorMatch {
    pub id: Uuid,
    #[serde(rename = "projectId")]
    pub project_id: Uuid,
    #[serde(rename = "vendorId")]
    pub vendor_id: Uuid,
    pub score: f64,
    #[serde(rename = "servicesOverlap")]
    pub services_overlap: i32,
    #[serde(rename = "vendorRating")]
    pub vendor_rating: f64,
    #[serde(rename = "slaWeight")]
    pub sla_weight: f64,
    #[serde(rename = "isAccepted")]
    pub is_accepted: bool,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

/// New score data for one candidate, produced by the reconciler before it
/// touches the store.
#[derive(Debug, Clone)]
pub struct ScoredCandidate {
    pub vendor_id: Uuid,
    pub vendor_name: String,
    pub score: f64,
    pub services_overlap: i32,
    pub vendor_rating: f64,
    pub sla_weight: f64,
}

/// A vendor whose SLA window has lapsed, as returned by the expiry scan.
#[derive(Debug, Clone)]
pub struct LapsedVendor {
    pub id: Uuid,
    pub name: String,
}

/// One row of the window-ranked top-vendors-per-country query, rank <= 3.
#[derive(Debug, Clone)]
pub struct RankedVendor {
    pub country_code: String,
    pub vendor_id: Uuid,
    pub vendor_name: String,
    pub avg_score: f64,
}

/// Vendor identity as exposed in the analytics report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VendorSummary {
    pub id: Uuid,
    pub name: String,
}

/// Per-country analytics record: top vendors from the relational store,
/// document volume from the document store. Transient, rebuilt per request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CountryAnalytics {
    #[serde(rename = "countryCode")]
    pub country_code: String,
    #[serde(rename = "topVendors")]
    pub top_vendors: Vec<VendorSummary>,
    #[serde(rename = "documentCount")]
    pub document_count: u64,
}

/// Scoring weights
#[derive(Debug, Clone, Copy)]
pub struct ScoringWeights {
    pub overlap: f64,
    pub rating: f64,
    pub sla: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            overlap: 0.6,
            rating: 0.3,
            sla: 0.1,
        }
    }
}

/// Outcome of one sweep tick over all active projects.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct SweepReport {
    pub processed: usize,
    pub failed: usize,
    /// True when the tick found a previous sweep still in flight and did
    /// nothing.
    pub skipped: bool,
}

/// Outcome of one SLA expiry scan.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct SlaScanReport {
    pub expired: usize,
    pub failed: usize,
}
