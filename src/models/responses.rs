use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::domain::{CountryAnalytics, VendorMatch};

/// Wire shape of a single vendor match
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchDto {
    pub id: Uuid,
    #[serde(rename = "vendorId")]
    pub vendor_id: Uuid,
    pub score: f64,
    #[serde(rename = "servicesOverlap")]
    pub services_overlap: i32,
    #[serde(rename = "isAccepted")]
    pub is_accepted: bool,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

impl From<VendorMatch> for MatchDto {
    fn from(m: VendorMatch) -> Self {
        Self {
            id: m.id,
            vendor_id: m.vendor_id,
            score: m.score,
            services_overlap: m.services_overlap,
            is_accepted: m.is_accepted,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

/// Response for the match rebuild endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RebuildMatchesResponse {
    #[serde(rename = "projectId")]
    pub project_id: Uuid,
    #[serde(rename = "matchesCount")]
    pub matches_count: usize,
    pub matches: Vec<MatchDto>,
}

/// Response for the match listing endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListMatchesResponse {
    #[serde(rename = "projectId")]
    pub project_id: Uuid,
    pub matches: Vec<MatchDto>,
}

/// Response for the analytics endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopVendorsResponse {
    pub countries: Vec<CountryAnalytics>,
    #[serde(rename = "generatedAt")]
    pub generated_at: DateTime<Utc>,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: DateTime<Utc>,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}
