// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{
    CountryAnalytics, LapsedVendor, Project, ProjectStatus, RankedVendor, ScoredCandidate,
    ScoringWeights, SlaScanReport, SweepReport, VendorCandidate, VendorMatch, VendorStatus,
    VendorSummary,
};
pub use requests::ListMatchesQuery;
pub use responses::{
    ErrorResponse, HealthResponse, ListMatchesResponse, MatchDto, RebuildMatchesResponse,
    TopVendorsResponse,
};
