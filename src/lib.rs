//! Expander Match - vendor matching and analytics for market-expansion projects
//!
//! This library matches expansion projects against a vendor pool, keeps each
//! project's persisted match set reconciled on a schedule, expires stale
//! vendor SLAs and aggregates a per-country report across the relational
//! and document stores.

pub mod config;
pub mod core;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use core::{
    match_score, rank_matches, sla_weight, CountryAnalyticsAggregator, MatchError,
    MatchReconciler, ProjectSweeper, SlaExpiryScanner,
};
pub use models::{
    CountryAnalytics, Project, ProjectStatus, ScoringWeights, SweepReport, VendorCandidate,
    VendorMatch,
};
