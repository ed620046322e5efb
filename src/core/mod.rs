// Core engine exports
pub mod analytics;
pub mod error;
pub mod ports;
pub mod reconciler;
pub mod scoring;
pub mod sweep;

pub use analytics::{merge_report, CountryAnalyticsAggregator, TOP_VENDORS_PER_COUNTRY};
pub use error::MatchError;
pub use reconciler::{score_candidate, MatchReconciler};
pub use scoring::{match_score, rank_matches, round2, sla_weight, SLA_CEILING_HOURS};
pub use sweep::{ProjectSweeper, SlaExpiryScanner};
