use crate::models::{ScoringWeights, VendorMatch};

/// Normalization ceiling for response SLAs: one week in hours. A vendor
/// responding instantly weighs 10, a vendor at or beyond a week weighs 0.
pub const SLA_CEILING_HOURS: u32 = 168;

const SLA_NORMALIZER: f64 = 16.8;

/// Calculate the responsiveness weight (0-10) for a committed response time
///
/// Formula: `max(0, 168 - response_hours) / 16.8`, rounded to 2 decimals.
#[inline]
pub fn sla_weight(response_hours: u32) -> f64 {
    let clamped = SLA_CEILING_HOURS.saturating_sub(response_hours);
    round2(clamped as f64 / SLA_NORMALIZER)
}

/// Calculate a weighted match score for one candidate
///
/// Scoring formula:
/// score = services_overlap * 0.6    # service fit dominates
///       + vendor_rating    * 0.3    # vendor quality matters
///       + sla_weight       * 0.1    # responsiveness is a tie-breaker
///
/// rounded to 2 decimal places.
#[inline]
pub fn match_score(
    services_overlap: u32,
    vendor_rating: f64,
    sla_weight: f64,
    weights: &ScoringWeights,
) -> f64 {
    let score = services_overlap as f64 * weights.overlap
        + vendor_rating * weights.rating
        + sla_weight * weights.sla;
    round2(score)
}

/// Round half-up to 2 decimal places. Inputs are non-negative, so
/// `f64::round` (half away from zero) is half-up here.
#[inline]
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Order a match set by score descending; ties break by vendor id
/// ascending so repeated reconciles return identical orderings.
pub fn rank_matches(matches: &mut [VendorMatch]) {
    matches.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.vendor_id.cmp(&b.vendor_id))
    });
}
