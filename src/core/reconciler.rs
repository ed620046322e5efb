use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::core::error::MatchError;
use crate::core::ports::{MatchNotifier, MatchStore};
use crate::core::scoring::{match_score, rank_matches, sla_weight};
use crate::models::{Project, ScoredCandidate, ScoringWeights, VendorCandidate, VendorMatch};

/// Validate one candidate row and compute its score snapshot.
///
/// The pool query only emits vendors with a positive overlap; a
/// non-positive count, a rating outside [0, 5] or a negative SLA means the
/// row is malformed and the candidate is rejected rather than silently
/// normalized.
pub fn score_candidate(
    candidate: &VendorCandidate,
    weights: &ScoringWeights,
) -> Result<ScoredCandidate, MatchError> {
    if candidate.services_overlap <= 0 {
        return Err(MatchError::Validation(format!(
            "vendor {} has non-positive services overlap {}",
            candidate.vendor_id, candidate.services_overlap
        )));
    }
    if !(0.0..=5.0).contains(&candidate.rating) {
        return Err(MatchError::Validation(format!(
            "vendor {} has rating {} outside [0, 5]",
            candidate.vendor_id, candidate.rating
        )));
    }
    if candidate.response_sla_hours < 0 {
        return Err(MatchError::Validation(format!(
            "vendor {} has negative response SLA {}h",
            candidate.vendor_id, candidate.response_sla_hours
        )));
    }

    let weight = sla_weight(candidate.response_sla_hours as u32);
    let score = match_score(
        candidate.services_overlap as u32,
        candidate.rating,
        weight,
        weights,
    );

    Ok(ScoredCandidate {
        vendor_id: candidate.vendor_id,
        vendor_name: candidate.vendor_name.clone(),
        score,
        services_overlap: candidate.services_overlap as i32,
        vendor_rating: candidate.rating,
        sla_weight: weight,
    })
}

/// Reconciles one project's persisted match set against the current vendor
/// pool.
///
/// Existing matches are updated in place so the client's acceptance flag
/// survives recomputes; vendors that no longer qualify are removed. New
/// matches trigger a best-effort client notification.
pub struct MatchReconciler<S, N> {
    store: Arc<S>,
    notifier: Arc<N>,
    weights: ScoringWeights,
}

impl<S, N> MatchReconciler<S, N>
where
    S: MatchStore,
    N: MatchNotifier,
{
    pub fn new(store: Arc<S>, notifier: Arc<N>, weights: ScoringWeights) -> Self {
        Self {
            store,
            notifier,
            weights,
        }
    }

    /// Recompute and persist the full match set for one project.
    ///
    /// Returns the final persisted set ordered by score descending, vendor
    /// id ascending. Persistence failures abort this project only and
    /// propagate; notification failures are logged and swallowed.
    pub async fn reconcile(&self, project: &Project) -> Result<Vec<VendorMatch>, MatchError> {
        let candidates = self.fetch_candidates(project).await?;

        let existing: HashMap<Uuid, VendorMatch> = self
            .store
            .matches_for_project(project.id)
            .await?
            .into_iter()
            .map(|m| (m.vendor_id, m))
            .collect();

        let mut kept: Vec<Uuid> = Vec::with_capacity(candidates.len());

        for candidate in &candidates {
            let scored = match score_candidate(candidate, &self.weights) {
                Ok(scored) => scored,
                Err(err) => {
                    warn!(
                        "Skipping candidate {} for project {}: {}",
                        candidate.vendor_id, project.id, err
                    );
                    continue;
                }
            };

            if let Some(previous) = existing.get(&scored.vendor_id) {
                self.store.update_match(previous.id, &scored).await?;
            } else {
                let saved = self.store.insert_match(project.id, &scored).await?;
                self.notify_new_match(project, &scored, &saved).await;
            }
            kept.push(scored.vendor_id);
        }

        let removed = self.store.delete_matches_except(project.id, &kept).await?;
        if removed > 0 {
            debug!(
                "Removed {} departed matches for project {}",
                removed, project.id
            );
        }

        self.store.touch_project(project.id).await?;

        let mut matches = self.store.matches_for_project(project.id).await?;
        rank_matches(&mut matches);

        info!(
            "Reconciled project {}: {} matches ({} candidates)",
            project.id,
            matches.len(),
            candidates.len()
        );

        Ok(matches)
    }

    /// Fetch the candidate pool for a project.
    ///
    /// A project without a resolved country or required services has no
    /// candidates; that is a legitimate empty outcome, not an error.
    async fn fetch_candidates(
        &self,
        project: &Project,
    ) -> Result<Vec<VendorCandidate>, MatchError> {
        let Some(country_id) = project.country_id else {
            warn!(
                "Project {} has no resolved country, returning no candidates",
                project.id
            );
            return Ok(Vec::new());
        };

        if project.service_ids.is_empty() {
            warn!(
                "Project {} has no required services, returning no candidates",
                project.id
            );
            return Ok(Vec::new());
        }

        self.store
            .vendor_pool(country_id, &project.service_ids)
            .await
    }

    async fn notify_new_match(
        &self,
        project: &Project,
        scored: &ScoredCandidate,
        saved: &VendorMatch,
    ) {
        let Some(email) = project.client_email.as_deref() else {
            warn!(
                "Cannot send notification for match {}: missing client email",
                saved.id
            );
            return;
        };

        let details = format!(
            "Score: {}, Services Overlap: {}, Vendor Rating: {}",
            saved.score, saved.services_overlap, saved.vendor_rating
        );

        let sent = self
            .notifier
            .send_match_notification(email, project.id, &scored.vendor_name, &details)
            .await;

        if sent {
            info!(
                "Match notification sent for project {} and vendor {}",
                project.id, scored.vendor_name
            );
        } else {
            warn!(
                "Failed to send match notification for project {} and vendor {}",
                project.id, scored.vendor_name
            );
        }
    }
}
