use std::sync::Arc;

use futures::future::join_all;
use tracing::{error, info, warn};

use crate::core::error::MatchError;
use crate::core::ports::{MatchNotifier, MatchStore, ProjectCatalog, VendorSlaStore};
use crate::core::reconciler::MatchReconciler;
use crate::models::{SlaScanReport, SweepReport};

/// Time-triggered driver that refreshes matches for every active project.
///
/// Projects are reconciled sequentially to bound concurrent load on the
/// relational store, and each project's failure is isolated: it is logged
/// with the project identity and the sweep moves on. Only a failure to
/// list the active projects aborts the sweep itself.
pub struct ProjectSweeper<P, S, N> {
    projects: Arc<P>,
    reconciler: Arc<MatchReconciler<S, N>>,
    // Reentrancy guard: a tick that lands while a sweep is in flight is
    // skipped, never queued.
    in_flight: tokio::sync::Mutex<()>,
}

impl<P, S, N> ProjectSweeper<P, S, N>
where
    P: ProjectCatalog,
    S: MatchStore,
    N: MatchNotifier,
{
    pub fn new(projects: Arc<P>, reconciler: Arc<MatchReconciler<S, N>>) -> Self {
        Self {
            projects,
            reconciler,
            in_flight: tokio::sync::Mutex::new(()),
        }
    }

    /// Run one full sweep over all active projects.
    pub async fn sweep_once(&self) -> Result<SweepReport, MatchError> {
        let Ok(_guard) = self.in_flight.try_lock() else {
            warn!("Sweep tick skipped: previous sweep still in flight");
            return Ok(SweepReport {
                processed: 0,
                failed: 0,
                skipped: true,
            });
        };

        let active = self.projects.active_projects().await?;

        let mut failed = 0;
        for project in &active {
            info!("Refreshing matches for project: {}", project.id);
            match self.reconciler.reconcile(project).await {
                Ok(matches) => {
                    info!(
                        "Successfully refreshed {} matches for project: {}",
                        matches.len(),
                        project.id
                    );
                }
                Err(err) => {
                    failed += 1;
                    error!(
                        "Failed to refresh matches for project {}: {}",
                        project.id, err
                    );
                }
            }
        }

        info!(
            "Completed refreshing matches for {} active projects",
            active.len()
        );

        Ok(SweepReport {
            processed: active.len(),
            failed,
            skipped: false,
        })
    }
}

/// Time-triggered driver that expires vendors whose SLA window has lapsed.
///
/// Status flips are independent best-effort updates fanned out together;
/// every outcome is collected and one vendor's failure never blocks the
/// others.
pub struct SlaExpiryScanner<V> {
    vendors: Arc<V>,
}

impl<V> SlaExpiryScanner<V>
where
    V: VendorSlaStore,
{
    pub fn new(vendors: Arc<V>) -> Self {
        Self { vendors }
    }

    /// Run one expiry scan.
    pub async fn scan_once(&self) -> Result<SlaScanReport, MatchError> {
        let lapsed = self.vendors.vendors_past_sla().await?;

        if lapsed.is_empty() {
            return Ok(SlaScanReport::default());
        }

        info!("Found {} vendors past their SLA window", lapsed.len());

        let outcomes = join_all(
            lapsed
                .iter()
                .map(|vendor| self.vendors.mark_sla_expired(vendor.id)),
        )
        .await;

        let mut report = SlaScanReport::default();
        for (vendor, outcome) in lapsed.iter().zip(outcomes) {
            match outcome {
                Ok(()) => {
                    report.expired += 1;
                    info!("Vendor {} ({}) marked sla_expired", vendor.name, vendor.id);
                }
                Err(err) => {
                    report.failed += 1;
                    error!(
                        "Failed to expire SLA for vendor {} ({}): {}",
                        vendor.name, vendor.id, err
                    );
                }
            }
        }

        Ok(report)
    }
}
