use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use tracing::debug;
use uuid::Uuid;

use crate::core::error::MatchError;
use crate::core::ports::{AnalyticsStore, DocumentIndex};
use crate::models::{CountryAnalytics, RankedVendor, VendorSummary};

/// Maximum vendors reported per country.
pub const TOP_VENDORS_PER_COUNTRY: usize = 3;

/// Builds the per-country report from two stores that share no join:
/// window-ranked vendors from the relational store and document volume
/// from the document store, resolved through the relational store's
/// project-to-country mapping.
pub struct CountryAnalyticsAggregator<R, D> {
    relational: Arc<R>,
    documents: Arc<D>,
    window_days: u32,
}

impl<R, D> CountryAnalyticsAggregator<R, D>
where
    R: AnalyticsStore,
    D: DocumentIndex,
{
    pub fn new(relational: Arc<R>, documents: Arc<D>, window_days: u32) -> Self {
        Self {
            relational,
            documents,
            window_days,
        }
    }

    /// Build the full report.
    ///
    /// The ranked vendor query and the document aggregation are
    /// independent and run concurrently; a failure on either side aborts
    /// the whole request rather than returning a half-populated report.
    pub async fn top_vendors_by_country(&self) -> Result<Vec<CountryAnalytics>, MatchError> {
        let (ranked, document_counts) = tokio::try_join!(
            self.relational.top_ranked_vendors(self.window_days),
            self.document_counts_by_country(),
        )?;

        Ok(merge_report(ranked, document_counts))
    }

    /// Document volume per country.
    ///
    /// Two steps because the document store cannot join on countries: the
    /// relational store resolves which active projects belong to which
    /// country, then the document store returns grouped per-project counts.
    async fn document_counts_by_country(&self) -> Result<HashMap<String, u64>, MatchError> {
        let projects_by_country = self.relational.active_projects_by_country().await?;

        let all_project_ids: Vec<Uuid> = projects_by_country
            .values()
            .flatten()
            .copied()
            .collect();

        let per_project = if all_project_ids.is_empty() {
            HashMap::new()
        } else {
            self.documents.count_by_project(&all_project_ids).await?
        };

        debug!(
            "Counted documents for {} active projects across {} countries",
            all_project_ids.len(),
            projects_by_country.len()
        );

        let mut per_country = HashMap::with_capacity(projects_by_country.len());
        for (country_code, project_ids) in projects_by_country {
            let total = project_ids
                .iter()
                .filter_map(|id| per_project.get(id))
                .sum();
            per_country.insert(country_code, total);
        }

        Ok(per_country)
    }
}

/// Merge the two sides into one record per country.
///
/// Pure in-memory work: unions the country codes seen on either side, zeroes
/// the missing side, caps vendors at the top 3 in rank order, and sorts the
/// result by country code.
pub fn merge_report(
    ranked: Vec<RankedVendor>,
    document_counts: HashMap<String, u64>,
) -> Vec<CountryAnalytics> {
    let mut vendors_by_country: BTreeMap<String, Vec<VendorSummary>> = BTreeMap::new();

    // Rows arrive rank-ordered within each country.
    for row in ranked {
        let vendors = vendors_by_country.entry(row.country_code).or_default();
        if vendors.len() < TOP_VENDORS_PER_COUNTRY {
            vendors.push(VendorSummary {
                id: row.vendor_id,
                name: row.vendor_name,
            });
        }
    }

    for country_code in document_counts.keys() {
        vendors_by_country.entry(country_code.clone()).or_default();
    }

    vendors_by_country
        .into_iter()
        .map(|(country_code, top_vendors)| {
            let document_count = document_counts.get(&country_code).copied().unwrap_or(0);
            CountryAnalytics {
                country_code,
                top_vendors,
                document_count,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ranked(country: &str, name: &str, avg: f64) -> RankedVendor {
        RankedVendor {
            country_code: country.to_string(),
            vendor_id: Uuid::new_v4(),
            vendor_name: name.to_string(),
            avg_score: avg,
        }
    }

    #[test]
    fn test_merge_unions_countries_from_both_sides() {
        let ranked_rows = vec![ranked("DE", "Vendor A", 4.2)];
        let mut counts = HashMap::new();
        counts.insert("EG".to_string(), 7u64);

        let report = merge_report(ranked_rows, counts);

        assert_eq!(report.len(), 2);
        assert_eq!(report[0].country_code, "DE");
        assert_eq!(report[0].document_count, 0);
        assert_eq!(report[0].top_vendors.len(), 1);
        assert_eq!(report[1].country_code, "EG");
        assert_eq!(report[1].document_count, 7);
        assert!(report[1].top_vendors.is_empty());
    }

    #[test]
    fn test_merge_caps_vendors_at_three() {
        let ranked_rows = vec![
            ranked("DE", "V1", 4.8),
            ranked("DE", "V2", 4.5),
            ranked("DE", "V3", 4.1),
            ranked("DE", "V4", 3.9),
        ];

        let report = merge_report(ranked_rows, HashMap::new());

        assert_eq!(report.len(), 1);
        assert_eq!(report[0].top_vendors.len(), 3);
        assert_eq!(report[0].top_vendors[0].name, "V1");
        assert_eq!(report[0].top_vendors[2].name, "V3");
    }

    #[test]
    fn test_merge_sorts_by_country_code() {
        let ranked_rows = vec![
            ranked("SA", "V1", 4.0),
            ranked("AE", "V2", 3.0),
            ranked("DE", "V3", 2.0),
        ];

        let report = merge_report(ranked_rows, HashMap::new());

        let codes: Vec<&str> = report.iter().map(|r| r.country_code.as_str()).collect();
        assert_eq!(codes, vec!["AE", "DE", "SA"]);
    }

    #[test]
    fn test_merge_empty_inputs() {
        let report = merge_report(Vec::new(), HashMap::new());
        assert!(report.is_empty());
    }
}
