use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

use crate::core::error::MatchError;
use crate::core::ports::DocumentIndex;

/// Errors that can occur when interacting with the document store
#[derive(Debug, Error)]
pub enum DocStoreError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("API returned error: {0}")]
    ApiError(String),

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),
}

impl From<DocStoreError> for MatchError {
    fn from(err: DocStoreError) -> Self {
        MatchError::Store(err.to_string())
    }
}

/// HTTP client for the document store
///
/// Research documents live in a separate document database with no foreign
/// keys into the relational store; records are keyed by `projectId`. The
/// engine only ever counts them: per project-id set for a single total, or
/// grouped by project id for the analytics report.
pub struct DocumentStoreClient {
    base_url: String,
    api_key: String,
    database_id: String,
    collection: String,
    client: Client,
}

impl DocumentStoreClient {
    /// Create a new document store client
    pub fn new(base_url: String, api_key: String, database_id: String, collection: String) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url,
            api_key,
            database_id,
            collection,
            client,
        }
    }

    fn collection_url(&self, suffix: &str) -> String {
        format!(
            "{}/databases/{}/collections/{}/{}",
            self.base_url.trim_end_matches('/'),
            self.database_id,
            self.collection,
            suffix
        )
    }

    /// Total number of documents across a set of projects.
    pub async fn count_documents(&self, project_ids: &[Uuid]) -> Result<u64, DocStoreError> {
        if project_ids.is_empty() {
            return Ok(0);
        }

        let query_json = serde_json::to_string(&serde_json::json!({
            "projectId": { "$in": project_ids }
        }))
        .map_err(|e| DocStoreError::InvalidResponse(e.to_string()))?;
        let encoded_query = urlencoding::encode(&query_json);

        let url = format!("{}?query={}", self.collection_url("documents/count"), encoded_query);

        tracing::debug!("Counting documents for {} projects", project_ids.len());

        let response = self
            .client
            .get(&url)
            .header("X-Docstore-Key", &self.api_key)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(DocStoreError::ApiError(format!(
                "Failed to count documents: {}",
                response.status()
            )));
        }

        let json: Value = response.json().await?;

        json.get("count")
            .and_then(|c| c.as_u64())
            .ok_or_else(|| DocStoreError::InvalidResponse("Missing count field".into()))
    }

    /// Per-project document counts for a set of projects.
    ///
    /// Projects without documents are absent from the returned map.
    pub async fn count_documents_by_project(
        &self,
        project_ids: &[Uuid],
    ) -> Result<HashMap<Uuid, u64>, DocStoreError> {
        if project_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let url = self.collection_url("documents/aggregate");

        let payload = serde_json::json!({
            "groupBy": "projectId",
            "filter": { "projectId": { "$in": project_ids } },
        });

        let response = self
            .client
            .post(&url)
            .header("X-Docstore-Key", &self.api_key)
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(DocStoreError::ApiError(format!(
                "Failed to aggregate documents: {}",
                response.status()
            )));
        }

        let json: Value = response.json().await?;

        let groups = json
            .get("groups")
            .and_then(|g| g.as_array())
            .ok_or_else(|| DocStoreError::InvalidResponse("Missing groups array".into()))?;

        let mut counts = HashMap::with_capacity(groups.len());
        for group in groups {
            let project_id = group
                .get("projectId")
                .and_then(|v| v.as_str())
                .and_then(|s| Uuid::parse_str(s).ok())
                .ok_or_else(|| {
                    DocStoreError::InvalidResponse("Group missing projectId".into())
                })?;
            let count = group
                .get("count")
                .and_then(|c| c.as_u64())
                .ok_or_else(|| DocStoreError::InvalidResponse("Group missing count".into()))?;

            counts.insert(project_id, count);
        }

        tracing::debug!(
            "Document store returned counts for {} of {} projects",
            counts.len(),
            project_ids.len()
        );

        Ok(counts)
    }
}

#[async_trait]
impl DocumentIndex for DocumentStoreClient {
    async fn count_by_project(
        &self,
        project_ids: &[Uuid],
    ) -> Result<HashMap<Uuid, u64>, MatchError> {
        self.count_documents_by_project(project_ids)
            .await
            .map_err(Into::into)
    }
}
