use std::sync::Arc;

use crate::models::asset::{Asset, AssetList};
use crate::models::job::JobId;
use crate::services::api_client::{ApiClient, ApiError};
use crate::services::retry::{with_retry, IsRetryable, RetryPolicy};

/// On-demand listing of a completed job's outputs.
///
/// Each call returns a snapshot; new variants only show up on a fresh call.
pub struct AssetService {
    api: Arc<ApiClient>,
}

impl AssetService {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self { api }
    }

    pub async fn list_assets(&self, job_id: JobId) -> Result<Vec<Asset>, AssetError> {
        let response = self
            .api
            .get(&format!("/api/jobs/{job_id}/assets"))
            .await
            .map_err(|source| AssetError::from_api(job_id, source))?;
        let list: AssetList = response.json().map_err(AssetError::Protocol)?;

        tracing::debug!(job_id, assets = list.assets.len(), "Assets listed");
        Ok(list.assets)
    }

    /// Like [`list_assets`](Self::list_assets), retrying while the service
    /// reports the outputs as not ready yet.
    pub async fn list_assets_when_ready(
        &self,
        job_id: JobId,
        policy: &RetryPolicy,
    ) -> Result<Vec<Asset>, AssetError> {
        with_retry(policy, || self.list_assets(job_id)).await
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    /// The job has not produced outputs yet. Try again later.
    #[error("Assets for job #{job_id} are not ready: {message}")]
    NotReady { job_id: JobId, message: String },

    #[error("{message}")]
    Unavailable {
        message: String,
        #[source]
        source: ApiError,
    },

    #[error("unexpected response from the service: {0}")]
    Protocol(#[source] ApiError),
}

impl AssetError {
    fn from_api(job_id: JobId, source: ApiError) -> Self {
        match source.status().map(|s| s.as_u16()) {
            Some(404 | 409 | 425) => {
                AssetError::NotReady {
                    job_id,
                    message: source.user_message("Assets unavailable."),
                }
            }
            _ => AssetError::Unavailable {
                message: source.user_message("Assets unavailable."),
                source,
            },
        }
    }
}

impl IsRetryable for AssetError {
    fn is_retryable(&self) -> bool {
        match self {
            AssetError::NotReady { .. } => true,
            AssetError::Unavailable { source, .. } => source.is_retryable(),
            AssetError::Protocol(_) => false,
        }
    }
}
