use std::sync::Arc;

use serde::Serialize;

use crate::models::job::{JobCreated, JobId, RerunRequest};
use crate::services::api_client::{ApiClient, ApiError};
use crate::services::dashboard::Dashboard;
use crate::services::events::{ClientEvent, EventBus};
use crate::services::poller::JobPoller;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RerunReceipt {
    pub job_id: JobId,
    /// Shown next to the new job; not used for any decision.
    pub source_job_id: JobId,
    pub seconds_remaining: u64,
}

/// Starts a derivative job from an existing one. The service copies the
/// style, background, outfit and uploads and spends one rerun credit of
/// the owning order.
pub struct RerunWorkflow {
    api: Arc<ApiClient>,
    events: EventBus,
    dashboard: Arc<Dashboard>,
    poller: Arc<JobPoller>,
}

impl RerunWorkflow {
    pub fn new(
        api: Arc<ApiClient>,
        events: EventBus,
        dashboard: Arc<Dashboard>,
        poller: Arc<JobPoller>,
    ) -> Self {
        Self {
            api,
            events,
            dashboard,
            poller,
        }
    }

    pub async fn rerun(&self, job_id: JobId) -> Result<RerunReceipt, RerunError> {
        let created: JobCreated = match self.api.post("/api/rerun", &RerunRequest { job_id }).await {
            Ok(response) => response.json().map_err(RerunError::Protocol)?,
            Err(source) => {
                let message = source.user_message("Rerun failed");
                tracing::warn!(source_job_id = job_id, error = %source, "Rerun rejected");
                self.events.emit(ClientEvent::WorkflowFailed {
                    operation: "Rerun".to_string(),
                    message: message.clone(),
                });
                return Err(RerunError::Rejected { message, source });
            }
        };

        let receipt = RerunReceipt {
            job_id: created.id,
            source_job_id: created.source_job_id.unwrap_or(job_id),
            seconds_remaining: created.seconds_remaining,
        };

        tracing::info!(
            job_id = receipt.job_id,
            source_job_id = receipt.source_job_id,
            "Rerun started"
        );
        self.events.emit(ClientEvent::RerunStarted {
            job_id: receipt.job_id,
            source_job_id: receipt.source_job_id,
        });

        self.dashboard.refresh_all().await;
        if let Err(e) = self.poller.start(receipt.job_id) {
            tracing::warn!(job_id = receipt.job_id, error = %e, "Could not start polling");
        }

        Ok(receipt)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RerunError {
    /// No credits left, source job unknown or not finished, or the service
    /// was unreachable.
    #[error("{message}")]
    Rejected {
        message: String,
        #[source]
        source: ApiError,
    },

    #[error("unexpected response from the service: {0}")]
    Protocol(#[source] ApiError),
}
