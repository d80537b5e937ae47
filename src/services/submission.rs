//! Order + job submission.
//!
//! Submission is a two-phase create: the order is placed (and paid) first,
//! then a job is created for it. If the job cannot be created the order is
//! left in place; it stays visible in the order list, which is where the
//! user recovers from. Nothing is retried or rolled back automatically.

use std::sync::Arc;

use garde::Validate;
use serde::Serialize;

use crate::models::job::{CreateJobRequest, JobCreated, JobId, StyleSelection, MIN_UPLOADS};
use crate::models::order::{CreateOrderRequest, Order, OrderId, TeamSize};
use crate::models::upload::UploadCandidate;
use crate::services::api_client::{ApiClient, ApiError};
use crate::services::dashboard::Dashboard;
use crate::services::events::{ClientEvent, EventBus};
use crate::services::poller::JobPoller;
use crate::services::upload_validation;
use crate::services::validation::{require_session, ValidationError};

#[derive(Debug, Clone)]
pub struct SubmissionRequest {
    pub plan_id: String,
    pub team_size: TeamSize,
    pub uploads: Vec<UploadCandidate>,
    pub selection: StyleSelection,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SubmissionReceipt {
    pub order_id: OrderId,
    pub job_id: JobId,
    pub amount_cents: u64,
    pub seconds_remaining: u64,
}

pub struct SubmissionWorkflow {
    api: Arc<ApiClient>,
    events: EventBus,
    dashboard: Arc<Dashboard>,
    poller: Arc<JobPoller>,
    require_login: bool,
}

impl SubmissionWorkflow {
    pub fn new(
        api: Arc<ApiClient>,
        events: EventBus,
        dashboard: Arc<Dashboard>,
        poller: Arc<JobPoller>,
        require_login: bool,
    ) -> Self {
        Self {
            api,
            events,
            dashboard,
            poller,
            require_login,
        }
    }

    pub async fn submit(
        &self,
        request: SubmissionRequest,
    ) -> Result<SubmissionReceipt, SubmissionError> {
        let result = self.submit_inner(request).await;
        if let Err(e) = &result {
            self.events.emit(ClientEvent::WorkflowFailed {
                operation: e.operation().to_string(),
                message: e.user_message(),
            });
        }
        result
    }

    async fn submit_inner(
        &self,
        request: SubmissionRequest,
    ) -> Result<SubmissionReceipt, SubmissionError> {
        self.validate(&request)?;

        // Phase 1: order
        let order_request = CreateOrderRequest {
            plan: request.plan_id.clone(),
            team_size: request.team_size.get(),
        };
        order_request.validate().map_err(ValidationError::from)?;

        let order: Order = self
            .api
            .post("/api/orders", &order_request)
            .await
            .map_err(|source| SubmissionError::Payment {
                message: source.user_message("Unknown error"),
                source,
            })?
            .json()
            .map_err(SubmissionError::Protocol)?;

        tracing::info!(
            order_id = order.id,
            plan = %order.plan,
            team_size = order.team_size,
            amount_cents = order.amount_cents,
            "Order created"
        );

        // Phase 2: job
        let job_request = CreateJobRequest {
            order_id: order.id,
            plan: request.plan_id.clone(),
            style: request.selection.style.clone(),
            background: request.selection.background.clone(),
            outfit: request.selection.outfit.clone(),
            upload_count: request.uploads.len() as u32,
        };
        if let Err(report) = job_request.validate() {
            return Err(SubmissionError::JobCreation {
                order_id: order.id,
                message: report.to_string(),
                source: None,
            });
        }

        let job: JobCreated = match self
            .api
            .post("/api/jobs", &job_request)
            .await
            .and_then(|response| response.json::<JobCreated>())
        {
            Ok(job) => job,
            Err(source) => {
                tracing::warn!(
                    order_id = order.id,
                    error = %source,
                    "Job creation failed; order kept without a job"
                );
                return Err(SubmissionError::JobCreation {
                    order_id: order.id,
                    message: source.user_message("Unknown error"),
                    source: Some(source),
                });
            }
        };

        metrics::counter!("headshot_jobs_submitted_total").increment(1);
        tracing::info!(
            order_id = order.id,
            job_id = job.id,
            seconds_remaining = job.seconds_remaining,
            "Generation job queued"
        );
        self.events.emit(ClientEvent::JobQueued {
            job_id: job.id,
            order_id: Some(order.id),
            seconds_remaining: job.seconds_remaining,
        });

        self.dashboard.refresh_all().await;
        if let Err(e) = self.poller.start(job.id) {
            tracing::warn!(job_id = job.id, error = %e, "Could not start polling");
        }

        Ok(SubmissionReceipt {
            order_id: order.id,
            job_id: job.id,
            amount_cents: order.amount_cents,
            seconds_remaining: job.seconds_remaining,
        })
    }

    /// Local checks; nothing here touches the network.
    fn validate(&self, request: &SubmissionRequest) -> Result<(), ValidationError> {
        require_session(self.api.session(), self.require_login)?;

        let report = upload_validation::classify_batch(&request.uploads);
        for (name, verdict) in &report.verdicts {
            self.events.emit(ClientEvent::UploadClassified {
                name: name.clone(),
                verdict: *verdict,
            });
        }

        if request.uploads.len() < MIN_UPLOADS {
            return Err(ValidationError::InsufficientUploads {
                count: request.uploads.len(),
                required: MIN_UPLOADS,
            });
        }
        if !report.all_accepted() {
            return Err(ValidationError::InvalidUploads {
                rejected: report.rejected(),
            });
        }

        if let Some(catalog) = self.api.session().catalog() {
            if !catalog.contains(&request.plan_id) {
                return Err(ValidationError::UnknownPlan(request.plan_id.clone()));
            }
        }

        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SubmissionError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Payment failed: {message}")]
    Payment {
        message: String,
        #[source]
        source: ApiError,
    },

    /// The order exists, but no job was created for it.
    #[error("Job creation failed: {message}")]
    JobCreation {
        order_id: OrderId,
        message: String,
        #[source]
        source: Option<ApiError>,
    },

    #[error("unexpected response from the service: {0}")]
    Protocol(#[source] ApiError),
}

impl SubmissionError {
    fn operation(&self) -> &'static str {
        match self {
            SubmissionError::Validation(_) => "Submission",
            SubmissionError::Payment { .. } => "Payment",
            SubmissionError::JobCreation { .. } => "Job creation",
            SubmissionError::Protocol(_) => "Submission",
        }
    }

    fn user_message(&self) -> String {
        match self {
            SubmissionError::Validation(e) => e.to_string(),
            SubmissionError::Payment { message, .. }
            | SubmissionError::JobCreation { message, .. } => message.clone(),
            SubmissionError::Protocol(e) => e.to_string(),
        }
    }

    /// Order left behind by a failed job creation, if any.
    pub fn orphaned_order(&self) -> Option<OrderId> {
        match self {
            SubmissionError::JobCreation { order_id, .. } => Some(*order_id),
            _ => None,
        }
    }
}
