use garde::Validate;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use super::order::OrderId;

pub type JobId = i64;

/// Minimum number of selfies a generation job accepts.
pub const MIN_UPLOADS: usize = 8;

/// Status of a generation job as reported by the service.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, EnumString, Display, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum JobStatus {
    Queued,
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    /// Completed and failed jobs never change status again.
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

/// A generation job as listed by `GET /api/jobs`.
///
/// `order_id` is absent for jobs whose order has been removed; it is kept
/// for display only.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: JobId,
    #[serde(default)]
    pub order_id: Option<OrderId>,
    #[serde(default)]
    pub source_job_id: Option<JobId>,
    pub plan: String,
    pub style: String,
    pub background: String,
    pub outfit: String,
    pub upload_count: u32,
    pub status: JobStatus,
    #[serde(default)]
    pub seconds_remaining: u64,
}

/// The slice of `GET /api/jobs/{id}` the poller needs.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct JobStatusReport {
    pub id: JobId,
    pub status: JobStatus,
    #[serde(default)]
    pub seconds_remaining: u64,
}

/// Look of the generated headshots.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StyleSelection {
    pub style: String,
    pub background: String,
    pub outfit: String,
}

impl Default for StyleSelection {
    fn default() -> Self {
        Self {
            style: "corporate".to_string(),
            background: "office".to_string(),
            outfit: "business".to_string(),
        }
    }
}

/// Body of `POST /api/jobs`.
#[derive(Debug, Clone, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateJobRequest {
    #[garde(skip)]
    pub order_id: OrderId,

    #[garde(length(min = 1))]
    pub plan: String,

    #[garde(length(min = 1, max = 100))]
    pub style: String,

    #[garde(length(min = 1, max = 100))]
    pub background: String,

    #[garde(length(min = 1, max = 100))]
    pub outfit: String,

    #[garde(range(min = 8))]
    pub upload_count: u32,
}

/// Response of `POST /api/jobs` and `POST /api/rerun`.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct JobCreated {
    pub id: JobId,
    #[serde(default)]
    pub order_id: Option<OrderId>,
    #[serde(default)]
    pub source_job_id: Option<JobId>,
    #[serde(default)]
    pub seconds_remaining: u64,
}

/// Body of `POST /api/rerun`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RerunRequest {
    pub job_id: JobId,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JobList {
    #[serde(default)]
    pub jobs: Vec<Job>,
}
