//! Notifications for the presentation surface.
//!
//! Every workflow and the job poller publish [`ClientEvent`]s on a
//! broadcast channel. Any number of subscribers can listen; each receives
//! all events independently. With nobody listening, events are dropped.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::models::job::{JobId, JobStatus};
use crate::models::order::OrderId;
use crate::models::upload::UploadVerdict;

/// Buffered events per subscriber before a slow subscriber starts lagging.
const EVENT_BUFFER: usize = 256;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientEvent {
    /// Per-file verdict from the upload validator.
    UploadClassified {
        name: String,
        verdict: UploadVerdict,
    },

    /// A new job was accepted by the service.
    JobQueued {
        job_id: JobId,
        order_id: Option<OrderId>,
        seconds_remaining: u64,
    },

    /// A poll tick saw the job still running.
    Progress {
        job_id: JobId,
        status: JobStatus,
        seconds_remaining: u64,
    },

    /// A poll tick could not get the job's status.
    StatusUnavailable {
        job_id: JobId,
        consecutive_failures: u32,
        error: String,
    },

    JobCompleted {
        job_id: JobId,
    },

    JobFailed {
        job_id: JobId,
    },

    /// Polling gave up after repeated status failures.
    PollAbandoned {
        job_id: JobId,
        reason: String,
    },

    RerunStarted {
        job_id: JobId,
        source_job_id: JobId,
    },

    /// A user-triggered workflow ended in an error.
    WorkflowFailed {
        operation: String,
        message: String,
    },

    DashboardRefreshed {
        orders: usize,
        jobs: usize,
    },

    OrderDeleted {
        order_id: OrderId,
    },

    JobDeleted {
        job_id: JobId,
    },

    SupportTicketCreated {
        ticket_id: i64,
    },

    LoggedIn {
        email: String,
    },

    LoggedOut,
}

impl ClientEvent {
    /// Human-readable status line, as shown in the client's status box.
    pub fn status_line(&self) -> String {
        match self {
            ClientEvent::UploadClassified { name, verdict } => format!("{name}: {verdict}"),
            ClientEvent::JobQueued { job_id, .. } => format!("Job #{job_id} queued."),
            ClientEvent::Progress {
                job_id,
                status,
                seconds_remaining,
            } => format!("Job #{job_id} {status} (~{seconds_remaining}s)"),
            ClientEvent::StatusUnavailable { job_id, .. } => {
                format!("Status for job #{job_id} is temporarily unavailable.")
            }
            ClientEvent::JobCompleted { job_id } => format!("Job #{job_id} completed."),
            ClientEvent::JobFailed { job_id } => format!("Job #{job_id} failed."),
            ClientEvent::PollAbandoned { job_id, reason } => {
                format!("Stopped tracking job #{job_id}: {reason}")
            }
            ClientEvent::RerunStarted { job_id, .. } => format!("Rerun started as #{job_id}"),
            ClientEvent::WorkflowFailed { operation, message } => {
                format!("{operation} failed: {message}")
            }
            ClientEvent::DashboardRefreshed { orders, jobs } => {
                format!("Dashboard refreshed: {orders} orders, {jobs} jobs")
            }
            ClientEvent::OrderDeleted { order_id } => format!("Order #{order_id} deleted."),
            ClientEvent::JobDeleted { job_id } => format!("Job #{job_id} deleted"),
            ClientEvent::SupportTicketCreated { ticket_id } => {
                format!("Support ticket #{ticket_id} created.")
            }
            ClientEvent::LoggedIn { email } => format!("Logged in as {email}"),
            ClientEvent::LoggedOut => "Logged out.".to_string(),
        }
    }
}

/// Cloneable handle to the client's event channel.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<ClientEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        let (tx, _rx) = broadcast::channel(EVENT_BUFFER);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ClientEvent> {
        self.tx.subscribe()
    }

    pub fn emit(&self, event: ClientEvent) {
        tracing::debug!(?event, "client event");
        // Err only means nobody is subscribed.
        self.tx.send(event).ok();
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
