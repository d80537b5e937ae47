//! Orders, jobs and counters shown on the user's dashboard.
//!
//! Every list is replaced wholesale by its latest successful fetch and left
//! untouched when a fetch fails. Nothing is patched incrementally, so a
//! late delete response cannot bring back an order a newer refresh already
//! dropped. Refreshes are numbered when issued; a list is only replaced by
//! a fetch issued after the one it currently shows.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::models::account::DashboardMetrics;
use crate::models::job::{Job, JobId, JobList};
use crate::models::order::{Order, OrderId, OrderList};
use crate::services::api_client::{ApiClient, ApiError};
use crate::services::events::{ClientEvent, EventBus};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DashboardSnapshot {
    pub orders: Vec<Order>,
    pub jobs: Vec<Job>,
    pub metrics: Option<DashboardMetrics>,
}

/// Issue number of the refresh each list was last replaced by.
#[derive(Debug, Default)]
struct Applied {
    orders: u64,
    jobs: u64,
    metrics: u64,
}

#[derive(Debug, Default)]
struct DashboardData {
    snapshot: DashboardSnapshot,
    applied: Applied,
}

pub struct Dashboard {
    api: Arc<ApiClient>,
    events: EventBus,
    require_login: bool,
    issued: AtomicU64,
    data: RwLock<DashboardData>,
}

impl Dashboard {
    pub fn new(api: Arc<ApiClient>, events: EventBus, require_login: bool) -> Self {
        Self {
            api,
            events,
            require_login,
            issued: AtomicU64::new(0),
            data: RwLock::new(DashboardData::default()),
        }
    }

    pub fn snapshot(&self) -> DashboardSnapshot {
        self.data.read().snapshot.clone()
    }

    /// Empty every list. Refreshes already in flight are discarded.
    pub fn clear(&self) {
        let mut data = self.data.write();
        let current = self.issued.load(Ordering::SeqCst);
        data.snapshot = DashboardSnapshot::default();
        data.applied = Applied {
            orders: current,
            jobs: current,
            metrics: current,
        };
    }

    /// Refetch metrics, orders and jobs concurrently.
    pub async fn refresh_all(&self) {
        if self.require_login && !self.api.session().is_authenticated() {
            tracing::debug!("Skipping dashboard refresh without a session");
            return;
        }

        let seq = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
        let (metrics, orders, jobs) = tokio::join!(
            self.fetch_metrics(),
            self.fetch_orders(),
            self.fetch_jobs()
        );

        let (order_count, job_count) = {
            let mut data = self.data.write();
            let DashboardData { snapshot, applied } = &mut *data;
            match metrics {
                Ok(metrics) if seq > applied.metrics => {
                    snapshot.metrics = Some(metrics);
                    applied.metrics = seq;
                }
                Ok(_) => tracing::debug!(seq, "Discarding stale metrics"),
                Err(e) => tracing::warn!(error = %e, "Metrics refresh failed"),
            }
            match orders {
                Ok(orders) if seq > applied.orders => {
                    snapshot.orders = orders;
                    applied.orders = seq;
                }
                Ok(_) => tracing::debug!(seq, "Discarding stale order list"),
                Err(e) => tracing::warn!(error = %e, "Order list refresh failed"),
            }
            match jobs {
                Ok(jobs) if seq > applied.jobs => {
                    snapshot.jobs = jobs;
                    applied.jobs = seq;
                }
                Ok(_) => tracing::debug!(seq, "Discarding stale job list"),
                Err(e) => tracing::warn!(error = %e, "Job list refresh failed"),
            }
            (snapshot.orders.len(), snapshot.jobs.len())
        };

        self.events.emit(ClientEvent::DashboardRefreshed {
            orders: order_count,
            jobs: job_count,
        });
    }

    pub async fn fetch_metrics(&self) -> Result<DashboardMetrics, ApiError> {
        self.api.get("/api/metrics").await?.json()
    }

    pub async fn fetch_orders(&self) -> Result<Vec<Order>, ApiError> {
        let list: OrderList = self.api.get("/api/orders").await?.json()?;
        Ok(list.orders)
    }

    pub async fn fetch_jobs(&self) -> Result<Vec<Job>, ApiError> {
        let list: JobList = self.api.get("/api/jobs").await?.json()?;
        Ok(list.jobs)
    }

    /// Delete an order; the service removes its jobs too.
    pub async fn delete_order(&self, order_id: OrderId) -> Result<(), DashboardError> {
        self.api
            .delete(&format!("/api/orders/{order_id}"))
            .await
            .map_err(|source| {
                self.report_failure("Delete order", &source);
                DashboardError::DeleteOrder { order_id, source }
            })?;

        tracing::info!(order_id, "Order deleted");
        self.events.emit(ClientEvent::OrderDeleted { order_id });
        self.refresh_all().await;
        Ok(())
    }

    pub async fn delete_job(&self, job_id: JobId) -> Result<(), DashboardError> {
        self.api
            .delete(&format!("/api/jobs/{job_id}"))
            .await
            .map_err(|source| {
                self.report_failure("Delete job", &source);
                DashboardError::DeleteJob { job_id, source }
            })?;

        tracing::info!(job_id, "Job deleted");
        self.events.emit(ClientEvent::JobDeleted { job_id });
        self.refresh_all().await;
        Ok(())
    }

    fn report_failure(&self, operation: &str, error: &ApiError) {
        self.events.emit(ClientEvent::WorkflowFailed {
            operation: operation.to_string(),
            message: error.user_message("Unknown error"),
        });
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DashboardError {
    #[error("Delete order failed")]
    DeleteOrder {
        order_id: OrderId,
        #[source]
        source: ApiError,
    },

    #[error("Delete job failed")]
    DeleteJob {
        job_id: JobId,
        #[source]
        source: ApiError,
    },
}
