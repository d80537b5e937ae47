//! Job polling state machine.
//!
//! `Idle → Polling → {Completed, Failed, Cancelled}`. A client runs at most
//! one polling session: starting a new one cancels the previous session
//! before the new task is spawned. Every state change and event from a
//! session is published under the generation lock, so a session that was
//! replaced or stopped can never publish again, even if its status
//! response was already in flight.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::models::job::{JobId, JobStatus, JobStatusReport};
use crate::services::api_client::{ApiClient, ApiError};
use crate::services::dashboard::Dashboard;
use crate::services::events::{ClientEvent, EventBus};
use crate::services::retry::{IsRetryable, RetryPolicy};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollState {
    Idle,
    Polling { job_id: JobId },
    Completed { job_id: JobId },
    Failed { job_id: JobId },
    Cancelled { job_id: JobId },
}

impl PollState {
    pub fn job_id(&self) -> Option<JobId> {
        match self {
            PollState::Idle => None,
            PollState::Polling { job_id }
            | PollState::Completed { job_id }
            | PollState::Failed { job_id }
            | PollState::Cancelled { job_id } => Some(*job_id),
        }
    }

    pub fn is_polling(&self) -> bool {
        matches!(self, PollState::Polling { .. })
    }
}

/// Cadence and failure policy of a polling session.
#[derive(Debug, Clone, PartialEq)]
pub struct PollPolicy {
    /// Delay between the end of one status query and the next.
    pub interval: Duration,
    /// Consecutive failed queries tolerated before the session is cancelled.
    pub max_consecutive_failures: u32,
    pub backoff_multiplier: f64,
    pub max_delay: Duration,
    pub jitter: bool,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(1800),
            max_consecutive_failures: 3,
            backoff_multiplier: 2.0,
            max_delay: Duration::from_secs(15),
            jitter: false,
        }
    }
}

impl PollPolicy {
    fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_consecutive_failures,
            initial_delay: self.interval.mul_f64(self.backoff_multiplier.max(1.0)),
            max_delay: self.max_delay.max(self.interval),
            backoff_multiplier: self.backoff_multiplier.max(1.0),
            jitter: self.jitter,
        }
    }

    /// Wait before the next query; never shorter than the interval.
    pub fn next_delay(&self, consecutive_failures: u32) -> Duration {
        if consecutive_failures == 0 {
            return self.interval;
        }
        self.retry_policy()
            .delay_for(consecutive_failures)
            .max(self.interval)
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PollError {
    #[error("job #{0} already reached a terminal state")]
    AlreadyTerminal(JobId),
}

struct ActivePoll {
    job_id: JobId,
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

struct PollerShared {
    api: Arc<ApiClient>,
    events: EventBus,
    dashboard: Arc<Dashboard>,
    policy: PollPolicy,
    state_tx: watch::Sender<PollState>,
    /// Bumped whenever a session starts or is stopped.
    generation: Mutex<u64>,
    terminal: Mutex<HashSet<JobId>>,
}

enum Publish {
    Event(ClientEvent),
    Finish(PollState, ClientEvent),
}

impl PollerShared {
    /// Publish on behalf of session `generation`. Returns false (and
    /// publishes nothing) when that session is no longer current.
    fn publish(&self, generation: u64, publish: Publish) -> bool {
        let current = self.generation.lock();
        if *current != generation {
            return false;
        }
        match publish {
            Publish::Event(event) => self.events.emit(event),
            Publish::Finish(state, event) => {
                if let PollState::Completed { job_id } | PollState::Failed { job_id } = state {
                    self.terminal.lock().insert(job_id);
                }
                self.state_tx.send_replace(state);
                self.events.emit(event);
            }
        }
        true
    }

    async fn query(&self, job_id: JobId) -> Result<JobStatusReport, ApiError> {
        self.api.get(&format!("/api/jobs/{job_id}")).await?.json()
    }
}

/// Owns the client's single polling session.
pub struct JobPoller {
    shared: Arc<PollerShared>,
    active: Mutex<Option<ActivePoll>>,
}

impl JobPoller {
    pub fn new(
        api: Arc<ApiClient>,
        events: EventBus,
        dashboard: Arc<Dashboard>,
        policy: PollPolicy,
    ) -> Self {
        let (state_tx, _rx) = watch::channel(PollState::Idle);
        Self {
            shared: Arc::new(PollerShared {
                api,
                events,
                dashboard,
                policy,
                state_tx,
                generation: Mutex::new(0),
                terminal: Mutex::new(HashSet::new()),
            }),
            active: Mutex::new(None),
        }
    }

    pub fn policy(&self) -> &PollPolicy {
        &self.shared.policy
    }

    pub fn state(&self) -> PollState {
        self.shared.state_tx.borrow().clone()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<PollState> {
        self.shared.state_tx.subscribe()
    }

    /// Whether this client has seen `job_id` complete or fail.
    pub fn is_terminal(&self, job_id: JobId) -> bool {
        self.shared.terminal.lock().contains(&job_id)
    }

    /// Start polling `job_id`, cancelling any session already running.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(&self, job_id: JobId) -> Result<(), PollError> {
        if self.is_terminal(job_id) {
            return Err(PollError::AlreadyTerminal(job_id));
        }

        let mut active = self.active.lock();
        if let Some(previous) = active.take() {
            tracing::debug!(
                previous_job_id = previous.job_id,
                job_id,
                "Replacing active polling session"
            );
            previous.cancel.cancel();
            previous.handle.abort();
        }

        let generation = {
            let mut current = self.shared.generation.lock();
            *current += 1;
            self.shared
                .state_tx
                .send_replace(PollState::Polling { job_id });
            *current
        };

        let cancel = CancellationToken::new();
        let handle = tokio::spawn(run_session(
            self.shared.clone(),
            job_id,
            generation,
            cancel.clone(),
        ));
        *active = Some(ActivePoll {
            job_id,
            cancel,
            handle,
        });

        tracing::info!(job_id, interval_ms = self.shared.policy.interval.as_millis() as u64, "Polling job status");
        Ok(())
    }

    /// Stop the active session, if any. Calling it again is a no-op.
    pub fn stop(&self) {
        let mut active = self.active.lock();
        let Some(session) = active.take() else {
            return;
        };
        session.cancel.cancel();
        session.handle.abort();

        let mut current = self.shared.generation.lock();
        *current += 1;
        if self.shared.state_tx.borrow().is_polling() {
            self.shared.state_tx.send_replace(PollState::Cancelled {
                job_id: session.job_id,
            });
            tracing::info!(job_id = session.job_id, "Polling stopped");
        }
    }

    /// Wait until the poller leaves the `Polling` state and return the
    /// state it settled in.
    pub async fn wait_until_settled(&self) -> PollState {
        let mut rx = self.subscribe_state();
        loop {
            let state = rx.borrow_and_update().clone();
            if !state.is_polling() {
                return state;
            }
            if rx.changed().await.is_err() {
                return state;
            }
        }
    }
}

impl Drop for JobPoller {
    fn drop(&mut self) {
        if let Some(session) = self.active.get_mut().take() {
            session.cancel.cancel();
            session.handle.abort();
        }
    }
}

async fn run_session(
    shared: Arc<PollerShared>,
    job_id: JobId,
    generation: u64,
    cancel: CancellationToken,
) {
    let policy = shared.policy.clone();
    let mut failures: u32 = 0;

    loop {
        let delay = policy.next_delay(failures);
        tokio::select! {
            _ = cancel.cancelled() => return,
            _ = tokio::time::sleep(delay) => {}
        }

        metrics::counter!("headshot_poll_ticks_total").increment(1);
        let outcome = tokio::select! {
            _ = cancel.cancelled() => return,
            outcome = shared.query(job_id) => outcome,
        };

        match outcome {
            Ok(report) => {
                failures = 0;
                match report.status {
                    JobStatus::Queued | JobStatus::Processing => {
                        tracing::debug!(
                            job_id,
                            status = %report.status,
                            seconds_remaining = report.seconds_remaining,
                            "Job still running"
                        );
                        let progress = ClientEvent::Progress {
                            job_id,
                            status: report.status,
                            seconds_remaining: report.seconds_remaining,
                        };
                        if !shared.publish(generation, Publish::Event(progress)) {
                            return;
                        }
                    }
                    JobStatus::Completed => {
                        let finished = shared.publish(
                            generation,
                            Publish::Finish(
                                PollState::Completed { job_id },
                                ClientEvent::JobCompleted { job_id },
                            ),
                        );
                        if finished {
                            metrics::counter!("headshot_jobs_completed_total").increment(1);
                            tracing::info!(job_id, "Job completed");
                            let dashboard = shared.dashboard.clone();
                            tokio::spawn(async move { dashboard.refresh_all().await });
                        }
                        return;
                    }
                    JobStatus::Failed => {
                        let finished = shared.publish(
                            generation,
                            Publish::Finish(
                                PollState::Failed { job_id },
                                ClientEvent::JobFailed { job_id },
                            ),
                        );
                        if finished {
                            metrics::counter!("headshot_jobs_failed_total").increment(1);
                            tracing::warn!(job_id, "Job failed");
                        }
                        return;
                    }
                }
            }
            Err(e) => {
                failures += 1;
                tracing::warn!(job_id, error = %e, consecutive_failures = failures, "Job status unavailable");
                let unavailable = ClientEvent::StatusUnavailable {
                    job_id,
                    consecutive_failures: failures,
                    error: e.to_string(),
                };
                if !shared.publish(generation, Publish::Event(unavailable)) {
                    return;
                }

                // An unreadable 2xx body counts toward the failure budget.
                let transient = e.is_retryable() || matches!(e, ApiError::Decode(_));
                let reason = if !transient {
                    Some(e.user_message("status query failed permanently"))
                } else if failures >= policy.max_consecutive_failures {
                    Some(format!("status unavailable after {failures} attempts"))
                } else {
                    None
                };
                if let Some(reason) = reason {
                    tracing::warn!(job_id, %reason, "Giving up on job status");
                    shared.publish(
                        generation,
                        Publish::Finish(
                            PollState::Cancelled { job_id },
                            ClientEvent::PollAbandoned { job_id, reason },
                        ),
                    );
                    return;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_delay_never_tightens() {
        let policy = PollPolicy::default();
        assert_eq!(policy.next_delay(0), Duration::from_millis(1800));
        assert_eq!(policy.next_delay(1), Duration::from_millis(3600));
        assert_eq!(policy.next_delay(2), Duration::from_millis(7200));
        assert_eq!(policy.next_delay(3), Duration::from_millis(14400));
        assert_eq!(policy.next_delay(4), Duration::from_secs(15));
    }

    #[test]
    fn test_multiplier_below_one_keeps_interval() {
        let policy = PollPolicy {
            backoff_multiplier: 0.5,
            ..PollPolicy::default()
        };
        assert_eq!(policy.next_delay(2), policy.interval);
    }

    #[test]
    fn test_poll_state_accessors() {
        assert_eq!(PollState::Idle.job_id(), None);
        assert_eq!(PollState::Completed { job_id: 4 }.job_id(), Some(4));
        assert!(PollState::Polling { job_id: 1 }.is_polling());
        assert!(!PollState::Cancelled { job_id: 1 }.is_polling());
    }
}
