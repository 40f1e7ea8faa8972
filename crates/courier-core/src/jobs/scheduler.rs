//! Tokio-backed job scheduler.
//!
//! Each scheduled job gets its own task that sleeps for the requested delay,
//! then runs the job. Runs of the same [`JobKind`] are serialized through a
//! per-kind semaphore. Transient failures are retried with the job's
//! [`RetryPolicy`].

use super::{Job, JobError, JobHandle, JobId, JobKind, JobRunner, JobScheduler, RetryPolicy, SchedulerError};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Semaphore;
use tracing::{debug, error, info, warn};

/// Default number of concurrent runs per job kind.
pub const DEFAULT_CONCURRENCY_PER_KIND: usize = 1;

/// Scheduler that runs jobs on the Tokio runtime.
#[derive(Clone)]
pub struct TokioJobScheduler {
    runner: Arc<dyn JobRunner>,
    concurrency_per_kind: usize,
    slots: Arc<Mutex<HashMap<JobKind, Arc<Semaphore>>>>,
    closed: Arc<AtomicBool>,
}

impl TokioJobScheduler {
    pub fn new(runner: Arc<dyn JobRunner>) -> Self {
        Self::with_concurrency(runner, DEFAULT_CONCURRENCY_PER_KIND)
    }

    pub fn with_concurrency(runner: Arc<dyn JobRunner>, concurrency_per_kind: usize) -> Self {
        Self {
            runner,
            concurrency_per_kind: concurrency_per_kind.max(1),
            slots: Arc::new(Mutex::new(HashMap::new())),
            closed: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Stop accepting jobs. Pending jobs are dropped before their next run.
    pub fn shutdown(&self) {
        self.closed.store(true, Ordering::SeqCst);
        if let Ok(slots) = self.slots.lock() {
            for semaphore in slots.values() {
                semaphore.close();
            }
        }
    }

    pub fn is_shut_down(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn slot_for(&self, kind: JobKind) -> Result<Arc<Semaphore>, SchedulerError> {
        let mut slots = self.slots.lock().map_err(|_| SchedulerError::Failed {
            message: "scheduler lock poisoned".to_string(),
        })?;
        Ok(slots
            .entry(kind)
            .or_insert_with(|| Arc::new(Semaphore::new(self.concurrency_per_kind)))
            .clone())
    }
}

#[async_trait]
impl JobScheduler for TokioJobScheduler {
    async fn schedule(
        &self,
        job: Job,
        delay: Duration,
        retry_policy: RetryPolicy,
    ) -> Result<JobHandle, SchedulerError> {
        if self.is_shut_down() {
            return Err(SchedulerError::ShutDown);
        }

        let handle = JobHandle {
            id: JobId::new(),
            kind: job.kind(),
        };
        let slot = self.slot_for(handle.kind)?;
        let runner = self.runner.clone();
        let closed = self.closed.clone();
        let job_id = handle.id;

        debug!(job_id = %job_id, kind = %handle.kind, delay_ms = delay.as_millis() as u64, "Job scheduled");

        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            run_with_retries(runner, slot, closed, job, job_id, retry_policy).await;
        });

        Ok(handle)
    }
}

async fn run_with_retries(
    runner: Arc<dyn JobRunner>,
    slot: Arc<Semaphore>,
    closed: Arc<AtomicBool>,
    job: Job,
    job_id: JobId,
    retry_policy: RetryPolicy,
) {
    let kind = job.kind();
    let mut attempt: u32 = 0;

    loop {
        if closed.load(Ordering::SeqCst) {
            info!(job_id = %job_id, kind = %kind, "Scheduler shut down; dropping job");
            return;
        }

        let result: Result<(), JobError> = match slot.acquire().await {
            Ok(_permit) => runner.run(&job).await,
            Err(_) => {
                info!(job_id = %job_id, kind = %kind, "Scheduler shut down; dropping job");
                return;
            }
        };

        match result {
            Ok(()) => {
                info!(job_id = %job_id, kind = %kind, attempts = attempt + 1, "Job completed");
                return;
            }
            Err(e) if e.is_transient() && retry_policy.should_retry(attempt) => {
                let delay = retry_policy.calculate_delay(attempt);
                warn!(
                    job_id = %job_id,
                    kind = %kind,
                    attempt = attempt + 1,
                    retry_in_ms = delay.as_millis() as u64,
                    error = %e,
                    "Job failed; retrying"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => {
                error!(
                    job_id = %job_id,
                    kind = %kind,
                    attempts = attempt + 1,
                    error = %e,
                    "Job failed permanently"
                );
                return;
            }
        }
    }
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;
