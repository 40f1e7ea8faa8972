//! # Deferred Jobs
//!
//! Typed job descriptions, the scheduler interface and its Tokio
//! implementation, and the runner that executes the jobs.

use crate::{ChatId, ChatUser};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

mod identity;
mod retry;
mod scheduler;

pub use identity::IdentityCacheJobRunner;
pub use retry::RetryPolicy;
pub use scheduler::TokioJobScheduler;

/// Work that can be deferred.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Job {
    /// Map the linked GitHub account's name and email to the user's chat
    /// handle.
    PopulateIdentityCache { chat: ChatId, user: ChatUser },
}

impl Job {
    /// Jobs of the same kind never run concurrently.
    pub fn kind(&self) -> JobKind {
        match self {
            Self::PopulateIdentityCache { .. } => JobKind::PopulateIdentityCache,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JobKind {
    PopulateIdentityCache,
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PopulateIdentityCache => write!(f, "populate_identity_cache"),
        }
    }
}

/// Identifier of a scheduled job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobId(Uuid);

impl JobId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Receipt for a scheduled job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobHandle {
    pub id: JobId,
    pub kind: JobKind,
}

/// Errors accepting a job for scheduling.
#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("Scheduler is shut down")]
    ShutDown,

    #[error("Scheduling failed: {message}")]
    Failed { message: String },
}

/// Errors from a job run.
#[derive(Debug, Error)]
pub enum JobError {
    /// May succeed on a later attempt
    #[error("Transient job failure: {message}")]
    Transient { message: String },

    /// Retrying will not help
    #[error("Permanent job failure: {message}")]
    Permanent { message: String },
}

impl JobError {
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient { .. })
    }
}

/// Accepts jobs for deferred execution.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait JobScheduler: Send + Sync {
    /// Run `job` after `delay`, retrying failures according to `retry_policy`.
    async fn schedule(
        &self,
        job: Job,
        delay: Duration,
        retry_policy: RetryPolicy,
    ) -> Result<JobHandle, SchedulerError>;
}

/// Executes a single attempt of a job.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait JobRunner: Send + Sync {
    async fn run(&self, job: &Job) -> Result<(), JobError>;
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
