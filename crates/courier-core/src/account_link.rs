//! # Account-Link Completion
//!
//! Runs once a chat user has linked their GitHub account: schedules the
//! identity cache population job and confirms the link in the chat. The two
//! are independent; failing to schedule does not stop the confirmation.
//!
//! The user's [`LinkState`] is kept in the account cache. The hook records
//! the confirmation result and the population job records its completion,
//! in whichever order they finish.

use crate::jobs::{Job, JobHandle, JobScheduler, RetryPolicy};
use crate::outbound::{Delivery, Outbound, OutboundError, OutboundMessage};
use crate::{keys, Context};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{error, info, instrument, warn};

/// Confirmation sent after a successful link.
pub const CONFIRMATION_TEXT: &str =
    "Great! Now you can reply issues, commits, merge requests and snippets";

/// Delay before the identity cache population job first runs.
pub const DEFAULT_POPULATION_DELAY: Duration = Duration::from_secs(5);

/// Retries allowed for the identity cache population job.
pub const DEFAULT_POPULATION_RETRIES: u32 = 10;

/// Lifecycle of a chat user's GitHub link.
///
/// `Linked` and `IdentityCachePopulated` are observed independently: the
/// confirmation can be sent before, after or without the cache being filled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LinkState {
    Unlinked,
    Linking,
    Linked { confirmation_sent: bool },
    IdentityCachePopulated,
}

impl LinkState {
    /// The user started the OAuth flow.
    pub fn begin(self) -> Self {
        match self {
            Self::Unlinked => Self::Linking,
            other => other,
        }
    }

    /// OAuth completed; `confirmation_sent` says whether the chat was told.
    pub fn linked(self, confirmation_sent: bool) -> Self {
        match self {
            Self::Unlinked | Self::Linking | Self::Linked { .. } => {
                Self::Linked { confirmation_sent }
            }
            Self::IdentityCachePopulated => Self::IdentityCachePopulated,
        }
    }

    /// The population job finished.
    ///
    /// The job may finish before the confirmation is recorded, so `Linking`
    /// moves forward too.
    pub fn populated(self) -> Self {
        match self {
            Self::Unlinked => Self::Unlinked,
            _ => Self::IdentityCachePopulated,
        }
    }

    pub fn is_linked(&self) -> bool {
        matches!(self, Self::Linked { .. } | Self::IdentityCachePopulated)
    }
}

/// Stored link state of the context's user; `Unlinked` when nothing is
/// stored or the cache cannot be read.
pub async fn link_state(ctx: &Context) -> LinkState {
    let Some(cache) = ctx.user_cache() else {
        return LinkState::Unlinked;
    };
    match cache.get::<LinkState>(keys::LINK_STATE).await {
        Ok(state) => state.unwrap_or(LinkState::Unlinked),
        Err(e) => {
            warn!(error = %e, "Could not read link state");
            LinkState::Unlinked
        }
    }
}

/// Apply `transition` to the stored link state and store the result.
pub async fn update_link_state(
    ctx: &Context,
    transition: impl FnOnce(LinkState) -> LinkState,
) -> LinkState {
    let state = transition(link_state(ctx).await);
    if let Some(cache) = ctx.user_cache() {
        if let Err(e) = cache
            .set(keys::LINK_STATE, &state, keys::LINK_STATE_TTL)
            .await
        {
            error!(error = %e, "Could not store link state");
        }
    }
    state
}

/// Record that the identity cache of the context's user is populated.
pub async fn mark_populated(ctx: &Context) -> LinkState {
    update_link_state(ctx, LinkState::populated).await
}

/// Errors completing an account link.
#[derive(Debug, Error)]
pub enum AccountLinkError {
    #[error("Account link requires a chat user")]
    MissingUser,

    #[error("Could not send link confirmation: {0}")]
    Confirmation(#[from] OutboundError),
}

/// What happened when a link completed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkOutcome {
    /// The population job, when it could be scheduled
    pub job: Option<JobHandle>,
    pub delivery: Delivery,
    pub state: LinkState,
}

/// Hook invoked after a successful account link.
#[derive(Clone)]
pub struct AccountLinkHook {
    scheduler: Arc<dyn JobScheduler>,
    outbound: Arc<dyn Outbound>,
    population_delay: Duration,
    retry_policy: RetryPolicy,
}

impl AccountLinkHook {
    pub fn new(scheduler: Arc<dyn JobScheduler>, outbound: Arc<dyn Outbound>) -> Self {
        Self {
            scheduler,
            outbound,
            population_delay: DEFAULT_POPULATION_DELAY,
            retry_policy: RetryPolicy::fibonacci(DEFAULT_POPULATION_RETRIES, Duration::from_secs(1)),
        }
    }

    pub fn with_population_delay(mut self, delay: Duration) -> Self {
        self.population_delay = delay;
        self
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    /// Schedule identity cache population and confirm the link.
    #[instrument(skip(self, ctx), fields(chat = %ctx.chat()))]
    pub async fn on_account_linked(&self, ctx: &Context) -> Result<LinkOutcome, AccountLinkError> {
        let user = ctx.user().ok_or(AccountLinkError::MissingUser)?;
        update_link_state(ctx, LinkState::begin).await;

        let job = Job::PopulateIdentityCache {
            chat: ctx.chat(),
            user: user.clone(),
        };
        let job = match self
            .scheduler
            .schedule(job, self.population_delay, self.retry_policy.clone())
            .await
        {
            Ok(handle) => {
                info!(job_id = %handle.id, user = %user.id, "Scheduled identity cache population");
                Some(handle)
            }
            Err(e) => {
                error!(error = %e, user = %user.id, "Could not schedule identity cache population");
                None
            }
        };

        let sent = self
            .outbound
            .send(ctx.chat(), OutboundMessage::text(CONFIRMATION_TEXT))
            .await;
        let state = update_link_state(ctx, |state| state.linked(sent.is_ok())).await;
        let delivery = sent?;

        Ok(LinkOutcome {
            job,
            delivery,
            state,
        })
    }
}

#[cfg(test)]
#[path = "account_link_tests.rs"]
mod tests;
