//! Runner for identity cache population jobs.

use super::{Job, JobError, JobRunner};
use crate::cache::CacheStore;
use crate::tokens::{TokenError, TokenSource};
use crate::{account_link, identity, keys, Context, ServiceInfo};
use async_trait::async_trait;
use courier_github::{CodeHostClient, UserProfile};
use std::sync::Arc;
use tracing::{debug, error, info, instrument};

/// Runs [`Job::PopulateIdentityCache`]: look up the linked GitHub profile and
/// map its name and email to the chat user's handle.
#[derive(Clone)]
pub struct IdentityCacheJobRunner {
    service: Arc<ServiceInfo>,
    cache: Arc<dyn CacheStore>,
    tokens: Arc<dyn TokenSource>,
    client: Arc<dyn CodeHostClient>,
}

impl IdentityCacheJobRunner {
    pub fn new(
        service: Arc<ServiceInfo>,
        cache: Arc<dyn CacheStore>,
        tokens: Arc<dyn TokenSource>,
        client: Arc<dyn CodeHostClient>,
    ) -> Self {
        Self {
            service,
            cache,
            tokens,
            client,
        }
    }

    /// Profile of the user's linked account, from the account cache when it
    /// holds a populated profile, else from GitHub.
    pub async fn profile(&self, ctx: &Context) -> Result<UserProfile, JobError> {
        let (Some(user), Some(user_cache)) = (ctx.user(), ctx.user_cache()) else {
            return Err(JobError::Permanent {
                message: "profile lookup needs a chat user".to_string(),
            });
        };

        match user_cache.get::<UserProfile>(keys::PROFILE).await {
            Ok(Some(profile)) if profile.is_populated() => {
                debug!(user = %user.id, "Using cached GitHub profile");
                return Ok(profile);
            }
            Ok(_) => {}
            Err(e) => debug!(error = %e, user = %user.id, "Cached GitHub profile unreadable"),
        }

        let token = self.tokens.access_token(user.id).await.map_err(|e| match e {
            TokenError::NotLinked { .. } => JobError::Permanent {
                message: e.to_string(),
            },
            TokenError::StoreFailed { .. } => JobError::Transient {
                message: e.to_string(),
            },
        })?;

        let profile = self
            .client
            .get_authenticated_user(&token)
            .await
            .map_err(|e| {
                let message = format!("could not fetch GitHub profile: {}", e);
                if e.is_transient() {
                    JobError::Transient { message }
                } else {
                    JobError::Permanent { message }
                }
            })?;

        if let Err(e) = user_cache
            .set(keys::PROFILE, &profile, keys::PROFILE_TTL)
            .await
        {
            error!(error = %e, user = %user.id, "Could not set cache for user");
        }

        Ok(profile)
    }
}

#[async_trait]
impl JobRunner for IdentityCacheJobRunner {
    #[instrument(skip(self, job))]
    async fn run(&self, job: &Job) -> Result<(), JobError> {
        match job {
            Job::PopulateIdentityCache { chat, user } => {
                let ctx = Context::new(*chat, self.service.clone(), self.cache.clone())
                    .with_user(user.clone());

                let profile = self.profile(&ctx).await?;
                let handle = user.handle().unwrap_or_default();

                identity::populate(
                    &ctx,
                    profile.name.as_deref().unwrap_or_default(),
                    profile.email.as_deref().unwrap_or_default(),
                    handle,
                )
                .await;
                let state = account_link::mark_populated(&ctx).await;

                info!(
                    user = %user.id,
                    login = %profile.login,
                    state = ?state,
                    "Identity cache populated"
                );
                Ok(())
            }
        }
    }
}

#[cfg(test)]
#[path = "identity_tests.rs"]
mod tests;
