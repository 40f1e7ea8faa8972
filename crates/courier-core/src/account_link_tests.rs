use super::*;
use crate::adapters::{InMemoryCacheStore, InMemoryOutbound};
use crate::jobs::{JobId, JobKind, MockJobScheduler, SchedulerError};
use crate::outbound::MockOutbound;
use crate::{ChatId, ChatUser, ServiceInfo, UserId};

fn context(user: Option<ChatUser>) -> Context {
    let ctx = Context::new(
        ChatId::new(12),
        Arc::new(ServiceInfo::new("github", "https://courier.example.com")),
        Arc::new(InMemoryCacheStore::new()),
    );
    match user {
        Some(user) => ctx.with_user(user),
        None => ctx,
    }
}

fn alice() -> ChatUser {
    ChatUser::new(UserId::new(3), Some("alice_tg".to_string()))
}

mod state_tests {
    use super::*;

    #[test]
    fn test_happy_path_transitions() {
        let state = LinkState::Unlinked.begin();
        assert_eq!(state, LinkState::Linking);

        let state = state.linked(true);
        assert_eq!(
            state,
            LinkState::Linked {
                confirmation_sent: true
            }
        );
        assert!(state.is_linked());

        assert_eq!(state.populated(), LinkState::IdentityCachePopulated);
    }

    #[test]
    fn test_population_requires_link_to_have_started() {
        assert_eq!(LinkState::Unlinked.populated(), LinkState::Unlinked);
        assert_eq!(
            LinkState::Linking.populated(),
            LinkState::IdentityCachePopulated
        );
    }

    #[test]
    fn test_populated_is_not_downgraded_by_late_confirmation() {
        assert_eq!(
            LinkState::IdentityCachePopulated.linked(true),
            LinkState::IdentityCachePopulated
        );
    }
}

#[tokio::test]
async fn test_schedules_population_and_confirms() {
    let mut scheduler = MockJobScheduler::new();
    scheduler
        .expect_schedule()
        .withf(|job, delay, policy| {
            *job == Job::PopulateIdentityCache {
                chat: ChatId::new(12),
                user: alice(),
            } && *delay == Duration::from_secs(5)
                && policy.max_retries == 10
        })
        .times(1)
        .returning(|job, _, _| {
            Ok(JobHandle {
                id: JobId::new(),
                kind: job.kind(),
            })
        });
    let outbound = Arc::new(InMemoryOutbound::new());
    let hook = AccountLinkHook::new(Arc::new(scheduler), outbound.clone());
    let ctx = context(Some(alice()));

    let outcome = hook.on_account_linked(&ctx).await.unwrap();

    assert_eq!(outcome.job.map(|h| h.kind), Some(JobKind::PopulateIdentityCache));
    assert_eq!(outcome.delivery, Delivery::Posted);
    assert!(outcome.state.is_linked());

    let messages = outbound.messages(ctx.chat());
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].message.text, CONFIRMATION_TEXT);
}

#[tokio::test]
async fn test_scheduling_failure_still_confirms() {
    let mut scheduler = MockJobScheduler::new();
    scheduler
        .expect_schedule()
        .returning(|_, _, _| Err(SchedulerError::ShutDown));
    let outbound = Arc::new(InMemoryOutbound::new());
    let hook = AccountLinkHook::new(Arc::new(scheduler), outbound.clone());
    let ctx = context(Some(alice()));

    let outcome = hook.on_account_linked(&ctx).await.unwrap();

    assert_eq!(outcome.job, None);
    assert_eq!(outbound.messages(ctx.chat()).len(), 1);
}

#[tokio::test]
async fn test_custom_delay_is_used() {
    let mut scheduler = MockJobScheduler::new();
    scheduler
        .expect_schedule()
        .withf(|_, delay, _| *delay == Duration::from_millis(10))
        .returning(|job, _, _| {
            Ok(JobHandle {
                id: JobId::new(),
                kind: job.kind(),
            })
        });
    let hook = AccountLinkHook::new(Arc::new(scheduler), Arc::new(InMemoryOutbound::new()))
        .with_population_delay(Duration::from_millis(10));

    assert!(hook.on_account_linked(&context(Some(alice()))).await.is_ok());
}

#[tokio::test]
async fn test_missing_user_is_rejected() {
    let mut scheduler = MockJobScheduler::new();
    scheduler.expect_schedule().times(0);
    let hook = AccountLinkHook::new(Arc::new(scheduler), Arc::new(InMemoryOutbound::new()));

    let result = hook.on_account_linked(&context(None)).await;

    assert!(matches!(result, Err(AccountLinkError::MissingUser)));
}

fn scheduler_accepting_jobs() -> MockJobScheduler {
    let mut scheduler = MockJobScheduler::new();
    scheduler.expect_schedule().returning(|job, _, _| {
        Ok(JobHandle {
            id: JobId::new(),
            kind: job.kind(),
        })
    });
    scheduler
}

// ============================================================================
// Stored link state
// ============================================================================

#[tokio::test]
async fn test_unknown_user_is_unlinked() {
    assert_eq!(link_state(&context(Some(alice()))).await, LinkState::Unlinked);
    assert_eq!(link_state(&context(None)).await, LinkState::Unlinked);
}

#[tokio::test]
async fn test_confirmation_is_stored_before_population() {
    let hook = AccountLinkHook::new(
        Arc::new(scheduler_accepting_jobs()),
        Arc::new(InMemoryOutbound::new()),
    );
    let ctx = context(Some(alice()));

    let outcome = hook.on_account_linked(&ctx).await.unwrap();

    let linked = LinkState::Linked {
        confirmation_sent: true,
    };
    assert_eq!(outcome.state, linked);
    assert_eq!(link_state(&ctx).await, linked);

    assert_eq!(mark_populated(&ctx).await, LinkState::IdentityCachePopulated);
    assert_eq!(link_state(&ctx).await, LinkState::IdentityCachePopulated);
}

#[tokio::test]
async fn test_population_finishing_first_is_kept() {
    let outbound = Arc::new(InMemoryOutbound::new());
    let hook = AccountLinkHook::new(Arc::new(scheduler_accepting_jobs()), outbound.clone());
    let ctx = context(Some(alice()));
    update_link_state(&ctx, LinkState::begin).await;

    mark_populated(&ctx).await;
    let outcome = hook.on_account_linked(&ctx).await.unwrap();

    assert_eq!(outcome.state, LinkState::IdentityCachePopulated);
    assert_eq!(link_state(&ctx).await, LinkState::IdentityCachePopulated);
    assert_eq!(outbound.messages(ctx.chat()).len(), 1);
}

#[tokio::test]
async fn test_failed_confirmation_is_stored_as_unsent() {
    let mut outbound = MockOutbound::new();
    outbound.expect_send().times(1).returning(|_, _| {
        Err(OutboundError::Transport {
            message: "connection refused".to_string(),
        })
    });
    let hook = AccountLinkHook::new(Arc::new(scheduler_accepting_jobs()), Arc::new(outbound));
    let ctx = context(Some(alice()));

    let result = hook.on_account_linked(&ctx).await;

    assert!(matches!(result, Err(AccountLinkError::Confirmation(_))));
    assert_eq!(
        link_state(&ctx).await,
        LinkState::Linked {
            confirmation_sent: false
        }
    );
}
