//! Router tests driven through `tower::ServiceExt::oneshot`.

use super::*;
use async_trait::async_trait;
use axum::{body::Body, http::Request};
use courier_core::{
    adapters::{InMemoryCacheStore, InMemoryOutbound},
    jobs::{Job, JobHandle, JobId, RetryPolicy, SchedulerError},
    tokens::TokenSource,
};
use std::sync::Mutex;
use std::time::Duration;
use tower::ServiceExt;

// ============================================================================
// Test doubles
// ============================================================================

/// Scheduler that records jobs without running them.
#[derive(Default)]
struct RecordingScheduler {
    jobs: Mutex<Vec<(Job, Duration)>>,
}

#[async_trait]
impl JobScheduler for RecordingScheduler {
    async fn schedule(
        &self,
        job: Job,
        delay: Duration,
        _retry_policy: RetryPolicy,
    ) -> Result<JobHandle, SchedulerError> {
        let kind = job.kind();
        self.jobs.lock().unwrap().push((job, delay));
        Ok(JobHandle {
            id: JobId::new(),
            kind,
        })
    }
}

struct TestApp {
    router: Router,
    outbound: Arc<InMemoryOutbound>,
    scheduler: Arc<RecordingScheduler>,
    tokens: Arc<InMemoryTokenSource>,
    metrics: Arc<ServiceMetrics>,
}

fn test_app(config: ServiceConfig) -> TestApp {
    let outbound = Arc::new(InMemoryOutbound::new());
    let scheduler = Arc::new(RecordingScheduler::default());
    let tokens = Arc::new(InMemoryTokenSource::new());
    let metrics = ServiceMetrics::new().unwrap();

    let state = AppState::new(
        config,
        Arc::new(InMemoryCacheStore::new()),
        outbound.clone(),
        scheduler.clone(),
        tokens.clone(),
        metrics.clone(),
    );

    TestApp {
        router: create_router(state),
        outbound,
        scheduler,
        tokens,
        metrics,
    }
}

fn config() -> ServiceConfig {
    let mut config = ServiceConfig::default();
    config.webhooks.public_url = "https://courier.example.com".to_string();
    config
}

fn push_body() -> Vec<u8> {
    serde_json::to_vec(&serde_json::json!({
        "ref": "refs/heads/main",
        "before": "0000000000aaaa",
        "after": "1111111111bbbb",
        "compare": "https://github.com/octo/repo/compare/0000000000...1111111111",
        "commits": [{
            "id": "deadbeef",
            "message": "Initial commit\n",
            "url": "https://github.com/octo/repo/commit/deadbeef",
            "author": {"name": "alice", "email": "alice@x.com"},
            "added": ["README.md"],
            "removed": [],
            "modified": []
        }],
        "repository": {"full_name": "octo/repo", "url": "https://github.com/octo/repo"},
        "pusher": {"name": "alice", "email": "alice@x.com"}
    }))
    .unwrap()
}

fn webhook_request(chat: &str, event_type: &str, body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(format!("/webhook/{}", chat))
        .header("X-GitHub-Event", event_type)
        .header("content-type", "application/json")
        .body(Body::from(body))
        .unwrap()
}

fn json_request(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(&body).unwrap()))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

// ============================================================================
// Webhook endpoint
// ============================================================================

#[tokio::test]
async fn test_push_webhook_is_delivered_to_chat() {
    let app = test_app(config());

    let response = app
        .router
        .oneshot(webhook_request("-100", "push", push_body()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "delivered");
    assert_eq!(body["idempotency_key"], "commit_deadbeef");
    assert_eq!(body["delivery"], "posted");

    let messages = app.outbound.messages(ChatId::new(-100));
    assert_eq!(messages.len(), 1);
    assert_eq!(body["text"], messages[0].message.text.as_str());
}

#[tokio::test]
async fn test_replayed_push_edits_the_message() {
    let app = test_app(config());

    let first = app
        .router
        .clone()
        .oneshot(webhook_request("7", "push", push_body()))
        .await
        .unwrap();
    let second = app
        .router
        .oneshot(webhook_request("7", "push", push_body()))
        .await
        .unwrap();

    assert_eq!(body_json(first).await["delivery"], "posted");
    assert_eq!(body_json(second).await["delivery"], "edited");
    assert_eq!(app.outbound.messages(ChatId::new(7)).len(), 1);
}

#[tokio::test]
async fn test_ping_is_not_implemented() {
    let app = test_app(config());

    let response = app
        .router
        .oneshot(webhook_request("7", "ping", b"{\"zen\":\"Keep it logically awesome.\"}".to_vec()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_IMPLEMENTED);
    assert_eq!(body_json(response).await["status"], 501);
    assert!(app.outbound.is_empty());
}

#[tokio::test]
async fn test_missing_event_header_is_not_implemented() {
    let app = test_app(config());

    let request = Request::builder()
        .method("POST")
        .uri("/webhook/7")
        .header("content-type", "application/json")
        .body(Body::from(push_body()))
        .unwrap();
    let response = app.router.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_IMPLEMENTED);
    assert!(app.outbound.is_empty());
}

#[tokio::test]
async fn test_unsupported_event_is_not_implemented() {
    let app = test_app(config());

    let response = app
        .router
        .oneshot(webhook_request("7", "issues", b"{}".to_vec()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_IMPLEMENTED);
    assert!(app.outbound.is_empty());
}

#[tokio::test]
async fn test_invalid_chat_id_is_bad_request() {
    let app = test_app(config());

    let response = app
        .router
        .oneshot(webhook_request("general", "push", push_body()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_push_without_commits_is_bad_request() {
    let app = test_app(config());
    let body = serde_json::to_vec(&serde_json::json!({
        "ref": "refs/heads/main",
        "before": "0000000000aaaa",
        "after": "1111111111bbbb",
        "commits": []
    }))
    .unwrap();

    let response = app
        .router
        .oneshot(webhook_request("7", "push", body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(app.outbound.is_empty());
}

#[tokio::test]
async fn test_signature_is_enforced_when_secret_configured() {
    let mut config = config();
    config.webhooks.secret = Some("webhook-secret".to_string());
    let app = test_app(config);
    let signature = HmacSignatureValidator::new("webhook-secret")
        .sign(&push_body())
        .unwrap();

    let unsigned = app
        .router
        .clone()
        .oneshot(webhook_request("7", "push", push_body()))
        .await
        .unwrap();
    assert_eq!(unsigned.status(), StatusCode::UNAUTHORIZED);

    let mut signed = webhook_request("7", "push", push_body());
    signed
        .headers_mut()
        .insert("X-Hub-Signature-256", signature.parse().unwrap());
    let response = app.router.oneshot(signed).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

// ============================================================================
// Chat commands
// ============================================================================

#[tokio::test]
async fn test_start_command_replies_with_webhook_url() {
    let app = test_app(config());

    let response = app
        .router
        .oneshot(json_request(
            "/chats/-42/commands",
            serde_json::json!({ "text": "/start@courier_bot" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["handled"], true);
    assert_eq!(body["command"], "start");

    let messages = app.outbound.messages(ChatId::new(-42));
    assert!(messages[0]
        .message
        .text
        .contains("<code>https://courier.example.com/webhook/-42</code>"));
}

#[tokio::test]
async fn test_silent_start_is_not_answered() {
    let app = test_app(config());

    let response = app
        .router
        .oneshot(json_request(
            "/chats/-42/commands",
            serde_json::json!({ "text": "/start silent" }),
        ))
        .await
        .unwrap();

    assert_eq!(body_json(response).await["handled"], false);
    assert!(app.outbound.is_empty());
}

// ============================================================================
// Account link
// ============================================================================

#[tokio::test]
async fn test_account_link_schedules_population_and_confirms() {
    let app = test_app(config());

    let response = app
        .router
        .oneshot(json_request(
            "/chats/5/account-link",
            serde_json::json!({
                "user_id": 77,
                "username": "alice_tg",
                "access_token": "gho_alice"
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert!(body["job_id"].is_string());

    let jobs = app.scheduler.jobs.lock().unwrap().clone();
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0].1, Duration::from_secs(5));
    assert_eq!(
        jobs[0].0,
        Job::PopulateIdentityCache {
            chat: ChatId::new(5),
            user: ChatUser::new(UserId::new(77), Some("alice_tg".to_string())),
        }
    );

    let token = app.tokens.access_token(UserId::new(77)).await.unwrap();
    assert_eq!(token.secret(), "gho_alice");

    let messages = app.outbound.messages(ChatId::new(5));
    assert_eq!(
        messages[0].message.text,
        courier_core::account_link::CONFIRMATION_TEXT
    );
}

// ============================================================================
// Health and metrics
// ============================================================================

#[tokio::test]
async fn test_health_check() {
    let app = test_app(config());

    let response = app
        .router
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["status"], "healthy");
}

#[tokio::test]
async fn test_metrics_count_webhook_outcomes() {
    let app = test_app(config());

    app.router
        .clone()
        .oneshot(webhook_request("7", "push", push_body()))
        .await
        .unwrap();
    app.router
        .clone()
        .oneshot(webhook_request("7", "issues", b"{}".to_vec()))
        .await
        .unwrap();

    let response = app
        .router
        .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();

    assert!(text.contains("courier_webhook_requests_total{outcome=\"delivered\"} 1"));
    assert!(text.contains("courier_webhook_requests_total{outcome=\"rejected\"} 1"));
    assert_eq!(
        app.metrics
            .push_render_duration_seconds
            .get_sample_count(),
        1
    );
}
