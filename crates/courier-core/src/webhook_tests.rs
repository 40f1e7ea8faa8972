//! Tests for webhook processing.

use super::*;
use crate::adapters::{InMemoryCacheStore, InMemoryOutbound};
use crate::outbound::MockOutbound;
use crate::push::CompareLinker;
use crate::rich_text::HtmlRichText;
use crate::signature::HmacSignatureValidator;
use crate::{ChatId, ServiceInfo};

const SECRET: &str = "webhook-secret";

fn context() -> Context {
    Context::new(
        ChatId::new(42),
        Arc::new(ServiceInfo::new("github", "https://courier.example.com")),
        Arc::new(InMemoryCacheStore::new()),
    )
}

fn formatter() -> PushFormatter {
    PushFormatter::new(Arc::new(HtmlRichText), Arc::new(CompareLinker))
}

fn headers(event_type: &str) -> HashMap<String, String> {
    let mut headers = HashMap::new();
    headers.insert(EVENT_TYPE_HEADER.to_string(), event_type.to_string());
    headers
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

// ============================================================================
// Dispatch
// ============================================================================

#[tokio::test]
async fn test_push_is_rendered_and_delivered() {
    let outbound = Arc::new(InMemoryOutbound::new());
    let processor = WebhookProcessor::new(formatter(), outbound.clone());
    let ctx = context();

    let outcome = processor
        .handle_webhook(&ctx, &headers("push"), &push_body())
        .await
        .unwrap();

    let WebhookOutcome::Delivered { rendered, delivery } = outcome else {
        panic!("expected a delivered push");
    };
    assert_eq!(delivery, Delivery::Posted);
    assert_eq!(rendered.idempotency_key, "commit_deadbeef");

    let messages = outbound.messages(ctx.chat());
    assert_eq!(messages.len(), 1);
    assert!(messages[0].message.html);
    assert_eq!(messages[0].message.text, rendered.text);
    assert_eq!(
        messages[0].message.event_key.as_deref(),
        Some("commit_deadbeef")
    );
}

#[tokio::test]
async fn test_replayed_push_edits_existing_message() {
    let outbound = Arc::new(InMemoryOutbound::new());
    let processor = WebhookProcessor::new(formatter(), outbound.clone());
    let ctx = context();

    let mut redelivery = headers("push");
    redelivery.insert(
        DELIVERY_ID_HEADER.to_string(),
        "72d3162e-cc78-11e3-81ab-4c9367dc0958".to_string(),
    );

    let first = processor
        .handle_webhook(&ctx, &redelivery, &push_body())
        .await
        .unwrap();
    let second = processor
        .handle_webhook(&ctx, &redelivery, &push_body())
        .await
        .unwrap();

    let WebhookOutcome::Delivered { rendered, .. } = first;
    assert!(!rendered.replay);
    match second {
        WebhookOutcome::Delivered { rendered, delivery } => {
            assert!(rendered.replay);
            assert_eq!(delivery, Delivery::Edited);
        }
    }
    assert_eq!(outbound.messages(ctx.chat()).len(), 1);
}

#[tokio::test]
async fn test_ping_is_an_unsupported_event_type() {
    let outbound = Arc::new(InMemoryOutbound::new());
    let processor = WebhookProcessor::new(formatter(), outbound.clone());

    let error = processor
        .handle_webhook(&context(), &headers("ping"), b"{\"zen\": \"Keep it simple.\"}")
        .await
        .unwrap_err();

    match error {
        WebhookError::UnsupportedEventType { event_type } => assert_eq!(event_type, "ping"),
        other => panic!("unexpected error: {:?}", other),
    }
    assert!(outbound.is_empty());
}

#[tokio::test]
async fn test_other_event_types_are_unsupported() {
    let processor = WebhookProcessor::new(formatter(), Arc::new(InMemoryOutbound::new()));

    let error = processor
        .handle_webhook(&context(), &headers("issues"), b"{}")
        .await
        .unwrap_err();

    match error {
        WebhookError::UnsupportedEventType { event_type } => assert_eq!(event_type, "issues"),
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_missing_event_type_header_is_an_empty_event_type() {
    let outbound = Arc::new(InMemoryOutbound::new());
    let processor = WebhookProcessor::new(formatter(), outbound.clone());

    let error = processor
        .handle_webhook(&context(), &HashMap::new(), &push_body())
        .await
        .unwrap_err();

    match error {
        WebhookError::UnsupportedEventType { event_type } => assert_eq!(event_type, ""),
        other => panic!("unexpected error: {:?}", other),
    }
    assert!(outbound.is_empty());
}

#[tokio::test]
async fn test_format_errors_are_not_delivered() {
    let outbound = Arc::new(InMemoryOutbound::new());
    let processor = WebhookProcessor::new(formatter(), outbound.clone());

    let body = serde_json::to_vec(&serde_json::json!({
        "ref": "refs/heads/main",
        "before": "0000000000aaaa",
        "after": "1111111111bbbb",
        "commits": []
    }))
    .unwrap();
    let result = processor.handle_webhook(&context(), &headers("push"), &body).await;

    assert!(matches!(
        result,
        Err(WebhookError::Push(PushFormatError::EmptyCommits))
    ));
    assert!(outbound.is_empty());
}

#[tokio::test]
async fn test_delivery_failure_propagates_as_transient() {
    let mut outbound = MockOutbound::new();
    outbound.expect_send().times(1).returning(|_, _| {
        Err(OutboundError::Transport {
            message: "connection refused".to_string(),
        })
    });
    let processor = WebhookProcessor::new(formatter(), Arc::new(outbound));

    let error = processor
        .handle_webhook(&context(), &headers("push"), &push_body())
        .await
        .unwrap_err();

    assert!(matches!(error, WebhookError::Delivery(_)));
    assert!(error.is_transient());
}

// ============================================================================
// Signatures
// ============================================================================

#[tokio::test]
async fn test_valid_signature_is_accepted() {
    let validator = HmacSignatureValidator::new(SECRET);
    let body = push_body();
    let mut request_headers = headers("push");
    request_headers.insert(SIGNATURE_HEADER.to_string(), validator.sign(&body).unwrap());

    let processor = WebhookProcessor::new(formatter(), Arc::new(InMemoryOutbound::new()))
        .with_signature_validator(Arc::new(validator));

    assert!(processor
        .handle_webhook(&context(), &request_headers, &body)
        .await
        .is_ok());
}

#[tokio::test]
async fn test_unsigned_request_is_rejected_when_secret_configured() {
    let outbound = Arc::new(InMemoryOutbound::new());
    let processor = WebhookProcessor::new(formatter(), outbound.clone())
        .with_signature_validator(Arc::new(HmacSignatureValidator::new(SECRET)));

    let result = processor
        .handle_webhook(&context(), &headers("push"), &push_body())
        .await;

    assert!(matches!(
        result,
        Err(WebhookError::InvalidSignature(SignatureError::Missing))
    ));
    assert!(outbound.is_empty());
}
