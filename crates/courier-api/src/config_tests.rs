use super::*;

#[test]
fn test_default_config_is_valid() {
    let config = ServiceConfig::default();

    assert!(config.validate().is_ok());
    assert_eq!(config.server.bind_address(), "0.0.0.0:8080");
    assert_eq!(config.identity.population_delay(), Duration::from_secs(5));
    assert_eq!(config.identity.retry_policy().max_retries, 10);
}

#[test]
fn test_partial_document_uses_defaults() {
    let config: ServiceConfig = serde_json::from_value(serde_json::json!({
        "server": { "port": 9000 },
        "webhooks": { "public_url": "https://courier.example.com", "secret": "s3cret" }
    }))
    .unwrap();

    assert_eq!(config.server.port, 9000);
    assert_eq!(config.server.host, "0.0.0.0");
    assert_eq!(config.webhooks.secret.as_deref(), Some("s3cret"));
    assert_eq!(config.github.api_url, "https://api.github.com");
    assert!(config.validate().is_ok());
}

#[test]
fn test_invalid_public_url_is_rejected() {
    let mut config = ServiceConfig::default();
    config.webhooks.public_url = "not a url".to_string();

    let error = config.validate().unwrap_err();

    assert!(error.to_string().contains("webhooks.public_url"));
}

#[test]
fn test_non_http_scheme_is_rejected() {
    let mut config = ServiceConfig::default();
    config.github.api_url = "ftp://github.example.com".to_string();

    assert!(matches!(config.validate(), Err(ConfigError::Invalid { .. })));
}

#[test]
fn test_empty_secret_is_rejected() {
    let mut config = ServiceConfig::default();
    config.webhooks.secret = Some(String::new());

    assert!(config.validate().is_err());
}

#[test]
fn test_zero_limits_are_rejected() {
    let mut config = ServiceConfig::default();
    config.server.max_body_size = 0;
    assert!(config.validate().is_err());

    let mut config = ServiceConfig::default();
    config.github.timeout_seconds = 0;
    assert!(config.validate().is_err());

    let mut config = ServiceConfig::default();
    config.identity.retry_unit_seconds = 0;
    assert!(config.validate().is_err());

    config.identity.max_retries = 0;
    assert!(config.validate().is_ok());

    let mut config = ServiceConfig::default();
    config.identity.max_retry_delay_seconds = 0;
    assert!(config.validate().is_err());
}

#[test]
fn test_identity_retry_policy_follows_section() {
    let identity = IdentityConfig {
        population_delay_seconds: 5,
        max_retries: 20,
        retry_unit_seconds: 2,
        max_retry_delay_seconds: 30,
    };

    let policy = identity.retry_policy().without_jitter();

    assert_eq!(policy.max_retries, 20);
    assert_eq!(policy.calculate_delay(2), Duration::from_secs(4));
    assert_eq!(policy.calculate_delay(15), Duration::from_secs(30));

    let disabled = IdentityConfig {
        max_retries: 0,
        ..identity
    };
    assert_eq!(disabled.retry_policy(), RetryPolicy::none());
    assert!(!disabled.retry_policy().should_retry(0));
}

#[test]
fn test_github_client_config_follows_section() {
    let github = GitHubConfig {
        api_url: "https://ghe.example.com/api/v3".to_string(),
        user_agent: "courier-test".to_string(),
        timeout_seconds: 7,
    };

    let client = github.client_config();

    assert_eq!(client.github_api_url, "https://ghe.example.com/api/v3");
    assert_eq!(client.user_agent, "courier-test");
    assert_eq!(client.timeout, Duration::from_secs(7));
}

#[test]
fn test_debug_redacts_webhook_secret() {
    let webhooks = WebhookConfig {
        secret: Some("top-secret".to_string()),
        ..WebhookConfig::default()
    };

    let debug = format!("{:?}", webhooks);

    assert!(!debug.contains("top-secret"));
    assert!(debug.contains("<REDACTED>"));
}
