use super::*;
use std::path::PathBuf;

fn write_config(contents: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("courier-{}.yaml", uuid::Uuid::new_v4()));
    std::fs::write(&path, contents).unwrap();
    path
}

#[test]
fn test_explicit_file_overrides_defaults() {
    let path = write_config(
        "server:\n  port: 9191\nwebhooks:\n  public_url: https://courier.example.com\n  secret: hush\nidentity:\n  max_retries: 3\n",
    );

    let config = load(path.to_str()).unwrap();
    std::fs::remove_file(&path).unwrap();

    assert_eq!(config.server.port, 9191);
    assert_eq!(config.server.host, "0.0.0.0");
    assert_eq!(config.webhooks.public_url, "https://courier.example.com");
    assert_eq!(config.webhooks.secret.as_deref(), Some("hush"));
    assert_eq!(config.identity.max_retries, 3);
    assert_eq!(config.identity.population_delay_seconds, 5);
}

#[test]
fn test_missing_explicit_file_is_an_error() {
    let path = std::env::temp_dir().join(format!("courier-missing-{}.yaml", uuid::Uuid::new_v4()));

    assert!(load(path.to_str()).is_err());
}

#[test]
fn test_malformed_value_is_an_error() {
    let path = write_config("server:\n  port: not-a-port\n");

    let result = load(path.to_str());
    std::fs::remove_file(&path).unwrap();

    assert!(result.is_err());
}
