//! Configuration types for the HTTP service

use crate::errors::ConfigError;
use courier_core::{jobs::RetryPolicy, ServiceInfo};
use courier_github::ClientConfig;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Service configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ServiceConfig {
    /// HTTP server settings
    pub server: ServerConfig,

    /// Webhook endpoint settings
    pub webhooks: WebhookConfig,

    /// GitHub API settings
    pub github: GitHubConfig,

    /// Identity cache population settings
    pub identity: IdentityConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl ServiceConfig {
    /// Reject values the service cannot start with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server.validate()?;
        self.webhooks.validate()?;
        self.github.validate()?;
        self.identity.validate()?;
        self.logging.validate()
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,

    /// Graceful shutdown timeout in seconds
    pub shutdown_timeout_seconds: u64,

    /// Maximum request size in bytes
    pub max_body_size: usize,

    /// Enable CORS
    pub enable_cors: bool,
}

impl ServerConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.host.trim().is_empty() {
            return Err(ConfigError::Missing {
                key: "server.host".to_string(),
            });
        }
        if self.max_body_size == 0 {
            return Err(ConfigError::Invalid {
                message: "server.max_body_size must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            shutdown_timeout_seconds: 30,
            max_body_size: 5 * 1024 * 1024, // 5MB
            enable_cors: false,
        }
    }
}

/// Webhook endpoint configuration
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WebhookConfig {
    /// Externally reachable base URL, used to build per-chat webhook URLs
    pub public_url: String,

    /// Service name shown to chat users
    pub service_name: String,

    /// HMAC secret for `X-Hub-Signature-256`; signatures are not checked
    /// when unset
    pub secret: Option<String>,
}

impl WebhookConfig {
    pub fn service_info(&self) -> ServiceInfo {
        ServiceInfo::new(self.service_name.clone(), self.public_url.clone())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        validate_http_url("webhooks.public_url", &self.public_url)?;
        if matches!(&self.secret, Some(secret) if secret.is_empty()) {
            return Err(ConfigError::Invalid {
                message: "webhooks.secret must not be empty when set".to_string(),
            });
        }
        Ok(())
    }
}

impl fmt::Debug for WebhookConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebhookConfig")
            .field("public_url", &self.public_url)
            .field("service_name", &self.service_name)
            .field("secret", &self.secret.as_ref().map(|_| "<REDACTED>"))
            .finish()
    }
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            public_url: "http://localhost:8080".to_string(),
            service_name: "github".to_string(),
            secret: None,
        }
    }
}

/// GitHub API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GitHubConfig {
    /// API base URL; change for GitHub Enterprise
    pub api_url: String,

    pub user_agent: String,

    /// Request timeout in seconds
    pub timeout_seconds: u64,
}

impl GitHubConfig {
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig::default()
            .with_github_api_url(self.api_url.clone())
            .with_user_agent(self.user_agent.clone())
            .with_timeout(Duration::from_secs(self.timeout_seconds))
    }

    fn validate(&self) -> Result<(), ConfigError> {
        validate_http_url("github.api_url", &self.api_url)?;
        if self.timeout_seconds == 0 {
            return Err(ConfigError::Invalid {
                message: "github.timeout_seconds must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}

impl Default for GitHubConfig {
    fn default() -> Self {
        let client = ClientConfig::default();
        Self {
            api_url: client.github_api_url,
            user_agent: client.user_agent,
            timeout_seconds: client.timeout.as_secs(),
        }
    }
}

/// Identity cache population configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentityConfig {
    /// Delay between account link and the first population attempt
    pub population_delay_seconds: u64,

    /// Retries after a failed population attempt
    pub max_retries: u32,

    /// Backoff unit in seconds
    pub retry_unit_seconds: u64,

    /// Upper bound on a single backoff in seconds
    pub max_retry_delay_seconds: u64,
}

impl IdentityConfig {
    pub fn population_delay(&self) -> Duration {
        Duration::from_secs(self.population_delay_seconds)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        if self.max_retries == 0 {
            return RetryPolicy::none();
        }
        RetryPolicy::fibonacci(self.max_retries, Duration::from_secs(self.retry_unit_seconds))
            .with_max_delay(Duration::from_secs(self.max_retry_delay_seconds))
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_retries > 0 && self.retry_unit_seconds == 0 {
            return Err(ConfigError::Invalid {
                message: "identity.retry_unit_seconds must be greater than zero when retrying"
                    .to_string(),
            });
        }
        if self.max_retries > 0 && self.max_retry_delay_seconds < self.retry_unit_seconds {
            return Err(ConfigError::Invalid {
                message: "identity.max_retry_delay_seconds must not be below retry_unit_seconds"
                    .to_string(),
            });
        }
        Ok(())
    }
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            population_delay_seconds: 5,
            max_retries: 10,
            retry_unit_seconds: 1,
            max_retry_delay_seconds: 60 * 60,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Logging level or `EnvFilter` directive
    pub level: String,

    /// Enable JSON structured logging
    pub json_format: bool,
}

impl LoggingConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.level.trim().is_empty() {
            return Err(ConfigError::Missing {
                key: "logging.level".to_string(),
            });
        }
        Ok(())
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
        }
    }
}

fn validate_http_url(key: &str, value: &str) -> Result<(), ConfigError> {
    let parsed = url::Url::parse(value).map_err(|e| ConfigError::Invalid {
        message: format!("{} is not a valid URL: {}", key, e),
    })?;

    match parsed.scheme() {
        "http" | "https" => Ok(()),
        scheme => Err(ConfigError::Invalid {
            message: format!("{} must use http or https, got '{}'", key, scheme),
        }),
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
