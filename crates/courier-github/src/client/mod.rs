//! GitHub API client for account-scoped operations.
//!
//! Only the calls needed to learn who a linked account is are implemented:
//! `GET /user` with the account's OAuth token.

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use reqwest::header::HeaderMap;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use crate::error::ApiError;

/// Configuration for GitHub API client behavior.
///
/// # Examples
///
/// ```
/// use courier_github::client::ClientConfig;
/// use std::time::Duration;
///
/// let config = ClientConfig::default()
///     .with_timeout(Duration::from_secs(5))
///     .with_github_api_url("http://localhost:8080");
/// assert_eq!(config.github_api_url, "http://localhost:8080");
/// ```
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// User agent string for API requests (required by GitHub)
    pub user_agent: String,
    /// Request timeout duration
    pub timeout: Duration,
    /// GitHub API base URL
    pub github_api_url: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            user_agent: "commit-courier/0.1.0".to_string(),
            timeout: Duration::from_secs(30),
            github_api_url: "https://api.github.com".to_string(),
        }
    }
}

impl ClientConfig {
    /// Set the user agent string.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Set the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the GitHub API base URL.
    pub fn with_github_api_url(mut self, url: impl Into<String>) -> Self {
        self.github_api_url = url.into();
        self
    }
}

/// OAuth access token for a linked GitHub account.
///
/// The token value never appears in `Debug` output.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Get the raw token for use in an `Authorization` header.
    pub fn secret(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(<REDACTED>)")
    }
}

/// Profile of the authenticated GitHub user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Numeric account id; zero means "unknown"
    #[serde(default)]
    pub id: u64,
    /// Username (handle)
    #[serde(default)]
    pub login: String,
    /// Display name
    #[serde(default)]
    pub name: Option<String>,
    /// Public email address
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub html_url: Option<String>,
}

impl UserProfile {
    /// A profile is usable only when it carries a real account id.
    pub fn is_populated(&self) -> bool {
        self.id > 0
    }
}

/// Operations against the code host on behalf of a linked account.
#[async_trait]
pub trait CodeHostClient: Send + Sync {
    /// Fetch the profile of the account that owns `token`.
    async fn get_authenticated_user(&self, token: &AccessToken) -> Result<UserProfile, ApiError>;
}

/// `reqwest`-backed GitHub REST client.
#[derive(Debug, Clone)]
pub struct GitHubClient {
    http_client: reqwest::Client,
    config: ClientConfig,
}

impl GitHubClient {
    /// Create a client with the given configuration.
    pub fn new(config: ClientConfig) -> Result<Self, ApiError> {
        let http_client = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            http_client,
            config,
        })
    }

    /// Get the client configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn endpoint(&self, path: &str) -> Result<url::Url, ApiError> {
        let base = self.config.github_api_url.trim_end_matches('/');
        url::Url::parse(&format!("{}/{}", base, path.trim_start_matches('/'))).map_err(|e| {
            ApiError::InvalidUrl {
                message: format!("{}: {}", self.config.github_api_url, e),
            }
        })
    }
}

#[async_trait]
impl CodeHostClient for GitHubClient {
    async fn get_authenticated_user(&self, token: &AccessToken) -> Result<UserProfile, ApiError> {
        let url = self.endpoint("user")?;

        let response = self
            .http_client
            .get(url)
            .header("Authorization", format!("Bearer {}", token.secret()))
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", "2022-11-28")
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ApiError::Timeout
                } else {
                    ApiError::HttpClientError(e)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let reset_at = rate_limit_reset(response.headers());
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error body".to_string());
            return Err(map_status(status, reset_at, message));
        }

        let body = response.bytes().await?;
        let profile: UserProfile = serde_json::from_slice(&body)?;

        tracing::debug!(login = %profile.login, id = profile.id, "Fetched GitHub user profile");
        Ok(profile)
    }
}

// ============================================================================
// Response classification
// ============================================================================

/// Read the `X-RateLimit-Reset` header when the remaining quota is exhausted.
fn rate_limit_reset(headers: &HeaderMap) -> Option<DateTime<Utc>> {
    let remaining = headers
        .get("x-ratelimit-remaining")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok());

    if remaining != Some(0) {
        return None;
    }

    headers
        .get("x-ratelimit-reset")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<i64>().ok())
        .and_then(|secs| Utc.timestamp_opt(secs, 0).single())
}

fn map_status(status: StatusCode, reset_at: Option<DateTime<Utc>>, message: String) -> ApiError {
    match (status, reset_at) {
        (StatusCode::FORBIDDEN | StatusCode::TOO_MANY_REQUESTS, Some(reset_at)) => {
            ApiError::RateLimitExceeded { reset_at }
        }
        (StatusCode::UNAUTHORIZED, _) => ApiError::AuthenticationFailed,
        (StatusCode::FORBIDDEN, None) => ApiError::AuthorizationFailed,
        (StatusCode::NOT_FOUND, _) => ApiError::NotFound,
        _ => ApiError::HttpError {
            status: status.as_u16(),
            message,
        },
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
