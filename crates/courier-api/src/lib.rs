//! # Commit Courier HTTP Service
//!
//! HTTP surface for Commit Courier:
//! - per-chat GitHub webhook endpoint
//! - chat command endpoint
//! - account-link completion endpoint
//! - health and metrics endpoints

pub mod config;
pub mod errors;
pub mod metrics;
pub mod responses;

pub use config::ServiceConfig;
pub use errors::{ApiHandlerError, ConfigError, ServiceError};
pub use metrics::ServiceMetrics;

use axum::{
    extract::{DefaultBodyLimit, Path, State},
    http::{HeaderMap, StatusCode},
    response::Json,
    routing::{get, post},
    Router,
};
use bytes::Bytes;
use courier_core::{
    account_link::AccountLinkHook,
    adapters::InMemoryTokenSource,
    cache::CacheStore,
    commands::{ChatUpdate, CommandProcessor},
    jobs::JobScheduler,
    outbound::Outbound,
    push::{CompareLinker, PushFormatter},
    rich_text::HtmlRichText,
    signature::HmacSignatureValidator,
    webhook::{WebhookOutcome, WebhookProcessor},
    ChatId, ChatUser, Context, ServiceInfo, UserId,
};
use courier_github::AccessToken;
use metrics::outcome;
use responses::{
    delivery_label, AccountLinkRequest, AccountLinkResponse, CommandResponse, HealthResponse,
    WebhookResponse,
};
use std::{collections::HashMap, sync::Arc, time::Instant};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info, instrument};

// ============================================================================
// Application State
// ============================================================================

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Configuration for the service
    pub config: Arc<ServiceConfig>,

    pub service: Arc<ServiceInfo>,

    /// Cache shared by every chat, account and the service scope
    pub cache: Arc<dyn CacheStore>,

    pub webhook_processor: Arc<WebhookProcessor>,

    pub command_processor: Arc<CommandProcessor>,

    pub account_link: Arc<AccountLinkHook>,

    /// Tokens stored by the account-link endpoint
    pub tokens: Arc<InMemoryTokenSource>,

    /// Metrics collector for observability
    pub metrics: Arc<ServiceMetrics>,
}

impl AppState {
    /// Wire the processors from configuration and collaborators.
    pub fn new(
        config: ServiceConfig,
        cache: Arc<dyn CacheStore>,
        outbound: Arc<dyn Outbound>,
        scheduler: Arc<dyn JobScheduler>,
        tokens: Arc<InMemoryTokenSource>,
        metrics: Arc<ServiceMetrics>,
    ) -> Self {
        let service = Arc::new(config.webhooks.service_info());
        let rich = Arc::new(HtmlRichText);

        let formatter = PushFormatter::new(rich.clone(), Arc::new(CompareLinker));
        let mut webhook_processor = WebhookProcessor::new(formatter, outbound.clone());
        if let Some(secret) = &config.webhooks.secret {
            webhook_processor = webhook_processor
                .with_signature_validator(Arc::new(HmacSignatureValidator::new(secret.clone())));
        }

        let account_link = AccountLinkHook::new(scheduler, outbound.clone())
            .with_population_delay(config.identity.population_delay())
            .with_retry_policy(config.identity.retry_policy());

        Self {
            service,
            cache,
            webhook_processor: Arc::new(webhook_processor),
            command_processor: Arc::new(CommandProcessor::new(rich, outbound)),
            account_link: Arc::new(account_link),
            tokens,
            metrics,
            config: Arc::new(config),
        }
    }

    /// Operation context for `chat`.
    pub fn context(&self, chat: ChatId) -> Context {
        Context::new(chat, self.service.clone(), self.cache.clone())
    }
}

// ============================================================================
// HTTP Server
// ============================================================================

/// Create HTTP router with all endpoints
pub fn create_router(state: AppState) -> Router {
    let mut router = Router::new()
        .route("/webhook/{chat_id}", post(handle_webhook))
        .route("/chats/{chat_id}/commands", post(handle_chat_update))
        .route("/chats/{chat_id}/account-link", post(handle_account_link))
        .route("/health", get(handle_health_check))
        .route("/metrics", get(metrics_endpoint))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(DefaultBodyLimit::max(state.config.server.max_body_size))
                .into_inner(),
        );

    if state.config.server.enable_cors {
        router = router.layer(CorsLayer::permissive());
    }

    router.with_state(state)
}

/// Start HTTP server and run until SIGINT or SIGTERM.
pub async fn start_server(state: AppState) -> Result<(), ServiceError> {
    let address = state.config.server.bind_address();
    let shutdown_timeout = state.config.server.shutdown_timeout_seconds;
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .map_err(|e| ServiceError::BindFailed {
            address: address.clone(),
            message: e.to_string(),
        })?;

    info!("Starting HTTP server on {}", address);

    let shutdown_signal = async move {
        let ctrl_c = async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!(error = %e, "Failed to install Ctrl+C signal handler");
                std::future::pending::<()>().await;
            }
        };

        #[cfg(unix)]
        let terminate = async {
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(mut signal) => {
                    signal.recv().await;
                }
                Err(e) => {
                    error!(error = %e, "Failed to install SIGTERM signal handler");
                    std::future::pending::<()>().await;
                }
            }
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => {
                info!("Received SIGINT (Ctrl+C), initiating graceful shutdown with {}s timeout", shutdown_timeout);
            },
            _ = terminate => {
                info!("Received SIGTERM, initiating graceful shutdown with {}s timeout", shutdown_timeout);
            },
        }
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await
        .map_err(|e| ServiceError::ServerFailed {
            message: e.to_string(),
        })?;

    info!("HTTP server shutdown complete");
    Ok(())
}

// ============================================================================
// Handlers
// ============================================================================

/// Handle a GitHub webhook addressed to one chat.
#[instrument(skip(state, headers, body), fields(body_len = body.len()))]
pub async fn handle_webhook(
    State(state): State<AppState>,
    Path(chat_id): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookResponse>, ApiHandlerError> {
    let started = Instant::now();
    let result = process_webhook(&state, &chat_id, &headers, &body).await;

    let label = match &result {
        Ok(WebhookOutcome::Delivered { .. }) => {
            state
                .metrics
                .push_render_duration_seconds
                .observe(started.elapsed().as_secs_f64());
            outcome::DELIVERED
        }
        Err(e) if e.status().0 != StatusCode::NOT_IMPLEMENTED && e.status().0.is_server_error() => {
            outcome::FAILED
        }
        Err(_) => outcome::REJECTED,
    };
    state.metrics.record_webhook(label);

    let WebhookOutcome::Delivered { rendered, delivery } = result?;
    Ok(Json(WebhookResponse {
        status: "delivered".to_string(),
        idempotency_key: Some(rendered.idempotency_key),
        text: Some(rendered.text),
        delivery: Some(delivery_label(delivery).to_string()),
    }))
}

async fn process_webhook(
    state: &AppState,
    chat_id: &str,
    headers: &HeaderMap,
    body: &[u8],
) -> Result<WebhookOutcome, ApiHandlerError> {
    let chat: ChatId = chat_id.parse()?;

    let header_map: HashMap<String, String> = headers
        .iter()
        .map(|(k, v)| {
            (
                k.as_str().to_lowercase(),
                v.to_str().unwrap_or("").to_string(),
            )
        })
        .collect();

    let ctx = state.context(chat);
    Ok(state
        .webhook_processor
        .handle_webhook(&ctx, &header_map, body)
        .await?)
}

/// Handle a chat update that may carry a bot command.
#[instrument(skip(state, update))]
pub async fn handle_chat_update(
    State(state): State<AppState>,
    Path(chat_id): Path<String>,
    Json(update): Json<ChatUpdate>,
) -> Result<Json<CommandResponse>, ApiHandlerError> {
    let chat: ChatId = chat_id.parse()?;
    let ctx = state.context(chat);
    let command = update.command().map(|c| c.command);

    let delivery = state.command_processor.handle_update(&ctx, &update).await?;
    let handled = delivery.is_some();
    if let (true, Some(command)) = (handled, command.as_deref()) {
        state.metrics.record_command(command);
    }

    Ok(Json(CommandResponse { handled, command }))
}

/// Complete an account link: store the token and run the link hook.
#[instrument(skip(state, request), fields(user = request.user_id))]
pub async fn handle_account_link(
    State(state): State<AppState>,
    Path(chat_id): Path<String>,
    Json(request): Json<AccountLinkRequest>,
) -> Result<Json<AccountLinkResponse>, ApiHandlerError> {
    let chat: ChatId = chat_id.parse()?;
    let user = ChatUser::new(UserId::new(request.user_id), request.username);

    state
        .tokens
        .insert(user.id, AccessToken::new(request.access_token))
        .map_err(|e| ApiHandlerError::InternalError {
            message: e.to_string(),
        })?;

    let ctx = state.context(chat).with_user(user);
    let outcome = state.account_link.on_account_linked(&ctx).await?;

    Ok(Json(AccountLinkResponse {
        state: outcome.state,
        job_id: outcome.job.map(|handle| handle.id.to_string()),
    }))
}

async fn handle_health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

async fn metrics_endpoint(State(state): State<AppState>) -> Result<String, StatusCode> {
    state.metrics.encode().map_err(|e| {
        error!(error = %e, "Failed to encode metrics");
        StatusCode::INTERNAL_SERVER_ERROR
    })
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
