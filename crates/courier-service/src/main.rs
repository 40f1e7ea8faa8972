//! # Commit Courier Service
//!
//! Binary entry point for the Commit Courier HTTP service.
//!
//! This executable:
//! - Loads and validates configuration
//! - Initializes logging
//! - Wires the cache, GitHub client, job scheduler and chat transport
//! - Starts the HTTP server from courier-api

mod settings;

use anyhow::Context as _;
use courier_api::{
    config::LoggingConfig, start_server, AppState, ServiceConfig, ServiceError, ServiceMetrics,
};
use courier_core::{
    adapters::{InMemoryCacheStore, InMemoryTokenSource, TracingOutbound},
    jobs::{IdentityCacheJobRunner, TokioJobScheduler},
};
use courier_github::GitHubClient;
use std::{sync::Arc, time::Duration};
use tracing::{debug, error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// How often expired cache entries are swept.
const CACHE_CLEANUP_INTERVAL: Duration = Duration::from_secs(600);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let explicit_path = std::env::var(settings::CONFIG_FILE_ENV).ok();

    let service_config = match settings::load(explicit_path.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            // Logging is configured from this file, so report directly.
            eprintln!("Could not load service configuration; aborting: {}", e);
            std::process::exit(3);
        }
    };

    init_logging(&service_config.logging);
    info!("Starting Commit Courier Service");
    if let Some(path) = explicit_path.as_deref().filter(|p| !p.is_empty()) {
        info!(path = %path, "Loaded configuration from explicit path");
    }

    if let Err(e) = service_config.validate() {
        error!(error = %e, "Service configuration is invalid; aborting");
        std::process::exit(3);
    }

    let (state, scheduler) = match build_state(service_config) {
        Ok(parts) => parts,
        Err(e) => {
            error!(error = %e, "Could not initialize service; aborting");
            std::process::exit(3);
        }
    };

    info!(
        host = %state.config.server.host,
        port = state.config.server.port,
        public_url = %state.service.public_url,
        signatures = state.config.webhooks.secret.is_some(),
        "Starting HTTP server"
    );

    let result = start_server(state).await;
    scheduler.shutdown();

    if let Err(e) = result {
        error!("Failed to start server: {}", e);

        let exit_code = match e {
            ServiceError::BindFailed { .. } => 1,
            ServiceError::ServerFailed { .. } => 2,
            ServiceError::Configuration(_) => 3,
        };

        std::process::exit(exit_code);
    }

    Ok(())
}

// ============================================================================
// Private helpers
// ============================================================================

fn init_logging(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&logging.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let (json, plain) = if logging.json_format {
        (Some(tracing_subscriber::fmt::layer().json()), None)
    } else {
        (None, Some(tracing_subscriber::fmt::layer()))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(json)
        .with(plain)
        .init();
}

/// Build application state and the scheduler that must be shut down with it.
fn build_state(config: ServiceConfig) -> anyhow::Result<(AppState, Arc<TokioJobScheduler>)> {
    let cache = Arc::new(InMemoryCacheStore::new());
    spawn_cache_cleanup(cache.clone());

    let github = GitHubClient::new(config.github.client_config())
        .context("could not create GitHub client")?;
    let tokens = Arc::new(InMemoryTokenSource::new());

    let runner = IdentityCacheJobRunner::new(
        Arc::new(config.webhooks.service_info()),
        cache.clone(),
        tokens.clone(),
        Arc::new(github),
    );
    let scheduler = Arc::new(TokioJobScheduler::new(Arc::new(runner)));

    let metrics = ServiceMetrics::new().context("could not register metrics")?;

    // No chat transport is bundled; messages go to the log.
    let outbound = Arc::new(TracingOutbound);

    let state = AppState::new(
        config,
        cache,
        outbound,
        scheduler.clone(),
        tokens,
        metrics,
    );
    Ok((state, scheduler))
}

fn spawn_cache_cleanup(cache: Arc<InMemoryCacheStore>) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(CACHE_CLEANUP_INTERVAL);
        loop {
            interval.tick().await;
            match cache.cleanup_expired() {
                Ok(0) => {}
                Ok(removed) => debug!(removed = removed, "Removed expired cache entries"),
                Err(e) => warn!(error = %e, "Cache cleanup failed"),
            }
        }
    });
}
