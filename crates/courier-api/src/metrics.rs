//! Metrics collection for the API service.
//!
//! Metrics live in a registry owned by [`ServiceMetrics`] rather than the
//! process-global one, so independent instances never collide.

use prometheus::{
    register_histogram_with_registry, register_int_counter_vec_with_registry, Histogram,
    IntCounterVec, Registry, TextEncoder,
};
use std::sync::Arc;

/// Outcome label values for `webhook_requests_total`.
pub mod outcome {
    pub const DELIVERED: &str = "delivered";
    pub const REJECTED: &str = "rejected";
    pub const FAILED: &str = "failed";
}

/// Service metrics for observability
#[derive(Debug)]
pub struct ServiceMetrics {
    registry: Registry,

    /// Webhooks received, by outcome
    pub webhook_requests_total: IntCounterVec,

    /// Chat commands answered, by command
    pub chat_commands_total: IntCounterVec,

    /// Time to render and send a push message
    pub push_render_duration_seconds: Histogram,
}

impl ServiceMetrics {
    pub fn new() -> Result<Arc<Self>, prometheus::Error> {
        let registry = Registry::new_custom(Some("courier".to_string()), None)?;

        Ok(Arc::new(Self {
            webhook_requests_total: register_int_counter_vec_with_registry!(
                "webhook_requests_total",
                "Webhook requests received by outcome",
                &["outcome"],
                registry
            )?,
            chat_commands_total: register_int_counter_vec_with_registry!(
                "chat_commands_total",
                "Chat commands answered by command",
                &["command"],
                registry
            )?,
            push_render_duration_seconds: register_histogram_with_registry!(
                "push_render_duration_seconds",
                "Push webhook render and delivery time",
                vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0],
                registry
            )?,
            registry,
        }))
    }

    pub fn record_webhook(&self, outcome: &str) {
        self.webhook_requests_total
            .with_label_values(&[outcome])
            .inc();
    }

    pub fn record_command(&self, command: &str) {
        self.chat_commands_total.with_label_values(&[command]).inc();
    }

    /// Text exposition of every metric in this registry.
    pub fn encode(&self) -> Result<String, prometheus::Error> {
        TextEncoder::new().encode_to_string(&self.registry.gather())
    }
}

#[cfg(test)]
#[path = "metrics_tests.rs"]
mod tests;
