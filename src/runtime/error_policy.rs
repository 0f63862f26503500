//! # Error Policy
//!
//! Requeue policy for failed reconciles.

use crate::controller::reconciler::{KindContext, ReconcilerError};
use crate::observability;
use kube::api::DynamicObject;
use kube_runtime::controller::Action;
use kube::ResourceExt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

/// Handle reconciliation errors with Fibonacci backoff
///
/// Backoff state is tracked per resource so one failing object does not slow
/// down the others.
pub fn handle_reconciliation_error(
    obj: Arc<DynamicObject>,
    error: &ReconcilerError,
    ctx: Arc<KindContext>,
) -> Action {
    let kind = ctx.kind.kind();
    let name = obj.name_any();

    let error_span = tracing::span!(
        tracing::Level::ERROR,
        "controller.reconciliation_error",
        resource.kind = kind,
        resource.name = name.as_str(),
        error = %error
    );
    let _error_guard = error_span.enter();

    error!("Reconciliation error for {}/{}: {}", kind, name, error);
    observability::metrics::increment_reconciliation_errors(kind, error.reason());

    let config = &ctx.reconciler.config;
    let (backoff_seconds, error_count) = ctx
        .reconciler
        .backoff_states
        .record_error(&ctx.backoff_key(&name), config)
        .unwrap_or_else(|| {
            warn!("Failed to lock backoff_states, using maximum backoff");
            (config.backoff_max_secs, 0)
        });

    let delay = Duration::from_secs(backoff_seconds);
    let next_trigger_time = chrono::Duration::from_std(delay)
        .ok()
        .and_then(|d| chrono::Utc::now().checked_add_signed(d))
        .map_or_else(|| "unknown".to_string(), |t| t.to_rfc3339());
    info!(
        "Retrying with Fibonacci backoff: {}s (error count: {}, next attempt {})",
        backoff_seconds, error_count, next_trigger_time
    );

    Action::requeue(delay)
}
