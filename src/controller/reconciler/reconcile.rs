//! # Reconcile
//!
//! Entry point the kind controllers call for every managed object.

use super::managed::{ManagedReconciler, ReconcileOutcome};
use super::status::{persist_changes, KubeStatusWriter};
use super::types::{KindContext, ReconcilerError};
use crate::crd::{Condition, ManagedResource};
use crate::error::ProviderError;
use crate::observability::metrics;
use crate::translator;
use kube::api::DynamicObject;
use kube_runtime::controller::Action;
use kube::runtime::events::{Event, EventType};
use kube::{Resource, ResourceExt};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn, Instrument};

/// Reconcile one managed object of the context's kind
///
/// Successful passes requeue after the poll interval so external drift is
/// picked up even when the object itself does not change.
pub async fn reconcile(
    obj: Arc<DynamicObject>,
    ctx: Arc<KindContext>,
) -> Result<Action, ReconcilerError> {
    let kind = ctx.kind.kind().to_string();
    let name = obj.name_any();
    let span = tracing::info_span!(
        "controller.reconcile",
        resource.kind = %kind,
        resource.name = %name,
        resource.version = obj.metadata.resource_version.as_deref().unwrap_or("unknown"),
    );

    async move {
        ctx.reconciler.rate_limiter.acquire().await;
        metrics::increment_reconciliations(&kind);
        let start = Instant::now();

        let result = reconcile_object(&obj, &ctx).await;
        metrics::observe_reconciliation_duration(&kind, start.elapsed().as_secs_f64());

        match result {
            Ok(outcome) => {
                debug!(outcome = outcome.as_str(), "Reconcile finished");
                if outcome.is_terminal() {
                    ctx.reconciler.forget_backoff(&ctx.backoff_key(&name));
                    Ok(Action::await_change())
                } else {
                    ctx.reconciler.reset_backoff(&ctx.backoff_key(&name));
                    Ok(Action::requeue(ctx.reconciler.config.poll_interval()))
                }
            }
            Err(e) => {
                publish_warning(&obj, &ctx, &e).await;
                Err(ReconcilerError::from(e))
            }
        }
    }
    .instrument(span)
    .await
}

async fn reconcile_object(
    obj: &DynamicObject,
    ctx: &KindContext,
) -> Result<ReconcileOutcome, ProviderError> {
    let ar = ctx.kind.api_resource();
    let mut mr = translator::from_dynamic(obj, ar)?;
    let writer = KubeStatusWriter::new(
        ctx.reconciler.client.clone(),
        ar,
        obj.metadata.namespace.as_deref(),
    );

    let handle = match ctx.reconciler.connector.connect(&mr).await {
        Ok(handle) => handle,
        Err(e) => {
            report_connect_failure(&writer, &mut mr, &e).await;
            return Err(e);
        }
    };

    let adapter = ctx.reconciler.adapters.adapter_for(handle.client, ar);
    let outcome = ManagedReconciler::new(adapter.as_ref(), &writer)
        .reconcile(&mut mr)
        .await?;

    if outcome != ReconcileOutcome::Observed {
        info!(outcome = outcome.as_str(), external_id = %mr.external_id(), "Reconciled managed resource");
    }
    Ok(outcome)
}

async fn report_connect_failure(
    writer: &KubeStatusWriter,
    mr: &mut ManagedResource,
    error: &ProviderError,
) {
    let mut persisted = mr.clone();
    mr.set_condition(Condition::reconcile_error(error.to_string()));
    if let Err(e) = persist_changes(writer, mr, &mut persisted).await {
        debug!(error = %e, "Could not record connect failure");
    }
}

async fn publish_warning(obj: &DynamicObject, ctx: &KindContext, error: &ProviderError) {
    let reference = obj.object_ref(ctx.kind.api_resource());
    let event = Event {
        type_: EventType::Warning,
        reason: error.reason().to_string(),
        note: Some(error.to_string()),
        action: "Reconcile".to_string(),
        secondary: None,
    };
    if let Err(e) = ctx.reconciler.recorder.publish(&event, &reference).await {
        warn!(error = %e, "Failed to publish warning event");
    }
}
