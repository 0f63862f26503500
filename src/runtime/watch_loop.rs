//! # Watch Loop
//!
//! Runs one controller per discovered kind. The controllers share the
//! reconciler context and stop together on SIGINT/SIGTERM.
//!
//! Watch events only trigger a reconcile when the desired state changed
//! (`metadata.generation`) or an annotation changed. Status writes made by
//! the reconciler itself are filtered out; periodic re-observation comes
//! from the requeue after each pass.

use crate::controller::discovery::ManagedKind;
use crate::controller::reconciler::{reconcile, KindContext, Reconciler};
use crate::runtime::error_policy::handle_reconciliation_error;
use crate::server::ServerState;
use futures::StreamExt;
use kube::api::{Api, DynamicObject};
use kube::Client;
use kube_runtime::controller::{self, Controller};
use kube_runtime::reflector::store::Writer;
use kube_runtime::{predicates, watcher, Predicate, WatchStreamExt};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::{debug, info, warn, Instrument};

/// Changes that warrant a reconcile: spec (via generation) or annotations
pub(crate) fn desired_state_changed() -> impl Predicate<DynamicObject> {
    predicates::generation.combine(predicates::annotations)
}

/// Run the controllers of every kind until shutdown
pub async fn run_watch_loop(
    client: Client,
    reconciler: Arc<Reconciler>,
    kinds: Vec<ManagedKind>,
    server_state: Arc<ServerState>,
) -> Result<(), anyhow::Error> {
    let shutdown_server_state = server_state.clone();
    tokio::spawn(async move {
        let _ = tokio::signal::ctrl_c().await;
        info!("Received shutdown signal (SIGINT/SIGTERM), initiating graceful shutdown...");
        shutdown_server_state.is_ready.store(false, Ordering::Relaxed);
        info!("Marked server as not ready, waiting for in-flight reconciliations to complete...");
    });

    if kinds.is_empty() {
        warn!("No managed kinds discovered, nothing to reconcile");
        tokio::signal::ctrl_c().await?;
        return Ok(());
    }

    let concurrency = reconciler.config.max_concurrent_reconciliations;
    let controllers = kinds.into_iter().map(|kind| {
        let ar = kind.api_resource().clone();
        let kind_name = ar.kind.clone();
        let api: Api<DynamicObject> = Api::all_with(client.clone(), &ar);
        let ctx = Arc::new(KindContext {
            reconciler: reconciler.clone(),
            kind,
        });
        let span = tracing::info_span!("controller.watch", resource.kind = %kind_name);

        let writer = Writer::new(ar.clone());
        let reader = writer.as_reader();
        let trigger = watcher(api, watcher::Config::default().any_semantic())
            .default_backoff()
            .reflect(writer)
            .applied_objects()
            .predicate_filter(desired_state_changed());

        info!(kind = %kind_name, concurrency, "Starting controller");
        Controller::for_stream_with(trigger, reader, ar)
            .with_config(controller::Config::default().concurrency(concurrency))
            .shutdown_on_signal()
            .run(reconcile, handle_reconciliation_error, ctx)
            .for_each(move |result| {
                match result {
                    Ok((object, action)) => {
                        debug!(object = %object, action = ?action, "watch.event.reconciled");
                    }
                    Err(e) => {
                        warn!(kind = %kind_name, error = %e, "Controller stream error");
                    }
                }
                futures::future::ready(())
            })
            .instrument(span)
    });

    futures::future::join_all(controllers).await;

    info!("Provider stopped gracefully");
    Ok(())
}
