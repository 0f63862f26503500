//! # Initialization
//!
//! Provider startup: rustls setup, tracing, metrics, probe server, Kubernetes
//! client, kind discovery and the shared reconciler context.

use crate::config::{ControllerConfig, ServerConfig};
use crate::connector::{Connector, KubeProviderConfigStore, KubeUsageTracker};
use crate::constants::FIELD_MANAGER;
use crate::controller::discovery::{discover_kinds, KindRegistry, ManagedKind};
use crate::controller::reconciler::Reconciler;
use crate::external::AdapterRegistry;
use crate::observability;
use crate::server::{start_server, ServerState};
use anyhow::{Context, Result};
use kube::runtime::events::{Recorder, Reporter};
use kube::Client;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Everything the watch loop needs
pub struct InitializationResult {
    pub client: Client,
    pub reconciler: Arc<Reconciler>,
    /// Kinds that get a reconciliation loop
    pub kinds: Vec<ManagedKind>,
    pub server_state: Arc<ServerState>,
}

impl std::fmt::Debug for InitializationResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InitializationResult")
            .field("kinds", &self.kinds)
            .field("server_ready", &self.server_state.is_ready.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

/// Initialize tracing from the controller configuration
///
/// `RUST_LOG` wins over the configured default filter.
pub fn init_tracing(config: &ControllerConfig) {
    let default_filter = if config.debug {
        "provider_magento=debug"
    } else {
        "provider_magento=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into());
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    let result = if config.json_logs() {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    if let Err(e) = result {
        eprintln!("Tracing subscriber already initialized: {e}");
    }
}

/// Initialize the provider runtime
pub async fn initialize(
    controller_config: ControllerConfig,
    server_config: ServerConfig,
) -> Result<InitializationResult> {
    // Must happen before any TLS connection is made
    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        warn!("rustls crypto provider was already installed");
    }

    init_tracing(&controller_config);

    info!("Starting Magento provider");
    info!(
        "Build info: timestamp={}, datetime={}, git_hash={}",
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_DATETIME"),
        env!("BUILD_GIT_HASH")
    );

    observability::metrics::register_metrics()?;

    let server_state = Arc::new(ServerState::default());
    let server_state_clone = server_state.clone();
    let server_port = server_config.metrics_port;
    let server_handle = tokio::spawn(async move {
        if let Err(e) = start_server(server_port, server_state_clone).await {
            error!("HTTP server error: {}", e);
        }
    });
    wait_for_server_ready(&server_state, &server_handle, &server_config).await?;

    let client = Client::try_default()
        .await
        .context("Failed to create Kubernetes client")?;

    let registry = KindRegistry::from_cluster(&client, &controller_config.api_group)
        .await
        .context("Failed to discover registered kinds")?;
    let outcome = discover_kinds(
        &registry,
        &controller_config.api_group,
        &controller_config.api_version,
    );
    for failure in &outcome.failures {
        warn!(kind = %failure.kind, error = %failure.error, "Kind will not be reconciled");
    }
    observability::metrics::set_managed_kinds(outcome.kinds.len());
    info!(
        "Discovered {} managed kinds in {}/{} ({} failed)",
        outcome.kinds.len(),
        controller_config.api_group,
        controller_config.api_version,
        outcome.failures.len()
    );

    let connector = Connector::new(
        Arc::new(KubeProviderConfigStore::new(client.clone())),
        Arc::new(KubeUsageTracker::new(client.clone())),
    );
    let reporter = Reporter {
        controller: FIELD_MANAGER.to_string(),
        instance: std::env::var("POD_NAME").ok(),
    };
    let recorder = Recorder::new(client.clone(), reporter);
    let reconciler = Arc::new(Reconciler::new(
        client.clone(),
        connector,
        AdapterRegistry::with_builtin(),
        controller_config,
        recorder,
    ));

    info!("Provider initialized, starting watch loop...");

    Ok(InitializationResult {
        client,
        reconciler,
        kinds: outcome.kinds,
        server_state,
    })
}

/// Wait for the HTTP server to become ready
async fn wait_for_server_ready(
    server_state: &Arc<ServerState>,
    server_handle: &tokio::task::JoinHandle<()>,
    server_config: &ServerConfig,
) -> Result<()> {
    let startup_timeout = server_config.startup_timeout();
    let poll_interval = server_config.poll_interval();
    let start_time = std::time::Instant::now();

    loop {
        if server_handle.is_finished() {
            return Err(anyhow::anyhow!("HTTP server failed to start"));
        }

        if server_state.is_ready.load(Ordering::Relaxed) {
            info!("HTTP server is ready and accepting connections");
            break;
        }

        if start_time.elapsed() > startup_timeout {
            return Err(anyhow::anyhow!(
                "HTTP server failed to become ready within {} seconds",
                startup_timeout.as_secs()
            ));
        }

        tokio::time::sleep(poll_interval).await;
    }

    Ok(())
}
