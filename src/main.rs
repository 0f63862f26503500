//! # Magento Provider
//!
//! Kubernetes provider that keeps Magento entities in line with managed
//! resources declared in the `magento.web7.md` API group.
//!
//! At startup the provider discovers every kind served under its group and
//! version, skipping `*List`, `*Event`, `*Options` and `*Config` kinds, and
//! runs one controller per remaining kind. Each reconcile resolves the
//! referenced ProviderConfig, then observes, creates, updates or deletes the
//! Magento entity and records the outcome in the resource's conditions.
//!
//! Settings come from environment variables; the flags below override them.

use anyhow::Result;
use clap::Parser;
use provider_magento::config::{ControllerConfig, ServerConfig};
use provider_magento::runtime::{initialize, run_watch_loop};

#[derive(Debug, Parser)]
#[command(name = "provider-magento", version, about = "Magento provider for Kubernetes")]
struct Args {
    /// Log at debug level
    #[arg(long)]
    debug: bool,

    /// Seconds between re-observations of an unchanged managed resource
    #[arg(long)]
    poll_interval_secs: Option<u64>,

    /// Reconciles started per second across all kinds
    #[arg(long)]
    max_reconcile_rate: Option<u32>,

    /// Port for metrics and probes
    #[arg(long)]
    metrics_port: Option<u16>,
}

impl Args {
    fn apply(&self, controller: &mut ControllerConfig, server: &mut ServerConfig) {
        controller.debug |= self.debug;
        if let Some(secs) = self.poll_interval_secs {
            controller.poll_interval_secs = secs;
        }
        if let Some(rate) = self.max_reconcile_rate {
            controller.max_reconcile_rate = rate;
        }
        if let Some(port) = self.metrics_port {
            server.metrics_port = port;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let mut controller_config = ControllerConfig::from_env();
    let mut server_config = ServerConfig::from_env();
    args.apply(&mut controller_config, &mut server_config);

    let init = initialize(controller_config, server_config).await?;
    run_watch_loop(init.client, init.reconciler, init.kinds, init.server_state).await
}
