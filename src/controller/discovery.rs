//! # Kind Discovery
//!
//! Enumerates every kind registered in the cluster under the provider's API
//! group and decides which of them get a reconciliation loop.
//!
//! The [`KindRegistry`] is built once at startup and passed by reference.
//! Setting up a kind can fail on its own; such failures are collected in the
//! [`DiscoveryOutcome`] and never prevent the other kinds from starting.

use crate::constants::EXCLUDED_KIND_FRAGMENTS;
use crate::observability::metrics;
use kube::api::ApiResource;
use kube::{Client, Discovery};
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("API discovery failed")]
    Discovery(#[source] kube::Error),

    #[error("registered resource in {api_version} has no kind")]
    MissingKind { api_version: String },

    #[error("kind {kind} in {api_version} has no registered plural")]
    MissingPlural { api_version: String, kind: String },
}

/// Every kind the cluster serves under the provider's API group
#[derive(Debug, Clone, Default)]
pub struct KindRegistry {
    resources: Vec<ApiResource>,
}

impl KindRegistry {
    #[must_use]
    pub fn new(resources: Vec<ApiResource>) -> Self {
        Self { resources }
    }

    /// Build the registry from the cluster's discovery API, limited to `group`
    #[instrument(skip(client))]
    pub async fn from_cluster(client: &Client, group: &str) -> Result<Self, DiscoveryError> {
        let discovery = Discovery::new(client.clone())
            .filter(&[group])
            .run()
            .await
            .map_err(DiscoveryError::Discovery)?;

        let mut resources = Vec::new();
        for api_group in discovery.groups() {
            for version in api_group.versions() {
                for (ar, _caps) in api_group.versioned_resources(version) {
                    debug!(api_version = %ar.api_version, kind = %ar.kind, "Registered kind");
                    resources.push(ar);
                }
            }
        }
        Ok(Self { resources })
    }

    #[must_use]
    pub fn resources(&self) -> &[ApiResource] {
        &self.resources
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.resources.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}

/// Whether a kind is reconciled against the Magento API
///
/// Group and version must match the provider's, and the kind name must not
/// look like a structural or ancillary type.
#[must_use]
pub fn is_managed_kind(
    group: &str,
    version: &str,
    kind: &str,
    api_group: &str,
    api_version: &str,
) -> bool {
    group == api_group
        && version == api_version
        && !EXCLUDED_KIND_FRAGMENTS
            .iter()
            .any(|fragment| kind.contains(fragment))
}

/// A kind that gets its own reconciliation loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagedKind {
    api_resource: ApiResource,
}

impl ManagedKind {
    /// Validate a registry entry
    ///
    /// # Errors
    ///
    /// Fails when the entry has no kind or no plural.
    pub fn from_api_resource(ar: ApiResource) -> Result<Self, DiscoveryError> {
        if ar.kind.is_empty() {
            return Err(DiscoveryError::MissingKind {
                api_version: ar.api_version,
            });
        }
        if ar.plural.is_empty() {
            return Err(DiscoveryError::MissingPlural {
                api_version: ar.api_version,
                kind: ar.kind,
            });
        }
        Ok(Self { api_resource: ar })
    }

    #[must_use]
    pub fn kind(&self) -> &str {
        &self.api_resource.kind
    }

    #[must_use]
    pub fn plural(&self) -> &str {
        &self.api_resource.plural
    }

    #[must_use]
    pub fn api_resource(&self) -> &ApiResource {
        &self.api_resource
    }
}

#[derive(Debug)]
pub struct DiscoveryFailure {
    pub kind: String,
    pub error: DiscoveryError,
}

#[derive(Debug, Default)]
pub struct DiscoveryOutcome {
    pub kinds: Vec<ManagedKind>,
    pub failures: Vec<DiscoveryFailure>,
}

/// Select the kinds of `registry` that get a reconciliation loop
#[must_use]
pub fn discover_kinds(registry: &KindRegistry, group: &str, version: &str) -> DiscoveryOutcome {
    let mut outcome = DiscoveryOutcome::default();

    for ar in registry.resources() {
        if !is_managed_kind(&ar.group, &ar.version, &ar.kind, group, version) {
            debug!(api_version = %ar.api_version, kind = %ar.kind, "Skipping kind");
            continue;
        }
        match ManagedKind::from_api_resource(ar.clone()) {
            Ok(kind) => {
                info!(kind = %kind.kind(), plural = %kind.plural(), "Discovered managed kind");
                outcome.kinds.push(kind);
            }
            Err(error) => {
                warn!(kind = %ar.kind, error = %error, "Cannot set up reconciliation for kind");
                metrics::increment_discovery_failures();
                outcome.failures.push(DiscoveryFailure {
                    kind: ar.kind.clone(),
                    error,
                });
            }
        }
    }

    outcome
}
