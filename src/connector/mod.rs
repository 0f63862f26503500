//! # Connector
//!
//! Turns a managed resource into a Magento client bound to the right base
//! URL and token. Connecting records ProviderConfig usage, reads the
//! ProviderConfig, resolves its credentials and builds a fresh client. No
//! call reaches the Magento API while connecting.

mod kube_store;

pub use kube_store::{KubeProviderConfigStore, KubeUsageTracker};

use crate::client::MagentoClient;
use crate::crd::{ManagedResource, ProviderConfigSpec, ProviderCredentials};
use crate::error::{ProviderError, Result};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;
use zeroize::Zeroizing;

/// Read access to ProviderConfigs and the secrets they reference
#[async_trait]
pub trait ProviderConfigStore: Send + Sync {
    /// Fetch the spec of the named ProviderConfig
    async fn get(&self, name: &str) -> Result<ProviderConfigSpec>;

    /// Resolve credentials to the raw bearer token
    async fn resolve_credentials(&self, credentials: &ProviderCredentials)
        -> Result<Zeroizing<String>>;
}

/// Records which managed resources depend on which ProviderConfig
#[async_trait]
pub trait UsageTracker: Send + Sync {
    async fn track(&self, mr: &ManagedResource) -> Result<()>;
}

/// Everything a reconcile needs to talk to Magento
#[derive(Debug, Clone)]
pub struct AdapterHandle {
    pub client: MagentoClient,
}

/// Builds an [`AdapterHandle`] per reconcile
#[derive(Clone)]
pub struct Connector {
    store: Arc<dyn ProviderConfigStore>,
    usage: Arc<dyn UsageTracker>,
}

impl std::fmt::Debug for Connector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connector").finish_non_exhaustive()
    }
}

impl Connector {
    #[must_use]
    pub fn new(store: Arc<dyn ProviderConfigStore>, usage: Arc<dyn UsageTracker>) -> Self {
        Self { store, usage }
    }

    /// Resolve configuration and credentials for `mr`
    ///
    /// # Errors
    ///
    /// - [`ProviderError::UsageTracking`] when usage cannot be recorded
    /// - [`ProviderError::ConfigNotFound`] when the ProviderConfig is missing
    /// - [`ProviderError::CredentialResolution`] when the token cannot be read
    pub async fn connect(&self, mr: &ManagedResource) -> Result<AdapterHandle> {
        self.usage.track(mr).await.map_err(|e| match e {
            ProviderError::UsageTracking(_) => e,
            other => ProviderError::UsageTracking(other.to_string()),
        })?;

        let config_name = &mr.provider_config_ref.name;
        let config = self.store.get(config_name).await?;
        let token = self.store.resolve_credentials(&config.credentials).await?;

        debug!(
            resource = %mr.display_ref(),
            provider_config = %config_name,
            magento_url = %config.magento_url,
            "Connected managed resource"
        );
        let client = MagentoClient::new(config.magento_url, token.as_str())?;
        Ok(AdapterHandle { client })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crd::CredentialsSource;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StaticStore {
        config: Option<ProviderConfigSpec>,
        token: Result<String, String>,
    }

    #[async_trait]
    impl ProviderConfigStore for StaticStore {
        async fn get(&self, name: &str) -> Result<ProviderConfigSpec> {
            self.config.clone().ok_or_else(|| ProviderError::ConfigNotFound {
                name: name.to_string(),
                reason: "not found".to_string(),
            })
        }

        async fn resolve_credentials(
            &self,
            _credentials: &ProviderCredentials,
        ) -> Result<Zeroizing<String>> {
            self.token
                .clone()
                .map(Zeroizing::new)
                .map_err(ProviderError::CredentialResolution)
        }
    }

    #[derive(Default)]
    struct CountingTracker {
        calls: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl UsageTracker for CountingTracker {
        async fn track(&self, _mr: &ManagedResource) -> Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(ProviderError::UsageTracking("apply rejected".to_string()));
            }
            Ok(())
        }
    }

    fn config() -> ProviderConfigSpec {
        ProviderConfigSpec {
            magento_url: "https://shop.example.com".to_string(),
            credentials: ProviderCredentials {
                source: CredentialsSource::None,
                ..Default::default()
            },
        }
    }

    #[tokio::test]
    async fn test_connect_builds_client_for_config_url() {
        let tracker = Arc::new(CountingTracker::default());
        let connector = Connector::new(
            Arc::new(StaticStore {
                config: Some(config()),
                token: Ok("token".to_string()),
            }),
            tracker.clone(),
        );

        let handle = connector.connect(&ManagedResource::default()).await.unwrap();
        assert_eq!(handle.client.base_url(), "https://shop.example.com");
        assert_eq!(tracker.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_connect_reports_missing_config() {
        let connector = Connector::new(
            Arc::new(StaticStore {
                config: None,
                token: Ok(String::new()),
            }),
            Arc::new(CountingTracker::default()),
        );
        let err = connector.connect(&ManagedResource::default()).await.unwrap_err();
        assert!(matches!(err, ProviderError::ConfigNotFound { ref name, .. } if name == "default"));
    }

    #[tokio::test]
    async fn test_connect_reports_credential_failure() {
        let connector = Connector::new(
            Arc::new(StaticStore {
                config: Some(config()),
                token: Err("secret key missing".to_string()),
            }),
            Arc::new(CountingTracker::default()),
        );
        let err = connector.connect(&ManagedResource::default()).await.unwrap_err();
        assert!(matches!(err, ProviderError::CredentialResolution(_)));
    }

    #[tokio::test]
    async fn test_connect_stops_when_usage_tracking_fails() {
        let connector = Connector::new(
            Arc::new(StaticStore {
                config: None,
                token: Ok(String::new()),
            }),
            Arc::new(CountingTracker {
                fail: true,
                ..Default::default()
            }),
        );
        let err = connector.connect(&ManagedResource::default()).await.unwrap_err();
        assert!(matches!(err, ProviderError::UsageTracking(_)));
    }
}
