//! Kubernetes-backed ProviderConfig store and usage tracker.

use super::{ProviderConfigStore, UsageTracker};
use crate::constants::FIELD_MANAGER;
use crate::crd::{
    CredentialsSource, ManagedResource, ProviderConfig, ProviderConfigReference,
    ProviderConfigSpec, ProviderConfigUsage, ProviderConfigUsageSpec, ProviderCredentials,
    TypedReference,
};
use crate::error::{ProviderError, Result};
use async_trait::async_trait;
use k8s_openapi::api::core::v1::Secret;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::OwnerReference;
use kube::api::{Api, Patch, PatchParams};
use kube::{Client, Resource};
use tracing::debug;
use zeroize::Zeroizing;

/// Reads ProviderConfigs and Secrets from the cluster
#[derive(Clone)]
pub struct KubeProviderConfigStore {
    client: Client,
}

impl std::fmt::Debug for KubeProviderConfigStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KubeProviderConfigStore").finish_non_exhaustive()
    }
}

impl KubeProviderConfigStore {
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    async fn secret_value(&self, credentials: &ProviderCredentials) -> Result<String> {
        let selector = credentials.secret_ref.as_ref().ok_or_else(|| {
            ProviderError::CredentialResolution("secretRef is required for source Secret".to_string())
        })?;
        let secrets: Api<Secret> = Api::namespaced(self.client.clone(), &selector.namespace);
        let secret = secrets.get(&selector.name).await.map_err(|e| {
            ProviderError::CredentialResolution(format!(
                "cannot get Secret {}/{}: {e}",
                selector.namespace, selector.name
            ))
        })?;
        let bytes = secret
            .data
            .as_ref()
            .and_then(|d| d.get(&selector.key))
            .ok_or_else(|| {
                ProviderError::CredentialResolution(format!(
                    "Secret {}/{} has no key {}",
                    selector.namespace, selector.name, selector.key
                ))
            })?;
        String::from_utf8(bytes.0.clone()).map_err(|e| {
            ProviderError::CredentialResolution(format!("token is not valid UTF-8: {e}"))
        })
    }
}

#[async_trait]
impl ProviderConfigStore for KubeProviderConfigStore {
    async fn get(&self, name: &str) -> Result<ProviderConfigSpec> {
        let configs: Api<ProviderConfig> = Api::all(self.client.clone());
        configs
            .get(name)
            .await
            .map(|pc| pc.spec)
            .map_err(|e| ProviderError::ConfigNotFound {
                name: name.to_string(),
                reason: e.to_string(),
            })
    }

    async fn resolve_credentials(
        &self,
        credentials: &ProviderCredentials,
    ) -> Result<Zeroizing<String>> {
        let raw = match credentials.source {
            CredentialsSource::Secret => self.secret_value(credentials).await?,
            _ => local_token(credentials).await?,
        };
        Ok(Zeroizing::new(raw.trim().to_string()))
    }
}

/// Token from a source that does not need the cluster
pub(crate) async fn local_token(credentials: &ProviderCredentials) -> Result<String> {
    match credentials.source {
        CredentialsSource::None => Ok(String::new()),
        CredentialsSource::Environment => {
            let selector = credentials.env.as_ref().ok_or_else(|| {
                ProviderError::CredentialResolution(
                    "env is required for source Environment".to_string(),
                )
            })?;
            std::env::var(&selector.name).map_err(|e| {
                ProviderError::CredentialResolution(format!(
                    "cannot read environment variable {}: {e}",
                    selector.name
                ))
            })
        }
        CredentialsSource::Filesystem => {
            let selector = credentials.fs.as_ref().ok_or_else(|| {
                ProviderError::CredentialResolution(
                    "fs is required for source Filesystem".to_string(),
                )
            })?;
            tokio::fs::read_to_string(&selector.path).await.map_err(|e| {
                ProviderError::CredentialResolution(format!("cannot read {}: {e}", selector.path))
            })
        }
        CredentialsSource::Secret => Err(ProviderError::CredentialResolution(
            "source Secret must be read from the cluster".to_string(),
        )),
    }
}

/// Records usage as ProviderConfigUsage objects owned by the managed resource
#[derive(Clone)]
pub struct KubeUsageTracker {
    client: Client,
}

impl std::fmt::Debug for KubeUsageTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KubeUsageTracker").finish_non_exhaustive()
    }
}

impl KubeUsageTracker {
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

/// Usage record for `mr`, named after its uid when it has one
pub(crate) fn usage_for(mr: &ManagedResource) -> ProviderConfigUsage {
    let uid = mr.metadata.uid.clone();
    let name = uid
        .clone()
        .unwrap_or_else(|| format!("{}-{}", mr.kind.to_lowercase(), mr.name()));
    let mut usage = ProviderConfigUsage::new(
        &name,
        ProviderConfigUsageSpec {
            provider_config_ref: ProviderConfigReference {
                name: mr.provider_config_ref.name.clone(),
            },
            resource_ref: TypedReference {
                api_version: mr.api_version.clone(),
                kind: mr.kind.clone(),
                name: mr.name().to_string(),
                uid: uid.clone(),
            },
        },
    );
    if let Some(uid) = uid {
        usage.meta_mut().owner_references = Some(vec![OwnerReference {
            api_version: mr.api_version.clone(),
            kind: mr.kind.clone(),
            name: mr.name().to_string(),
            uid,
            ..Default::default()
        }]);
    }
    usage
}

#[async_trait]
impl UsageTracker for KubeUsageTracker {
    async fn track(&self, mr: &ManagedResource) -> Result<()> {
        let usage = usage_for(mr);
        let name = usage.metadata.name.clone().unwrap_or_default();
        let usages: Api<ProviderConfigUsage> = Api::all(self.client.clone());
        usages
            .patch(
                &name,
                &PatchParams::apply(FIELD_MANAGER).force(),
                &Patch::Apply(&usage),
            )
            .await
            .map_err(|e| ProviderError::UsageTracking(e.to_string()))?;
        debug!(usage = %name, provider_config = %mr.provider_config_ref.name, "Recorded ProviderConfig usage");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crd::{EnvSelector, FsSelector};

    #[test]
    fn test_usage_is_owned_by_managed_resource() {
        let mut mr = ManagedResource {
            api_version: "magento.web7.md/v1alpha1".to_string(),
            kind: "Category".to_string(),
            ..Default::default()
        };
        mr.metadata.name = Some("shoes".to_string());
        mr.metadata.uid = Some("5c0f".to_string());

        let usage = usage_for(&mr);
        assert_eq!(usage.metadata.name.as_deref(), Some("5c0f"));
        assert_eq!(usage.spec.provider_config_ref.name, "default");
        assert_eq!(usage.spec.resource_ref.kind, "Category");
        let owners = usage.metadata.owner_references.unwrap();
        assert_eq!(owners[0].uid, "5c0f");
    }

    #[test]
    fn test_usage_without_uid_is_named_after_kind_and_name() {
        let mut mr = ManagedResource {
            kind: "Product".to_string(),
            ..Default::default()
        };
        mr.metadata.name = Some("tee".to_string());

        let usage = usage_for(&mr);
        assert_eq!(usage.metadata.name.as_deref(), Some("product-tee"));
        assert!(usage.metadata.owner_references.is_none());
    }

    #[tokio::test]
    async fn test_local_token_reads_environment() {
        std::env::set_var("PROVIDER_MAGENTO_TEST_TOKEN", "env-token");
        let credentials = ProviderCredentials {
            source: CredentialsSource::Environment,
            env: Some(EnvSelector {
                name: "PROVIDER_MAGENTO_TEST_TOKEN".to_string(),
            }),
            ..Default::default()
        };
        assert_eq!(local_token(&credentials).await.unwrap(), "env-token");
        std::env::remove_var("PROVIDER_MAGENTO_TEST_TOKEN");
    }

    #[tokio::test]
    async fn test_local_token_reports_missing_file() {
        let credentials = ProviderCredentials {
            source: CredentialsSource::Filesystem,
            fs: Some(FsSelector {
                path: "/nonexistent/provider-magento/token".to_string(),
            }),
            ..Default::default()
        };
        let err = local_token(&credentials).await.unwrap_err();
        assert!(matches!(err, ProviderError::CredentialResolution(_)));
    }

    #[tokio::test]
    async fn test_local_token_requires_selector() {
        let credentials = ProviderCredentials {
            source: CredentialsSource::Environment,
            ..Default::default()
        };
        assert!(local_token(&credentials).await.is_err());
        assert_eq!(local_token(&ProviderCredentials::default()).await.unwrap(), "");
    }
}
