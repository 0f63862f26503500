//! # ProviderConfig
//!
//! Cluster-scoped configuration telling the provider where the Magento API
//! lives and where its access token comes from, plus the usage records that
//! tie managed resources to the config they were reconciled with.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// ProviderConfig Custom Resource Definition
///
/// # Example
///
/// ```yaml
/// apiVersion: magento.web7.md/v1alpha1
/// kind: ProviderConfig
/// metadata:
///   name: default
/// spec:
///   magentoURL: https://shop.example.com
///   credentials:
///     source: Secret
///     secretRef:
///       namespace: crossplane-system
///       name: magento-token
///       key: token
/// ```
#[derive(CustomResource, Debug, Clone, Deserialize, Serialize, JsonSchema)]
#[kube(
    group = "magento.web7.md",
    version = "v1alpha1",
    kind = "ProviderConfig",
    printcolumn = r#"{"name":"URL", "type":"string", "jsonPath":".spec.magentoURL"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct ProviderConfigSpec {
    /// Base URL of the Magento installation, without the `/rest` suffix
    #[serde(rename = "magentoURL")]
    pub magento_url: String,
    /// Where the bearer token comes from
    pub credentials: ProviderCredentials,
}

/// Credential source selection
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
pub enum CredentialsSource {
    /// No credentials; requests are sent with an empty bearer token
    #[default]
    None,
    /// A key of a Kubernetes Secret
    Secret,
    /// A process environment variable
    Environment,
    /// A file mounted into the provider pod
    Filesystem,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProviderCredentials {
    #[serde(default)]
    pub source: CredentialsSource,
    #[serde(default)]
    pub secret_ref: Option<SecretKeySelector>,
    #[serde(default)]
    pub env: Option<EnvSelector>,
    #[serde(default)]
    pub fs: Option<FsSelector>,
}

/// Reference to a key in a Kubernetes Secret
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SecretKeySelector {
    pub name: String,
    pub namespace: String,
    pub key: String,
}

#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct EnvSelector {
    /// Name of the environment variable holding the token
    pub name: String,
}

#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct FsSelector {
    /// Path of the file holding the token
    pub path: String,
}

/// Records that a managed resource depends on a ProviderConfig
#[derive(CustomResource, Debug, Clone, Deserialize, Serialize, JsonSchema)]
#[kube(
    group = "magento.web7.md",
    version = "v1alpha1",
    kind = "ProviderConfigUsage",
    printcolumn = r#"{"name":"Config", "type":"string", "jsonPath":".spec.providerConfigRef.name"}"#,
    printcolumn = r#"{"name":"Resource-Kind", "type":"string", "jsonPath":".spec.resourceRef.kind"}"#,
    printcolumn = r#"{"name":"Resource-Name", "type":"string", "jsonPath":".spec.resourceRef.name"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct ProviderConfigUsageSpec {
    pub provider_config_ref: ProviderConfigReference,
    pub resource_ref: TypedReference,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
pub struct ProviderConfigReference {
    pub name: String,
}

/// Reference to the managed resource using a config
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TypedReference {
    pub api_version: String,
    pub kind: String,
    pub name: String,
    #[serde(default)]
    pub uid: Option<String>,
}
