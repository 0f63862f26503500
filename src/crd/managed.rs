//! # Managed Resources
//!
//! Thin typed view over an arbitrary managed kind. Only the fields every
//! managed kind shares are typed; `forProvider` and `atProvider` stay
//! untyped so kinds discovered at runtime need no compiled schema.

use super::condition::{self, Condition};
use crate::constants::{DEFAULT_PROVIDER_CONFIG_NAME, EXTERNAL_ID_ANNOTATION, FINALIZER};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Reference to the ProviderConfig a managed resource is reconciled with
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
pub struct ProviderConfigRef {
    pub name: String,
}

impl Default for ProviderConfigRef {
    fn default() -> Self {
        Self {
            name: DEFAULT_PROVIDER_CONFIG_NAME.to_string(),
        }
    }
}

/// What happens to the external resource when the managed resource is deleted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
pub enum DeletionPolicy {
    /// Delete the external resource
    #[default]
    Delete,
    /// Leave the external resource in place
    Orphan,
}

/// Untyped desired or observed attributes of an external resource
pub type Attributes = Map<String, Value>;

/// A managed resource of any kind
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ManagedResource {
    pub api_version: String,
    pub kind: String,
    pub metadata: ObjectMeta,
    /// Desired external attributes (`spec.forProvider`)
    pub for_provider: Attributes,
    /// Last observed external attributes (`status.atProvider`)
    pub at_provider: Attributes,
    pub conditions: Vec<Condition>,
    pub provider_config_ref: ProviderConfigRef,
    pub deletion_policy: DeletionPolicy,
    /// `spec` keys this view does not model, kept verbatim
    pub spec_extra: Attributes,
    /// `status` keys this view does not model, kept verbatim
    pub status_extra: Attributes,
}

impl ManagedResource {
    #[must_use]
    pub fn name(&self) -> &str {
        self.metadata.name.as_deref().unwrap_or_default()
    }

    /// Identifier assigned by the Magento API, empty when never created
    #[must_use]
    pub fn external_id(&self) -> &str {
        self.metadata
            .annotations
            .as_ref()
            .and_then(|a| a.get(EXTERNAL_ID_ANNOTATION))
            .map_or("", String::as_str)
    }

    pub fn set_external_id(&mut self, id: impl Into<String>) {
        self.metadata
            .annotations
            .get_or_insert_with(Default::default)
            .insert(EXTERNAL_ID_ANNOTATION.to_string(), id.into());
    }

    #[must_use]
    pub fn is_being_deleted(&self) -> bool {
        self.metadata.deletion_timestamp.is_some()
    }

    #[must_use]
    pub fn has_finalizer(&self) -> bool {
        self.metadata
            .finalizers
            .as_ref()
            .is_some_and(|f| f.iter().any(|x| x == FINALIZER))
    }

    /// Returns `true` when the finalizer was not present yet
    pub fn add_finalizer(&mut self) -> bool {
        if self.has_finalizer() {
            return false;
        }
        self.metadata
            .finalizers
            .get_or_insert_with(Vec::new)
            .push(FINALIZER.to_string());
        true
    }

    /// Returns `true` when the finalizer was present
    pub fn remove_finalizer(&mut self) -> bool {
        let Some(finalizers) = self.metadata.finalizers.as_mut() else {
            return false;
        };
        let before = finalizers.len();
        finalizers.retain(|f| f != FINALIZER);
        before != finalizers.len()
    }

    /// Set a condition by type; returns `true` when it changed
    pub fn set_condition(&mut self, condition: Condition) -> bool {
        condition::set_condition(&mut self.conditions, condition)
    }

    #[must_use]
    pub fn condition(&self, r#type: &str) -> Option<&Condition> {
        condition::find_condition(&self.conditions, r#type)
    }

    /// `apiVersion/kind/name` used in logs and metrics
    #[must_use]
    pub fn display_ref(&self) -> String {
        format!("{}/{}/{}", self.api_version, self.kind, self.name())
    }
}
