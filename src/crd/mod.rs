//! # Custom Resource Definitions
//!
//! CRD types for the Magento provider.
//!
//! ## Module Structure
//!
//! - `provider_config.rs` - ProviderConfig and ProviderConfigUsage
//! - `managed.rs` - Untyped view shared by every managed kind
//! - `category.rs` - Typed schema of the Category kind
//! - `generic.rs` - Open-schema CRDs for kinds without a typed schema
//! - `condition.rs` - Ready/Synced conditions

mod category;
mod condition;
mod generic;
mod managed;
mod provider_config;

pub use category::{
    Category, CategoryObservation, CategoryParameters, CategorySpec, CategoryStatus,
    CustomAttribute,
};
pub use condition::{
    find_condition, set_condition, Condition, REASON_AVAILABLE, REASON_CREATING,
    REASON_DELETING, REASON_RECONCILE_ERROR, REASON_RECONCILE_SUCCESS, REASON_UNAVAILABLE,
    TYPE_READY, TYPE_SYNCED,
};
pub use generic::managed_crd;
pub use managed::{Attributes, DeletionPolicy, ManagedResource, ProviderConfigRef};
pub use provider_config::{
    CredentialsSource, EnvSelector, FsSelector, ProviderConfig, ProviderConfigReference,
    ProviderConfigSpec, ProviderConfigUsage, ProviderConfigUsageSpec, ProviderCredentials,
    SecretKeySelector, TypedReference,
};
