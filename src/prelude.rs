//! # Prelude
//!
//! Re-exports commonly used types and traits.
//!
//! ```rust
//! use provider_magento::prelude::*;
//! ```

pub use crate::crd::*;

pub use crate::client::MagentoClient;
pub use crate::connector::{Connector, ProviderConfigStore, UsageTracker};
pub use crate::external::{AdapterRegistry, ExternalAdapter, GenericAdapter};

pub use crate::controller::discovery::{discover_kinds, KindRegistry, ManagedKind};
pub use crate::controller::reconciler::{
    reconcile, KindContext, ManagedReconciler, Reconciler, ReconcilerError, StatusWriter,
};

pub use crate::config::{ControllerConfig, ServerConfig};
pub use crate::error::{ProviderError, Result};
pub use crate::translator::ExternalResource;
