//! # Adapter Registry
//!
//! Maps kind names to dedicated adapter factories. Kinds without an entry
//! get the [`GenericAdapter`].

use super::{CategoryAdapter, ExternalAdapter, GenericAdapter};
use crate::client::MagentoClient;
use kube::api::ApiResource;
use std::collections::HashMap;

/// Builds a dedicated adapter for one kind
pub type AdapterFactory = fn(MagentoClient, &ApiResource) -> Box<dyn ExternalAdapter>;

#[derive(Debug, Clone, Default)]
pub struct AdapterRegistry {
    factories: HashMap<String, AdapterFactory>,
}

impl AdapterRegistry {
    /// Registry with no dedicated adapters
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Registry with every dedicated adapter this crate ships
    #[must_use]
    pub fn with_builtin() -> Self {
        let mut registry = Self::empty();
        registry.register("Category", |client, ar| {
            Box::new(CategoryAdapter::new(client, ar))
        });
        registry
    }

    pub fn register(&mut self, kind: impl Into<String>, factory: AdapterFactory) {
        self.factories.insert(kind.into(), factory);
    }

    #[must_use]
    pub fn has_dedicated(&self, kind: &str) -> bool {
        self.factories.contains_key(kind)
    }

    /// Adapter for `ar`, bound to `client`
    #[must_use]
    pub fn adapter_for(&self, client: MagentoClient, ar: &ApiResource) -> Box<dyn ExternalAdapter> {
        match self.factories.get(&ar.kind) {
            Some(factory) => factory(client, ar),
            None => Box::new(GenericAdapter::new(client, ar)),
        }
    }
}
