//! # Generic Adapter
//!
//! Serves any kind whose collection lives at `/rest/<VERSION>/<plural>` and
//! whose payload is wrapped in an envelope named after the lowercased kind.

use super::{expect_ok, metered, read_resource, ExternalAdapter};
use crate::client::MagentoClient;
use crate::constants::REST_PREFIX;
use crate::crd::ManagedResource;
use crate::error::{ProviderError, Result};
use crate::translator::{self, ExternalResource};
use async_trait::async_trait;
use kube::api::ApiResource;
use serde_json::{Map, Value};
use tracing::{info, warn};

/// Fields compared for kinds without a dedicated adapter
pub const GENERIC_FIELDS: &[&str] = &["name"];

/// Collection path of a kind, e.g. `/rest/V1/products`
#[must_use]
pub fn collection_path(ar: &ApiResource) -> String {
    format!("{REST_PREFIX}/{}/{}", ar.version.to_uppercase(), ar.plural)
}

/// Envelope key wrapping a kind's payload, e.g. `category`
#[must_use]
pub fn envelope_key(kind: &str) -> String {
    kind.to_lowercase()
}

/// Untyped CRUD adapter for any discovered kind
#[derive(Debug, Clone)]
pub struct GenericAdapter {
    client: MagentoClient,
    kind: String,
    fields: &'static [&'static str],
}

impl GenericAdapter {
    /// Bind `client` to the collection path of `ar`
    #[must_use]
    pub fn new(client: MagentoClient, ar: &ApiResource) -> Self {
        Self {
            client: client.with_path(collection_path(ar)),
            kind: ar.kind.clone(),
            fields: GENERIC_FIELDS,
        }
    }

    /// Use `path` instead of the derived collection path
    #[must_use]
    pub fn with_path(mut self, path: &str) -> Self {
        self.client.set_path(path);
        self
    }

    /// Compare over `fields` instead of [`GENERIC_FIELDS`]
    #[must_use]
    pub fn with_fields(mut self, fields: &'static [&'static str]) -> Self {
        self.fields = fields;
        self
    }

    #[must_use]
    pub fn client(&self) -> &MagentoClient {
        &self.client
    }

    fn envelope(&self, desired: &ManagedResource) -> Value {
        let mut body = Map::new();
        body.insert(
            envelope_key(&self.kind),
            Value::Object(desired.for_provider.clone()),
        );
        Value::Object(body)
    }

    pub(crate) fn not_found(&self, id: &str) -> ProviderError {
        ProviderError::NotFound {
            id: id.to_string(),
            path: self.client.path().to_string(),
        }
    }
}

#[async_trait]
impl ExternalAdapter for GenericAdapter {
    fn kind(&self) -> &str {
        &self.kind
    }

    async fn get(&self, external_id: &str) -> Result<ExternalResource> {
        if external_id.is_empty() {
            return Err(self.not_found(external_id));
        }
        metered(&self.kind, "get", async {
            let response = self.client.get(external_id, &[]).await?;
            if response.status() != reqwest::StatusCode::OK {
                return Err(self.not_found(external_id));
            }
            read_resource(response).await
        })
        .await
    }

    async fn create(&self, desired: &ManagedResource) -> Result<ExternalResource> {
        metered(&self.kind, "create", async {
            let response = self.client.post(&self.envelope(desired)).await?;
            let created = read_resource(expect_ok(response).await?).await?;
            info!(kind = %self.kind, name = desired.name(), "Created external resource");
            Ok(created)
        })
        .await
    }

    async fn update(&self, external_id: &str, desired: &ManagedResource) -> Result<()> {
        metered(&self.kind, "update", async {
            let response = self.client.put(external_id, &self.envelope(desired)).await?;
            expect_ok(response).await?;
            info!(kind = %self.kind, id = external_id, "Updated external resource");
            Ok(())
        })
        .await
    }

    async fn delete(&self, external_id: &str) -> Result<()> {
        metered(&self.kind, "delete", async {
            let response = self.client.delete(external_id).await?;
            if response.status().is_success() {
                info!(kind = %self.kind, id = external_id, "Deleted external resource");
            } else {
                warn!(
                    kind = %self.kind,
                    id = external_id,
                    status = response.status().as_u16(),
                    "Magento API did not confirm deletion"
                );
            }
            Ok(())
        })
        .await
    }

    fn is_up_to_date(
        &self,
        observed: Option<&ExternalResource>,
        desired: Option<&ManagedResource>,
    ) -> Result<bool> {
        let (Some(observed), Some(desired)) = (observed, desired) else {
            return Err(ProviderError::NilInput);
        };
        Ok(translator::is_up_to_date(
            observed,
            &desired.for_provider,
            self.fields,
        ))
    }
}
