//! # External Client Adapters
//!
//! Per-kind CRUD over the Magento REST API. Every discovered kind is served
//! by [`GenericAdapter`], which needs nothing but the kind's name, version
//! and plural. Kinds whose endpoints deviate from the generic layout
//! register a dedicated adapter in the [`AdapterRegistry`].

mod category;
mod generic;
mod registry;

pub use category::{CategoryAdapter, CATEGORY_FIELDS, CATEGORY_PATH};
pub use generic::{collection_path, envelope_key, GenericAdapter, GENERIC_FIELDS};
pub use registry::{AdapterFactory, AdapterRegistry};

use crate::crd::ManagedResource;
use crate::error::{ProviderError, Result};
use crate::observability::metrics;
use crate::translator::ExternalResource;
use async_trait::async_trait;
use serde_json::Value;
use std::future::Future;
use std::time::Instant;
use tracing::debug;

/// CRUD surface the reconciler drives for one kind
#[async_trait]
pub trait ExternalAdapter: Send + Sync + std::fmt::Debug {
    /// Kind this adapter serves
    fn kind(&self) -> &str;

    /// Fetch the external resource with the given id
    ///
    /// Fails with [`ProviderError::NotFound`] when `external_id` is empty or
    /// the API does not answer 200.
    async fn get(&self, external_id: &str) -> Result<ExternalResource>;

    /// Create the external resource from `spec.forProvider`
    async fn create(&self, desired: &ManagedResource) -> Result<ExternalResource>;

    /// Replace the external resource with `spec.forProvider`
    async fn update(&self, external_id: &str, desired: &ManagedResource) -> Result<()>;

    /// Delete the external resource; only transport failures are errors
    async fn delete(&self, external_id: &str) -> Result<()>;

    /// Whether the observed resource matches what `desired` asks for
    fn is_up_to_date(
        &self,
        observed: Option<&ExternalResource>,
        desired: Option<&ManagedResource>,
    ) -> Result<bool>;

    /// Look up an existing external resource matching `desired` by name
    async fn find_by_name(&self, _desired: &ManagedResource) -> Result<Option<ExternalResource>> {
        Ok(None)
    }
}

/// Run one Magento API operation and record its metrics
pub(crate) async fn metered<T, F>(kind: &str, operation: &'static str, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    let start = Instant::now();
    let result = fut.await;
    let elapsed = start.elapsed().as_secs_f64();
    match &result {
        Ok(_) => metrics::record_external_operation(kind, operation, elapsed),
        Err(e) => {
            debug!(kind, operation, error = %e, "Magento API operation failed");
            metrics::increment_external_operation_errors(kind, operation);
        }
    }
    result
}

/// Decode a response body into an external resource
pub(crate) async fn read_resource(response: reqwest::Response) -> Result<ExternalResource> {
    match response.json::<Value>().await? {
        Value::Object(map) => Ok(map),
        _ => Err(ProviderError::ShapeMismatch("response object".to_string())),
    }
}

/// Turn a non-200 response into [`ProviderError::UnexpectedStatus`]
pub(crate) async fn expect_ok(response: reqwest::Response) -> Result<reqwest::Response> {
    if response.status() == reqwest::StatusCode::OK {
        return Ok(response);
    }
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    Err(ProviderError::UnexpectedStatus { status, body })
}
