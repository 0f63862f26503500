//! # Category Adapter
//!
//! Categories live under the store-scoped `/rest/default/V1/categories`
//! collection and cannot be fetched by id directly; single lookups go
//! through the search endpoint at `categories/list`.

use super::generic::GenericAdapter;
use super::{expect_ok, metered, read_resource, ExternalAdapter};
use crate::client::MagentoClient;
use crate::crd::ManagedResource;
use crate::error::{ProviderError, Result};
use crate::translator::ExternalResource;
use async_trait::async_trait;
use kube::api::ApiResource;
use serde_json::Value;
use tracing::debug;

/// Collection path of categories
pub const CATEGORY_PATH: &str = "/rest/default/V1/categories";

/// Fields compared when deciding whether a category needs an update
pub const CATEGORY_FIELDS: &[&str] = &["name", "include_in_menu", "parent_id", "position", "level"];

const FILTER_FIELD: &str = "searchCriteria[filterGroups][0][filters][0][field]";
const FILTER_VALUE: &str = "searchCriteria[filterGroups][0][filters][0][value]";

/// Adapter for the `Category` kind
#[derive(Debug, Clone)]
pub struct CategoryAdapter {
    inner: GenericAdapter,
}

impl CategoryAdapter {
    #[must_use]
    pub fn new(client: MagentoClient, ar: &ApiResource) -> Self {
        Self {
            inner: GenericAdapter::new(client, ar)
                .with_path(CATEGORY_PATH)
                .with_fields(CATEGORY_FIELDS),
        }
    }

    /// First item of a `categories/list` search filtered on `field = value`
    ///
    /// A non-200 answer is an [`ProviderError::UnexpectedStatus`], never an
    /// empty result.
    async fn search(&self, field: &str, value: &str) -> Result<Option<ExternalResource>> {
        let response = self
            .inner
            .client()
            .get("list", &[(FILTER_FIELD, field), (FILTER_VALUE, value)])
            .await?;
        let response = expect_ok(response).await?;
        let mut results = read_resource(response).await?;
        let first = match results.remove("items") {
            Some(Value::Array(items)) => items.into_iter().next(),
            _ => None,
        };
        match first {
            Some(Value::Object(item)) => Ok(Some(item)),
            Some(_) => Err(ProviderError::ShapeMismatch("items[0]".to_string())),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl ExternalAdapter for CategoryAdapter {
    fn kind(&self) -> &str {
        self.inner.kind()
    }

    async fn get(&self, external_id: &str) -> Result<ExternalResource> {
        if external_id.is_empty() {
            return Err(self.inner.not_found(external_id));
        }
        metered(self.kind(), "get", async {
            match self.search("entity_id", external_id).await {
                Ok(found) => found.ok_or_else(|| self.inner.not_found(external_id)),
                Err(ProviderError::UnexpectedStatus { status, .. }) => {
                    debug!(id = external_id, status, "Category lookup failed");
                    Err(self.inner.not_found(external_id))
                }
                Err(e) => Err(e),
            }
        })
        .await
    }

    async fn create(&self, desired: &ManagedResource) -> Result<ExternalResource> {
        self.inner.create(desired).await
    }

    async fn update(&self, external_id: &str, desired: &ManagedResource) -> Result<()> {
        self.inner.update(external_id, desired).await
    }

    async fn delete(&self, external_id: &str) -> Result<()> {
        self.inner.delete(external_id).await
    }

    fn is_up_to_date(
        &self,
        observed: Option<&ExternalResource>,
        desired: Option<&ManagedResource>,
    ) -> Result<bool> {
        self.inner.is_up_to_date(observed, desired)
    }

    async fn find_by_name(&self, desired: &ManagedResource) -> Result<Option<ExternalResource>> {
        let Some(name) = desired.for_provider.get("name").and_then(Value::as_str) else {
            return Ok(None);
        };
        if name.is_empty() {
            return Ok(None);
        }
        metered(self.kind(), "find_by_name", self.search("name", name)).await
    }
}
