//! Common test utilities
//!
//! Shared setup for the integration tests: rustls initialization, managed
//! resource builders and in-memory doubles for the adapter and status seams.

#![allow(dead_code, reason = "each test binary uses a different subset")]

use async_trait::async_trait;
use kube::api::ApiResource;
use provider_magento::controller::reconciler::StatusWriter;
use provider_magento::crd::{Condition, ManagedResource};
use provider_magento::error::{ProviderError, Result};
use provider_magento::external::ExternalAdapter;
use provider_magento::translator::{self, ExternalResource};
use serde_json::{json, Value};
use std::sync::{Mutex, Once};

static RUSTLS_INIT: Once = Once::new();

/// Initialize rustls crypto provider for tests
///
/// Uses a `Once` to ensure it's only called once across all tests.
pub fn init_rustls() {
    RUSTLS_INIT.call_once(|| {
        rustls::crypto::ring::default_provider()
            .install_default()
            .expect("Failed to install rustls crypto provider");
    });
}

pub fn api_resource(kind: &str, plural: &str) -> ApiResource {
    ApiResource {
        group: "magento.web7.md".to_string(),
        version: "v1alpha1".to_string(),
        api_version: "magento.web7.md/v1alpha1".to_string(),
        kind: kind.to_string(),
        plural: plural.to_string(),
    }
}

/// Managed resource of `kind` named `name` asking for `for_provider`
pub fn managed_resource(kind: &str, name: &str, for_provider: Value) -> ManagedResource {
    let mut mr = ManagedResource {
        api_version: "magento.web7.md/v1alpha1".to_string(),
        kind: kind.to_string(),
        for_provider: for_provider.as_object().cloned().unwrap_or_default(),
        ..Default::default()
    };
    mr.metadata.name = Some(name.to_string());
    mr
}

/// Strip the trailing slash pact mock servers put on their URL
pub fn base_url(url: &impl ToString) -> String {
    let mut base_url = url.to_string();
    if base_url.ends_with('/') {
        base_url.pop();
    }
    base_url
}

/// Snapshot of one persisted write
#[derive(Debug, Clone)]
pub struct Write {
    pub target: &'static str,
    pub external_id: String,
    pub finalized: bool,
    pub conditions: Vec<Condition>,
}

/// [`StatusWriter`] that records every write
#[derive(Debug, Default)]
pub struct RecordingWriter {
    pub writes: Mutex<Vec<Write>>,
}

impl RecordingWriter {
    pub fn writes(&self) -> Vec<Write> {
        self.writes.lock().unwrap().clone()
    }

    fn record(&self, target: &'static str, mr: &ManagedResource) {
        self.writes.lock().unwrap().push(Write {
            target,
            external_id: mr.external_id().to_string(),
            finalized: mr.has_finalizer(),
            conditions: mr.conditions.clone(),
        });
    }
}

#[async_trait]
impl StatusWriter for RecordingWriter {
    async fn persist_metadata(&self, mr: &ManagedResource, _persisted: &ManagedResource) -> Result<()> {
        self.record("metadata", mr);
        Ok(())
    }

    async fn persist_status(&self, mr: &ManagedResource) -> Result<()> {
        self.record("status", mr);
        Ok(())
    }
}

/// In-memory Magento entity store for a single kind
#[derive(Debug, Default)]
pub struct FakeAdapter {
    /// Entity currently stored under `existing_id`
    pub existing: Mutex<Option<ExternalResource>>,
    /// Entity returned by `find_by_name`
    pub named: Option<ExternalResource>,
    /// `get` answers with a server error
    pub fail_get: bool,
    /// `create` is rejected by the API
    pub fail_create: bool,
    /// `delete` cannot reach the API
    pub fail_delete: bool,
    /// Id assigned by `create`
    pub next_id: u64,
    pub calls: Mutex<Vec<String>>,
}

impl FakeAdapter {
    pub fn with_existing(resource: Value) -> Self {
        Self {
            existing: Mutex::new(resource.as_object().cloned()),
            ..Default::default()
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn call(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl ExternalAdapter for FakeAdapter {
    fn kind(&self) -> &str {
        "Category"
    }

    async fn get(&self, external_id: &str) -> Result<ExternalResource> {
        self.call(format!("get {external_id}"));
        if self.fail_get {
            return Err(ProviderError::UnexpectedStatus {
                status: 500,
                body: "internal error".to_string(),
            });
        }
        self.existing
            .lock()
            .unwrap()
            .clone()
            .filter(|r| translator::external_id_of(r).is_ok_and(|id| id == external_id))
            .ok_or_else(|| ProviderError::NotFound {
                id: external_id.to_string(),
                path: "/rest/default/V1/categories".to_string(),
            })
    }

    async fn create(&self, desired: &ManagedResource) -> Result<ExternalResource> {
        self.call(format!("create {}", Value::Object(desired.for_provider.clone())));
        if self.fail_create {
            return Err(ProviderError::UnexpectedStatus {
                status: 400,
                body: "The \"name\" attribute value is empty.".to_string(),
            });
        }
        let mut created = desired.for_provider.clone();
        created.insert("id".to_string(), json!(self.next_id));
        *self.existing.lock().unwrap() = Some(created.clone());
        Ok(created)
    }

    async fn update(&self, external_id: &str, desired: &ManagedResource) -> Result<()> {
        self.call(format!(
            "update {external_id} {}",
            Value::Object(desired.for_provider.clone())
        ));
        Ok(())
    }

    async fn delete(&self, external_id: &str) -> Result<()> {
        self.call(format!("delete {external_id}"));
        if self.fail_delete {
            return Err(ProviderError::UnexpectedStatus {
                status: 503,
                body: "service unavailable".to_string(),
            });
        }
        *self.existing.lock().unwrap() = None;
        Ok(())
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
            &["name"],
        ))
    }

    async fn find_by_name(&self, _desired: &ManagedResource) -> Result<Option<ExternalResource>> {
        self.call("find_by_name".to_string());
        Ok(self.named.clone())
    }
}
