//! # Status Persistence
//!
//! Writes the parts of a managed resource the reconciler owns back to the
//! API server: annotations through a merge patch carrying only the changed
//! keys, the finalizer through a JSON patch guarded by `test` operations,
//! `atProvider` and conditions through the status subresource.
//!
//! Writes only happen for parts that differ from the last persisted copy.
//! Metadata written by other actors in the meantime is left alone.

use crate::constants::{FIELD_MANAGER, FINALIZER};
use crate::crd::ManagedResource;
use crate::error::Result;
use async_trait::async_trait;
use json_patch::jsonptr::PointerBuf;
use json_patch::{AddOperation, PatchOperation, RemoveOperation, TestOperation};
use kube::api::{Api, ApiResource, DynamicObject, Patch, PatchParams};
use kube::Client;
use serde_json::{json, Map, Value};
use std::collections::BTreeSet;
use tracing::debug;

/// Persists reconciler-owned state of a managed resource
#[async_trait]
pub trait StatusWriter: Send + Sync {
    /// Persist annotations and finalizers that differ from `persisted`
    async fn persist_metadata(&self, mr: &ManagedResource, persisted: &ManagedResource)
        -> Result<()>;

    /// Persist `status.atProvider` and `status.conditions`
    async fn persist_status(&self, mr: &ManagedResource) -> Result<()>;
}

/// Write whatever changed in `mr` since `persisted`, then remember `mr` as persisted
pub async fn persist_changes(
    writer: &dyn StatusWriter,
    mr: &ManagedResource,
    persisted: &mut ManagedResource,
) -> Result<()> {
    if mr.metadata.annotations != persisted.metadata.annotations
        || mr.metadata.finalizers != persisted.metadata.finalizers
    {
        writer.persist_metadata(mr, persisted).await?;
    }
    if mr.at_provider != persisted.at_provider || mr.conditions != persisted.conditions {
        writer.persist_status(mr).await?;
    }
    persisted.clone_from(mr);
    Ok(())
}

/// Merge patch setting the annotations that changed since `persisted`
///
/// Removed keys are sent as `null`; untouched keys are not sent at all.
#[must_use]
pub fn annotation_patch(mr: &ManagedResource, persisted: &ManagedResource) -> Option<Value> {
    let empty = std::collections::BTreeMap::new();
    let after = mr.metadata.annotations.as_ref().unwrap_or(&empty);
    let before = persisted.metadata.annotations.as_ref().unwrap_or(&empty);

    let keys: BTreeSet<&String> = after.keys().chain(before.keys()).collect();
    let changed: Map<String, Value> = keys
        .into_iter()
        .filter(|key| after.get(*key) != before.get(*key))
        .map(|key| {
            let value = after.get(key).map_or(Value::Null, |v| Value::String(v.clone()));
            (key.clone(), value)
        })
        .collect();

    if changed.is_empty() {
        None
    } else {
        Some(json!({"metadata": {"annotations": changed}}))
    }
}

/// JSON patch adding or removing this provider's finalizer
///
/// Other finalizers are never rewritten. Appending to an existing list is
/// unconditional; creating the list is guarded on the resourceVersion that
/// was read, and removal is guarded on the finalizer still being at the
/// index it was read at.
#[must_use]
pub fn finalizer_ops(mr: &ManagedResource, persisted: &ManagedResource) -> Vec<PatchOperation> {
    let before = persisted.metadata.finalizers.as_deref().unwrap_or_default();
    let had = before.iter().any(|f| f == FINALIZER);
    let has = mr.has_finalizer();

    match (had, has) {
        (false, true) if before.is_empty() => {
            let mut ops = Vec::new();
            if let Some(version) = &persisted.metadata.resource_version {
                ops.push(PatchOperation::Test(TestOperation {
                    path: PointerBuf::from_tokens(["metadata", "resourceVersion"]),
                    value: Value::String(version.clone()),
                }));
            }
            ops.push(PatchOperation::Add(AddOperation {
                path: PointerBuf::from_tokens(["metadata", "finalizers"]),
                value: json!([FINALIZER]),
            }));
            ops
        }
        (false, true) => vec![PatchOperation::Add(AddOperation {
            path: PointerBuf::from_tokens(["metadata", "finalizers", "-"]),
            value: Value::String(FINALIZER.to_string()),
        })],
        (true, false) => {
            let Some(index) = before.iter().position(|f| f == FINALIZER) else {
                return Vec::new();
            };
            let index = index.to_string();
            let path = PointerBuf::from_tokens(["metadata", "finalizers", index.as_str()]);
            vec![
                PatchOperation::Test(TestOperation {
                    path: path.clone(),
                    value: Value::String(FINALIZER.to_string()),
                }),
                PatchOperation::Remove(RemoveOperation { path }),
            ]
        }
        _ => Vec::new(),
    }
}

/// [`StatusWriter`] backed by the Kubernetes API
#[derive(Clone)]
pub struct KubeStatusWriter {
    api: Api<DynamicObject>,
}

impl std::fmt::Debug for KubeStatusWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KubeStatusWriter").finish_non_exhaustive()
    }
}

impl KubeStatusWriter {
    #[must_use]
    pub fn new(client: Client, ar: &ApiResource, namespace: Option<&str>) -> Self {
        let api = match namespace {
            Some(ns) => Api::namespaced_with(client, ns, ar),
            None => Api::all_with(client, ar),
        };
        Self { api }
    }
}

#[async_trait]
impl StatusWriter for KubeStatusWriter {
    async fn persist_metadata(&self, mr: &ManagedResource, persisted: &ManagedResource) -> Result<()> {
        let params = PatchParams::apply(FIELD_MANAGER);
        if let Some(patch) = annotation_patch(mr, persisted) {
            self.api.patch(mr.name(), &params, &Patch::Merge(&patch)).await?;
        }
        let ops = finalizer_ops(mr, persisted);
        if !ops.is_empty() {
            self.api
                .patch(mr.name(), &params, &Patch::Json::<()>(json_patch::Patch(ops)))
                .await?;
        }
        debug!(resource = %mr.display_ref(), external_id = %mr.external_id(), "Persisted metadata");
        Ok(())
    }

    async fn persist_status(&self, mr: &ManagedResource) -> Result<()> {
        let patch = json!({
            "status": {
                "atProvider": mr.at_provider,
                "conditions": mr.conditions,
            }
        });
        self.api
            .patch_status(mr.name(), &PatchParams::apply(FIELD_MANAGER), &Patch::Merge(&patch))
            .await?;
        debug!(resource = %mr.display_ref(), "Persisted status");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crd::Condition;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingWriter {
        writes: Mutex<Vec<&'static str>>,
    }

    #[async_trait]
    impl StatusWriter for RecordingWriter {
        async fn persist_metadata(
            &self,
            _mr: &ManagedResource,
            _persisted: &ManagedResource,
        ) -> Result<()> {
            self.writes.lock().unwrap().push("metadata");
            Ok(())
        }

        async fn persist_status(&self, _mr: &ManagedResource) -> Result<()> {
            self.writes.lock().unwrap().push("status");
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_unchanged_resource_is_not_written() {
        let writer = RecordingWriter::default();
        let mr = ManagedResource::default();
        let mut persisted = mr.clone();

        persist_changes(&writer, &mr, &mut persisted).await.unwrap();
        assert!(writer.writes.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_only_changed_parts_are_written() {
        let writer = RecordingWriter::default();
        let mut mr = ManagedResource::default();
        let mut persisted = mr.clone();

        mr.set_condition(Condition::creating());
        persist_changes(&writer, &mr, &mut persisted).await.unwrap();
        mr.set_external_id("42");
        persist_changes(&writer, &mr, &mut persisted).await.unwrap();
        persist_changes(&writer, &mr, &mut persisted).await.unwrap();

        assert_eq!(*writer.writes.lock().unwrap(), vec!["status", "metadata"]);
    }

    fn ops_json(ops: Vec<PatchOperation>) -> Value {
        serde_json::to_value(json_patch::Patch(ops)).unwrap()
    }

    #[test]
    fn test_annotation_patch_sends_only_changed_keys() {
        let mut persisted = ManagedResource::default();
        persisted.metadata.annotations = Some(
            [("team".to_string(), "catalog".to_string())].into_iter().collect(),
        );
        let mut mr = persisted.clone();
        mr.set_external_id("42");

        assert_eq!(
            annotation_patch(&mr, &persisted),
            Some(json!({"metadata": {"annotations": {"external-id": "42"}}}))
        );
        assert_eq!(annotation_patch(&mr, &mr), None);
    }

    #[test]
    fn test_finalizer_is_appended_next_to_foreign_ones() {
        let mut persisted = ManagedResource::default();
        persisted.metadata.finalizers = Some(vec!["example.com/other".to_string()]);
        let mut mr = persisted.clone();
        mr.add_finalizer();

        assert_eq!(
            ops_json(finalizer_ops(&mr, &persisted)),
            json!([{"op": "add", "path": "/metadata/finalizers/-", "value": FINALIZER}])
        );
    }

    #[test]
    fn test_first_finalizer_is_guarded_by_resource_version() {
        let mut persisted = ManagedResource::default();
        persisted.metadata.resource_version = Some("7".to_string());
        let mut mr = persisted.clone();
        mr.add_finalizer();

        assert_eq!(
            ops_json(finalizer_ops(&mr, &persisted)),
            json!([
                {"op": "test", "path": "/metadata/resourceVersion", "value": "7"},
                {"op": "add", "path": "/metadata/finalizers", "value": [FINALIZER]}
            ])
        );
    }

    #[test]
    fn test_finalizer_removal_is_guarded_by_index() {
        let mut persisted = ManagedResource::default();
        persisted.metadata.finalizers =
            Some(vec!["example.com/other".to_string(), FINALIZER.to_string()]);
        let mut mr = persisted.clone();
        mr.remove_finalizer();

        assert_eq!(
            ops_json(finalizer_ops(&mr, &persisted)),
            json!([
                {"op": "test", "path": "/metadata/finalizers/1", "value": FINALIZER},
                {"op": "remove", "path": "/metadata/finalizers/1"}
            ])
        );
        assert!(finalizer_ops(&mr, &mr).is_empty());
    }
}
