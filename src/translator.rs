//! # Resource Translator
//!
//! Moves managed resources between their untyped JSON tree and the
//! [`ManagedResource`] view, and compares desired against observed
//! attributes without compiled knowledge of a kind's schema.

use crate::crd::{Attributes, Condition, DeletionPolicy, ManagedResource, ProviderConfigRef};
use crate::error::{ProviderError, Result};
use kube::api::{ApiResource, DynamicObject};
use serde_json::{json, Map, Value};

/// Untyped JSON object returned by the Magento API
pub type ExternalResource = Map<String, Value>;

const SPEC_KEYS: [&str; 3] = ["forProvider", "providerConfigRef", "deletionPolicy"];
const STATUS_KEYS: [&str; 2] = ["atProvider", "conditions"];

/// Render a managed resource as its untyped tree
#[must_use]
pub fn to_untyped(mr: &ManagedResource) -> Value {
    let mut spec = mr.spec_extra.clone();
    spec.insert("forProvider".to_string(), Value::Object(mr.for_provider.clone()));
    spec.insert(
        "providerConfigRef".to_string(),
        json!({ "name": mr.provider_config_ref.name }),
    );
    spec.insert("deletionPolicy".to_string(), json!(mr.deletion_policy));

    let mut status = mr.status_extra.clone();
    status.insert("atProvider".to_string(), Value::Object(mr.at_provider.clone()));
    status.insert("conditions".to_string(), json!(mr.conditions));

    json!({
        "apiVersion": mr.api_version,
        "kind": mr.kind,
        "metadata": mr.metadata,
        "spec": spec,
        "status": status,
    })
}

/// Populate `mr` from an untyped tree
///
/// `kind` and `status.atProvider` are required. Nothing is written to `mr`
/// unless the whole tree is usable.
pub fn from_untyped(tree: &Value, mr: &mut ManagedResource) -> Result<()> {
    let kind = tree
        .get("kind")
        .and_then(Value::as_str)
        .ok_or_else(|| ProviderError::ShapeMismatch("kind".to_string()))?;
    let at_provider = at_provider(tree)
        .ok_or_else(|| ProviderError::ShapeMismatch("status.atProvider".to_string()))?;

    let metadata = match tree.get("metadata") {
        Some(meta) => serde_json::from_value(meta.clone())
            .map_err(|e| ProviderError::ShapeMismatch(format!("metadata ({e})")))?,
        None => Default::default(),
    };

    let spec = tree.get("spec").and_then(Value::as_object);
    let provider_config_ref = match spec.and_then(|s| s.get("providerConfigRef")) {
        Some(r) => serde_json::from_value::<ProviderConfigRef>(r.clone()).map_err(|e| {
            ProviderError::ShapeMismatch(format!("spec.providerConfigRef ({e})"))
        })?,
        None => ProviderConfigRef::default(),
    };
    let deletion_policy = match spec.and_then(|s| s.get("deletionPolicy")) {
        Some(p) => serde_json::from_value::<DeletionPolicy>(p.clone())
            .map_err(|e| ProviderError::ShapeMismatch(format!("spec.deletionPolicy ({e})")))?,
        None => DeletionPolicy::default(),
    };

    let status = tree.get("status").and_then(Value::as_object);
    let conditions = match status.and_then(|s| s.get("conditions")) {
        Some(Value::Null) | None => Vec::new(),
        Some(c) => serde_json::from_value::<Vec<Condition>>(c.clone())
            .map_err(|e| ProviderError::ShapeMismatch(format!("status.conditions ({e})")))?,
    };

    mr.api_version = tree
        .get("apiVersion")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    mr.kind = kind.to_string();
    mr.metadata = metadata;
    mr.for_provider = for_provider(tree).cloned().unwrap_or_default();
    mr.at_provider = at_provider.clone();
    mr.conditions = conditions;
    mr.provider_config_ref = provider_config_ref;
    mr.deletion_policy = deletion_policy;
    mr.spec_extra = without_keys(spec, &SPEC_KEYS);
    mr.status_extra = without_keys(status, &STATUS_KEYS);
    Ok(())
}

fn without_keys(object: Option<&Map<String, Value>>, keys: &[&str]) -> Attributes {
    object
        .map(|o| {
            o.iter()
                .filter(|(k, _)| !keys.contains(&k.as_str()))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect()
        })
        .unwrap_or_default()
}

/// Read a managed resource delivered by the watch
///
/// Objects that were never reconciled have no `status`; they get an empty
/// `atProvider` here so the strict translation above applies to them too.
pub fn from_dynamic(obj: &DynamicObject, ar: &ApiResource) -> Result<ManagedResource> {
    let mut tree = serde_json::to_value(obj)
        .map_err(|e| ProviderError::ShapeMismatch(format!("object ({e})")))?;
    let root = tree
        .as_object_mut()
        .ok_or_else(|| ProviderError::ShapeMismatch("object".to_string()))?;

    root.entry("apiVersion")
        .or_insert_with(|| Value::String(ar.api_version.clone()));
    root.entry("kind")
        .or_insert_with(|| Value::String(ar.kind.clone()));

    let status = root
        .entry("status")
        .or_insert_with(|| Value::Object(Map::new()));
    if !status.is_object() {
        *status = Value::Object(Map::new());
    }
    if let Some(status) = status.as_object_mut() {
        let at_provider = status
            .entry("atProvider")
            .or_insert_with(|| Value::Object(Map::new()));
        if !at_provider.is_object() {
            *at_provider = Value::Object(Map::new());
        }
    }

    let mut mr = ManagedResource::default();
    from_untyped(&tree, &mut mr)?;
    Ok(mr)
}

/// `spec.forProvider` of an untyped tree
#[must_use]
pub fn for_provider(tree: &Value) -> Option<&Attributes> {
    tree.get("spec")?.get("forProvider")?.as_object()
}

/// `status.atProvider` of an untyped tree
#[must_use]
pub fn at_provider(tree: &Value) -> Option<&Attributes> {
    tree.get("status")?.get("atProvider")?.as_object()
}

/// Render the `id` of an external resource as a string
pub fn external_id_of(resource: &ExternalResource) -> Result<String> {
    match resource.get("id") {
        Some(Value::Number(n)) => Ok(n.to_string()),
        Some(Value::String(s)) if !s.is_empty() => Ok(s.clone()),
        _ => Err(ProviderError::ShapeMismatch("id".to_string())),
    }
}

/// Compare desired attributes against observed ones over `fields`
///
/// Fields the desired side does not set are skipped, except `name`, which
/// is always compared. Stops at the first mismatch.
#[must_use]
pub fn is_up_to_date(observed: &Attributes, desired: &Attributes, fields: &[&str]) -> bool {
    fields.iter().all(|field| {
        let wanted = desired.get(*field);
        if wanted.is_none() && *field != "name" {
            return true;
        }
        values_match(observed.get(*field), wanted)
    })
}

/// Scalars match across representations: `2`, `2.0` and `"2"` are equal,
/// and `true` equals `"1"`
fn values_match(observed: Option<&Value>, desired: Option<&Value>) -> bool {
    match (observed, desired) {
        (None | Some(Value::Null), None | Some(Value::Null)) => true,
        (Some(a), Some(b)) if a == b => true,
        (Some(a), Some(b)) => {
            if let (Some(x), Some(y)) = (scalar_number(a), scalar_number(b)) {
                if (x - y).abs() < f64::EPSILON {
                    return true;
                }
            }
            match (scalar_text(a), scalar_text(b)) {
                (Some(a), Some(b)) => a == b,
                _ => false,
            }
        }
        _ => false,
    }
}

fn scalar_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(true) => Some("1".to_string()),
        Value::Bool(false) => Some("0".to_string()),
        _ => None,
    }
}
