//! # Category
//!
//! Typed schema of the `Category` kind. The reconciler handles categories
//! through the untyped path like every other kind; this type exists so the
//! CRD carries a real OpenAPI schema and so the field names used on the
//! wire are written down in one place.

use super::condition::Condition;
use super::managed::{DeletionPolicy, ProviderConfigRef};
use kube::CustomResource;
use schemars::{JsonSchema, Schema, SchemaGenerator};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::borrow::Cow;

/// Category Custom Resource Definition
///
/// # Example
///
/// ```yaml
/// apiVersion: magento.web7.md/v1alpha1
/// kind: Category
/// metadata:
///   name: shoes
/// spec:
///   forProvider:
///     name: Shoes
///     is_active: true
///     include_in_menu: true
///     parent_id: 2
/// ```
#[derive(CustomResource, Debug, Clone, Deserialize, Serialize, JsonSchema)]
#[kube(
    group = "magento.web7.md",
    version = "v1alpha1",
    kind = "Category",
    status = "CategoryStatus",
    category = "crossplane",
    category = "managed",
    category = "magento",
    printcolumn = r#"{"name":"READY", "type":"string", "jsonPath":".status.conditions[?(@.type==\"Ready\")].status"}"#,
    printcolumn = r#"{"name":"SYNCED", "type":"string", "jsonPath":".status.conditions[?(@.type==\"Synced\")].status"}"#,
    printcolumn = r#"{"name":"EXTERNAL-ID", "type":"string", "jsonPath":".metadata.annotations.external-id"}"#,
    printcolumn = r#"{"name":"AGE", "type":"date", "jsonPath":".metadata.creationTimestamp"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct CategorySpec {
    pub for_provider: CategoryParameters,
    #[serde(default)]
    pub provider_config_ref: ProviderConfigRef,
    #[serde(default)]
    pub deletion_policy: DeletionPolicy,
}

/// Configurable fields of a category, named as the Magento API names them
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
pub struct CategoryParameters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub available_sort_by: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include_in_menu: Option<bool>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub custom_attributes: Vec<CustomAttribute>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
pub struct CustomAttribute {
    pub attribute_code: String,
    pub value: String,
}

/// Observable fields of a category
///
/// `atProvider` mirrors whatever `categories/list` returns, so the schema
/// keeps unknown fields and the typed fields are only the common ones.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct CategoryObservation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_count: Option<i64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl JsonSchema for CategoryObservation {
    fn schema_name() -> Cow<'static, str> {
        Cow::Borrowed("CategoryObservation")
    }

    fn json_schema(_gen: &mut SchemaGenerator) -> Schema {
        schemars::json_schema!({
            "type": "object",
            "description": "Category as last observed in Magento",
            "x-kubernetes-preserve-unknown-fields": true
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CategoryStatus {
    #[serde(default)]
    pub conditions: Vec<Condition>,
    #[serde(default)]
    pub at_provider: CategoryObservation,
}

#[cfg(test)]
mod tests {
    use super::*;
    use kube::{CustomResourceExt, Resource};

    #[test]
    fn test_category_crd_is_cluster_scoped() {
        let crd = Category::crd();
        assert_eq!(crd.spec.scope, "Cluster");
        assert_eq!(crd.spec.names.plural, "categories");
        assert_eq!(Category::group(&()), "magento.web7.md");
    }

    #[test]
    fn test_category_parameters_use_magento_field_names() {
        let params = CategoryParameters {
            name: Some("Shoes".to_string()),
            include_in_menu: Some(true),
            parent_id: Some(2),
            ..Default::default()
        };
        let value = serde_json::to_value(&params).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"name": "Shoes", "include_in_menu": true, "parent_id": 2})
        );
    }

    #[test]
    fn test_at_provider_keeps_unknown_fields() {
        let crd = serde_json::to_value(Category::crd()).unwrap();
        let at_provider = crd
            .pointer("/spec/versions/0/schema/openAPIV3Schema/properties/status/properties/atProvider")
            .unwrap();
        assert_eq!(at_provider["x-kubernetes-preserve-unknown-fields"], serde_json::json!(true));
        assert!(at_provider.get("properties").is_none());
    }
}
