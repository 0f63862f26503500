//! # Generic Managed CRDs
//!
//! Builds CustomResourceDefinitions for managed kinds that have no typed
//! schema. `forProvider` and `atProvider` preserve unknown fields so any
//! Magento payload can be declared.

use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::{
    CustomResourceColumnDefinition, CustomResourceDefinition, CustomResourceDefinitionNames,
    CustomResourceDefinitionSpec, CustomResourceDefinitionVersion,
    CustomResourceSubresourceStatus, CustomResourceSubresources, CustomResourceValidation,
    JSONSchemaProps, JSONSchemaPropsOrArray, JSON,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use std::collections::BTreeMap;

fn object_schema(properties: BTreeMap<String, JSONSchemaProps>) -> JSONSchemaProps {
    JSONSchemaProps {
        type_: Some("object".to_string()),
        properties: Some(properties),
        ..Default::default()
    }
}

fn string_schema() -> JSONSchemaProps {
    JSONSchemaProps {
        type_: Some("string".to_string()),
        ..Default::default()
    }
}

fn open_object_schema() -> JSONSchemaProps {
    JSONSchemaProps {
        type_: Some("object".to_string()),
        x_kubernetes_preserve_unknown_fields: Some(true),
        ..Default::default()
    }
}

fn condition_list_schema() -> JSONSchemaProps {
    let condition = object_schema(BTreeMap::from([
        ("type".to_string(), string_schema()),
        ("status".to_string(), string_schema()),
        ("lastTransitionTime".to_string(), string_schema()),
        ("reason".to_string(), string_schema()),
        ("message".to_string(), string_schema()),
    ]));
    JSONSchemaProps {
        type_: Some("array".to_string()),
        items: Some(JSONSchemaPropsOrArray::Schema(Box::new(condition))),
        ..Default::default()
    }
}

fn column(name: &str, type_: &str, json_path: &str) -> CustomResourceColumnDefinition {
    CustomResourceColumnDefinition {
        name: name.to_string(),
        type_: type_.to_string(),
        json_path: json_path.to_string(),
        ..Default::default()
    }
}

/// Build a cluster-scoped CRD for a managed kind with an open schema
#[must_use]
pub fn managed_crd(group: &str, version: &str, kind: &str, plural: &str) -> CustomResourceDefinition {
    let spec = object_schema(BTreeMap::from([
        ("forProvider".to_string(), open_object_schema()),
        (
            "providerConfigRef".to_string(),
            object_schema(BTreeMap::from([("name".to_string(), string_schema())])),
        ),
        (
            "deletionPolicy".to_string(),
            JSONSchemaProps {
                type_: Some("string".to_string()),
                enum_: Some(vec![
                    JSON(serde_json::json!("Delete")),
                    JSON(serde_json::json!("Orphan")),
                ]),
                ..Default::default()
            },
        ),
    ]));
    let status = object_schema(BTreeMap::from([
        ("atProvider".to_string(), open_object_schema()),
        ("conditions".to_string(), condition_list_schema()),
    ]));
    let mut root = object_schema(BTreeMap::from([
        ("spec".to_string(), spec),
        ("status".to_string(), status),
    ]));
    root.required = Some(vec!["spec".to_string()]);

    CustomResourceDefinition {
        metadata: ObjectMeta {
            name: Some(format!("{plural}.{group}")),
            ..Default::default()
        },
        spec: CustomResourceDefinitionSpec {
            group: group.to_string(),
            names: CustomResourceDefinitionNames {
                kind: kind.to_string(),
                plural: plural.to_string(),
                singular: Some(kind.to_lowercase()),
                categories: Some(vec![
                    "crossplane".to_string(),
                    "managed".to_string(),
                    "magento".to_string(),
                ]),
                ..Default::default()
            },
            scope: "Cluster".to_string(),
            versions: vec![CustomResourceDefinitionVersion {
                name: version.to_string(),
                served: true,
                storage: true,
                schema: Some(CustomResourceValidation {
                    open_api_v3_schema: Some(root),
                }),
                subresources: Some(CustomResourceSubresources {
                    status: Some(CustomResourceSubresourceStatus(serde_json::json!({}))),
                    ..Default::default()
                }),
                additional_printer_columns: Some(vec![
                    column("READY", "string", ".status.conditions[?(@.type=='Ready')].status"),
                    column("SYNCED", "string", ".status.conditions[?(@.type=='Synced')].status"),
                    column("EXTERNAL-ID", "string", ".metadata.annotations.external-id"),
                    column("AGE", "date", ".metadata.creationTimestamp"),
                ]),
                ..Default::default()
            }],
            ..Default::default()
        },
        status: None,
    }
}
