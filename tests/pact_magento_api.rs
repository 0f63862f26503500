//! Pact contract tests for the Magento REST API
//!
//! These tests define the contract between the provider and the Magento
//! REST API, for the generic per-kind endpoints and the store-scoped
//! category endpoints.

mod common;

use common::{api_resource, base_url, init_rustls, managed_resource, RecordingWriter};
use pact_consumer::prelude::*;
use provider_magento::client::MagentoClient;
use provider_magento::controller::reconciler::{ManagedReconciler, ReconcileOutcome};
use provider_magento::crd::TYPE_READY;
use provider_magento::error::ProviderError;
use provider_magento::external::{CategoryAdapter, ExternalAdapter, GenericAdapter};
use provider_magento::translator::external_id_of;
use serde_json::json;

const CONSUMER: &str = "provider-magento";
const PROVIDER: &str = "Magento-REST-API";
const TOKEN: &str = "test-integration-token";
const AUTHORIZATION: &str = "Bearer test-integration-token";

fn product_adapter(url: &str) -> GenericAdapter {
    let client = MagentoClient::new(url, TOKEN).unwrap();
    GenericAdapter::new(client, &api_resource("Product", "products"))
}

fn category_adapter(url: &str) -> CategoryAdapter {
    let client = MagentoClient::new(url, TOKEN).unwrap();
    CategoryAdapter::new(client, &api_resource("Category", "categories"))
}

#[tokio::test]
async fn test_get_product_contract() {
    init_rustls();
    let mut pact_builder = PactBuilder::new(CONSUMER, PROVIDER);

    pact_builder.interaction("get a product by id", "", |mut i| {
        i.given("product 7 exists");
        i.request
            .method("GET")
            .path("/rest/V1ALPHA1/products/7")
            .header("Authorization", AUTHORIZATION);
        i.response
            .status(200)
            .header("Content-Type", "application/json")
            .json_body(json!({"id": 7, "name": "Tee", "sku": "tee"}));
        i
    });

    let mock_server = pact_builder.start_mock_server(None, None);
    let adapter = product_adapter(&base_url(&mock_server.url()));

    let product = adapter.get("7").await.unwrap();
    assert_eq!(product.get("sku"), Some(&json!("tee")));
    assert_eq!(external_id_of(&product).unwrap(), "7");
}

#[tokio::test]
async fn test_get_missing_product_contract() {
    init_rustls();
    let mut pact_builder = PactBuilder::new(CONSUMER, PROVIDER);

    pact_builder.interaction("get a product that does not exist", "", |mut i| {
        i.given("product 99 does not exist");
        i.request
            .method("GET")
            .path("/rest/V1ALPHA1/products/99")
            .header("Authorization", AUTHORIZATION);
        i.response
            .status(404)
            .header("Content-Type", "application/json")
            .json_body(json!({"message": "The product that was requested doesn't exist."}));
        i
    });

    let mock_server = pact_builder.start_mock_server(None, None);
    let adapter = product_adapter(&base_url(&mock_server.url()));

    let err = adapter.get("99").await.unwrap_err();
    assert!(matches!(err, ProviderError::NotFound { ref id, .. } if id == "99"));
}

#[tokio::test]
async fn test_create_product_contract() {
    init_rustls();
    let mut pact_builder = PactBuilder::new(CONSUMER, PROVIDER);

    pact_builder.interaction("create a product", "", |mut i| {
        i.request
            .method("POST")
            .path("/rest/V1ALPHA1/products")
            .header("Authorization", AUTHORIZATION)
            .json_body(json!({"product": {"name": "Tee", "sku": "tee"}}));
        i.response
            .status(200)
            .header("Content-Type", "application/json")
            .json_body(json!({"id": 7, "name": "Tee", "sku": "tee"}));
        i
    });

    let mock_server = pact_builder.start_mock_server(None, None);
    let adapter = product_adapter(&base_url(&mock_server.url()));

    let desired = managed_resource("Product", "tee", json!({"name": "Tee", "sku": "tee"}));
    let created = adapter.create(&desired).await.unwrap();
    assert_eq!(external_id_of(&created).unwrap(), "7");
}

#[tokio::test]
async fn test_create_rejected_contract() {
    init_rustls();
    let mut pact_builder = PactBuilder::new(CONSUMER, PROVIDER);

    pact_builder.interaction("create a product without a sku", "", |mut i| {
        i.request
            .method("POST")
            .path("/rest/V1ALPHA1/products")
            .header("Authorization", AUTHORIZATION)
            .json_body(json!({"product": {"name": "Tee"}}));
        i.response
            .status(400)
            .header("Content-Type", "application/json")
            .json_body(json!({"message": "The \"sku\" attribute value is empty."}));
        i
    });

    let mock_server = pact_builder.start_mock_server(None, None);
    let adapter = product_adapter(&base_url(&mock_server.url()));

    let desired = managed_resource("Product", "tee", json!({"name": "Tee"}));
    let err = adapter.create(&desired).await.unwrap_err();
    assert!(matches!(err, ProviderError::UnexpectedStatus { status: 400, ref body } if body.contains("sku")));
}

#[tokio::test]
async fn test_update_product_contract() {
    init_rustls();
    let mut pact_builder = PactBuilder::new(CONSUMER, PROVIDER);

    pact_builder.interaction("replace a product", "", |mut i| {
        i.given("product 7 exists");
        i.request
            .method("PUT")
            .path("/rest/V1ALPHA1/products/7")
            .header("Authorization", AUTHORIZATION)
            .json_body(json!({"product": {"name": "Tee v2", "sku": "tee"}}));
        i.response
            .status(200)
            .header("Content-Type", "application/json")
            .json_body(json!({"id": 7, "name": "Tee v2", "sku": "tee"}));
        i
    });

    let mock_server = pact_builder.start_mock_server(None, None);
    let adapter = product_adapter(&base_url(&mock_server.url()));

    let desired = managed_resource("Product", "tee", json!({"name": "Tee v2", "sku": "tee"}));
    adapter.update("7", &desired).await.unwrap();
}

#[tokio::test]
async fn test_delete_product_contract() {
    init_rustls();
    let mut pact_builder = PactBuilder::new(CONSUMER, PROVIDER);

    pact_builder.interaction("delete a product", "", |mut i| {
        i.given("product 7 exists");
        i.request
            .method("DELETE")
            .path("/rest/V1ALPHA1/products/7")
            .header("Authorization", AUTHORIZATION);
        i.response
            .status(200)
            .header("Content-Type", "application/json")
            .json_body(json!(true));
        i
    });

    let mock_server = pact_builder.start_mock_server(None, None);
    let adapter = product_adapter(&base_url(&mock_server.url()));

    adapter.delete("7").await.unwrap();
}

#[tokio::test]
async fn test_get_category_through_search_contract() {
    init_rustls();
    let mut pact_builder = PactBuilder::new(CONSUMER, PROVIDER);

    pact_builder.interaction("search a category by entity id", "", |mut i| {
        i.given("category 42 exists");
        i.request
            .method("GET")
            .path("/rest/default/V1/categories/list")
            .query_param("searchCriteria[filterGroups][0][filters][0][field]", "entity_id")
            .query_param("searchCriteria[filterGroups][0][filters][0][value]", "42")
            .header("Authorization", AUTHORIZATION);
        i.response
            .status(200)
            .header("Content-Type", "application/json")
            .json_body(json!({
                "items": [{"id": 42, "name": "Shoes", "parent_id": 2, "include_in_menu": 1}],
                "total_count": 1
            }));
        i
    });

    let mock_server = pact_builder.start_mock_server(None, None);
    let adapter = category_adapter(&base_url(&mock_server.url()));

    let category = adapter.get("42").await.unwrap();
    assert_eq!(category.get("name"), Some(&json!("Shoes")));

    let desired = managed_resource(
        "Category",
        "shoes",
        json!({"name": "Shoes", "parent_id": "2", "include_in_menu": true}),
    );
    assert!(adapter.is_up_to_date(Some(&category), Some(&desired)).unwrap());
}

#[tokio::test]
async fn test_create_shoes_category_contract() {
    init_rustls();
    let mut pact_builder = PactBuilder::new(CONSUMER, PROVIDER);

    pact_builder
        .interaction("search a category by name", "", |mut i| {
            i.given("no category named Shoes exists");
            i.request
                .method("GET")
                .path("/rest/default/V1/categories/list")
                .query_param("searchCriteria[filterGroups][0][filters][0][field]", "name")
                .query_param("searchCriteria[filterGroups][0][filters][0][value]", "Shoes")
                .header("Authorization", AUTHORIZATION);
            i.response
                .status(200)
                .header("Content-Type", "application/json")
                .json_body(json!({"items": [], "total_count": 0}));
            i
        })
        .interaction("create the Shoes category", "", |mut i| {
            i.given("no category named Shoes exists");
            i.request
                .method("POST")
                .path("/rest/default/V1/categories")
                .header("Authorization", AUTHORIZATION)
                .json_body(json!({"category": {"name": "Shoes"}}));
            i.response
                .status(200)
                .header("Content-Type", "application/json")
                .json_body(json!({"id": 42, "name": "Shoes"}));
            i
        });

    let mock_server = pact_builder.start_mock_server(None, None);
    let adapter = category_adapter(&base_url(&mock_server.url()));
    let writer = RecordingWriter::default();
    let mut mr = managed_resource("Category", "shoes", json!({"name": "Shoes"}));

    let outcome = ManagedReconciler::new(&adapter, &writer)
        .reconcile(&mut mr)
        .await
        .unwrap();

    assert_eq!(outcome, ReconcileOutcome::Created);
    assert_eq!(mr.external_id(), "42");
    let ready = mr.condition(TYPE_READY).unwrap();
    assert_eq!(ready.reason.as_deref(), Some("Available"));
}

#[tokio::test]
async fn test_update_requires_ok_status_contract() {
    init_rustls();
    let mut pact_builder = PactBuilder::new(CONSUMER, PROVIDER);

    pact_builder.interaction("replace a product asynchronously", "", |mut i| {
        i.given("product 7 exists");
        i.request
            .method("PUT")
            .path("/rest/V1ALPHA1/products/7")
            .header("Authorization", AUTHORIZATION)
            .json_body(json!({"product": {"name": "Tee v2", "sku": "tee"}}));
        i.response
            .status(202)
            .header("Content-Type", "application/json")
            .json_body(json!({"message": "queued"}));
        i
    });

    let mock_server = pact_builder.start_mock_server(None, None);
    let adapter = product_adapter(&base_url(&mock_server.url()));

    let desired = managed_resource("Product", "tee", json!({"name": "Tee v2", "sku": "tee"}));
    let err = adapter.update("7", &desired).await.unwrap_err();
    assert!(matches!(err, ProviderError::UnexpectedStatus { status: 202, .. }));
}

#[tokio::test]
async fn test_failed_name_search_does_not_create_contract() {
    init_rustls();
    let mut pact_builder = PactBuilder::new(CONSUMER, PROVIDER);

    pact_builder.interaction("search a category by name while the API is down", "", |mut i| {
        i.given("the category index is unavailable");
        i.request
            .method("GET")
            .path("/rest/default/V1/categories/list")
            .query_param("searchCriteria[filterGroups][0][filters][0][field]", "name")
            .query_param("searchCriteria[filterGroups][0][filters][0][value]", "Shoes")
            .header("Authorization", AUTHORIZATION);
        i.response
            .status(500)
            .header("Content-Type", "application/json")
            .json_body(json!({"message": "Internal Error"}));
        i
    });

    let mock_server = pact_builder.start_mock_server(None, None);
    let adapter = category_adapter(&base_url(&mock_server.url()));
    let writer = RecordingWriter::default();
    let mut mr = managed_resource("Category", "shoes", json!({"name": "Shoes"}));

    let err = ManagedReconciler::new(&adapter, &writer)
        .reconcile(&mut mr)
        .await
        .unwrap_err();

    assert!(matches!(err, ProviderError::UnexpectedStatus { status: 500, .. }));
    assert_eq!(mr.external_id(), "");
}
