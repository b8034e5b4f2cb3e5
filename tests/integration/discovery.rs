//! Discovery endpoints.

use crate::common::*;
use scim_engine::{ScimOperationRequest, ScimOperationType};
use serde_json::json;

#[tokio::test]
async fn test_schemas_endpoint() {
    let (handler, _) = operation_handler();

    let response = handler
        .handle_operation(ScimOperationRequest::list("/Schemas"))
        .await;
    assert_eq!(response.status, 200);
    let body = response.data.unwrap();
    assert_eq!(body["totalResults"], 3);
    let ids: Vec<_> = body["Resources"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["id"].as_str().unwrap().to_string())
        .collect();
    assert!(ids.contains(&USER_SCHEMA.to_string()));
    assert!(ids.contains(&ENTERPRISE_SCHEMA.to_string()));

    let response = handler
        .handle_operation(ScimOperationRequest::get("/Schemas", GROUP_SCHEMA))
        .await;
    assert_eq!(response.status, 200);
    let body = response.data.unwrap();
    assert_eq!(body["name"], "Group");
    assert_eq!(
        body["meta"]["location"],
        format!("{}/Schemas/{}", BASE_URL, GROUP_SCHEMA)
    );

    let response = handler
        .handle_operation(ScimOperationRequest::get("/Schemas", "urn:example:nothing"))
        .await;
    assert_eq!(response.status, 404);
}

#[tokio::test]
async fn test_resource_types_endpoint() {
    let (handler, _) = operation_handler();

    let response = handler
        .handle_operation(ScimOperationRequest::list("/ResourceTypes"))
        .await;
    let body = response.data.unwrap();
    assert_eq!(body["totalResults"], 2);

    let response = handler
        .handle_operation(ScimOperationRequest::get("/ResourceTypes", "User"))
        .await;
    assert_eq!(response.status, 200);
    let body = response.data.unwrap();
    assert_eq!(body["endpoint"], "/Users");
    assert_eq!(body["schema"], USER_SCHEMA);
    assert_eq!(body["schemaExtensions"][0]["schema"], ENTERPRISE_SCHEMA);
}

#[tokio::test]
async fn test_service_provider_config_endpoint() {
    let (handler, _) = operation_handler();

    let request = ScimOperationRequest::from_http("GET", "/ServiceProviderConfig", None).unwrap();
    assert_eq!(request.operation, ScimOperationType::List);
    let response = handler.handle_operation(request).await;
    assert_eq!(response.status, 200);
    let body = response.data.unwrap();
    assert_eq!(body["patch"]["supported"], true);
    assert_eq!(body["bulk"]["maxOperations"], 1000);
    assert_eq!(body["etag"]["supported"], true);
}

#[tokio::test]
async fn test_discovery_endpoints_are_read_only() {
    let (handler, _) = operation_handler();

    let response = handler
        .handle_operation(ScimOperationRequest::create("/Schemas", json!({"id": "urn:x"})))
        .await;
    assert_eq!(response.status, 501);

    let response = handler
        .handle_operation(ScimOperationRequest::delete("/ResourceTypes", "User"))
        .await;
    assert_eq!(response.status, 501);

    let response = handler
        .handle_operation(ScimOperationRequest::replace(
            "/ServiceProviderConfig",
            "x",
            json!({}),
        ))
        .await;
    assert_eq!(response.status, 501);
}
