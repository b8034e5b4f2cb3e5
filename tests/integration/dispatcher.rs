//! Resource lifecycle through the dispatcher.

use crate::common::*;
use scim_engine::error::{ValidationError, ValidationErrors};
use scim_engine::resource::RequestValidator;
use scim_engine::schema::{EndpointOperation, ResourceTypeFeatures};
use scim_engine::{
    Document, RequestContext, ScimOperationHandler, ScimOperationRequest, ScimOperationType,
    ScimQuery,
};
use serde_json::json;

#[tokio::test]
async fn test_create_returns_location_and_hides_password() {
    let (handler, store) = operation_handler();

    let response = create(&handler, "/Users", full_user("bjensen")).await;
    let id = id_of(&response);
    let body = response.data.as_ref().unwrap();

    assert!(response.success);
    assert_eq!(
        response.metadata.location.as_deref(),
        Some(format!("{}/Users/{}", BASE_URL, id).as_str())
    );
    assert!(response.metadata.etag.as_deref().unwrap().starts_with("W/\""));
    assert_eq!(body["id"], id.as_str());
    assert_eq!(body["meta"]["resourceType"], "User");
    assert_eq!(body[ENTERPRISE_SCHEMA]["employeeNumber"], "701984");
    assert!(body.get("password").is_none());

    // the handler still received the password
    assert_eq!(store.snapshot("User")[0]["password"], "t1meMa$heen");
}

#[tokio::test]
async fn test_client_supplied_read_only_values_are_dropped() {
    let (handler, _) = operation_handler();
    let mut body = user("bjensen");
    body["id"] = json!("chosen-by-client");
    body["meta"] = json!({"resourceType": "Group", "created": "2001-01-01T00:00:00Z"});

    let response = create(&handler, "/Users", body).await;
    let data = response.data.unwrap();
    assert_ne!(data["id"], "chosen-by-client");
    assert_eq!(data["meta"]["resourceType"], "User");
}

#[tokio::test]
async fn test_validation_failure_is_400_with_scim_error_body() {
    let (handler, store) = operation_handler();

    let response = handler
        .handle_operation(ScimOperationRequest::create(
            "/Users",
            json!({"schemas": [USER_SCHEMA], "active": "yes"}),
        ))
        .await;

    assert!(!response.success);
    assert_eq!(response.status, 400);
    let body = response.data.unwrap();
    assert_eq!(body["schemas"][0], "urn:ietf:params:scim:api:messages:2.0:Error");
    assert_eq!(body["status"], "400");
    assert!(body["detail"].as_str().unwrap().contains("userName"));
    assert_eq!(store.count("User"), 0);
}

#[tokio::test]
async fn test_uniqueness_conflict() {
    let (handler, _) = operation_handler();
    create(&handler, "/Users", user("bjensen")).await;

    let response = handler
        .handle_operation(ScimOperationRequest::create("/Users", user("bjensen")))
        .await;
    assert_eq!(response.status, 409);
    assert_eq!(response.error_code.as_deref(), Some("uniqueness"));
}

#[tokio::test]
async fn test_get_with_attribute_projection() {
    let (handler, _) = operation_handler();
    let id = id_of(&create(&handler, "/Users", full_user("bjensen")).await);

    let response = handler
        .handle_operation(
            ScimOperationRequest::get("/Users", &id)
                .with_query(ScimQuery::new().with_attributes(["userName", "name.familyName"])),
        )
        .await;
    assert_eq!(response.status, 200);
    let body = response.data.unwrap();
    assert_eq!(body["id"], id.as_str());
    assert_eq!(body["userName"], "bjensen");
    assert_eq!(body["name"]["familyName"], "Jensen");
    assert!(body["name"].get("givenName").is_none());
    assert!(body.get("emails").is_none());

    let response = handler
        .handle_operation(
            ScimOperationRequest::get("/Users", &id)
                .with_query(ScimQuery::new().with_excluded_attributes(["emails", "id"])),
        )
        .await;
    let body = response.data.unwrap();
    assert!(body.get("emails").is_none());
    // id is always returned
    assert_eq!(body["id"], id.as_str());
    assert_eq!(body["displayName"], "Babs Jensen");
}

#[tokio::test]
async fn test_replace_and_delete() {
    let (handler, store) = operation_handler();
    let id = id_of(&create(&handler, "/Users", user("bjensen")).await);

    let mut replacement = user("bjensen");
    replacement["displayName"] = json!("Babs");
    let response = handler
        .handle_operation(ScimOperationRequest::replace("/Users", &id, replacement))
        .await;
    assert_eq!(response.status, 200);
    assert_eq!(response.data.as_ref().unwrap()["displayName"], "Babs");
    assert_eq!(response.data.as_ref().unwrap()["id"], id.as_str());

    let response = handler
        .handle_operation(ScimOperationRequest::delete("/Users", &id))
        .await;
    assert_eq!(response.status, 204);
    assert!(response.data.is_none());
    assert_eq!(store.count("User"), 0);

    let response = handler
        .handle_operation(ScimOperationRequest::get("/Users", &id))
        .await;
    assert_eq!(response.status, 404);
    assert_eq!(response.metadata.resource_id.as_deref(), Some(id.as_str()));
}

#[tokio::test]
async fn test_unknown_endpoint_and_missing_resource() {
    let (handler, _) = operation_handler();

    let response = handler
        .handle_operation(ScimOperationRequest::list("/Devices"))
        .await;
    assert_eq!(response.status, 404);

    let response = handler
        .handle_operation(ScimOperationRequest::delete("/Groups", "missing"))
        .await;
    assert_eq!(response.status, 404);
}

#[tokio::test]
async fn test_from_http_routes_requests() {
    let (handler, _) = operation_handler();

    let request = ScimOperationRequest::from_http("POST", "/Groups", Some(group("Tour Guides", &[])))
        .unwrap();
    assert_eq!(request.operation, ScimOperationType::Create);
    let response = handler.handle_operation(request).await;
    assert_eq!(response.status, 201);
    let id = id_of(&response);

    let request = ScimOperationRequest::from_http("GET", &format!("/Groups/{}", id), None).unwrap();
    assert_eq!(request.operation, ScimOperationType::Get);
    let response = handler.handle_operation(request).await;
    assert_eq!(response.data.unwrap()["displayName"], "Tour Guides");

    assert!(ScimOperationRequest::from_http("TRACE", "/Groups", None).is_err());
}

#[tokio::test]
async fn test_request_id_is_echoed() {
    let (handler, _) = operation_handler();
    let response = handler
        .handle_operation(ScimOperationRequest::list("/Users").with_request_id("req-42"))
        .await;
    assert_eq!(response.metadata.request_id, "req-42");
}

#[tokio::test]
async fn test_disabled_operations_are_rejected() {
    init_logging();
    let store = InMemoryHandler::new();
    let features = ResourceTypeFeatures::default()
        .disable(EndpointOperation::Create)
        .disable(EndpointOperation::Delete);
    let handler = ScimOperationHandler::new(
        builder(store.clone())
            .with_registry(user_registry(features))
            .build()
            .unwrap(),
    );

    let response = handler
        .handle_operation(ScimOperationRequest::create("/Users", user("bjensen")))
        .await;
    assert!(!response.success);
    assert_eq!(response.status, 501);
    assert_eq!(response.data.as_ref().unwrap()["status"], "501");
    assert_eq!(store.count("User"), 0);

    let response = handler
        .handle_operation(ScimOperationRequest::delete("/Users", "00000001"))
        .await;
    assert_eq!(response.status, 501);

    // the remaining operations stay available
    let response = handler
        .handle_operation(ScimOperationRequest::list("/Users"))
        .await;
    assert_eq!(response.status, 200);
    let response = handler
        .handle_operation(ScimOperationRequest::get("/Users", "00000001"))
        .await;
    assert_eq!(response.status, 404);
}

/// Reserved names, no renames, and the first user can neither be read nor
/// deleted.
struct UserRules;

fn user_name(document: &Document) -> Option<&str> {
    document.attributes().scalar("userName").and_then(|value| value.as_str())
}

impl RequestValidator for UserRules {
    fn validate_create(&self, document: &Document, _: &RequestContext, errors: &mut ValidationErrors) {
        if user_name(document) == Some("root") {
            errors.push(ValidationError::custom("userName 'root' is reserved"));
        }
    }

    fn validate_get(&self, id: &str, _: &RequestContext, errors: &mut ValidationErrors) {
        if id == "00000001" {
            errors.push(ValidationError::custom("user 00000001 is hidden"));
        }
    }

    fn validate_update(
        &self,
        existing: &Document,
        updated: &Document,
        _: &RequestContext,
        errors: &mut ValidationErrors,
    ) {
        if user_name(existing) != user_name(updated) {
            errors.push(ValidationError::custom("userName cannot be changed"));
        }
    }

    fn validate_delete(&self, id: &str, _: &RequestContext, errors: &mut ValidationErrors) {
        if id == "00000001" {
            errors.push(ValidationError::custom("user 00000001 cannot be deleted"));
        }
    }
}

#[tokio::test]
async fn test_request_validator_rejects_with_bad_request() {
    init_logging();
    let store = InMemoryHandler::new();
    let handler = ScimOperationHandler::new(
        builder(store.clone())
            .with_request_validator("User", UserRules)
            .build()
            .unwrap(),
    );

    let response = handler
        .handle_operation(ScimOperationRequest::create("/Users", user("root")))
        .await;
    assert_eq!(response.status, 400);
    let body = response.data.as_ref().unwrap();
    assert_eq!(body["scimType"], "invalidValue");
    assert!(body["detail"].as_str().unwrap().contains("reserved"));
    assert_eq!(store.count("User"), 0);

    let id = id_of(&create(&handler, "/Users", user("alice")).await);
    assert_eq!(id, "00000001");

    let response = handler
        .handle_operation(ScimOperationRequest::get("/Users", &id))
        .await;
    assert_eq!(response.status, 400);

    let response = handler
        .handle_operation(ScimOperationRequest::replace(
            "/Users",
            &id,
            json!({"schemas": [USER_SCHEMA], "userName": "mallory"}),
        ))
        .await;
    assert_eq!(response.status, 400);
    let response = handler
        .handle_operation(ScimOperationRequest::patch(
            "/Users",
            &id,
            patch_body(json!([{"op": "replace", "path": "userName", "value": "mallory"}])),
        ))
        .await;
    assert_eq!(response.status, 400);
    assert_eq!(store.snapshot("User")[0]["userName"], "alice");

    // updates that keep the userName pass
    let response = handler
        .handle_operation(ScimOperationRequest::patch(
            "/Users",
            &id,
            patch_body(json!([{"op": "add", "path": "displayName", "value": "Alice"}])),
        ))
        .await;
    assert_eq!(response.status, 200);

    let response = handler
        .handle_operation(ScimOperationRequest::delete("/Users", &id))
        .await;
    assert_eq!(response.status, 400);
    assert_eq!(store.count("User"), 1);

    // other resource types are unaffected
    create(&handler, "/Groups", group("root", &[])).await;
}

#[test]
fn test_request_validator_for_unknown_resource_type() {
    let result = builder(InMemoryHandler::new())
        .with_request_validator("Device", UserRules)
        .build();
    assert!(result.is_err());
}
