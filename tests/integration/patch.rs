//! PATCH requests end to end.

use crate::common::*;
use scim_engine::ScimOperationRequest;
use scim_engine::patch::PatchConfig;
use scim_engine::schema_discovery::ServiceProviderConfig;
use scim_engine::ScimOperationHandler;
use serde_json::json;

#[tokio::test]
async fn test_value_path_replace_and_remove() {
    let (handler, store) = operation_handler();
    let id = id_of(&create(&handler, "/Users", full_user("bjensen")).await);

    let response = handler
        .handle_operation(ScimOperationRequest::patch(
            "/Users",
            &id,
            patch_body(json!([
                {"op": "Replace", "path": "emails[type eq \"work\"].value", "value": "babs@example.com"},
                {"op": "remove", "path": "emails[type eq \"home\"]"},
                {"op": "add", "path": "name.middleName", "value": "Jane"}
            ])),
        ))
        .await;
    assert_eq!(response.status, 200, "{:?}", response.data);

    let stored = &store.snapshot("User")[0];
    let emails = stored["emails"].as_array().unwrap();
    assert_eq!(emails.len(), 1);
    assert_eq!(emails[0]["value"], "babs@example.com");
    assert_eq!(stored["name"]["middleName"], "Jane");
    assert_eq!(stored["name"]["givenName"], "Barbara");
}

#[tokio::test]
async fn test_failed_operation_discards_whole_patch() {
    let (handler, store) = operation_handler();
    let id = id_of(&create(&handler, "/Users", user("bjensen")).await);

    let response = handler
        .handle_operation(ScimOperationRequest::patch(
            "/Users",
            &id,
            patch_body(json!([
                {"op": "add", "path": "nickName", "value": "Babs"},
                {"op": "replace", "path": "emails[type eq \"work\"].value", "value": "x@example.com"}
            ])),
        ))
        .await;
    assert_eq!(response.status, 400);
    assert_eq!(response.error_code.as_deref(), Some("noTarget"));
    assert!(store.snapshot("User")[0].get("nickName").is_none());
}

#[tokio::test]
async fn test_patch_error_types() {
    let (handler, _) = operation_handler();
    let id = id_of(&create(&handler, "/Users", user("bjensen")).await);

    let cases = [
        (json!([{"op": "replace", "path": "id", "value": "x"}]), "mutability"),
        (json!([{"op": "remove"}]), "noTarget"),
        (json!([{"op": "replace", "path": "shoeSize", "value": 42}]), "invalidPath"),
        (json!([{"op": "remove", "path": "userName"}]), "mutability"),
        (json!([{"op": "move", "path": "userName"}]), "invalidSyntax"),
    ];
    for (operations, scim_type) in cases {
        let response = handler
            .handle_operation(ScimOperationRequest::patch("/Users", &id, patch_body(operations.clone())))
            .await;
        assert_eq!(response.status, 400, "{}", operations);
        assert_eq!(response.error_code.as_deref(), Some(scim_type), "{}", operations);
    }
}

#[tokio::test]
async fn test_group_member_workarounds() {
    let (handler, store) = operation_handler();
    let group = create(&handler, "/Groups", group("Tour Guides", &["2819c223", "902c246b"])).await;
    let id = id_of(&group);

    let response = handler
        .handle_operation(ScimOperationRequest::patch(
            "/Groups",
            &id,
            patch_body(json!([
                {"op": "remove", "path": "members", "value": [{"value": "2819c223"}]},
                {"op": "add", "path": "members", "value": "5d48a0a8"}
            ])),
        ))
        .await;
    assert_eq!(response.status, 200, "{:?}", response.data);

    let members: Vec<_> = store.snapshot("Group")[0]["members"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["value"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(members, vec!["902c246b", "5d48a0a8"]);
}

#[tokio::test]
async fn test_patch_not_supported() {
    init_logging();
    let mut config = ServiceProviderConfig::default();
    config.patch.supported = false;
    let server = builder(InMemoryHandler::new())
        .with_service_provider_config(config)
        .with_patch_config(PatchConfig::default())
        .build()
        .unwrap();
    let handler = ScimOperationHandler::new(server);
    let id = id_of(&create(&handler, "/Users", user("bjensen")).await);

    let response = handler
        .handle_operation(ScimOperationRequest::patch(
            "/Users",
            &id,
            patch_body(json!([{"op": "add", "path": "nickName", "value": "Babs"}])),
        ))
        .await;
    assert_eq!(response.status, 501);
}
