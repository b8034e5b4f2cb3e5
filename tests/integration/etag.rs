//! Versions and conditional requests.

use crate::common::*;
use scim_engine::ScimOperationRequest;
use scim_engine::schema_discovery::ServiceProviderConfig;
use scim_engine::ScimOperationHandler;
use serde_json::json;

#[tokio::test]
async fn test_get_returns_same_etag_as_create() {
    let (handler, _) = operation_handler();
    let created = create(&handler, "/Users", user("bjensen")).await;
    let id = id_of(&created);

    let fetched = handler
        .handle_operation(ScimOperationRequest::get("/Users", &id))
        .await;
    assert_eq!(fetched.metadata.etag, created.metadata.etag);
    assert_eq!(
        fetched.data.unwrap()["meta"]["version"].as_str(),
        created.metadata.etag.as_deref()
    );
}

#[tokio::test]
async fn test_stale_if_match_is_rejected() {
    let (handler, store) = operation_handler();
    let created = create(&handler, "/Users", user("bjensen")).await;
    let id = id_of(&created);
    let original = created.metadata.etag.clone().unwrap();

    let patched = handler
        .handle_operation(
            ScimOperationRequest::patch(
                "/Users",
                &id,
                patch_body(json!([{"op": "add", "path": "nickName", "value": "Babs"}])),
            )
            .with_if_match(&original),
        )
        .await;
    assert_eq!(patched.status, 200);
    let current = patched.metadata.etag.clone().unwrap();
    assert_ne!(current, original);

    let stale = handler
        .handle_operation(
            ScimOperationRequest::replace("/Users", &id, user("bjensen")).with_if_match(&original),
        )
        .await;
    assert_eq!(stale.status, 412);
    assert_eq!(stale.metadata.etag.as_deref(), Some(current.as_str()));
    assert_eq!(store.snapshot("User")[0]["nickName"], "Babs");

    let stale_delete = handler
        .handle_operation(ScimOperationRequest::delete("/Users", &id).with_if_match(&original))
        .await;
    assert_eq!(stale_delete.status, 412);
    assert_eq!(store.count("User"), 1);

    let delete = handler
        .handle_operation(ScimOperationRequest::delete("/Users", &id).with_if_match(&current))
        .await;
    assert_eq!(delete.status, 204);
}

#[tokio::test]
async fn test_wildcard_if_match() {
    let (handler, _) = operation_handler();
    let id = id_of(&create(&handler, "/Users", user("bjensen")).await);

    let response = handler
        .handle_operation(
            ScimOperationRequest::replace("/Users", &id, user("bjensen")).with_if_match("*"),
        )
        .await;
    assert_eq!(response.status, 200);
}

#[tokio::test]
async fn test_etags_disabled_server_wide() {
    init_logging();
    let mut config = ServiceProviderConfig::default();
    config.etag.supported = false;
    let server = builder(InMemoryHandler::new())
        .with_service_provider_config(config)
        .build()
        .unwrap();
    let handler = ScimOperationHandler::new(server);

    let created = create(&handler, "/Users", user("bjensen")).await;
    assert!(created.metadata.etag.is_none());
    assert!(created.data.as_ref().unwrap()["meta"].get("version").is_none());

    // If-Match is ignored when versions are not supported
    let response = handler
        .handle_operation(
            ScimOperationRequest::replace("/Users", &id_of(&created), user("bjensen"))
                .with_if_match("W/\"anything\""),
        )
        .await;
    assert_eq!(response.status, 200);
}
