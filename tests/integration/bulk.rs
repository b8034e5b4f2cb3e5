//! Bulk requests.

use crate::common::*;
use futures::future::BoxFuture;
use scim_engine::resource::TransactionScope;
use scim_engine::schema_discovery::ServiceProviderConfig;
use scim_engine::{
    BulkTransactionMode, RequestContext, ScimOperationHandler, ScimOperationRequest,
    ScimOperationResponse, ScimResult,
};
use serde_json::{Value, json};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

fn bulk(operations: Value, fail_on_errors: Option<i64>) -> ScimOperationRequest {
    let mut body = json!({
        "schemas": [BULK_SCHEMA],
        "Operations": operations,
    });
    if let Some(limit) = fail_on_errors {
        body["failOnErrors"] = json!(limit);
    }
    ScimOperationRequest::bulk(body)
}

fn results(response: &ScimOperationResponse) -> Vec<Value> {
    response.data.as_ref().unwrap()["Operations"]
        .as_array()
        .unwrap()
        .clone()
}

#[tokio::test]
async fn test_bulk_id_reference_resolves_to_created_user() {
    let (handler, store) = operation_handler();

    let response = handler
        .handle_operation(bulk(
            json!([
                {"method": "POST", "bulkId": "qwerty", "path": "/Users", "data": user("alice")},
                {"method": "POST", "bulkId": "ytrewq", "path": "/Groups", "data": {
                    "schemas": [GROUP_SCHEMA],
                    "displayName": "Tour Guides",
                    "members": [{"type": "User", "value": "bulkId:qwerty"}]
                }}
            ]),
            None,
        ))
        .await;

    assert_eq!(response.status, 200);
    assert_eq!(
        response.data.as_ref().unwrap()["schemas"][0],
        "urn:ietf:params:scim:api:messages:2.0:BulkResponse"
    );
    let results = results(&response);
    assert_eq!(results.len(), 2);
    assert_eq!(results[0]["bulkId"], "qwerty");
    assert_eq!(results[0]["status"], "201");
    assert_eq!(results[0]["method"], "POST");
    assert!(results[0]["version"].as_str().unwrap().starts_with("W/\""));

    let user_id = store.snapshot("User")[0]["id"].as_str().unwrap().to_string();
    assert_eq!(
        results[0]["location"],
        format!("{}/Users/{}", BASE_URL, user_id)
    );
    assert_eq!(store.snapshot("Group")[0]["members"][0]["value"], user_id.as_str());
}

#[tokio::test]
async fn test_references_in_paths_and_patch_payloads() {
    let (handler, store) = operation_handler();
    let group_id = id_of(&create(&handler, "/Groups", group("Tour Guides", &[])).await);

    let response = handler
        .handle_operation(bulk(
            json!([
                {"method": "post", "bulkId": "u1", "path": "/Users", "data": user("alice")},
                {"method": "patch", "path": format!("/Groups/{}", group_id), "data": patch_body(json!([
                    {"op": "add", "path": "members", "value": [{"value": "bulkId:u1"}]}
                ]))},
                {"method": "put", "path": "/Users/bulkId:u1", "data": {
                    "schemas": [USER_SCHEMA], "userName": "alice", "displayName": "Alice"
                }},
                {"method": "delete", "path": "/Users/bulkId:u1"}
            ]),
            None,
        ))
        .await;

    let results = results(&response);
    let statuses: Vec<_> = results.iter().map(|r| r["status"].as_str().unwrap()).collect();
    assert_eq!(statuses, vec!["201", "200", "200", "204"]);
    assert_eq!(results[1]["method"], "PATCH");

    let user_id = results[0]["location"]
        .as_str()
        .unwrap()
        .rsplit('/')
        .next()
        .unwrap()
        .to_string();
    assert_eq!(
        results[3]["location"],
        format!("{}/Users/{}", BASE_URL, user_id)
    );
    assert_eq!(store.count("User"), 0);
    assert_eq!(store.snapshot("Group")[0]["members"][0]["value"], user_id.as_str());
}

#[tokio::test]
async fn test_unresolved_reference_fails_only_that_operation() {
    let (handler, store) = operation_handler();

    let response = handler
        .handle_operation(bulk(
            json!([
                {"method": "POST", "bulkId": "bad", "path": "/Users", "data": {"schemas": [USER_SCHEMA]}},
                {"method": "POST", "path": "/Groups", "data": {
                    "schemas": [GROUP_SCHEMA],
                    "displayName": "Broken",
                    "members": [{"value": "bulkId:bad"}]
                }},
                {"method": "POST", "path": "/Groups", "data": {
                    "schemas": [GROUP_SCHEMA],
                    "displayName": "Forward",
                    "members": [{"value": "bulkId:later"}]
                }},
                {"method": "POST", "bulkId": "later", "path": "/Users", "data": user("bob")}
            ]),
            None,
        ))
        .await;

    assert_eq!(response.status, 200);
    let results = results(&response);
    assert_eq!(results[0]["status"], "400");
    assert!(results[0].get("location").is_none());
    assert_eq!(results[1]["status"], "400");
    assert_eq!(results[1]["response"]["scimType"], "invalidValue");
    // generated bulkIds are reported back
    assert!(!results[1]["bulkId"].as_str().unwrap().is_empty());
    // forward references are not resolved
    assert_eq!(results[2]["status"], "400");
    assert_eq!(results[3]["status"], "201");
    assert_eq!(store.count("Group"), 0);
    assert_eq!(store.count("User"), 1);
}

#[tokio::test]
async fn test_circular_references_are_conflicts() {
    let (handler, store) = operation_handler();

    let response = handler
        .handle_operation(bulk(
            json!([
                {"method": "POST", "bulkId": "self", "path": "/Groups", "data": {
                    "schemas": [GROUP_SCHEMA],
                    "displayName": "Self",
                    "members": [{"value": "bulkId:self"}]
                }},
                {"method": "POST", "bulkId": "a", "path": "/Groups", "data": {
                    "schemas": [GROUP_SCHEMA],
                    "displayName": "A",
                    "members": [{"value": "bulkId:b"}]
                }},
                {"method": "POST", "bulkId": "b", "path": "/Groups", "data": {
                    "schemas": [GROUP_SCHEMA],
                    "displayName": "B",
                    "members": [{"value": "bulkId:a"}]
                }},
                {"method": "POST", "bulkId": "u", "path": "/Users", "data": user("alice")}
            ]),
            None,
        ))
        .await;

    assert_eq!(response.status, 200);
    let results = results(&response);
    let statuses: Vec<_> = results.iter().map(|r| r["status"].as_str().unwrap()).collect();
    assert_eq!(statuses, vec!["409", "409", "409", "201"]);
    let detail = results[1]["response"]["detail"].as_str().unwrap();
    assert!(detail.contains("'a'") && detail.contains("'b'"), "{}", detail);
    assert!(detail.contains("circular reference"), "{}", detail);
    assert_eq!(store.count("Group"), 0);
    assert_eq!(store.count("User"), 1);
}

#[tokio::test]
async fn test_fail_on_errors_stops_remaining_operations() {
    let (handler, store) = operation_handler();
    let invalid = json!({"schemas": [USER_SCHEMA]});

    let response = handler
        .handle_operation(bulk(
            json!([
                {"method": "POST", "bulkId": "a", "path": "/Users", "data": invalid},
                {"method": "POST", "bulkId": "b", "path": "/Users", "data": invalid},
                {"method": "POST", "bulkId": "c", "path": "/Users", "data": user("carol")}
            ]),
            Some(1),
        ))
        .await;

    assert_eq!(response.status, 200);
    let results = results(&response);
    assert_eq!(results.len(), 3);
    assert_eq!(results[0]["status"], "400");
    assert_eq!(results[1]["status"], "400");
    assert_eq!(results[2]["status"], "412");
    assert_eq!(results[2]["bulkId"], "c");
    assert_eq!(results[2]["response"]["status"], "412");
    assert_eq!(store.count("User"), 0);
}

#[tokio::test]
async fn test_fail_on_errors_below_one_counts_as_one() {
    let (handler, store) = operation_handler();

    let response = handler
        .handle_operation(bulk(
            json!([
                {"method": "DELETE", "path": "/Users/missing-1"},
                {"method": "POST", "path": "/Users", "data": user("alice")},
                {"method": "DELETE", "path": "/Users/missing-2"},
                {"method": "POST", "path": "/Users", "data": user("bob")}
            ]),
            Some(0),
        ))
        .await;

    let statuses: Vec<_> = results(&response)
        .iter()
        .map(|r| r["status"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(statuses, vec!["404", "201", "404", "412"]);
    assert_eq!(store.count("User"), 1);
}

#[tokio::test]
async fn test_invalid_method_and_path() {
    let (handler, _) = operation_handler();

    let response = handler
        .handle_operation(bulk(
            json!([
                {"method": "GET", "path": "/Users"},
                {"method": "POST", "path": "/Users/a/b", "data": user("alice")},
                {"method": "POST", "path": "/Bulk", "data": {}}
            ]),
            None,
        ))
        .await;

    let results = results(&response);
    assert_eq!(results[0]["status"], "400");
    assert_eq!(results[0]["method"], "GET");
    assert_eq!(results[1]["status"], "400");
    // bulk requests do not nest
    assert_eq!(results[2]["status"], "404");
}

#[tokio::test]
async fn test_bulk_limits() {
    init_logging();
    let mut config = ServiceProviderConfig::default();
    config.bulk.max_operations = 2;
    let handler = ScimOperationHandler::new(
        builder(InMemoryHandler::new())
            .with_service_provider_config(config)
            .build()
            .unwrap(),
    );

    let operations = json!([
        {"method": "POST", "path": "/Users", "data": user("a")},
        {"method": "POST", "path": "/Users", "data": user("b")},
        {"method": "POST", "path": "/Users", "data": user("c")}
    ]);
    let response = handler.handle_operation(bulk(operations, None)).await;
    assert_eq!(response.status, 413);
    assert_eq!(response.error_code.as_deref(), Some("tooMany"));

    let mut config = ServiceProviderConfig::default();
    config.bulk.supported = false;
    let handler = ScimOperationHandler::new(
        builder(InMemoryHandler::new())
            .with_service_provider_config(config)
            .build()
            .unwrap(),
    );
    let response = handler
        .handle_operation(bulk(json!([]), None))
        .await;
    assert_eq!(response.status, 501);
}

#[tokio::test]
async fn test_malformed_bulk_request() {
    let (handler, _) = operation_handler();
    let response = handler
        .handle_operation(ScimOperationRequest::bulk(json!({"Operations": []})))
        .await;
    assert_eq!(response.status, 400);
    assert_eq!(response.error_code.as_deref(), Some("invalidSyntax"));
}

#[derive(Debug, Clone, Default)]
struct CountingScope {
    entered: Arc<AtomicUsize>,
}

impl TransactionScope for CountingScope {
    fn around<'a>(
        &'a self,
        _context: &'a RequestContext,
        work: BoxFuture<'a, ScimResult<ScimOperationResponse>>,
    ) -> BoxFuture<'a, ScimResult<ScimOperationResponse>> {
        self.entered.fetch_add(1, Ordering::SeqCst);
        work
    }
}

#[tokio::test]
async fn test_transaction_scope_modes() {
    init_logging();
    let operations = json!([
        {"method": "POST", "path": "/Users", "data": user("a")},
        {"method": "POST", "path": "/Users", "data": user("b")},
        {"method": "POST", "path": "/Users", "data": user("c")}
    ]);

    let scope = CountingScope::default();
    let handler = ScimOperationHandler::new(
        builder(InMemoryHandler::new())
            .with_transaction_scope(scope.clone())
            .build()
            .unwrap(),
    );
    handler.handle_operation(bulk(operations.clone(), None)).await;
    assert_eq!(scope.entered.load(Ordering::SeqCst), 1);

    let scope = CountingScope::default();
    let handler = ScimOperationHandler::new(
        builder(InMemoryHandler::new())
            .with_transaction_scope(scope.clone())
            .with_bulk_transaction_mode(BulkTransactionMode::PerOperation)
            .build()
            .unwrap(),
    );
    handler.handle_operation(bulk(operations, None)).await;
    assert_eq!(scope.entered.load(Ordering::SeqCst), 3);
}
