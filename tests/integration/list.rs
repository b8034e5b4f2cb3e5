//! Filtering, sorting, pagination and projection of list responses.

use crate::common::*;
use scim_engine::schema::ResourceTypeFeatures;
use scim_engine::{ScimOperationHandler, ScimOperationRequest, ScimQuery};
use serde_json::{Value, json};

async fn seeded() -> (ScimOperationHandler<InMemoryHandler>, InMemoryHandler) {
    let (handler, store) = operation_handler();
    seed(&handler).await;
    (handler, store)
}

/// carol, alice, bob and dave, created in that order.
async fn seed(handler: &ScimOperationHandler<InMemoryHandler>) {
    let people = [
        ("carol", Some("Carol"), true, Some("Engineer")),
        ("alice", Some("Alice"), true, None),
        ("bob", None, false, Some("Manager")),
        ("dave", Some("Dave"), true, Some("engineer")),
    ];
    for (user_name, display_name, active, title) in people {
        let mut body = user(user_name);
        body["active"] = json!(active);
        if let Some(display_name) = display_name {
            body["displayName"] = json!(display_name);
        }
        if let Some(title) = title {
            body["title"] = json!(title);
        }
        body["emails"] = json!([{"value": format!("{}@example.com", user_name), "type": "work"}]);
        create(handler, "/Users", body).await;
    }
}

fn user_names(body: &Value) -> Vec<String> {
    body["Resources"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["userName"].as_str().unwrap().to_string())
        .collect()
}

async fn list(handler: &ScimOperationHandler<InMemoryHandler>, query: ScimQuery) -> Value {
    let response = handler
        .handle_operation(ScimOperationRequest::list("/Users").with_query(query))
        .await;
    assert_eq!(response.status, 200, "list failed: {:?}", response.data);
    response.data.unwrap()
}

#[tokio::test]
async fn test_list_response_shape() {
    let (handler, _) = seeded().await;
    let body = list(&handler, ScimQuery::new()).await;

    assert_eq!(
        body["schemas"][0],
        "urn:ietf:params:scim:api:messages:2.0:ListResponse"
    );
    assert_eq!(body["totalResults"], 4);
    assert_eq!(body["startIndex"], 1);
    assert_eq!(body["itemsPerPage"], 4);
    assert_eq!(user_names(&body), vec!["carol", "alice", "bob", "dave"]);
}

#[tokio::test]
async fn test_filter_expressions() {
    let (handler, _) = seeded().await;

    let body = list(&handler, ScimQuery::new().with_filter("title eq \"ENGINEER\"")).await;
    assert_eq!(user_names(&body), vec!["carol", "dave"]);

    let body = list(
        &handler,
        ScimQuery::new().with_filter("active eq true and not (displayName sw \"C\")"),
    )
    .await;
    assert_eq!(user_names(&body), vec!["alice", "dave"]);

    let body = list(&handler, ScimQuery::new().with_filter("emails[value co \"bob@\"]")).await;
    assert_eq!(user_names(&body), vec!["bob"]);

    let body = list(&handler, ScimQuery::new().with_filter("title pr")).await;
    assert_eq!(body["totalResults"], 3);

    // a missing attribute never matches, not even with ne
    let body = list(&handler, ScimQuery::new().with_filter("displayName ne \"Carol\"")).await;
    assert_eq!(user_names(&body), vec!["alice", "dave"]);
}

#[tokio::test]
async fn test_invalid_filter_is_reported() {
    let (handler, _) = seeded().await;
    let response = handler
        .handle_operation(
            ScimOperationRequest::list("/Users")
                .with_query(ScimQuery::new().with_filter("userName eq \"bob\" and")),
        )
        .await;
    assert_eq!(response.status, 400);
    assert_eq!(response.error_code.as_deref(), Some("invalidFilter"));

    let response = handler
        .handle_operation(
            ScimOperationRequest::list("/Users")
                .with_query(ScimQuery::new().with_filter("shoeSize gt 42")),
        )
        .await;
    assert_eq!(response.status, 400);
    assert_eq!(response.error_code.as_deref(), Some("invalidFilter"));
}

#[tokio::test]
async fn test_sort_places_missing_values_last() {
    let (handler, _) = seeded().await;

    let body = list(&handler, ScimQuery::new().with_sort("displayName", "ascending")).await;
    assert_eq!(user_names(&body), vec!["alice", "carol", "dave", "bob"]);

    let body = list(&handler, ScimQuery::new().with_sort("displayName", "descending")).await;
    assert_eq!(user_names(&body), vec!["dave", "carol", "alice", "bob"]);
}

#[tokio::test]
async fn test_pagination() {
    let (handler, _) = seeded().await;

    let body = list(
        &handler,
        ScimQuery::new()
            .with_sort("userName", "ascending")
            .with_pagination(2, 2),
    )
    .await;
    assert_eq!(body["totalResults"], 4);
    assert_eq!(body["startIndex"], 2);
    assert_eq!(body["itemsPerPage"], 2);
    assert_eq!(user_names(&body), vec!["bob", "carol"]);

    let body = list(&handler, ScimQuery::new().with_pagination(1, 0)).await;
    assert_eq!(body["totalResults"], 4);
    assert_eq!(body["itemsPerPage"], 0);

    let body = list(&handler, ScimQuery::new().with_pagination(10, 5)).await;
    assert_eq!(body["itemsPerPage"], 0);
}

#[tokio::test]
async fn test_query_parameters_from_strings() {
    let (handler, _) = seeded().await;
    let query = ScimQuery::from_params([
        ("FILTER", "active eq true"),
        ("sortBy", "userName"),
        ("sortOrder", "descending"),
        ("count", "2"),
        ("attributes", "userName, title"),
    ])
    .unwrap();

    let body = list(&handler, query).await;
    assert_eq!(user_names(&body), vec!["dave", "carol"]);
    let first = &body["Resources"][0];
    assert_eq!(first["title"], "engineer");
    assert!(first.get("emails").is_none());
    assert!(first.get("id").is_some());

    assert!(ScimQuery::from_params([("count", "many")]).is_err());
}

#[tokio::test]
async fn test_unknown_sort_attribute() {
    let (handler, _) = seeded().await;
    let response = handler
        .handle_operation(
            ScimOperationRequest::list("/Users")
                .with_query(ScimQuery::new().with_sort("shoeSize", "ascending")),
        )
        .await;
    assert_eq!(response.status, 400);
    assert_eq!(response.error_code.as_deref(), Some("invalidValue"));
}

#[tokio::test]
async fn test_filter_and_sort_on_meta_attributes() {
    let (handler, _) = seeded().await;

    let body = list(&handler, ScimQuery::new().with_filter("meta.resourceType eq \"User\"")).await;
    assert_eq!(body["totalResults"], 4);

    let body = list(&handler, ScimQuery::new().with_filter("meta.location pr and meta.version pr")).await;
    assert_eq!(body["totalResults"], 4);

    let body = list(
        &handler,
        ScimQuery::new().with_filter(format!("meta.location eq \"{}/Users/00000002\"", BASE_URL)),
    )
    .await;
    assert_eq!(user_names(&body), vec!["alice"]);

    let body = list(&handler, ScimQuery::new().with_sort("meta.location", "descending")).await;
    assert_eq!(user_names(&body), vec!["dave", "bob", "alice", "carol"]);

    let body = list(
        &handler,
        ScimQuery::new()
            .with_filter("meta.resourceType eq \"Group\"")
            .with_sort("meta.location", "ascending"),
    )
    .await;
    assert_eq!(body["totalResults"], 0);
}

#[tokio::test]
async fn test_engine_filtering_and_sorting_can_be_disabled() {
    init_logging();
    let features = ResourceTypeFeatures {
        auto_filtering: false,
        auto_sorting: false,
        ..ResourceTypeFeatures::default()
    };
    let handler = ScimOperationHandler::new(
        builder(InMemoryHandler::new())
            .with_registry(user_registry(features))
            .build()
            .unwrap(),
    );
    seed(&handler).await;

    // the handler ignores the query, so everything comes back in store order
    let body = list(
        &handler,
        ScimQuery::new()
            .with_filter("userName eq \"alice\"")
            .with_sort("userName", "ascending"),
    )
    .await;
    assert_eq!(body["totalResults"], 4);
    assert_eq!(user_names(&body), vec!["carol", "alice", "bob", "dave"]);

    // pagination of a complete result still applies
    let body = list(&handler, ScimQuery::new().with_pagination(2, 2)).await;
    assert_eq!(body["totalResults"], 4);
    assert_eq!(user_names(&body), vec!["alice", "bob"]);

    // the filter is still parsed
    let response = handler
        .handle_operation(
            ScimOperationRequest::list("/Users")
                .with_query(ScimQuery::new().with_filter("userName eq")),
        )
        .await;
    assert_eq!(response.status, 400);
}

#[tokio::test]
async fn test_handler_paged_results_pass_through() {
    init_logging();
    let handler = ScimOperationHandler::new(
        builder(InMemoryHandler::new().reporting_total(42))
            .build()
            .unwrap(),
    );
    seed(&handler).await;

    let body = list(
        &handler,
        ScimQuery::new()
            .with_filter("userName eq \"alice\"")
            .with_sort("userName", "descending")
            .with_pagination(3, 2),
    )
    .await;
    assert_eq!(body["totalResults"], 42);
    assert_eq!(body["startIndex"], 3);
    assert_eq!(body["itemsPerPage"], 4);
    assert_eq!(user_names(&body), vec!["carol", "alice", "bob", "dave"]);
    // the page is still finalized
    assert_eq!(body["Resources"][0]["meta"]["resourceType"], "User");
}
