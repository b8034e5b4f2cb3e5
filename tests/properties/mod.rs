//! Property tests for filter evaluation, validation and sorting.

use crate::common::*;
use proptest::prelude::*;
use proptest::sample;
use scim_engine::filter::parse_filter;
use scim_engine::schema::{OperationContext, SchemaRegistry};
use scim_engine::{ScimOperationRequest, ScimQuery};
use serde_json::{Value, json};

fn name_strategy() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9]{0,11}"
}

fn user_strategy() -> impl Strategy<Value = Value> {
    (
        name_strategy(),
        proptest::option::of("[A-Z][a-z]{1,8}( [A-Z][a-z]{1,8})?"),
        proptest::option::of(any::<bool>()),
        proptest::collection::vec((name_strategy(), sample::select(vec!["work", "home"])), 0..3),
    )
        .prop_map(|(user_name, display_name, active, emails)| {
            let mut body = user(&user_name);
            if let Some(display_name) = display_name {
                body["displayName"] = json!(display_name);
            }
            if let Some(active) = active {
                body["active"] = json!(active);
            }
            if !emails.is_empty() {
                body["emails"] = emails
                    .iter()
                    .map(|(local, kind)| json!({"value": format!("{}@example.com", local), "type": kind}))
                    .collect();
            }
            body
        })
}

proptest! {
    #[test]
    fn missing_attribute_never_matches(
        attribute in sample::select(vec!["nickName", "title", "profileUrl", "name.givenName"]),
        operator in sample::select(vec!["eq", "ne", "co", "sw", "ew", "gt", "ge", "lt", "le"]),
        operand in "[a-zA-Z0-9]{0,8}",
        user_name in name_strategy(),
    ) {
        let registry = SchemaRegistry::with_embedded_schemas().unwrap();
        let users = registry.get_resource_type("User").unwrap();
        let document = users.validate(&user(&user_name), OperationContext::Create).unwrap();

        let filter = parse_filter(&format!("{} {} \"{}\"", attribute, operator, operand), users).unwrap();
        prop_assert!(!filter.matches(&document));

        let present = parse_filter(&format!("{} pr", attribute), users).unwrap();
        prop_assert!(!present.matches(&document));
        let absent = parse_filter(&format!("not ({} pr)", attribute), users).unwrap();
        prop_assert!(absent.matches(&document));
    }

    #[test]
    fn validation_is_idempotent(body in user_strategy()) {
        let registry = SchemaRegistry::with_embedded_schemas().unwrap();
        let users = registry.get_resource_type("User").unwrap();

        let once = users.validate(&body, OperationContext::Create).unwrap();
        let twice = users.validate(&once.to_json(), OperationContext::Create).unwrap();
        prop_assert_eq!(once.to_json(), twice.to_json());
    }

    #[test]
    fn user_name_equality_is_case_insensitive(body in user_strategy()) {
        let registry = SchemaRegistry::with_embedded_schemas().unwrap();
        let users = registry.get_resource_type("User").unwrap();
        let document = users.validate(&body, OperationContext::Create).unwrap();
        let user_name = body["userName"].as_str().unwrap().to_uppercase();

        let filter = parse_filter(&format!("userName eq \"{}\"", user_name), users).unwrap();
        prop_assert!(filter.matches(&document));
    }

    #[test]
    fn missing_sort_values_sort_last(
        display_names in proptest::collection::vec(proptest::option::of("[A-Z][a-z]{0,6}"), 1..8),
        descending in any::<bool>(),
    ) {
        let body = tokio_test::block_on(async {
            let (handler, _) = operation_handler();
            for (index, display_name) in display_names.iter().enumerate() {
                let mut body = user(&format!("user{}", index));
                if let Some(display_name) = display_name {
                    body["displayName"] = json!(display_name);
                }
                create(&handler, "/Users", body).await;
            }
            let query = ScimQuery {
                sort_by: Some("displayName".to_string()),
                sort_order: Some(if descending { "descending" } else { "ascending" }.to_string()),
                ..ScimQuery::default()
            };
            let response = handler
                .handle_operation(ScimOperationRequest::list("/Users").with_query(query))
                .await;
            response.data.unwrap()
        });

        let sorted: Vec<Option<String>> = body["Resources"]
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["displayName"].as_str().map(str::to_lowercase))
            .collect();
        prop_assert_eq!(sorted.len(), display_names.len());

        let present = display_names.iter().filter(|d| d.is_some()).count();
        prop_assert!(sorted[..present].iter().all(Option::is_some));
        prop_assert!(sorted[present..].iter().all(Option::is_none));

        let values: Vec<&String> = sorted.iter().flatten().collect();
        for pair in values.windows(2) {
            if descending {
                prop_assert!(pair[0] >= pair[1]);
            } else {
                prop_assert!(pair[0] <= pair[1]);
            }
        }
    }
}
