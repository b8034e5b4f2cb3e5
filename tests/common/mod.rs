//! Shared test utilities: an in-memory [`ResourceHandler`] and fixtures.

#![allow(dead_code)]

use scim_engine::resource::{Document, ListQuery, ListResult, RequestContext, ResourceHandler};
use scim_engine::schema::{ResourceType, ResourceTypeFeatures, SchemaRegistry, embedded};
use scim_engine::{
    ScimError, ScimOperationHandler, ScimOperationRequest, ScimOperationResponse, ScimServer,
    ScimServerBuilder,
};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};

pub const USER_SCHEMA: &str = "urn:ietf:params:scim:schemas:core:2.0:User";
pub const GROUP_SCHEMA: &str = "urn:ietf:params:scim:schemas:core:2.0:Group";
pub const ENTERPRISE_SCHEMA: &str = "urn:ietf:params:scim:schemas:extension:enterprise:2.0:User";
pub const PATCH_SCHEMA: &str = "urn:ietf:params:scim:api:messages:2.0:PatchOp";
pub const BULK_SCHEMA: &str = "urn:ietf:params:scim:api:messages:2.0:BulkRequest";
pub const BASE_URL: &str = "https://example.com/v2";

/// Resources per resource type name, in insertion order.
#[derive(Debug, Clone, Default)]
pub struct InMemoryHandler {
    resources: Arc<Mutex<HashMap<String, Vec<Document>>>>,
    next_id: Arc<Mutex<u64>>,
    /// When set, `list` claims to have paged the result itself
    reported_total: Option<usize>,
}

impl InMemoryHandler {
    pub fn new() -> Self {
        Self::default()
    }

    /// A handler whose list results are already filtered, sorted and paged,
    /// out of `total` matches.
    pub fn reporting_total(mut self, total: usize) -> Self {
        self.reported_total = Some(total);
        self
    }

    pub fn count(&self, resource_type: &str) -> usize {
        self.snapshot(resource_type).len()
    }

    pub fn snapshot(&self, resource_type: &str) -> Vec<Value> {
        self.resources
            .lock()
            .unwrap()
            .get(resource_type)
            .map(|documents| documents.iter().map(Document::to_json).collect())
            .unwrap_or_default()
    }

    fn documents(&self, resource_type: &str) -> Vec<Document> {
        self.resources
            .lock()
            .unwrap()
            .get(resource_type)
            .cloned()
            .unwrap_or_default()
    }
}

fn user_name(document: &Document) -> Option<String> {
    document
        .attributes()
        .scalar("userName")
        .and_then(|value| value.as_str())
        .map(str::to_lowercase)
}

impl ResourceHandler for InMemoryHandler {
    type Error = ScimError;

    fn create(
        &self,
        resource_type: &ResourceType,
        mut document: Document,
        _context: &RequestContext,
    ) -> impl Future<Output = Result<Document, Self::Error>> + Send {
        let result = {
            let mut resources = self.resources.lock().unwrap();
            let bucket = resources.entry(resource_type.name.clone()).or_default();
            let name = user_name(&document);
            if name.is_some() && bucket.iter().any(|d| user_name(d) == name) {
                Err(ScimError::uniqueness("userName is already in use"))
            } else {
                let mut next_id = self.next_id.lock().unwrap();
                *next_id += 1;
                document.set_id(resource_type, format!("{:08x}", *next_id));
                bucket.push(document.clone());
                Ok(document)
            }
        };
        async move { result }
    }

    fn get(
        &self,
        resource_type: &ResourceType,
        id: &str,
        _context: &RequestContext,
    ) -> impl Future<Output = Result<Option<Document>, Self::Error>> + Send {
        let found = self
            .documents(&resource_type.name)
            .into_iter()
            .find(|d| d.id() == Some(id));
        async move { Ok(found) }
    }

    fn list(
        &self,
        resource_type: &ResourceType,
        _query: &ListQuery,
        _context: &RequestContext,
    ) -> impl Future<Output = Result<ListResult, Self::Error>> + Send {
        let documents = self.documents(&resource_type.name);
        let result = match self.reported_total {
            Some(total) => ListResult::page(documents, total),
            None => ListResult::complete(documents),
        };
        async move { Ok(result) }
    }

    fn update(
        &self,
        resource_type: &ResourceType,
        id: &str,
        document: Document,
        _context: &RequestContext,
    ) -> impl Future<Output = Result<Document, Self::Error>> + Send {
        let result = {
            let mut resources = self.resources.lock().unwrap();
            let bucket = resources.entry(resource_type.name.clone()).or_default();
            match bucket.iter_mut().find(|d| d.id() == Some(id)) {
                Some(slot) => {
                    *slot = document.clone();
                    Ok(document)
                }
                None => Err(ScimError::resource_not_found(&resource_type.name, id)),
            }
        };
        async move { result }
    }

    fn delete(
        &self,
        resource_type: &ResourceType,
        id: &str,
        _context: &RequestContext,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send {
        let result = {
            let mut resources = self.resources.lock().unwrap();
            let bucket = resources.entry(resource_type.name.clone()).or_default();
            let before = bucket.len();
            bucket.retain(|d| d.id() != Some(id));
            if bucket.len() < before {
                Ok(())
            } else {
                Err(ScimError::resource_not_found(&resource_type.name, id))
            }
        };
        async move { result }
    }
}

/// Install `env_logger` once; `RUST_LOG` selects the level.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn builder(handler: InMemoryHandler) -> ScimServerBuilder<InMemoryHandler> {
    ScimServer::builder(handler).with_base_url(BASE_URL)
}

/// Registry with the embedded User resource type registered with `features`.
pub fn user_registry(features: ResourceTypeFeatures) -> SchemaRegistry {
    let parse = |text: &str| serde_json::from_str::<Value>(text).unwrap();
    let mut registry = SchemaRegistry::new();
    registry
        .register_resource_type_with_features(
            &parse(embedded::user_resource_type()),
            &parse(embedded::core_user_schema()),
            &[parse(embedded::enterprise_user_schema())],
            features,
        )
        .unwrap();
    registry
}

/// Operation handler over the embedded User and Group resource types.
pub fn operation_handler() -> (ScimOperationHandler<InMemoryHandler>, InMemoryHandler) {
    init_logging();
    let handler = InMemoryHandler::new();
    let server = builder(handler.clone()).build().unwrap();
    (ScimOperationHandler::new(server), handler)
}

pub fn user(user_name: &str) -> Value {
    json!({
        "schemas": [USER_SCHEMA],
        "userName": user_name,
    })
}

/// RFC 7643 §8.2 style full user.
pub fn full_user(user_name: &str) -> Value {
    json!({
        "schemas": [USER_SCHEMA, ENTERPRISE_SCHEMA],
        "userName": user_name,
        "name": {"givenName": "Barbara", "familyName": "Jensen"},
        "displayName": "Babs Jensen",
        "password": "t1meMa$heen",
        "active": true,
        "emails": [
            {"value": format!("{}@example.com", user_name), "type": "work", "primary": true},
            {"value": format!("{}@jensen.org", user_name), "type": "home"}
        ],
        ENTERPRISE_SCHEMA: {"employeeNumber": "701984", "department": "Tour Operations"}
    })
}

pub fn group(display_name: &str, members: &[&str]) -> Value {
    json!({
        "schemas": [GROUP_SCHEMA],
        "displayName": display_name,
        "members": members.iter().map(|id| json!({"value": id, "type": "User"})).collect::<Vec<_>>(),
    })
}

pub fn patch_body(operations: Value) -> Value {
    json!({
        "schemas": [PATCH_SCHEMA],
        "Operations": operations,
    })
}

/// Create a resource and return the response, asserting success.
pub async fn create(
    handler: &ScimOperationHandler<InMemoryHandler>,
    endpoint: &str,
    body: Value,
) -> ScimOperationResponse {
    let response = handler
        .handle_operation(ScimOperationRequest::create(endpoint, body))
        .await;
    assert_eq!(response.status, 201, "create failed: {:?}", response.data);
    response
}

pub fn id_of(response: &ScimOperationResponse) -> String {
    response.metadata.resource_id.clone().unwrap()
}
