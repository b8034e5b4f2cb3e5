//! Request builder utilities for ScimOperationRequest
//!
//! This module provides convenient builder methods for constructing
//! ScimOperationRequest instances for different operation types.

use crate::error::{ScimError, ScimResult};
use crate::operation_handler::core::{ScimOperationRequest, ScimOperationType, ScimQuery};
use crate::resource::Authorization;
use serde_json::Value;
use std::sync::Arc;

impl ScimOperationRequest {
    fn new(operation: ScimOperationType, endpoint: impl Into<String>) -> Self {
        let endpoint: String = endpoint.into();
        let endpoint = if endpoint.starts_with('/') {
            endpoint
        } else {
            format!("/{}", endpoint)
        };
        Self {
            operation,
            endpoint,
            resource_id: None,
            data: None,
            query: None,
            if_match: None,
            request_id: None,
            authorization: None,
        }
    }

    /// Create a new create operation request.
    pub fn create(endpoint: impl Into<String>, data: Value) -> Self {
        Self::new(ScimOperationType::Create, endpoint).with_data(data)
    }

    /// Create a new get operation request.
    pub fn get(endpoint: impl Into<String>, resource_id: impl Into<String>) -> Self {
        Self::new(ScimOperationType::Get, endpoint).with_resource_id(resource_id)
    }

    /// Create a new list operation request.
    pub fn list(endpoint: impl Into<String>) -> Self {
        Self::new(ScimOperationType::List, endpoint)
    }

    /// Create a new replace (PUT) operation request.
    pub fn replace(
        endpoint: impl Into<String>,
        resource_id: impl Into<String>,
        data: Value,
    ) -> Self {
        Self::new(ScimOperationType::Replace, endpoint)
            .with_resource_id(resource_id)
            .with_data(data)
    }

    /// Create a new patch operation request; `data` is the PatchOp message.
    pub fn patch(endpoint: impl Into<String>, resource_id: impl Into<String>, data: Value) -> Self {
        Self::new(ScimOperationType::Patch, endpoint)
            .with_resource_id(resource_id)
            .with_data(data)
    }

    /// Create a new delete operation request.
    pub fn delete(endpoint: impl Into<String>, resource_id: impl Into<String>) -> Self {
        Self::new(ScimOperationType::Delete, endpoint).with_resource_id(resource_id)
    }

    /// Create a new bulk request; `data` is the BulkRequest message.
    pub fn bulk(data: Value) -> Self {
        Self::new(ScimOperationType::Bulk, "/Bulk").with_data(data)
    }

    /// Build a request from an HTTP method and a path relative to the base
    /// URL, e.g. `("PATCH", "/Users/2819c223")`.
    pub fn from_http(method: &str, path: &str, data: Option<Value>) -> ScimResult<Self> {
        let (endpoint, resource_id) = split_path(path)?;
        let operation = ScimOperationType::from_method(method, &endpoint, resource_id.is_some())?;
        let mut request = Self::new(operation, endpoint);
        request.resource_id = resource_id;
        request.data = data;
        Ok(request)
    }

    pub fn with_resource_id(mut self, resource_id: impl Into<String>) -> Self {
        self.resource_id = Some(resource_id.into());
        self
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    /// Add request ID to the request.
    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    /// Add query parameters to the request.
    pub fn with_query(mut self, query: ScimQuery) -> Self {
        self.query = Some(query);
        self
    }

    /// Make the request conditional on the resource's current ETag.
    ///
    /// # Examples
    /// ```rust
    /// use scim_engine::operation_handler::ScimOperationRequest;
    /// use serde_json::json;
    ///
    /// let request = ScimOperationRequest::replace(
    ///     "/Users",
    ///     "123",
    ///     json!({"userName": "updated.name"})
    /// ).with_if_match("W/\"abc123\"");
    /// assert_eq!(request.if_match.as_deref(), Some("W/\"abc123\""));
    /// ```
    pub fn with_if_match(mut self, if_match: impl Into<String>) -> Self {
        self.if_match = Some(if_match.into());
        self
    }

    /// Forward the caller identity to resource handlers.
    pub fn with_authorization(mut self, authorization: Arc<dyn Authorization>) -> Self {
        self.authorization = Some(authorization);
        self
    }
}

/// Split `/Users/2819c223` into the endpoint and the optional resource id.
pub(crate) fn split_path(path: &str) -> ScimResult<(String, Option<String>)> {
    let trimmed = path.trim().trim_matches('/');
    if trimmed.is_empty() {
        return Err(ScimError::invalid_syntax(format!(
            "'{}' does not name an endpoint",
            path
        )));
    }
    match trimmed.split_once('/') {
        Some((_, rest)) if rest.is_empty() || rest.contains('/') => Err(ScimError::invalid_syntax(
            format!("'{}' is not a valid resource path", path),
        )),
        Some((endpoint, id)) => Ok((format!("/{}", endpoint), Some(id.to_string()))),
        None => Ok((format!("/{}", trimmed), None)),
    }
}
