//! Core operation handler infrastructure
//!
//! This module contains the request/response types and the dispatcher that
//! routes a transport-agnostic request to the resource, discovery or bulk
//! handlers.

use crate::ScimServer;
use crate::error::{ScimError, ScimResult};
use crate::resource::{Authorization, RequestContext, ResourceHandler};
use crate::scim_server::BulkTransactionMode;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Framework-agnostic operation handler for SCIM operations
///
/// This handler provides a structured interface for performing SCIM operations
/// without being tied to any specific transport layer.
pub struct ScimOperationHandler<H> {
    pub(super) server: ScimServer<H>,
}

/// Structured request for SCIM operations
///
/// This type encapsulates all the information needed to perform a SCIM operation
/// in a transport-agnostic way.
#[derive(Debug, Clone)]
pub struct ScimOperationRequest {
    /// The type of operation to perform
    pub operation: ScimOperationType,
    /// Endpoint the request targets (e.g. "/Users", "/Schemas", "/Bulk")
    pub endpoint: String,
    /// Resource ID for operations that target a specific resource
    pub resource_id: Option<String>,
    /// Request body
    pub data: Option<Value>,
    /// Query parameters for list and read operations
    pub query: Option<ScimQuery>,
    /// `If-Match` header value
    pub if_match: Option<String>,
    /// Request ID for tracing and correlation
    pub request_id: Option<String>,
    /// Caller identity forwarded to handlers
    pub authorization: Option<Arc<dyn Authorization>>,
}

/// Types of SCIM operations supported by the handler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScimOperationType {
    /// POST to a resource endpoint
    Create,
    /// GET of a single resource
    Get,
    /// GET of a collection
    List,
    /// PUT
    Replace,
    /// PATCH
    Patch,
    /// DELETE
    Delete,
    /// POST to `/Bulk`
    Bulk,
}

impl ScimOperationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Get => "get",
            Self::List => "list",
            Self::Replace => "replace",
            Self::Patch => "patch",
            Self::Delete => "delete",
            Self::Bulk => "bulk",
        }
    }

    /// Map an HTTP method and path to an operation.
    pub fn from_method(method: &str, endpoint: &str, has_id: bool) -> ScimResult<Self> {
        let operation = match method.to_ascii_uppercase().as_str() {
            "GET" if has_id => Self::Get,
            "GET" => Self::List,
            "POST" if endpoint.trim_matches('/').eq_ignore_ascii_case("Bulk") => Self::Bulk,
            "POST" => Self::Create,
            "PUT" => Self::Replace,
            "PATCH" => Self::Patch,
            "DELETE" => Self::Delete,
            other => {
                return Err(ScimError::invalid_syntax(format!(
                    "Unsupported HTTP method '{}'",
                    other
                )));
            }
        };
        Ok(operation)
    }
}

impl fmt::Display for ScimOperationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Query parameters for list and read operations
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ScimQuery {
    /// Filter expression
    pub filter: Option<String>,
    pub sort_by: Option<String>,
    /// `ascending` or `descending`
    pub sort_order: Option<String>,
    /// 1-based index of the first result
    pub start_index: Option<usize>,
    /// Maximum number of results to return
    pub count: Option<usize>,
    /// Attributes to include in results
    pub attributes: Vec<String>,
    /// Attributes to exclude from results
    pub excluded_attributes: Vec<String>,
}

impl ScimQuery {
    /// Build a query from decoded query-string parameters. Parameter names
    /// are matched case-insensitively; unknown parameters are ignored.
    pub fn from_params<I, K, V>(params: I) -> ScimResult<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut query = Self::default();
        for (key, value) in params {
            let value = value.as_ref();
            match key.as_ref().to_ascii_lowercase().as_str() {
                "filter" => query.filter = Some(value.to_string()),
                "sortby" => query.sort_by = Some(value.to_string()),
                "sortorder" => query.sort_order = Some(value.to_string()),
                "startindex" => query.start_index = Some(parse_number("startIndex", value)?),
                "count" => query.count = Some(parse_number("count", value)?),
                "attributes" => query.attributes = split_list(value),
                "excludedattributes" => query.excluded_attributes = split_list(value),
                _ => {}
            }
        }
        Ok(query)
    }
}

fn parse_number(name: &str, value: &str) -> ScimResult<usize> {
    // Negative values are treated like 0 (RFC 7644 §3.4.2.4)
    match value.trim().parse::<i64>() {
        Ok(number) => Ok(usize::try_from(number).unwrap_or(0)),
        Err(_) => Err(ScimError::invalid_value(format!(
            "'{}' is not a valid {}",
            value, name
        ))),
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

/// Structured response from SCIM operations
///
/// This type provides a consistent response format across all operation types
/// and transport layers.
#[derive(Debug, Clone, PartialEq)]
pub struct ScimOperationResponse {
    /// Whether the operation succeeded
    pub success: bool,
    /// HTTP status code
    pub status: u16,
    /// Response body: the resource, list response or error response
    pub data: Option<Value>,
    /// Error detail if the operation failed
    pub error: Option<String>,
    /// SCIM `scimType` if the operation failed with one
    pub error_code: Option<String>,
    pub metadata: OperationMetadata,
}

impl ScimOperationResponse {
    pub(crate) fn success(status: u16, data: Option<Value>, metadata: OperationMetadata) -> Self {
        Self {
            success: true,
            status,
            data,
            error: None,
            error_code: None,
            metadata,
        }
    }
}

/// Metadata about a SCIM operation
#[derive(Debug, Clone, PartialEq, Default)]
pub struct OperationMetadata {
    /// Resource type involved in the operation
    pub resource_type: Option<String>,
    /// Resource ID if applicable
    pub resource_id: Option<String>,
    /// `Location` header value
    pub location: Option<String>,
    /// `ETag` header value
    pub etag: Option<String>,
    /// Number of resources returned (for list operations)
    pub resource_count: Option<usize>,
    /// Total number of resources available (for pagination)
    pub total_results: Option<usize>,
    /// Request ID for tracing
    pub request_id: String,
}

impl OperationMetadata {
    pub fn for_request(request_id: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            ..Self::default()
        }
    }
}

impl<H: ResourceHandler> ScimOperationHandler<H> {
    /// Create a new operation handler with the given SCIM server.
    pub fn new(server: ScimServer<H>) -> Self {
        Self { server }
    }

    /// Handle a structured SCIM operation request.
    ///
    /// This is the main entry point. The dispatched work runs inside the
    /// server's transaction scope; failures are rendered as SCIM error
    /// responses after the scope has seen them.
    pub async fn handle_operation(&self, request: ScimOperationRequest) -> ScimOperationResponse {
        let request_id = request
            .request_id
            .clone()
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

        info!(
            "SCIM operation handler processing {} on {} (request: '{}')",
            request.operation, request.endpoint, request_id
        );

        let context = self.create_request_context(&request, &request_id);
        let scoped = !(request.operation == ScimOperationType::Bulk
            && self.server.config().bulk_transaction_mode == BulkTransactionMode::PerOperation);

        let work = Box::pin(self.dispatch(request, &context));
        let result = if scoped {
            self.server.transaction_scope().around(&context, work).await
        } else {
            work.await
        };

        match &result {
            Ok(response) => {
                debug!(
                    "SCIM operation handler completed with status {} (request: '{}')",
                    response.status, request_id
                );
            }
            Err(e) => {
                warn!(
                    "SCIM operation handler failed: {} (request: '{}')",
                    e, request_id
                );
            }
        }

        result.unwrap_or_else(|e| super::errors::create_error_response(e, request_id))
    }

    async fn dispatch(
        &self,
        request: ScimOperationRequest,
        context: &RequestContext,
    ) -> ScimResult<ScimOperationResponse> {
        match request.operation {
            ScimOperationType::Bulk => super::handlers::bulk::handle_bulk(self, request, context).await,
            _ => self.dispatch_resource(request, context).await,
        }
    }

    /// Dispatch one non-bulk request. Bulk operations come through here.
    pub(crate) async fn dispatch_resource(
        &self,
        request: ScimOperationRequest,
        context: &RequestContext,
    ) -> ScimResult<ScimOperationResponse> {
        if let Some(endpoint) = super::handlers::schema::DiscoveryEndpoint::parse(&request.endpoint) {
            return super::handlers::schema::handle_discovery(self, endpoint, request, context);
        }

        match request.operation {
            ScimOperationType::Create => {
                super::handlers::crud::handle_create(self, request, context).await
            }
            ScimOperationType::Get => super::handlers::crud::handle_get(self, request, context).await,
            ScimOperationType::Replace => {
                super::handlers::crud::handle_replace(self, request, context).await
            }
            ScimOperationType::Patch => {
                super::handlers::crud::handle_patch(self, request, context).await
            }
            ScimOperationType::Delete => {
                super::handlers::crud::handle_delete(self, request, context).await
            }
            ScimOperationType::List => {
                super::handlers::query::handle_list(self, request, context).await
            }
            ScimOperationType::Bulk => Err(ScimError::invalid_syntax(
                "Bulk requests cannot be nested",
            )),
        }
    }

    /// Create a RequestContext from the operation request.
    pub(super) fn create_request_context(
        &self,
        request: &ScimOperationRequest,
        request_id: &str,
    ) -> RequestContext {
        let context = RequestContext::new(request_id);
        match &request.authorization {
            Some(authorization) => context.with_authorization(Arc::clone(authorization)),
            None => context,
        }
    }

    /// Get access to the underlying SCIM server.
    pub fn server(&self) -> &ScimServer<H> {
        &self.server
    }
}
