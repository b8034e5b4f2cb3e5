//! Sequential execution of bulk operations.
//!
//! Operations run strictly in request order. A `POST` records the id of the
//! resource it created under its `bulkId`; later operations may refer to it
//! as `bulkId:<id>` in their path or anywhere inside their data. An
//! operation whose references lead back to its own `bulkId` fails with `409`.

use super::request::{BulkMethod, BulkOperation, BulkOperationResult, BulkRequest, BulkResponse};
use crate::error::{ERROR_RESPONSE_URI, ScimError, ScimResult};
use crate::operation_handler::{
    ScimOperationHandler, ScimOperationRequest, ScimOperationResponse, ScimOperationType,
    create_error_response,
};
use crate::operation_handler::split_path;
use crate::resource::{RequestContext, ResourceHandler};
use crate::scim_server::BulkTransactionMode;
use log::{debug, warn};
use serde_json::{Value, json};
use std::collections::{HashMap, HashSet};

const BULK_ID_PREFIX: &str = "bulkId:";

/// What happened to the operation that declared a `bulkId`.
#[derive(Debug, Clone, PartialEq, Eq)]
enum BulkOutcome {
    Created(String),
    Failed,
}

/// Per-request state: resolved `bulkId`s and the failure count.
#[derive(Debug, Default)]
struct BulkRequestContext {
    outcomes: HashMap<String, BulkOutcome>,
    /// Declared `bulkId` to the `bulkId`s its operation refers to
    references: HashMap<String, HashSet<String>>,
    failures: usize,
    budget: Option<usize>,
}

impl BulkRequestContext {
    fn new(budget: Option<usize>) -> Self {
        Self {
            budget,
            ..Self::default()
        }
    }

    fn record_references(&mut self, operations: &[BulkOperation]) {
        for operation in operations {
            let Some(bulk_id) = &operation.bulk_id else {
                continue;
            };
            let mut referenced = HashSet::new();
            collect_references(&operation.path, &mut referenced);
            if let Some(data) = &operation.data {
                collect_value_references(data, &mut referenced);
            }
            self.references
                .entry(bulk_id.clone())
                .or_default()
                .extend(referenced);
        }
    }

    /// The `bulkId` whose reference closes a cycle back to `bulk_id`.
    fn circular_reference(&self, bulk_id: &str) -> Option<String> {
        let mut visited = HashSet::new();
        let mut pending = vec![bulk_id];
        while let Some(current) = pending.pop() {
            for next in self.references.get(current).into_iter().flatten() {
                if next == bulk_id {
                    return Some(current.to_string());
                }
                if visited.insert(next.as_str()) {
                    pending.push(next.as_str());
                }
            }
        }
        None
    }

    fn budget_exhausted(&self) -> bool {
        self.budget.is_some_and(|budget| self.failures > budget)
    }

    fn resolve(&self, bulk_id: &str) -> ScimResult<&str> {
        match self.outcomes.get(bulk_id) {
            Some(BulkOutcome::Created(id)) => Ok(id.as_str()),
            _ => Err(ScimError::UnresolvedBulkId {
                bulk_id: bulk_id.to_string(),
            }),
        }
    }

    /// Replace every `bulkId:<id>` in `text` with the resolved resource id.
    fn substitute(&self, text: &str) -> ScimResult<String> {
        let mut result = String::with_capacity(text.len());
        let mut rest = text;
        while let Some((before, bulk_id, after)) = next_reference(rest) {
            result.push_str(before);
            result.push_str(self.resolve(bulk_id)?);
            rest = after;
        }
        result.push_str(rest);
        Ok(result)
    }

    fn substitute_value(&self, value: &mut Value) -> ScimResult<()> {
        match value {
            Value::String(text) if text.contains(BULK_ID_PREFIX) => {
                *text = self.substitute(text)?;
            }
            Value::Array(items) => {
                for item in items {
                    self.substitute_value(item)?;
                }
            }
            Value::Object(map) => {
                for item in map.values_mut() {
                    self.substitute_value(item)?;
                }
            }
            _ => {}
        }
        Ok(())
    }
}

/// Split `text` around its first `bulkId:<id>` token.
fn next_reference(text: &str) -> Option<(&str, &str, &str)> {
    let start = text.find(BULK_ID_PREFIX)?;
    let tail = &text[start + BULK_ID_PREFIX.len()..];
    let end = tail
        .find(|c: char| c == '"' || c == '/' || c == ']' || c.is_whitespace())
        .unwrap_or(tail.len());
    Some((&text[..start], &tail[..end], &tail[end..]))
}

fn collect_references(text: &str, into: &mut HashSet<String>) {
    let mut rest = text;
    while let Some((_, bulk_id, after)) = next_reference(rest) {
        into.insert(bulk_id.to_string());
        rest = after;
    }
}

fn collect_value_references(value: &Value, into: &mut HashSet<String>) {
    match value {
        Value::String(text) => collect_references(text, into),
        Value::Array(items) => items
            .iter()
            .for_each(|item| collect_value_references(item, into)),
        Value::Object(map) => map
            .values()
            .for_each(|item| collect_value_references(item, into)),
        _ => {}
    }
}

/// Runs the operations of one bulk request against a dispatcher.
pub struct BulkOrchestrator<'a, H> {
    handler: &'a ScimOperationHandler<H>,
    context: &'a RequestContext,
}

impl<'a, H: ResourceHandler> BulkOrchestrator<'a, H> {
    pub fn new(handler: &'a ScimOperationHandler<H>, context: &'a RequestContext) -> Self {
        Self { handler, context }
    }

    /// Check the request against the configured bulk limits.
    pub fn check_limits(&self, request: &BulkRequest, payload: &Value) -> ScimResult<()> {
        let bulk = &self.handler.server().config().service_provider.bulk;
        if !bulk.supported {
            return Err(ScimError::unsupported_operation("Bulk", "bulk"));
        }
        if request.operations.len() > bulk.max_operations {
            return Err(ScimError::TooMany {
                message: format!(
                    "Bulk request contains {} operations, the maximum is {}",
                    request.operations.len(),
                    bulk.max_operations
                ),
            });
        }
        let size = serde_json::to_vec(payload)?.len();
        if size > bulk.max_payload_size {
            return Err(ScimError::TooMany {
                message: format!(
                    "Bulk request payload of {} bytes exceeds the maximum of {}",
                    size, bulk.max_payload_size
                ),
            });
        }
        Ok(())
    }

    /// Execute every operation in order and collect the results.
    pub async fn run(&self, request: BulkRequest) -> BulkResponse {
        let mut state = BulkRequestContext::new(request.error_budget());
        state.record_references(&request.operations);
        let mut operations = Vec::with_capacity(request.operations.len());

        for (index, operation) in request.operations.into_iter().enumerate() {
            if state.budget_exhausted() {
                debug!(
                    "Skipping bulk operation {} (request: '{}'): failOnErrors exceeded",
                    index, self.context.request_id
                );
                operations.push(not_executed(operation, state.failures));
                continue;
            }

            let result = self.execute(operation, &mut state).await;
            debug!(
                "Bulk operation {} {} finished with status {} (request: '{}')",
                index, result.method, result.status, self.context.request_id
            );
            if !result.is_success() {
                state.failures += 1;
            }
            operations.push(result);
        }

        if state.failures > 0 {
            warn!(
                "Bulk request '{}' finished with {} failed operations",
                self.context.request_id, state.failures
            );
        }
        BulkResponse { operations }
    }

    async fn execute(
        &self,
        mut operation: BulkOperation,
        state: &mut BulkRequestContext,
    ) -> BulkOperationResult {
        let method = match operation.method.parse::<BulkMethod>() {
            Ok(method) => method,
            Err(e) => return self.failure(operation.method, operation.bulk_id, None, e),
        };

        if method == BulkMethod::Post
            && operation.bulk_id.as_deref().is_none_or(|id| id.trim().is_empty())
        {
            operation.bulk_id = Some(uuid::Uuid::new_v4().to_string());
        }
        let bulk_id = operation.bulk_id.clone();

        let outcome = match self.prepare(method, operation, state) {
            Ok(request) => {
                let location = request.resource_id.as_deref().map(|id| {
                    self.handler
                        .server()
                        .config()
                        .location(&request.endpoint, id)
                });
                (self.dispatch(request).await, location)
            }
            Err(e) => (Err(e), None),
        };

        match outcome {
            (Ok(response), _) => {
                if let (BulkMethod::Post, Some(bulk_id), Some(id)) =
                    (method, &bulk_id, &response.metadata.resource_id)
                {
                    state
                        .outcomes
                        .insert(bulk_id.clone(), BulkOutcome::Created(id.clone()));
                }
                BulkOperationResult {
                    method: method.to_string(),
                    bulk_id,
                    location: response.metadata.location,
                    version: response.metadata.etag,
                    status: response.status,
                    response: None,
                }
            }
            (Err(e), location) => {
                if let (BulkMethod::Post, Some(bulk_id)) = (method, &bulk_id) {
                    state.outcomes.insert(bulk_id.clone(), BulkOutcome::Failed);
                }
                // A failed POST has no resource to point at
                let location = location.filter(|_| method != BulkMethod::Post);
                self.failure(method.to_string(), bulk_id, location, e)
            }
        }
    }

    /// Resolve `bulkId` references and turn the operation into a dispatcher
    /// request.
    fn prepare(
        &self,
        method: BulkMethod,
        operation: BulkOperation,
        state: &BulkRequestContext,
    ) -> ScimResult<ScimOperationRequest> {
        if let Some(bulk_id) = &operation.bulk_id {
            if let Some(other) = state.circular_reference(bulk_id) {
                return Err(ScimError::conflict(format!(
                    "the bulkIds '{}' and '{}' form a direct or indirect circular reference that cannot be resolved",
                    bulk_id, other
                )));
            }
        }
        let path = state.substitute(&operation.path)?;
        let (endpoint, resource_id) = split_path(&path)?;

        let data = match operation.data {
            Some(mut data) => {
                state.substitute_value(&mut data)?;
                Some(data)
            }
            None => None,
        };

        let kind = match method {
            BulkMethod::Post => ScimOperationType::Create,
            BulkMethod::Put => ScimOperationType::Replace,
            BulkMethod::Patch => ScimOperationType::Patch,
            BulkMethod::Delete => ScimOperationType::Delete,
        };

        Ok(ScimOperationRequest {
            operation: kind,
            endpoint,
            resource_id,
            data,
            query: None,
            if_match: operation.version,
            request_id: Some(self.context.request_id.clone()),
            authorization: self.context.authorization.clone(),
        })
    }

    async fn dispatch(&self, request: ScimOperationRequest) -> ScimResult<ScimOperationResponse> {
        let server = self.handler.server();
        let work = Box::pin(self.handler.dispatch_resource(request, self.context));
        match server.config().bulk_transaction_mode {
            BulkTransactionMode::PerOperation => {
                server.transaction_scope().around(self.context, work).await
            }
            BulkTransactionMode::WholeRequest => work.await,
        }
    }

    fn failure(
        &self,
        method: String,
        bulk_id: Option<String>,
        location: Option<String>,
        error: ScimError,
    ) -> BulkOperationResult {
        let response = create_error_response(error, self.context.request_id.clone());
        BulkOperationResult {
            method,
            bulk_id,
            location,
            version: None,
            status: response.status,
            response: Some(response.data.unwrap_or(Value::Null)),
        }
    }
}

fn not_executed(operation: BulkOperation, failures: usize) -> BulkOperationResult {
    let method = operation
        .method
        .parse::<BulkMethod>()
        .map(|m| m.to_string())
        .unwrap_or(operation.method);
    BulkOperationResult {
        method,
        bulk_id: operation.bulk_id,
        location: None,
        version: None,
        status: 412,
        response: Some(json!({
            "schemas": [ERROR_RESPONSE_URI],
            "status": "412",
            "detail": format!(
                "Operation not executed: failOnErrors exceeded after {} failures",
                failures
            ),
        })),
    }
}
