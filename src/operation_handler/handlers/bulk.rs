//! Bulk operation handler

use crate::{
    ScimError,
    bulk::{BulkOrchestrator, BulkRequest},
    error::ScimResult,
    operation_handler::core::{
        OperationMetadata, ScimOperationHandler, ScimOperationRequest, ScimOperationResponse,
    },
    resource::{RequestContext, ResourceHandler},
};

/// Handle a POST to `/Bulk`.
///
/// Failures of individual operations are reported inside the bulk response;
/// only a malformed or oversized request fails as a whole.
pub async fn handle_bulk<H: ResourceHandler>(
    handler: &ScimOperationHandler<H>,
    request: ScimOperationRequest,
    context: &RequestContext,
) -> ScimResult<ScimOperationResponse> {
    let payload = request
        .data
        .as_ref()
        .ok_or_else(|| ScimError::invalid_syntax("Missing data for bulk operation"))?;

    let orchestrator = BulkOrchestrator::new(handler, context);
    let bulk_request = BulkRequest::from_json(payload)?;
    orchestrator.check_limits(&bulk_request, payload)?;

    let response = orchestrator.run(bulk_request).await;
    let count = response.operations.len();

    Ok(ScimOperationResponse::success(
        200,
        Some(response.to_json()),
        OperationMetadata {
            resource_type: Some("Bulk".to_string()),
            resource_count: Some(count),
            ..OperationMetadata::for_request(&context.request_id)
        },
    ))
}
