//! CRUD operation handlers
//!
//! This module contains handlers for Create, Get, Replace, Patch and Delete
//! operations, plus the shared rendering of single-resource responses.

use crate::{
    ScimError,
    error::ScimResult,
    operation_handler::{
        core::{
            OperationMetadata, ScimOperationHandler, ScimOperationRequest, ScimOperationResponse,
            ScimQuery,
        },
        projection::AttributeSelection,
    },
    patch::PatchRequest,
    resource::{Document, ListQuery, RequestContext, ResourceHandler},
    schema::ResourceType,
};

/// Handle create operations.
pub async fn handle_create<H: ResourceHandler>(
    handler: &ScimOperationHandler<H>,
    request: ScimOperationRequest,
    context: &RequestContext,
) -> ScimResult<ScimOperationResponse> {
    let resource_type = handler.server().resource_type(&request.endpoint)?;
    if request.resource_id.is_some() {
        return Err(ScimError::invalid_syntax(
            "POST must target the resource type endpoint, not a resource",
        ));
    }
    let data = request
        .data
        .as_ref()
        .ok_or_else(|| ScimError::invalid_syntax("Missing data for create operation"))?;

    let resource = handler
        .server()
        .create_resource(resource_type, data, context)
        .await?;

    resource_response(handler, resource_type, &resource, 201, request.query.as_ref(), context)
}

/// Handle get operations.
///
/// A get without id on a singleton endpoint returns its only resource; on any
/// other endpoint it is a list.
pub async fn handle_get<H: ResourceHandler>(
    handler: &ScimOperationHandler<H>,
    request: ScimOperationRequest,
    context: &RequestContext,
) -> ScimResult<ScimOperationResponse> {
    let resource_type = handler.server().resource_type(&request.endpoint)?;

    if request.resource_id.is_none() {
        if !resource_type.features.singleton_endpoint {
            return super::query::handle_list(handler, request, context).await;
        }
        let page = handler
            .server()
            .list_resources(resource_type, &ListQuery::new(), context)
            .await?;
        let resource = page.resources.into_iter().next().ok_or_else(|| {
            ScimError::resource_not_found(&resource_type.name, &resource_type.endpoint)
        })?;
        return resource_response(handler, resource_type, &resource, 200, request.query.as_ref(), context);
    }
    let id = require_id(&request)?;

    let resource = handler
        .server()
        .get_resource(resource_type, id, context)
        .await?;

    resource_response(handler, resource_type, &resource, 200, request.query.as_ref(), context)
}

/// Handle replace (PUT) operations.
pub async fn handle_replace<H: ResourceHandler>(
    handler: &ScimOperationHandler<H>,
    request: ScimOperationRequest,
    context: &RequestContext,
) -> ScimResult<ScimOperationResponse> {
    let resource_type = handler.server().resource_type(&request.endpoint)?;
    let id = require_id(&request)?;
    let data = request
        .data
        .as_ref()
        .ok_or_else(|| ScimError::invalid_syntax("Missing data for replace operation"))?;

    let resource = handler
        .server()
        .replace_resource(resource_type, id, data, request.if_match.as_deref(), context)
        .await?;

    resource_response(handler, resource_type, &resource, 200, request.query.as_ref(), context)
}

/// Handle patch operations.
pub async fn handle_patch<H: ResourceHandler>(
    handler: &ScimOperationHandler<H>,
    request: ScimOperationRequest,
    context: &RequestContext,
) -> ScimResult<ScimOperationResponse> {
    let resource_type = handler.server().resource_type(&request.endpoint)?;
    let id = require_id(&request)?;
    let data = request
        .data
        .as_ref()
        .ok_or_else(|| ScimError::invalid_syntax("Missing data for patch operation"))?;
    let patch = PatchRequest::from_json(data)?;

    let resource = handler
        .server()
        .patch_resource(
            resource_type,
            id,
            &patch.operations,
            request.if_match.as_deref(),
            context,
        )
        .await?;

    resource_response(handler, resource_type, &resource, 200, request.query.as_ref(), context)
}

/// Handle delete operations.
pub async fn handle_delete<H: ResourceHandler>(
    handler: &ScimOperationHandler<H>,
    request: ScimOperationRequest,
    context: &RequestContext,
) -> ScimResult<ScimOperationResponse> {
    let resource_type = handler.server().resource_type(&request.endpoint)?;
    let id = require_id(&request)?;

    handler
        .server()
        .delete_resource(resource_type, id, request.if_match.as_deref(), context)
        .await?;

    Ok(ScimOperationResponse::success(
        204,
        None,
        OperationMetadata {
            resource_type: Some(resource_type.name.clone()),
            resource_id: Some(id.to_string()),
            location: Some(handler.server().config().location(&resource_type.endpoint, id)),
            ..OperationMetadata::for_request(&context.request_id)
        },
    ))
}

fn require_id(request: &ScimOperationRequest) -> ScimResult<&str> {
    request.resource_id.as_deref().ok_or_else(|| {
        ScimError::invalid_syntax(format!(
            "{} requires a resource id",
            request.operation
        ))
    })
}

/// Render one resource with the request's attribute projection.
pub(super) fn resource_response<H: ResourceHandler>(
    handler: &ScimOperationHandler<H>,
    resource_type: &ResourceType,
    resource: &Document,
    status: u16,
    query: Option<&ScimQuery>,
    context: &RequestContext,
) -> ScimResult<ScimOperationResponse> {
    let selection = match query {
        Some(query) => AttributeSelection::resolve(
            resource_type,
            &query.attributes,
            &query.excluded_attributes,
        ),
        None => AttributeSelection::default(),
    };
    let server = handler.server();
    let id = resource.id().map(str::to_string);

    Ok(ScimOperationResponse::success(
        status,
        Some(selection.render(resource)),
        OperationMetadata {
            resource_type: Some(resource_type.name.clone()),
            location: id
                .as_deref()
                .map(|id| server.config().location(&resource_type.endpoint, id)),
            resource_id: id,
            etag: server.etag(resource_type, resource),
            ..OperationMetadata::for_request(&context.request_id)
        },
    ))
}
