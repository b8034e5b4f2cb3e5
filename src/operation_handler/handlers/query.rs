//! Query operation handlers
//!
//! Turns the textual list parameters into a typed [`ListQuery`] and renders
//! the resulting page as a list response.

use crate::{
    ScimError,
    error::ScimResult,
    filter::parse_filter,
    operation_handler::{
        core::{OperationMetadata, ScimOperationHandler, ScimOperationRequest, ScimOperationResponse, ScimQuery},
        projection::AttributeSelection,
    },
    resource::{ListQuery, RequestContext, ResourceHandler, SortOrder},
    schema::ResourceType,
    schema_discovery::{ServiceProviderConfig, list_response},
};

/// Handle list operations.
pub async fn handle_list<H: ResourceHandler>(
    handler: &ScimOperationHandler<H>,
    request: ScimOperationRequest,
    context: &RequestContext,
) -> ScimResult<ScimOperationResponse> {
    let server = handler.server();
    let resource_type = server.resource_type(&request.endpoint)?;
    let query = request.query.unwrap_or_default();
    let list_query = build_list_query(resource_type, &query, &server.config().service_provider)?;

    let page = server
        .list_resources(resource_type, &list_query, context)
        .await?;

    let selection = AttributeSelection::resolve(
        resource_type,
        &query.attributes,
        &query.excluded_attributes,
    );
    let rendered: Vec<_> = page.resources.iter().map(|r| selection.render(r)).collect();
    let resource_count = rendered.len();

    Ok(ScimOperationResponse::success(
        200,
        Some(list_response(rendered, page.total_results, page.start_index)),
        OperationMetadata {
            resource_type: Some(resource_type.name.clone()),
            resource_count: Some(resource_count),
            total_results: Some(page.total_results),
            ..OperationMetadata::for_request(&context.request_id)
        },
    ))
}

/// Resolve filter, sort and pagination parameters against a resource type.
pub(crate) fn build_list_query(
    resource_type: &ResourceType,
    query: &ScimQuery,
    config: &ServiceProviderConfig,
) -> ScimResult<ListQuery> {
    let mut list_query = ListQuery::new();

    if let Some(text) = query.filter.as_deref().filter(|f| !f.trim().is_empty()) {
        if !config.filter.supported {
            return Err(ScimError::unsupported_operation(&resource_type.name, "filter"));
        }
        let filter = parse_filter(text, resource_type)?;
        list_query = list_query.with_filter(text, filter);
    }

    if let Some(sort_by) = query.sort_by.as_deref().filter(|s| !s.trim().is_empty()) {
        if !config.sort.supported {
            return Err(ScimError::unsupported_operation(&resource_type.name, "sort"));
        }
        let attribute = resource_type.find_attribute(sort_by.trim()).ok_or_else(|| {
            ScimError::invalid_value(format!("Unknown sortBy attribute '{}'", sort_by))
        })?;
        let order = match query.sort_order.as_deref() {
            None => SortOrder::Ascending,
            Some(order) => SortOrder::parse(order.trim()).ok_or_else(|| {
                ScimError::invalid_value(format!("Invalid sortOrder '{}'", order))
            })?,
        };
        list_query = list_query.with_sort(attribute, order);
    }

    if let Some(start_index) = query.start_index {
        list_query = list_query.with_start_index(start_index);
    }
    if let Some(count) = query.count {
        list_query = list_query.with_count(count.min(config.filter.max_results));
    }
    Ok(list_query)
}
