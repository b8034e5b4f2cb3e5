//! Discovery operation handlers
//!
//! `/Schemas`, `/ResourceTypes` and `/ServiceProviderConfig` are served from
//! the registry and the configuration. They are read-only: anything but a
//! GET fails with 501.

use crate::{
    ScimError,
    error::ScimResult,
    operation_handler::core::{
        OperationMetadata, ScimOperationHandler, ScimOperationRequest, ScimOperationResponse,
        ScimOperationType,
    },
    resource::{RequestContext, ResourceHandler},
    schema_discovery::{list_response, resource_type_resource, schema_resource},
};
use serde_json::Value;

/// Read-only discovery endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscoveryEndpoint {
    Schemas,
    ResourceTypes,
    ServiceProviderConfig,
}

impl DiscoveryEndpoint {
    pub fn parse(endpoint: &str) -> Option<Self> {
        let name = endpoint.trim_matches('/');
        [Self::Schemas, Self::ResourceTypes, Self::ServiceProviderConfig]
            .into_iter()
            .find(|candidate| candidate.name().eq_ignore_ascii_case(name))
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Schemas => "Schemas",
            Self::ResourceTypes => "ResourceTypes",
            Self::ServiceProviderConfig => "ServiceProviderConfig",
        }
    }
}

/// Handle a request to a discovery endpoint.
pub fn handle_discovery<H: ResourceHandler>(
    handler: &ScimOperationHandler<H>,
    endpoint: DiscoveryEndpoint,
    request: ScimOperationRequest,
    context: &RequestContext,
) -> ScimResult<ScimOperationResponse> {
    if !matches!(
        request.operation,
        ScimOperationType::Get | ScimOperationType::List
    ) {
        return Err(ScimError::unsupported_operation(
            endpoint.name(),
            request.operation.as_str(),
        ));
    }

    let server = handler.server();
    let base_url = &server.config().base_url;
    let registry = server.registry();
    let id = request.resource_id.as_deref();

    let mut metadata = OperationMetadata::for_request(&context.request_id);
    let data = match (endpoint, id) {
        (DiscoveryEndpoint::ServiceProviderConfig, None) => {
            server.config().service_provider.to_resource(base_url)
        }
        (DiscoveryEndpoint::ServiceProviderConfig, Some(id)) => {
            return Err(ScimError::resource_not_found("ServiceProviderConfig", id));
        }
        (DiscoveryEndpoint::Schemas, Some(id)) => {
            let schema = registry
                .get_schema(id)
                .ok_or_else(|| ScimError::schema_not_found(id))?;
            metadata.resource_id = Some(schema.id.clone());
            schema_resource(schema, base_url)
        }
        (DiscoveryEndpoint::Schemas, None) => {
            let schemas: Vec<Value> = registry
                .schemas()
                .iter()
                .map(|schema| schema_resource(schema, base_url))
                .collect();
            collection(schemas, &mut metadata)
        }
        (DiscoveryEndpoint::ResourceTypes, Some(id)) => {
            let resource_type = registry
                .resource_types()
                .iter()
                .find(|rt| rt.id.eq_ignore_ascii_case(id) || rt.name.eq_ignore_ascii_case(id))
                .ok_or_else(|| ScimError::resource_not_found("ResourceType", id))?;
            metadata.resource_id = Some(resource_type.id.clone());
            resource_type_resource(resource_type, base_url)
        }
        (DiscoveryEndpoint::ResourceTypes, None) => {
            let resource_types: Vec<Value> = registry
                .resource_types()
                .iter()
                .map(|rt| resource_type_resource(rt, base_url))
                .collect();
            collection(resource_types, &mut metadata)
        }
    };

    metadata.resource_type = Some(endpoint.name().to_string());
    Ok(ScimOperationResponse::success(200, Some(data), metadata))
}

fn collection(resources: Vec<Value>, metadata: &mut OperationMetadata) -> Value {
    let total = resources.len();
    metadata.resource_count = Some(total);
    metadata.total_results = Some(total);
    list_response(resources, total, 1)
}
