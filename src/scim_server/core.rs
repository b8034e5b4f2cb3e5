//! Core SCIM server structure and the helpers shared by its operations.

use super::builder::{ScimServerBuilder, ScimServerConfig};
use crate::error::{BuildResult, ScimError, ScimResult, ValidationErrors};
use crate::patch::PatchEngine;
use crate::resource::version::{HttpVersion, RawVersion, check_if_match, parse_stored_version};
use crate::resource::{
    AttributeNode, Document, HandlerInvocation, HandlerOutput, Interceptor, RequestContext,
    RequestValidator, ResourceHandler, TransactionScope,
};
use crate::schema::validation::validate_attribute_value;
use crate::schema::{EndpointOperation, OperationContext, ResourceType, SchemaRegistry};
use futures::future::BoxFuture;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::Arc;

/// Schema-driven SCIM server.
///
/// Owns the resource handler, the immutable schema registry and the
/// configuration. Every registered resource type is served by the same
/// handler; the engine validates, filters, sorts, paginates and patches, the
/// handler only persists.
///
/// # Type Parameters
///
/// * `H` - The resource handler type that implements [`ResourceHandler`]
pub struct ScimServer<H> {
    pub(super) handler: H,
    pub(super) registry: Arc<SchemaRegistry>,
    pub(super) config: ScimServerConfig,
    pub(super) interceptor: Arc<dyn Interceptor>,
    pub(super) transaction_scope: Arc<dyn TransactionScope>,
    pub(super) request_validators: HashMap<String, Arc<dyn RequestValidator>>,
    pub(super) patch_engine: PatchEngine,
}

impl<H: ResourceHandler> ScimServer<H> {
    /// Server with the embedded User and Group resource types and default
    /// configuration.
    pub fn new(handler: H) -> BuildResult<Self> {
        ScimServerBuilder::new(handler).build()
    }

    pub fn builder(handler: H) -> ScimServerBuilder<H> {
        ScimServerBuilder::new(handler)
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }

    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    pub fn config(&self) -> &ScimServerConfig {
        &self.config
    }

    pub fn transaction_scope(&self) -> &dyn TransactionScope {
        self.transaction_scope.as_ref()
    }

    /// Resource type served at `endpoint` (`/Users`, `Users`).
    pub fn resource_type(&self, endpoint: &str) -> ScimResult<&Arc<ResourceType>> {
        self.registry
            .get_resource_type_by_endpoint(endpoint)
            .ok_or_else(|| ScimError::UnsupportedResourceType(endpoint.to_string()))
    }

    pub(crate) fn ensure_enabled(
        &self,
        resource_type: &ResourceType,
        operation: EndpointOperation,
    ) -> ScimResult<()> {
        if resource_type.features.is_enabled(operation) {
            Ok(())
        } else {
            log::debug!(
                "Rejecting disabled operation {} on {}",
                operation.as_str(),
                resource_type.name
            );
            Err(ScimError::unsupported_operation(
                &resource_type.name,
                operation.as_str(),
            ))
        }
    }

    /// Run the resource type's request validator, if one is registered.
    pub(crate) fn check_request(
        &self,
        resource_type: &ResourceType,
        check: impl FnOnce(&dyn RequestValidator, &mut ValidationErrors),
    ) -> ScimResult<()> {
        let Some(validator) = self.request_validators.get(&resource_type.name) else {
            return Ok(());
        };
        let mut errors = ValidationErrors::new();
        check(validator.as_ref(), &mut errors);
        if !errors.is_empty() {
            log::debug!(
                "Request validator rejected {} request: {}",
                resource_type.name,
                errors
            );
        }
        errors.into_result(()).map_err(ScimError::from)
    }

    /// ETags are emitted and checked only when both the server and the
    /// resource type enable them.
    pub fn etags_enabled(&self, resource_type: &ResourceType) -> bool {
        self.config.service_provider.etag.supported && resource_type.features.etag_enabled
    }

    /// Compare an `If-Match` value with the stored resource.
    pub(crate) fn check_precondition(
        &self,
        resource_type: &ResourceType,
        current: &Document,
        if_match: Option<&str>,
    ) -> ScimResult<()> {
        let Some(if_match) = if_match.filter(|value| !value.trim().is_empty()) else {
            return Ok(());
        };
        if !self.etags_enabled(resource_type) {
            return Ok(());
        }
        check_if_match(if_match, &current_version(current))?;
        Ok(())
    }

    /// Run one handler call through the interceptor.
    pub(crate) async fn invoke<'a>(
        &'a self,
        invocation: HandlerInvocation<'a>,
        context: &'a RequestContext,
        call: BoxFuture<'a, ScimResult<HandlerOutput>>,
    ) -> ScimResult<HandlerOutput> {
        log::trace!(
            "Invoking handler {} on {} (request: '{}')",
            invocation.operation.as_str(),
            invocation.resource_type.name,
            context.request_id
        );
        self.interceptor.around(invocation, context, call).await
    }

    /// Fill in `meta.resourceType`, `meta.location` and, when the handler did
    /// not supply them, `meta.lastModified` (from `meta.created`) and a
    /// content derived `meta.version`.
    pub(crate) fn finalize(
        &self,
        resource_type: &ResourceType,
        mut document: Document,
    ) -> ScimResult<Document> {
        let Some(meta_attribute) = resource_type.meta_attribute() else {
            return Ok(document);
        };
        let mut meta = match document.attributes().get("meta") {
            Some(node @ AttributeNode::Complex { .. }) => node.to_json(),
            _ => json!({}),
        };
        let version = current_version(&document);
        if let Some(object) = meta.as_object_mut() {
            object.insert(
                "resourceType".to_string(),
                Value::String(resource_type.name.clone()),
            );
            if let Some(id) = document.id() {
                object.insert(
                    "location".to_string(),
                    Value::String(self.config.location(&resource_type.endpoint, id)),
                );
            }
            if !object.contains_key("lastModified") {
                if let Some(created) = object.get("created").cloned() {
                    object.insert("lastModified".to_string(), created);
                }
            }
            if self.etags_enabled(resource_type) && !object.contains_key("version") {
                object.insert(
                    "version".to_string(),
                    Value::String(HttpVersion::from(version).to_string()),
                );
            }
        }
        if let Some(node) = validate_attribute_value(&meta_attribute, &meta, OperationContext::Response)? {
            document.attributes_mut().insert(meta_attribute.name.clone(), node);
        }
        Ok(document)
    }

    /// Weak ETag of a finalized document.
    pub(crate) fn etag(&self, resource_type: &ResourceType, document: &Document) -> Option<String> {
        if !self.etags_enabled(resource_type) {
            return None;
        }
        Some(HttpVersion::from(current_version(document)).to_string())
    }
}

/// The stored `meta.version`, or a hash of the document content.
pub(crate) fn current_version(document: &Document) -> RawVersion {
    document
        .version()
        .and_then(|stored| parse_stored_version(stored).ok())
        .unwrap_or_else(|| {
            let content = serde_json::to_vec(&document.to_json()).unwrap_or_default();
            RawVersion::from_content(&content)
        })
}

/// Drop `meta.version` so a changed resource gets a fresh one.
pub(crate) fn clear_version(document: &mut Document) {
    if let Some(AttributeNode::Complex { value, .. }) = document.attributes_mut().get_mut("meta") {
        value.remove("version");
    }
}

/// Unwrap a handler output that must be a resource.
pub(crate) fn into_resource(output: HandlerOutput) -> ScimResult<Document> {
    match output {
        HandlerOutput::Resource(document) => Ok(document),
        other => Err(ScimError::internal(format!(
            "handler returned {:?} where a resource was expected",
            other
        ))),
    }
}
