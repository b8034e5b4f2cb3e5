//! Resource operations of the SCIM server.
//!
//! Each operation validates its input against the resource type, runs the
//! handler call through the interceptor and finalizes `meta` on the way out.

use super::core::{ScimServer, clear_version, into_resource};
use crate::error::{ScimError, ScimResult};
use crate::patch::PatchOperation;
use crate::resource::{
    AttributeNode, Document, HandlerInvocation, HandlerOutput, ListQuery, ListResult, RequestContext,
    ResourceHandler, ScalarValue, SortOrder,
};
use crate::schema::{EndpointOperation, OperationContext, ResourceType, SchemaAttribute, SchemaValidator};
use serde_json::Value;
use std::cmp::Ordering;

/// One page of a list operation.
#[derive(Debug, Clone, PartialEq)]
pub struct ListPage {
    pub resources: Vec<Document>,
    pub total_results: usize,
    pub start_index: usize,
}

fn handler_error<E: Into<ScimError>>(error: E) -> ScimError {
    error.into()
}

impl<H: ResourceHandler> ScimServer<H> {
    /// Validate and create a resource.
    pub async fn create_resource(
        &self,
        resource_type: &ResourceType,
        payload: &Value,
        context: &RequestContext,
    ) -> ScimResult<Document> {
        self.ensure_enabled(resource_type, EndpointOperation::Create)?;
        let document = SchemaValidator::new(resource_type, OperationContext::Create).validate(payload)?;
        self.check_request(resource_type, |validator, errors| {
            validator.validate_create(&document, context, errors)
        })?;

        let invocation = HandlerInvocation {
            operation: EndpointOperation::Create,
            resource_type,
            resource_id: None,
        };
        let output = self
            .invoke(
                invocation,
                context,
                Box::pin(async move {
                    self.handler
                        .create(resource_type, document, context)
                        .await
                        .map(HandlerOutput::Resource)
                        .map_err(handler_error)
                }),
            )
            .await?;

        let created = into_resource(output)?;
        if created.id().is_none() {
            return Err(ScimError::internal(format!(
                "handler created a {} without an id",
                resource_type.name
            )));
        }
        self.finalize(resource_type, created)
    }

    /// Fetch a resource; missing resources are a not-found error.
    pub async fn get_resource(
        &self,
        resource_type: &ResourceType,
        id: &str,
        context: &RequestContext,
    ) -> ScimResult<Document> {
        self.ensure_enabled(resource_type, EndpointOperation::Get)?;
        self.check_request(resource_type, |validator, errors| {
            validator.validate_get(id, context, errors)
        })?;
        let stored = self.fetch(resource_type, id, context).await?;
        self.finalize(resource_type, stored)
    }

    /// List resources, applying the filter, sort and pagination in the engine
    /// unless the handler already produced the page.
    pub async fn list_resources(
        &self,
        resource_type: &ResourceType,
        query: &ListQuery,
        context: &RequestContext,
    ) -> ScimResult<ListPage> {
        self.ensure_enabled(resource_type, EndpointOperation::List)?;

        let invocation = HandlerInvocation {
            operation: EndpointOperation::List,
            resource_type,
            resource_id: None,
        };
        let output = self
            .invoke(
                invocation,
                context,
                Box::pin(async move {
                    self.handler
                        .list(resource_type, query, context)
                        .await
                        .map(HandlerOutput::Listed)
                        .map_err(handler_error)
                }),
            )
            .await?;
        let ListResult {
            resources,
            total_results,
        } = match output {
            HandlerOutput::Listed(result) => result,
            other => {
                return Err(ScimError::internal(format!(
                    "handler returned {:?} for a list",
                    other
                )));
            }
        };

        // Filters and sorts may address meta sub-attributes
        let mut resources = resources
            .into_iter()
            .map(|document| self.finalize(resource_type, document))
            .collect::<ScimResult<Vec<_>>>()?;

        let start_index = query.start_index.max(1);
        if let Some(total_results) = total_results {
            return Ok(ListPage {
                resources,
                total_results,
                start_index,
            });
        }

        if resource_type.features.auto_filtering {
            if let Some(filter) = &query.filter {
                resources.retain(|document| filter.matches(document));
            }
        }
        if resource_type.features.auto_sorting {
            if let Some(attribute) = &query.sort_by {
                sort_documents(&mut resources, attribute, query.sort_order);
            }
        }

        let total_results = resources.len();
        let max_results = self.config.service_provider.filter.max_results;
        let limit = query.count.unwrap_or(max_results).min(max_results);
        let resources = resources
            .into_iter()
            .skip(start_index - 1)
            .take(limit)
            .collect::<Vec<_>>();

        log::debug!(
            "Listed {} of {} {} resource(s)",
            resources.len(),
            total_results,
            resource_type.name
        );
        Ok(ListPage {
            resources,
            total_results,
            start_index,
        })
    }

    /// Replace a resource with a full new representation.
    pub async fn replace_resource(
        &self,
        resource_type: &ResourceType,
        id: &str,
        payload: &Value,
        if_match: Option<&str>,
        context: &RequestContext,
    ) -> ScimResult<Document> {
        self.ensure_enabled(resource_type, EndpointOperation::Replace)?;
        let existing = self.fetch(resource_type, id, context).await?;
        self.check_precondition(resource_type, &existing, if_match)?;

        let mut document = SchemaValidator::new(resource_type, OperationContext::Replace)
            .with_existing(&existing)
            .validate(payload)?;
        document.set_id(resource_type, id);
        clear_version(&mut document);
        self.check_request(resource_type, |validator, errors| {
            validator.validate_update(&existing, &document, context, errors)
        })?;

        self.store(resource_type, id, document, EndpointOperation::Replace, context)
            .await
    }

    /// Apply PATCH operations to a resource.
    pub async fn patch_resource(
        &self,
        resource_type: &ResourceType,
        id: &str,
        operations: &[PatchOperation],
        if_match: Option<&str>,
        context: &RequestContext,
    ) -> ScimResult<Document> {
        self.ensure_enabled(resource_type, EndpointOperation::Patch)?;
        if !self.config.service_provider.patch.supported {
            return Err(ScimError::unsupported_operation(&resource_type.name, "patch"));
        }
        let existing = self.fetch(resource_type, id, context).await?;
        self.check_precondition(resource_type, &existing, if_match)?;

        let mut patched = self.patch_engine.apply(resource_type, &existing, operations)?;
        clear_version(&mut patched);
        self.check_request(resource_type, |validator, errors| {
            validator.validate_update(&existing, &patched, context, errors)
        })?;

        self.store(resource_type, id, patched, EndpointOperation::Patch, context)
            .await
    }

    /// Delete a resource.
    pub async fn delete_resource(
        &self,
        resource_type: &ResourceType,
        id: &str,
        if_match: Option<&str>,
        context: &RequestContext,
    ) -> ScimResult<()> {
        self.ensure_enabled(resource_type, EndpointOperation::Delete)?;
        self.check_request(resource_type, |validator, errors| {
            validator.validate_delete(id, context, errors)
        })?;
        if if_match.is_some() && self.etags_enabled(resource_type) {
            let existing = self.fetch(resource_type, id, context).await?;
            self.check_precondition(resource_type, &existing, if_match)?;
        }

        let invocation = HandlerInvocation {
            operation: EndpointOperation::Delete,
            resource_type,
            resource_id: Some(id),
        };
        self.invoke(
            invocation,
            context,
            Box::pin(async move {
                self.handler
                    .delete(resource_type, id, context)
                    .await
                    .map(|()| HandlerOutput::Deleted)
                    .map_err(handler_error)
            }),
        )
        .await?;
        Ok(())
    }

    /// Stored resource, without `meta` finalization.
    async fn fetch(
        &self,
        resource_type: &ResourceType,
        id: &str,
        context: &RequestContext,
    ) -> ScimResult<Document> {
        let invocation = HandlerInvocation {
            operation: EndpointOperation::Get,
            resource_type,
            resource_id: Some(id),
        };
        let output = self
            .invoke(
                invocation,
                context,
                Box::pin(async move {
                    self.handler
                        .get(resource_type, id, context)
                        .await
                        .map(|found| match found {
                            Some(document) => HandlerOutput::Resource(document),
                            None => HandlerOutput::Missing,
                        })
                        .map_err(handler_error)
                }),
            )
            .await?;
        match output {
            HandlerOutput::Missing => Err(ScimError::resource_not_found(&resource_type.name, id)),
            other => into_resource(other),
        }
    }

    async fn store(
        &self,
        resource_type: &ResourceType,
        id: &str,
        document: Document,
        operation: EndpointOperation,
        context: &RequestContext,
    ) -> ScimResult<Document> {
        let invocation = HandlerInvocation {
            operation,
            resource_type,
            resource_id: Some(id),
        };
        let output = self
            .invoke(
                invocation,
                context,
                Box::pin(async move {
                    self.handler
                        .update(resource_type, id, document, context)
                        .await
                        .map(HandlerOutput::Resource)
                        .map_err(handler_error)
                }),
            )
            .await?;
        self.finalize(resource_type, into_resource(output)?)
    }
}

/// Stable sort on `attribute`; resources without a value go last in both
/// directions.
pub(crate) fn sort_documents(documents: &mut [Document], attribute: &SchemaAttribute, order: SortOrder) {
    documents.sort_by(|a, b| {
        match (sort_key(a, attribute), sort_key(b, attribute)) {
            (Some(left), Some(right)) => {
                let ordering = left
                    .compare(right, attribute.case_exact)
                    .unwrap_or(Ordering::Equal);
                match order {
                    SortOrder::Ascending => ordering,
                    SortOrder::Descending => ordering.reverse(),
                }
            }
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
    });
}

/// Value a resource sorts by. Complex attributes sort by the `value` of
/// their primary (or first) entry.
fn sort_key<'d>(document: &'d Document, attribute: &SchemaAttribute) -> Option<&'d ScalarValue> {
    if !attribute.is_complex() {
        return document.values_of(attribute).into_iter().next();
    }
    let entries = document.complex_entries(attribute);
    if !entries.is_empty() {
        let entry = entries
            .iter()
            .find(|entry| {
                entry
                    .scalar("primary")
                    .and_then(ScalarValue::as_bool)
                    .unwrap_or(false)
            })
            .unwrap_or(&entries[0]);
        return entry.scalar("value");
    }
    match document.get(attribute)? {
        AttributeNode::Complex { value, .. } => value.scalar("value"),
        _ => None,
    }
}
