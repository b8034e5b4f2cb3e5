//! Around-advice hooks for handler calls and whole requests.
//!
//! An [`Interceptor`] wraps every single resource handler invocation, a
//! [`TransactionScope`] wraps one dispatched request (or, in per-operation
//! bulk mode, one bulk operation). Both receive the pending work as a boxed
//! future and decide how to drive it; the defaults simply await it.
//!
//! A [`RequestValidator`] adds business checks for one resource type on top of
//! schema validation. Anything it records fails the request with `400`.

use super::context::{ListResult, RequestContext};
use super::document::Document;
use crate::error::{ScimResult, ValidationErrors};
use crate::operation_handler::ScimOperationResponse;
use crate::schema::{EndpointOperation, ResourceType};
use futures::future::BoxFuture;

/// What a handler invocation produced.
#[derive(Debug, Clone)]
pub enum HandlerOutput {
    Resource(Document),
    /// `get` found nothing
    Missing,
    Listed(ListResult),
    Deleted,
}

/// Describes the handler invocation being intercepted.
#[derive(Debug, Clone, Copy)]
pub struct HandlerInvocation<'a> {
    pub operation: EndpointOperation,
    pub resource_type: &'a ResourceType,
    pub resource_id: Option<&'a str>,
}

/// Wraps each resource handler call.
pub trait Interceptor: Send + Sync {
    fn around<'a>(
        &'a self,
        invocation: HandlerInvocation<'a>,
        context: &'a RequestContext,
        proceed: BoxFuture<'a, ScimResult<HandlerOutput>>,
    ) -> BoxFuture<'a, ScimResult<HandlerOutput>> {
        let _ = (invocation, context);
        proceed
    }
}

/// Wraps one dispatched request.
///
/// `work` resolves to `Err` when the request failed, before the error is
/// rendered as an error response, so implementations can roll back.
pub trait TransactionScope: Send + Sync {
    fn around<'a>(
        &'a self,
        context: &'a RequestContext,
        work: BoxFuture<'a, ScimResult<ScimOperationResponse>>,
    ) -> BoxFuture<'a, ScimResult<ScimOperationResponse>> {
        let _ = context;
        work
    }
}

/// Per resource type checks run before the handler is called.
///
/// Create and update checks see the schema validated document. Errors pushed
/// onto `errors` are reported together as one `400` response.
pub trait RequestValidator: Send + Sync {
    fn validate_create(&self, document: &Document, context: &RequestContext, errors: &mut ValidationErrors) {
        let _ = (document, context, errors);
    }

    fn validate_get(&self, id: &str, context: &RequestContext, errors: &mut ValidationErrors) {
        let _ = (id, context, errors);
    }

    /// Replace and patch; `updated` is the complete new representation.
    fn validate_update(
        &self,
        existing: &Document,
        updated: &Document,
        context: &RequestContext,
        errors: &mut ValidationErrors,
    ) {
        let _ = (existing, updated, context, errors);
    }

    fn validate_delete(&self, id: &str, context: &RequestContext, errors: &mut ValidationErrors) {
        let _ = (id, context, errors);
    }
}

/// Default hook: runs the wrapped work unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassThrough;

impl Interceptor for PassThrough {}

impl TransactionScope for PassThrough {}
