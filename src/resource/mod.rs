//! Resource documents and the embedder-facing persistence seam.
//!
//! - [`Document`] - validated, schema-bound resource
//! - [`ResourceHandler`] - storage trait implemented by embedders
//! - [`RequestContext`] / [`ListQuery`] - per-request data handed to handlers
//! - [`Interceptor`] / [`TransactionScope`] - around-advice hooks
//! - [`RequestValidator`] - per resource type request checks

pub mod context;
pub mod document;
pub mod hooks;
pub mod provider;
pub mod value;
pub mod version;

pub use context::{
    Authorization, ClientAuthorization, ListQuery, ListResult, RequestContext, SortOrder,
};
pub use document::{AttributeMap, AttributeNode, Document};
pub use hooks::{
    HandlerInvocation, HandlerOutput, Interceptor, PassThrough, RequestValidator, TransactionScope,
};
pub use provider::ResourceHandler;
pub use value::ScalarValue;
pub use version::{HttpVersion, RawVersion, VersionConflict};
