//! Framework-agnostic SCIM operation handler.
//!
//! This module turns transport-neutral requests into calls on the
//! [`ScimServer`](crate::ScimServer) and renders the results, including
//! errors, as SCIM response bodies with status codes and header metadata.
//!
//! # Key Types
//!
//! - [`ScimOperationHandler`] - Routes requests to resource, discovery and bulk handlers
//! - [`ScimOperationRequest`] - One protocol operation
//! - [`ScimOperationResponse`] - Status, body and `Location`/`ETag` metadata
//!
//! # Examples
//!
//! ```rust,no_run
//! use scim_engine::operation_handler::{ScimOperationHandler, ScimOperationRequest};
//! use scim_engine::ScimServer;
//! # use scim_engine::resource::ResourceHandler;
//! use serde_json::json;
//!
//! # async fn example<H: ResourceHandler>(handler: H) -> Result<(), Box<dyn std::error::Error>> {
//! let server = ScimServer::new(handler)?;
//! let operations = ScimOperationHandler::new(server);
//!
//! let request = ScimOperationRequest::patch(
//!     "/Users",
//!     "2819c223",
//!     json!({
//!         "schemas": ["urn:ietf:params:scim:api:messages:2.0:PatchOp"],
//!         "Operations": [{"op": "replace", "path": "active", "value": false}]
//!     }),
//! )
//! .with_if_match("W/\"3694e05e9dff590\"");
//! let response = operations.handle_operation(request).await;
//! println!("{} {:?}", response.status, response.metadata.etag);
//! # Ok(())
//! # }
//! ```

mod builders;
mod core;
mod errors;
mod handlers;
pub(crate) mod projection;

pub use core::{
    OperationMetadata, ScimOperationHandler, ScimOperationRequest, ScimOperationResponse,
    ScimOperationType, ScimQuery,
};
pub use errors::create_error_response;

pub(crate) use builders::split_path;
