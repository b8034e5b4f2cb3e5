//! Schema-driven SCIM 2.0 protocol engine for Rust.
//!
//! Resources are validated, order-preserving documents whose shape comes from
//! SCIM schema JSON registered at startup, not from compiled types. The engine
//! validates, filters, sorts, paginates, patches and runs bulk requests;
//! persistence is delegated to an embedder-supplied [`ResourceHandler`].
//!
//! # Core Components
//!
//! - [`SchemaRegistry`] - Schemas and resource types, immutable once the server is built
//! - [`ScimServer`] - Resource operations over a [`ResourceHandler`]
//! - [`ScimOperationHandler`] - Transport-neutral request dispatch, discovery and bulk
//! - [`filter`] - Filter expression parser and evaluator
//! - [`patch`] - PATCH operation engine with client workarounds
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use scim_engine::{ScimOperationHandler, ScimOperationRequest, ScimServer};
//! # use scim_engine::resource::ResourceHandler;
//! use serde_json::json;
//!
//! # async fn example<H: ResourceHandler>(handler: H) -> Result<(), Box<dyn std::error::Error>> {
//! let server = ScimServer::builder(handler)
//!     .with_base_url("https://scim.example.com/v2")
//!     .build()?;
//! let operations = ScimOperationHandler::new(server);
//!
//! let response = operations
//!     .handle_operation(ScimOperationRequest::create(
//!         "/Users",
//!         json!({
//!             "schemas": ["urn:ietf:params:scim:schemas:core:2.0:User"],
//!             "userName": "bjensen"
//!         }),
//!     ))
//!     .await;
//! assert_eq!(response.status, 201);
//! # Ok(())
//! # }
//! ```

pub mod bulk;
pub mod error;
pub mod filter;
pub mod operation_handler;
pub mod patch;
pub mod resource;
pub mod schema;
pub mod schema_discovery;
pub mod scim_server;

pub use error::{BuildError, ScimError, ScimResult, ScimType};
pub use operation_handler::{
    OperationMetadata, ScimOperationHandler, ScimOperationRequest, ScimOperationResponse,
    ScimOperationType, ScimQuery,
};
pub use resource::{Document, ListQuery, ListResult, RequestContext, ResourceHandler};
pub use schema::{ResourceType, Schema, SchemaRegistry};
pub use schema_discovery::{AuthenticationScheme, ServiceProviderConfig};
pub use scim_server::{BulkTransactionMode, ScimServer, ScimServerBuilder, ScimServerConfig};
