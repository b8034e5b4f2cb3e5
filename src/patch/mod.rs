//! SCIM PATCH (RFC 7644 §3.5.2).
//!
//! # Key Types
//!
//! - [`PatchRequest`] / [`PatchOperation`] - parsed request payload
//! - [`PatchEngine`] - applies operations to a [`Document`](crate::resource::Document)
//! - [`WorkaroundChain`] - ordered rewrites for non-conformant clients
//!
//! # Examples
//!
//! ```rust
//! use scim_engine::patch::{PatchEngine, PatchRequest};
//! use scim_engine::schema::{OperationContext, SchemaRegistry};
//! use serde_json::json;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let registry = SchemaRegistry::with_embedded_schemas()?;
//! let users = registry.get_resource_type("User").unwrap();
//! let user = users.validate(
//!     &json!({
//!         "schemas": ["urn:ietf:params:scim:schemas:core:2.0:User"],
//!         "userName": "bjensen",
//!         "emails": [
//!             {"type": "work", "value": "bjensen@example.com"},
//!             {"type": "home", "value": "babs@jensen.org"}
//!         ]
//!     }),
//!     OperationContext::Create,
//! )?;
//!
//! let request = PatchRequest::from_json(&json!({
//!     "schemas": ["urn:ietf:params:scim:api:messages:2.0:PatchOp"],
//!     "Operations": [
//!         {"op": "replace", "path": "emails[type eq \"work\"].value", "value": "bj@example.com"}
//!     ]
//! }))?;
//!
//! let patched = PatchEngine::default().apply(users, &user, &request.operations)?;
//! assert_eq!(patched.to_json()["emails"][0]["value"], "bj@example.com");
//! assert_eq!(patched.to_json()["emails"][1]["value"], "babs@jensen.org");
//! # Ok(())
//! # }
//! ```

mod engine;
mod operation;
mod path;
mod workarounds;


pub use engine::{PatchConfig, PatchEngine};
pub use operation::{PATCH_OP_URI, PatchOp, PatchOperation, PatchRequest};
pub use path::PatchPath;
pub use workarounds::{Workaround, WorkaroundChain};
